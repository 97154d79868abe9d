use criterion::{black_box, criterion_group, criterion_main, Criterion};
use loxide::interpreter::Interpreter;

const INPUT: &str = r#"
var total = 0;
var i = 0;
while (i < 1000) {
    var j = 0;
    while (j < 10) {
        total = total + i * j;
        j = j + 1;
    }
    i = i + 1;
}
print total;
"#;

fn loop_benchmark(c: &mut Criterion) {
    c.bench_function("interpreter", |b| {
        b.iter(|| {
            let mut output = Vec::new();
            let mut errors = Vec::new();
            let mut interp = Interpreter::new(&mut output, &mut errors);
            interp.run(black_box(INPUT));
            assert!(!interp.had_compile_error() && !interp.had_runtime_error());
        })
    });
}

criterion_group!(benches, loop_benchmark);
criterion_main!(benches);
