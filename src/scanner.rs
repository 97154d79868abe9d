//! Lexical analyzer.

use std::io::Write;

use crate::diag::Diagnostics;
use crate::token::{Literal, Token, TokenKind};

/// Turns source text into a token list terminated by `Eof`.
///
/// Scanning never fails: malformed input is reported to the diagnostics
/// sink and the scanner keeps going, so one stray character does not hide
/// errors further down the file.
pub struct Scanner<'s, 'd, W: Write> {
    source: &'s str,
    diag: &'d mut Diagnostics<W>,
    tokens: Vec<Token>,

    // Byte offsets into `source`: where the current lexeme begins and
    // which character is consumed next.
    start: usize,
    current: usize,
    line: u32,
}

impl<'s, 'd, W: Write> Scanner<'s, 'd, W> {
    pub fn new(source: &'s str, diag: &'d mut Diagnostics<W>) -> Scanner<'s, 'd, W> {
        Scanner {
            source,
            diag,
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    pub fn scan_tokens(mut self) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token();
        }

        self.tokens
            .push(Token::new(TokenKind::Eof, "", None, self.line));
        self.tokens
    }

    fn scan_token(&mut self) {
        let c = self.advance();
        match c {
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            ',' => self.add_token(TokenKind::Comma),
            '.' => self.add_token(TokenKind::Dot),
            '-' => self.add_token(TokenKind::Minus),
            '+' => self.add_token(TokenKind::Plus),
            ';' => self.add_token(TokenKind::Semicolon),
            '*' => self.add_token(TokenKind::Star),
            '?' => self.add_token(TokenKind::Question),
            ':' => self.add_token(TokenKind::Colon),
            '!' => {
                let kind = if self.match_char('=') {
                    TokenKind::BangEqual
                } else {
                    TokenKind::Bang
                };
                self.add_token(kind);
            }
            '=' => {
                let kind = if self.match_char('=') {
                    TokenKind::EqualEqual
                } else {
                    TokenKind::Equal
                };
                self.add_token(kind);
            }
            '<' => {
                let kind = if self.match_char('=') {
                    TokenKind::LessEqual
                } else {
                    TokenKind::Less
                };
                self.add_token(kind);
            }
            '>' => {
                let kind = if self.match_char('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                };
                self.add_token(kind);
            }
            '/' => {
                if self.match_char('/') {
                    // A line comment runs to the end of the line.
                    while !self.is_at_end() && self.peek() != Some('\n') {
                        self.advance();
                    }
                } else {
                    self.add_token(TokenKind::Slash);
                }
            }
            ' ' | '\r' | '\t' => (),
            '\n' => self.line += 1,
            '"' => self.string(),
            '0'..='9' => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),
            _ => self.diag.scan_error(self.line, "Unexpected character."),
        }
    }

    fn string(&mut self) {
        let opening_line = self.line;
        while let Some(c) = self.peek() {
            if c == '"' {
                break;
            }
            if c == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            self.diag.scan_error(opening_line, "Unterminated string.");
            return;
        }

        // The closing quote.
        self.advance();

        // The stored value drops the surrounding quotes; there is no
        // escape processing.
        let value = self.source[self.start + 1..self.current - 1].to_string();
        let lexeme = &self.source[self.start..self.current];
        self.tokens.push(Token::new(
            TokenKind::Str,
            lexeme,
            Some(Literal::Str(value)),
            opening_line,
        ));
    }

    fn number(&mut self) {
        while matches!(self.peek(), Some('0'..='9')) {
            self.advance();
        }

        // A fractional part needs a digit after the dot; `1.` scans as a
        // number followed by a dot.
        if self.peek() == Some('.') && matches!(self.peek_next(), Some('0'..='9')) {
            self.advance();
            while matches!(self.peek(), Some('0'..='9')) {
                self.advance();
            }
        }

        let value = self.source[self.start..self.current]
            .parse()
            .expect("digit runs always parse as f64");
        self.add_literal_token(TokenKind::Number, Literal::Number(value));
    }

    fn identifier(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }

        let kind = keyword(&self.source[self.start..self.current]).unwrap_or(TokenKind::Identifier);
        self.add_token(kind);
    }

    /// Consume and return the next character.  Callers check `is_at_end`
    /// (or peek) first, so there is always one.
    fn advance(&mut self) -> char {
        let c = self.source[self.current..]
            .chars()
            .next()
            .expect("caller checked is_at_end");
        self.current += c.len_utf8();
        c
    }

    fn peek(&self) -> Option<char> {
        self.source[self.current..].chars().next()
    }

    fn peek_next(&self) -> Option<char> {
        let mut chars = self.source[self.current..].chars();
        chars.next();
        chars.next()
    }

    fn match_char(&mut self, expected: char) -> bool {
        match self.peek() {
            Some(c) if c == expected => {
                self.current += c.len_utf8();
                true
            }
            _ => false,
        }
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme = &self.source[self.start..self.current];
        self.tokens.push(Token::new(kind, lexeme, None, self.line));
    }

    fn add_literal_token(&mut self, kind: TokenKind, literal: Literal) {
        let lexeme = &self.source[self.start..self.current];
        self.tokens
            .push(Token::new(kind, lexeme, Some(literal), self.line));
    }
}

fn keyword(name: &str) -> Option<TokenKind> {
    let kind = match name {
        "and" => TokenKind::And,
        "break" => TokenKind::Break,
        "class" => TokenKind::Class,
        "else" => TokenKind::Else,
        "false" => TokenKind::False,
        "for" => TokenKind::For,
        "fun" => TokenKind::Fun,
        "if" => TokenKind::If,
        "nil" => TokenKind::Nil,
        "or" => TokenKind::Or,
        "print" => TokenKind::Print,
        "return" => TokenKind::Return,
        "super" => TokenKind::Super,
        "this" => TokenKind::This,
        "true" => TokenKind::True,
        "var" => TokenKind::Var,
        "while" => TokenKind::While,
        _ => return None,
    };
    Some(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(input: &str) -> (Vec<Token>, String) {
        let mut errors = Vec::new();
        let mut diag = Diagnostics::new(&mut errors);
        let tokens = Scanner::new(input, &mut diag).scan_tokens();
        (
            tokens,
            String::from_utf8(errors).expect("diagnostics are utf-8"),
        )
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        let (tokens, errors) = scan(input);
        assert_eq!(errors, "");
        tokens.iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source_scans_to_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn fixed_tokens() {
        assert_eq!(
            kinds("(){},.-+;*/?:"),
            vec![
                TokenKind::LeftParen,
                TokenKind::RightParen,
                TokenKind::LeftBrace,
                TokenKind::RightBrace,
                TokenKind::Comma,
                TokenKind::Dot,
                TokenKind::Minus,
                TokenKind::Plus,
                TokenKind::Semicolon,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Question,
                TokenKind::Colon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn one_and_two_character_operators() {
        assert_eq!(
            kinds("! != = == > >= < <="),
            vec![
                TokenKind::Bang,
                TokenKind::BangEqual,
                TokenKind::Equal,
                TokenKind::EqualEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn maximal_munch_without_blanks() {
        assert_eq!(
            kinds("===<=!"),
            vec![
                TokenKind::EqualEqual,
                TokenKind::Equal,
                TokenKind::LessEqual,
                TokenKind::Bang,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn blanks_are_skipped() {
        assert_eq!(kinds(" \t\r\n+"), vec![TokenKind::Plus, TokenKind::Eof]);
    }

    #[test]
    fn line_comments_are_skipped() {
        assert_eq!(
            kinds("true // false\nnil"),
            vec![TokenKind::True, TokenKind::Nil, TokenKind::Eof]
        );
        assert_eq!(kinds("// only a comment"), vec![TokenKind::Eof]);
    }

    #[test]
    fn slash_alone_is_division() {
        assert_eq!(
            kinds("1/2"),
            vec![TokenKind::Number, TokenKind::Slash, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn number_literals() {
        let (tokens, _) = scan("42 3.14");
        assert_eq!(tokens[0].literal, Some(Literal::Number(42.0)));
        assert_eq!(tokens[0].lexeme, "42");
        assert_eq!(tokens[1].literal, Some(Literal::Number(3.14)));
    }

    #[test]
    fn trailing_dot_is_not_part_of_a_number() {
        let (tokens, errors) = scan("1.");
        assert_eq!(errors, "");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Number, TokenKind::Dot, TokenKind::Eof]
        );
        assert_eq!(tokens[0].literal, Some(Literal::Number(1.0)));
    }

    #[test]
    fn string_literal_drops_quotes() {
        let (tokens, errors) = scan("\"hi there\"");
        assert_eq!(errors, "");
        assert_eq!(tokens[0].kind, TokenKind::Str);
        assert_eq!(tokens[0].lexeme, "\"hi there\"");
        assert_eq!(tokens[0].literal, Some(Literal::Str("hi there".to_string())));
    }

    #[test]
    fn string_may_span_lines() {
        let (tokens, errors) = scan("\"a\nb\" 1");
        assert_eq!(errors, "");
        // The string token carries the line its first character is on;
        // later tokens see the advanced line count.
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[0].literal, Some(Literal::Str("a\nb".to_string())));
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unterminated_string_reports_opening_line() {
        let (tokens, errors) = scan("\n\"abc\ndef");
        assert_eq!(errors, "[line 2] Error: Unterminated string.\n");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Eof]
        );
    }

    #[test]
    fn identifiers_and_keywords() {
        assert_eq!(
            kinds("foo _bar t42 var print while break class"),
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Var,
                TokenKind::Print,
                TokenKind::While,
                TokenKind::Break,
                TokenKind::Class,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn keyword_prefixes_stay_identifiers() {
        assert_eq!(
            kinds("orchid whiled"),
            vec![TokenKind::Identifier, TokenKind::Identifier, TokenKind::Eof]
        );
    }

    #[test]
    fn scanner_keeps_track_of_lines() {
        let (tokens, _) = scan("1\n2 3\n4");
        let lines: Vec<u32> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 2, 2, 3, 3]);
    }

    #[test]
    fn unexpected_character_is_reported_and_skipped() {
        let (tokens, errors) = scan("1 @ 2");
        assert_eq!(errors, "[line 1] Error: Unexpected character.\n");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn exactly_one_eof_and_it_is_last() {
        for input in ["", "1 + 2;", "\"s\"", "@", "var x = 1;\nprint x;"] {
            let (tokens, _) = scan(input);
            let eofs = tokens
                .iter()
                .filter(|t| t.kind == TokenKind::Eof)
                .count();
            assert_eq!(eofs, 1, "input {:?}", input);
            assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
        }
    }

    #[test]
    fn lexemes_are_source_substrings_in_order() {
        let input = "var answer = 6 * 7; // comment\nprint answer;";
        let (tokens, errors) = scan(input);
        assert_eq!(errors, "");
        let mut from = 0;
        for token in &tokens {
            if token.kind == TokenKind::Eof {
                continue;
            }
            let at = input[from..]
                .find(&token.lexeme)
                .expect("lexeme comes from the source");
            from += at + token.lexeme.len();
        }
    }
}
