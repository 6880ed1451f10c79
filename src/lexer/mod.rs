//! Lexical analysis: byte stream → token stream with source spans.
//!
//! Scanning is streaming and single-pass with one character of lookahead
//! (two for compound operators), grounded in the teacher's non-regex
//! `Lexer`/`LexMap` design (`src/lexer/mod.rs`) rather than the sibling
//! `Lexikon`/regex design (`crates/why_lib/src/lexer`) — Asthra's numeric
//! literals (hex/oct/bin/underscores), string escapes (`\u{HHHH}`), and
//! nested block comments need real control flow that a flat regex table
//! cannot express cleanly.

mod keywords;
mod token;

pub use token::{GetPosition, Terminal, Token};

use crate::diagnostics::{Diagnostic, Diagnostics, Severity};
use crate::span::{FileId, SourceMap, Span};

pub struct Lexer<'a> {
    input: &'a [u8],
    file: FileId,
    sources: &'a SourceMap,
    pos: usize,
    keywords: keywords::KeywordMap,
    peeked: Option<Token>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, file: FileId, sources: &'a SourceMap) -> Self {
        Self {
            input: input.as_bytes(),
            file,
            sources,
            pos: 0,
            keywords: keywords::build(),
            peeked: None,
        }
    }

    fn span(&self, start: usize) -> Span {
        Span::new(self.file, start as u32, (self.pos - start) as u32)
    }

    fn byte(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn byte_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let b = self.byte()?;
        self.pos += 1;
        Some(b)
    }

    fn eat_whitespace_and_comments(&mut self, diags: &mut Diagnostics) {
        loop {
            match self.byte() {
                Some(b) if b.is_ascii_whitespace() => {
                    self.pos += 1;
                }
                Some(b'/') if self.byte_at(1) == Some(b'/') => {
                    while !matches!(self.byte(), None | Some(b'\n')) {
                        self.pos += 1;
                    }
                }
                Some(b'/') if self.byte_at(1) == Some(b'*') => {
                    self.eat_block_comment(diags);
                }
                _ => return,
            }
        }
    }

    fn eat_block_comment(&mut self, diags: &mut Diagnostics) {
        let start = self.pos;
        self.pos += 2; // consume "/*"
        let mut depth = 1usize;

        while depth > 0 {
            match (self.byte(), self.byte_at(1)) {
                (Some(b'/'), Some(b'*')) => {
                    depth += 1;
                    self.pos += 2;
                }
                (Some(b'*'), Some(b'/')) => {
                    depth -= 1;
                    self.pos += 2;
                }
                (Some(_), _) => self.pos += 1,
                (None, _) => {
                    diags.push(Diagnostic::new(
                        Severity::Error,
                        "E-LEX-UNTERMINATED-COMMENT",
                        self.span(start),
                        "unterminated block comment",
                        self.sources,
                    ));
                    return;
                }
            }
        }
    }

    pub fn peek(&mut self, diags: &mut Diagnostics) -> Token {
        if self.peeked.is_none() {
            self.peeked = Some(self.scan_token(diags));
        }
        self.peeked.clone().unwrap()
    }

    pub fn next(&mut self, diags: &mut Diagnostics) -> Token {
        if let Some(t) = self.peeked.take() {
            return t;
        }
        self.scan_token(diags)
    }

    /// Lex the entire input to a token vector, ending with `Eof`. This is
    /// the entry point the parser actually uses — `ParseState` needs random
    /// backtracking over a materialized stream, mirroring the teacher's
    /// combinator-based parser.
    pub fn tokenize(source: &'a str, file: FileId, sources: &'a SourceMap, diags: &mut Diagnostics) -> Vec<Token> {
        let mut lexer = Lexer::new(source, file, sources);
        let mut tokens = Vec::new();
        loop {
            let tok = lexer.next(diags);
            let is_eof = matches!(tok, Token::Eof { .. });
            tokens.push(tok);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn scan_token(&mut self, diags: &mut Diagnostics) -> Token {
        self.eat_whitespace_and_comments(diags);

        let Some(b) = self.byte() else {
            let pos = self.span(self.pos);
            return Token::Eof { position: pos };
        };

        match b {
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_identifier(),
            b'0'..=b'9' => self.scan_number(diags),
            b'"' => self.scan_string(diags),
            b'\'' => self.scan_char(diags),
            _ => self.scan_operator(diags),
        }
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.pos;
        while matches!(self.byte(), Some(b) if b.is_ascii_alphanumeric() || b == b'_') {
            self.pos += 1;
        }
        let text = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or("");

        if let Some(terminal) = self.keywords.get(text) {
            return terminal.to_token(self.span(start));
        }

        Token::Id {
            value: text.to_string(),
            position: self.span(start),
        }
    }

    fn scan_number(&mut self, diags: &mut Diagnostics) -> Token {
        let start = self.pos;

        if self.byte() == Some(b'0') && matches!(self.byte_at(1), Some(b'x' | b'X')) {
            self.pos += 2;
            return self.finish_radix_integer(start, 16, diags, |b| b.is_ascii_hexdigit());
        }
        if self.byte() == Some(b'0') && matches!(self.byte_at(1), Some(b'o' | b'O')) {
            self.pos += 2;
            return self.finish_radix_integer(start, 8, diags, |b| (b'0'..=b'7').contains(&b));
        }
        if self.byte() == Some(b'0') && matches!(self.byte_at(1), Some(b'b' | b'B')) {
            self.pos += 2;
            return self.finish_radix_integer(start, 2, diags, |b| b == b'0' || b == b'1');
        }

        self.eat_digits_and_underscores();

        let mut is_float = false;
        if self.byte() == Some(b'.') && matches!(self.byte_at(1), Some(b'0'..=b'9')) {
            is_float = true;
            self.pos += 1;
            self.eat_digits_and_underscores();
        }
        if matches!(self.byte(), Some(b'e' | b'E')) {
            let save = self.pos;
            self.pos += 1;
            if matches!(self.byte(), Some(b'+' | b'-')) {
                self.pos += 1;
            }
            if matches!(self.byte(), Some(b'0'..=b'9')) {
                is_float = true;
                self.eat_digits_and_underscores();
            } else {
                self.pos = save;
            }
        }

        let text: String = std::str::from_utf8(&self.input[start..self.pos])
            .unwrap_or("")
            .chars()
            .filter(|c| *c != '_')
            .collect();

        if is_float {
            match text.parse::<f64>() {
                Ok(value) => Token::Float {
                    value,
                    position: self.span(start),
                },
                Err(_) => self.number_error(start, diags, "invalid floating-point literal"),
            }
        } else {
            match text.parse::<u64>() {
                Ok(value) => Token::Integer {
                    value,
                    position: self.span(start),
                },
                Err(_) => self.number_error(start, diags, "integer literal out of range"),
            }
        }
    }

    fn eat_digits_and_underscores(&mut self) {
        while matches!(self.byte(), Some(b) if b.is_ascii_digit() || b == b'_') {
            self.pos += 1;
        }
    }

    fn finish_radix_integer(
        &mut self,
        start: usize,
        radix: u32,
        diags: &mut Diagnostics,
        is_digit: impl Fn(u8) -> bool,
    ) -> Token {
        let digits_start = self.pos;
        while matches!(self.byte(), Some(b) if is_digit(b) || b == b'_') {
            self.pos += 1;
        }
        let text: String = std::str::from_utf8(&self.input[digits_start..self.pos])
            .unwrap_or("")
            .chars()
            .filter(|c| *c != '_')
            .collect();

        match u64::from_str_radix(&text, radix) {
            Ok(value) if !text.is_empty() => Token::Integer {
                value,
                position: self.span(start),
            },
            _ => self.number_error(start, diags, "integer literal out of range"),
        }
    }

    fn number_error(&self, start: usize, diags: &mut Diagnostics, message: &str) -> Token {
        diags.push(Diagnostic::new(
            Severity::Error,
            "E-LEX-NUMERIC-OVERFLOW",
            self.span(start),
            message,
            self.sources,
        ));
        Token::Error {
            message: message.to_string(),
            position: self.span(start),
        }
    }

    fn scan_escape(&mut self) -> Option<char> {
        self.pos += 1; // consume backslash
        let c = self.advance()?;
        Some(match c {
            b'n' => '\n',
            b't' => '\t',
            b'r' => '\r',
            b'0' => '\0',
            b'\\' => '\\',
            b'"' => '"',
            b'\'' => '\'',
            b'u' => {
                if self.byte() == Some(b'{') {
                    self.pos += 1;
                    let start = self.pos;
                    while matches!(self.byte(), Some(b) if b.is_ascii_hexdigit()) {
                        self.pos += 1;
                    }
                    let hex = std::str::from_utf8(&self.input[start..self.pos]).unwrap_or("");
                    let code = u32::from_str_radix(hex, 16).ok();
                    if self.byte() == Some(b'}') {
                        self.pos += 1;
                    }
                    return code.and_then(char::from_u32);
                }
                'u'
            }
            other => other as char,
        })
    }

    fn scan_string(&mut self, diags: &mut Diagnostics) -> Token {
        let start = self.pos;
        self.pos += 1; // opening quote
        let mut value = String::new();

        loop {
            match self.byte() {
                Some(b'"') => {
                    self.pos += 1;
                    return Token::Str {
                        value,
                        position: self.span(start),
                    };
                }
                Some(b'\\') => {
                    if let Some(c) = self.scan_escape() {
                        value.push(c);
                    }
                }
                Some(_) => {
                    // handle multi-byte UTF-8 sequences a byte at a time by
                    // re-decoding from the current position.
                    let rest = std::str::from_utf8(&self.input[self.pos..]).unwrap_or("");
                    if let Some(c) = rest.chars().next() {
                        value.push(c);
                        self.pos += c.len_utf8();
                    } else {
                        self.pos += 1;
                    }
                }
                None => {
                    diags.push(Diagnostic::new(
                        Severity::Error,
                        "E-LEX-UNTERMINATED-STRING",
                        self.span(start),
                        "unterminated string literal",
                        self.sources,
                    ));
                    return Token::Error {
                        message: "unterminated string literal".into(),
                        position: self.span(start),
                    };
                }
            }
        }
    }

    fn scan_char(&mut self, diags: &mut Diagnostics) -> Token {
        let start = self.pos;
        self.pos += 1; // opening quote

        let value = if self.byte() == Some(b'\\') {
            self.scan_escape()
        } else {
            let rest = std::str::from_utf8(&self.input[self.pos..]).unwrap_or("");
            let c = rest.chars().next();
            if let Some(c) = c {
                self.pos += c.len_utf8();
            }
            c
        };

        if self.byte() == Some(b'\'') {
            self.pos += 1;
        } else {
            diags.push(Diagnostic::new(
                Severity::Error,
                "E-LEX-MALFORMED-CHAR",
                self.span(start),
                "malformed character literal",
                self.sources,
            ));
            return Token::Error {
                message: "malformed character literal".into(),
                position: self.span(start),
            };
        }

        match value {
            Some(value) => Token::Char {
                value,
                position: self.span(start),
            },
            None => Token::Error {
                message: "malformed character literal".into(),
                position: self.span(start),
            },
        }
    }

    fn scan_operator(&mut self, diags: &mut Diagnostics) -> Token {
        let start = self.pos;
        let mut read = String::new();

        loop {
            let Some(b) = self.byte() else { break };
            let c = b as char;
            let mut candidate = read.clone();
            candidate.push(c);

            if self.keywords.can_match(&candidate) {
                read = candidate;
                self.pos += 1;
                continue;
            }
            break;
        }

        if let Some(terminal) = self.keywords.get(&read) {
            return terminal.to_token(self.span(start));
        }

        if read.is_empty() {
            // Could not even start matching: an illegal byte. Consume it so
            // scanning makes progress (resync at the next boundary).
            self.pos += 1;
        }

        let message = format!("unexpected character sequence '{read}'");
        diags.push(Diagnostic::new(
            Severity::Error,
            "E-LEX-ILLEGAL-BYTE",
            self.span(start),
            message.clone(),
            self.sources,
        ));
        Token::Error {
            message,
            position: self.span(start),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        let mut sources = SourceMap::new();
        let file = sources.add_file("test.ast", src);
        let mut diags = Diagnostics::new();
        Lexer::tokenize(src, file, &sources, &mut diags)
    }

    #[test]
    fn lexes_keywords_and_identifiers() {
        let tokens = lex("package p; pub fn f");
        assert!(matches!(tokens[0], Token::Package { .. }));
        assert!(matches!(tokens[1], Token::Id { .. }));
        assert!(matches!(tokens[2], Token::Semicolon { .. }));
        assert!(matches!(tokens[3], Token::Pub { .. }));
        assert!(matches!(tokens[4], Token::Fn { .. }));
    }

    #[test]
    fn lexes_numeric_bases() {
        let tokens = lex("0xFF 0o17 0b101 1_000 3.5 2e3");
        let Token::Integer { value: hex, .. } = tokens[0] else { panic!() };
        let Token::Integer { value: oct, .. } = tokens[1] else { panic!() };
        let Token::Integer { value: bin, .. } = tokens[2] else { panic!() };
        let Token::Integer { value: under, .. } = tokens[3] else { panic!() };
        let Token::Float { value: flt, .. } = tokens[4] else { panic!() };
        let Token::Float { value: exp, .. } = tokens[5] else { panic!() };

        assert_eq!(hex, 255);
        assert_eq!(oct, 15);
        assert_eq!(bin, 5);
        assert_eq!(under, 1000);
        assert_eq!(flt, 3.5);
        assert_eq!(exp, 2000.0);
    }

    #[test]
    fn lexes_string_escapes() {
        let tokens = lex(r#""hi\n\u{41}""#);
        let Token::Str { value, .. } = &tokens[0] else { panic!() };
        assert_eq!(value, "hi\nA");
    }

    #[test]
    fn nested_block_comments_are_skipped() {
        let tokens = lex("/* outer /* inner */ still outer */ 42");
        let Token::Integer { value, .. } = tokens[0] else { panic!() };
        assert_eq!(value, 42);
    }

    #[test]
    fn illegal_byte_produces_error_token_and_resyncs() {
        let mut sources = SourceMap::new();
        let file = sources.add_file("test.ast", "1 @ 2");
        let mut diags = Diagnostics::new();
        let tokens = Lexer::tokenize("1 @ 2", file, &sources, &mut diags);
        assert!(diags.has_errors());
        assert!(matches!(tokens[1], Token::Error { .. }));
        assert!(matches!(tokens[2], Token::Integer { value: 2, .. }));
    }

    #[test]
    fn longest_match_prefers_two_char_operators() {
        let tokens = lex("<= < <");
        assert!(matches!(tokens[0], Token::Le { .. }));
        assert!(matches!(tokens[1], Token::Lt { .. }));
    }
}
