// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 ddsfmu contributors

//! IDL tokenizer.

use super::Diagnostic;

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Int(i64),
    StringLit(String),
    CharLit(char),
    /// `::`
    ScopeSep,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LAngle,
    RAngle,
    LParen,
    RParen,
    Comma,
    Semi,
    Colon,
    At,
    Minus,
    Eq,
    Eof,
}

/// A token with the line it started on.
#[derive(Debug, Clone)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek2(&self) -> Option<char> {
        let mut it = self.input[self.pos..].chars();
        it.next();
        it.next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek2()) {
                (Some(c), _) if c.is_whitespace() => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                (Some('/'), Some('*')) => {
                    self.bump();
                    self.bump();
                    loop {
                        match (self.peek(), self.peek2()) {
                            (Some('*'), Some('/')) => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            (Some(_), _) => {
                                self.bump();
                            }
                            (None, _) => break,
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn read_ident(&mut self) -> String {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn read_int(&mut self) -> Result<i64, String> {
        let start = self.pos;
        // Hex literals show up in enum values and case labels.
        if self.peek() == Some('0') && matches!(self.peek2(), Some('x' | 'X')) {
            self.bump();
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.bump();
            }
            let text = &self.input[start + 2..self.pos];
            return i64::from_str_radix(text, 16).map_err(|e| e.to_string());
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        self.input[start..self.pos]
            .parse::<i64>()
            .map_err(|e| e.to_string())
    }

    /// Tokenize the whole input, collecting diagnostics for stray bytes.
    pub fn tokenize(mut self) -> (Vec<Spanned>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        let mut diags = Vec::new();
        loop {
            self.skip_trivia();
            let line = self.line;
            let Some(ch) = self.peek() else {
                tokens.push(Spanned { token: Token::Eof, line });
                break;
            };
            let token = match ch {
                c if c.is_alphabetic() || c == '_' => Token::Ident(self.read_ident()),
                c if c.is_ascii_digit() => match self.read_int() {
                    Ok(v) => Token::Int(v),
                    Err(msg) => {
                        diags.push(Diagnostic {
                            line,
                            message: format!("bad integer literal: {}", msg),
                        });
                        continue;
                    }
                },
                '"' => {
                    self.bump();
                    let start = self.pos;
                    while let Some(c) = self.peek() {
                        if c == '"' {
                            break;
                        }
                        self.bump();
                    }
                    let text = self.input[start..self.pos].to_string();
                    self.bump();
                    Token::StringLit(text)
                }
                '\'' => {
                    self.bump();
                    let c = self.bump().unwrap_or('\0');
                    self.bump(); // closing quote
                    Token::CharLit(c)
                }
                ':' => {
                    self.bump();
                    if self.peek() == Some(':') {
                        self.bump();
                        Token::ScopeSep
                    } else {
                        Token::Colon
                    }
                }
                '{' => {
                    self.bump();
                    Token::LBrace
                }
                '}' => {
                    self.bump();
                    Token::RBrace
                }
                '[' => {
                    self.bump();
                    Token::LBracket
                }
                ']' => {
                    self.bump();
                    Token::RBracket
                }
                '<' => {
                    self.bump();
                    Token::LAngle
                }
                '>' => {
                    self.bump();
                    Token::RAngle
                }
                '(' => {
                    self.bump();
                    Token::LParen
                }
                ')' => {
                    self.bump();
                    Token::RParen
                }
                ',' => {
                    self.bump();
                    Token::Comma
                }
                ';' => {
                    self.bump();
                    Token::Semi
                }
                '@' => {
                    self.bump();
                    Token::At
                }
                '-' => {
                    self.bump();
                    Token::Minus
                }
                '=' => {
                    self.bump();
                    Token::Eq
                }
                other => {
                    diags.push(Diagnostic {
                        line,
                        message: format!("unexpected character '{}'", other),
                    });
                    self.bump();
                    continue;
                }
            };
            tokens.push(Spanned { token, line });
        }
        (tokens, diags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenizes_struct() {
        let (tokens, diags) = Lexer::new("struct P { double x; };").tokenize();
        assert!(diags.is_empty());
        let kinds: Vec<_> = tokens.iter().map(|t| t.token.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Ident("struct".into()),
                Token::Ident("P".into()),
                Token::LBrace,
                Token::Ident("double".into()),
                Token::Ident("x".into()),
                Token::Semi,
                Token::RBrace,
                Token::Semi,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn skips_comments_and_tracks_lines() {
        let src = "// header\n/* block\ncomment */ module M\n{ };";
        let (tokens, diags) = Lexer::new(src).tokenize();
        assert!(diags.is_empty());
        assert_eq!(tokens[0].token, Token::Ident("module".into()));
        assert_eq!(tokens[0].line, 3);
    }

    #[test]
    fn scope_separator() {
        let (tokens, _) = Lexer::new("My::Impl").tokenize();
        assert_eq!(tokens[1].token, Token::ScopeSep);
    }

    #[test]
    fn hex_literal() {
        let (tokens, diags) = Lexer::new("0x1F").tokenize();
        assert!(diags.is_empty());
        assert_eq!(tokens[0].token, Token::Int(31));
    }
}
