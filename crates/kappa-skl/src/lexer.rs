//! Rune-level scanner for SKL.
//!
//! Produces `(token, position, literal)` triples. Whitespace is emitted as a
//! single run token rather than skipped, so the parser controls where
//! whitespace is significant.

use crate::tokens::{Pos, Token};

/// A lexical scanner over a single statement line.
pub struct Lexer {
    chars: Vec<char>,
    idx: usize,
    line: usize,
    col: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            idx: 0,
            line: 0,
            col: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.idx).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.idx + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.idx += 1;
        if c == '\n' {
            self.line += 1;
            self.col = 0;
        } else {
            self.col += 1;
        }
        Some(c)
    }

    fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    /// Reads the next token.
    pub fn scan(&mut self) -> (Token, Pos, String) {
        let pos = self.pos();

        let c = match self.peek() {
            Some(c) => c,
            None => return (Token::Eof, pos, String::new()),
        };

        if c.is_whitespace() {
            return (Token::Ws, pos, self.scan_whitespace());
        }
        if c.is_alphabetic() || c == '_' {
            return self.scan_ident(pos);
        }
        if c.is_ascii_digit() {
            return (Token::Number, pos, self.scan_number());
        }

        match c {
            '"' => self.scan_quoted(pos),
            '.' => {
                self.advance();
                (Token::Dot, pos, ".".to_string())
            }
            '=' => {
                self.advance();
                (Token::Equals, pos, "=".to_string())
            }
            other => {
                self.advance();
                (Token::Illegal, pos, other.to_string())
            }
        }
    }

    fn scan_whitespace(&mut self) -> String {
        let mut lit = String::new();
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            lit.push(self.advance().unwrap());
        }
        lit
    }

    fn scan_ident(&mut self, pos: Pos) -> (Token, Pos, String) {
        let mut lit = String::new();
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            lit.push(self.advance().unwrap());
        }
        if let Some(tok) = Token::keyword(&lit) {
            (tok, pos, lit)
        } else if let Some(tok) = Token::type_keyword(&lit) {
            // Type keywords always carry their lower-case literal.
            (tok, pos, tok.as_str().to_string())
        } else {
            (Token::Ident, pos, lit)
        }
    }

    fn scan_number(&mut self) -> String {
        let mut lit = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            lit.push(self.advance().unwrap());
        }
        // A fractional part needs a digit after the dot; `1.` is NUMBER DOT.
        if self.peek() == Some('.') && matches!(self.peek_at(1), Some(c) if c.is_ascii_digit()) {
            lit.push(self.advance().unwrap());
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                lit.push(self.advance().unwrap());
            }
        }
        lit
    }

    fn scan_quoted(&mut self, pos: Pos) -> (Token, Pos, String) {
        self.advance(); // opening quote
        let mut lit = String::new();
        loop {
            match self.advance() {
                None => return (Token::Illegal, pos, lit),
                Some('"') => return (Token::Text, pos, lit),
                Some('\\') => {
                    if let Some(escaped) = self.advance() {
                        lit.push(escaped);
                    }
                }
                Some(c) => lit.push(c),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(input: &str) -> Vec<(Token, Pos, String)> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let t = lexer.scan();
            let done = t.0 == Token::Eof;
            out.push(t);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn test_use_statement() {
        let toks = scan_all("USE acme.example");
        let kinds: Vec<Token> = toks.iter().map(|t| t.0).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Use,
                Token::Ws,
                Token::Ident,
                Token::Dot,
                Token::Ident,
                Token::Eof
            ]
        );
        assert_eq!(toks[2].2, "acme");
        assert_eq!(toks[2].1, Pos::new(0, 4));
        assert_eq!(toks[4].2, "example");
        assert_eq!(toks[4].1, Pos::new(0, 9));
    }

    #[test]
    fn test_eof_position_is_one_past_the_end() {
        let toks = scan_all("CREATE NAMESPACE acme.example.");
        let (tok, pos, _) = toks.last().unwrap();
        assert_eq!(*tok, Token::Eof);
        assert_eq!(*pos, Pos::new(0, 30));
    }

    #[test]
    fn test_lowercase_keywords_are_idents() {
        let toks = scan_all("use acme");
        assert_eq!(toks[0].0, Token::Ident);
        assert_eq!(toks[0].2, "use");
    }

    #[test]
    fn test_type_keyword_literal_is_lowered() {
        let toks = scan_all("TIMESTAMP");
        assert_eq!(toks[0].0, Token::TypeTimestamp);
        assert_eq!(toks[0].2, "timestamp");
    }

    #[test]
    fn test_whitespace_run_and_newline() {
        let toks = scan_all("USE  \n acme");
        assert_eq!(toks[1].0, Token::Ws);
        assert_eq!(toks[1].2, "  \n ");
        // Identifier lands on the second line after the newline in the run.
        assert_eq!(toks[2].1, Pos::new(1, 1));
    }

    #[test]
    fn test_numbers() {
        let toks = scan_all("LIMIT 100");
        assert_eq!(toks[2].0, Token::Number);
        assert_eq!(toks[2].2, "100");

        let toks = scan_all("1.5");
        assert_eq!(toks[0].0, Token::Number);
        assert_eq!(toks[0].2, "1.5");

        // No digit after the dot: the dot is its own token.
        let toks = scan_all("1.");
        assert_eq!(toks[0].0, Token::Number);
        assert_eq!(toks[0].2, "1");
        assert_eq!(toks[1].0, Token::Dot);
    }

    #[test]
    fn test_quoted_text() {
        let toks = scan_all(r#""hello \"world\"""#);
        assert_eq!(toks[0].0, Token::Text);
        assert_eq!(toks[0].2, r#"hello "world""#);
    }

    #[test]
    fn test_punctuation_and_illegal() {
        let toks = scan_all("= . ;");
        assert_eq!(toks[0].0, Token::Equals);
        assert_eq!(toks[2].0, Token::Dot);
        assert_eq!(toks[4].0, Token::Illegal);
        assert_eq!(toks[4].2, ";");
    }
}
