//! Lexer (tokenizer) for bench descriptions.

use crate::error::{BreadboardError, Result};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// Token types in a bench description.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// An identifier (keyword, element name, terminal side)
    Identifier,
    /// A number, possibly with multiplier and unit
    Number,
    /// Terminal separator '.'
    Dot,
    /// Open parenthesis '('
    OpenParen,
    /// Close parenthesis ')'
    CloseParen,
    /// Equals sign '='
    Equals,
    /// Newline
    Newline,
    /// End of file
    Eof,
}

/// Lexer for tokenizing bench descriptions.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let line = self.line;
        let column = self.column;
        let single = |kind: TokenKind, text: &str| Token {
            kind,
            text: text.to_string(),
            line,
            column,
        };

        let Some(&ch) = self.chars.peek() else {
            return Ok(single(TokenKind::Eof, ""));
        };

        let token = match ch {
            '\n' => {
                self.advance();
                single(TokenKind::Newline, "\n")
            }
            '.' => {
                self.advance();
                single(TokenKind::Dot, ".")
            }
            '(' => {
                self.advance();
                single(TokenKind::OpenParen, "(")
            }
            ')' => {
                self.advance();
                single(TokenKind::CloseParen, ")")
            }
            '=' => {
                self.advance();
                single(TokenKind::Equals, "=")
            }
            '-' | '+' | '0'..='9' => {
                let text = self.read_number();
                single(TokenKind::Number, &text)
            }
            _ if ch.is_alphabetic() || ch == '_' => {
                let text = self.read_identifier();
                single(TokenKind::Identifier, &text)
            }
            _ => {
                return Err(BreadboardError::lexer(
                    line,
                    column,
                    format!("unexpected character '{}'", ch),
                ));
            }
        };

        Ok(token)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch == ' ' || ch == '\t' || ch == '\r' || ch == ',' {
                self.advance();
            } else if ch == '#' || ch == ';' {
                while let Some(&c) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut text = String::new();
        while let Some(&ch) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        text
    }

    fn read_digits(&mut self, text: &mut String) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_ascii_digit() {
                text.push(ch);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> String {
        let mut text = String::new();

        if let Some(&sign @ ('-' | '+')) = self.chars.peek() {
            text.push(sign);
            self.advance();
        }

        self.read_digits(&mut text);

        if let Some(&'.') = self.chars.peek() {
            text.push('.');
            self.advance();
            self.read_digits(&mut text);
        }

        if let Some(&e @ ('e' | 'E')) = self.chars.peek() {
            text.push(e);
            self.advance();
            if let Some(&sign @ ('-' | '+')) = self.chars.peek() {
                text.push(sign);
                self.advance();
            }
            self.read_digits(&mut text);
        }

        // Multiplier (p, n, u, m, k, M, G)
        if let Some(&ch) = self.chars.peek() {
            if matches!(ch, 'p' | 'n' | 'u' | 'µ' | 'm' | 'k' | 'K' | 'M' | 'G') {
                text.push(ch);
                self.advance();
            }
        }

        // Unit (V, A, F, R or Ω)
        if let Some(&ch) = self.chars.peek() {
            if matches!(ch, 'V' | 'A' | 'F' | 'R' | 'Ω') {
                text.push(ch);
                self.advance();
            }
        }

        text
    }
}

/// Parse a number string with optional multiplier and unit.
pub fn parse_value(text: &str) -> Option<f64> {
    let text = text
        .trim()
        .trim_end_matches(['V', 'A', 'F', 'R', 'Ω']);
    if text.is_empty() {
        return None;
    }

    let last = text.chars().last()?;
    let multiplier = match last {
        'p' => 1e-12,
        'n' => 1e-9,
        'u' | 'µ' => 1e-6,
        'm' => 1e-3,
        'k' | 'K' => 1e3,
        'M' => 1e6,
        'G' => 1e9,
        _ => 1.0,
    };
    let num_str = if multiplier != 1.0 {
        &text[..text.len() - last.len_utf8()]
    } else {
        text
    };

    num_str.parse::<f64>().ok().map(|v| v * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_parse_value() {
        assert_relative_eq!(parse_value("10k").unwrap(), 10_000.0);
        assert_relative_eq!(parse_value("4.7u").unwrap(), 4.7e-6);
        assert_relative_eq!(parse_value("9V").unwrap(), 9.0);
        assert_relative_eq!(parse_value("1uF").unwrap(), 1e-6);
        assert_relative_eq!(parse_value("220R").unwrap(), 220.0);
        assert_relative_eq!(parse_value("2.2kΩ").unwrap(), 2_200.0);
        assert_relative_eq!(parse_value("1e-3").unwrap(), 1e-3);
        assert_eq!(parse_value("V"), None);
    }

    #[test]
    fn test_lexer_terminal_reference() {
        let mut lexer = Lexer::new("WIRE B1.right (120, -40) L1.left");
        let kinds: Vec<TokenKind> = std::iter::from_fn(|| {
            let tok = lexer.next_token().unwrap();
            (tok.kind != TokenKind::Eof).then_some(tok.kind)
        })
        .collect();

        assert_eq!(
            kinds,
            vec![
                TokenKind::Identifier,
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
                TokenKind::OpenParen,
                TokenKind::Number,
                TokenKind::Number,
                TokenKind::CloseParen,
                TokenKind::Identifier,
                TokenKind::Dot,
                TokenKind::Identifier,
            ]
        );
    }

    #[test]
    fn test_lexer_tracks_lines_and_comments() {
        let mut lexer = Lexer::new("# bench\nBAT B1 9V ; main supply\n");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Newline);
        let tok = lexer.next_token().unwrap();
        assert_eq!((tok.text.as_str(), tok.line, tok.column), ("BAT", 2, 1));
        lexer.next_token().unwrap();
        let value = lexer.next_token().unwrap();
        assert_eq!(value.kind, TokenKind::Number);
        assert_eq!(value.text, "9V");
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Newline);
        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
    }

    #[test]
    fn test_unexpected_character() {
        let mut lexer = Lexer::new("BAT B1 @");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        assert!(matches!(
            lexer.next_token(),
            Err(BreadboardError::LexerError { line: 1, column: 8, .. })
        ));
    }
}
