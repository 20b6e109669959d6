//! Parser for bench descriptions.

use std::collections::HashMap;

use super::ast::*;
use super::lexer::{parse_value, Lexer, Token, TokenKind};
use crate::circuit::{Position, TerminalSide};
use crate::components::ElementKind;
use crate::error::{BreadboardError, Result};

/// Parser for bench descriptions.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(lexer: Lexer<'a>) -> Self {
        Self {
            lexer,
            current: Token {
                kind: TokenKind::Newline,
                text: String::new(),
                line: 1,
                column: 1,
            },
        }
    }

    /// Parse the entire bench description.
    pub fn parse(&mut self) -> Result<BenchAst> {
        let mut ast = BenchAst::new();
        self.advance()?;

        while self.current.kind != TokenKind::Eof {
            if self.current.kind == TokenKind::Newline {
                self.advance()?;
                continue;
            }

            let keyword = self.expect(TokenKind::Identifier)?;
            if keyword.text.eq_ignore_ascii_case("WIRE") {
                ast.wires.push(self.parse_wire(keyword.line)?);
            } else {
                let kind = ElementKind::from_keyword(&keyword.text).ok_or_else(|| {
                    BreadboardError::UnknownElementType {
                        element_type: keyword.text.clone(),
                        line: keyword.line,
                    }
                })?;
                ast.elements.push(self.parse_element(kind, keyword.line)?);
            }

            match self.current.kind {
                TokenKind::Newline => self.advance()?,
                TokenKind::Eof => {}
                _ => {
                    return Err(BreadboardError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }
        }

        Ok(ast)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.current.kind == kind {
            let tok = self.current.clone();
            self.advance()?;
            Ok(tok)
        } else {
            Err(BreadboardError::parse(
                self.current.line,
                format!("expected {:?}, got {:?}", kind, self.current.kind),
            ))
        }
    }

    fn number(&mut self) -> Result<f64> {
        let tok = self.expect(TokenKind::Number)?;
        parse_value(&tok.text)
            .ok_or_else(|| BreadboardError::parse(tok.line, format!("invalid number: {}", tok.text)))
    }

    /// `KIND NAME [value] [closed|open] [key=value]...`
    fn parse_element(&mut self, kind: ElementKind, line: usize) -> Result<ElementDef> {
        let name = self.expect(TokenKind::Identifier)?.text;
        let mut value = None;
        let mut params = HashMap::new();

        loop {
            match self.current.kind {
                TokenKind::Number if value.is_none() => {
                    value = Some(self.number()?);
                }
                TokenKind::Identifier => {
                    let word = self.expect(TokenKind::Identifier)?;
                    if self.current.kind == TokenKind::Equals {
                        self.advance()?;
                        let v = self.number()?;
                        params.insert(word.text.to_ascii_lowercase(), v);
                    } else {
                        let state = match word.text.to_ascii_lowercase().as_str() {
                            "closed" | "on" => 1.0,
                            "open" | "off" => 0.0,
                            _ => {
                                return Err(BreadboardError::parse(
                                    word.line,
                                    format!("unexpected word '{}' in {} declaration", word.text, kind),
                                ));
                            }
                        };
                        if kind != ElementKind::Switch {
                            return Err(BreadboardError::invalid_parameter(
                                &name,
                                "state",
                                "only switches can be opened or closed",
                            ));
                        }
                        params.insert("state".to_string(), state);
                    }
                }
                _ => break,
            }
        }

        Ok(ElementDef {
            kind,
            name,
            value,
            params,
            line,
        })
    }

    /// `WIRE A.side [(x y)]... B.side`
    fn parse_wire(&mut self, line: usize) -> Result<WireDef> {
        let from = self.parse_terminal()?;
        let mut waypoints = Vec::new();
        while self.current.kind == TokenKind::OpenParen {
            self.advance()?;
            let x = self.number()?;
            let y = self.number()?;
            self.expect(TokenKind::CloseParen)?;
            waypoints.push(Position::new(x, y));
        }
        let to = self.parse_terminal()?;

        Ok(WireDef {
            from,
            waypoints,
            to,
            line,
        })
    }

    fn parse_terminal(&mut self) -> Result<TerminalRef> {
        let element = self.expect(TokenKind::Identifier)?.text;
        self.expect(TokenKind::Dot)?;
        let side_tok = self.expect(TokenKind::Identifier)?;
        let side = TerminalSide::from_name(&side_tok.text).ok_or_else(|| {
            BreadboardError::parse(
                side_tok.line,
                format!("expected 'left' or 'right', got '{}'", side_tok.text),
            )
        })?;
        Ok(TerminalRef { element, side })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<BenchAst> {
        Parser::new(Lexer::new(input)).parse()
    }

    #[test]
    fn test_parse_elements() {
        let ast = parse(
            "BAT B1 9V x=10 y=20\n\
             SW S1 closed\n\
             RES R1 1k\n\
             VM V1\n",
        )
        .unwrap();

        assert_eq!(ast.elements.len(), 4);
        assert_eq!(ast.elements[0].kind, ElementKind::Battery);
        assert_eq!(ast.elements[0].value, Some(9.0));
        assert_eq!(ast.elements[0].position(), Position::new(10.0, 20.0));
        assert_eq!(ast.elements[1].params.get("state"), Some(&1.0));
        assert_eq!(ast.elements[2].value, Some(1000.0));
        assert_eq!(ast.elements[3].value, None);
        assert_eq!(ast.elements[3].line, 4);
    }

    #[test]
    fn test_parse_wire_with_bends() {
        let ast = parse("WIRE B1.right (50 100) (150, 100) R1.LEFT").unwrap();
        let wire = &ast.wires[0];
        assert_eq!(wire.from.element, "B1");
        assert_eq!(wire.from.side, TerminalSide::Right);
        assert_eq!(wire.waypoints, vec![Position::new(50.0, 100.0), Position::new(150.0, 100.0)]);
        assert_eq!(wire.to.side, TerminalSide::Left);
    }

    #[test]
    fn test_unknown_keyword() {
        assert!(matches!(
            parse("\nTRANSISTOR Q1"),
            Err(BreadboardError::UnknownElementType { line: 2, .. })
        ));
    }

    #[test]
    fn test_bad_side() {
        assert!(matches!(
            parse("WIRE B1.top R1.left"),
            Err(BreadboardError::ParseError { line: 1, .. })
        ));
    }

    #[test]
    fn test_state_only_on_switches() {
        assert!(matches!(
            parse("RES R1 220 closed"),
            Err(BreadboardError::InvalidParameter { .. })
        ));
    }
}
