// ABOUTME: Recursive descent parser for notification template source
// ABOUTME: Exports the token stream, AST, and block structure parsing for if/range/else

pub mod ast;
pub mod error;
mod expr;
pub mod lexer;

pub use ast::{Branch, Command, Expr, Node, Pipeline, Span};
pub use error::{ParseError, ParseResult};
pub use lexer::{Lexer, Token, TokenKind};

use crate::template::helpers::FuncRegistry;

/// How a run of nodes ended, used to stitch block structure together.
enum Terminator {
    Eof,
    End,
    Else,
    /// `{{else if ...}}`, the `if` token is left for the caller to consume.
    ElseIf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    Range,
}

/// Token cursor with the registry needed to validate function names at parse time.
pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    funcs: &'a FuncRegistry,
}

impl<'a> Parser<'a> {
    /// Parse template source into a node list.
    ///
    /// Function names are checked against `funcs` up front, so a template
    /// calling an unknown helper fails here rather than mid-render.
    pub fn parse(source: &str, funcs: &'a FuncRegistry) -> ParseResult<Vec<Node>> {
        let tokens = Lexer::new(source).tokenize()?;
        let mut parser = Parser {
            tokens,
            pos: 0,
            funcs,
        };
        let (nodes, terminator) = parser.parse_nodes()?;
        match terminator {
            Terminator::Eof => Ok(nodes),
            Terminator::End => Err(ParseError::new(
                "unexpected {{end}}",
                parser.previous_span(),
            )),
            Terminator::Else | Terminator::ElseIf => Err(ParseError::new(
                "unexpected {{else}}",
                parser.previous_span(),
            )),
        }
    }

    /// Parse nodes until a block terminator or the end of input.
    fn parse_nodes(&mut self) -> ParseResult<(Vec<Node>, Terminator)> {
        let mut nodes = Vec::new();
        loop {
            let token = self.advance();
            match token.kind {
                TokenKind::Text(text) => nodes.push(Node::Text(text)),
                TokenKind::Eof => return Ok((nodes, Terminator::Eof)),
                TokenKind::LeftDelim => {
                    if self.check(&TokenKind::If) {
                        self.advance();
                        nodes.push(Node::If(self.parse_branch(BlockKind::If)?));
                    } else if self.check(&TokenKind::Range) {
                        self.advance();
                        nodes.push(Node::Range(self.parse_branch(BlockKind::Range)?));
                    } else if self.check(&TokenKind::End) {
                        self.advance();
                        self.expect(TokenKind::RightDelim)?;
                        return Ok((nodes, Terminator::End));
                    } else if self.check(&TokenKind::Else) {
                        self.advance();
                        if self.check(&TokenKind::If) {
                            return Ok((nodes, Terminator::ElseIf));
                        }
                        self.expect(TokenKind::RightDelim)?;
                        return Ok((nodes, Terminator::Else));
                    } else {
                        let pipe = self.parse_pipeline()?;
                        if pipe.decls.len() > 1 {
                            return Err(ParseError::new(
                                "too many declarations in command",
                                pipe.span,
                            ));
                        }
                        self.expect(TokenKind::RightDelim)?;
                        nodes.push(Node::Action(pipe));
                    }
                }
                other => {
                    return Err(ParseError::unexpected_token(
                        "text or \"{{\"",
                        other.name(),
                        token.span,
                    ));
                }
            }
        }
    }

    /// Parse an `if` or `range` block after its keyword has been consumed.
    fn parse_branch(&mut self, kind: BlockKind) -> ParseResult<Branch> {
        let span = self.peek().span;
        let pipe = self.parse_pipeline()?;
        let max_decls = match kind {
            BlockKind::If => 1,
            BlockKind::Range => 2,
        };
        if pipe.decls.len() > max_decls {
            let message = match kind {
                BlockKind::If => "too many declarations in if",
                BlockKind::Range => "too many declarations in range",
            };
            return Err(ParseError::new(message, pipe.span));
        }
        self.expect(TokenKind::RightDelim)?;
        let (body, terminator) = self.parse_nodes()?;
        let else_body = match terminator {
            Terminator::End => Vec::new(),
            Terminator::Else => {
                let (nodes, terminator) = self.parse_nodes()?;
                match terminator {
                    Terminator::End => nodes,
                    Terminator::Eof => {
                        return Err(ParseError::unexpected_eof("{{end}}", self.previous_span()));
                    }
                    Terminator::Else | Terminator::ElseIf => {
                        return Err(ParseError::new("unexpected {{else}}", self.previous_span()));
                    }
                }
            }
            Terminator::ElseIf => {
                self.expect(TokenKind::If)?;
                vec![Node::If(self.parse_branch(BlockKind::If)?)]
            }
            Terminator::Eof => {
                return Err(ParseError::unexpected_eof("{{end}}", self.previous_span()));
            }
        };
        Ok(Branch {
            pipe,
            body,
            else_body,
            span,
        })
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        self.peek().kind == *kind
    }

    fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(ParseError::unexpected_token(
                kind.name(),
                self.peek().kind.name(),
                self.peek().span,
            ))
        }
    }

    fn previous_span(&self) -> Span {
        let index = self.pos.saturating_sub(1).min(self.tokens.len() - 1);
        self.tokens[index].span
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParseResult<Vec<Node>> {
        let funcs = FuncRegistry::standard();
        Parser::parse(source, &funcs)
    }

    #[test]
    fn test_parses_text_and_action() {
        let nodes = parse("Hello {{ .Trigger.Name }}!").expect("parse failed");
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0], Node::Text("Hello ".into()));
        assert!(matches!(nodes[1], Node::Action(_)));
        assert_eq!(nodes[2], Node::Text("!".into()));
    }

    #[test]
    fn test_parses_if_else_blocks() {
        let nodes = parse("{{ if .Events }}some{{ else }}none{{ end }}").expect("parse failed");
        assert_eq!(nodes.len(), 1);
        let branch = match &nodes[0] {
            Node::If(branch) => branch,
            other => panic!("expected if node, got {other:?}"),
        };
        assert_eq!(branch.body, vec![Node::Text("some".into())]);
        assert_eq!(branch.else_body, vec![Node::Text("none".into())]);
    }

    #[test]
    fn test_parses_else_if_chains_into_nested_branches() {
        let nodes =
            parse("{{ if .A }}a{{ else if .B }}b{{ else }}c{{ end }}").expect("parse failed");
        let outer = match &nodes[0] {
            Node::If(branch) => branch,
            other => panic!("expected if node, got {other:?}"),
        };
        assert_eq!(outer.body, vec![Node::Text("a".into())]);
        let inner = match &outer.else_body[0] {
            Node::If(branch) => branch,
            other => panic!("expected nested if, got {other:?}"),
        };
        assert_eq!(inner.body, vec![Node::Text("b".into())]);
        assert_eq!(inner.else_body, vec![Node::Text("c".into())]);
    }

    #[test]
    fn test_parses_range_with_index_and_value() {
        let nodes = parse("{{ range $i, $v := .Events }}x{{ end }}").expect("parse failed");
        let branch = match &nodes[0] {
            Node::Range(branch) => branch,
            other => panic!("expected range node, got {other:?}"),
        };
        assert_eq!(branch.pipe.decls, vec!["$i".to_string(), "$v".to_string()]);
        assert!(!branch.pipe.assign);
    }

    #[test]
    fn test_parses_range_with_else_branch() {
        let nodes = parse("{{ range .Events }}x{{ else }}empty{{ end }}").expect("parse failed");
        let branch = match &nodes[0] {
            Node::Range(branch) => branch,
            other => panic!("expected range node, got {other:?}"),
        };
        assert_eq!(branch.else_body, vec![Node::Text("empty".into())]);
    }

    #[test]
    fn test_rejects_unknown_function_at_parse_time() {
        let err = parse("{{ decrease 300 }}").unwrap_err();
        assert!(err.message.contains("function \"decrease\" not defined"));
    }

    #[test]
    fn test_rejects_unexpected_end() {
        let err = parse("text {{ end }}").unwrap_err();
        assert!(err.message.contains("unexpected {{end}}"));
    }

    #[test]
    fn test_rejects_missing_end() {
        let err = parse("{{ range .Events }}x").unwrap_err();
        assert!(err.message.contains("expected {{end}}"));
    }

    #[test]
    fn test_rejects_too_many_declarations_in_action() {
        let err = parse("{{ $a, $b := .Events }}").unwrap_err();
        assert!(err.message.contains("too many declarations"));
    }

    #[test]
    fn test_reports_line_and_column() {
        let err = parse("line one\n{{ nosuch }}").unwrap_err();
        assert_eq!(err.line, 2);
        assert!(err.message.contains("not defined"));
    }
}
