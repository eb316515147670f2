// ABOUTME: Pipeline and operand parsing for template actions
// ABOUTME: Covers variable declarations, command chains, and function name validation

use super::ast::{Command, Expr, Pipeline};
use super::error::{ParseError, ParseResult};
use super::lexer::TokenKind;
use super::Parser;

impl Parser<'_> {
    /// Parse a pipeline: optional variable bindings, then commands joined by `|`.
    pub(super) fn parse_pipeline(&mut self) -> ParseResult<Pipeline> {
        let span = self.peek().span;
        let (decls, assign) = self.try_parse_decls();
        let mut cmds = vec![self.parse_command()?];
        while self.check(&TokenKind::Pipe) {
            self.advance();
            cmds.push(self.parse_command()?);
        }
        Ok(Pipeline {
            decls,
            assign,
            cmds,
            span,
        })
    }

    /// Try to read `$a, $b :=` or `$a =` at the start of a pipeline.
    /// Backtracks when the variables turn out to be plain operands.
    fn try_parse_decls(&mut self) -> (Vec<String>, bool) {
        let reset = self.pos;
        let mut names = Vec::new();
        loop {
            match self.peek().kind.clone() {
                TokenKind::Variable(name) => {
                    self.advance();
                    names.push(name);
                }
                _ => break,
            }
            if self.check(&TokenKind::Comma) {
                self.advance();
                continue;
            }
            if self.check(&TokenKind::Declare) {
                self.advance();
                return (names, false);
            }
            if self.check(&TokenKind::Assign) {
                self.advance();
                return (names, true);
            }
            break;
        }
        self.pos = reset;
        (Vec::new(), false)
    }

    fn parse_command(&mut self) -> ParseResult<Command> {
        let span = self.peek().span;
        let mut args = Vec::new();
        while self.starts_operand() {
            args.push(self.parse_operand()?);
        }
        if args.is_empty() {
            return Err(ParseError::unexpected_token(
                "command",
                self.peek().kind.name(),
                self.peek().span,
            ));
        }
        Ok(Command { args, span })
    }

    fn starts_operand(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Nil
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Int(_)
                | TokenKind::Float(_)
                | TokenKind::Str(_)
                | TokenKind::Dot
                | TokenKind::Field(_)
                | TokenKind::Variable(_)
                | TokenKind::Ident(_)
                | TokenKind::LParen
        )
    }

    fn parse_operand(&mut self) -> ParseResult<Expr> {
        let token = self.advance();
        let span = token.span;
        let expr = match token.kind {
            TokenKind::Nil => Expr::Nil(span),
            TokenKind::True => Expr::Bool(true, span),
            TokenKind::False => Expr::Bool(false, span),
            TokenKind::Int(value) => Expr::Int(value, span),
            TokenKind::Float(value) => Expr::Float(value, span),
            TokenKind::Str(value) => Expr::Str(value, span),
            TokenKind::Dot => Expr::Dot(span),
            TokenKind::Field(first) => {
                let mut fields = vec![first];
                fields.extend(self.parse_field_chain());
                Expr::Field(fields, span)
            }
            TokenKind::Variable(name) => Expr::Variable(name, self.parse_field_chain(), span),
            TokenKind::Ident(name) => {
                if !self.funcs.contains(&name) {
                    return Err(ParseError::new(format!("function {name:?} not defined"), span));
                }
                Expr::Func(name, span)
            }
            TokenKind::LParen => {
                let pipe = self.parse_pipeline()?;
                if !pipe.decls.is_empty() {
                    return Err(ParseError::new(
                        "unexpected declaration in parenthesized pipeline",
                        pipe.span,
                    ));
                }
                self.expect(TokenKind::RParen)?;
                Expr::Paren(Box::new(pipe), self.parse_field_chain(), span)
            }
            other => {
                return Err(ParseError::unexpected_token("operand", other.name(), span));
            }
        };
        Ok(expr)
    }

    /// Collect any `.Field` segments that follow an operand.
    fn parse_field_chain(&mut self) -> Vec<String> {
        let mut fields = Vec::new();
        loop {
            match self.peek().kind.clone() {
                TokenKind::Field(name) => {
                    self.advance();
                    fields.push(name);
                }
                _ => return fields,
            }
        }
    }
}
