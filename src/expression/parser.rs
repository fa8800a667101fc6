use crate::expression::ast::{BinaryOp, Expr};
use crate::expression::error::ExprError;
use crate::expression::lexer::{Span, Token, TokenKind, lex};

/// Parse `src` into an expression tree. A leading `=` is accepted and ignored.
pub(crate) fn parse_expr(src: &str) -> Result<Expr, ExprError> {
    let src = src.trim();
    let src = src.strip_prefix('=').unwrap_or(src);
    if src.trim().is_empty() {
        return Err(ExprError::new(0, "empty expression"));
    }
    let tokens = lex(src)?;
    let mut p = Parser { tokens, pos: 0 };
    let expr = p.parse_term()?;
    p.expect(TokenKind::Eof)?;
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn bump(&mut self) -> Token {
        let t = self.tokens[self.pos].clone();
        // Eof is never consumed past.
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        t
    }

    fn span(&self) -> Span {
        self.peek().span
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), ExprError> {
        if self.peek().kind == kind {
            self.bump();
            Ok(())
        } else {
            Err(ExprError::new(
                self.span().start,
                format!("expected {kind:?}, found {:?}", self.peek().kind),
            ))
        }
    }

    fn consume(&mut self, kind: TokenKind) -> Option<Span> {
        if self.peek().kind == kind {
            Some(self.bump().span)
        } else {
            None
        }
    }

    fn parse_term(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.parse_factor()?;
        loop {
            let (op, span) = if let Some(s) = self.consume(TokenKind::Plus) {
                (BinaryOp::Add, s)
            } else if let Some(s) = self.consume(TokenKind::Minus) {
                (BinaryOp::Sub, s)
            } else {
                break;
            };
            let r = self.parse_factor()?;
            e = Expr::Binary {
                op,
                left: Box::new(e),
                right: Box::new(r),
                offset: span.start,
            };
        }
        Ok(e)
    }

    fn parse_factor(&mut self) -> Result<Expr, ExprError> {
        let mut e = self.parse_unary()?;
        loop {
            let (op, span) = if let Some(s) = self.consume(TokenKind::Star) {
                (BinaryOp::Mul, s)
            } else if let Some(s) = self.consume(TokenKind::Slash) {
                (BinaryOp::Div, s)
            } else if let Some(s) = self.consume(TokenKind::Percent) {
                (BinaryOp::Mod, s)
            } else {
                break;
            };
            let r = self.parse_unary()?;
            e = Expr::Binary {
                op,
                left: Box::new(e),
                right: Box::new(r),
                offset: span.start,
            };
        }
        Ok(e)
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        if self.consume(TokenKind::Minus).is_some() {
            let e = self.parse_unary()?;
            return Ok(Expr::Neg(Box::new(e)));
        }
        if self.consume(TokenKind::Plus).is_some() {
            return self.parse_unary();
        }
        self.parse_primary()
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ExprError> {
        let mut args = Vec::new();
        if self.consume(TokenKind::RParen).is_some() {
            return Ok(args);
        }
        loop {
            args.push(self.parse_term()?);
            if self.consume(TokenKind::Comma).is_some() {
                continue;
            }
            self.expect(TokenKind::RParen)?;
            return Ok(args);
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let t = self.bump();
        match t.kind {
            TokenKind::Number(v) => Ok(Expr::Num(v)),
            TokenKind::Ident(name) => {
                if self.consume(TokenKind::LParen).is_some() {
                    let args = self.parse_args()?;
                    Ok(Expr::Call {
                        func: name,
                        args,
                        offset: t.span.start,
                    })
                } else {
                    Ok(Expr::Ident {
                        name,
                        offset: t.span.start,
                    })
                }
            }
            TokenKind::LParen => {
                let e = self.parse_term()?;
                self.expect(TokenKind::RParen)?;
                Ok(e)
            }
            other => Err(ExprError::new(
                t.span.start,
                format!("unexpected token {other:?}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_arithmetic_precedence() {
        let e = parse_expr("=1+2*3").unwrap();
        match e {
            Expr::Binary {
                op: BinaryOp::Add,
                right,
                ..
            } => assert!(matches!(
                *right,
                Expr::Binary {
                    op: BinaryOp::Mul,
                    ..
                }
            )),
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn parses_calls() {
        let e = parse_expr("max(pi, 2)").unwrap();
        match e {
            Expr::Call { func, args, .. } => {
                assert_eq!(func, "max");
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected ast: {other:?}"),
        }
    }

    #[test]
    fn rejects_dangling_and_empty_input() {
        assert!(parse_expr("").is_err());
        assert!(parse_expr("  = ").is_err());
        assert!(parse_expr("pi/").is_err());
        assert!(parse_expr("(1+2").is_err());
        assert_eq!(parse_expr("1 2").unwrap_err().offset, 2);
    }
}
