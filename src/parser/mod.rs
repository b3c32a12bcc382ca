//! Reader for MiniLisp
//!
//! A recursive descent parser that groups a token stream into forms by
//! parenthesis depth. No semantic checks happen here.

use crate::ast::Form;
use crate::common::Span;
use crate::diagnostics::LispError;
use crate::lexer::{Token, TokenKind};

/// Parse a token stream into top-level forms, one per statement
pub fn parse(tokens: &[Token]) -> Result<Vec<Form>, LispError> {
    let mut parser = Parser::new(tokens);
    parser.parse_program()
}

/// Parser state
struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn peek(&self) -> TokenKind {
        self.current().map(|t| t.kind).unwrap_or(TokenKind::Eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == kind
    }

    fn advance(&mut self) -> Option<&'a Token> {
        let tok = self.current();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn span(&self) -> Span {
        self.current().map(|t| t.span).unwrap_or_default()
    }

    fn parse_program(&mut self) -> Result<Vec<Form>, LispError> {
        let mut forms = Vec::new();
        while !self.at(TokenKind::Eof) {
            forms.push(self.parse_form()?);
        }
        Ok(forms)
    }

    fn parse_form(&mut self) -> Result<Form, LispError> {
        match self.peek() {
            TokenKind::LParen => self.parse_list(),
            TokenKind::RParen => Err(LispError::UnexpectedCloseParen {
                span: self.span().into(),
            }),
            TokenKind::Atom => {
                let tok = self.advance().ok_or_else(|| LispError::Syntax {
                    message: "unexpected end of input".into(),
                    span: self.span().into(),
                })?;
                Ok(Form::atom(tok.text.clone(), tok.span))
            }
            TokenKind::Eof => Err(LispError::Syntax {
                message: "unexpected end of input".into(),
                span: self.span().into(),
            }),
        }
    }

    fn parse_list(&mut self) -> Result<Form, LispError> {
        let open = self.span();
        self.advance();

        let mut items = Vec::new();
        loop {
            match self.peek() {
                TokenKind::RParen => {
                    let close = self.span();
                    self.advance();
                    return Ok(Form::list(items, open.merge(close)));
                }
                TokenKind::Eof => {
                    return Err(LispError::UnclosedParen { span: open.into() });
                }
                _ => items.push(self.parse_form()?),
            }
        }
    }
}
