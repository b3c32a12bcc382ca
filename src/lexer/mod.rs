//! Lexer for MiniLisp source text

mod tokens;

pub use tokens::{Token, TokenKind};

use crate::common::Span;
use crate::diagnostics::LispError;
use logos::Logos;

/// Split source text into tokens, terminated by a single `Eof` token
pub fn lex(source: &str) -> Result<Vec<Token>, LispError> {
    let mut lexer = TokenKind::lexer(source);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        let span = Span::from(lexer.span());
        match result {
            Ok(kind) => tokens.push(Token {
                kind,
                span,
                text: lexer.slice().to_string(),
            }),
            Err(()) => {
                return Err(LispError::Syntax {
                    message: format!("unrecognized input `{}`", lexer.slice()),
                    span: span.into(),
                });
            }
        }
    }

    tokens.push(Token {
        kind: TokenKind::Eof,
        span: Span::new(source.len(), source.len()),
        text: String::new(),
    });

    tracing::trace!("Lexed {} tokens", tokens.len());
    Ok(tokens)
}
