//! Syntax tree for MiniLisp
//!
//! The reader produces one [`Form`] per top-level statement. Forms are never
//! mutated after parsing.

use crate::common::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A parsed syntactic unit: an atom or a parenthesized list of forms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub kind: FormKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FormKind {
    /// Uninterpreted token text
    Atom(String),
    /// `( ... )`
    List(Vec<Form>),
}

impl Form {
    pub fn atom(text: impl Into<String>, span: Span) -> Self {
        Form {
            kind: FormKind::Atom(text.into()),
            span,
        }
    }

    pub fn list(items: Vec<Form>, span: Span) -> Self {
        Form {
            kind: FormKind::List(items),
            span,
        }
    }

    pub fn as_atom(&self) -> Option<&str> {
        match &self.kind {
            FormKind::Atom(text) => Some(text),
            FormKind::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Form]> {
        match &self.kind {
            FormKind::List(items) => Some(items),
            FormKind::Atom(_) => None,
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self.kind, FormKind::List(_))
    }

    /// Whether this is a list whose head is the atom `keyword`
    pub fn is_special(&self, keyword: &str) -> bool {
        self.as_list()
            .and_then(|items| items.first())
            .and_then(Form::as_atom)
            .is_some_and(|head| head == keyword)
    }
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FormKind::Atom(text) => write!(f, "{}", text),
            FormKind::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Check the identifier grammar: a lowercase letter, then lowercase letters or `-`
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {
            chars.all(|c| c.is_ascii_lowercase() || c == '-')
        }
        _ => false,
    }
}
