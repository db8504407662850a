//! A front-end for the parts of Go that declare types.

use thiserror::Error;

use crate::{span::Span, symbol::StringInterner};

pub mod ast;
pub mod constraint;
pub mod literal;
pub mod parser;
pub mod token;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("invalid token `{text}`")]
    InvalidToken { text: Box<str>, span: Span },
    #[error("expected {expected}, found {found}")]
    Unexpected {
        expected: &'static str,
        found: &'static str,
        span: Span,
    },
    #[error("{message}")]
    Invalid { message: &'static str, span: Span },
    #[error("{error}")]
    Literal {
        error: literal::LiteralError,
        span: Span,
    },
}

impl SyntaxError {
    pub fn span(&self) -> Span {
        match self {
            SyntaxError::InvalidToken { span, .. }
            | SyntaxError::Unexpected { span, .. }
            | SyntaxError::Invalid { span, .. }
            | SyntaxError::Literal { span, .. } => *span,
        }
    }
}

/// Parses a complete Go source file.
pub fn parse_file(
    source: &str,
    interner: &mut StringInterner,
) -> Result<ast::File, SyntaxError> {
    parser::Parser::new(source, interner)?.parse_file()
}
