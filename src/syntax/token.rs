//! The [`Token`] type and its [`Logos`] lexer implementation.

use logos::{Lexer, Logos};

use crate::span::{Span, Spanned};

use super::SyntaxError;

/// An atomic token, lexed from Go source code.
///
/// Use [`tokenize`] rather than [`Token::lexer`] directly: the raw lexer
/// produces [`Token::Newline`] and comment tokens, which [`tokenize`] turns
/// into automatically inserted semicolons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Logos)]
#[logos(skip r"[ \t\r\f]+")]
pub enum Token {
    // WHITESPACE
    #[token("\n")]
    Newline,
    #[regex(r"//[^\n]*")]
    LineComment,
    #[token("/*", block_comment)]
    BlockComment,

    // BRACKETS
    #[token("(")]
    LeftParen,
    #[token(")")]
    RightParen,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,

    // PUNCTUATION
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token(":")]
    Colon,
    #[token("=")]
    Assign,
    #[token("*")]
    Star,
    #[token("~")]
    Tilde,
    #[token("|")]
    Pipe,
    #[token("<-")]
    Arrow,
    #[token("++")]
    Inc,
    #[token("--")]
    Dec,

    // OTHER OPERATORS
    #[token("+")]
    #[token("-")]
    #[token("/")]
    #[token("%")]
    #[token("&")]
    #[token("^")]
    #[token("<<")]
    #[token(">>")]
    #[token("&^")]
    #[token("+=")]
    #[token("-=")]
    #[token("*=")]
    #[token("/=")]
    #[token("%=")]
    #[token("&=")]
    #[token("|=")]
    #[token("^=")]
    #[token("<<=")]
    #[token(">>=")]
    #[token("&^=")]
    #[token("&&")]
    #[token("||")]
    #[token("==")]
    #[token("!=")]
    #[token("<")]
    #[token("<=")]
    #[token(">")]
    #[token(">=")]
    #[token(":=")]
    #[token("!")]
    Operator,

    // KEYWORDS
    #[token("break")]
    Break,
    #[token("case")]
    Case,
    #[token("chan")]
    Chan,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("defer")]
    Defer,
    #[token("else")]
    Else,
    #[token("fallthrough")]
    Fallthrough,
    #[token("for")]
    For,
    #[token("func")]
    Func,
    #[token("go")]
    Go,
    #[token("goto")]
    Goto,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("interface")]
    Interface,
    #[token("map")]
    Map,
    #[token("package")]
    Package,
    #[token("range")]
    Range,
    #[token("return")]
    Return,
    #[token("select")]
    Select,
    #[token("struct")]
    Struct,
    #[token("switch")]
    Switch,
    #[token("type")]
    Type,
    #[token("var")]
    Var,

    // LITERALS
    #[regex(r"0[xX][0-9a-fA-F_]+|0[bB][01_]+|0[oO][0-7_]+|[0-9][0-9_]*")]
    Int,
    #[regex(r"[0-9][0-9_]*\.[0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"[0-9][0-9_]*[eE][+-]?[0-9_]+")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?")]
    #[regex(r"0[xX][0-9a-fA-F_]*(\.[0-9a-fA-F_]*)?[pP][+-]?[0-9_]+")]
    Float,
    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9_]+)?i")]
    #[regex(r"\.[0-9][0-9_]*([eE][+-]?[0-9_]+)?i")]
    Imaginary,
    #[regex(r"'([^'\\\n]|\\[^\n])+'")]
    Rune,
    #[regex(r#""([^"\\\n]|\\[^\n])*""#)]
    String,
    #[regex(r"`[^`]*`")]
    RawString,

    // IDENTIFIERS
    #[regex(r"[\p{L}_][\p{L}\p{Nd}_]*")]
    Ident,
}

/// Consumes the rest of a block comment after its opening `/*`. An
/// unterminated comment is an invalid token.
fn block_comment(lexer: &mut Lexer<Token>) -> bool {
    match lexer.remainder().find("*/") {
        Some(end) => {
            lexer.bump(end + 2);
            true
        }
        None => {
            lexer.bump(lexer.remainder().len());
            false
        }
    }
}

impl Token {
    /// Returns `true` if a newline directly after this token terminates the
    /// current statement.
    pub fn ends_statement(self) -> bool {
        matches!(
            self,
            Token::Ident
                | Token::Int
                | Token::Float
                | Token::Imaginary
                | Token::Rune
                | Token::String
                | Token::RawString
                | Token::Break
                | Token::Continue
                | Token::Fallthrough
                | Token::Return
                | Token::Inc
                | Token::Dec
                | Token::RightParen
                | Token::RightBracket
                | Token::RightBrace
        )
    }

    pub fn is_string(self) -> bool {
        matches!(self, Token::String | Token::RawString)
    }

    /// A short human-readable description, used in error messages.
    pub fn describe(self) -> &'static str {
        match self {
            Token::Newline => "newline",
            Token::LineComment | Token::BlockComment => "comment",
            Token::LeftParen => "`(`",
            Token::RightParen => "`)`",
            Token::LeftBracket => "`[`",
            Token::RightBracket => "`]`",
            Token::LeftBrace => "`{`",
            Token::RightBrace => "`}`",
            Token::Comma => "`,`",
            Token::Semicolon => "`;`",
            Token::Dot => "`.`",
            Token::Ellipsis => "`...`",
            Token::Colon => "`:`",
            Token::Assign => "`=`",
            Token::Star => "`*`",
            Token::Tilde => "`~`",
            Token::Pipe => "`|`",
            Token::Arrow => "`<-`",
            Token::Inc => "`++`",
            Token::Dec => "`--`",
            Token::Operator => "operator",
            Token::Int
            | Token::Float
            | Token::Imaginary
            | Token::Rune
            | Token::String
            | Token::RawString => "literal",
            Token::Ident => "identifier",
            _ => "keyword",
        }
    }
}

/// Lexes `source` into a sequence of tokens, inserting semicolons the way Go
/// does and dropping comments.
pub fn tokenize(source: &str) -> Result<Box<[Spanned<Token>]>, SyntaxError> {
    let mut tokens: Vec<Spanned<Token>> = Vec::new();
    let mut lexer = Token::lexer(source);

    // a semicolon is inserted at a line break if the previous token allows it
    let insert_semicolon = |tokens: &mut Vec<Spanned<Token>>, at: Span| {
        if tokens.last().is_some_and(|tok| tok.item.ends_statement()) {
            tokens.push(at.with(Token::Semicolon));
        }
    };

    while let Some(result) = lexer.next() {
        let span = Span::from(lexer.span());

        match result {
            Ok(Token::Newline) => insert_semicolon(&mut tokens, span),
            Ok(Token::LineComment) => (),
            Ok(Token::BlockComment) => {
                if lexer.slice().contains('\n') {
                    insert_semicolon(&mut tokens, span);
                }
            }
            Ok(token) => tokens.push(span.with(token)),
            Err(()) => {
                return Err(SyntaxError::InvalidToken {
                    text: lexer.slice().into(),
                    span,
                });
            }
        }
    }

    let end = Span::new(source.len(), source.len());
    insert_semicolon(&mut tokens, end);
    Ok(tokens.into_boxed_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .unwrap()
            .iter()
            .map(|tok| tok.item)
            .collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("type Fetcher interface"),
            vec![Token::Type, Token::Ident, Token::Interface]
        );
        assert_eq!(kinds("types"), vec![Token::Ident, Token::Semicolon]);
        assert_eq!(kinds("héllo"), vec![Token::Ident, Token::Semicolon]);
    }

    #[test]
    fn semicolons_follow_go_rules() {
        let tokens = kinds("package p\n\nimport (\n\t\"fmt\"\n)\n");
        assert_eq!(
            tokens,
            vec![
                Token::Package,
                Token::Ident,
                Token::Semicolon,
                Token::Import,
                Token::LeftParen,
                Token::String,
                Token::Semicolon,
                Token::RightParen,
                Token::Semicolon,
            ]
        );

        // no semicolon after an opening brace or an operator
        assert_eq!(
            kinds("x := a +\nb {\n}"),
            vec![
                Token::Ident,
                Token::Operator,
                Token::Ident,
                Token::Operator,
                Token::Ident,
                Token::LeftBrace,
                Token::RightBrace,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn comments_are_dropped() {
        assert_eq!(
            kinds("a // trailing\n/* block\n */ b /* inline */ c"),
            vec![
                Token::Ident,
                Token::Semicolon,
                Token::Ident,
                Token::Ident,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn block_comment_forms() {
        assert_eq!(kinds("/* one line */ a"), vec![Token::Ident, Token::Semicolon]);
        assert_eq!(kinds("/** stars **/ a"), vec![Token::Ident, Token::Semicolon]);
        assert_eq!(kinds("/**/a"), vec![Token::Ident, Token::Semicolon]);
        assert_eq!(
            kinds("/*\nCopyright 2024 The Authors.\n*/\n\npackage p\n"),
            vec![Token::Package, Token::Ident, Token::Semicolon]
        );
        assert!(matches!(
            tokenize("a /* never closed"),
            Err(SyntaxError::InvalidToken { .. })
        ));
    }

    #[test]
    fn literals() {
        assert_eq!(
            kinds(r#"0x1F 0o17 017 1_000 1.5 .5 1e9 2i 'x' '\'' "a\"b" `raw`"#),
            vec![
                Token::Int,
                Token::Int,
                Token::Int,
                Token::Int,
                Token::Float,
                Token::Float,
                Token::Float,
                Token::Imaginary,
                Token::Rune,
                Token::Rune,
                Token::String,
                Token::RawString,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn channel_and_variadic_operators() {
        assert_eq!(
            kinds("<-chan ...int"),
            vec![
                Token::Arrow,
                Token::Chan,
                Token::Ellipsis,
                Token::Ident,
                Token::Semicolon,
            ]
        );
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(matches!(
            tokenize("\"abc\n"),
            Err(SyntaxError::InvalidToken { .. })
        ));
    }
}
