//! Manual parser implementations for literal expressions.
//!
//! Parsers in this module assume that their inputs are well-formed with
//! respect to the lexer: a string literal may contain an invalid escape
//! sequence, but will *always* be correctly delimited.

use thiserror::Error;
use winnow::{
    PResult, Parser,
    combinator::{alt, delimited, dispatch, empty, fail, preceded, repeat},
    stream::AsChar,
    token::{any, one_of, take_till, take_while},
};

const BACKSLASH: char = '\\';
const DOUBLE_QUOTE: char = '"';
const BACKTICK: char = '`';
const UNDERSCORE: char = '_';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LiteralError {
    #[error("invalid string literal {0}")]
    String(Box<str>),
    #[error("invalid integer literal {0}")]
    Int(Box<str>),
}

/// Returns the value of an interpreted (`"..."`) or raw (`` `...` ``) string
/// literal.
///
/// Go strings are arbitrary byte sequences, so escapes producing invalid
/// UTF-8 are replaced with U+FFFD.
pub fn unquote(literal: &str) -> Result<String, LiteralError> {
    let result = match literal.starts_with(BACKTICK) {
        true => raw_string.parse(literal),
        false => interpreted_string.parse(literal),
    };

    result
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .map_err(|_| LiteralError::String(literal.into()))
}

/// Returns the value of an integer literal in any of Go's bases.
pub fn parse_int(literal: &str) -> Result<u64, LiteralError> {
    let mut parser = alt((
        preceded(('0', one_of(['x', 'X'])), digits::<16>),
        preceded(('0', one_of(['b', 'B'])), digits::<2>),
        preceded(('0', one_of(['o', 'O'])), digits::<8>),
        preceded('0', digits::<8>),
        digits::<10>,
    ));

    parser
        .parse(literal)
        .map_err(|_| LiteralError::Int(literal.into()))
}

#[derive(Debug, Clone, Copy)]
enum Fragment<'a> {
    Literal(&'a str),
    Char(char),
    Byte(u8),
}

impl Fragment<'_> {
    fn push_to(self, buf: &mut Vec<u8>) {
        match self {
            Fragment::Literal(s) => buf.extend_from_slice(s.as_bytes()),
            Fragment::Char(c) => {
                let mut encoded = [0; 4];
                buf.extend_from_slice(c.encode_utf8(&mut encoded).as_bytes())
            }
            Fragment::Byte(b) => buf.push(b),
        }
    }
}

fn raw_string(input: &mut &str) -> PResult<Vec<u8>> {
    delimited(BACKTICK, take_till(0.., BACKTICK), BACKTICK)
        // carriage returns are discarded from raw string literals
        .map(|s: &str| s.bytes().filter(|&b| b != b'\r').collect())
        .parse_next(input)
}

fn interpreted_string(input: &mut &str) -> PResult<Vec<u8>> {
    delimited(
        DOUBLE_QUOTE,
        repeat(0.., fragment).fold(Vec::new, |mut buf, frag: Fragment<'_>| {
            frag.push_to(&mut buf);
            buf
        }),
        DOUBLE_QUOTE,
    )
    .parse_next(input)
}

fn fragment<'a>(input: &mut &'a str) -> PResult<Fragment<'a>> {
    alt((
        take_till(1.., [DOUBLE_QUOTE, BACKSLASH]).map(Fragment::Literal),
        escape,
    ))
    .parse_next(input)
}

fn escape<'a>(input: &mut &'a str) -> PResult<Fragment<'a>> {
    preceded(
        BACKSLASH,
        alt((
            take_while(3, '0'..='7')
                .verify_map(|s: &str| u8::from_str_radix(s, 8).ok())
                .map(Fragment::Byte),
            dispatch! {any;
                'a' => empty.value(Fragment::Byte(0x07)),
                'b' => empty.value(Fragment::Byte(0x08)),
                'f' => empty.value(Fragment::Byte(0x0C)),
                'n' => empty.value(Fragment::Byte(b'\n')),
                'r' => empty.value(Fragment::Byte(b'\r')),
                't' => empty.value(Fragment::Byte(b'\t')),
                'v' => empty.value(Fragment::Byte(0x0B)),
                '\\' => empty.value(Fragment::Byte(b'\\')),
                '"' => empty.value(Fragment::Byte(b'"')),
                'x' => hex_digits::<2>.map(|v| Fragment::Byte(v as u8)),
                'u' => hex_digits::<4>.verify_map(char::from_u32).map(Fragment::Char),
                'U' => hex_digits::<8>.verify_map(char::from_u32).map(Fragment::Char),
                _ => fail,
            },
        )),
    )
    .parse_next(input)
}

fn hex_digits<const N: usize>(input: &mut &str) -> PResult<u32> {
    take_while(N, AsChar::is_hex_digit)
        .verify_map(|s: &str| u32::from_str_radix(s, 16).ok())
        .parse_next(input)
}

/// Parses a nonempty sequence of digits in the given radix, ignoring
/// underscores and failing on overflow.
fn digits<const RADIX: u32>(input: &mut &str) -> PResult<u64> {
    take_while(1.., |c: char| c == UNDERSCORE || c.is_digit(RADIX))
        .verify_map(|s: &str| {
            let mut chars = s.chars().filter(|&c| c != UNDERSCORE).peekable();
            chars.peek()?;

            chars.try_fold(0u64, |acc, c| {
                acc.checked_mul(RADIX as u64)?
                    .checked_add(c.to_digit(RADIX)? as u64)
            })
        })
        .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpreted_strings() {
        assert_eq!(unquote(r#""context""#).unwrap(), "context");
        assert_eq!(unquote(r#""""#).unwrap(), "");
        assert_eq!(unquote(r#""a\tb\n""#).unwrap(), "a\tb\n");
        assert_eq!(unquote(r#""\"quoted\"""#).unwrap(), "\"quoted\"");
        assert_eq!(unquote(r#""\x41\102é\U0001F600""#).unwrap(), "ABé😀");
    }

    #[test]
    fn raw_strings() {
        assert_eq!(unquote("`json:\"id\"`").unwrap(), "json:\"id\"");
        assert_eq!(unquote("`a\r\nb`").unwrap(), "a\nb");
        assert_eq!(unquote(r"`\n`").unwrap(), r"\n");
    }

    #[test]
    fn bad_escapes_are_rejected() {
        assert!(unquote(r#""\q""#).is_err());
        assert!(unquote(r#""\400""#).is_err());
        assert!(unquote(r#""\xZZ""#).is_err());
        assert!(unquote(r#""\uD800""#).is_err());
    }

    #[test]
    fn integers() {
        assert_eq!(parse_int("0"), Ok(0));
        assert_eq!(parse_int("42"), Ok(42));
        assert_eq!(parse_int("1_000_000"), Ok(1_000_000));
        assert_eq!(parse_int("0x1F"), Ok(31));
        assert_eq!(parse_int("0X_ff"), Ok(255));
        assert_eq!(parse_int("0b1010"), Ok(10));
        assert_eq!(parse_int("0o17"), Ok(15));
        assert_eq!(parse_int("017"), Ok(15));
    }

    #[test]
    fn integer_overflow_is_an_error() {
        assert_eq!(parse_int("18446744073709551615"), Ok(u64::MAX));
        assert!(parse_int("18446744073709551616").is_err());
        assert!(parse_int("0x").is_err());
    }
}
