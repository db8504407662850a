//! Build constraints: `//go:build` lines, legacy `// +build` lines and
//! `_GOOS`/`_GOARCH` file name suffixes.

use thiserror::Error;
use winnow::{
    PResult, Parser,
    ascii::space0,
    combinator::{alt, delimited, preceded, repeat, terminated},
    token::take_while,
};

/// Operating systems recognized in file name suffixes.
const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos",
    "ios", "js", "linux", "nacl", "netbsd", "openbsd", "plan9", "solaris",
    "wasip1", "windows", "zos",
];

/// Architectures recognized in file name suffixes.
const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64",
    "mips", "mipsle", "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc",
    "ppc64", "ppc64le", "riscv", "riscv64", "s390", "s390x", "sparc",
    "sparc64", "wasm",
];

/// Operating systems satisfying the `unix` tag.
const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos",
    "ios", "linux", "netbsd", "openbsd", "solaris",
];

const GO_BUILD_PREFIX: &str = "//go:build";
const PLUS_BUILD_PREFIX: &str = "+build";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Tag(Box<str>),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("invalid //go:build line: {0}")]
    GoBuild(Box<str>),
    #[error("invalid // +build line: {0}")]
    PlusBuild(Box<str>),
    #[error("multiple //go:build lines")]
    MultipleGoBuild,
}

/// The configuration that build constraints are evaluated against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub goos: Box<str>,
    pub goarch: Box<str>,
    pub cgo: bool,
    /// Additional user-supplied tags.
    pub tags: Box<[Box<str>]>,
    /// The minor version of the newest release tag, so `22` satisfies
    /// `go1.1` through `go1.22`.
    pub release: u32,
}

impl BuildContext {
    /// Returns `true` if `tag` is satisfied.
    pub fn matches(&self, tag: &str) -> bool {
        let goos = &*self.goos;

        if tag == goos || tag == &*self.goarch || tag == "gc" {
            return true;
        }

        match tag {
            "unix" => UNIX_OS.contains(&goos),
            "cgo" => self.cgo,
            "linux" => goos == "android",
            "solaris" => goos == "illumos",
            "darwin" => goos == "ios",
            _ => match tag.strip_prefix("go1.") {
                Some(minor) => minor
                    .parse::<u32>()
                    .is_ok_and(|minor| minor >= 1 && minor <= self.release),
                None => self.tags.iter().any(|t| &**t == tag),
            },
        }
    }

    pub fn eval(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Tag(tag) => self.matches(tag),
            Expr::Not(inner) => !self.eval(inner),
            Expr::And(lhs, rhs) => self.eval(lhs) && self.eval(rhs),
            Expr::Or(lhs, rhs) => self.eval(lhs) || self.eval(rhs),
        }
    }

    /// Checks the `_GOOS`, `_GOARCH` and `_GOOS_GOARCH` suffixes of a file
    /// name.
    pub fn matches_file_name(&self, name: &str) -> bool {
        let stem = name.strip_suffix(".go").unwrap_or(name);
        let Some((_, rest)) = stem.split_once('_') else {
            return true;
        };

        let mut parts: Vec<&str> = rest.split('_').collect();
        if parts.last() == Some(&"test") {
            parts.pop();
        }

        match parts.as_slice() {
            [.., os, arch] if KNOWN_OS.contains(os) && KNOWN_ARCH.contains(arch) => {
                self.matches(os) && self.matches(arch)
            }
            [.., last] if KNOWN_OS.contains(last) || KNOWN_ARCH.contains(last) => {
                self.matches(last)
            }
            _ => true,
        }
    }

    /// Returns `true` if a file with this name and contents belongs in the
    /// build.
    pub fn includes(
        &self,
        name: &str,
        source: &str,
    ) -> Result<bool, ConstraintError> {
        if !self.matches_file_name(name) {
            return Ok(false);
        }

        Ok(file_constraint(source)?.is_none_or(|expr| self.eval(&expr)))
    }
}

/// Extracts the build constraint from the header of a Go file.
///
/// A `//go:build` line takes precedence over `// +build` lines. The latter
/// only count when their comment block is followed by a blank line.
pub fn file_constraint(source: &str) -> Result<Option<Expr>, ConstraintError> {
    let mut go_build = None;
    let mut committed: Vec<Expr> = Vec::new();
    let mut pending: Vec<Expr> = Vec::new();
    let mut in_block_comment = false;

    for line in source.lines() {
        let line = line.trim();

        if in_block_comment {
            in_block_comment = !line.contains("*/");
            continue;
        }

        if line.is_empty() {
            committed.append(&mut pending);
        } else if let Some(rest) = line.strip_prefix(GO_BUILD_PREFIX) {
            if go_build.is_some() {
                return Err(ConstraintError::MultipleGoBuild);
            }
            go_build = Some(parse_go_build(rest)?);
        } else if let Some(comment) = line.strip_prefix("//") {
            if let Some(rest) = comment.trim_start().strip_prefix(PLUS_BUILD_PREFIX)
            {
                pending.push(parse_plus_build(rest)?);
            }
        } else if line.starts_with("/*") {
            in_block_comment = !line.contains("*/");
        } else {
            break;
        }
    }

    if go_build.is_some() {
        return Ok(go_build);
    }

    Ok(committed
        .into_iter()
        .reduce(|lhs, rhs| Expr::And(Box::new(lhs), Box::new(rhs))))
}

/// Parses the expression following `//go:build`.
pub fn parse_go_build(text: &str) -> Result<Expr, ConstraintError> {
    terminated(expr, space0)
        .parse(text)
        .map_err(|_| ConstraintError::GoBuild(text.trim().into()))
}

/// Parses the options following `// +build`: space-separated options are
/// OR'd, and comma-separated terms within an option are AND'd.
pub fn parse_plus_build(text: &str) -> Result<Expr, ConstraintError> {
    let error = || ConstraintError::PlusBuild(text.trim().into());

    let options = text.split_whitespace().map(|option| {
        option
            .split(',')
            .map(|term| {
                let (negated, name) = match term.strip_prefix('!') {
                    Some(name) => (true, name),
                    None => (false, term),
                };

                if name.is_empty() || !name.chars().all(is_tag_char) {
                    return Err(error());
                }

                let tag = Expr::Tag(name.into());
                Ok(match negated {
                    true => Expr::Not(Box::new(tag)),
                    false => tag,
                })
            })
            .reduce(|lhs, rhs| Ok(Expr::And(Box::new(lhs?), Box::new(rhs?))))
            .unwrap_or_else(|| Err(error()))
    });

    options
        .reduce(|lhs, rhs| Ok(Expr::Or(Box::new(lhs?), Box::new(rhs?))))
        .unwrap_or_else(|| Err(error()))
}

fn is_tag_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

fn expr(input: &mut &str) -> PResult<Expr> {
    let first = and_expr.parse_next(input)?;
    repeat(0.., preceded((space0, "||"), and_expr))
        .fold(
            move || first.clone(),
            |lhs, rhs| Expr::Or(Box::new(lhs), Box::new(rhs)),
        )
        .parse_next(input)
}

fn and_expr(input: &mut &str) -> PResult<Expr> {
    let first = unary.parse_next(input)?;
    repeat(0.., preceded((space0, "&&"), unary))
        .fold(
            move || first.clone(),
            |lhs, rhs| Expr::And(Box::new(lhs), Box::new(rhs)),
        )
        .parse_next(input)
}

fn unary(input: &mut &str) -> PResult<Expr> {
    preceded(
        space0,
        alt((
            preceded('!', unary).map(|inner| Expr::Not(Box::new(inner))),
            delimited('(', expr, (space0, ')')),
            take_while(1.., is_tag_char).map(|tag: &str| Expr::Tag(tag.into())),
        )),
    )
    .parse_next(input)
}
