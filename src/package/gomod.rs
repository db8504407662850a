//! Module metadata parsed from `go.mod` files.

use std::path::Path;

use semver::Version;
use thiserror::Error;
use winnow::{
    PResult, Parser,
    ascii::space0,
    combinator::{alt, delimited, preceded, repeat, terminated},
    token::take_till,
};

pub const GO_MOD_FILE: &str = "go.mod";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoMod {
    /// The module path declared by the `module` directive.
    pub module: Box<str>,
    /// The language version declared by the `go` directive.
    pub go: Option<Box<str>>,
    pub require: Box<[Require]>,
    pub replace: Box<[Replace]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Require {
    pub path: Box<str>,
    pub version: ModVersion,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replace {
    pub old: Box<str>,
    pub old_version: Option<ModVersion>,
    pub new: ReplaceTarget,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceTarget {
    /// A directory, relative to the directory containing `go.mod`.
    Dir(Box<Path>),
    Module { path: Box<str>, version: ModVersion },
}

/// A module version as written in `go.mod`, like `v1.2.3` or
/// `v0.0.0-20240101000000-abcdef123456`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModVersion {
    pub raw: Box<str>,
    pub semver: Version,
}

#[derive(Debug, Error)]
pub enum GoModError {
    #[error("Failed to read go.mod: {0}")]
    Io(#[from] std::io::Error),
    #[error("go.mod:{line}: {message}")]
    Syntax { line: usize, message: &'static str },
    #[error("go.mod:{line}: invalid version {version}")]
    Version { line: usize, version: Box<str> },
    #[error("go.mod has no module directive")]
    MissingModule,
}

impl ModVersion {
    pub fn parse(raw: &str) -> Option<Self> {
        let semver = Version::parse(raw.strip_prefix('v')?).ok()?;
        Some(ModVersion {
            raw: raw.into(),
            semver,
        })
    }
}

impl GoMod {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GoModError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(text: &str) -> Result<Self, GoModError> {
        let mut module = None;
        let mut go = None;
        let mut require: Vec<Require> = Vec::new();
        let mut replace = Vec::new();
        let mut block: Option<Box<str>> = None;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let syntax = |message| GoModError::Syntax {
                line: line_no,
                message,
            };

            let content = strip_comment(line);
            let words = words
                .parse(content)
                .map_err(|_| syntax("unterminated string"))?;

            let (directive, args) = match (&block, words.as_slice()) {
                (_, []) => continue,
                (Some(_), [close]) if close == ")" => {
                    block = None;
                    continue;
                }
                (Some(directive), args) => (directive.clone(), args),
                (None, [directive, open]) if open == "(" => {
                    block = Some(directive.as_str().into());
                    continue;
                }
                (None, [directive, args @ ..]) => {
                    (directive.as_str().into(), args)
                }
            };

            let version = |raw: &str| {
                ModVersion::parse(raw).ok_or_else(|| GoModError::Version {
                    line: line_no,
                    version: raw.into(),
                })
            };

            match (&*directive, args) {
                ("module", [path]) => module = Some(path.as_str().into()),
                ("go", [version]) => go = Some(version.as_str().into()),
                ("require", [path, raw]) => {
                    let version = version(raw)?;
                    match require.iter_mut().find(|req| *req.path == **path) {
                        // the highest requirement wins
                        Some(existing) if existing.version.semver < version.semver => {
                            existing.version = version
                        }
                        Some(_) => (),
                        None => require.push(Require {
                            path: path.as_str().into(),
                            version,
                        }),
                    }
                }
                ("replace", [old, rest @ ..]) => {
                    let (old_version, rest) = match rest {
                        [v, arrow, rest @ ..] if arrow == "=>" => {
                            (Some(version(v)?), rest)
                        }
                        [arrow, rest @ ..] if arrow == "=>" => (None, rest),
                        _ => return Err(syntax("expected `=>` in replace")),
                    };

                    let new = match rest {
                        [dir] if is_local_path(dir) => {
                            ReplaceTarget::Dir(Path::new(dir).into())
                        }
                        [path, v] => ReplaceTarget::Module {
                            path: path.as_str().into(),
                            version: version(v)?,
                        },
                        _ => return Err(syntax("invalid replacement")),
                    };

                    replace.push(Replace {
                        old: old.as_str().into(),
                        old_version,
                        new,
                    });
                }
                ("module" | "go" | "require" | "replace", _) => {
                    return Err(syntax("wrong number of arguments"));
                }
                // exclude, retract, toolchain, godebug, tool
                _ => (),
            }
        }

        Ok(GoMod {
            module: module.ok_or(GoModError::MissingModule)?,
            go,
            require: require.into_boxed_slice(),
            replace: replace.into_boxed_slice(),
        })
    }

    /// Returns the requirement providing `import`, along with the path of the
    /// package relative to the module root.
    pub fn require_for<'a>(&self, import: &'a str) -> Option<(&Require, &'a str)> {
        self.require
            .iter()
            .filter_map(|req| Some((req, strip_module_prefix(import, &req.path)?)))
            .max_by_key(|(req, _)| req.path.len())
    }

    /// Returns the replace directive applying to `import`, if any.
    ///
    /// A replacement pinned to a version only applies when the requirement
    /// for that module has exactly that version.
    pub fn replacement_for<'a>(
        &self,
        import: &'a str,
    ) -> Option<(&Replace, &'a str)> {
        self.replace
            .iter()
            .filter_map(|rep| Some((rep, strip_module_prefix(import, &rep.old)?)))
            .filter(|(rep, _)| match &rep.old_version {
                None => true,
                Some(pinned) => self
                    .require
                    .iter()
                    .any(|req| req.path == rep.old && req.version == *pinned),
            })
            .max_by_key(|(rep, _)| rep.old.len())
    }
}

/// Returns the path of `import` relative to `module`, if the package belongs
/// to that module.
pub fn strip_module_prefix<'a>(import: &'a str, module: &str) -> Option<&'a str> {
    match import.strip_prefix(module)? {
        "" => Some(""),
        rest => rest.strip_prefix('/'),
    }
}

/// Escapes a module path or version for use in the module cache, where
/// upper-case letters are written as `!` followed by the lower-case letter.
pub fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        match c.is_ascii_uppercase() {
            true => {
                escaped.push('!');
                escaped.push(c.to_ascii_lowercase());
            }
            false => escaped.push(c),
        }
    }
    escaped
}

fn is_local_path(path: &str) -> bool {
    path.starts_with("./")
        || path.starts_with("../")
        || path == "."
        || path == ".."
        || Path::new(path).is_absolute()
}

fn strip_comment(line: &str) -> &str {
    match line.find("//") {
        Some(index) if !line[..index].contains('"') => &line[..index],
        _ => line,
    }
}

fn words(input: &mut &str) -> PResult<Vec<String>> {
    terminated(repeat(0.., preceded(space0, word)), space0).parse_next(input)
}

fn word(input: &mut &str) -> PResult<String> {
    alt((
        delimited('"', take_till(0.., '"'), '"').map(String::from),
        delimited('`', take_till(0.., '`'), '`').map(String::from),
        take_till(1.., [' ', '\t', '"', '`']).map(String::from),
    ))
    .parse_next(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"module example.com/store

go 1.22

require (
	github.com/Shopify/sarama v1.38.1
	golang.org/x/sync v0.0.0-20220722155255-886fb9371eb4 // indirect
	golang.org/x/sync v0.6.0
)

require example.com/tools v2.1.0+incompatible

replace example.com/tools => ../tools

replace (
	github.com/Shopify/sarama v1.38.1 => github.com/IBM/sarama v1.40.0
)

exclude example.com/broken v1.0.0
"#;

    #[test]
    fn parses_directives() {
        let gomod = GoMod::parse(SAMPLE).unwrap();

        assert_eq!(&*gomod.module, "example.com/store");
        assert_eq!(gomod.go.as_deref(), Some("1.22"));
        assert_eq!(gomod.require.len(), 3);
        assert_eq!(gomod.replace.len(), 2);

        let sync = &gomod.require[1];
        assert_eq!(&*sync.path, "golang.org/x/sync");
        assert_eq!(&*sync.version.raw, "v0.6.0");

        assert!(matches!(
            &gomod.replace[0].new,
            ReplaceTarget::Dir(dir) if dir.as_ref() == Path::new("../tools")
        ));
        assert!(gomod.replace[1].old_version.is_some());
    }

    #[test]
    fn pseudo_versions_are_semver() {
        let version =
            ModVersion::parse("v0.0.0-20220722155255-886fb9371eb4").unwrap();
        assert_eq!(version.semver.major, 0);
        assert!(!version.semver.pre.is_empty());
        assert!(ModVersion::parse("1.2.3").is_none());
    }

    #[test]
    fn finds_longest_module_prefix() {
        let gomod = GoMod::parse(SAMPLE).unwrap();

        let (req, rel) = gomod.require_for("golang.org/x/sync/errgroup").unwrap();
        assert_eq!(&*req.path, "golang.org/x/sync");
        assert_eq!(rel, "errgroup");

        assert!(gomod.require_for("golang.org/x/syncmap").is_none());

        let (rep, rel) = gomod.replacement_for("example.com/tools").unwrap();
        assert_eq!(&*rep.old, "example.com/tools");
        assert_eq!(rel, "");
    }

    #[test]
    fn escapes_upper_case_letters() {
        assert_eq!(escape_path("github.com/Shopify/sarama"), "github.com/!shopify/sarama");
    }

    #[test]
    fn missing_module_is_an_error() {
        assert!(matches!(
            GoMod::parse("go 1.21\n"),
            Err(GoModError::MissingModule)
        ));
        assert!(matches!(
            GoMod::parse("module a\nrequire b\n"),
            Err(GoModError::Syntax { line: 2, .. })
        ));
    }
}
