//! Go packages on disk: locating them by import path and reading their
//! buildable source files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::{
    GENERATED_MARKER,
    source_file::SourceFile,
    symbol::StringInterner,
    syntax::{
        self, SyntaxError, ast,
        constraint::{BuildContext, ConstraintError},
    },
};

pub mod gomod;
pub mod locate;
pub mod source;

const GO_FILE_EXTENSION: &str = "go";
const TEST_FILE_SUFFIX: &str = "_test.go";

/// A parsed source file.
#[derive(Debug, Clone)]
pub struct GoFile {
    pub source: SourceFile,
    pub ast: ast::File,
}

#[derive(Debug, Error)]
pub enum PackageError {
    #[error("Failed to read {}: {error}", path.display())]
    Io {
        path: Box<Path>,
        #[source]
        error: std::io::Error,
    },
    #[error("{}:{line}:{column}: {error}", path.display())]
    Syntax {
        path: Box<Path>,
        line: usize,
        column: usize,
        error: SyntaxError,
    },
    #[error("{}: {error}", path.display())]
    Constraint {
        path: Box<Path>,
        error: ConstraintError,
    },
    #[error("found packages {first} and {second} in {}", dir.display())]
    MixedPackages {
        dir: Box<Path>,
        first: Box<str>,
        second: Box<str>,
    },
    #[error("no buildable Go source files in {}", .0.display())]
    NoGoFiles(Box<Path>),
}

impl GoFile {
    pub fn package_name<'a>(&self, interner: &'a StringInterner) -> &'a str {
        interner.name(*self.ast.package)
    }
}

/// Reads and parses the buildable, non-test Go files in `dir`, sorted by file
/// name.
///
/// When `skip_generated` is set, files carrying the generated-mock marker are
/// left out as well.
pub fn read_package_files(
    dir: &Path,
    build: &BuildContext,
    skip_generated: bool,
    interner: &mut StringInterner,
) -> Result<Vec<GoFile>, PackageError> {
    let io_error = |error| PackageError::Io {
        path: dir.into(),
        error,
    };

    let mut paths = fs::read_dir(dir)
        .map_err(io_error)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_go_source(path))
        .collect::<Vec<PathBuf>>();
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let source = SourceFile::read(path.as_path()).map_err(|error| {
            PackageError::Io {
                path: path.as_path().into(),
                error,
            }
        })?;

        if skip_generated && is_generated(source.contents()) {
            tracing::trace!(path = %path.display(), "skipping generated file");
            continue;
        }

        let included = build
            .includes(source.file_name(), source.contents())
            .map_err(|error| PackageError::Constraint {
                path: path.as_path().into(),
                error,
            })?;

        if !included {
            tracing::trace!(path = %path.display(), "excluded by build constraints");
            continue;
        }

        let ast = syntax::parse_file(source.contents(), interner).map_err(
            |error| {
                let (line, column) = source.line_col(error.span());
                PackageError::Syntax {
                    path: path.as_path().into(),
                    line,
                    column,
                    error,
                }
            },
        )?;

        files.push(GoFile { source, ast });
    }

    Ok(files)
}

/// Returns `true` if `dir` directly contains any non-test `.go` files.
pub fn has_go_files(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok_and(|entries| {
        entries
            .filter_map(Result::ok)
            .any(|entry| is_go_source(&entry.path()))
    })
}

/// Returns `true` if `contents` starts with the marker written at the top of
/// every generated mock.
pub fn is_generated(contents: &str) -> bool {
    contents.trim_start_matches('\u{feff}').starts_with(GENERATED_MARKER)
}

fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };

    path.extension().and_then(std::ffi::OsStr::to_str) == Some(GO_FILE_EXTENSION)
        && !name.ends_with(TEST_FILE_SUFFIX)
        && !name.starts_with(['.', '_'])
        && path.is_file()
}

/// Joins `name` onto the parent of the slash-separated import `path`.
pub fn join_dir(path: &str, name: &str) -> Box<str> {
    match path.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => format!("{parent}/{name}").into(),
        Some(_) => format!("/{name}").into(),
        None => name.into(),
    }
}

/// Removes everything up to and including the innermost vendor directory from
/// an import path.
pub fn strip_vendor(path: &str) -> &str {
    match path.rfind("/vendor/") {
        Some(index) => &path[index + "/vendor/".len()..],
        None => path.strip_prefix("vendor/").unwrap_or(path),
    }
}

/// Converts a relative filesystem path into slash-separated form.
pub fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|component| component.as_os_str().to_str())
        .collect::<Vec<_>>()
        .join("/")
}
