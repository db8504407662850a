//! Central plumbing between the CLI and the mock generation pipeline.

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use thiserror::Error;

use crate::{
    config::{Config, ConfigError},
    env::loader::{self, LoadError},
    format::{self, FormatError},
    mock::{ExtractError, ImportQualifier, ImportSet, Initialisms, extract, render},
    package::{
        is_generated,
        locate::Locator,
        source::{self, ModuleDescriptor, ResolveError},
    },
    symbol::StringInterner,
    syntax::{self, constraint::BuildContext},
};

/// Generated files are only removed as stale if their names end with this.
const MOCK_FILE_SUFFIX: &str = "_mock.go";

/// The public result type of the [`driver`] module.
///
/// [`driver`]: self
pub type Result<T = ()> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to determine package name")]
    NoPackageFound,
    #[error(transparent)]
    Source(ResolveError),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error("must specify one interface")]
    MustSpecifyInterface,
    #[error("failed to format generated code: {0}")]
    Format(#[from] FormatError),
    #[error("failed to clean up old mocks: {}: {error}", path.display())]
    StaleFileCleanup {
        path: Box<Path>,
        #[source]
        error: io::Error,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to write {}: {error}", path.display())]
    Write {
        path: Box<Path>,
        #[source]
        error: io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<ResolveError> for Error {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::NoPackageFound => Error::NoPackageFound,
            ResolveError::Package(error) => Error::Load(error.into()),
            error => Error::Source(error),
        }
    }
}

/// Generates mocks for the interfaces of a single source directory.
#[derive(Debug)]
pub struct Mocker {
    desc: ModuleDescriptor,
    locator: Locator,
    build: BuildContext,
    initialisms: Initialisms,
}

impl Mocker {
    /// Resolves the package in `dir`. The generated file declares `package`
    /// if it is given, and otherwise the package that `dir` declares.
    pub fn new(dir: &Path, package: Option<&str>, config: &Config) -> Result<Self> {
        let go = config.go_env();
        let desc = source::resolve(dir, package, &go)?;
        let locator = Locator::new(&go, desc.module.clone());

        Ok(Self {
            desc,
            locator,
            build: go.build,
            initialisms: Initialisms::golint(),
        })
    }

    pub fn package_name(&self) -> &str {
        &self.desc.package_name
    }

    /// The import path of the package that mocks are generated into.
    pub fn self_path(&self) -> &str {
        &self.desc.self_path
    }

    /// Generates a formatted Go file with a mock for each of `names`.
    pub fn mock(&self, names: &[&str]) -> Result<String> {
        if names.is_empty() {
            return Err(Error::MustSpecifyInterface);
        }

        let env = loader::load(&self.desc, &self.locator, &self.build, names)?;

        let mut imports = ImportSet::new();
        let mut qualifier = ImportQualifier::new(&self.desc.self_path, &mut imports);
        let contracts = extract(&env, &mut qualifier, names)?;
        tracing::debug!(
            contracts = contracts.len(),
            imports = imports.imports().len(),
            "extracted contracts"
        );

        let text = render(
            &self.desc.package_name,
            &contracts,
            &imports,
            &self.initialisms,
        );

        let text = format::format(&text)?;
        tracing::debug!(bytes = text.len(), "formatted document");
        Ok(text)
    }
}

/// Where a generated document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(Box<Path>),
}

impl Output {
    /// Writes `text`, which declares mocks for `names`.
    ///
    /// Before a file is written, other generated files in its directory that
    /// declare a mock for one of `names` are removed.
    pub fn emit(&self, text: &str, names: &[&str]) -> Result {
        match self {
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout.write_all(text.as_bytes())?;
                stdout.flush()?;
                Ok(())
            }
            Output::File(path) => {
                let dir = match path.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent,
                    _ => Path::new("."),
                };

                remove_stale_mocks(dir, path, names)?;
                write_file(path, text)
            }
        }
    }
}

/// Removes the generated mock files in `dir` (other than `keep`) that declare
/// a mock for one of `names`.
pub fn remove_stale_mocks(dir: &Path, keep: &Path, names: &[&str]) -> Result {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(error) => return Err(cleanup(dir)(error)),
    };

    let mut stale = Vec::new();
    for entry in entries {
        let path = entry.map_err(cleanup(dir))?.path();
        let is_mock_file = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(MOCK_FILE_SUFFIX));

        if !is_mock_file || !path.is_file() || same_file(&path, keep) {
            continue;
        }

        let contents = fs::read_to_string(&path).map_err(cleanup(&path))?;
        if is_generated(&contents) && declares_mock(&contents, names) {
            stale.push(path);
        }
    }

    stale.sort();
    for path in stale {
        tracing::warn!(path = %path.display(), "removing stale mock");
        fs::remove_file(&path).map_err(cleanup(&path))?;
    }

    Ok(())
}

fn cleanup(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |error| Error::StaleFileCleanup {
        path: path.into(),
        error,
    }
}

fn declares_mock(contents: &str, names: &[&str]) -> bool {
    let mut interner = StringInterner::new();
    let file = match syntax::parse_file(contents, &mut interner) {
        Ok(file) => file,
        Err(error) => {
            tracing::trace!(%error, "skipping unparseable generated file");
            return false;
        }
    };

    file.type_specs().any(|spec| {
        interner
            .name(*spec.name)
            .strip_suffix("Mock")
            .is_some_and(|name| names.contains(&name))
    })
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn write_file(path: &Path, text: &str) -> Result {
    let error = |error| Error::Write {
        path: path.into(),
        error,
    };

    fs::write(path, text).map_err(error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o644)).map_err(error)?;
    }

    tracing::debug!(path = %path.display(), "wrote mocks");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const STALE: &str = "// Code generated by moq; DO NOT EDIT.\n\npackage p\n\ntype FetcherMock struct{}\n";

    #[test]
    fn only_matching_generated_mocks_are_removed() {
        let dir = tempfile::tempdir().unwrap();
        let stale = dir.path().join("fetcher_mock.go");
        let other = dir.path().join("store_mock.go");
        let handwritten = dir.path().join("hand_mock.go");
        let unrelated = dir.path().join("fetcher.go");

        fs::write(&stale, STALE).unwrap();
        fs::write(&other, STALE.replace("Fetcher", "Store")).unwrap();
        fs::write(&handwritten, "package p\n\ntype FetcherMock struct{}\n").unwrap();
        fs::write(&unrelated, STALE).unwrap();

        let out = dir.path().join("mocks_mock.go");
        remove_stale_mocks(dir.path(), &out, &["Fetcher"]).unwrap();

        assert!(!stale.exists());
        assert!(other.exists());
        assert!(handwritten.exists());
        assert!(unrelated.exists());
    }

    #[test]
    fn output_file_is_written_with_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fetcher_mock.go");
        fs::write(&path, STALE).unwrap();

        Output::File(path.clone().into())
            .emit("package p\n", &["Fetcher"])
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "package p\n");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(&path).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o644);
        }
    }

    #[test]
    fn no_names_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("p.go"), "package p\n").unwrap();

        let mocker = Mocker::new(dir.path(), None, &Config::default()).unwrap();
        assert!(matches!(mocker.mock(&[]), Err(Error::MustSpecifyInterface)));
        assert_eq!(
            Error::MustSpecifyInterface.to_string(),
            "must specify one interface"
        );
    }
}
