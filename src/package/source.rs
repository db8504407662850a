//! Resolving the directory being mocked into a [`ModuleDescriptor`].

use std::path::{MAIN_SEPARATOR, Path};

use thiserror::Error;

use crate::{config::GoEnv, symbol::StringInterner};

use super::{
    GoFile, PackageError, join_dir,
    gomod::GoModError,
    locate::{Location, MainModule},
    read_package_files, slash_path,
};

const TEST_PACKAGE_MARKER: &str = "_test";

/// Everything known about the source directory before any types are loaded.
#[derive(Debug, Clone)]
pub struct ModuleDescriptor {
    /// The canonicalized source directory.
    pub dir: Box<Path>,
    /// The name of the package that the generated file declares.
    pub package_name: Box<str>,
    /// The name declared by the source files, if there are any.
    pub source_name: Option<Box<str>>,
    /// The import path that the source directory is known by.
    pub identity: Box<str>,
    /// The import path of the package the generated file belongs to.
    pub self_path: Box<str>,
    pub files: Box<[GoFile]>,
    pub interner: StringInterner,
    pub module: Option<MainModule>,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to determine package name")]
    NoPackageFound,
    #[error("Failed to resolve {}: {error}", dir.display())]
    Dir {
        dir: Box<Path>,
        #[source]
        error: std::io::Error,
    },
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error(transparent)]
    GoMod(#[from] GoModError),
}

impl ModuleDescriptor {
    /// The location of the source package, used as the importer of its own
    /// imports.
    pub fn location(&self) -> Location {
        Location {
            path: self.identity.clone(),
            dir: self.dir.clone(),
        }
    }
}

/// Parses the package in `dir` and works out its names and import paths.
///
/// Without a `package` override, the output package is named after the first
/// source file (by file name) whose package is not a `_test` package.
pub fn resolve(
    dir: &Path,
    package: Option<&str>,
    env: &GoEnv,
) -> Result<ModuleDescriptor, ResolveError> {
    let dir: Box<Path> = dir
        .canonicalize()
        .map_err(|error| ResolveError::Dir {
            dir: dir.into(),
            error,
        })?
        .into();

    let mut interner = StringInterner::new();
    let files = read_package_files(&dir, &env.build, true, &mut interner)?;

    let source_name: Option<Box<str>> = files
        .iter()
        .map(|file| file.package_name(&interner))
        .find(|name| !name.contains(TEST_PACKAGE_MARKER))
        .map(Into::into);

    let package_name: Box<str> = match (package, &source_name) {
        (Some(package), _) => package.into(),
        (None, Some(name)) => name.clone(),
        (None, None) => return Err(ResolveError::NoPackageFound),
    };

    let mut kept = Vec::with_capacity(files.len());
    for file in files {
        let name = file.package_name(&interner);
        match &source_name {
            Some(source) if **source == *name => kept.push(file),
            _ if name.contains(TEST_PACKAGE_MARKER) => (),
            Some(source) => {
                return Err(PackageError::MixedPackages {
                    dir,
                    first: source.clone(),
                    second: name.into(),
                }
                .into());
            }
            None => (),
        }
    }

    let module = MainModule::find(&dir)?;
    let identity = identity(&dir, module.as_ref(), &env.gopath);
    let self_path = join_dir(&identity, &package_name);

    tracing::debug!(
        dir = %dir.display(),
        %package_name,
        %identity,
        %self_path,
        files = kept.len(),
        "resolved source package"
    );

    Ok(ModuleDescriptor {
        dir,
        package_name,
        source_name,
        identity,
        self_path,
        files: kept.into_boxed_slice(),
        interner,
        module,
    })
}

/// Computes the import path of `dir`: relative to the main module if there
/// is one, otherwise relative to a `$GOPATH/src`, otherwise the absolute path
/// itself.
fn identity(
    dir: &Path,
    module: Option<&MainModule>,
    gopath: &[Box<Path>],
) -> Box<str> {
    if let Some(module) = module {
        if let Ok(rel) = dir.strip_prefix(&module.dir) {
            return match slash_path(rel) {
                rel if rel.is_empty() => module.gomod.module.clone(),
                rel => format!("{}/{rel}", module.gomod.module).into(),
            };
        }
    }

    for root in gopath {
        let src = root.join("src");
        let src = src.canonicalize().unwrap_or(src);
        if let Ok(rel) = dir.strip_prefix(&src) {
            return slash_path(rel).into();
        }
    }

    slash_absolute(dir)
}

fn slash_absolute(dir: &Path) -> Box<str> {
    let text = dir.to_string_lossy();
    match MAIN_SEPARATOR {
        '/' => text.into(),
        separator => text.replace(separator, "/").into(),
    }
}
