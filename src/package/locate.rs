//! Mapping import paths to package directories.

use std::path::Path;

use thiserror::Error;

use crate::config::GoEnv;

use super::{
    has_go_files,
    gomod::{self, GO_MOD_FILE, GoMod, GoModError, ReplaceTarget},
};

const VENDOR_DIR: &str = "vendor";
const CGO_PSEUDO_PACKAGE: &str = "C";

/// A located package: its canonical import path and its directory.
///
/// Packages found in a vendor directory keep the vendor directory in their
/// path, like `example.com/app/vendor/example.com/lib`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub path: Box<str>,
    pub dir: Box<Path>,
}

/// The module containing the package being mocked.
#[derive(Debug, Clone)]
pub struct MainModule {
    pub dir: Box<Path>,
    pub gomod: GoMod,
}

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("cannot find package \"{0}\"")]
    NotFound(Box<str>),
    #[error("cgo is not supported (imported \"C\")")]
    Cgo,
}

impl MainModule {
    /// Searches `dir` and its ancestors for a `go.mod` file.
    pub fn find(dir: &Path) -> Result<Option<Self>, GoModError> {
        for ancestor in dir.ancestors() {
            let path = ancestor.join(GO_MOD_FILE);
            if path.is_file() {
                let gomod = GoMod::load(&path)?;
                tracing::debug!(module = %gomod.module, dir = %ancestor.display(), "found main module");
                return Ok(Some(MainModule {
                    dir: ancestor.into(),
                    gomod,
                }));
            }
        }

        Ok(None)
    }
}

/// Finds package directories the way the `go` command does, trying in order:
/// the standard library, vendor directories, the main module, replacements,
/// the module cache and finally each `$GOPATH/src`.
#[derive(Debug, Clone)]
pub struct Locator {
    goroot: Option<Box<Path>>,
    gopath: Box<[Box<Path>]>,
    gomodcache: Option<Box<Path>>,
    module: Option<MainModule>,
}

impl Locator {
    pub fn new(env: &GoEnv, module: Option<MainModule>) -> Self {
        Self {
            goroot: env.goroot.clone(),
            gopath: env.gopath.clone(),
            gomodcache: env.gomodcache.clone(),
            module,
        }
    }

    pub fn module(&self) -> Option<&MainModule> {
        self.module.as_ref()
    }

    /// Locates the package that `importer` refers to as `import`.
    pub fn locate(
        &self,
        import: &str,
        importer: &Location,
    ) -> Result<Location, LocateError> {
        if import == CGO_PSEUDO_PACKAGE {
            return Err(LocateError::Cgo);
        }

        let location = self
            .in_goroot(import)
            .or_else(|| self.in_vendor(import, importer))
            .or_else(|| self.in_main_module(import))
            .or_else(|| self.in_replacement(import))
            .or_else(|| self.in_module_cache(import))
            .or_else(|| self.in_gopath(import))
            .ok_or_else(|| LocateError::NotFound(import.into()))?;

        tracing::trace!(import, path = %location.path, dir = %location.dir.display(), "located package");
        Ok(location)
    }

    fn goroot_src(&self) -> Option<Box<Path>> {
        self.goroot.as_ref().map(|root| root.join("src").into())
    }

    fn in_goroot(&self, import: &str) -> Option<Location> {
        if !is_standard(import) {
            return None;
        }

        let dir = self.goroot_src()?.join(import);
        dir.is_dir().then(|| Location {
            path: import.into(),
            dir: dir.into(),
        })
    }

    /// Checks the vendor directories of `importer` and its ancestors, stopping
    /// at the root of the main module.
    fn in_vendor(&self, import: &str, importer: &Location) -> Option<Location> {
        let module_root = self.module.as_ref().map(|module| &*module.dir);
        let mut dir: &Path = &importer.dir;
        let mut path: &str = &importer.path;

        loop {
            let candidate = dir.join(VENDOR_DIR).join(import);
            if has_go_files(&candidate) {
                return Some(Location {
                    path: format!("{path}/{VENDOR_DIR}/{import}").into(),
                    dir: candidate.into(),
                });
            }

            if Some(dir) == module_root {
                break;
            }

            match (dir.parent(), path.rsplit_once('/')) {
                (Some(parent), Some((parent_path, _))) => {
                    dir = parent;
                    path = parent_path;
                }
                _ => break,
            }
        }

        // the standard library vendors its own dependencies
        let std_src = self.goroot_src()?;
        if importer.dir.starts_with(&std_src) {
            let candidate = std_src.join(VENDOR_DIR).join(import);
            if has_go_files(&candidate) {
                return Some(Location {
                    path: format!("{VENDOR_DIR}/{import}").into(),
                    dir: candidate.into(),
                });
            }
        }

        None
    }

    fn in_main_module(&self, import: &str) -> Option<Location> {
        let module = self.module.as_ref()?;
        let rel = gomod::strip_module_prefix(import, &module.gomod.module)?;
        let dir = join_rel(&module.dir, rel);

        dir.is_dir().then(|| Location {
            path: import.into(),
            dir: dir.into(),
        })
    }

    fn in_replacement(&self, import: &str) -> Option<Location> {
        let module = self.module.as_ref()?;
        let (replace, rel) = module.gomod.replacement_for(import)?;

        let root = match &replace.new {
            ReplaceTarget::Dir(dir) => module.dir.join(dir),
            ReplaceTarget::Module { path, version } => {
                self.gomodcache.as_ref()?.join(format!(
                    "{}@{}",
                    gomod::escape_path(path),
                    gomod::escape_path(&version.raw)
                ))
            }
        };

        let dir = join_rel(&root, rel);
        dir.is_dir().then(|| Location {
            path: import.into(),
            dir: dir.into(),
        })
    }

    fn in_module_cache(&self, import: &str) -> Option<Location> {
        let module = self.module.as_ref()?;
        let (require, rel) = module.gomod.require_for(import)?;
        let root = self.gomodcache.as_ref()?.join(format!(
            "{}@{}",
            gomod::escape_path(&require.path),
            gomod::escape_path(&require.version.raw)
        ));
        let dir = join_rel(&root, rel);

        dir.is_dir().then(|| Location {
            path: import.into(),
            dir: dir.into(),
        })
    }

    fn in_gopath(&self, import: &str) -> Option<Location> {
        self.gopath.iter().find_map(|root| {
            let dir = root.join("src").join(import);
            has_go_files(&dir).then(|| Location {
                path: import.into(),
                dir: dir.into(),
            })
        })
    }
}

fn join_rel(root: &Path, rel: &str) -> std::path::PathBuf {
    match rel {
        "" => root.to_path_buf(),
        rel => root.join(rel),
    }
}

/// Standard library import paths have no dot in their first element.
pub fn is_standard(import: &str) -> bool {
    let first = import.split('/').next().unwrap_or(import);
    !first.contains('.')
}

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::syntax::constraint::BuildContext;

    use super::*;

    fn go_env(root: &Path) -> GoEnv {
        GoEnv {
            goroot: Some(root.join("goroot").into()),
            gopath: Box::new([root.join("gopath").into()]),
            gomodcache: Some(root.join("modcache").into()),
            build: BuildContext {
                goos: "linux".into(),
                goarch: "amd64".into(),
                cgo: false,
                tags: Box::new([]),
                release: 22,
            },
        }
    }

    fn package(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join("p.go"), "package p\n").unwrap();
    }

    #[test]
    fn standard_paths() {
        assert!(is_standard("net/http"));
        assert!(is_standard("context"));
        assert!(!is_standard("github.com/matryer/moq"));
    }

    #[test]
    fn locates_in_search_order() {
        let root = tempfile::tempdir().unwrap();
        let root = root.path();

        package(&root.join("goroot/src/context"));
        package(&root.join("app/internal/store"));
        package(&root.join("app/vendor/example.com/lib"));
        package(&root.join("tools/gen"));
        package(&root.join("modcache/github.com/!shopify/sarama@v1.38.1"));
        package(&root.join("gopath/src/example.org/legacy"));

        let gomod = GoMod::parse(
            "module example.com/app\n\
             require github.com/Shopify/sarama v1.38.1\n\
             replace example.com/tools => ../tools\n",
        )
        .unwrap();

        let locator = Locator::new(
            &go_env(root),
            Some(MainModule {
                dir: root.join("app").into(),
                gomod,
            }),
        );

        let importer = Location {
            path: "example.com/app/internal/store".into(),
            dir: root.join("app/internal/store").into(),
        };

        let context = locator.locate("context", &importer).unwrap();
        assert_eq!(&*context.path, "context");

        let lib = locator.locate("example.com/lib", &importer).unwrap();
        assert_eq!(&*lib.path, "example.com/app/vendor/example.com/lib");

        let store = locator.locate("example.com/app/internal/store", &importer).unwrap();
        assert_eq!(&*store.dir, root.join("app/internal/store"));

        let tools = locator.locate("example.com/tools/gen", &importer).unwrap();
        assert_eq!(&*tools.dir, root.join("app/../tools/gen"));

        let sarama = locator.locate("github.com/Shopify/sarama", &importer).unwrap();
        assert_eq!(&*sarama.path, "github.com/Shopify/sarama");

        let legacy = locator.locate("example.org/legacy", &importer).unwrap();
        assert_eq!(&*legacy.dir, root.join("gopath/src/example.org/legacy"));

        assert!(matches!(
            locator.locate("example.org/missing", &importer),
            Err(LocateError::NotFound(_))
        ));
        assert!(matches!(locator.locate("C", &importer), Err(LocateError::Cgo)));
    }
}
