//! Qualifying references to foreign types, and collecting the imports they
//! need.

use crate::{
    env::{Env, PkgId, type_string::Qualifier},
    package::{join_dir, strip_vendor},
};

const SYNC_PATH: &str = "sync";

/// An import that the generated document needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub path: Box<str>,
    /// The name the document refers to the package by.
    pub local: Box<str>,
    /// The name the package declares.
    pub package: Box<str>,
}

impl Import {
    /// Whether the import has to be written with an explicit name.
    pub fn is_aliased(&self) -> bool {
        self.local != self.package
    }
}

/// The deduplicated imports of a generated document, in the order they were
/// first needed.
///
/// Local names are unique: a second package with an already used name is
/// imported as `name2`, then `name3`, and so on. The name `sync` is always
/// reserved for the standard library package, which the mocks themselves use.
#[derive(Debug, Clone, Default)]
pub struct ImportSet {
    imports: Vec<Import>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an import of `path`, whose package is called `package`, and
    /// returns the local name to refer to it by.
    pub fn insert(&mut self, path: &str, package: &str) -> Box<str> {
        if let Some(import) = self.imports.iter().find(|import| &*import.path == path) {
            return import.local.clone();
        }

        let mut local: Box<str> = package.into();
        let mut suffix = 2;
        while self.is_taken(&local, path) {
            local = format!("{package}{suffix}").into();
            suffix += 1;
        }

        self.imports.push(Import {
            path: path.into(),
            local: local.clone(),
            package: package.into(),
        });

        local
    }

    fn is_taken(&self, local: &str, path: &str) -> bool {
        (local == SYNC_PATH && path != SYNC_PATH)
            || self.imports.iter().any(|import| &*import.local == local)
    }

    pub fn imports(&self) -> &[Import] {
        &self.imports
    }

    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
    }
}

/// A [`Qualifier`] that leaves the output package's own types unqualified and
/// imports every other package.
#[derive(Debug)]
pub struct ImportQualifier<'a> {
    self_path: &'a str,
    imports: &'a mut ImportSet,
}

impl<'a> ImportQualifier<'a> {
    pub fn new(self_path: &'a str, imports: &'a mut ImportSet) -> Self {
        Self { self_path, imports }
    }
}

impl Qualifier for ImportQualifier<'_> {
    fn qualify(&mut self, env: &Env, pkg: PkgId) -> Option<Box<str>> {
        let package = env.get_package(pkg);
        let name = env.name(package.name);

        if &*join_dir(&package.path, name) == self.self_path {
            return None;
        }

        Some(self.imports.insert(strip_vendor(&package.path), name))
    }
}

#[cfg(test)]
mod tests {
    use crate::symbol::StringInterner;

    use super::*;

    #[test]
    fn same_names_are_renamed() {
        let mut set = ImportSet::new();
        assert_eq!(&*set.insert("example.com/a/same", "same"), "same");
        assert_eq!(&*set.insert("example.com/b/same", "same"), "same2");
        assert_eq!(&*set.insert("example.com/c/same", "same"), "same3");
        assert_eq!(&*set.insert("example.com/b/same", "same"), "same2");

        let aliased = set
            .imports()
            .iter()
            .map(Import::is_aliased)
            .collect::<Vec<_>>();
        assert_eq!(aliased, [false, true, true]);
    }

    #[test]
    fn sync_is_reserved() {
        let mut set = ImportSet::new();
        assert_eq!(&*set.insert("example.com/sync", "sync"), "sync2");
        assert_eq!(&*set.insert("sync", "sync"), "sync");
    }

    #[test]
    fn own_package_is_unqualified() {
        let mut env = Env::new(StringInterner::new());
        let store = env.interner.intern("store");
        let http = env.interner.intern("http");
        let errors = env.interner.intern("errors");
        let own = env.register_package("example.com/app/store".into(), store);
        let foreign = env.register_package("net/http".into(), http);
        let vendored = env.register_package("example.com/app/vendor/github.com/pkg/errors".into(), errors);

        let mut set = ImportSet::new();
        let mut qualifier = ImportQualifier::new("example.com/app/store", &mut set);

        assert_eq!(qualifier.qualify(&env, own), None);
        assert_eq!(qualifier.qualify(&env, foreign).as_deref(), Some("http"));
        assert_eq!(qualifier.qualify(&env, vendored).as_deref(), Some("errors"));

        let paths = set.imports().iter().map(|i| &*i.path).collect::<Vec<_>>();
        assert_eq!(paths, ["net/http", "github.com/pkg/errors"]);
    }

    #[test]
    fn differently_named_output_package_imports_the_source() {
        let mut env = Env::new(StringInterner::new());
        let store = env.interner.intern("store");
        let own = env.register_package("example.com/app/store".into(), store);

        let mut set = ImportSet::new();
        let mut qualifier = ImportQualifier::new("example.com/app/store_test", &mut set);

        assert_eq!(qualifier.qualify(&env, own).as_deref(), Some("store"));
        assert_eq!(&*set.imports()[0].path, "example.com/app/store");
    }
}
