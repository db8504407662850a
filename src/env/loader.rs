//! Loading packages and resolving the declarations that requested names
//! reach.
//!
//! Every loaded package registers the names of its top-level declarations,
//! but type declarations are only resolved on demand. Interfaces, aliases
//! and declarations of the form `type X Y` are resolved completely, since
//! method sets are computed through them. Every other named type is opaque:
//! rendering a reference to it only needs its name and package.

use std::{
    collections::{HashMap, HashSet},
    rc::Rc,
};

use petgraph::graph::{DiGraph, NodeIndex};
use recursion::{Collapsible, CollapsibleExt, MappableFrame, PartiallyApplied};
use thiserror::Error;

use crate::{
    package::{
        GoFile, PackageError,
        locate::{LocateError, Location, Locator},
        read_package_files,
        source::ModuleDescriptor,
    },
    span::{Span, Spanned},
    symbol::{StringInterner, Symbol},
    syntax::{
        ast::{ArrayLen, ChanDir, Decl, FuncType, ImportName, InterfaceElem, TypeExpr, TypeSpec},
        constraint::BuildContext,
    },
};

use super::{
    Alias, AliasId, Definition, Env, Field, Interface, Method, Named, NamedId, Object, PkgId,
    Signature, Term, Type, Var, is_exported,
};

const BLANK: &str = "_";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Package(#[from] PackageError),
    #[error(transparent)]
    Locate(#[from] LocateError),
    #[error("{at}: undefined: {name}")]
    Undefined { at: Box<str>, name: Box<str> },
    #[error("{at}: {name} is not a type")]
    NotAType { at: Box<str>, name: Box<str> },
    #[error("{at}: name {name} not exported by package {package}")]
    NotExported {
        at: Box<str>,
        name: Box<str>,
        package: Box<str>,
    },
    #[error("{at}: {name} is not a generic type")]
    NotGeneric { at: Box<str>, name: Box<str> },
    #[error("{at}: {name} redeclared in this package")]
    Redeclared { at: Box<str>, name: Box<str> },
    #[error("{at}: array length must be an integer constant")]
    ArrayLength { at: Box<str> },
    #[error("invalid recursive alias {0}")]
    RecursiveAlias(Box<str>),
    #[error("generic alias {0} is not supported")]
    GenericAlias(Box<str>),
    #[error("import cycle not allowed through {0}")]
    ImportCycle(Box<str>),
}

/// Loads the source package described by `desc`, and resolves the type
/// declarations reachable from each of `names`.
///
/// Names that are missing from the package, or that do not name a type, are
/// ignored here and reported when the contracts are extracted.
pub fn load(
    desc: &ModuleDescriptor,
    locator: &Locator,
    build: &BuildContext,
    names: &[&str],
) -> Result<Env, LoadError> {
    let mut loader = Loader::new(desc.interner.clone(), locator, build);
    let root = loader.register_root(desc)?;

    for name in names {
        loader.resolve_requested(root, name)?;
    }

    loader.finish()
}

/// Where a package-level type or alias is declared.
#[derive(Debug, Clone, Copy)]
struct DeclSite {
    pkg: PkgId,
    file: usize,
    decl: usize,
    spec: usize,
}

struct PackageSource {
    location: Location,
    files: Rc<[GoFile]>,
    imports: Box<[FileImports]>,
}

#[derive(Debug, Default)]
struct FileImports {
    /// Imports with an explicit local name.
    named: HashMap<Symbol, Box<str>>,
    /// Imports known by the name their package declares.
    unnamed: Vec<Box<str>>,
    dot: Vec<Box<str>>,
}

/// The lexical context that a type expression is resolved in.
#[derive(Debug, Clone, Copy)]
struct Scope<'s> {
    pkg: PkgId,
    file: usize,
    params: &'s [Symbol],
}

/// The result of looking up a name.
enum Found {
    Object(Object),
    Type(Type),
}

struct Loader<'a> {
    env: Env,
    locator: &'a Locator,
    build: &'a BuildContext,
    sources: HashMap<PkgId, PackageSource>,
    by_path: HashMap<Box<str>, PkgId>,
    named_sites: HashMap<NamedId, DeclSite>,
    alias_sites: HashMap<AliasId, DeclSite>,
    named_in_progress: HashSet<NamedId>,
    aliases_in_progress: HashSet<AliasId>,
    graph: DiGraph<PkgId, ()>,
    nodes: HashMap<PkgId, NodeIndex>,
}

impl<'a> Loader<'a> {
    fn new(interner: StringInterner, locator: &'a Locator, build: &'a BuildContext) -> Self {
        Self {
            env: Env::new(interner),
            locator,
            build,
            sources: HashMap::new(),
            by_path: HashMap::new(),
            named_sites: HashMap::new(),
            alias_sites: HashMap::new(),
            named_in_progress: HashSet::new(),
            aliases_in_progress: HashSet::new(),
            graph: DiGraph::new(),
            nodes: HashMap::new(),
        }
    }

    fn finish(self) -> Result<Env, LoadError> {
        match petgraph::algo::toposort(&self.graph, None) {
            Ok(order) => {
                tracing::debug!(packages = order.len(), "loaded import graph");
                Ok(self.env)
            }
            Err(cycle) => {
                let pkg = self.graph[cycle.node_id()];
                Err(LoadError::ImportCycle(self.env.get_package(pkg).path.clone()))
            }
        }
    }

    // PACKAGES

    fn register_root(&mut self, desc: &ModuleDescriptor) -> Result<PkgId, LoadError> {
        let name = desc.source_name.as_deref().unwrap_or(&desc.package_name);
        let name = self.env.interner.intern(name);
        let id = self.register_package(desc.location(), name, desc.files.to_vec())?;
        self.env.set_root(id);
        Ok(id)
    }

    fn register_package(
        &mut self,
        location: Location,
        name: Symbol,
        files: Vec<GoFile>,
    ) -> Result<PkgId, LoadError> {
        let id = self.env.register_package(location.path.clone(), name);
        self.by_path.insert(location.path.clone(), id);
        self.node(id);

        let files: Rc<[GoFile]> = files.into();
        let imports = files.iter().map(|file| self.file_imports(file)).collect();

        for (file_index, file) in files.iter().enumerate() {
            for (decl_index, decl) in file.ast.decls.iter().enumerate() {
                self.declare(id, file_index, decl_index, decl, file)?;
            }
        }

        self.sources.insert(
            id,
            PackageSource {
                location,
                files,
                imports,
            },
        );

        Ok(id)
    }

    fn file_imports(&self, file: &GoFile) -> FileImports {
        let mut imports = FileImports::default();

        for spec in file.ast.imports.iter().flat_map(|decl| decl.specs.iter()) {
            let path = spec.path.item.clone();
            match spec.name.map(|name| name.item) {
                None => imports.unnamed.push(path),
                Some(ImportName::Dot) => imports.dot.push(path),
                Some(ImportName::Ident(name)) if self.env.name(name) == BLANK => (),
                Some(ImportName::Ident(name)) => {
                    imports.named.insert(name, path);
                }
            }
        }

        imports
    }

    fn declare(
        &mut self,
        pkg: PkgId,
        file: usize,
        decl_index: usize,
        decl: &Decl,
        source: &GoFile,
    ) -> Result<(), LoadError> {
        match decl {
            Decl::Type(specs) => {
                for (spec_index, spec) in specs.iter().enumerate() {
                    let name = *spec.name;
                    if self.env.name(name) == BLANK {
                        continue;
                    }

                    if let Some(Object::Named(_) | Object::Alias(_)) =
                        self.env.get_package(pkg).lookup(name)
                    {
                        return Err(LoadError::Redeclared {
                            at: source.source.position(spec.name.span).into(),
                            name: self.env.name(name).into(),
                        });
                    }

                    let site = DeclSite {
                        pkg,
                        file,
                        decl: decl_index,
                        spec: spec_index,
                    };

                    let object = match spec.alias {
                        true => {
                            let id = self.env.register_alias(Alias {
                                name,
                                pkg,
                                target: None,
                            });
                            self.alias_sites.insert(id, site);
                            Object::Alias(id)
                        }
                        false => {
                            let id = self.env.register_named(Named {
                                name,
                                pkg: Some(pkg),
                                params: type_param_names(spec),
                                definition: Definition::Pending,
                            });
                            self.named_sites.insert(id, site);
                            Object::Named(id)
                        }
                    };

                    self.env.declare(pkg, name, object);
                }
            }
            Decl::Const(specs) => {
                for spec in specs.iter() {
                    let value = match spec.names.len() {
                        1 => spec.value,
                        _ => None,
                    };

                    for name in spec.names.iter() {
                        self.declare_value(pkg, **name, Object::Const(value));
                    }
                }
            }
            Decl::Func(name) => self.declare_value(pkg, **name, Object::Func),
            Decl::Var(names) => {
                for name in names.iter() {
                    self.declare_value(pkg, **name, Object::Var);
                }
            }
            Decl::Method => (),
        }

        Ok(())
    }

    /// Declares a non-type object unless the name is already taken.
    fn declare_value(&mut self, pkg: PkgId, name: Symbol, object: Object) {
        if self.env.get_package(pkg).lookup(name).is_none() {
            self.env.declare(pkg, name, object);
        }
    }

    /// Loads the package at `location` if it has not been loaded yet.
    fn load_package(&mut self, location: Location) -> Result<PkgId, LoadError> {
        if let Some(id) = self.by_path.get(&location.path) {
            return Ok(*id);
        }

        let files = read_package_files(&location.dir, self.build, false, &mut self.env.interner)?;

        let Some(first) = files.first() else {
            return Err(PackageError::NoGoFiles(location.dir.clone()).into());
        };

        let name = *first.ast.package;
        if let Some(other) = files.iter().find(|file| *file.ast.package != name) {
            return Err(PackageError::MixedPackages {
                dir: location.dir.clone(),
                first: self.env.name(name).into(),
                second: self.env.name(*other.ast.package).into(),
            }
            .into());
        }

        tracing::debug!(
            path = %location.path,
            dir = %location.dir.display(),
            files = files.len(),
            "loaded package"
        );

        self.register_package(location, name, files)
    }

    /// Loads the package that `importer` imports as `path`.
    fn import_package(&mut self, importer: PkgId, path: &str) -> Result<PkgId, LoadError> {
        let id = match path {
            "unsafe" => self.env.unsafe_package(),
            _ => {
                let source = self
                    .sources
                    .get(&importer)
                    .expect("importing packages are always loaded from source");
                let location = self.locator.locate(path, &source.location)?;
                self.load_package(location)?
            }
        };

        let from = self.node(importer);
        let to = self.node(id);
        self.graph.update_edge(from, to, ());
        Ok(id)
    }

    fn node(&mut self, id: PkgId) -> NodeIndex {
        *self
            .nodes
            .entry(id)
            .or_insert_with(|| self.graph.add_node(id))
    }

    fn files(&self, pkg: PkgId) -> Rc<[GoFile]> {
        self.sources
            .get(&pkg)
            .map(|source| source.files.clone())
            .expect("declaration sites only refer to packages loaded from source")
    }

    // DECLARATIONS

    fn resolve_requested(&mut self, root: PkgId, name: &str) -> Result<(), LoadError> {
        let Some(symbol) = self.env.interner.get(name) else {
            return Ok(());
        };

        match self.env.get_package(root).lookup(symbol) {
            Some(Object::Named(id)) => self.resolve_named(id),
            Some(Object::Alias(id)) => self.resolve_alias(id).map(|_| ()),
            _ => Ok(()),
        }
    }

    fn resolve_named(&mut self, id: NamedId) -> Result<(), LoadError> {
        if self.env.get_named(id).definition != Definition::Pending
            || self.named_in_progress.contains(&id)
        {
            return Ok(());
        }

        let Some(site) = self.named_sites.get(&id).copied() else {
            return Ok(());
        };

        let files = self.files(site.pkg);
        let spec = type_spec(&files, site);
        let params = self.env.get_named(id).params.clone();
        let scope = Scope {
            pkg: site.pkg,
            file: site.file,
            params: &params,
        };

        self.named_in_progress.insert(id);
        let definition = match &spec.ty.item {
            TypeExpr::Interface(_) | TypeExpr::Name { .. } => {
                let rhs = self.resolve_type(scope, &spec.ty)?;
                if let Type::Named { id: target, .. } = &rhs {
                    self.resolve_named(*target)?;
                }
                Definition::Type(rhs)
            }
            _ => Definition::Opaque,
        };
        self.named_in_progress.remove(&id);

        tracing::trace!(name = self.env.name(*spec.name), "resolved type declaration");
        self.env.get_named_mut(id).definition = definition;
        Ok(())
    }

    fn resolve_alias(&mut self, id: AliasId) -> Result<Type, LoadError> {
        if let Some(target) = &self.env.get_alias(id).target {
            return Ok(target.clone());
        }

        let name: Box<str> = self.env.name(self.env.get_alias(id).name).into();
        if !self.aliases_in_progress.insert(id) {
            return Err(LoadError::RecursiveAlias(name));
        }

        let site = self
            .alias_sites
            .get(&id)
            .copied()
            .expect("every alias is registered with its declaration site");
        let files = self.files(site.pkg);
        let spec = type_spec(&files, site);

        if !spec.params.is_empty() {
            return Err(LoadError::GenericAlias(name));
        }

        let scope = Scope {
            pkg: site.pkg,
            file: site.file,
            params: &[],
        };

        let target = self.resolve_type(scope, &spec.ty)?;
        if let Type::Named { id: named, .. } = &target {
            self.resolve_named(*named)?;
        }

        self.aliases_in_progress.remove(&id);
        self.env.get_alias_mut(id).target = Some(target.clone());
        Ok(target)
    }

    // TYPE EXPRESSIONS

    fn resolve_type(&mut self, scope: Scope<'_>, expr: &TypeExpr) -> Result<Type, LoadError> {
        expr.try_collapse_frames(|frame| self.collapse(scope, frame))
    }

    fn collapse(&mut self, scope: Scope<'_>, frame: TypeExprFrame<'_, Type>) -> Result<Type, LoadError> {
        Ok(match frame {
            TypeExprFrame::Name {
                qualifier,
                name,
                args,
            } => self.name_type(scope, qualifier, name, args)?,
            TypeExprFrame::Pointer(elem) => Type::Pointer(Box::new(elem)),
            TypeExprFrame::Slice(elem) => Type::Slice(Box::new(elem)),
            TypeExprFrame::Array { len, elem } => {
                Type::Array(self.array_len(scope, len)?, Box::new(elem))
            }
            TypeExprFrame::Map { key, value } => Type::Map(Box::new(key), Box::new(value)),
            TypeExprFrame::Chan { dir, elem } => Type::Chan(dir, Box::new(elem)),
            TypeExprFrame::Func(sig) => Type::Signature(sig.into_signature()),
            TypeExprFrame::Struct(fields) => Type::Struct(
                fields
                    .into_iter()
                    .flat_map(|field| {
                        let names = match field.names {
                            [] => vec![None],
                            names => names.iter().copied().map(Some).collect(),
                        };

                        names.into_iter().map(move |name| Field {
                            name,
                            ty: field.ty.clone(),
                            tag: field.tag.map(Into::into),
                        })
                    })
                    .collect(),
            ),
            TypeExprFrame::Interface(elems) => {
                let mut methods = Vec::new();
                let mut embeds = Vec::new();
                let mut unions = Vec::new();

                for elem in elems.into_iter() {
                    match elem {
                        ElemFrame::Method { name, sig } => methods.push(Method {
                            name,
                            pkg: Some(scope.pkg),
                            sig: sig.into_signature(),
                        }),
                        ElemFrame::Embed(ty) => {
                            if let Type::Named { id, .. } = &ty {
                                self.resolve_named(*id)?;
                            }
                            embeds.push(ty);
                        }
                        ElemFrame::Union(terms) => unions.push(
                            terms
                                .into_iter()
                                .map(|(tilde, ty)| Term { tilde, ty })
                                .collect(),
                        ),
                    }
                }

                Type::Interface(Interface {
                    methods: methods.into_boxed_slice(),
                    embeds: embeds.into_boxed_slice(),
                    unions: unions.into_boxed_slice(),
                    comparable: false,
                })
            }
        })
    }

    fn name_type(
        &mut self,
        scope: Scope<'_>,
        qualifier: Option<Spanned<Symbol>>,
        name: Spanned<Symbol>,
        args: Box<[Type]>,
    ) -> Result<Type, LoadError> {
        let not_generic = |this: &Self| LoadError::NotGeneric {
            at: this.position(scope, name.span),
            name: this.env.name(*name).into(),
        };

        match self.lookup(scope, qualifier, name)? {
            Found::Type(Type::Named { id, .. }) => Ok(Type::Named { id, args }),
            Found::Type(_) if !args.is_empty() => Err(not_generic(self)),
            Found::Type(ty) => Ok(ty),
            Found::Object(Object::Named(id)) => Ok(Type::Named { id, args }),
            Found::Object(Object::Alias(_)) if !args.is_empty() => Err(not_generic(self)),
            Found::Object(Object::Alias(id)) => self.resolve_alias(id),
            Found::Object(Object::Const(_) | Object::Func | Object::Var) => {
                Err(LoadError::NotAType {
                    at: self.position(scope, name.span),
                    name: self.env.name(*name).into(),
                })
            }
        }
    }

    fn array_len(&mut self, scope: Scope<'_>, len: &ArrayLen) -> Result<u64, LoadError> {
        let (qualifier, name) = match len {
            ArrayLen::Int(len) => return Ok(*len),
            ArrayLen::Const { qualifier, name } => (*qualifier, *name),
            ArrayLen::Expr(span) => {
                return Err(LoadError::ArrayLength {
                    at: self.position(scope, *span),
                });
            }
        };

        match self.lookup(scope, qualifier, name)? {
            Found::Object(Object::Const(Some(value))) => Ok(value),
            _ => Err(LoadError::ArrayLength {
                at: self.position(scope, name.span),
            }),
        }
    }

    // NAME LOOKUP

    fn lookup(
        &mut self,
        scope: Scope<'_>,
        qualifier: Option<Spanned<Symbol>>,
        name: Spanned<Symbol>,
    ) -> Result<Found, LoadError> {
        let undefined = |this: &Self, symbol: Spanned<Symbol>| LoadError::Undefined {
            at: this.position(scope, symbol.span),
            name: this.env.name(*symbol).into(),
        };

        if let Some(qualifier) = qualifier {
            let pkg = self
                .resolve_qualifier(scope, qualifier)?
                .ok_or_else(|| undefined(self, qualifier))?;

            if !is_exported(self.env.name(*name)) {
                return Err(LoadError::NotExported {
                    at: self.position(scope, name.span),
                    name: self.env.name(*name).into(),
                    package: self.env.get_package(pkg).path.clone(),
                });
            }

            return match self.env.get_package(pkg).lookup(*name) {
                Some(object) => Ok(Found::Object(object)),
                None => Err(undefined(self, name)),
            };
        }

        if scope.params.contains(&name.item) {
            return Ok(Found::Type(Type::Param(*name)));
        }

        if let Some(object) = self.env.get_package(scope.pkg).lookup(*name) {
            return Ok(Found::Object(object));
        }

        let dot_imports = self.imports(scope).dot.clone();
        for path in dot_imports {
            let pkg = self.import_package(scope.pkg, &path)?;
            if let Some(object) = self.env.get_package(pkg).lookup(*name) {
                if is_exported(self.env.name(*name)) {
                    return Ok(Found::Object(object));
                }
            }
        }

        match self.env.lookup_universe(*name) {
            Some(ty) => Ok(Found::Type(ty.clone())),
            None => Err(undefined(self, name)),
        }
    }

    /// Finds the package a file refers to by `qualifier`.
    ///
    /// Imports without an explicit name are known by the name their package
    /// declares, so they are loaded until one matches. Imports whose path
    /// suggests the right name are tried first, and only their failures are
    /// errors.
    fn resolve_qualifier(
        &mut self,
        scope: Scope<'_>,
        qualifier: Spanned<Symbol>,
    ) -> Result<Option<PkgId>, LoadError> {
        let imports = self.imports(scope);
        if let Some(path) = imports.named.get(&qualifier.item).cloned() {
            return self.import_package(scope.pkg, &path).map(Some);
        }

        let wanted: Box<str> = self.env.name(*qualifier).into();
        let (likely, unlikely): (Vec<_>, Vec<_>) = imports
            .unnamed
            .iter()
            .cloned()
            .partition(|path| guess_package_name(path) == &*wanted);

        for path in likely {
            let pkg = self.import_package(scope.pkg, &path)?;
            if self.env.package_name(pkg) == &*wanted {
                return Ok(Some(pkg));
            }
        }

        for path in unlikely {
            match self.import_package(scope.pkg, &path) {
                Ok(pkg) if self.env.package_name(pkg) == &*wanted => return Ok(Some(pkg)),
                Ok(_) => (),
                Err(error) => {
                    tracing::debug!(%path, %error, "skipping import while resolving {wanted}");
                }
            }
        }

        Ok(None)
    }

    fn imports(&self, scope: Scope<'_>) -> &FileImports {
        &self
            .sources
            .get(&scope.pkg)
            .expect("scopes only refer to packages loaded from source")
            .imports[scope.file]
    }

    fn position(&self, scope: Scope<'_>, span: Span) -> Box<str> {
        let file = &self
            .sources
            .get(&scope.pkg)
            .expect("scopes only refer to packages loaded from source")
            .files[scope.file];
        file.source.position(span).into()
    }
}

fn type_spec(files: &[GoFile], site: DeclSite) -> &TypeSpec {
    match &files[site.file].ast.decls[site.decl] {
        Decl::Type(specs) => &specs[site.spec],
        _ => unreachable!("declaration sites always point at type declarations"),
    }
}

fn type_param_names(spec: &TypeSpec) -> Box<[Symbol]> {
    spec.params
        .iter()
        .flat_map(|group| group.names.iter().map(|name| **name))
        .collect()
}

/// Guesses the name of the package at `path` from its last element, skipping
/// major version suffixes like `/v2` and `.v3`.
fn guess_package_name(path: &str) -> &str {
    let is_major = |elem: &str| {
        elem.strip_prefix('v')
            .is_some_and(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
    };

    let mut elems = path.rsplit('/');
    let last = elems.next().unwrap_or(path);
    let last = match is_major(last) {
        true => elems.next().unwrap_or(last),
        false => last,
    };

    let last = match last.rsplit_once('.') {
        Some((base, suffix)) if is_major(suffix) => base,
        _ => last,
    };

    last.strip_prefix("go-").unwrap_or(last)
}

// FRAMES

/// A single layer of a [`TypeExpr`], with its child types replaced by `A`.
#[derive(Debug, Clone)]
pub enum TypeExprFrame<'a, A> {
    Name {
        qualifier: Option<Spanned<Symbol>>,
        name: Spanned<Symbol>,
        args: Box<[A]>,
    },
    Pointer(A),
    Slice(A),
    Array {
        len: &'a ArrayLen,
        elem: A,
    },
    Map {
        key: A,
        value: A,
    },
    Chan {
        dir: ChanDir,
        elem: A,
    },
    Func(SignatureFrame<A>),
    Struct(Box<[FieldFrame<'a, A>]>),
    Interface(Box<[ElemFrame<A>]>),
}

#[derive(Debug, Clone)]
pub struct SignatureFrame<A> {
    params: Box<[(Option<Symbol>, A)]>,
    results: Box<[(Option<Symbol>, A)]>,
    variadic: bool,
}

#[derive(Debug, Clone)]
pub struct FieldFrame<'a, A> {
    names: &'a [Symbol],
    tag: Option<&'a str>,
    ty: A,
}

#[derive(Debug, Clone)]
pub enum ElemFrame<A> {
    Method { name: Symbol, sig: SignatureFrame<A> },
    Embed(A),
    Union(Box<[(bool, A)]>),
}

impl<A> SignatureFrame<A> {
    fn map<B>(self, f: &mut impl FnMut(A) -> B) -> SignatureFrame<B> {
        SignatureFrame {
            params: self.params.into_iter().map(|(name, ty)| (name, f(ty))).collect(),
            results: self.results.into_iter().map(|(name, ty)| (name, f(ty))).collect(),
            variadic: self.variadic,
        }
    }
}

impl SignatureFrame<Type> {
    /// Builds a signature, wrapping the variadic parameter's element type in
    /// a slice.
    fn into_signature(self) -> Signature {
        let count = self.params.len();
        let variadic = self.variadic;
        let params = self
            .params
            .into_iter()
            .enumerate()
            .map(|(index, (name, ty))| Var {
                name,
                ty: match variadic && index + 1 == count {
                    true => Type::Slice(Box::new(ty)),
                    false => ty,
                },
            })
            .collect();

        let results = self
            .results
            .into_iter()
            .map(|(name, ty)| Var { name, ty })
            .collect();

        Signature {
            params,
            results,
            variadic,
        }
    }
}

impl<'a> MappableFrame for TypeExprFrame<'a, PartiallyApplied> {
    type Frame<X> = TypeExprFrame<'a, X>;

    fn map_frame<A, B>(input: Self::Frame<A>, mut f: impl FnMut(A) -> B) -> Self::Frame<B> {
        match input {
            TypeExprFrame::Name {
                qualifier,
                name,
                args,
            } => TypeExprFrame::Name {
                qualifier,
                name,
                args: args.into_iter().map(f).collect(),
            },
            TypeExprFrame::Pointer(elem) => TypeExprFrame::Pointer(f(elem)),
            TypeExprFrame::Slice(elem) => TypeExprFrame::Slice(f(elem)),
            TypeExprFrame::Array { len, elem } => TypeExprFrame::Array { len, elem: f(elem) },
            TypeExprFrame::Map { key, value } => TypeExprFrame::Map {
                key: f(key),
                value: f(value),
            },
            TypeExprFrame::Chan { dir, elem } => TypeExprFrame::Chan { dir, elem: f(elem) },
            TypeExprFrame::Func(sig) => TypeExprFrame::Func(sig.map(&mut f)),
            TypeExprFrame::Struct(fields) => TypeExprFrame::Struct(
                fields
                    .into_iter()
                    .map(|field| FieldFrame {
                        names: field.names,
                        tag: field.tag,
                        ty: f(field.ty),
                    })
                    .collect(),
            ),
            TypeExprFrame::Interface(elems) => TypeExprFrame::Interface(
                elems
                    .into_iter()
                    .map(|elem| match elem {
                        ElemFrame::Method { name, sig } => ElemFrame::Method {
                            name,
                            sig: sig.map(&mut f),
                        },
                        ElemFrame::Embed(ty) => ElemFrame::Embed(f(ty)),
                        ElemFrame::Union(terms) => ElemFrame::Union(
                            terms.into_iter().map(|(tilde, ty)| (tilde, f(ty))).collect(),
                        ),
                    })
                    .collect(),
            ),
        }
    }
}

impl<'a> Collapsible for &'a TypeExpr {
    type FrameToken = TypeExprFrame<'a, PartiallyApplied>;

    fn into_frame(self) -> <Self::FrameToken as MappableFrame>::Frame<Self> {
        let signature = |sig: &'a FuncType| SignatureFrame {
            params: sig.params.iter().map(|param| (param.name, &param.ty)).collect(),
            results: sig.results.iter().map(|param| (param.name, &param.ty)).collect(),
            variadic: sig.variadic,
        };

        match self {
            TypeExpr::Name {
                qualifier,
                name,
                args,
            } => TypeExprFrame::Name {
                qualifier: *qualifier,
                name: *name,
                args: args.iter().collect(),
            },
            TypeExpr::Pointer(elem) => TypeExprFrame::Pointer(&**elem),
            TypeExpr::Slice(elem) => TypeExprFrame::Slice(&**elem),
            TypeExpr::Array { len, elem } => TypeExprFrame::Array { len, elem: &**elem },
            TypeExpr::Map { key, value } => TypeExprFrame::Map {
                key: &**key,
                value: &**value,
            },
            TypeExpr::Chan { dir, elem } => TypeExprFrame::Chan {
                dir: *dir,
                elem: &**elem,
            },
            TypeExpr::Func(sig) => TypeExprFrame::Func(signature(sig)),
            TypeExpr::Struct(fields) => TypeExprFrame::Struct(
                fields
                    .iter()
                    .map(|field| FieldFrame {
                        names: &*field.names,
                        tag: field.tag.as_deref(),
                        ty: &field.ty,
                    })
                    .collect(),
            ),
            TypeExpr::Interface(elems) => TypeExprFrame::Interface(
                elems
                    .iter()
                    .map(|elem| match elem {
                        InterfaceElem::Method { name, sig } => ElemFrame::Method {
                            name: **name,
                            sig: signature(sig),
                        },
                        InterfaceElem::Embed(ty) => ElemFrame::Embed(ty),
                        InterfaceElem::Union(terms) => ElemFrame::Union(
                            terms.iter().map(|term| (term.tilde, &term.ty)).collect(),
                        ),
                    })
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guesses_package_names() {
        assert_eq!(guess_package_name("net/http"), "http");
        assert_eq!(guess_package_name("github.com/go-redis/redis/v9"), "redis");
        assert_eq!(guess_package_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(guess_package_name("github.com/mattn/go-sqlite3"), "sqlite3");
    }
}
