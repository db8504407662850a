//! The symbol table produced by loading the source package.
//!
//! An [`Env`] acts as a faux-database over every package the loader touched,
//! and is divided into "tables" for `packages`, `named` types and `aliases`.
//! Entries refer to each other by ID, and IDs are only ever created by the
//! table that stores the entry they point to.

use std::collections::HashMap;

use crate::{
    symbol::{StringInterner, Symbol},
    syntax::ast::ChanDir,
};

pub mod loader;
pub mod method_set;
pub mod type_string;

#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct PkgId(usize);

#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct NamedId(usize);

#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Clone, Copy)]
pub struct AliasId(usize);

pub struct Env {
    pub interner: StringInterner,
    packages: Vec<Package>,
    named: Vec<Named>,
    aliases: Vec<Alias>,
    universe: HashMap<Symbol, Type>,
    unsafe_package: PkgId,
    root: Option<PkgId>,
}

/// An entry in the `packages` table of an [`Env`].
#[derive(Debug, Clone)]
pub struct Package {
    /// The import path of the package, including any vendor directories.
    pub path: Box<str>,
    /// The name declared by the package clauses of its files.
    pub name: Symbol,
    scope: HashMap<Symbol, Object>,
}

/// A package-level declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Object {
    Named(NamedId),
    Alias(AliasId),
    /// A constant, with its value if it is an integer literal.
    Const(Option<u64>),
    Func,
    Var,
}

/// An entry in the `named` table of an [`Env`].
#[derive(Debug, Clone)]
pub struct Named {
    pub name: Symbol,
    /// The declaring package, which is `None` for predeclared types.
    pub pkg: Option<PkgId>,
    /// The names of the type parameters.
    pub params: Box<[Symbol]>,
    pub definition: Definition,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// The declaration has not been looked at.
    Pending,
    /// The declaration was looked at, but only its name is needed.
    Opaque,
    /// The right-hand side of the declaration, in terms of the type
    /// parameters in `params`.
    Type(Type),
}

/// An entry in the `aliases` table of an [`Env`].
#[derive(Debug, Clone)]
pub struct Alias {
    pub name: Symbol,
    pub pkg: PkgId,
    pub target: Option<Type>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Basic(BasicKind),
    Named { id: NamedId, args: Box<[Type]> },
    /// A type parameter, referred to by name.
    Param(Symbol),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array(u64, Box<Type>),
    Map(Box<Type>, Box<Type>),
    Chan(ChanDir, Box<Type>),
    Signature(Signature),
    Struct(Box<[Field]>),
    Interface(Interface),
}

/// A function signature. When `variadic` is set, the type of the last
/// parameter is a slice of the variadic element type.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub params: Box<[Var]>,
    pub results: Box<[Var]>,
    pub variadic: bool,
}

/// A parameter or result. Names take no part in type identity.
#[derive(Debug, Clone)]
pub struct Var {
    pub name: Option<Symbol>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// The field name, or `None` for an embedded field.
    pub name: Option<Symbol>,
    pub ty: Type,
    pub tag: Option<Box<str>>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Interface {
    pub methods: Box<[Method]>,
    pub embeds: Box<[Type]>,
    /// Union elements, each a list of terms.
    pub unions: Box<[Box<[Term]>]>,
    /// Set only for the predeclared `comparable`.
    pub comparable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: Symbol,
    /// The package the method was declared in, which matters for the
    /// identity of unexported methods.
    pub pkg: Option<PkgId>,
    pub sig: Signature,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub tilde: bool,
    pub ty: Type,
}

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy)]
pub enum BasicKind {
    Bool,
    Byte,
    Complex64,
    Complex128,
    Float32,
    Float64,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Rune,
    String,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
}

impl BasicKind {
    pub const ALL: [BasicKind; 19] = [
        BasicKind::Bool,
        BasicKind::Byte,
        BasicKind::Complex64,
        BasicKind::Complex128,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Rune,
        BasicKind::String,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Byte => "byte",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Rune => "rune",
            BasicKind::String => "string",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
        }
    }
}

/// Returns `true` if `name` is visible outside of its package.
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

impl PartialEq for Var {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty
    }
}

impl Type {
    /// Replaces type parameters according to `subst`.
    pub fn subst(&self, subst: &HashMap<Symbol, Type>) -> Type {
        if subst.is_empty() {
            return self.clone();
        }

        let boxed = |ty: &Type| Box::new(ty.subst(subst));

        match self {
            Type::Param(name) => subst.get(name).cloned().unwrap_or(Type::Param(*name)),
            Type::Basic(_) => self.clone(),
            Type::Named { id, args } => Type::Named {
                id: *id,
                args: args.iter().map(|arg| arg.subst(subst)).collect(),
            },
            Type::Pointer(elem) => Type::Pointer(boxed(elem)),
            Type::Slice(elem) => Type::Slice(boxed(elem)),
            Type::Array(len, elem) => Type::Array(*len, boxed(elem)),
            Type::Map(key, value) => Type::Map(boxed(key), boxed(value)),
            Type::Chan(dir, elem) => Type::Chan(*dir, boxed(elem)),
            Type::Signature(sig) => Type::Signature(sig.subst(subst)),
            Type::Struct(fields) => Type::Struct(
                fields
                    .iter()
                    .map(|field| Field {
                        name: field.name,
                        ty: field.ty.subst(subst),
                        tag: field.tag.clone(),
                    })
                    .collect(),
            ),
            Type::Interface(iface) => Type::Interface(Interface {
                methods: iface
                    .methods
                    .iter()
                    .map(|method| Method {
                        sig: method.sig.subst(subst),
                        ..method.clone()
                    })
                    .collect(),
                embeds: iface.embeds.iter().map(|ty| ty.subst(subst)).collect(),
                unions: iface
                    .unions
                    .iter()
                    .map(|terms| {
                        terms
                            .iter()
                            .map(|term| Term {
                                tilde: term.tilde,
                                ty: term.ty.subst(subst),
                            })
                            .collect()
                    })
                    .collect(),
                comparable: iface.comparable,
            }),
        }
    }
}

impl Signature {
    pub fn subst(&self, subst: &HashMap<Symbol, Type>) -> Signature {
        let vars = |vars: &[Var]| {
            vars.iter()
                .map(|var| Var {
                    name: var.name,
                    ty: var.ty.subst(subst),
                })
                .collect()
        };

        Signature {
            params: vars(&self.params),
            results: vars(&self.results),
            variadic: self.variadic,
        }
    }
}

impl Package {
    pub fn lookup(&self, name: Symbol) -> Option<Object> {
        self.scope.get(&name).copied()
    }
}

impl Env {
    pub fn new(mut interner: StringInterner) -> Self {
        let mut env = Env {
            universe: HashMap::new(),
            packages: Vec::new(),
            named: Vec::new(),
            aliases: Vec::new(),
            unsafe_package: PkgId(0),
            root: None,
            interner: StringInterner::new(),
        };

        for kind in BasicKind::ALL {
            let name = interner.intern_static(kind.name());
            env.universe.insert(name, Type::Basic(kind));
        }

        // error is interface{ Error() string }
        let error = interner.intern_static("error");
        let error_method = interner.intern_static("Error");
        let error_iface = Interface {
            methods: Box::new([Method {
                name: error_method,
                pkg: None,
                sig: Signature {
                    params: Box::new([]),
                    results: Box::new([Var {
                        name: None,
                        ty: Type::Basic(BasicKind::String),
                    }]),
                    variadic: false,
                },
            }]),
            ..Interface::default()
        };

        let any = interner.intern_static("any");
        let comparable = interner.intern_static("comparable");

        for (name, iface) in [
            (error, error_iface),
            (any, Interface::default()),
            (
                comparable,
                Interface {
                    comparable: true,
                    ..Interface::default()
                },
            ),
        ] {
            let id = env.register_named(Named {
                name,
                pkg: None,
                params: Box::new([]),
                definition: Definition::Type(Type::Interface(iface)),
            });
            env.universe.insert(
                name,
                Type::Named {
                    id,
                    args: Box::new([]),
                },
            );
        }

        let unsafe_name = interner.intern_static("unsafe");
        let pointer = interner.intern_static("Pointer");
        env.unsafe_package = env.register_package("unsafe".into(), unsafe_name);
        let pointer_id = env.register_named(Named {
            name: pointer,
            pkg: Some(env.unsafe_package),
            params: Box::new([]),
            definition: Definition::Opaque,
        });
        env.declare(env.unsafe_package, pointer, Object::Named(pointer_id));

        env.interner = interner;
        env
    }

    pub fn name(&self, symbol: Symbol) -> &str {
        self.interner.name(symbol)
    }

    // PACKAGES

    pub fn register_package(&mut self, path: Box<str>, name: Symbol) -> PkgId {
        let id = PkgId(self.packages.len());
        self.packages.push(Package {
            path,
            name,
            scope: HashMap::new(),
        });
        id
    }

    pub fn get_package(&self, id: PkgId) -> &Package {
        self.packages
            .get(id.0)
            .expect("Package IDs are valid by construction")
    }

    pub fn package_name(&self, id: PkgId) -> &str {
        self.name(self.get_package(id).name)
    }

    /// Adds `object` to the scope of a package, returning the object it
    /// replaced.
    pub fn declare(
        &mut self,
        pkg: PkgId,
        name: Symbol,
        object: Object,
    ) -> Option<Object> {
        self.packages
            .get_mut(pkg.0)
            .expect("Package IDs are valid by construction")
            .scope
            .insert(name, object)
    }

    pub fn unsafe_package(&self) -> PkgId {
        self.unsafe_package
    }

    pub fn set_root(&mut self, id: PkgId) {
        self.root = Some(id);
    }

    pub fn root(&self) -> PkgId {
        self.root
            .expect("the root package is registered before it is used")
    }

    /// Looks up a name declared at the top level of the root package.
    pub fn lookup_root(&self, name: &str) -> Option<Object> {
        let symbol = self.interner.get(name)?;
        self.get_package(self.root()).lookup(symbol)
    }

    // NAMED TYPES

    pub fn register_named(&mut self, named: Named) -> NamedId {
        let id = NamedId(self.named.len());
        self.named.push(named);
        id
    }

    pub fn get_named(&self, id: NamedId) -> &Named {
        self.named
            .get(id.0)
            .expect("Named type IDs are valid by construction")
    }

    pub fn get_named_mut(&mut self, id: NamedId) -> &mut Named {
        self.named
            .get_mut(id.0)
            .expect("Named type IDs are valid by construction")
    }

    // ALIASES

    pub fn register_alias(&mut self, alias: Alias) -> AliasId {
        let id = AliasId(self.aliases.len());
        self.aliases.push(alias);
        id
    }

    pub fn get_alias(&self, id: AliasId) -> &Alias {
        self.aliases
            .get(id.0)
            .expect("Alias IDs are valid by construction")
    }

    pub fn get_alias_mut(&mut self, id: AliasId) -> &mut Alias {
        self.aliases
            .get_mut(id.0)
            .expect("Alias IDs are valid by construction")
    }

    // UNIVERSE

    pub fn lookup_universe(&self, name: Symbol) -> Option<&Type> {
        self.universe.get(&name)
    }

    /// The type a package-level object denotes, if it is a resolved type.
    pub fn object_type(&self, object: Object) -> Option<Type> {
        match object {
            Object::Named(id) => Some(Type::Named {
                id,
                args: Box::new([]),
            }),
            Object::Alias(id) => self.get_alias(id).target.clone(),
            Object::Const(_) | Object::Func | Object::Var => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn universe_contents() {
        let env = Env::new(StringInterner::new());

        let int = env.interner.get("int").unwrap();
        assert_eq!(env.lookup_universe(int), Some(&Type::Basic(BasicKind::Int)));

        let error = env.interner.get("error").unwrap();
        let Some(Type::Named { id, .. }) = env.lookup_universe(error) else {
            panic!("error should be a named type");
        };
        let Definition::Type(Type::Interface(iface)) = &env.get_named(*id).definition
        else {
            panic!("error should be an interface");
        };
        assert_eq!(iface.methods.len(), 1);
        assert_eq!(env.name(iface.methods[0].name), "Error");

        let unsafe_pkg = env.get_package(env.unsafe_package());
        assert_eq!(&*unsafe_pkg.path, "unsafe");
        let pointer = env.interner.get("Pointer").unwrap();
        assert!(matches!(unsafe_pkg.lookup(pointer), Some(Object::Named(_))));
    }

    #[test]
    fn substitution_reaches_signatures() {
        let mut interner = StringInterner::new();
        let t = interner.intern("T");

        let ty = Type::Signature(Signature {
            params: Box::new([Var {
                name: None,
                ty: Type::Slice(Box::new(Type::Param(t))),
            }]),
            results: Box::new([]),
            variadic: true,
        });

        let subst = HashMap::from([(t, Type::Basic(BasicKind::String))]);
        let Type::Signature(sig) = ty.subst(&subst) else {
            unreachable!()
        };

        assert_eq!(
            sig.params[0].ty,
            Type::Slice(Box::new(Type::Basic(BasicKind::String)))
        );
    }

    #[test]
    fn parameter_names_do_not_affect_identity() {
        let mut interner = StringInterner::new();
        let a = interner.intern("a");
        let b = interner.intern("b");

        let var = |name| Var {
            name: Some(name),
            ty: Type::Basic(BasicKind::Int),
        };
        assert_eq!(var(a), var(b));
    }
}
