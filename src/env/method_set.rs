//! Flattening interfaces into their complete method sets.

use std::collections::HashMap;

use thiserror::Error;

use super::{
    Definition, Env, Method, NamedId, Type, is_exported,
    type_string::{PathQualifier, type_string},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MethodSetError {
    #[error("{0} is not an interface")]
    NotInterface(Box<str>),
    #[error("duplicate method {method} in {ty}")]
    DuplicateMethod { ty: Box<str>, method: Box<str> },
    #[error("invalid recursive type {0}")]
    Cycle(Box<str>),
    #[error("{0} contains type constraints")]
    TypeSet(Box<str>),
}

/// Returns the underlying type of `ty` by following named types through
/// their definitions, instantiating type parameters along the way.
///
/// Returns `Ok(None)` if a named type on the way was never resolved.
pub fn underlying(env: &Env, ty: &Type) -> Result<Option<Type>, MethodSetError> {
    let mut seen: Vec<NamedId> = Vec::new();
    let mut current = ty.clone();

    loop {
        let Type::Named { id, args } = &current else {
            return Ok(Some(current));
        };

        if seen.contains(id) {
            return Err(MethodSetError::Cycle(describe(env, ty)));
        }
        seen.push(*id);

        let named = env.get_named(*id);
        let Definition::Type(rhs) = &named.definition else {
            return Ok(None);
        };

        let subst = named
            .params
            .iter()
            .copied()
            .zip(args.iter().cloned())
            .collect::<HashMap<_, _>>();
        current = rhs.subst(&subst);
    }
}

/// Computes the complete method set of an interface type, sorted by method
/// id: the name of exported methods, and `path.name` for unexported ones.
///
/// Embedded interfaces are flattened, and identical methods reached through
/// several embeddings are merged.
pub fn method_set(env: &Env, ty: &Type) -> Result<Box<[Method]>, MethodSetError> {
    let mut collector = Collector {
        env,
        methods: Vec::new(),
        stack: Vec::new(),
        root: ty,
    };

    collector.collect(ty)?;

    let mut methods = collector.methods;
    methods.sort_by_cached_key(|method| method_id(env, method));
    Ok(methods.into_boxed_slice())
}

/// The unique id of a method within a method set.
pub fn method_id(env: &Env, method: &Method) -> String {
    let name = env.name(method.name);
    match (is_exported(name), method.pkg) {
        (false, Some(pkg)) => format!("{}.{name}", env.get_package(pkg).path),
        _ => name.to_owned(),
    }
}

struct Collector<'a> {
    env: &'a Env,
    methods: Vec<Method>,
    stack: Vec<NamedId>,
    root: &'a Type,
}

impl Collector<'_> {
    fn collect(&mut self, ty: &Type) -> Result<(), MethodSetError> {
        let named = match ty {
            Type::Named { id, .. } => Some(*id),
            _ => None,
        };

        if let Some(id) = named {
            if self.stack.contains(&id) {
                return Err(MethodSetError::Cycle(describe(self.env, ty)));
            }
            self.stack.push(id);
        }

        let Some(Type::Interface(iface)) = underlying(self.env, ty)? else {
            return Err(MethodSetError::NotInterface(describe(self.env, ty)));
        };

        if iface.comparable || !iface.unions.is_empty() {
            return Err(MethodSetError::TypeSet(describe(self.env, ty)));
        }

        for method in iface.methods.iter() {
            self.add(method)?;
        }

        for embed in iface.embeds.iter() {
            self.collect(embed)?;
        }

        if named.is_some() {
            self.stack.pop();
        }

        Ok(())
    }

    fn add(&mut self, method: &Method) -> Result<(), MethodSetError> {
        let id = method_id(self.env, method);
        let existing = self
            .methods
            .iter()
            .find(|other| method_id(self.env, other) == id);

        match existing {
            None => self.methods.push(method.clone()),
            Some(existing) if existing.sig == method.sig => (),
            Some(_) => {
                return Err(MethodSetError::DuplicateMethod {
                    ty: describe(self.env, self.root),
                    method: id.into(),
                });
            }
        }

        Ok(())
    }
}

fn describe(env: &Env, ty: &Type) -> Box<str> {
    type_string(env, ty, &mut PathQualifier).into()
}

#[cfg(test)]
mod tests {
    use crate::{
        env::{BasicKind, Interface, Named, PkgId, Signature, Var},
        symbol::StringInterner,
    };

    use super::*;

    fn sig(results: &[Type]) -> Signature {
        Signature {
            params: Box::new([]),
            results: results
                .iter()
                .map(|ty| Var {
                    name: None,
                    ty: ty.clone(),
                })
                .collect(),
            variadic: false,
        }
    }

    fn named_iface(env: &mut Env, pkg: PkgId, name: &str, iface: Interface) -> Type {
        let name = env.interner.intern(name);
        let id = env.register_named(Named {
            name,
            pkg: Some(pkg),
            params: Box::new([]),
            definition: Definition::Type(Type::Interface(iface)),
        });
        Type::Named {
            id,
            args: Box::new([]),
        }
    }

    fn method(env: &mut Env, pkg: PkgId, name: &str, results: &[Type]) -> Method {
        Method {
            name: env.interner.intern(name),
            pkg: Some(pkg),
            sig: sig(results),
        }
    }

    fn setup() -> (Env, PkgId) {
        let mut env = Env::new(StringInterner::new());
        let name = env.interner.intern("store");
        let pkg = env.register_package("example.com/store".into(), name);
        (env, pkg)
    }

    #[test]
    fn flattens_and_sorts_embedded_methods() {
        let (mut env, pkg) = setup();
        let error = env.lookup_universe(env.interner.get("error").unwrap()).cloned().unwrap();

        let close = method(&mut env, pkg, "Close", &[error.clone()]);
        let closer = named_iface(&mut env, pkg, "Closer", Interface {
            methods: Box::new([close.clone()]),
            ..Interface::default()
        });

        let read = method(&mut env, pkg, "Read", &[Type::Basic(BasicKind::Int)]);
        let flush = method(&mut env, pkg, "flush", &[]);
        let rc = named_iface(&mut env, pkg, "ReadCloser", Interface {
            methods: Box::new([read, flush, close]),
            embeds: Box::new([closer, error]),
            ..Interface::default()
        });

        let methods = method_set(&env, &rc).unwrap();
        let ids = methods.iter().map(|m| method_id(&env, m)).collect::<Vec<_>>();
        assert_eq!(ids, ["Close", "Error", "Read", "example.com/store.flush"]);
    }

    #[test]
    fn conflicting_duplicates_fail() {
        let (mut env, pkg) = setup();

        let a = method(&mut env, pkg, "Len", &[Type::Basic(BasicKind::Int)]);
        let b = method(&mut env, pkg, "Len", &[Type::Basic(BasicKind::Uint)]);
        let inner = named_iface(&mut env, pkg, "Inner", Interface {
            methods: Box::new([b]),
            ..Interface::default()
        });
        let outer = Type::Interface(Interface {
            methods: Box::new([a]),
            embeds: Box::new([inner]),
            ..Interface::default()
        });

        assert!(matches!(
            method_set(&env, &outer),
            Err(MethodSetError::DuplicateMethod { .. })
        ));
    }

    #[test]
    fn embedding_cycles_fail() {
        let (mut env, pkg) = setup();
        let a = env.interner.intern("A");
        let id = env.register_named(Named {
            name: a,
            pkg: Some(pkg),
            params: Box::new([]),
            definition: Definition::Pending,
        });
        let ty = Type::Named {
            id,
            args: Box::new([]),
        };
        env.get_named_mut(id).definition = Definition::Type(Type::Interface(Interface {
            embeds: Box::new([ty.clone()]),
            ..Interface::default()
        }));

        assert!(matches!(method_set(&env, &ty), Err(MethodSetError::Cycle(_))));
    }

    #[test]
    fn non_interfaces_and_constraints_fail() {
        let (env, _) = setup();
        let comparable = env
            .lookup_universe(env.interner.get("comparable").unwrap())
            .cloned()
            .unwrap();

        assert!(matches!(
            method_set(&env, &Type::Basic(BasicKind::Int)),
            Err(MethodSetError::NotInterface(_))
        ));
        assert!(matches!(
            method_set(&env, &comparable),
            Err(MethodSetError::TypeSet(_))
        ));
    }

    #[test]
    fn generic_embeds_are_instantiated() {
        let (mut env, pkg) = setup();
        let t = env.interner.intern("T");
        let getter = env.interner.intern("Getter");
        let get = method(&mut env, pkg, "Get", &[Type::Param(t)]);

        let id = env.register_named(Named {
            name: getter,
            pkg: Some(pkg),
            params: Box::new([t]),
            definition: Definition::Type(Type::Interface(Interface {
                methods: Box::new([get]),
                ..Interface::default()
            })),
        });

        let instance = Type::Named {
            id,
            args: Box::new([Type::Basic(BasicKind::String)]),
        };
        let methods = method_set(&env, &instance).unwrap();

        assert_eq!(methods[0].sig.results[0].ty, Type::Basic(BasicKind::String));
    }
}
