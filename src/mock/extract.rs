//! Turning interfaces into the method descriptions that mocks are rendered
//! from.

use std::{borrow::Cow, collections::HashSet};

use thiserror::Error;

use crate::env::{
    Env, Object, Signature, Type, Var,
    method_set::{MethodSetError, method_set, underlying},
    type_string::{PathQualifier, Qualifier, padded_type_string, type_string},
};

/// The suffix appended to parameter names that would clash with an
/// identifier used inside a generated method.
const COLLISION_SUFFIX: &str = "MoqParam";

/// Names declared or called inside every generated method body.
const BODY_NAMES: [&str; 5] = ["mock", "callInfo", "calls", "panic", "append"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("cannot find interface {0}")]
    NotFound(Box<str>),
    #[error("{name} ({ty}) not an interface")]
    NotAnInterface { name: Box<str>, ty: Box<str> },
    #[error("{name}: {reason} are not supported")]
    Unsupported {
        name: Box<str>,
        reason: &'static str,
    },
    #[error(transparent)]
    MethodSet(#[from] MethodSetError),
}

/// An interface to mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    pub name: Box<str>,
    /// The interface as referred to from the output package.
    pub reference: Box<str>,
    pub methods: Box<[MethodDesc]>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDesc {
    pub name: Box<str>,
    pub params: Box<[Param]>,
    pub results: Box<[Param]>,
}

/// A parameter or result of a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Box<str>,
    /// The qualified type. Variadic parameters have their slice type here.
    pub ty: Box<str>,
    pub variadic: bool,
}

impl Param {
    /// The type as written in a parameter list.
    pub fn type_string(&self) -> Cow<'_, str> {
        match self.variadic {
            true => Cow::Owned(format!("...{}", &self.ty[2..])),
            false => Cow::Borrowed(&self.ty),
        }
    }

    /// The argument as passed on to another function.
    pub fn call_name(&self) -> Cow<'_, str> {
        match self.variadic {
            true => Cow::Owned(format!("{}...", self.name)),
            false => Cow::Borrowed(&self.name),
        }
    }
}

impl std::fmt::Display for Param {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.name, self.type_string())
    }
}

impl MethodDesc {
    /// The named parameter list, like `ctx context.Context, ids ...string`.
    pub fn arg_list(&self) -> String {
        self.params
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The arguments of a call forwarding every parameter.
    pub fn call_list(&self) -> String {
        self.params
            .iter()
            .map(|param| param.call_name())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// The result types, parenthesized when there is more than one.
    pub fn return_list(&self) -> String {
        let types = self
            .results
            .iter()
            .map(|result| result.type_string())
            .collect::<Vec<_>>()
            .join(", ");

        match self.results.len() {
            0 | 1 => types,
            _ => format!("({types})"),
        }
    }

    /// The signature without the `func` keyword.
    pub fn signature(&self) -> String {
        match self.results.len() {
            0 => format!("({})", self.arg_list()),
            _ => format!("({}) {}", self.arg_list(), self.return_list()),
        }
    }
}

/// Looks up each of `names` in the root package of `env` and describes the
/// methods of the interface it declares, in order.
///
/// Every foreign type in a method signature is written through `qualifier`.
pub fn extract(
    env: &Env,
    qualifier: &mut dyn Qualifier,
    names: &[&str],
) -> Result<Box<[Contract]>, ExtractError> {
    names
        .iter()
        .map(|name| contract(env, qualifier, name))
        .collect()
}

fn contract(env: &Env, qualifier: &mut dyn Qualifier, name: &str) -> Result<Contract, ExtractError> {
    let not_found = || ExtractError::NotFound(name.into());
    let not_an_interface = |ty: &str| ExtractError::NotAnInterface {
        name: name.into(),
        ty: ty.into(),
    };

    let object = env.lookup_root(name).ok_or_else(not_found)?;
    let ty = match object {
        Object::Const(_) => return Err(not_an_interface("const")),
        Object::Func => return Err(not_an_interface("func")),
        Object::Var => return Err(not_an_interface("var")),
        Object::Named(_) | Object::Alias(_) => env.object_type(object).ok_or_else(not_found)?,
    };
    let generic = matches!(object, Object::Named(id) if !env.get_named(id).params.is_empty());

    if !matches!(underlying(env, &ty)?, Some(Type::Interface(_))) {
        return Err(not_an_interface(&type_string(env, &ty, &mut PathQualifier)));
    }

    if generic {
        return Err(ExtractError::Unsupported {
            name: name.into(),
            reason: "generic interfaces",
        });
    }

    let methods = match method_set(env, &ty) {
        Ok(methods) => methods,
        Err(MethodSetError::TypeSet(_)) => {
            return Err(ExtractError::Unsupported {
                name: name.into(),
                reason: "constraint interfaces",
            });
        }
        Err(error) => return Err(error.into()),
    };

    tracing::debug!(interface = name, methods = methods.len(), "extracted method set");

    let reference = match qualifier.qualify(env, env.root()) {
        Some(prefix) => format!("{prefix}.{name}").into(),
        None => name.into(),
    };

    Ok(Contract {
        name: name.into(),
        reference,
        methods: methods
            .iter()
            .map(|method| describe(env, qualifier, env.name(method.name), &method.sig))
            .collect(),
    })
}

fn describe(env: &Env, qualifier: &mut dyn Qualifier, name: &str, sig: &Signature) -> MethodDesc {
    let param_types = types(env, qualifier, &sig.params);
    let result_types = types(env, qualifier, &sig.results);

    let mut reserved: HashSet<String> = BODY_NAMES.iter().map(|name| (*name).to_owned()).collect();
    for ty in param_types.iter().chain(result_types.iter()) {
        reserved.extend(identifiers(ty).map(str::to_owned));
    }

    let params = name_params(env, &sig.params, param_types, "in", &reserved)
        .into_iter()
        .enumerate()
        .map(|(index, (name, ty))| Param {
            variadic: sig.variadic && index + 1 == sig.params.len() && ty.starts_with("[]"),
            name,
            ty,
        })
        .collect();

    let results = name_params(env, &sig.results, result_types, "out", &HashSet::new())
        .into_iter()
        .map(|(name, ty)| Param {
            name,
            ty,
            variadic: false,
        })
        .collect();

    MethodDesc {
        name: name.into(),
        params,
        results,
    }
}

fn types(env: &Env, qualifier: &mut dyn Qualifier, vars: &[Var]) -> Vec<Box<str>> {
    vars.iter()
        .map(|var| padded_type_string(env, &var.ty, qualifier).into())
        .collect()
}

/// Names a parameter list. Missing and blank names become `<prefix><k>`,
/// counting from 1, and explicit names found in `reserved` are suffixed until
/// they are free.
fn name_params(
    env: &Env,
    vars: &[Var],
    types: Vec<Box<str>>,
    prefix: &str,
    reserved: &HashSet<String>,
) -> Vec<(Box<str>, Box<str>)> {
    let explicit = vars
        .iter()
        .map(|var| {
            var.name
                .map(|name| env.name(name))
                .filter(|name| *name != "_")
        })
        .collect::<Vec<_>>();

    let mut taken = reserved.clone();
    taken.extend(explicit.iter().flatten().map(|name| (*name).to_owned()));

    let mut names = Vec::with_capacity(vars.len());
    for (index, name) in explicit.iter().enumerate() {
        let name = match name {
            Some(name) if !reserved.contains(*name) => (*name).to_owned(),
            Some(name) => free_name(format!("{name}{COLLISION_SUFFIX}"), &taken),
            None => {
                let synthesized = format!("{prefix}{}", index + 1);
                match taken.contains(&synthesized) {
                    true => free_name(format!("{synthesized}{COLLISION_SUFFIX}"), &taken),
                    false => synthesized,
                }
            }
        };

        taken.insert(name.clone());
        names.push(name.into_boxed_str());
    }

    names.into_iter().zip(types).collect()
}

fn free_name(mut name: String, taken: &HashSet<String>) -> String {
    while taken.contains(&name) {
        name.push_str(COLLISION_SUFFIX);
    }
    name
}

/// The identifiers that appear in a rendered type.
fn identifiers(ty: &str) -> impl Iterator<Item = &str> {
    ty.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| word.chars().next().is_some_and(|c| !c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(name: &str, ty: &str, variadic: bool) -> Param {
        Param {
            name: name.into(),
            ty: ty.into(),
            variadic,
        }
    }

    #[test]
    fn variadic_rendering() {
        let method = MethodDesc {
            name: "Log".into(),
            params: Box::new([
                param("format", "string", false),
                param("args", "[]interface{}", true),
            ]),
            results: Box::new([]),
        };

        assert_eq!(method.arg_list(), "format string, args ...interface{}");
        assert_eq!(method.call_list(), "format, args...");
        assert_eq!(method.signature(), "(format string, args ...interface{})");
    }

    #[test]
    fn return_lists() {
        let mut method = MethodDesc {
            name: "Get".into(),
            params: Box::new([]),
            results: Box::new([param("out1", "string", false)]),
        };
        assert_eq!(method.return_list(), "string");
        assert_eq!(method.signature(), "() string");

        method.results = Box::new([param("out1", "string", false), param("out2", "error", false)]);
        assert_eq!(method.return_list(), "(string, error)");
    }

    #[test]
    fn identifiers_in_types() {
        let words = identifiers("map[string][]*context.Context").collect::<Vec<_>>();
        assert_eq!(words, ["map", "string", "context", "Context"]);
        assert_eq!(identifiers("[4]chan<- int").collect::<Vec<_>>(), ["chan", "int"]);
    }
}
