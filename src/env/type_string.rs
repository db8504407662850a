//! Rendering types as Go source text.

use std::fmt::Write;

use crate::syntax::ast::ChanDir;

use super::{Env, Interface, PkgId, Signature, Type, Var};

/// Decides how references to named types from a package are qualified.
pub trait Qualifier {
    /// Returns the prefix for names declared in `pkg`, or `None` if they
    /// should be written unqualified.
    fn qualify(&mut self, env: &Env, pkg: PkgId) -> Option<Box<str>>;
}

/// Qualifies every name with the full import path of its package.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathQualifier;

impl Qualifier for PathQualifier {
    fn qualify(&mut self, env: &Env, pkg: PkgId) -> Option<Box<str>> {
        Some(env.get_package(pkg).path.clone())
    }
}

impl<F> Qualifier for F
where
    F: FnMut(&Env, PkgId) -> Option<Box<str>>,
{
    fn qualify(&mut self, env: &Env, pkg: PkgId) -> Option<Box<str>> {
        self(env, pkg)
    }
}

/// Writes `ty` compactly, as in `struct{X int}`. Used in diagnostics.
pub fn type_string(env: &Env, ty: &Type, qualifier: &mut dyn Qualifier) -> String {
    write_type(env, ty, qualifier, false)
}

/// Writes `ty` the way gofmt prints it in source, with a space inside the
/// braces of non-empty struct and interface literals.
pub fn padded_type_string(env: &Env, ty: &Type, qualifier: &mut dyn Qualifier) -> String {
    write_type(env, ty, qualifier, true)
}

fn write_type(env: &Env, ty: &Type, qualifier: &mut dyn Qualifier, padded: bool) -> String {
    let mut writer = TypeWriter {
        env,
        qualifier,
        padded,
        buf: String::new(),
    };
    writer.ty(ty);
    writer.buf
}

struct TypeWriter<'a> {
    env: &'a Env,
    qualifier: &'a mut dyn Qualifier,
    padded: bool,
    buf: String,
}

impl TypeWriter<'_> {
    fn str(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    fn open(&mut self, keyword: &str, empty: bool) {
        self.str(keyword);
        self.str("{");
        if self.padded && !empty {
            self.str(" ");
        }
    }

    fn close(&mut self, empty: bool) {
        if self.padded && !empty {
            self.str(" ");
        }
        self.str("}");
    }

    fn ty(&mut self, ty: &Type) {
        let env = self.env;
        match ty {
            Type::Basic(kind) => self.str(kind.name()),
            Type::Named { id, args } => {
                let named = env.get_named(*id);
                if let Some(qualifier) =
                    named.pkg.and_then(|pkg| self.qualifier.qualify(env, pkg))
                {
                    self.str(&qualifier);
                    self.str(".");
                }
                self.str(env.name(named.name));

                if !args.is_empty() {
                    self.str("[");
                    self.list(args, ", ", Self::ty);
                    self.str("]");
                }
            }
            Type::Param(name) => self.str(env.name(*name)),
            Type::Pointer(elem) => {
                self.str("*");
                self.ty(elem);
            }
            Type::Slice(elem) => {
                self.str("[]");
                self.ty(elem);
            }
            Type::Array(len, elem) => {
                let _ = write!(self.buf, "[{len}]");
                self.ty(elem);
            }
            Type::Map(key, value) => {
                self.str("map[");
                self.ty(key);
                self.str("]");
                self.ty(value);
            }
            Type::Chan(dir, elem) => {
                let parens = match dir {
                    ChanDir::Both => {
                        self.str("chan ");
                        matches!(**elem, Type::Chan(ChanDir::Recv, _))
                    }
                    ChanDir::Send => {
                        self.str("chan<- ");
                        false
                    }
                    ChanDir::Recv => {
                        self.str("<-chan ");
                        false
                    }
                };

                if parens {
                    self.str("(");
                }
                self.ty(elem);
                if parens {
                    self.str(")");
                }
            }
            Type::Signature(sig) => {
                self.str("func");
                self.signature(sig);
            }
            Type::Struct(fields) => {
                self.open("struct", fields.is_empty());
                self.list(fields, "; ", |w, field| {
                    if let Some(name) = field.name {
                        w.str(env.name(name));
                        w.str(" ");
                    }
                    w.ty(&field.ty);
                    if let Some(tag) = &field.tag {
                        let _ = write!(w.buf, " {tag:?}");
                    }
                });
                self.close(fields.is_empty());
            }
            Type::Interface(iface) => self.interface(iface),
        }
    }

    fn interface(&mut self, iface: &Interface) {
        let env = self.env;
        if iface.comparable {
            self.str("comparable");
            return;
        }

        let empty = iface.methods.is_empty() && iface.embeds.is_empty() && iface.unions.is_empty();
        self.open("interface", empty);
        let mut first = true;
        let mut sep = |w: &mut Self| {
            if !std::mem::take(&mut first) {
                w.str("; ");
            }
        };

        for method in &iface.methods {
            sep(self);
            self.str(env.name(method.name));
            self.signature(&method.sig);
        }

        for embed in &iface.embeds {
            sep(self);
            self.ty(embed);
        }

        for terms in &iface.unions {
            sep(self);
            self.list(terms, " | ", |w, term| {
                if term.tilde {
                    w.str("~");
                }
                w.ty(&term.ty);
            });
        }

        self.close(empty);
    }

    fn signature(&mut self, sig: &Signature) {
        self.tuple(&sig.params, sig.variadic);

        match &*sig.results {
            [] => (),
            [Var { name: None, ty }] => {
                self.str(" ");
                self.ty(ty);
            }
            results => {
                self.str(" ");
                self.tuple(results, false);
            }
        }
    }

    fn tuple(&mut self, vars: &[Var], variadic: bool) {
        let env = self.env;
        self.str("(");
        for (index, var) in vars.iter().enumerate() {
            if index > 0 {
                self.str(", ");
            }

            if let Some(name) = var.name {
                self.str(env.name(name));
                self.str(" ");
            }

            match (&var.ty, variadic && index + 1 == vars.len()) {
                (Type::Slice(elem), true) => {
                    self.str("...");
                    self.ty(elem);
                }
                (ty, _) => self.ty(ty),
            }
        }
        self.str(")");
    }

    fn list<T>(&mut self, items: &[T], sep: &str, mut f: impl FnMut(&mut Self, &T)) {
        for (index, item) in items.iter().enumerate() {
            if index > 0 {
                self.str(sep);
            }
            f(self, item);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        env::{BasicKind, Definition, Field, Method, Named},
        symbol::StringInterner,
    };

    use super::*;

    fn basic(kind: BasicKind) -> Type {
        Type::Basic(kind)
    }

    #[test]
    fn composite_types() {
        let mut env = Env::new(StringInterner::new());
        let x = env.interner.intern("x");
        let tag = Some("json:\"x\"".into());

        let ty = Type::Map(
            Box::new(basic(BasicKind::String)),
            Box::new(Type::Slice(Box::new(Type::Pointer(Box::new(Type::Struct(
                Box::new([Field {
                    name: Some(x),
                    ty: basic(BasicKind::Int),
                    tag,
                }]),
            )))))),
        );

        assert_eq!(
            type_string(&env, &ty, &mut PathQualifier),
            r#"map[string][]*struct{x int "json:\"x\""}"#
        );

        let chan = Type::Chan(
            ChanDir::Both,
            Box::new(Type::Chan(ChanDir::Recv, Box::new(basic(BasicKind::Byte)))),
        );
        assert_eq!(type_string(&env, &chan, &mut PathQualifier), "chan (<-chan byte)");

        let array = Type::Array(4, Box::new(Type::Chan(ChanDir::Send, Box::new(basic(BasicKind::Rune)))));
        assert_eq!(type_string(&env, &array, &mut PathQualifier), "[4]chan<- rune");
    }

    #[test]
    fn signatures_and_interfaces() {
        let mut env = Env::new(StringInterner::new());
        let args = env.interner.intern("args");
        let n = env.interner.intern("n");
        let close = env.interner.intern("Close");

        let sig = Signature {
            params: Box::new([
                Var {
                    name: Some(n),
                    ty: basic(BasicKind::Int),
                },
                Var {
                    name: Some(args),
                    ty: Type::Slice(Box::new(basic(BasicKind::String))),
                },
            ]),
            results: Box::new([
                Var {
                    name: None,
                    ty: basic(BasicKind::Bool),
                },
                Var {
                    name: None,
                    ty: basic(BasicKind::Int),
                },
            ]),
            variadic: true,
        };

        assert_eq!(
            type_string(&env, &Type::Signature(sig), &mut PathQualifier),
            "func(n int, args ...string) (bool, int)"
        );

        let error = env.interner.get("error").unwrap();
        let iface = Type::Interface(Interface {
            methods: Box::new([Method {
                name: close,
                pkg: None,
                sig: Signature {
                    params: Box::new([]),
                    results: Box::new([Var {
                        name: None,
                        ty: env.lookup_universe(error).cloned().unwrap(),
                    }]),
                    variadic: false,
                },
            }]),
            ..Interface::default()
        });

        assert_eq!(
            type_string(&env, &iface, &mut PathQualifier),
            "interface{Close() error}"
        );
        assert_eq!(
            type_string(&env, &Type::Interface(Interface::default()), &mut PathQualifier),
            "interface{}"
        );
    }

    #[test]
    fn padded_braces() {
        let mut env = Env::new(StringInterner::new());
        let x = env.interner.intern("X");
        let y = env.interner.intern("Y");
        let close = env.interner.intern("Close");

        let fields = Type::Struct(Box::new([
            Field {
                name: Some(x),
                ty: basic(BasicKind::Int),
                tag: Some("json:\"x\"".into()),
            },
            Field {
                name: Some(y),
                ty: Type::Struct(Box::new([])),
                tag: None,
            },
        ]));
        assert_eq!(
            padded_type_string(&env, &fields, &mut PathQualifier),
            r#"struct{ X int "json:\"x\""; Y struct{} }"#
        );
        assert_eq!(
            type_string(&env, &fields, &mut PathQualifier),
            r#"struct{X int "json:\"x\""; Y struct{}}"#
        );

        let iface = Type::Interface(Interface {
            methods: Box::new([Method {
                name: close,
                pkg: None,
                sig: Signature {
                    params: Box::new([]),
                    results: Box::new([]),
                    variadic: false,
                },
            }]),
            ..Interface::default()
        });
        let sig = Type::Signature(Signature {
            params: Box::new([
                Var {
                    name: None,
                    ty: iface,
                },
                Var {
                    name: None,
                    ty: Type::Interface(Interface::default()),
                },
            ]),
            results: Box::new([]),
            variadic: false,
        });
        assert_eq!(
            padded_type_string(&env, &sig, &mut PathQualifier),
            "func(interface{ Close() }, interface{})"
        );
    }

    #[test]
    fn qualification() {
        let mut env = Env::new(StringInterner::new());
        let http = env.interner.intern("http");
        let request = env.interner.intern("Request");
        let pkg = env.register_package("net/http".into(), http);
        let id = env.register_named(Named {
            name: request,
            pkg: Some(pkg),
            params: Box::new([]),
            definition: Definition::Opaque,
        });
        let ty = Type::Pointer(Box::new(Type::Named {
            id,
            args: Box::new([]),
        }));

        assert_eq!(type_string(&env, &ty, &mut PathQualifier), "*net/http.Request");

        let mut short =
            |env: &Env, pkg: PkgId| -> Option<Box<str>> { Some(env.package_name(pkg).into()) };
        assert_eq!(type_string(&env, &ty, &mut short), "*http.Request");

        let mut local = |_: &Env, _: PkgId| -> Option<Box<str>> { None };
        assert_eq!(type_string(&env, &ty, &mut local), "*Request");
    }
}
