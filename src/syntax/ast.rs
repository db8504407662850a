//! The abstract syntax of the subset of Go that declares types.
//!
//! Only the declarations that can contribute to the method sets of an
//! interface are represented in detail. Function and variable declarations
//! keep their names (so that lookups can tell them apart from types) and
//! nothing else.

use crate::{
    span::{Span, Spanned},
    symbol::Symbol,
};

/// A parsed Go source file.
#[derive(Debug, Clone)]
pub struct File {
    pub package: Spanned<Symbol>,
    pub imports: Box<[ImportDecl]>,
    pub decls: Box<[Decl]>,
}

/// A single `import` declaration, possibly grouped.
#[derive(Debug, Clone)]
pub struct ImportDecl {
    pub specs: Box<[ImportSpec]>,
    /// The span from the `import` keyword to the end of the declaration.
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ImportSpec {
    pub name: Option<Spanned<ImportName>>,
    pub path: Spanned<Box<str>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportName {
    /// A dot import, merging the package's exported names into the file.
    Dot,
    /// An explicit local name, including the blank identifier.
    Ident(Symbol),
}

#[derive(Debug, Clone)]
pub enum Decl {
    Type(Box<[TypeSpec]>),
    Const(Box<[ConstSpec]>),
    /// A function without a receiver.
    Func(Spanned<Symbol>),
    /// A method, which declares nothing at package level.
    Method,
    Var(Box<[Spanned<Symbol>]>),
}

#[derive(Debug, Clone)]
pub struct TypeSpec {
    pub name: Spanned<Symbol>,
    pub params: Box<[TypeParamDecl]>,
    /// Whether this is an alias declaration (`type A = B`).
    pub alias: bool,
    pub ty: Spanned<TypeExpr>,
}

/// A group of type parameters sharing a constraint, like `K, V any`.
#[derive(Debug, Clone)]
pub struct TypeParamDecl {
    pub names: Box<[Spanned<Symbol>]>,
    pub constraint: TypeExpr,
}

#[derive(Debug, Clone)]
pub struct ConstSpec {
    pub names: Box<[Spanned<Symbol>]>,
    /// The value of the constant, if it is given directly as an integer
    /// literal.
    pub value: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// A possibly qualified, possibly instantiated type name.
    Name {
        qualifier: Option<Spanned<Symbol>>,
        name: Spanned<Symbol>,
        args: Box<[TypeExpr]>,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array {
        len: ArrayLen,
        elem: Box<TypeExpr>,
    },
    Map {
        key: Box<TypeExpr>,
        value: Box<TypeExpr>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<TypeExpr>,
    },
    Func(FuncType),
    Struct(Box<[FieldDecl]>),
    Interface(Box<[InterfaceElem]>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayLen {
    Int(u64),
    Const {
        qualifier: Option<Spanned<Symbol>>,
        name: Spanned<Symbol>,
    },
    /// Any other constant expression, which is kept unevaluated.
    Expr(Span),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// A function signature.
///
/// When `variadic` is set, the type of the last parameter is the *element*
/// type of the variadic parameter, exactly as written after the `...`.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    pub params: Box<[ParamDecl]>,
    pub results: Box<[ParamDecl]>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamDecl {
    pub name: Option<Symbol>,
    pub ty: TypeExpr,
}

/// A struct field declaration. Embedded fields have no names.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub names: Box<[Symbol]>,
    pub ty: TypeExpr,
    pub tag: Option<Box<str>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceElem {
    Method {
        name: Spanned<Symbol>,
        sig: FuncType,
    },
    Embed(TypeExpr),
    Union(Box<[Term]>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub tilde: bool,
    pub ty: TypeExpr,
}

impl TypeExpr {
    /// Returns the name if `self` is an unqualified, uninstantiated type
    /// name.
    pub fn as_bare_name(&self) -> Option<Spanned<Symbol>> {
        match self {
            TypeExpr::Name {
                qualifier: None,
                name,
                args,
            } if args.is_empty() => Some(*name),
            _ => None,
        }
    }
}

impl File {
    pub fn type_specs(&self) -> impl Iterator<Item = &TypeSpec> {
        self.decls.iter().flat_map(|decl| match decl {
            Decl::Type(specs) => specs.iter(),
            _ => [].iter(),
        })
    }
}
