//! A recursive-descent parser for Go type declarations.
//!
//! Declarations that cannot declare types (functions, methods and variables)
//! are skipped by balancing delimiters up to the next top-level semicolon,
//! so function bodies are never inspected beyond their tokens.

use crate::{
    span::{Span, Spanned},
    symbol::{StringInterner, Symbol},
};

use super::{
    SyntaxError,
    ast::{
        ArrayLen, ChanDir, ConstSpec, Decl, FieldDecl, File, FuncType,
        ImportDecl, ImportName, ImportSpec, InterfaceElem, ParamDecl, Term,
        TypeExpr, TypeParamDecl, TypeSpec,
    },
    literal,
    token::{Token, tokenize},
};

type Result<T> = std::result::Result<T, SyntaxError>;

pub struct Parser<'src, 'i> {
    source: &'src str,
    tokens: Box<[Spanned<Token>]>,
    pos: usize,
    interner: &'i mut StringInterner,
}

/// A single entry in a parameter list, before names and types are grouped.
struct ParamEntry {
    name: Option<Spanned<Symbol>>,
    ty: TypeExpr,
    variadic: bool,
    span: Span,
}

impl<'src, 'i> Parser<'src, 'i> {
    pub fn new(
        source: &'src str,
        interner: &'i mut StringInterner,
    ) -> Result<Self> {
        let tokens = tokenize(source)?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
            interner,
        })
    }

    // TOKEN STREAM

    fn peek(&self) -> Option<Token> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).map(|tok| tok.item)
    }

    fn at(&self, token: Token) -> bool {
        self.peek() == Some(token)
    }

    /// The span of the next token, or an empty span at the end of the input.
    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .map(|tok| tok.span)
            .unwrap_or(Span::new(self.source.len(), self.source.len()))
    }

    /// The span of the most recently consumed token.
    fn prev_span(&self) -> Span {
        self.pos
            .checked_sub(1)
            .and_then(|pos| self.tokens.get(pos))
            .map(|tok| tok.span)
            .unwrap_or(Span::ZERO)
    }

    fn bump(&mut self) -> Option<Spanned<Token>> {
        let token = self.tokens.get(self.pos).copied();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: Token) -> bool {
        let matches = self.at(token);
        if matches {
            self.pos += 1;
        }
        matches
    }

    fn expect(&mut self, token: Token, expected: &'static str) -> Result<Span> {
        match self.at(token) {
            true => Ok(self.bump().map(|tok| tok.span).unwrap_or_default()),
            false => Err(self.unexpected(expected)),
        }
    }

    fn unexpected(&self, expected: &'static str) -> SyntaxError {
        SyntaxError::Unexpected {
            expected,
            found: self.peek().map_or("end of file", Token::describe),
            span: self.span(),
        }
    }

    fn text(&self, span: Span) -> &'src str {
        &self.source[span.range()]
    }

    fn ident(&mut self) -> Result<Spanned<Symbol>> {
        let span = self.expect(Token::Ident, "identifier")?;
        let source = self.source;
        Ok(span.with(self.interner.intern(&source[span.range()])))
    }

    fn semicolon(&mut self) -> Result<()> {
        match self.peek().is_none() || self.eat(Token::Semicolon) {
            true => Ok(()),
            false => Err(self.unexpected("`;`")),
        }
    }

    /// Runs `f`, rewinding the token stream if it fails.
    fn attempt<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Option<T> {
        let start = self.pos;
        match f(self) {
            Ok(value) => Some(value),
            Err(_) => {
                self.pos = start;
                None
            }
        }
    }

    /// Parses either a single item or a parenthesized group of items
    /// separated by semicolons.
    fn group<T>(
        &mut self,
        mut item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        if !self.eat(Token::LeftParen) {
            return item(self).map(|item| vec![item]);
        }

        let mut items = Vec::new();
        while !self.eat(Token::RightParen) {
            items.push(item(self)?);

            if !self.at(Token::RightParen) {
                self.expect(Token::Semicolon, "`;` or `)`")?;
            }
        }

        Ok(items)
    }

    /// Skips the remainder of a declaration, stopping before the next `;` or
    /// unbalanced closing delimiter.
    fn skip_spec(&mut self) {
        let mut depth = 0usize;

        while let Some(token) = self.peek() {
            match token {
                Token::LeftParen | Token::LeftBracket | Token::LeftBrace => {
                    depth += 1
                }
                Token::RightParen | Token::RightBracket | Token::RightBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                }
                Token::Semicolon if depth == 0 => return,
                _ => (),
            }

            self.pos += 1;
        }
    }

    fn ident_list(&mut self) -> Result<Box<[Spanned<Symbol>]>> {
        let mut names = vec![self.ident()?];
        while self.at(Token::Comma) && self.peek_nth(1) == Some(Token::Ident) {
            self.bump();
            names.push(self.ident()?);
        }
        Ok(names.into_boxed_slice())
    }

    // FILES AND DECLARATIONS

    pub fn parse_file(mut self) -> Result<File> {
        self.expect(Token::Package, "package clause")?;
        let package = self.ident()?;
        self.semicolon()?;

        let mut imports = Vec::new();
        while self.at(Token::Import) {
            imports.push(self.import_decl()?);
            self.semicolon()?;
        }

        let mut decls = Vec::new();
        while self.peek().is_some() {
            decls.push(self.decl()?);
            self.semicolon()?;
        }

        Ok(File {
            package,
            imports: imports.into_boxed_slice(),
            decls: decls.into_boxed_slice(),
        })
    }

    fn import_decl(&mut self) -> Result<ImportDecl> {
        let start = self.expect(Token::Import, "`import`")?;
        let specs = self.group(Self::import_spec)?;

        Ok(ImportDecl {
            specs: specs.into_boxed_slice(),
            span: start.join(self.prev_span()),
        })
    }

    fn import_spec(&mut self) -> Result<ImportSpec> {
        let name = match self.peek() {
            Some(Token::Dot) => {
                let span = self.span();
                self.bump();
                Some(span.with(ImportName::Dot))
            }
            Some(Token::Ident) => Some(self.ident()?.map(ImportName::Ident)),
            _ => None,
        };

        let path = self.string_literal("import path")?;
        Ok(ImportSpec { name, path })
    }

    fn string_literal(
        &mut self,
        expected: &'static str,
    ) -> Result<Spanned<Box<str>>> {
        match self.peek() {
            Some(token) if token.is_string() => {
                let span = self.span();
                self.bump();
                let value = literal::unquote(self.text(span))
                    .map_err(|error| SyntaxError::Literal { error, span })?;
                Ok(span.with(value.into_boxed_str()))
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn decl(&mut self) -> Result<Decl> {
        match self.peek() {
            Some(Token::Type) => {
                self.bump();
                let specs = self.group(Self::type_spec)?;
                Ok(Decl::Type(specs.into_boxed_slice()))
            }
            Some(Token::Const) => {
                self.bump();
                let specs = self.group(Self::const_spec)?;
                Ok(Decl::Const(specs.into_boxed_slice()))
            }
            Some(Token::Var) => {
                self.bump();
                let specs = self.group(|this| {
                    let names = this.ident_list()?;
                    this.skip_spec();
                    Ok(names)
                })?;
                Ok(Decl::Var(specs.into_iter().flatten().collect()))
            }
            Some(Token::Func) => {
                self.bump();
                let decl = match self.at(Token::LeftParen) {
                    true => Decl::Method,
                    false => Decl::Func(self.ident()?),
                };
                self.skip_spec();
                Ok(decl)
            }
            _ => Err(self.unexpected("declaration")),
        }
    }

    fn const_spec(&mut self) -> Result<ConstSpec> {
        let names = self.ident_list()?;
        let start = self.pos;
        self.skip_spec();

        let value = match &self.tokens[start..self.pos] {
            [assign, int] | [_, assign, int]
                if names.len() == 1
                    && assign.item == Token::Assign
                    && int.item == Token::Int =>
            {
                let span = int.span;
                let value = literal::parse_int(self.text(span))
                    .map_err(|error| SyntaxError::Literal { error, span })?;
                Some(value)
            }
            _ => None,
        };

        Ok(ConstSpec { names, value })
    }

    fn type_spec(&mut self) -> Result<TypeSpec> {
        let name = self.ident()?;

        let params = match self.at(Token::LeftBracket) && self.has_type_params()
        {
            true => self.type_params()?,
            false => Box::default(),
        };

        let alias = self.eat(Token::Assign);
        let ty = self.spanned_type()?;

        Ok(TypeSpec {
            name,
            params,
            alias,
            ty,
        })
    }

    /// Distinguishes `type T[P any] ...` from the array type `type T [N]E`.
    fn has_type_params(&self) -> bool {
        self.peek_nth(1) == Some(Token::Ident)
            && matches!(
                self.peek_nth(2),
                Some(
                    Token::Ident
                        | Token::Comma
                        | Token::Star
                        | Token::LeftBracket
                        | Token::Tilde
                        | Token::Arrow
                        | Token::Interface
                        | Token::Func
                        | Token::Map
                        | Token::Chan
                        | Token::Struct
                )
            )
    }

    fn type_params(&mut self) -> Result<Box<[TypeParamDecl]>> {
        self.expect(Token::LeftBracket, "`[`")?;

        let mut params = Vec::new();
        while !self.eat(Token::RightBracket) {
            let names = self.ident_list()?;
            let constraint = self.constraint()?;
            params.push(TypeParamDecl { names, constraint });

            if !self.at(Token::RightBracket) {
                self.expect(Token::Comma, "`,` or `]`")?;
            }
        }

        Ok(params.into_boxed_slice())
    }

    /// Parses a type constraint, which is a union of possibly-approximate
    /// type terms.
    fn constraint(&mut self) -> Result<TypeExpr> {
        let mut terms = vec![self.term()?];
        while self.eat(Token::Pipe) {
            terms.push(self.term()?);
        }

        if terms.len() == 1 && !terms[0].tilde {
            return Ok(terms.remove(0).ty);
        }

        Ok(TypeExpr::Interface(Box::new([InterfaceElem::Union(
            terms.into_boxed_slice(),
        )])))
    }

    fn term(&mut self) -> Result<Term> {
        let tilde = self.eat(Token::Tilde);
        let ty = self.parse_type()?;
        Ok(Term { tilde, ty })
    }

    // TYPES

    fn spanned_type(&mut self) -> Result<Spanned<TypeExpr>> {
        let start = self.span();
        let ty = self.parse_type()?;
        Ok(start.join(self.prev_span()).with(ty))
    }

    /// Returns `true` if `token` can begin a type.
    fn starts_type(token: Option<Token>) -> bool {
        matches!(
            token,
            Some(
                Token::Ident
                    | Token::Star
                    | Token::LeftBracket
                    | Token::LeftParen
                    | Token::Func
                    | Token::Map
                    | Token::Chan
                    | Token::Struct
                    | Token::Interface
                    | Token::Arrow
            )
        )
    }

    pub fn parse_type(&mut self) -> Result<TypeExpr> {
        match self.peek() {
            Some(Token::Ident) => self.type_name(),
            Some(Token::Star) => {
                self.bump();
                Ok(TypeExpr::Pointer(Box::new(self.parse_type()?)))
            }
            Some(Token::LeftBracket) => {
                self.bump();
                if self.eat(Token::RightBracket) {
                    let elem = self.parse_type()?;
                    return Ok(TypeExpr::Slice(Box::new(elem)));
                }

                let len = self.array_len()?;
                self.expect(Token::RightBracket, "`]`")?;
                let elem = Box::new(self.parse_type()?);
                Ok(TypeExpr::Array { len, elem })
            }
            Some(Token::Map) => {
                self.bump();
                self.expect(Token::LeftBracket, "`[`")?;
                let key = Box::new(self.parse_type()?);
                self.expect(Token::RightBracket, "`]`")?;
                let value = Box::new(self.parse_type()?);
                Ok(TypeExpr::Map { key, value })
            }
            Some(Token::Chan) => {
                self.bump();
                let dir = match self.eat(Token::Arrow) {
                    true => ChanDir::Send,
                    false => ChanDir::Both,
                };
                let elem = Box::new(self.parse_type()?);
                Ok(TypeExpr::Chan { dir, elem })
            }
            Some(Token::Arrow) => {
                self.bump();
                self.expect(Token::Chan, "`chan`")?;
                let elem = Box::new(self.parse_type()?);
                Ok(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem,
                })
            }
            Some(Token::Func) => {
                self.bump();
                Ok(TypeExpr::Func(self.signature()?))
            }
            Some(Token::Struct) => self.struct_type(),
            Some(Token::Interface) => self.interface_type(),
            Some(Token::LeftParen) => {
                self.bump();
                let ty = self.parse_type()?;
                self.expect(Token::RightParen, "`)`")?;
                Ok(ty)
            }
            _ => Err(self.unexpected("type")),
        }
    }

    fn type_name(&mut self) -> Result<TypeExpr> {
        let first = self.ident()?;
        let (qualifier, name) = match self.eat(Token::Dot) {
            true => (Some(first), self.ident()?),
            false => (None, first),
        };

        let args = match self.at(Token::LeftBracket)
            && self.peek_nth(1) != Some(Token::RightBracket)
        {
            true => self.type_args()?,
            false => Box::default(),
        };

        Ok(TypeExpr::Name {
            qualifier,
            name,
            args,
        })
    }

    fn type_args(&mut self) -> Result<Box<[TypeExpr]>> {
        self.expect(Token::LeftBracket, "`[`")?;

        let mut args = Vec::new();
        while !self.eat(Token::RightBracket) {
            args.push(self.parse_type()?);

            if !self.at(Token::RightBracket) {
                self.expect(Token::Comma, "`,` or `]`")?;
            }
        }

        Ok(args.into_boxed_slice())
    }

    fn array_len(&mut self) -> Result<ArrayLen> {
        match (self.peek(), self.peek_nth(1)) {
            (Some(Token::Int), Some(Token::RightBracket)) => {
                let span = self.span();
                self.bump();
                literal::parse_int(self.text(span))
                    .map(ArrayLen::Int)
                    .map_err(|error| SyntaxError::Literal { error, span })
            }
            (Some(Token::Ident), Some(Token::RightBracket)) => {
                Ok(ArrayLen::Const {
                    qualifier: None,
                    name: self.ident()?,
                })
            }
            (Some(Token::Ident), Some(Token::Dot))
                if self.peek_nth(2) == Some(Token::Ident)
                    && self.peek_nth(3) == Some(Token::RightBracket) =>
            {
                let qualifier = Some(self.ident()?);
                self.bump();
                let name = self.ident()?;
                Ok(ArrayLen::Const { qualifier, name })
            }
            _ => {
                let start = self.span();
                let mut depth = 0usize;

                while let Some(token) = self.peek() {
                    match token {
                        Token::LeftParen
                        | Token::LeftBracket
                        | Token::LeftBrace => depth += 1,
                        Token::RightBracket if depth == 0 => break,
                        Token::RightParen
                        | Token::RightBracket
                        | Token::RightBrace => {
                            depth = depth.saturating_sub(1)
                        }
                        Token::Semicolon if depth == 0 => break,
                        _ => (),
                    }
                    self.pos += 1;
                }

                match self.prev_span().end > start.start {
                    true => Ok(ArrayLen::Expr(start.join(self.prev_span()))),
                    false => Err(self.unexpected("array length")),
                }
            }
        }
    }

    fn signature(&mut self) -> Result<FuncType> {
        let (params, variadic) = self.param_list()?;

        let results = match self.peek() {
            Some(Token::LeftParen) => {
                let start = self.span();
                let (results, variadic) = self.param_list()?;
                if variadic {
                    return Err(SyntaxError::Invalid {
                        message: "result parameters cannot be variadic",
                        span: start.join(self.prev_span()),
                    });
                }
                results
            }
            token if Self::starts_type(token) => {
                let ty = self.parse_type()?;
                Box::new([ParamDecl { name: None, ty }])
            }
            _ => Box::default(),
        };

        Ok(FuncType {
            params,
            results,
            variadic,
        })
    }

    fn param_list(&mut self) -> Result<(Box<[ParamDecl]>, bool)> {
        let start = self.expect(Token::LeftParen, "`(`")?;

        let mut entries = Vec::new();
        while !self.eat(Token::RightParen) {
            entries.push(self.param_entry()?);

            if !self.at(Token::RightParen) {
                self.expect(Token::Comma, "`,` or `)`")?;
            }
        }

        let span = start.join(self.prev_span());
        group_params(entries, span)
    }

    fn param_entry(&mut self) -> Result<ParamEntry> {
        let start = self.span();

        if self.at(Token::Ident) {
            let named = self.attempt(|this| {
                let name = this.ident()?;
                let variadic = this.eat(Token::Ellipsis);
                if !variadic && !Self::starts_type(this.peek()) {
                    return Err(this.unexpected("type"));
                }

                let ty = this.parse_type()?;
                match this.peek() {
                    Some(Token::Comma | Token::RightParen) => Ok((name, ty, variadic)),
                    _ => Err(this.unexpected("`,` or `)`")),
                }
            });

            if let Some((name, ty, variadic)) = named {
                return Ok(ParamEntry {
                    name: Some(name),
                    ty,
                    variadic,
                    span: start.join(self.prev_span()),
                });
            }
        }

        let variadic = self.eat(Token::Ellipsis);
        let ty = self.parse_type()?;

        Ok(ParamEntry {
            name: None,
            ty,
            variadic,
            span: start.join(self.prev_span()),
        })
    }

    fn struct_type(&mut self) -> Result<TypeExpr> {
        self.expect(Token::Struct, "`struct`")?;
        self.expect(Token::LeftBrace, "`{`")?;

        let mut fields = Vec::new();
        while !self.eat(Token::RightBrace) {
            fields.push(self.field_decl()?);

            if !self.at(Token::RightBrace) {
                self.expect(Token::Semicolon, "`;` or `}`")?;
            }
        }

        Ok(TypeExpr::Struct(fields.into_boxed_slice()))
    }

    fn field_decl(&mut self) -> Result<FieldDecl> {
        let ends_field = |token: Option<Token>| {
            matches!(
                token,
                Some(
                    Token::Semicolon
                        | Token::RightBrace
                        | Token::String
                        | Token::RawString
                )
            )
        };

        let named = match (self.peek(), self.peek_nth(1)) {
            (Some(Token::Ident), Some(Token::Comma)) => {
                let names = self.ident_list()?;
                let ty = self.parse_type()?;
                Some((names, ty))
            }
            (Some(Token::Ident), next)
                if !ends_field(next) && next != Some(Token::Dot) =>
            {
                self.attempt(|this| {
                    let name = this.ident()?;
                    let ty = this.parse_type()?;
                    match ends_field(this.peek()) {
                        true => Ok((Box::from([name]), ty)),
                        false => Err(this.unexpected("`;` or `}`")),
                    }
                })
            }
            _ => None,
        };

        let (names, ty) = match named {
            Some((names, ty)) => {
                (names.iter().map(|name| name.item).collect(), ty)
            }
            // embedded fields are a (possibly pointer to a) type name
            None => (Box::default(), self.parse_type()?),
        };

        let tag = match self.peek() {
            Some(token) if token.is_string() => {
                Some(self.string_literal("struct tag")?.item)
            }
            _ => None,
        };

        Ok(FieldDecl { names, ty, tag })
    }

    fn interface_type(&mut self) -> Result<TypeExpr> {
        self.expect(Token::Interface, "`interface`")?;
        self.expect(Token::LeftBrace, "`{`")?;

        let mut elems = Vec::new();
        while !self.eat(Token::RightBrace) {
            elems.push(self.interface_elem()?);

            if !self.at(Token::RightBrace) {
                self.expect(Token::Semicolon, "`;` or `}`")?;
            }
        }

        Ok(TypeExpr::Interface(elems.into_boxed_slice()))
    }

    fn interface_elem(&mut self) -> Result<InterfaceElem> {
        if self.at(Token::Ident) && self.peek_nth(1) == Some(Token::LeftParen) {
            let name = self.ident()?;
            let sig = self.signature()?;
            return Ok(InterfaceElem::Method { name, sig });
        }

        let mut terms = vec![self.term()?];
        while self.eat(Token::Pipe) {
            terms.push(self.term()?);
        }

        match terms.len() == 1 && !terms[0].tilde {
            true => Ok(InterfaceElem::Embed(terms.remove(0).ty)),
            false => Ok(InterfaceElem::Union(terms.into_boxed_slice())),
        }
    }
}

/// Resolves the grouping of names and types in a parameter list.
///
/// In `(a, b int, c string)` the entries `a` and `b` parse as bare type names
/// and take their type from the next named entry.
fn group_params(
    entries: Vec<ParamEntry>,
    span: Span,
) -> Result<(Box<[ParamDecl]>, bool)> {
    let last = entries.len().saturating_sub(1);
    if let Some((_, entry)) = entries
        .iter()
        .enumerate()
        .find(|(index, entry)| entry.variadic && *index != last)
    {
        return Err(SyntaxError::Invalid {
            message: "can only use `...` with the final parameter",
            span: entry.span,
        });
    }

    let variadic = entries.last().is_some_and(|entry| entry.variadic);

    if entries.iter().all(|entry| entry.name.is_none()) {
        let params = entries
            .into_iter()
            .map(|entry| ParamDecl {
                name: None,
                ty: entry.ty,
            })
            .collect();
        return Ok((params, variadic));
    }

    let mut params = Vec::with_capacity(entries.len());
    let mut pending_type: Option<TypeExpr> = None;

    for entry in entries.into_iter().rev() {
        match entry.name {
            Some(name) => {
                pending_type = Some(entry.ty.clone());
                params.push(ParamDecl {
                    name: Some(name.item),
                    ty: entry.ty,
                });
            }
            None => match (entry.ty.as_bare_name(), &pending_type) {
                (Some(name), Some(ty)) if !entry.variadic => {
                    params.push(ParamDecl {
                        name: Some(name.item),
                        ty: ty.clone(),
                    })
                }
                _ => {
                    return Err(SyntaxError::Invalid {
                        message: "mixed named and unnamed parameters",
                        span,
                    });
                }
            },
        }
    }

    params.reverse();
    Ok((params.into_boxed_slice(), variadic))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> (File, StringInterner) {
        let mut interner = StringInterner::new();
        let file = Parser::new(source, &mut interner)
            .and_then(Parser::parse_file)
            .unwrap();
        (file, interner)
    }

    fn parse_type(source: &str) -> (TypeExpr, StringInterner) {
        let mut interner = StringInterner::new();
        let ty = Parser::new(source, &mut interner)
            .and_then(|mut parser| parser.parse_type())
            .unwrap();
        (ty, interner)
    }

    fn name_of(interner: &StringInterner, ty: &TypeExpr) -> String {
        match ty {
            TypeExpr::Name {
                qualifier, name, ..
            } => match qualifier {
                Some(q) => {
                    format!("{}.{}", interner.name(q.item), interner.name(name.item))
                }
                None => interner.name(name.item).to_string(),
            },
            other => panic!("expected a type name, got {other:?}"),
        }
    }

    #[test]
    fn package_clause_and_imports() {
        let (file, interner) = parse(
            "package store\n\nimport (\n\t\"context\"\n\tsq \"database/sql\"\n\t. \"strings\"\n)\nimport \"io\"\n",
        );

        assert_eq!(interner.name(file.package.item), "store");
        assert_eq!(file.imports.len(), 2);

        let specs = &file.imports[0].specs;
        assert_eq!(specs.len(), 3);
        assert_eq!(&*specs[0].path.item, "context");
        assert!(specs[0].name.is_none());
        assert!(matches!(
            specs[1].name.map(|n| n.item),
            Some(ImportName::Ident(sym)) if interner.name(sym) == "sq"
        ));
        assert_eq!(specs[2].name.map(|n| n.item), Some(ImportName::Dot));
        assert_eq!(&*file.imports[1].specs[0].path.item, "io");
    }

    #[test]
    fn interface_with_methods_and_embeds() {
        let (file, interner) = parse(
            r#"package p

type Fetcher interface {
	io.Closer
	Fetch(id string) (*Item, error)
	Many(ctx context.Context, ids ...string) []*Item
	Anon(int, string)
}
"#,
        );

        let spec = file.type_specs().next().unwrap();
        assert_eq!(interner.name(spec.name.item), "Fetcher");
        assert!(!spec.alias);

        let TypeExpr::Interface(elems) = &spec.ty.item else {
            panic!("expected an interface");
        };
        assert_eq!(elems.len(), 4);
        assert!(matches!(&elems[0], InterfaceElem::Embed(ty) if name_of(&interner, ty) == "io.Closer"));

        let InterfaceElem::Method { name, sig } = &elems[1] else {
            panic!("expected a method");
        };
        assert_eq!(interner.name(name.item), "Fetch");
        assert_eq!(sig.params.len(), 1);
        assert_eq!(sig.results.len(), 2);
        assert!(sig.results.iter().all(|result| result.name.is_none()));

        let InterfaceElem::Method { sig, .. } = &elems[2] else {
            panic!("expected a method");
        };
        assert!(sig.variadic);
        assert_eq!(sig.params.len(), 2);
        assert_eq!(interner.name(sig.params[1].name.unwrap()), "ids");
        assert_eq!(name_of(&interner, &sig.params[1].ty), "string");

        let InterfaceElem::Method { sig, .. } = &elems[3] else {
            panic!("expected a method");
        };
        assert!(sig.params.iter().all(|param| param.name.is_none()));
        assert!(sig.results.is_empty());
    }

    #[test]
    fn grouped_parameter_names_share_a_type() {
        let (ty, interner) = parse_type("func(a, b int, c []string) (n int, err error)");
        let TypeExpr::Func(sig) = ty else {
            panic!("expected a function type");
        };

        let names: Vec<_> = sig
            .params
            .iter()
            .map(|param| interner.name(param.name.unwrap()))
            .collect();
        assert_eq!(names, ["a", "b", "c"]);
        assert_eq!(name_of(&interner, &sig.params[1].ty), "int");
        assert!(matches!(sig.params[2].ty, TypeExpr::Slice(_)));
        assert_eq!(sig.results.len(), 2);
    }

    #[test]
    fn generic_arguments_versus_named_arrays() {
        let (ty, _) = parse_type("func(List[int], []byte)");
        let TypeExpr::Func(sig) = ty else {
            panic!("expected a function type");
        };

        assert!(sig.params[0].name.is_none());
        assert!(matches!(&sig.params[0].ty, TypeExpr::Name { args, .. } if args.len() == 1));

        let (ty, interner) = parse_type("func(xs [4]byte)");
        let TypeExpr::Func(sig) = ty else {
            panic!("expected a function type");
        };

        assert_eq!(interner.name(sig.params[0].name.unwrap()), "xs");
        assert!(matches!(
            sig.params[0].ty,
            TypeExpr::Array {
                len: ArrayLen::Int(4),
                ..
            }
        ));
    }

    #[test]
    fn type_parameters_versus_array_types() {
        let (file, interner) = parse(
            "package p\n\ntype (\n\tList[T any] []T\n\tBuf [N]byte\n\tPair[K comparable, V any] struct{ k K; v V }\n)\n\nconst N = 16\n",
        );
        let specs: Vec<_> = file.type_specs().collect();

        assert_eq!(specs[0].params.len(), 1);
        assert!(specs[1].params.is_empty());
        assert!(matches!(
            &specs[1].ty.item,
            TypeExpr::Array { len: ArrayLen::Const { name, .. }, .. }
                if interner.name(name.item) == "N"
        ));
        assert_eq!(specs[2].params.len(), 2);

        let Decl::Const(consts) = &file.decls[1] else {
            panic!("expected a const declaration");
        };
        assert_eq!(consts[0].value, Some(16));
    }

    #[test]
    fn channels_and_maps() {
        let (ty, _) = parse_type("map[string]<-chan chan<- int");
        let TypeExpr::Map { value, .. } = ty else {
            panic!("expected a map");
        };
        let TypeExpr::Chan { dir, elem } = *value else {
            panic!("expected a channel");
        };
        assert_eq!(dir, ChanDir::Recv);
        assert!(matches!(
            *elem,
            TypeExpr::Chan {
                dir: ChanDir::Send,
                ..
            }
        ));
    }

    #[test]
    fn struct_fields_and_tags() {
        let (ty, interner) = parse_type(
            "struct {\n\tsync.Mutex\n\t*Base\n\tID, Name string `json:\"id\"`\n\tItems [2]Item\n}",
        );
        let TypeExpr::Struct(fields) = ty else {
            panic!("expected a struct");
        };

        assert_eq!(fields.len(), 4);
        assert!(fields[0].names.is_empty());
        assert!(fields[1].names.is_empty());
        assert!(matches!(fields[1].ty, TypeExpr::Pointer(_)));
        assert_eq!(fields[2].names.len(), 2);
        assert_eq!(fields[2].tag.as_deref(), Some("json:\"id\""));
        assert_eq!(interner.name(fields[3].names[0]), "Items");
    }

    #[test]
    fn constraint_unions() {
        let (file, _) = parse(
            "package p\n\ntype Number interface {\n\t~int | ~float64\n}\n",
        );
        let spec = file.type_specs().next().unwrap();
        let TypeExpr::Interface(elems) = &spec.ty.item else {
            panic!("expected an interface");
        };
        assert!(matches!(&elems[0], InterfaceElem::Union(terms) if terms.len() == 2 && terms[0].tilde));
    }

    #[test]
    fn function_bodies_are_skipped() {
        let (file, interner) = parse(
            r#"package p

func (m *T) Do(x int) error {
	if x > 0 {
		return nil
	}
	s := struct{ a int }{a: 1}
	_ = s
	return errors.New("}")
}

var (
	a, b = 1, 2
	c    int
)

func Helper[T any](v T) T { return v }

type T struct{}
"#,
        );

        assert!(matches!(file.decls[0], Decl::Method));
        assert!(matches!(&file.decls[1], Decl::Var(names) if names.len() == 3));
        assert!(matches!(&file.decls[2], Decl::Func(name) if interner.name(name.item) == "Helper"));
        assert_eq!(file.type_specs().count(), 1);
    }

    #[test]
    fn alias_declarations() {
        let (file, _) = parse("package p\n\ntype Reader = io.Reader\n");
        assert!(file.type_specs().next().unwrap().alias);
    }

    #[test]
    fn syntax_errors_carry_spans() {
        let mut interner = StringInterner::new();
        let error = Parser::new("package p\n\ntype T interface {\n\tM(\n}\n", &mut interner)
            .and_then(Parser::parse_file)
            .unwrap_err();

        match error {
            SyntaxError::Unexpected { span, .. } => assert!(span.start > 0),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn misplaced_variadic_is_rejected() {
        let mut interner = StringInterner::new();
        let result = Parser::new("func(a ...int, b string)", &mut interner)
            .and_then(|mut parser| parser.parse_type());
        assert!(matches!(result, Err(SyntaxError::Invalid { .. })));
    }
}
