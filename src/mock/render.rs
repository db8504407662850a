//! Rendering contracts as Go source.
//!
//! The output is close to, but not quite, canonical Go: nested blocks are
//! indented with spaces, and cells that gofmt would align are separated by a
//! vertical tab. [`crate::format`] takes care of both.

use std::borrow::Cow;

use pretty::RcDoc;

use crate::GENERATED_MARKER;

use super::{Contract, ImportSet, MethodDesc};

const WIDTH: usize = 100;
const INDENT: isize = 8;

/// Separates cells that are aligned into columns by the formatter.
const CELL: char = '\u{b}';

const SYNC_PATH: &str = "sync";

/// Initialisms that are written entirely in upper case when they form a
/// whole exported identifier, as golint expects.
const GOLINT_INITIALISMS: [&str; 38] = [
    "ACL", "API", "ASCII", "CPU", "CSS", "DNS", "EOF", "GUID", "HTML", "HTTP", "HTTPS", "ID",
    "IP", "JSON", "LHS", "QPS", "RAM", "RHS", "RPC", "SLA", "SMTP", "SQL", "SSH", "TCP", "TLS",
    "TTL", "UDP", "UI", "UID", "UUID", "URI", "URL", "UTF8", "VM", "XML", "XMPP", "XSRF", "XSS",
];

/// The table of initialisms used when exporting parameter names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Initialisms(Box<[&'static str]>);

impl Initialisms {
    pub fn golint() -> Self {
        Self(Box::new(GOLINT_INITIALISMS))
    }

    /// Turns `name` into an exported identifier.
    pub fn exported<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if let Some(initialism) = self
            .0
            .iter()
            .find(|initialism| initialism.eq_ignore_ascii_case(name))
        {
            return Cow::Borrowed(*initialism);
        }

        let mut chars = name.chars();
        match chars.next() {
            Some(first) if !first.is_uppercase() => {
                Cow::Owned(first.to_uppercase().chain(chars).collect())
            }
            _ => Cow::Borrowed(name),
        }
    }
}

impl Default for Initialisms {
    fn default() -> Self {
        Self::golint()
    }
}

pub trait ToDoc {
    fn to_doc(&self, initialisms: &Initialisms) -> RcDoc<'static, ()>;
}

/// Renders a complete document declaring a mock for each of `contracts` in
/// package `package`.
pub fn render(
    package: &str,
    contracts: &[Contract],
    imports: &ImportSet,
    initialisms: &Initialisms,
) -> String {
    let document = Document {
        package,
        contracts,
        imports,
    };

    format!("{}", document.to_doc(initialisms).pretty(WIDTH))
}

struct Document<'a> {
    package: &'a str,
    contracts: &'a [Contract],
    imports: &'a ImportSet,
}

impl ToDoc for Document<'_> {
    fn to_doc(&self, initialisms: &Initialisms) -> RcDoc<'static, ()> {
        let needs_sync = self
            .contracts
            .iter()
            .any(|contract| !contract.methods.is_empty());

        let mut imports = Vec::new();
        if needs_sync {
            imports.push(RcDoc::text(format!("{SYNC_PATH:?}")));
        }

        for import in self.imports.imports() {
            if needs_sync && &*import.path == SYNC_PATH {
                continue;
            }

            imports.push(match import.is_aliased() {
                true => RcDoc::text(format!("{} {:?}", import.local, import.path)),
                false => RcDoc::text(format!("{:?}", import.path)),
            });
        }

        let mut sections = vec![
            RcDoc::text(GENERATED_MARKER),
            RcDoc::text(format!("package {}", self.package)),
        ];

        if !imports.is_empty() {
            sections.push(block(RcDoc::text("import"), "(", imports, ")"));
        }

        sections.extend(
            self.contracts
                .iter()
                .map(|contract| contract.to_doc(initialisms)),
        );

        paragraphs(sections).append(RcDoc::hardline())
    }
}

impl ToDoc for Contract {
    fn to_doc(&self, initialisms: &Initialisms) -> RcDoc<'static, ()> {
        let (name, reference) = (&*self.name, &*self.reference);
        let mock = format!("{name}Mock");

        let assertion = lines([
            RcDoc::text(format!("// Ensure, that {mock} does implement {reference}.")),
            RcDoc::text("// If this is not the case, regenerate this file with moq."),
            RcDoc::text(format!("var _ {reference} = &{mock}{{}}")),
        ]);

        if self.methods.is_empty() {
            let declaration = lines([
                RcDoc::text(format!("// {mock} is a mock implementation of {reference}.")),
                RcDoc::text(format!("type {mock} struct{{}}")),
            ]);

            return paragraphs([assertion, declaration]);
        }

        let mut fields = Vec::new();
        for method in self.methods.iter() {
            fields.push(RcDoc::text(format!(
                "// {}Func mocks the {} method.",
                method.name, method.name
            )));
            fields.push(RcDoc::text(format!(
                "{}Func func{}",
                method.name,
                method.signature()
            )));
            fields.push(RcDoc::nil());
        }

        let calls = self.methods.iter().map(|method| {
            lines([
                RcDoc::text(format!(
                    "// {} holds details about calls to the {} method.",
                    method.name, method.name
                )),
                RcDoc::text(format!("{} []", method.name))
                    .append(record_type(method, initialisms, true)),
            ])
        });

        fields.push(RcDoc::text("// calls tracks calls to the methods."));
        fields.push(block(RcDoc::text("calls struct"), "{", calls, "}"));
        fields.push(RcDoc::text("lock sync.RWMutex"));

        let declaration = lines([
            usage_comment(self),
            block(RcDoc::text(format!("type {mock} struct")), "{", fields, "}"),
        ]);

        let methods = self.methods.iter().flat_map(|method| {
            let method = MockMethod {
                contract: self,
                method,
            };
            [method.forwarder(initialisms), method.accessor(initialisms)]
        });

        paragraphs([assertion, declaration].into_iter().chain(methods))
    }
}

/// The doc comment of a mock, showing how it is set up in a test.
fn usage_comment(contract: &Contract) -> RcDoc<'static, ()> {
    let (name, reference) = (&*contract.name, &*contract.reference);
    let mocked = format!("mocked{name}");

    let mut text = vec![
        format!("// {name}Mock is a mock implementation of {reference}."),
        "//".to_owned(),
        format!("//\tfunc TestSomethingThatUses{name}(t *testing.T) {{"),
        "//".to_owned(),
        format!("//\t\t// make and configure a mocked {reference}"),
        format!("//\t\t{mocked} := &{name}Mock{{"),
    ];

    for method in contract.methods.iter() {
        text.push(format!(
            "//\t\t\t{}Func: func{} {{",
            method.name,
            method.signature()
        ));
        text.push(format!(
            "//\t\t\t\tpanic(\"mock out the {} method\")",
            method.name
        ));
        text.push("//\t\t\t},".to_owned());
    }

    text.extend([
        "//\t\t}".to_owned(),
        "//".to_owned(),
        format!("//\t\t// use {mocked} in code that requires {reference}"),
        "//\t\t// and then make assertions.".to_owned(),
        "//".to_owned(),
        "//\t}".to_owned(),
    ]);

    lines(text.into_iter().map(RcDoc::text))
}

/// A method of a mock, together with the contract it belongs to.
struct MockMethod<'a> {
    contract: &'a Contract,
    method: &'a MethodDesc,
}

impl MockMethod<'_> {
    /// The implementation of the interface method, which records the call
    /// and forwards it to the mock's func field.
    fn forwarder(&self, initialisms: &Initialisms) -> RcDoc<'static, ()> {
        let (contract, method) = (&*self.contract.name, self.method);
        let name = &*method.name;

        let record = match method.params.is_empty() {
            true => RcDoc::text("callInfo := struct{}{}"),
            false => {
                let values = method.params.iter().map(|param| {
                    RcDoc::text(format!(
                        "{}:{CELL}{},",
                        initialisms.exported(&param.name),
                        param.name
                    ))
                });

                RcDoc::text("callInfo := ")
                    .append(record_type(method, initialisms, false))
                    .append(delimited("{", values, "}"))
            }
        };

        let call = format!("mock.{name}Func({})", method.call_list());
        let call = match method.results.is_empty() {
            true => call,
            false => format!("return {call}"),
        };

        let body = [
            block(
                RcDoc::text(format!("if mock.{name}Func == nil")),
                "{",
                [RcDoc::text(format!(
                    "panic(\"moq: {contract}Mock.{name}Func is nil but {contract}.{name} was just called\")"
                ))],
                "}",
            ),
            record,
            RcDoc::text("mock.lock.Lock()"),
            RcDoc::text(format!("mock.calls.{name} = append(mock.calls.{name}, callInfo)")),
            RcDoc::text("mock.lock.Unlock()"),
            RcDoc::text(call),
        ];

        lines([
            RcDoc::text(format!("// {name} calls {name}Func.")),
            block(
                RcDoc::text(format!(
                    "func (mock *{contract}Mock) {name}{}",
                    method.signature()
                )),
                "{",
                body,
                "}",
            ),
        ])
    }

    /// The accessor returning a copy of the recorded calls.
    fn accessor(&self, initialisms: &Initialisms) -> RcDoc<'static, ()> {
        let (contract, method) = (&*self.contract.name, self.method);
        let name = &*method.name;
        let record = || RcDoc::text("[]").append(record_type(method, initialisms, false));

        let body = [
            RcDoc::text("var calls ").append(record()),
            RcDoc::text("mock.lock.RLock()"),
            RcDoc::text(format!("calls = append(calls, mock.calls.{name}...)")),
            RcDoc::text("mock.lock.RUnlock()"),
            RcDoc::text("return calls"),
        ];

        lines([
            RcDoc::text(format!("// {name}Calls gets all the calls that were made to {name}.")),
            RcDoc::text("// Check the length with:"),
            RcDoc::text("//"),
            RcDoc::text(format!("//\tlen(mocked{contract}.{name}Calls())")),
            block(
                RcDoc::text(format!("func (mock *{contract}Mock) {name}Calls() ")).append(record()),
                "{",
                body,
                "}",
            ),
        ])
    }
}

/// The struct type recording the arguments of one call to `method`.
fn record_type(method: &MethodDesc, initialisms: &Initialisms, comments: bool) -> RcDoc<'static, ()> {
    if method.params.is_empty() {
        return RcDoc::text("struct{}");
    }

    let fields = method.params.iter().map(|param| {
        let field = initialisms.exported(&param.name);
        let declaration = RcDoc::text(format!("{field}{CELL}{}", param.ty));

        match comments {
            true => RcDoc::text(format!("// {field} is the {} argument value.", param.name))
                .append(RcDoc::hardline())
                .append(declaration),
            false => declaration,
        }
    });

    block(RcDoc::text("struct"), "{", fields, "}")
}

/// Renders `head {`, then each item of `body` on its own indented line, then
/// the closing delimiter on a line of its own.
fn block(
    head: RcDoc<'static, ()>,
    open: &'static str,
    body: impl IntoIterator<Item = RcDoc<'static, ()>>,
    close: &'static str,
) -> RcDoc<'static, ()> {
    head.append(RcDoc::space()).append(delimited(open, body, close))
}

fn delimited(
    open: &'static str,
    body: impl IntoIterator<Item = RcDoc<'static, ()>>,
    close: &'static str,
) -> RcDoc<'static, ()> {
    RcDoc::text(open)
        .append(RcDoc::hardline().append(lines(body)).nest(INDENT))
        .append(RcDoc::hardline())
        .append(RcDoc::text(close))
}

fn lines(docs: impl IntoIterator<Item = RcDoc<'static, ()>>) -> RcDoc<'static, ()> {
    RcDoc::intersperse(docs, RcDoc::hardline())
}

fn paragraphs(docs: impl IntoIterator<Item = RcDoc<'static, ()>>) -> RcDoc<'static, ()> {
    RcDoc::intersperse(docs, RcDoc::hardline().append(RcDoc::hardline()))
}

#[cfg(test)]
mod tests {
    use crate::mock::Param;

    use super::*;

    fn fetcher() -> Contract {
        Contract {
            name: "Fetcher".into(),
            reference: "Fetcher".into(),
            methods: Box::new([MethodDesc {
                name: "Fetch".into(),
                params: Box::new([Param {
                    name: "url".into(),
                    ty: "string".into(),
                    variadic: false,
                }]),
                results: Box::new([
                    Param {
                        name: "out1".into(),
                        ty: "string".into(),
                        variadic: false,
                    },
                    Param {
                        name: "out2".into(),
                        ty: "error".into(),
                        variadic: false,
                    },
                ]),
            }]),
        }
    }

    #[test]
    fn exported_names() {
        let initialisms = Initialisms::golint();
        assert_eq!(initialisms.exported("url"), "URL");
        assert_eq!(initialisms.exported("Id"), "ID");
        assert_eq!(initialisms.exported("utf8"), "UTF8");
        assert_eq!(initialisms.exported("ctx"), "Ctx");
        assert_eq!(initialisms.exported("in1"), "In1");
        assert_eq!(initialisms.exported("urls"), "Urls");
        assert_eq!(initialisms.exported(""), "");
    }

    #[test]
    fn fetcher_document() {
        let text = render("example", &[fetcher()], &ImportSet::new(), &Initialisms::golint());

        assert!(text.starts_with("// Code generated by moq; DO NOT EDIT.\n\npackage example\n"));
        assert!(text.contains("        \"sync\"\n"));
        assert!(text.contains("var _ Fetcher = &FetcherMock{}\n"));
        assert!(text.contains("        FetchFunc func(url string) (string, error)\n"));
        assert!(text.contains("func (mock *FetcherMock) Fetch(url string) (string, error) {\n"));
        assert!(text.contains("URL:\u{b}url,"));
        assert!(text.contains("        return mock.FetchFunc(url)\n"));
        assert!(text.contains("func (mock *FetcherMock) FetchCalls() []struct {\n"));
        assert!(text.contains("//\tlen(mockedFetcher.FetchCalls())\n"));
    }

    #[test]
    fn empty_interface_document() {
        let empty = Contract {
            name: "Empty".into(),
            reference: "api.Empty".into(),
            methods: Box::new([]),
        };
        let text = render("example", &[empty], &ImportSet::new(), &Initialisms::golint());

        assert!(!text.contains("import"));
        assert!(!text.contains("sync"));
        assert!(text.contains("type EmptyMock struct{}\n"));
        assert!(text.contains("var _ api.Empty = &EmptyMock{}\n"));
    }

    #[test]
    fn aliased_imports() {
        let mut imports = ImportSet::new();
        imports.insert("example.com/a/same", "same");
        imports.insert("example.com/b/same", "same");

        let text = render("example", &[fetcher()], &imports, &Initialisms::golint());
        assert!(text.contains("        \"example.com/a/same\"\n"));
        assert!(text.contains("        same2 \"example.com/b/same\"\n"));
    }
}
