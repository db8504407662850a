//! Canonical formatting of generated Go source.
//!
//! The renderer indents with spaces and marks alignable cells with vertical
//! tabs. Formatting turns that into gofmt's layout, checks that the result
//! parses, and rewrites the imports into a single sorted block.

use thiserror::Error;

use crate::{
    package::locate::is_standard,
    source_file::line_col,
    symbol::StringInterner,
    syntax::{
        self, SyntaxError,
        ast::{self, ImportName},
    },
};

/// The number of spaces that make up one level of rendered indentation.
const TAB_WIDTH: usize = 8;
const CELL: char = '\u{b}';

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{line}:{column}: {error}")]
pub struct FormatError {
    pub line: usize,
    pub column: usize,
    pub error: SyntaxError,
}

/// Formats rendered Go source.
pub fn format(text: &str) -> Result<String, FormatError> {
    let text = layout(text);

    let mut interner = StringInterner::new();
    let file = syntax::parse_file(&text, &mut interner).map_err(|error| {
        let (line, column) = line_col(&text, error.span().start as usize);
        FormatError {
            line,
            column,
            error,
        }
    })?;

    Ok(match file.imports.is_empty() {
        true => text,
        false => collapse_blank_lines(&rewrite_imports(&text, &file, &interner)),
    })
}

/// Converts indentation to tabs, aligns cells and normalizes whitespace.
fn layout(text: &str) -> String {
    let lines = text
        .lines()
        .map(|line| {
            let body = line.trim_start_matches([' ', '\t']);
            let leading = &line[..line.len() - body.len()];
            let level = leading.matches('\t').count() + leading.matches(' ').count() / TAB_WIDTH;
            (level, body.trim_end())
        })
        .collect::<Vec<_>>();

    let mut out = Vec::with_capacity(lines.len());
    let mut index = 0;
    while index < lines.len() {
        let (level, body) = lines[index];
        if !body.contains(CELL) {
            out.push(indent(level, body));
            index += 1;
            continue;
        }

        let run = lines[index..]
            .iter()
            .take_while(|(other, body)| *other == level && body.contains(CELL))
            .count();

        out.extend(
            align(lines[index..index + run].iter().map(|(_, body)| *body))
                .into_iter()
                .map(|body| indent(level, &body)),
        );
        index += run;
    }

    collapse_blank_lines(&out.join("\n"))
}

fn indent(level: usize, body: &str) -> String {
    match body.is_empty() {
        true => String::new(),
        false => format!("{}{body}", "\t".repeat(level)),
    }
}

/// Pads every cell of a run of lines to the width of the widest cell in its
/// column, plus one space.
fn align<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<String> {
    let rows = lines
        .map(|line| line.split(CELL).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    let columns = rows.iter().map(Vec::len).max().unwrap_or_default();
    let widths = (0..columns.saturating_sub(1))
        .map(|column| {
            rows.iter()
                .filter(|row| column + 1 < row.len())
                .map(|row| row[column].chars().count())
                .max()
                .unwrap_or_default()
        })
        .collect::<Vec<_>>();

    rows.iter()
        .map(|row| {
            let mut line = String::new();
            for (column, cell) in row.iter().enumerate() {
                line.push_str(cell);
                if column + 1 < row.len() {
                    let padding = widths[column] - cell.chars().count() + 1;
                    line.extend(std::iter::repeat_n(' ', padding));
                }
            }
            line.trim_end().to_owned()
        })
        .collect()
}

/// Removes leading blank lines and repeated blank lines, and ends the text
/// with exactly one newline.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank = false;

    for line in text.lines().map(str::trim_end) {
        if line.is_empty() {
            blank = !out.is_empty();
            continue;
        }

        if std::mem::take(&mut blank) {
            out.push('\n');
        }
        out.push_str(line);
        out.push('\n');
    }

    out
}

/// Replaces every import declaration with a single block directly after the
/// package clause.
fn rewrite_imports(text: &str, file: &ast::File, interner: &StringInterner) -> String {
    let mut specs: Vec<(Option<&str>, &str)> = Vec::new();
    for spec in file.imports.iter().flat_map(|decl| decl.specs.iter()) {
        let name = spec.name.map(|name| match name.item {
            ImportName::Dot => ".",
            ImportName::Ident(name) => interner.name(name),
        });

        let spec = (name, &*spec.path.item);
        if !specs.contains(&spec) {
            specs.push(spec);
        }
    }

    specs.sort_by(|(_, a), (_, b)| a.cmp(b));
    let (standard, other): (Vec<_>, Vec<_>) =
        specs.into_iter().partition(|(_, path)| is_standard(path));

    let mut block = String::from("import (\n");
    for (index, group) in [standard, other].into_iter().filter(|group| !group.is_empty()).enumerate() {
        if index > 0 {
            block.push('\n');
        }

        for (name, path) in group {
            block.push('\t');
            if let Some(name) = name {
                block.push_str(name);
                block.push(' ');
            }
            block.push_str(&format!("{path:?}\n"));
        }
    }
    block.push(')');

    let mut out = String::with_capacity(text.len() + block.len());
    let mut cursor = 0;
    for (index, decl) in file.imports.iter().enumerate() {
        let (start, end) = (decl.span.start as usize, decl.span.end as usize);
        out.push_str(&text[cursor..start]);
        if index == 0 {
            out.push_str(&block);
        }
        cursor = end;
    }
    out.push_str(&text[cursor..]);

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indentation_and_alignment() {
        let raw = "package p\n\n\n\ntype T struct {\n        A\u{b}int   \n        Longer\u{b}string\n        // c\n        B\u{b}bool\n}\n\n";
        let formatted = format(raw).unwrap();

        assert_eq!(
            formatted,
            "package p\n\ntype T struct {\n\tA      int\n\tLonger string\n\t// c\n\tB bool\n}\n"
        );
    }

    #[test]
    fn key_value_cells() {
        let raw = "package p\n\nvar x = struct {\n        A\u{b}int\n}{\n        A:\u{b}1,\n}\n";
        let formatted = format(raw).unwrap();
        assert!(formatted.contains("\tA: 1,\n"));
    }

    #[test]
    fn imports_are_grouped_and_sorted() {
        let raw = "package p\n\nimport (\n        \"sync\"\n        x \"example.com/b\"\n        \"context\"\n        \"sync\"\n)\n\nimport \"example.com/a\"\n\ntype T = x.T\n";
        let formatted = format(raw).unwrap();

        assert_eq!(
            formatted,
            "package p\n\nimport (\n\t\"context\"\n\t\"sync\"\n\n\t\"example.com/a\"\n\tx \"example.com/b\"\n)\n\ntype T = x.T\n"
        );
    }

    #[test]
    fn syntax_errors_have_positions() {
        let error = format("package p\n\ntype T struct {\n\tA int;;\n}\n").unwrap_err();
        assert_eq!(error.line, 4);
        assert!(error.to_string().starts_with("4:"));
    }

    #[test]
    fn formatting_is_idempotent() {
        let raw = "package p\n\nimport (\n        \"b.com/x\"\n        \"a\"\n)\n\ntype T struct {\n        A\u{b}int\n}\n";
        let once = format(raw).unwrap();
        assert_eq!(format(&once).unwrap(), once);
    }
}
