//! Per-value delimiter selection (§4.7): bare, single-, double-, or
//! triple-quoted, or a semicolon text block, in that order of preference.

use super::text_block;
use crate::model::value::{OrderedTable, Value};
use crate::normalize::LINE_LIMIT;
use crate::parser::number;
use crate::scanner::classes::{classify, CharClass};

/// Whether `value` will be written as a semicolon text block. A text block
/// must open with `;` at column 1 on a fresh line (§4.3), so a caller
/// placing a value after a data name needs to know this *before* writing —
/// a text block gets a newline separator, everything else gets a space
/// (§4.7 column tracking).
pub(super) fn needs_text_block(value: &Value) -> bool {
    matches!(value, Value::Char(s, _) if char_needs_text_block(s))
}

fn char_needs_text_block(s: &str) -> bool {
    if s.contains('\n') || units(s) + 6 > LINE_LIMIT {
        return true;
    }
    !(is_bare_safe(s)
        || safe_inline_quote(s, '\'').is_some()
        || safe_inline_quote(s, '"').is_some()
        || safe_triple_quote(s, '\'')
        || safe_triple_quote(s, '"'))
}

/// Append the written form of `value` to `out`.
pub(super) fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Unk => out.push('?'),
        Value::Na => out.push('.'),
        Value::Numb(n) => out.push_str(n.text()),
        Value::Char(s, _) => write_char(out, s),
        Value::List(items) => write_list(out, items),
        Value::Table(t) => write_table(out, t),
    }
}

fn write_list(out: &mut String, items: &[Value]) {
    out.push('[');
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_value(out, item);
    }
    out.push(']');
}

fn write_table(out: &mut String, table: &OrderedTable) {
    out.push('{');
    for (i, (key, value)) in table.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        write_char(out, key);
        out.push(':');
        write_value(out, value);
    }
    out.push('}');
}

fn write_char(out: &mut String, s: &str) {
    if char_needs_text_block(s) {
        write_text_block(out, s);
        return;
    }
    if is_bare_safe(s) {
        out.push_str(s);
        return;
    }
    if let Some(delim) = safe_inline_quote(s, '\'') {
        push_quoted(out, s, delim, 1);
        return;
    }
    if let Some(delim) = safe_inline_quote(s, '"') {
        push_quoted(out, s, delim, 1);
        return;
    }
    if safe_triple_quote(s, '\'') {
        push_quoted(out, s, '\'', 3);
        return;
    }
    push_quoted(out, s, '"', 3);
}

fn units(s: &str) -> usize {
    s.encode_utf16().count()
}

fn push_quoted(out: &mut String, s: &str, delim: char, width: usize) {
    for _ in 0..width {
        out.push(delim);
    }
    out.push_str(s);
    for _ in 0..width {
        out.push(delim);
    }
}

fn write_text_block(out: &mut String, s: &str) {
    out.push(';');
    // The first encoded line sits directly after the opening `;` on the same
    // physical line (the scanner's `scan_to_eol` reads it as such); later
    // lines each start on their own line.
    let mut lines = text_block::encode(s).into_iter();
    if let Some(first) = lines.next() {
        out.push_str(&first);
    }
    for line in lines {
        out.push('\n');
        out.push_str(&line);
    }
    out.push('\n');
    out.push(';');
}

/// Bare (unquoted) is safe only when the text can't be re-scanned as
/// anything else: no whitespace/newline, not empty, not a reserved keyword
/// prefix, not `?`/`.`, and not something [`crate::parser::number`] would
/// read back as a `NUMB` instead of a `CHAR`.
fn is_bare_safe(s: &str) -> bool {
    if s.is_empty() || s == "?" || s == "." {
        return false;
    }
    if s.chars().any(|c| matches!(classify(c), CharClass::Whitespace | CharClass::Eol)) {
        return false;
    }
    let first = s.chars().next().unwrap();
    if matches!(
        classify(first),
        CharClass::Quote
            | CharClass::Hash
            | CharClass::Semicolon
            | CharClass::OBracket
            | CharClass::CBracket
            | CharClass::OBrace
            | CharClass::CBrace
            | CharClass::Dollar
            | CharClass::Underscore
    ) {
        return false;
    }
    if looks_reserved(s) {
        return false;
    }
    if number::try_parse(s).is_some() {
        return false;
    }
    true
}

fn looks_reserved(s: &str) -> bool {
    let lower = s.to_ascii_lowercase();
    lower.starts_with("data_")
        || lower.starts_with("save_")
        || lower == "loop_"
        || lower == "stop_"
        || lower == "global_"
}

/// A quote delimiter is safe when the content has no embedded occurrence of
/// `delim` immediately followed by whitespace/EOL — that combination would
/// be read back as the string's own terminator (§4.3).
fn safe_inline_quote(s: &str, delim: char) -> Option<char> {
    let chars: Vec<char> = s.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if c == delim {
            if let Some(&next) = chars.get(i + 1) {
                if matches!(classify(next), CharClass::Whitespace | CharClass::Eol) {
                    return None;
                }
            }
        }
    }
    Some(delim)
}

/// A triple-quote delimiter is safe when the content never contains three
/// consecutive copies of `delim` — the scanner closes on that sequence
/// unconditionally, with no trailing-whitespace requirement.
fn safe_triple_quote(s: &str, delim: char) -> bool {
    let run = delim.to_string().repeat(3);
    !s.contains(&run)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::value::Quoting;

    fn render(s: &str) -> String {
        let mut out = String::new();
        write_value(&mut out, &Value::char(s, Quoting::Unquoted));
        out
    }

    #[test]
    fn plain_word_is_bare() {
        assert_eq!(render("hello"), "hello");
    }

    #[test]
    fn numeric_looking_text_is_quoted() {
        assert_eq!(render("42"), "'42'");
    }

    #[test]
    fn reserved_prefix_is_quoted() {
        assert_eq!(render("loop_"), "'loop_'");
    }

    #[test]
    fn embedded_apostrophe_with_space_escalates_to_double_quote() {
        assert_eq!(render("cat' dog"), "\"cat' dog\"");
    }

    #[test]
    fn embedded_apostrophe_without_trailing_space_stays_single_quoted() {
        assert_eq!(render("it's here"), "'it's here'");
    }

    #[test]
    fn both_quote_styles_unsafe_escalates_to_triple() {
        let s = "a 'quote' and a \"quote\" too";
        let out = render(s);
        assert!(out.starts_with("'''") || out.starts_with("\"\"\""));
    }

    #[test]
    fn multiline_uses_text_block() {
        let out = render("line one\nline two");
        assert_eq!(out, ";line one\nline two\n;");
    }

    #[test]
    fn empty_string_is_quoted() {
        assert_eq!(render(""), "''");
    }
}
