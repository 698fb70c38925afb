//! Encoding side of the line-folding/line-prefixing protocol (§4.3, §4.7):
//! the inverse of [`crate::scanner::text_block::decode`].
//!
//! The writer never needs every variant the decoder accepts — it only ever
//! emits plain, prefix-only, or combined prefix+fold blocks, and only when
//! the content actually requires it (a leading `;` on some line, or a line
//! over the [`LINE_LIMIT`] code-unit limit).

use crate::normalize::LINE_LIMIT;

const PREFIX: &str = ">";

/// Render `content` (the logical text, `\n`-separated) as the physical
/// lines that belong between a text block's opening and closing `;`,
/// choosing plain/prefix/fold as needed.
pub fn encode(content: &str) -> Vec<String> {
    let lines: Vec<&str> = content.split('\n').collect();
    // Any content line starting with `;` at column 1 would be misread as the
    // block's closing delimiter once emitted — prefixing protects every
    // line uniformly, so it's the safe choice regardless of which line it is.
    let needs_prefix = lines.iter().any(|l| l.starts_with(';'));
    let overlong = lines.iter().any(|l| units(l) > LINE_LIMIT);
    let has_unsafe_backslash =
        lines.iter().any(|l| l.ends_with('\\') && !l.ends_with("\\\\"));

    if overlong && !has_unsafe_backslash {
        return encode_combined(&lines);
    }
    if needs_prefix {
        return encode_prefix_only(&lines);
    }
    lines.into_iter().map(str::to_string).collect()
}

fn encode_prefix_only(lines: &[&str]) -> Vec<String> {
    let mut out = vec![format!("{PREFIX}\\")];
    out.extend(lines.iter().map(|l| format!("{PREFIX}{l}")));
    out
}

fn encode_combined(lines: &[&str]) -> Vec<String> {
    let budget = LINE_LIMIT.saturating_sub(units(PREFIX));
    let mut out = vec![format!("{PREFIX}\\\\")];
    for line in lines {
        for chunk in fold_logical_line(line, budget) {
            out.push(format!("{PREFIX}{chunk}"));
        }
    }
    out
}

fn units(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Break one logical line into physical pieces, each within `budget` code
/// units, joining all but the last with a trailing fold backslash.
fn fold_logical_line(line: &str, budget: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if units(line) <= budget {
        return vec![line.to_string()];
    }
    let mut out = Vec::new();
    let mut rest: &[char] = &chars;
    while units_of(rest) > budget {
        let cut = find_cut(rest, budget.saturating_sub(1));
        let (head, tail) = rest.split_at(cut);
        out.push(format!("{}\\", head.iter().collect::<String>()));
        rest = tail;
    }
    out.push(rest.iter().collect());
    out
}

fn units_of(chars: &[char]) -> usize {
    chars.iter().map(|c| c.len_utf16()).sum()
}

/// Greedy cut point that fits `budget` code units, nudged back (within an
/// 8-char window) so the chunk never ends right after a literal backslash
/// — that would read back as a doubled escape and break the fold chain.
fn find_cut(chars: &[char], budget: usize) -> usize {
    let mut used = 0;
    let mut i = 0;
    while i < chars.len() {
        let w = chars[i].len_utf16();
        if used + w > budget {
            break;
        }
        used += w;
        i += 1;
    }
    let mut cut = i.max(1);
    let mut back = 0;
    while cut > 1 && chars[cut - 1] == '\\' && back < 8 {
        cut -= 1;
        back += 1;
    }
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::text_block::decode as scanner_decode;

    fn roundtrip(content: &str) -> String {
        let lines = encode(content);
        let (out, errs) = scanner_decode(&lines, true, true);
        assert!(errs.is_empty(), "unexpected decode errors: {errs:?}");
        out
    }

    #[test]
    fn plain_content_round_trips() {
        assert_eq!(roundtrip("hello\nworld"), "hello\nworld");
    }

    #[test]
    fn leading_semicolon_round_trips_via_prefix() {
        let content = ";looks like a terminator\nmore text";
        assert_eq!(roundtrip(content), content);
    }

    #[test]
    fn overlong_line_round_trips_via_fold() {
        let content = "x".repeat(LINE_LIMIT + 50);
        let lines = encode(&content);
        assert!(lines.iter().all(|l| units(l) <= LINE_LIMIT));
        assert_eq!(roundtrip(&content), content);
    }

    #[test]
    fn overlong_line_with_embedded_backslashes_round_trips() {
        let mut content = String::new();
        for _ in 0..400 {
            content.push_str("ab\\cd ");
        }
        assert!(units(&content) > LINE_LIMIT);
        assert_eq!(roundtrip(&content), content);
    }
}
