//! Line-folding and line-prefixing decode protocols for semicolon text
//! blocks (§4.3).
//!
//! The scanner hands this module the raw physical lines between the
//! opening and closing `;` delimiters; decoding happens once, before the
//! value is stored, so downstream code only ever sees the logical content.

use crate::error::CifError;

/// Decode a text block's raw physical lines per the folding/prefixing
/// protocol, gated by `fold_enabled`/`prefix_enabled` (themselves derived
/// from CIF version defaults plus any caller override, §4.3).
///
/// Returns the decoded content and any recoverable errors encountered
/// (currently only prefix mismatches).
pub fn decode(lines: &[String], fold_enabled: bool, prefix_enabled: bool) -> (String, Vec<CifError>) {
    if lines.is_empty() {
        return (String::new(), Vec::new());
    }

    // A text block whose very first character is a literal `;` is never
    // folded or prefixed, regardless of what follows (§4.3).
    if lines[0].starts_with(';') {
        return (lines.join("\n"), Vec::new());
    }

    let first = &lines[0];
    let mut folded = false;
    let mut prefix: Option<String> = None;

    if prefix_enabled && first.ends_with("\\\\") {
        // Doubled trailing backslash: strip both, regardless of whether
        // folding is on, or one literal backslash stays glued to the prefix.
        prefix = Some(first[..first.len() - 2].to_string());
        if fold_enabled {
            folded = true;
        }
    } else if first.ends_with('\\') {
        let candidate = &first[..first.len() - 1];
        if candidate.trim().is_empty() {
            if fold_enabled {
                folded = true;
            }
        } else if prefix_enabled {
            prefix = Some(candidate.to_string());
        }
    }

    let consumed_marker_line = folded || prefix.is_some();
    let content_lines: &[String] = if consumed_marker_line { &lines[1..] } else { lines };

    let mut errors = Vec::new();
    let mut stripped: Vec<String> = Vec::with_capacity(content_lines.len());
    for line in content_lines {
        match &prefix {
            Some(p) => match line.strip_prefix(p.as_str()) {
                Some(rest) => stripped.push(rest.to_string()),
                None => {
                    errors.push(CifError::InvalidChar { at: None });
                    stripped.push(line.clone());
                }
            },
            None => stripped.push(line.clone()),
        }
    }

    if !folded {
        return (stripped.join("\n"), errors);
    }

    let mut merged = String::new();
    let mut i = 0;
    while i < stripped.len() {
        let mut line = stripped[i].clone();
        loop {
            if line.ends_with('\\') && !line.ends_with("\\\\") {
                line.pop();
                merged.push_str(&line);
                i += 1;
                if i < stripped.len() {
                    line = stripped[i].clone();
                    continue;
                } else {
                    break;
                }
            } else {
                merged.push_str(&line);
                i += 1;
                if i < stripped.len() {
                    merged.push('\n');
                }
                break;
            }
        }
    }
    (merged, errors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_block_is_untouched() {
        let lines = vec!["hello".to_string(), "world".to_string()];
        let (out, errs) = decode(&lines, true, true);
        assert_eq!(out, "hello\nworld");
        assert!(errs.is_empty());
    }

    #[test]
    fn folded_block_joins_continued_lines() {
        let lines = vec![
            "\\".to_string(),
            "this is a long sentence that got \\".to_string(),
            "folded across physical lines".to_string(),
        ];
        let (out, errs) = decode(&lines, true, true);
        assert_eq!(out, "this is a long sentence that got folded across physical lines");
        assert!(errs.is_empty());
    }

    #[test]
    fn prefixed_block_strips_prefix() {
        let lines = vec![
            "> \\".to_string(),
            "> first line".to_string(),
            "> second; line".to_string(),
        ];
        let (out, errs) = decode(&lines, true, true);
        assert_eq!(out, "first line\nsecond; line");
        assert!(errs.is_empty());
    }

    #[test]
    fn combined_prefix_and_fold() {
        let lines = vec![
            "> \\\\".to_string(),
            "> a very long value that was \\".to_string(),
            "> folded too".to_string(),
        ];
        let (out, errs) = decode(&lines, true, true);
        assert_eq!(out, "a very long value that was folded too");
        assert!(errs.is_empty());
    }

    #[test]
    fn leading_literal_semicolon_disables_decoding() {
        let lines = vec![";not a marker".to_string(), "plain".to_string()];
        let (out, errs) = decode(&lines, true, true);
        assert_eq!(out, ";not a marker\nplain");
        assert!(errs.is_empty());
    }

    #[test]
    fn prefix_mismatch_recovers_with_error() {
        let lines = vec!["> \\".to_string(), "not prefixed".to_string()];
        let (out, errs) = decode(&lines, true, true);
        assert_eq!(out, "not prefixed");
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn doubled_backslash_marker_with_folding_disabled_strips_both_backslashes() {
        let lines = vec![
            "> \\\\".to_string(),
            "> first line".to_string(),
            "> second line".to_string(),
        ];
        let (out, errs) = decode(&lines, false, true);
        assert_eq!(out, "first line\nsecond line");
        assert!(errs.is_empty());
    }

    #[test]
    fn decoding_disabled_leaves_markers_literal() {
        let lines = vec!["\\".to_string(), "raw line".to_string()];
        let (out, errs) = decode(&lines, false, false);
        assert_eq!(out, "\\\nraw line");
        assert!(errs.is_empty());
    }
}
