//! Selector Rewriter
//!
//! Scopes a selector list to the element that carries a scope marker. Every
//! top-level selector either has its leading `:scope` anchors replaced by the
//! scope prefix, or becomes a descendant of the prefix when it has none.
//!
//! This is not a CSS parser. The input is assumed to be a valid selector list,
//! as read back from a live rule.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Reserved anchor meaning "the element the scoped sheet is attached to".
pub const SCOPE_ANCHOR: &str = ":scope";

/// Selector written in place of a list that cannot be scoped.
pub const MATCH_NOTHING: &str = ":not(*)";

// Matches a whole `[foo="bar"]` block with either quote style. Parens and
// commas have no meaning inside an attribute selector; the quoted
// alternatives exist so that `\"`, `\'` and `]` may appear inside the value
// (e.g. `[foo="b\"a]r"]`).
static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)^\[(?:[^\]"'\\]|\\.|"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')*\]"#).unwrap()
});

static STRING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?s)^(?:"(?:[^"\\]|\\.)*"|'(?:[^'\\]|\\.)*')"#).unwrap());

/// A `:scope` anchor was found inside a functional pseudo-class argument
/// (e.g. `:is(h1:scope)`), which has no equivalent once rewritten.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`:scope` inside a functional pseudo-class cannot be scoped: `{selector}`")]
pub struct UnsupportedSelector {
    pub selector: String,
}

/// Rewrite a selector list, falling back to [`MATCH_NOTHING`] when any of its
/// selectors cannot be scoped.
///
/// ```
/// use scoped_style::selector::rewrite_selector_list;
///
/// assert_eq!(rewrite_selector_list("h1, h2", "[s]"), "[s] h1, [s] h2");
/// assert_eq!(rewrite_selector_list("h1:scope > p", "[s]"), "h1[s] > p");
/// assert_eq!(rewrite_selector_list("a, :is(:scope)", "[s]"), ":not(*)");
/// ```
pub fn rewrite_selector_list(selector_list: &str, prefix: &str) -> String {
    try_rewrite_selector_list(selector_list, prefix).unwrap_or_else(|_| MATCH_NOTHING.to_string())
}

/// Rewrite every top-level selector of `selector_list`, failing as a whole if
/// one of them is unsupported.
pub fn try_rewrite_selector_list(
    selector_list: &str,
    prefix: &str,
) -> Result<String, UnsupportedSelector> {
    let scoped = split_selector_list(selector_list)
        .into_iter()
        .map(|selector| rewrite_selector(selector, prefix))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(scoped.join(", "))
}

/// Rewrite a single complex selector (no top-level commas).
pub fn rewrite_selector(selector: &str, prefix: &str) -> Result<String, UnsupportedSelector> {
    let selector = selector.trim();
    let bytes = selector.as_bytes();
    let mut result = String::with_capacity(selector.len() + prefix.len() + 1);

    let mut depth = 0usize;
    // whether we're still in the compound selector that is the subject's root
    let mut leftmost = true;
    let mut anchored = false;
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'[' | b'"' | b'\'' | b'\\' => {
                i += atomic_len(selector, i);
                continue;
            }
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b':' if leftmost && is_anchor_at(selector, i) => {
                if depth > 0 {
                    return Err(UnsupportedSelector {
                        selector: selector.to_string(),
                    });
                }
                // `:scope:scope` is valid, each one is replaced on its own.
                result.push_str(&selector[copied..i]);
                result.push_str(prefix);
                i += SCOPE_ANCHOR.len();
                copied = i;
                anchored = true;
                continue;
            }
            byte if depth == 0 && is_combinator(byte) => leftmost = false,
            _ => {}
        }
        i += 1;
    }
    result.push_str(&selector[copied..]);

    if anchored {
        Ok(result)
    } else {
        Ok(format!("{} {}", prefix, result))
    }
}

/// Split a selector list on its top-level commas. Each selector is trimmed
/// and empty selectors are dropped.
pub fn split_selector_list(selector_list: &str) -> Vec<&str> {
    let bytes = selector_list.as_bytes();
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'[' | b'"' | b'\'' | b'\\' => {
                i += atomic_len(selector_list, i);
                continue;
            }
            b'(' => depth += 1,
            b')' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(selector_list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    parts.push(selector_list[start..].trim());

    parts.retain(|part| !part.is_empty());
    parts
}

/// Length of the span starting at `at` that must be copied verbatim: an
/// attribute block, a quoted string or an escape sequence. `at` must point at
/// `[`, a quote or a backslash.
fn atomic_len(text: &str, at: usize) -> usize {
    let rest = &text[at..];
    match rest.as_bytes()[0] {
        b'[' => ATTRIBUTE_RE.find(rest).map_or(1, |m| m.end()),
        b'\\' => 1 + rest[1..].chars().next().map_or(0, char::len_utf8),
        // an unterminated string runs to the end of the selector
        _ => STRING_RE.find(rest).map_or(rest.len(), |m| m.end()),
    }
}

fn is_anchor_at(text: &str, at: usize) -> bool {
    let rest = &text[at..];
    rest.starts_with(SCOPE_ANCHOR)
        && !rest.as_bytes()[SCOPE_ANCHOR.len()..]
            .first()
            .is_some_and(|&byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

fn is_combinator(byte: u8) -> bool {
    byte.is_ascii_whitespace() || matches!(byte, b'>' | b'~' | b'+')
}
