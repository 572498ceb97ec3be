//! Condition Rewriter
//!
//! Suffix-style scoping: every top-level selector `S` is turned into both
//! `condition S` and `S` + `condition`, so it matches inside the scope and on
//! the scope element itself. The condition must be a simple selector suffix
//! (`[attr]`, `.class`, `#id` or `:pseudo`), never a type selector.
//!
//! Unlike [`crate::selector`], this does not treat `:scope` specially beyond
//! substituting the condition for it, and it never rejects a selector.

use once_cell::sync::Lazy;
use regex::Regex;

static ESCAPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\\.").unwrap());

static STRING_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#""[^"]*"|'[^']*'"#).unwrap());

static ATTRIBUTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[^\]]*\]").unwrap());

static SCOPE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":scope\b").unwrap());

static FUNCTION_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r":[\w-]+\(").unwrap());

/// Protects parts of a selector from the comma split by swapping them for
/// single-use placeholders, and puts them back afterwards.
struct SafeSelector {
    placeholders: Vec<(String, String)>,
    content: String,
}

impl SafeSelector {
    fn new(selector: &str) -> Self {
        let mut safe = SafeSelector {
            placeholders: Vec::new(),
            content: selector.to_string(),
        };
        safe.protect(&ESCAPE_RE, "esc");
        safe.protect(&STRING_RE, "str");
        safe.protect(&ATTRIBUTE_RE, "attr");
        safe
    }

    fn placeholder(&mut self, kind: &str, keep: &str) -> String {
        let replace_by = format!("__{}-ph-{}__", kind, self.placeholders.len());
        self.placeholders.push((replace_by.clone(), keep.to_string()));
        replace_by
    }

    fn protect(&mut self, re: &Regex, kind: &str) {
        let content = std::mem::take(&mut self.content);
        let mut protected = String::with_capacity(content.len());
        let mut last = 0;
        for m in re.find_iter(&content) {
            protected.push_str(&content[last..m.start()]);
            protected.push_str(&self.placeholder(kind, m.as_str()));
            last = m.end();
        }
        protected.push_str(&content[last..]);
        self.content = protected;
    }

    /// Protect `:name(...)` expressions, with balanced nested parentheses.
    fn protect_functions(&mut self) {
        let content = std::mem::take(&mut self.content);
        let mut protected = String::with_capacity(content.len());
        let mut last = 0;

        while let Some(m) = FUNCTION_START_RE.find_at(&content, last) {
            let end = matching_paren_end(&content, m.end()).unwrap_or(content.len());
            protected.push_str(&content[last..m.start()]);
            protected.push_str(&self.placeholder("fn", &content[m.start()..end]));
            last = end;
        }
        protected.push_str(&content[last..]);
        self.content = protected;
    }

    fn replace_scope(&mut self, condition: &str) {
        self.content = SCOPE_RE
            .replace_all(&self.content, regex::NoExpand(condition))
            .into_owned();
    }

    fn restore(&self, content: String) -> String {
        // Later placeholders may hold earlier ones, so unwind in reverse.
        self.placeholders
            .iter()
            .rev()
            .fold(content, |result, (placeholder, keep)| {
                result.replace(placeholder, keep)
            })
    }
}

/// Byte offset just past the `)` closing a parenthesis opened right before
/// `from`.
fn matching_paren_end(text: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for (offset, byte) in text.as_bytes()[from..].iter().enumerate() {
        match byte {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(from + offset + 1);
                }
            }
            _ => {}
        }
    }
    None
}

/// Scope `selector_list` to the elements matched by `condition`.
///
/// ```
/// use scoped_style::condition::scope_to_condition;
///
/// assert_eq!(scope_to_condition("div", "[scoped-id='123']"),
///            "[scoped-id='123'] div, div[scoped-id='123']");
/// ```
pub fn scope_to_condition(selector_list: &str, condition: &str) -> String {
    let mut safe = SafeSelector::new(selector_list);
    // Strings are already protected, so any `:scope` left is a real one.
    safe.replace_scope(condition);
    safe.protect_functions();

    let scoped = safe
        .content
        .split(',')
        .map(str::trim)
        .filter(|selector| !selector.is_empty())
        .flat_map(|selector| {
            [
                format!("{} {}", condition, selector),
                format!("{}{}", selector, condition),
            ]
        })
        .collect::<Vec<_>>()
        .join(", ");

    safe.restore(scoped)
}
