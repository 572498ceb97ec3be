//! CSS Text Splitting
//!
//! Just enough CSS to build the in-memory object model: rules, their blocks,
//! grouping at-rules and `@import` targets. Declarations are kept as opaque
//! text and nothing is validated.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

const BLOCK_PLACEHOLDER: &str = "%BLOCK%";
const COMMA_IN_PLACEHOLDER: &str = "%COMMA_IN_PLACEHOLDER%";
const SEMI_IN_PLACEHOLDER: &str = "%SEMI_IN_PLACEHOLDER%";
const COLON_IN_PLACEHOLDER: &str = "%COLON_IN_PLACEHOLDER%";
const LBRACE_IN_PLACEHOLDER: &str = "%LBRACE_IN_PLACEHOLDER%";
const RBRACE_IN_PLACEHOLDER: &str = "%RBRACE_IN_PLACEHOLDER%";

/// At-rules whose block holds further rules.
pub const GROUP_AT_RULES: &[&str] = &[
    "@media",
    "@supports",
    "@document",
    "@layer",
    "@container",
    "@scope",
    "@starting-style",
];

static COMMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\*[\s\S]*?\*/").unwrap());

static RULE_RE: Lazy<Regex> = Lazy::new(|| {
    // A prelude, then a block, a terminating `;` or the end of the input.
    // An unterminated block at the end of the input still counts.
    let pattern = format!(
        r"([^;{{}}]+?)\s*(\{{{}\}}?|;|$)",
        regex::escape(BLOCK_PLACEHOLDER)
    );
    Regex::new(&pattern).unwrap()
});

static IMPORT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)^@import\s*(?:url\(\s*(?:'([^']*)'|"([^"]*)"|([^)\s]*))\s*\)|'([^']*)'|"([^"]*)")"#,
    )
    .unwrap()
});

static AT_KEYWORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^@[\w-]+").unwrap());

/// A rule as written: its prelude (selector or at-rule head) and its block
/// content, if it has a block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawRule {
    pub prelude: String,
    pub block: Option<String>,
}

/// A rule classified for the object model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedRule {
    Style {
        selector: String,
        declarations: String,
    },
    Group {
        prelude: String,
        rules: Vec<ParsedRule>,
    },
    Import {
        prelude: String,
        href: String,
    },
    Other {
        prelude: String,
        block: Option<String>,
    },
}

/// Split a style sheet into classified rules, recursing into group blocks.
pub fn parse_stylesheet(css_text: &str) -> Vec<ParsedRule> {
    split_rules(css_text).into_iter().map(classify).collect()
}

fn classify(rule: RawRule) -> ParsedRule {
    let RawRule { prelude, block } = rule;
    if !prelude.starts_with('@') {
        return ParsedRule::Style {
            selector: prelude,
            declarations: block.unwrap_or_default(),
        };
    }

    if let Some(caps) = IMPORT_RE.captures(&prelude) {
        let href = (1..=5)
            .find_map(|group| caps.get(group))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        return ParsedRule::Import { prelude, href };
    }

    let keyword = at_keyword(&prelude).to_ascii_lowercase();
    match block {
        Some(block) if GROUP_AT_RULES.contains(&keyword.as_str()) => ParsedRule::Group {
            rules: parse_stylesheet(&block),
            prelude,
        },
        block => ParsedRule::Other { prelude, block },
    }
}

/// `@media` for `@media screen`.
pub fn at_keyword(prelude: &str) -> &str {
    AT_KEYWORD_RE.find(prelude).map_or("", |m| m.as_str())
}

/// Split CSS text into its top-level rules. Comments are dropped, preludes
/// and blocks are trimmed. The last rule may omit its `;`, as in the text
/// given to `insertRule`.
pub fn split_rules(input: &str) -> Vec<RawRule> {
    let input = COMMENT_RE.replace_all(input, "");
    let escaped = escape_in_strings(&input);
    let char_pairs = HashMap::from([('{', '}')]);
    let with_escaped_blocks = escape_blocks(&escaped, &char_pairs, BLOCK_PLACEHOLDER);

    let mut blocks = with_escaped_blocks.blocks.into_iter();
    RULE_RE
        .captures_iter(&with_escaped_blocks.escaped_string)
        .filter_map(|caps| {
            let prelude = caps.get(1).map_or("", |m| m.as_str().trim());
            let has_block = caps.get(2).is_some_and(|m| m.as_str().starts_with('{'));
            // take the block even when the rule is dropped, to stay in step
            let block = has_block
                .then(|| unescape_in_strings(blocks.next().unwrap_or_default().trim()));
            (!prelude.is_empty()).then(|| RawRule {
                prelude: unescape_in_strings(prelude),
                block,
            })
        })
        .collect()
}

struct StringWithEscapedBlocks {
    escaped_string: String,
    blocks: Vec<String>,
}

/// Hide the characters that would end a prelude or a block while they are
/// inside a quoted string.
fn escape_in_strings(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut current_quote_char: Option<char> = None;
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        if ch == '\\' {
            result.push(ch);
            if let Some(escaped) = chars.next() {
                result.push(escaped);
            }
            continue;
        }

        match current_quote_char {
            Some(quote) if ch == quote => {
                current_quote_char = None;
                result.push(ch);
            }
            Some(_) => match ch {
                ';' => result.push_str(SEMI_IN_PLACEHOLDER),
                ',' => result.push_str(COMMA_IN_PLACEHOLDER),
                ':' => result.push_str(COLON_IN_PLACEHOLDER),
                '{' => result.push_str(LBRACE_IN_PLACEHOLDER),
                '}' => result.push_str(RBRACE_IN_PLACEHOLDER),
                _ => result.push(ch),
            },
            None => {
                if ch == '\'' || ch == '"' {
                    current_quote_char = Some(ch);
                }
                result.push(ch);
            }
        }
    }

    result
}

fn unescape_in_strings(input: &str) -> String {
    input
        .replace(COMMA_IN_PLACEHOLDER, ",")
        .replace(SEMI_IN_PLACEHOLDER, ";")
        .replace(COLON_IN_PLACEHOLDER, ":")
        .replace(LBRACE_IN_PLACEHOLDER, "{")
        .replace(RBRACE_IN_PLACEHOLDER, "}")
}

/// Replace the content of every top-level block with `placeholder`, keeping
/// the delimiters, and collect the contents in order.
fn escape_blocks(
    input: &str,
    char_pairs: &HashMap<char, char>,
    placeholder: &str,
) -> StringWithEscapedBlocks {
    let mut result = String::with_capacity(input.len());
    let mut blocks = Vec::new();
    let mut block = String::new();
    let mut depth = 0usize;
    let mut open_char = '\0';
    let mut close_char = '\0';
    let mut chars = input.chars();

    while let Some(ch) = chars.next() {
        let sink = if depth > 0 { &mut block } else { &mut result };
        if ch == '\\' {
            sink.push(ch);
            if let Some(escaped) = chars.next() {
                sink.push(escaped);
            }
            continue;
        }

        if depth > 0 {
            if ch == close_char {
                depth -= 1;
                if depth == 0 {
                    blocks.push(std::mem::take(&mut block));
                    result.push_str(placeholder);
                    result.push(ch);
                    continue;
                }
            } else if ch == open_char {
                depth += 1;
            }
            block.push(ch);
        } else {
            result.push(ch);
            if let Some(&close) = char_pairs.get(&ch) {
                open_char = ch;
                close_char = close;
                depth = 1;
            }
        }
    }

    if depth > 0 {
        blocks.push(block);
        result.push_str(placeholder);
    }

    StringWithEscapedBlocks {
        escaped_string: result,
        blocks,
    }
}

/// Serialize a style rule the way the object model reports its text.
pub fn style_rule_text(selector: &str, declarations: &str) -> String {
    if declarations.is_empty() {
        format!("{} {{}}", selector)
    } else {
        format!("{} {{ {} }}", selector, declarations)
    }
}
