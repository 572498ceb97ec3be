//! Condition Rewrite Tests
//!
//! Suffix-style scoping: every selector matches both inside the condition and
//! on the element matching it.

use pretty_assertions::assert_eq;
use scoped_style::condition::scope_to_condition;

#[test]
fn should_scope_simple_selectors() {
    assert_eq!(scope_to_condition("div", ":PRE"), ":PRE div, div:PRE");
}

#[test]
fn should_scope_complex_selectors() {
    assert_eq!(scope_to_condition("div + p", ":PRE"), ":PRE div + p, div + p:PRE");
}

#[test]
fn should_scope_compound_selectors() {
    assert_eq!(
        scope_to_condition("div.class#id", ":PRE"),
        ":PRE div.class#id, div.class#id:PRE"
    );
}

#[test]
fn should_keep_functional_pseudo_classes_whole() {
    assert_eq!(
        scope_to_condition("div:not([data-json])", ":PRE"),
        ":PRE div:not([data-json]), div:not([data-json]):PRE"
    );
    assert_eq!(
        scope_to_condition("a:is(b, c:not(d, e))", ":PRE"),
        ":PRE a:is(b, c:not(d, e)), a:is(b, c:not(d, e)):PRE"
    );
}

#[test]
fn should_keep_quotes() {
    assert_eq!(
        scope_to_condition("div[data-text='']", ":PRE"),
        ":PRE div[data-text=''], div[data-text='']:PRE"
    );
    assert_eq!(
        scope_to_condition(r#"a[title="x, y"]"#, ":PRE"),
        r#":PRE a[title="x, y"], a[title="x, y"]:PRE"#
    );
}

#[test]
fn should_keep_escaped_quotes() {
    assert_eq!(
        scope_to_condition(r"div[data-text='\'']", ":PRE"),
        r":PRE div[data-text='\''], div[data-text='\'']:PRE"
    );
}

#[test]
fn should_not_split_on_escaped_commas() {
    assert_eq!(
        scope_to_condition(r".cla\,ss", ":PRE"),
        r":PRE .cla\,ss, .cla\,ss:PRE"
    );
}

#[test]
fn should_keep_escaped_spaces() {
    assert_eq!(scope_to_condition(r"#i\ d", ":PRE"), r":PRE #i\ d, #i\ d:PRE");
}

#[test]
fn should_scope_every_selector_of_a_list() {
    assert_eq!(
        scope_to_condition("h1, h2", "[s]"),
        "[s] h1, h1[s], [s] h2, h2[s]"
    );
}

#[test]
fn should_substitute_the_anchor() {
    assert_eq!(scope_to_condition(":scope > p", "[s]"), "[s] [s] > p, [s] > p[s]");
    assert_eq!(
        scope_to_condition(r#"a[title=":scope"]"#, "[s]"),
        r#"[s] a[title=":scope"], a[title=":scope"][s]"#
    );
}
