//! Selector Rewrite Tests
//!
//! Scoping of selector lists with a `[scope-N]` prefix, including the
//! `:scope` anchor and lists that cannot be scoped.

use pretty_assertions::assert_eq;
use scoped_style::selector::{
    rewrite_selector, rewrite_selector_list, split_selector_list, try_rewrite_selector_list,
    MATCH_NOTHING,
};

#[test]
fn should_prefix_a_single_selector() {
    assert_eq!(rewrite_selector_list("h1", "[scope-1]"), "[scope-1] h1");
}

#[test]
fn should_prefix_every_selector_of_a_list() {
    assert_eq!(
        rewrite_selector_list("h1, h2", "[scope-2]"),
        "[scope-2] h1, [scope-2] h2"
    );
}

#[test]
fn should_replace_leading_anchors_and_prefix_the_rest() {
    assert_eq!(
        rewrite_selector_list(".foo, h1:scope, h2:scope:not(.bar)", "[scope-3]"),
        "[scope-3] .foo, h1[scope-3], h2[scope-3]:not(.bar)"
    );
}

#[test]
fn should_match_nothing_when_an_anchor_is_inside_a_function() {
    assert_eq!(
        rewrite_selector_list(".foo:-fn(h1:scope, h4, h3:scope):not([foo])", "[scope-4]"),
        MATCH_NOTHING
    );
    assert_eq!(rewrite_selector_list("h1, :is(:scope)", "[scope-4]"), ":not(*)");
    assert_eq!(rewrite_selector_list(":not(:is(:scope))", "[scope-4]"), ":not(*)");
}

#[test]
fn should_replace_adjacent_anchors_independently() {
    assert_eq!(
        rewrite_selector_list("h2:scope:scope", "[scope-6]"),
        "h2[scope-6][scope-6]"
    );
}

#[test]
fn should_give_one_prefixed_result_per_plain_selector() {
    let selectors = ["a", "b.c", "#d > e", "f ~ g + h", "[i='j']", "k:hover"];
    let scoped = rewrite_selector_list(&selectors.join(", "), "[p]");
    let parts: Vec<&str> = scoped.split(", ").collect();
    assert_eq!(parts.len(), selectors.len());
    for (part, selector) in parts.iter().zip(selectors) {
        assert_eq!(*part, format!("[p] {}", selector));
    }
}

#[test]
fn should_not_prefix_when_an_anchor_is_substituted() {
    assert_eq!(rewrite_selector_list(":scope", "[p]"), "[p]");
    assert_eq!(rewrite_selector_list(":scope > li", "[p]"), "[p] > li");
    assert_eq!(rewrite_selector_list("ul:scope li", "[p]"), "ul[p] li");
    assert_eq!(rewrite_selector_list("[a]:scope", ".p"), "[a].p");
}

#[test]
fn should_leave_anchors_after_a_combinator() {
    assert_eq!(rewrite_selector_list("div > :scope", "[p]"), "[p] div > :scope");
    assert_eq!(rewrite_selector_list("div :is(:scope)", "[p]"), "[p] div :is(:scope)");
}

#[test]
fn should_not_mistake_other_pseudo_classes_for_the_anchor() {
    assert_eq!(rewrite_selector_list("style:scoped", "[p]"), "[p] style:scoped");
    assert_eq!(rewrite_selector_list("a:scope_x", "[p]"), "[p] a:scope_x");
}

#[test]
fn should_ignore_anchors_inside_attribute_values() {
    assert_eq!(
        rewrite_selector_list(r#"a[title=":scope"]"#, "[p]"),
        r#"[p] a[title=":scope"]"#
    );
    assert_eq!(
        rewrite_selector_list(r#"a[title='(:scope,'], b"#, "[p]"),
        r#"[p] a[title='(:scope,'], [p] b"#
    );
}

#[test]
fn should_keep_escaped_quotes_inside_attribute_values() {
    assert_eq!(
        rewrite_selector_list(r#"a[title="x\"], y"], b"#, "[p]"),
        r#"[p] a[title="x\"], y"], [p] b"#
    );
    assert_eq!(
        rewrite_selector_list(r"div[data-text='\'']", "[p]"),
        r"[p] div[data-text='\'']"
    );
}

#[test]
fn should_not_split_on_escaped_commas() {
    assert_eq!(rewrite_selector_list(r".cla\,ss", "[p]"), r"[p] .cla\,ss");
    assert_eq!(rewrite_selector_list(r"#i\ d", "[p]"), r"[p] #i\ d");
    assert_eq!(rewrite_selector_list(r".x\:scope", "[p]"), r"[p] .x\:scope");
}

#[test]
fn should_not_split_inside_functions() {
    assert_eq!(
        rewrite_selector_list("a:is(b, c), d:not(e, f)", "[p]"),
        "[p] a:is(b, c), [p] d:not(e, f)"
    );
}

#[test]
fn should_normalize_whitespace_around_selectors() {
    assert_eq!(
        rewrite_selector_list("  h1  ,\n  h2:scope\t", "[p]"),
        "[p] h1, h2[p]"
    );
    assert_eq!(rewrite_selector_list("h1,,h2,", "[p]"), "[p] h1, [p] h2");
}

#[test]
fn should_keep_non_ascii_text() {
    assert_eq!(
        rewrite_selector_list(".ünïcode:scope, [title='日本']", "[p]"),
        ".ünïcode[p], [p] [title='日本']"
    );
}

#[test]
fn should_report_the_unsupported_selector() {
    let err = try_rewrite_selector_list("h1, p:has(:scope)", "[p]").unwrap_err();
    assert_eq!(err.selector, "p:has(:scope)");
    assert!(rewrite_selector("p:has(:scope)", "[p]").is_err());
    assert_eq!(rewrite_selector(" h1 ", "[p]").unwrap(), "[p] h1");
}

#[test]
fn should_split_top_level_commas_only() {
    assert_eq!(
        split_selector_list(r#"a, b[c=","], d(e, f), g\,h"#),
        vec!["a", r#"b[c=","]"#, "d(e, f)", r"g\,h"]
    );
}
