//! Mutation Observation Tests
//!
//! Which style elements a batch of mutation records brings up for upgrade,
//! and the `scoped` flag as seen through the document host.

#[path = "../utils.rs"]
mod utils;

use pretty_assertions::assert_eq;
use scoped_style::memory::MemoryDocument;
use scoped_style::scope::candidates;
use scoped_style::{DocumentHost, MutationRecord};
use utils::{scoped_style_element, strings, Page};

#[test]
fn should_take_a_style_target_as_is() {
    let mut doc = MemoryDocument::new();
    let style = doc.create_style("");
    let records = vec![MutationRecord::on(style), MutationRecord::on(style)];

    let changes: Vec<_> = candidates(&doc, &records).into_iter().collect();
    assert_eq!(changes, vec![style]);
}

#[test]
fn should_collect_added_and_removed_styles_once() {
    let mut doc = MemoryDocument::new();
    let body = doc.body();
    let wrapper = doc.create_element("div");
    let nested = doc.create_element("article");
    let first = doc.create_style("");
    let second = doc.create_style("");
    let loose = doc.create_style("");
    let text = doc.create_element("p");
    doc.append_child(wrapper, first).unwrap();
    doc.append_child(wrapper, nested).unwrap();
    doc.append_child(nested, second).unwrap();

    let records = vec![
        MutationRecord {
            target: body,
            added: vec![wrapper, text],
            removed: vec![loose],
        },
        MutationRecord {
            target: body,
            added: vec![first],
            removed: vec![wrapper],
        },
    ];

    let changes: Vec<_> = candidates(&doc, &records).into_iter().collect();
    assert_eq!(changes, vec![first, second, loose]);
}

#[test]
fn should_record_only_mutations_inside_the_body() {
    let mut doc = MemoryDocument::new();
    let detached = doc.create_element("div");
    let style = doc.create_style("h1 {}");
    doc.append_child(detached, style).unwrap();
    doc.set_attribute(style, "scoped", "");
    assert!(doc.take_records().is_empty());

    let body = doc.body();
    doc.append_child(body, detached).unwrap();
    doc.set_attribute(detached, "title", "ignored");
    doc.remove_attribute(style, "scoped");
    assert_eq!(
        doc.take_records(),
        vec![
            MutationRecord {
                target: body,
                added: vec![detached],
                removed: Vec::new(),
            },
            MutationRecord::on(style),
        ]
    );
}

#[test]
fn should_keep_an_existing_scoped_value() {
    let mut doc = MemoryDocument::new();
    let style = doc.create_style("");
    doc.set_attribute(style, "scoped", "yes");

    doc.set_scoped(style, true);
    assert_eq!(doc.attribute(style, "scoped"), Some("yes"));
    assert!(doc.is_scoped(style));

    doc.set_scoped(style, false);
    assert!(!doc.is_scoped(style));
    assert_eq!(doc.attribute(style, "scoped"), None);
}

#[test]
fn should_activate_when_the_flag_is_set_later() {
    let mut page = Page::new();
    let body = page.doc.body();
    let style = page.doc.create_style("h1 {}");
    page.doc.append_child(body, style).unwrap();
    page.settle();
    assert_eq!(page.scoped.token(style), None);

    page.doc.set_scoped(style, true);
    page.settle();

    assert_eq!(page.token(style), "__scoped_1");
    assert!(page.doc.has_attribute(body, "__scoped_1"));
    assert_eq!(page.selectors(style), strings(&["[__scoped_1] h1"]));
}

#[test]
fn should_resolve_a_batch_of_new_elements() {
    let mut page = Page::new();
    let body = page.doc.body();
    let wrapper = page.doc.create_element("div");
    let left = page.doc.create_element("div");
    let right = page.doc.create_element("div");
    let left_style = scoped_style_element(&mut page.doc, "a {}");
    let right_style = scoped_style_element(&mut page.doc, "b {}");
    page.doc.append_child(left, left_style).unwrap();
    page.doc.append_child(right, right_style).unwrap();
    page.doc.append_child(wrapper, left).unwrap();
    page.doc.append_child(wrapper, right).unwrap();
    page.doc.append_child(body, wrapper).unwrap();

    let records = page.doc.take_records();
    page.scoped.observe(&mut page.doc, &records).unwrap();

    assert_eq!(page.selectors(left_style), strings(&["[__scoped_1] a"]));
    assert_eq!(page.selectors(right_style), strings(&["[__scoped_2] b"]));
    assert_eq!(page.scoped.marked_parent(left_style), Some(left));
    assert_eq!(page.scoped.marked_parent(right_style), Some(right));
}
