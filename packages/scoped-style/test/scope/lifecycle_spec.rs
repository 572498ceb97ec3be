//! Scope Lifecycle Tests
//!
//! Activation, marker placement, moves and detaching of scoped style
//! elements in the in-memory document.

#[path = "../utils.rs"]
mod utils;

use pretty_assertions::assert_eq;
use scoped_style::memory::MemoryDocument;
use scoped_style::{DocumentHost, MarkerMode, MutationStrategy, ScopeOptions, ScopedStyles, Transition};
use utils::{scoped_style_element, strings, Page};

#[test]
fn should_scope_a_new_style_element() {
    let mut page = Page::new();
    let (container, style) = page.add_scoped("h1 { color: red; }\n.a:scope > p {}");

    assert_eq!(page.token(style), "__scoped_1");
    assert_eq!(page.scoped.prefix(style), Some("[__scoped_1]"));
    assert_eq!(page.scoped.marked_parent(style), Some(container));
    assert!(page.doc.has_attribute(container, "__scoped_1"));
    assert_eq!(
        page.selectors(style),
        strings(&["[__scoped_1] h1", ".a[__scoped_1] > p"])
    );
    assert_eq!(page.scoped.active_count(), 1);
}

#[test]
fn should_number_scopes_with_the_naming_prefix() {
    let mut page = Page::with_options(ScopeOptions {
        prefix: "scope-".to_string(),
        ..ScopeOptions::default()
    });
    let (_, first) = page.add_scoped("h1 {}");
    let (_, second) = page.add_scoped("h1, h2 {}");

    assert_eq!(page.selectors(first), strings(&["[scope-1] h1"]));
    assert_eq!(page.selectors(second), strings(&["[scope-2] h1, [scope-2] h2"]));
}

#[test]
fn should_sweep_existing_style_elements_on_setup() {
    let mut doc = MemoryDocument::new();
    let body = doc.body();
    let container = doc.create_element("section");
    let style = scoped_style_element(&mut doc, "p {}");
    let plain = doc.create_style("p {}");
    doc.append_child(container, style).unwrap();
    doc.append_child(container, plain).unwrap();
    doc.append_child(body, container).unwrap();
    doc.take_records();

    let mut scoped = ScopedStyles::new(&mut doc, ScopeOptions::default()).unwrap();
    scoped.setup(&mut doc).unwrap();

    assert_eq!(scoped.token(style), Some("__scoped_1"));
    assert_eq!(scoped.token(plain), None);
    assert_eq!(doc.selectors(style), strings(&["[__scoped_1] p"]));
    assert_eq!(doc.selectors(plain), strings(&["p"]));
}

#[test]
fn should_ignore_style_elements_that_are_not_scoped() {
    let mut page = Page::new();
    let style = page.doc.create_style("h1 {}");
    let body = page.doc.body();
    page.doc.append_child(body, style).unwrap();
    page.settle();

    assert_eq!(page.scoped.upgrade(&mut page.doc, style).unwrap(), Transition::Ignored);
    assert_eq!(page.scoped.token(style), None);
    assert_eq!(page.selectors(style), strings(&["h1"]));
}

#[test]
fn should_ignore_scoped_elements_outside_the_body() {
    let mut page = Page::new();
    let container = page.doc.create_element("div");
    let style = scoped_style_element(&mut page.doc, "h1 {}");
    page.doc.append_child(container, style).unwrap();

    assert_eq!(page.scoped.upgrade(&mut page.doc, style).unwrap(), Transition::Ignored);
    assert_eq!(page.scoped.active_count(), 0);
}

#[test]
fn should_be_idempotent_for_active_elements() {
    let mut page = Page::new();
    let (_, style) = page.add_scoped("h1 {}");

    assert_eq!(page.scoped.upgrade(&mut page.doc, style).unwrap(), Transition::Updated);
    assert_eq!(page.scoped.upgrade(&mut page.doc, style).unwrap(), Transition::Updated);
    assert_eq!(page.selectors(style), strings(&["[__scoped_1] h1"]));
}

#[test]
fn should_move_the_marker_with_the_element() {
    let mut page = Page::new();
    let body = page.doc.body();
    let (first, style) = page.add_scoped("h1 {}");
    let second = page.doc.create_element("div");
    page.doc.append_child(body, second).unwrap();
    page.settle();

    page.doc.append_child(second, style).unwrap();
    page.settle();

    let token = page.token(style);
    assert!(!page.doc.has_attribute(first, &token));
    assert!(page.doc.has_attribute(second, &token));
    assert_eq!(
        page.doc.marked_elements(&token, MarkerMode::Attribute),
        vec![second]
    );
    assert_eq!(page.scoped.marked_parent(style), Some(second));
    assert_eq!(page.selectors(style), strings(&["[__scoped_1] h1"]));
}

#[test]
fn should_keep_one_marked_element_per_scope() {
    let mut page = Page::new();
    let (outer, outer_style) = page.add_scoped("p {}");
    let (inner, inner_style) = page.add_scoped_in(outer, "p {}");

    let outer_token = page.token(outer_style);
    let inner_token = page.token(inner_style);
    assert_ne!(outer_token, inner_token);
    assert_eq!(
        page.doc.marked_elements(&outer_token, MarkerMode::Attribute),
        vec![outer]
    );
    assert_eq!(
        page.doc.marked_elements(&inner_token, MarkerMode::Attribute),
        vec![inner]
    );
}

#[test]
fn should_restore_the_original_css_when_unscoped() {
    let css = "h1 { color: red; }\n.a:scope > p {}";
    let mut page = Page::new();
    let (container, style) = page.add_scoped(css);
    let token = page.token(style);

    page.doc.set_scoped(style, false);
    page.settle();

    assert_eq!(page.scoped.token(style), None);
    assert_eq!(page.scoped.active_count(), 0);
    assert!(!page.doc.has_attribute(container, &token));
    assert_eq!(page.doc.text_content(style), css);
    assert_eq!(page.selectors(style), strings(&["h1", ".a:scope > p"]));
}

#[test]
fn should_detach_when_removed_from_the_document() {
    let css = "h1 {}";
    let mut page = Page::new();
    let (container, style) = page.add_scoped(css);
    let token = page.token(style);

    page.doc.remove(container);
    page.settle();

    assert_eq!(page.scoped.token(style), None);
    assert!(!page.doc.has_attribute(container, &token));
    assert_eq!(page.doc.text_content(style), css);
    assert_eq!(page.doc.sheet(style), None);
}

#[test]
fn should_never_reuse_a_token() {
    let mut page = Page::new();
    let (_, style) = page.add_scoped("h1 {}");
    assert_eq!(page.token(style), "__scoped_1");

    page.doc.set_scoped(style, false);
    page.settle();
    page.doc.set_scoped(style, true);
    page.settle();

    assert_eq!(page.token(style), "__scoped_2");
    assert_eq!(page.selectors(style), strings(&["[__scoped_2] h1"]));
}

#[test]
fn should_rescope_replaced_content() {
    let mut page = Page::new();
    let (_, style) = page.add_scoped("h1 {}");

    page.doc.set_text_content(style, "p, li {}");
    page.settle();

    assert_eq!(page.token(style), "__scoped_1");
    assert_eq!(
        page.selectors(style),
        strings(&["[__scoped_1] p, [__scoped_1] li"])
    );
}

#[test]
fn should_mark_with_a_class_in_class_mode() {
    let mut page = Page::with_options(ScopeOptions {
        apply_to_class: true,
        ..ScopeOptions::default()
    });
    let (container, style) = page.add_scoped("h1 {}");
    page.doc.set_attribute(container, "class", "card");

    page.doc.set_scoped(style, false);
    page.settle();
    page.doc.set_scoped(style, true);
    page.settle();

    assert_eq!(page.scoped.prefix(style), Some(".__scoped_2"));
    assert_eq!(page.doc.attribute(container, "class"), Some("card __scoped_2"));
    assert!(!page.doc.has_attribute(container, "__scoped_2"));
    assert_eq!(page.selectors(style), strings(&[".__scoped_2 h1"]));
}

#[test]
fn should_give_the_same_selectors_on_read_only_hosts() {
    let mut page = Page::read_only();
    let (_, style) = page.add_scoped("h1 { color: red; }\n@media print { :scope p {} }");

    assert_eq!(
        page.scoped.scheduler().walker().strategy(),
        MutationStrategy::DeleteReinsert
    );
    assert_eq!(
        page.selectors(style),
        strings(&["[__scoped_1] h1", "[__scoped_1] p"])
    );
}

#[test]
fn should_scope_imports_that_load_later() {
    let mut page = Page::new();
    let (_, style) = page.add_scoped("@import 'late.css';\nh1 {}");
    assert!(page.scoped.needs_tick());
    assert_eq!(page.selectors(style), strings(&["[__scoped_1] h1"]));

    page.doc.serve("late.css", "p {}");
    page.settle();

    assert!(!page.scoped.needs_tick());
    assert_eq!(
        page.selectors(style),
        strings(&["[__scoped_1] p", "[__scoped_1] h1"])
    );
}

#[test]
fn should_scope_cross_origin_imports() {
    let mut page = Page::new();
    page.doc
        .serve_cross_origin("https://cdn.test/theme.css", ".btn:scope {}");
    let (_, style) = page.add_scoped("@import url('https://cdn.test/theme.css');\nh1 {}");

    assert!(!page.scoped.needs_tick());
    assert_eq!(
        page.selectors(style),
        strings(&[".btn[__scoped_1]", "[__scoped_1] h1"])
    );
    assert_eq!(page.doc.local_url_count(), 0);
}

#[test]
fn should_keep_the_marker_when_the_first_walk_fails() {
    let mut page = Page::new();
    let container = page.doc.create_element("div");
    let style = scoped_style_element(&mut page.doc, "h1 {}");
    page.doc.append_child(container, style).unwrap();
    let body = page.doc.body();
    page.doc.append_child(body, container).unwrap();
    page.doc.take_records();

    page.doc.break_sheet(style, "corrupt");
    assert!(page.scoped.upgrade(&mut page.doc, style).is_err());
    assert_eq!(page.scoped.marked_parent(style), Some(container));
    assert_eq!(
        page.doc.marked_elements("__scoped_1", MarkerMode::Attribute),
        vec![container]
    );

    page.doc.set_text_content(style, "h1 {}");
    page.doc.take_records();
    assert_eq!(
        page.scoped.upgrade(&mut page.doc, style).unwrap(),
        Transition::Updated
    );
    assert_eq!(page.selectors(style), strings(&["[__scoped_1] h1"]));
    assert!(page.doc.has_attribute(container, "__scoped_1"));
}

#[test]
fn should_forget_late_imports_when_unscoped() {
    let mut page = Page::new();
    let (_, style) = page.add_scoped("@import 'late.css';\nh1 {}");
    page.doc.serve("late.css", "p {}");
    page.settle();
    assert_eq!(page.scoped.scheduler().walker().processed_len(), 2);

    page.doc.set_scoped(style, false);
    page.settle();
    assert_eq!(page.scoped.scheduler().walker().processed_len(), 0);
}
