//! Host Boundary
//!
//! The live document and its CSS object model belong to the host. The core
//! only sees them through these traits, with small copyable handles standing
//! in for sheets, rules, nodes and in-flight fetches.

use std::fmt::Debug;
use std::hash::Hash;

use crate::error::Result;

/// Result of trying to read the rules of a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleAccess<R> {
    /// The rules, in index order.
    Rules(Vec<R>),
    /// The sheet came from another origin and its rules cannot be read.
    AccessDenied,
    /// The sheet exists but its content has not been parsed yet.
    NotYetParsed,
    /// Anything else. Never retried.
    Failed(String),
}

/// What the walker needs to know about a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleKind<S, R> {
    Style { selector: String },
    /// A conditional group such as `@media` or `@supports`.
    Group { rules: Vec<R> },
    /// An `@import`; `target` is `None` until the imported sheet has loaded.
    Import { target: Option<S> },
    Other { name: String },
}

/// The container a rule is indexed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleParent<S, R> {
    Sheet(S),
    Group(R),
}

/// Read and mutate a CSS object model.
pub trait StyleSheetHost {
    type Sheet: Copy + Eq + Hash + Debug;
    type Rule: Copy + Eq + Hash + Debug;

    fn read_rules(&self, sheet: Self::Sheet) -> RuleAccess<Self::Rule>;

    fn rule_kind(&self, rule: Self::Rule) -> RuleKind<Self::Sheet, Self::Rule>;

    /// Current selector text of a style rule.
    fn selector_text(&self, rule: Self::Rule) -> Option<String>;

    /// Declaration block of a style rule, without the braces.
    fn declarations(&self, rule: Self::Rule) -> String;

    /// Assign a style rule's selector in place. Hosts that do not support this
    /// may silently ignore it; the capability probe notices.
    fn set_selector_text(&mut self, rule: Self::Rule, selector: &str) -> Result<()>;

    fn delete_rule(&mut self, parent: RuleParent<Self::Sheet, Self::Rule>, index: usize)
        -> Result<()>;

    /// Parse `css_text` as a single rule and insert it at `index`.
    fn insert_rule(
        &mut self,
        parent: RuleParent<Self::Sheet, Self::Rule>,
        index: usize,
        css_text: &str,
    ) -> Result<Self::Rule>;

    /// Where a rule currently sits, if it is still in a sheet or group.
    fn rule_position(&self, rule: Self::Rule)
        -> Option<(RuleParent<Self::Sheet, Self::Rule>, usize)>;

    /// The `@import` rule that loaded `sheet`, if any.
    fn owner_rule(&self, sheet: Self::Sheet) -> Option<Self::Rule>;

    fn href(&self, sheet: Self::Sheet) -> Option<String>;

    /// Whether the rule still belongs to a sheet chain that is owned by a node.
    fn is_rule_attached(&self, rule: Self::Rule) -> bool;

    /// A detached sheet built from `css_text`, used to probe capabilities.
    fn scratch_sheet(&mut self, css_text: &str) -> Result<Self::Sheet>;

    fn discard_sheet(&mut self, sheet: Self::Sheet);
}

/// Progress of an out-of-band fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchState {
    Loading,
    Loaded(String),
}

/// Fetch raw text and bind it to a local, same-origin URL.
pub trait ResourceLoader {
    type Fetch: Copy + Eq + Hash + Debug;

    fn begin_fetch(&mut self, href: &str) -> Self::Fetch;

    fn poll_fetch(&mut self, fetch: Self::Fetch) -> FetchState;

    fn create_local_url(&mut self, text: String) -> String;

    fn revoke_local_url(&mut self, url: &str);
}

/// How the active scope is marked on its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MarkerMode {
    #[default]
    Attribute,
    Class,
}

impl MarkerMode {
    /// The selector condition that matches an element carrying `marker`.
    pub fn prefix(self, marker: &str) -> String {
        match self {
            MarkerMode::Attribute => format!("[{}]", marker),
            MarkerMode::Class => format!(".{}", marker),
        }
    }
}

/// A document whose style elements may be scoped.
pub trait DocumentHost: StyleSheetHost + ResourceLoader {
    type Node: Copy + Eq + Hash + Debug;

    fn is_style(&self, node: Self::Node) -> bool;

    /// Reflects the `scoped` attribute.
    fn is_scoped(&self, node: Self::Node) -> bool;

    /// Setting `true` keeps an existing attribute value; `false` removes it.
    fn set_scoped(&mut self, node: Self::Node, scoped: bool);

    /// Whether the node is inside the document body.
    fn is_connected(&self, node: Self::Node) -> bool;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// The sheet backing a style element, `None` while it has none.
    fn sheet(&self, node: Self::Node) -> Option<Self::Sheet>;

    fn text_content(&self, node: Self::Node) -> String;

    fn set_text_content(&mut self, node: Self::Node, text: &str);

    fn set_marker(&mut self, node: Self::Node, marker: &str, mode: MarkerMode, on: bool);

    /// Style elements below `node`, in document order.
    fn style_descendants(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Every style element in the document body, in document order.
    fn body_styles(&self) -> Vec<Self::Node>;
}
