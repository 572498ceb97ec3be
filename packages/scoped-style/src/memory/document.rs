//! In-memory document and CSS object model.
//!
//! Two `indextree` arenas: one for elements, one for sheets and rules. Nodes
//! are only ever detached, never removed, so every handed-out id stays valid.
//! Loading is asynchronous in the browser sense: parsing deferred sheets,
//! completing fetches and loading imports all happen in [`MemoryDocument::advance`].

use indexmap::IndexMap;
use indextree::{Arena, NodeId};

use super::css::{at_keyword, parse_stylesheet, style_rule_text, ParsedRule};
use crate::error::{Result, ScopeError};
use crate::host::{
    DocumentHost, FetchState, MarkerMode, ResourceLoader, RuleAccess, RuleKind, RuleParent,
    StyleSheetHost,
};
use crate::scope::MutationRecord;

const LOCAL_URL_SCHEME: &str = "blob:local/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SheetId(NodeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(NodeId);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FetchId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
enum SheetState {
    Parsed,
    Unparsed,
    CrossOrigin,
    Broken(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SheetOwner {
    Element(NodeId),
    Import(RuleId),
}

#[derive(Debug)]
struct SheetData {
    owner: Option<SheetOwner>,
    href: Option<String>,
    state: SheetState,
    source: String,
}

#[derive(Debug)]
enum RuleData {
    Style {
        selector: String,
        declarations: String,
    },
    Group {
        prelude: String,
    },
    Import {
        prelude: String,
        href: String,
        target: Option<SheetId>,
        /// Text of a local URL, read when the rule was created.
        snapshot: Option<String>,
    },
    Other {
        prelude: String,
        block: Option<String>,
    },
}

#[derive(Debug)]
enum CssNode {
    Sheet(SheetData),
    Rule(RuleData),
}

#[derive(Debug, Default)]
pub struct Element {
    pub tag: String,
    attributes: IndexMap<String, String>,
    text: String,
    sheet: Option<SheetId>,
}

#[derive(Debug)]
struct Resource {
    text: String,
    cross_origin: bool,
}

#[derive(Debug)]
struct FetchEntry {
    href: String,
    loaded: Option<String>,
}

#[derive(Debug)]
pub struct MemoryDocument {
    dom: Arena<Element>,
    root: NodeId,
    body: NodeId,
    cssom: Arena<CssNode>,
    sheets: Vec<SheetId>,
    resources: IndexMap<String, Resource>,
    fetches: Vec<FetchEntry>,
    local_urls: IndexMap<String, String>,
    last_url: u64,
    records: Vec<MutationRecord<NodeId>>,
    selector_writable: bool,
    defer_parsing: bool,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// An empty `<html><body></body></html>`.
    pub fn new() -> Self {
        let mut dom = Arena::new();
        let root = dom.new_node(Element {
            tag: "html".to_string(),
            ..Element::default()
        });
        let body = dom.new_node(Element {
            tag: "body".to_string(),
            ..Element::default()
        });
        root.append(body, &mut dom);

        MemoryDocument {
            dom,
            root,
            body,
            cssom: Arena::new(),
            sheets: Vec::new(),
            resources: IndexMap::new(),
            fetches: Vec::new(),
            local_urls: IndexMap::new(),
            last_url: 0,
            records: Vec::new(),
            selector_writable: true,
            defer_parsing: false,
        }
    }

    pub fn body(&self) -> NodeId {
        self.body
    }

    // ----- host behaviour switches -----

    /// Whether assigning a selector takes effect. When `false` the write is
    /// silently ignored, as in hosts with read-only selector text.
    pub fn set_selector_writable(&mut self, writable: bool) {
        self.selector_writable = writable;
    }

    /// When set, new element sheets stay unparsed until the next
    /// [`advance`](Self::advance).
    pub fn set_defer_parsing(&mut self, defer: bool) {
        self.defer_parsing = defer;
    }

    /// Make `href` loadable, both by imports and by fetches.
    pub fn serve(&mut self, href: &str, text: &str) {
        self.resources.insert(
            href.to_string(),
            Resource {
                text: text.to_string(),
                cross_origin: false,
            },
        );
    }

    /// Like [`serve`](Self::serve), but an import of it gets a sheet whose
    /// rules cannot be read.
    pub fn serve_cross_origin(&mut self, href: &str, text: &str) {
        self.resources.insert(
            href.to_string(),
            Resource {
                text: text.to_string(),
                cross_origin: true,
            },
        );
    }

    /// Make reading the rules of `node`'s current sheet fail.
    pub fn break_sheet(&mut self, node: NodeId, reason: &str) {
        if let Some(sheet) = self.element(node).sheet {
            self.break_stylesheet(sheet, reason);
        }
    }

    /// Make reading the rules of `sheet` fail, imported sheets included.
    pub fn break_stylesheet(&mut self, sheet: SheetId, reason: &str) {
        if let Some(data) = self.sheet_data_mut(sheet) {
            data.state = SheetState::Broken(reason.to_string());
        }
    }

    /// Undo [`break_stylesheet`](Self::break_stylesheet); the sheet keeps
    /// the rules it had.
    pub fn repair_stylesheet(&mut self, sheet: SheetId) {
        if let Some(data) = self.sheet_data_mut(sheet) {
            if matches!(data.state, SheetState::Broken(_)) {
                data.state = SheetState::Parsed;
            }
        }
    }

    // ----- elements -----

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.dom.new_node(Element {
            tag: tag.to_ascii_lowercase(),
            ..Element::default()
        })
    }

    pub fn create_style(&mut self, css_text: &str) -> NodeId {
        let node = self.create_element("style");
        self.dom[node].get_mut().text = css_text.to_string();
        node
    }

    pub fn element(&self, node: NodeId) -> &Element {
        self.dom[node].get()
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.dom[child].parent().is_some() {
            self.remove(child);
        }
        parent
            .checked_append(child, &mut self.dom)
            .map_err(|err| ScopeError::host("append child", err.to_string()))?;

        if self.in_document(child) {
            for style in self.styles_in(child) {
                self.attach_sheet(style);
            }
        }
        if self.is_connected(child) {
            self.records.push(MutationRecord {
                target: parent,
                added: vec![child],
                removed: Vec::new(),
            });
        }
        Ok(())
    }

    /// Detach `node` and its subtree from its parent.
    pub fn remove(&mut self, node: NodeId) {
        let Some(parent) = self.dom[node].parent() else {
            return;
        };
        let was_connected = self.is_connected(node);
        let was_in_document = self.in_document(node);
        node.detach(&mut self.dom);

        if was_in_document {
            for style in self.styles_in(node) {
                self.drop_sheet(style);
            }
        }
        if was_connected {
            self.records.push(MutationRecord {
                target: parent,
                added: Vec::new(),
                removed: vec![node],
            });
        }
    }

    pub fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node).attributes.get(name).map(String::as_str)
    }

    pub fn has_attribute(&self, node: NodeId, name: &str) -> bool {
        self.element(node).attributes.contains_key(name)
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    pub fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        self.dom[node]
            .get_mut()
            .attributes
            .insert(name.to_string(), value.to_string());
        self.attribute_changed(node, name);
    }

    pub fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if self.dom[node].get_mut().attributes.shift_remove(name).is_some() {
            self.attribute_changed(node, name);
        }
    }

    fn attribute_changed(&mut self, node: NodeId, name: &str) {
        // the observer only watches `scoped`
        if name == "scoped" && self.is_connected(node) {
            self.records.push(MutationRecord::on(node));
        }
    }

    fn toggle_class(&mut self, node: NodeId, class: &str, on: bool) {
        let mut classes: Vec<String> = self
            .attribute(node, "class")
            .map(|value| value.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default();
        let present = classes.iter().any(|c| c == class);
        if on && !present {
            classes.push(class.to_string());
        } else if !on && present {
            classes.retain(|c| c != class);
        } else {
            return;
        }

        let attributes = &mut self.dom[node].get_mut().attributes;
        if classes.is_empty() {
            attributes.shift_remove("class");
        } else {
            attributes.insert("class".to_string(), classes.join(" "));
        }
    }

    /// Elements in the body carrying `marker`.
    pub fn marked_elements(&self, marker: &str, mode: MarkerMode) -> Vec<NodeId> {
        self.body
            .descendants(&self.dom)
            .filter(|&node| match mode {
                MarkerMode::Attribute => self.has_attribute(node, marker),
                MarkerMode::Class => self.has_class(node, marker),
            })
            .collect()
    }

    /// Mutations seen in the body since the last call.
    pub fn take_records(&mut self) -> Vec<MutationRecord<NodeId>> {
        std::mem::take(&mut self.records)
    }

    fn in_document(&self, node: NodeId) -> bool {
        node.ancestors(&self.dom).any(|ancestor| ancestor == self.root)
    }

    fn styles_in(&self, node: NodeId) -> Vec<NodeId> {
        node.descendants(&self.dom)
            .filter(|&n| self.is_style(n))
            .collect()
    }

    // ----- sheets -----

    fn attach_sheet(&mut self, node: NodeId) {
        let source = self.element(node).text.clone();
        let state = if self.defer_parsing {
            SheetState::Unparsed
        } else {
            SheetState::Parsed
        };
        let sheet = self.new_sheet(Some(SheetOwner::Element(node)), None, state, source);
        self.dom[node].get_mut().sheet = Some(sheet);
    }

    fn drop_sheet(&mut self, node: NodeId) {
        if let Some(sheet) = self.dom[node].get_mut().sheet.take() {
            if let Some(data) = self.sheet_data_mut(sheet) {
                data.owner = None;
            }
        }
    }

    fn new_sheet(
        &mut self,
        owner: Option<SheetOwner>,
        href: Option<String>,
        state: SheetState,
        source: String,
    ) -> SheetId {
        let parsed = state == SheetState::Parsed;
        let rules = if parsed {
            parse_stylesheet(&source)
        } else {
            Vec::new()
        };
        let id = self.cssom.new_node(CssNode::Sheet(SheetData {
            owner,
            href,
            state,
            source,
        }));
        for rule in rules {
            let child = self.create_rule(rule);
            id.append(child, &mut self.cssom);
        }
        let sheet = SheetId(id);
        self.sheets.push(sheet);
        sheet
    }

    fn create_rule(&mut self, rule: ParsedRule) -> NodeId {
        match rule {
            ParsedRule::Style {
                selector,
                declarations,
            } => self.cssom.new_node(CssNode::Rule(RuleData::Style {
                selector,
                declarations,
            })),
            ParsedRule::Group { prelude, rules } => {
                let id = self
                    .cssom
                    .new_node(CssNode::Rule(RuleData::Group { prelude }));
                for child in rules {
                    let child = self.create_rule(child);
                    id.append(child, &mut self.cssom);
                }
                id
            }
            ParsedRule::Import { prelude, href } => {
                let snapshot = self.local_urls.get(&href).cloned();
                self.cssom.new_node(CssNode::Rule(RuleData::Import {
                    prelude,
                    href,
                    target: None,
                    snapshot,
                }))
            }
            ParsedRule::Other { prelude, block } => self
                .cssom
                .new_node(CssNode::Rule(RuleData::Other { prelude, block })),
        }
    }

    fn css_node(&self, id: NodeId) -> Option<&CssNode> {
        self.cssom.get(id).map(|node| node.get())
    }

    fn sheet_data(&self, sheet: SheetId) -> Option<&SheetData> {
        match self.css_node(sheet.0) {
            Some(CssNode::Sheet(data)) => Some(data),
            _ => None,
        }
    }

    fn sheet_data_mut(&mut self, sheet: SheetId) -> Option<&mut SheetData> {
        match self.cssom.get_mut(sheet.0).map(|node| node.get_mut()) {
            Some(CssNode::Sheet(data)) => Some(data),
            _ => None,
        }
    }

    fn rule_data(&self, rule: RuleId) -> Option<&RuleData> {
        match self.css_node(rule.0) {
            Some(CssNode::Rule(data)) => Some(data),
            _ => None,
        }
    }

    fn container(parent: RuleParent<SheetId, RuleId>) -> NodeId {
        match parent {
            RuleParent::Sheet(sheet) => sheet.0,
            RuleParent::Group(rule) => rule.0,
        }
    }

    /// The sheet a rule currently belongs to, through any groups.
    fn sheet_of(&self, rule: RuleId) -> Option<SheetId> {
        let top = rule.0.ancestors(&self.cssom).last()?;
        match self.css_node(top) {
            Some(CssNode::Sheet(_)) => Some(SheetId(top)),
            _ => None,
        }
    }

    fn is_sheet_owned(&self, sheet: SheetId) -> bool {
        match self.sheet_data(sheet).and_then(|data| data.owner) {
            Some(SheetOwner::Element(node)) => self.element(node).sheet == Some(sheet),
            Some(SheetOwner::Import(rule)) => {
                matches!(
                    self.rule_data(rule),
                    Some(RuleData::Import { target: Some(target), .. }) if *target == sheet
                ) && self.is_rule_attached(rule)
            }
            None => false,
        }
    }

    /// Let the host catch up: parse deferred sheets, complete fetches of
    /// served resources and load imports that can be loaded.
    pub fn advance(&mut self) {
        for sheet in self.sheets.clone() {
            let Some(data) = self.sheet_data_mut(sheet) else {
                continue;
            };
            if data.state != SheetState::Unparsed {
                continue;
            }
            data.state = SheetState::Parsed;
            let rules = parse_stylesheet(&data.source);
            for rule in rules {
                let child = self.create_rule(rule);
                sheet.0.append(child, &mut self.cssom);
            }
        }

        for fetch in &mut self.fetches {
            if fetch.loaded.is_none() {
                if let Some(resource) = self.resources.get(&fetch.href) {
                    fetch.loaded = Some(resource.text.clone());
                }
            }
        }

        for rule in self.unloaded_imports() {
            self.load_import(rule);
        }
    }

    fn unloaded_imports(&self) -> Vec<RuleId> {
        self.sheets
            .iter()
            .filter(|&&sheet| self.is_sheet_owned(sheet))
            .flat_map(|sheet| sheet.0.descendants(&self.cssom))
            .filter(|&id| {
                matches!(
                    self.css_node(id),
                    Some(CssNode::Rule(RuleData::Import { target: None, .. }))
                )
            })
            .map(RuleId)
            .collect()
    }

    fn load_import(&mut self, rule: RuleId) {
        let Some(RuleData::Import { href, snapshot, .. }) = self.rule_data(rule) else {
            return;
        };
        let href = href.clone();
        let (text, state) = if let Some(text) = snapshot {
            (text.clone(), SheetState::Parsed)
        } else if href.starts_with("data:") {
            (String::new(), SheetState::Parsed)
        } else if let Some(resource) = self.resources.get(&href) {
            let state = if resource.cross_origin {
                SheetState::CrossOrigin
            } else {
                SheetState::Parsed
            };
            (resource.text.clone(), state)
        } else {
            return; // never loads
        };

        let sheet = self.new_sheet(Some(SheetOwner::Import(rule)), Some(href), state, text);
        if let Some(CssNode::Rule(RuleData::Import { target, .. })) =
            self.cssom.get_mut(rule.0).map(|node| node.get_mut())
        {
            *target = Some(sheet);
        }
    }

    /// CSS text of a sheet's own rules, one rule per line.
    pub fn sheet_css(&self, sheet: SheetId) -> String {
        sheet
            .0
            .children(&self.cssom)
            .map(|rule| self.rule_css(RuleId(rule)))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn rule_css(&self, rule: RuleId) -> String {
        match self.rule_data(rule) {
            Some(RuleData::Style {
                selector,
                declarations,
            }) => style_rule_text(selector, declarations),
            Some(RuleData::Group { prelude }) => {
                let body = rule
                    .0
                    .children(&self.cssom)
                    .map(|child| format!("  {}", self.rule_css(RuleId(child))))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("{} {{\n{}\n}}", prelude, body)
            }
            Some(RuleData::Import { prelude, .. }) => format!("{};", prelude),
            Some(RuleData::Other {
                prelude,
                block: Some(block),
            }) => format!("{} {{ {} }}", prelude, block),
            Some(RuleData::Other {
                prelude,
                block: None,
            }) => format!("{};", prelude),
            None => String::new(),
        }
    }

    /// `sheet` followed by every loaded imported sheet, depth first.
    pub fn sheet_chain(&self, sheet: SheetId) -> Vec<SheetId> {
        let mut chain = vec![sheet];
        for id in sheet.0.descendants(&self.cssom) {
            if let Some(CssNode::Rule(RuleData::Import {
                target: Some(target),
                ..
            })) = self.css_node(id)
            {
                chain.extend(self.sheet_chain(*target));
            }
        }
        chain
    }

    /// Every style rule selector reachable from `node`'s sheet, imports
    /// included, in walk order.
    pub fn selectors(&self, node: NodeId) -> Vec<String> {
        let Some(sheet) = self.element(node).sheet else {
            return Vec::new();
        };
        self.sheet_selectors(sheet)
    }

    fn sheet_selectors(&self, sheet: SheetId) -> Vec<String> {
        let mut selectors = Vec::new();
        for id in sheet.0.descendants(&self.cssom).skip(1) {
            match self.css_node(id) {
                Some(CssNode::Rule(RuleData::Style { selector, .. })) => {
                    selectors.push(selector.clone())
                }
                Some(CssNode::Rule(RuleData::Import {
                    target: Some(target),
                    ..
                })) => selectors.extend(self.sheet_selectors(*target)),
                _ => {}
            }
        }
        selectors
    }

    /// Local URLs created and not yet revoked.
    pub fn local_url_count(&self) -> usize {
        self.local_urls.len()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetches.len()
    }
}

impl StyleSheetHost for MemoryDocument {
    type Sheet = SheetId;
    type Rule = RuleId;

    fn read_rules(&self, sheet: SheetId) -> RuleAccess<RuleId> {
        match self.sheet_data(sheet).map(|data| &data.state) {
            Some(SheetState::Parsed) => {
                RuleAccess::Rules(sheet.0.children(&self.cssom).map(RuleId).collect())
            }
            Some(SheetState::Unparsed) => RuleAccess::NotYetParsed,
            Some(SheetState::CrossOrigin) => RuleAccess::AccessDenied,
            Some(SheetState::Broken(reason)) => RuleAccess::Failed(reason.clone()),
            None => RuleAccess::Failed(format!("{:?} is not a sheet", sheet)),
        }
    }

    fn rule_kind(&self, rule: RuleId) -> RuleKind<SheetId, RuleId> {
        match self.rule_data(rule) {
            Some(RuleData::Style { selector, .. }) => RuleKind::Style {
                selector: selector.clone(),
            },
            Some(RuleData::Group { .. }) => RuleKind::Group {
                rules: rule.0.children(&self.cssom).map(RuleId).collect(),
            },
            Some(RuleData::Import { target, .. }) => RuleKind::Import { target: *target },
            Some(RuleData::Other { prelude, .. }) => RuleKind::Other {
                name: at_keyword(prelude).to_string(),
            },
            None => RuleKind::Other {
                name: String::new(),
            },
        }
    }

    fn selector_text(&self, rule: RuleId) -> Option<String> {
        match self.rule_data(rule) {
            Some(RuleData::Style { selector, .. }) => Some(selector.clone()),
            _ => None,
        }
    }

    fn declarations(&self, rule: RuleId) -> String {
        match self.rule_data(rule) {
            Some(RuleData::Style { declarations, .. }) => declarations.clone(),
            _ => String::new(),
        }
    }

    fn set_selector_text(&mut self, rule: RuleId, text: &str) -> Result<()> {
        if !self.selector_writable {
            return Ok(());
        }
        match self.cssom.get_mut(rule.0).map(|node| node.get_mut()) {
            Some(CssNode::Rule(RuleData::Style { selector, .. })) => {
                *selector = text.to_string();
                Ok(())
            }
            _ => Err(ScopeError::host(
                "set selector text",
                format!("{:?} is not a style rule", rule),
            )),
        }
    }

    fn delete_rule(&mut self, parent: RuleParent<SheetId, RuleId>, index: usize) -> Result<()> {
        let container = Self::container(parent);
        let child = container
            .children(&self.cssom)
            .nth(index)
            .ok_or_else(|| ScopeError::host("delete rule", format!("no rule at {}", index)))?;
        child.detach(&mut self.cssom);
        Ok(())
    }

    fn insert_rule(
        &mut self,
        parent: RuleParent<SheetId, RuleId>,
        index: usize,
        css_text: &str,
    ) -> Result<RuleId> {
        let mut rules = parse_stylesheet(css_text);
        if rules.len() != 1 {
            return Err(ScopeError::host(
                "insert rule",
                format!("expected a single rule in `{}`", css_text),
            ));
        }
        let container = Self::container(parent);
        let len = container.children(&self.cssom).count();
        if index > len {
            return Err(ScopeError::host(
                "insert rule",
                format!("index {} is past the end ({})", index, len),
            ));
        }

        let id = self.create_rule(rules.remove(0));
        let placed = match container.children(&self.cssom).nth(index) {
            Some(sibling) => sibling.checked_insert_before(id, &mut self.cssom),
            None => container.checked_append(id, &mut self.cssom),
        };
        placed.map_err(|err| ScopeError::host("insert rule", err.to_string()))?;
        Ok(RuleId(id))
    }

    fn rule_position(&self, rule: RuleId) -> Option<(RuleParent<SheetId, RuleId>, usize)> {
        let parent = self.cssom.get(rule.0)?.parent()?;
        let index = parent.children(&self.cssom).position(|child| child == rule.0)?;
        let parent = match self.css_node(parent)? {
            CssNode::Sheet(_) => RuleParent::Sheet(SheetId(parent)),
            CssNode::Rule(_) => RuleParent::Group(RuleId(parent)),
        };
        Some((parent, index))
    }

    fn owner_rule(&self, sheet: SheetId) -> Option<RuleId> {
        match self.sheet_data(sheet)?.owner? {
            SheetOwner::Import(rule) => Some(rule),
            SheetOwner::Element(_) => None,
        }
    }

    fn href(&self, sheet: SheetId) -> Option<String> {
        self.sheet_data(sheet)?.href.clone()
    }

    fn is_rule_attached(&self, rule: RuleId) -> bool {
        self.sheet_of(rule)
            .is_some_and(|sheet| self.is_sheet_owned(sheet))
    }

    fn scratch_sheet(&mut self, css_text: &str) -> Result<SheetId> {
        Ok(self.new_sheet(None, None, SheetState::Parsed, css_text.to_string()))
    }

    fn discard_sheet(&mut self, sheet: SheetId) {
        self.sheets.retain(|&s| s != sheet);
    }
}

impl ResourceLoader for MemoryDocument {
    type Fetch = FetchId;

    fn begin_fetch(&mut self, href: &str) -> FetchId {
        self.fetches.push(FetchEntry {
            href: href.to_string(),
            loaded: None,
        });
        FetchId(self.fetches.len() - 1)
    }

    fn poll_fetch(&mut self, fetch: FetchId) -> FetchState {
        match self.fetches.get(fetch.0).and_then(|entry| entry.loaded.clone()) {
            Some(text) => FetchState::Loaded(text),
            None => FetchState::Loading,
        }
    }

    fn create_local_url(&mut self, text: String) -> String {
        self.last_url += 1;
        let url = format!("{}{}", LOCAL_URL_SCHEME, self.last_url);
        self.local_urls.insert(url.clone(), text);
        url
    }

    fn revoke_local_url(&mut self, url: &str) {
        self.local_urls.shift_remove(url);
    }
}

impl DocumentHost for MemoryDocument {
    type Node = NodeId;

    fn is_style(&self, node: NodeId) -> bool {
        self.element(node).tag == "style"
    }

    fn is_scoped(&self, node: NodeId) -> bool {
        self.has_attribute(node, "scoped")
    }

    fn set_scoped(&mut self, node: NodeId, scoped: bool) {
        match (scoped, self.is_scoped(node)) {
            (true, false) => self.set_attribute(node, "scoped", ""),
            (false, true) => self.remove_attribute(node, "scoped"),
            _ => {}
        }
    }

    fn is_connected(&self, node: NodeId) -> bool {
        node.ancestors(&self.dom).any(|ancestor| ancestor == self.body)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.dom.get(node)?.parent()
    }

    fn sheet(&self, node: NodeId) -> Option<SheetId> {
        self.element(node).sheet
    }

    fn text_content(&self, node: NodeId) -> String {
        self.element(node).text.clone()
    }

    fn set_text_content(&mut self, node: NodeId, text: &str) {
        self.dom[node].get_mut().text = text.to_string();
        if self.is_style(node) && self.in_document(node) {
            self.drop_sheet(node);
            self.attach_sheet(node);
        }
        if self.is_connected(node) {
            // the text child is replaced
            self.records.push(MutationRecord::on(node));
        }
    }

    fn set_marker(&mut self, node: NodeId, marker: &str, mode: MarkerMode, on: bool) {
        match (mode, on) {
            (MarkerMode::Attribute, true) => {
                self.dom[node]
                    .get_mut()
                    .attributes
                    .insert(marker.to_string(), String::new());
            }
            (MarkerMode::Attribute, false) => {
                self.dom[node].get_mut().attributes.shift_remove(marker);
            }
            (MarkerMode::Class, on) => self.toggle_class(node, marker, on),
        }
    }

    fn style_descendants(&self, node: NodeId) -> Vec<NodeId> {
        node.descendants(&self.dom)
            .skip(1)
            .filter(|&n| self.is_style(n))
            .collect()
    }

    fn body_styles(&self) -> Vec<NodeId> {
        self.style_descendants(self.body)
    }
}
