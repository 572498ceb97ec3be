//! Scope Lifecycle
//!
//! Tracks every scoped style element that has been seen: the marker it was
//! given, the element currently carrying that marker, and the last sheet that
//! was scoped for it. A style element is active while it is flagged `scoped`
//! and inside the document body; its marker then sits on its parent.

use indexmap::{IndexMap, IndexSet};
use log::debug;

use crate::error::Result;
use crate::host::DocumentHost;
use crate::options::ScopeOptions;
use crate::scheduler::Scheduler;

/// One batch entry from the host's subtree observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord<N> {
    pub target: N,
    pub added: Vec<N>,
    pub removed: Vec<N>,
}

impl<N> MutationRecord<N> {
    /// A record about the target itself: its `scoped` attribute or its text
    /// changed.
    pub fn on(target: N) -> Self {
        MutationRecord {
            target,
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

/// What [`ScopedStyles::upgrade`] did with a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Not scoped and never seen before.
    Ignored,
    /// Seen for the first time; a marker was allocated and applied.
    Activated,
    /// Already active; the sheet was (re)scoped and the marker follows the
    /// current parent.
    Updated,
    /// No longer scoped or no longer in the document; state was dropped and
    /// the original CSS restored.
    Detached,
}

struct ScopeState<N, S> {
    marker: String,
    prefix: String,
    parent: Option<N>,
    sheet: Option<S>,
}

/// The scoping service. Owns the node registry and the scheduler; the host is
/// lent to every call.
pub struct ScopedStyles<H: DocumentHost> {
    options: ScopeOptions,
    scheduler: Scheduler<H>,
    resources: IndexMap<H::Node, ScopeState<H::Node, H::Sheet>>,
    last_id: u64,
}

impl<H: DocumentHost> ScopedStyles<H> {
    pub fn new(host: &mut H, options: ScopeOptions) -> Result<Self> {
        Ok(ScopedStyles {
            options,
            scheduler: Scheduler::probe(host)?,
            resources: IndexMap::new(),
            last_id: 0,
        })
    }

    pub fn options(&self) -> &ScopeOptions {
        &self.options
    }

    pub fn scheduler(&self) -> &Scheduler<H> {
        &self.scheduler
    }

    /// Marker name given to `node`, while it is active.
    pub fn token(&self, node: H::Node) -> Option<&str> {
        self.resources.get(&node).map(|state| state.marker.as_str())
    }

    /// Selector condition substituted for `:scope` in `node`'s sheet.
    pub fn prefix(&self, node: H::Node) -> Option<&str> {
        self.resources.get(&node).map(|state| state.prefix.as_str())
    }

    /// The element currently carrying `node`'s marker.
    pub fn marked_parent(&self, node: H::Node) -> Option<H::Node> {
        self.resources.get(&node).and_then(|state| state.parent)
    }

    pub fn active_count(&self) -> usize {
        self.resources.len()
    }

    pub fn needs_tick(&self) -> bool {
        self.scheduler.needs_tick()
    }

    /// Run one scheduler tick. Returns whether another one is needed.
    pub fn tick(&mut self, host: &mut H) -> Result<bool> {
        self.scheduler.tick(host)
    }

    /// Scope every style element already in the body.
    pub fn setup(&mut self, host: &mut H) -> Result<()> {
        let styles = host.body_styles();
        self.resolve(host, styles)
    }

    /// Handle a batch of observed mutations.
    pub fn observe(&mut self, host: &mut H, records: &[MutationRecord<H::Node>]) -> Result<()> {
        let changes = candidates(host, records);
        self.resolve(host, changes)
    }

    pub fn resolve<I>(&mut self, host: &mut H, nodes: I) -> Result<()>
    where
        I: IntoIterator<Item = H::Node>,
    {
        for node in nodes {
            self.upgrade(host, node)?;
        }
        Ok(())
    }

    /// Bring `node` up to date with its current place in the document.
    pub fn upgrade(&mut self, host: &mut H, node: H::Node) -> Result<Transition> {
        let effective_parent = if host.is_scoped(node) && host.is_connected(node) {
            host.parent(node)
        } else {
            None
        };
        let mode = self.options.marker_mode();

        let Some(state) = self.resources.get_mut(&node) else {
            let Some(parent) = effective_parent else {
                return Ok(Transition::Ignored); // not scoped CSS, never seen before
            };
            return self.activate(host, node, parent);
        };

        let marker = state.marker.clone();
        let old_parent = state.parent;

        let transition = match effective_parent {
            None => {
                // disappearing, clear state and ask the host to reset the CSS
                if let Some(sheet) = state.sheet {
                    self.scheduler.forget(sheet);
                }
                self.resources.shift_remove(&node);
                reset_css(host, node);
                debug!("detached {:?} ({})", node, marker);
                Transition::Detached
            }
            Some(_) => {
                // the sheet is gone while a node is being removed
                if let Some(sheet) = host.sheet(node) {
                    let prefix = state.prefix.clone();
                    if let Some(replaced) = state.sheet.replace(sheet).filter(|&s| s != sheet) {
                        self.scheduler.forget(replaced);
                    }
                    self.scheduler.upgrade_sheet(host, sheet, &prefix)?;
                }
                Transition::Updated
            }
        };

        if old_parent != effective_parent {
            if let Some(old) = old_parent {
                host.set_marker(old, &marker, mode, false);
            }
            if let Some(new) = effective_parent {
                debug!("moving {} to {:?}", marker, new);
                host.set_marker(new, &marker, mode, true);
            }
            if let Some(state) = self.resources.get_mut(&node) {
                state.parent = effective_parent;
            }
        }

        Ok(transition)
    }

    fn activate(&mut self, host: &mut H, node: H::Node, parent: H::Node) -> Result<Transition> {
        let mode = self.options.marker_mode();
        self.last_id += 1;
        let marker = self.options.marker_name(self.last_id);
        let prefix = mode.prefix(&marker);
        let sheet = host.sheet(node);
        debug!("scoping {:?} as {}", node, prefix);

        self.resources.insert(
            node,
            ScopeState {
                marker: marker.clone(),
                prefix: prefix.clone(),
                parent: Some(parent),
                sheet,
            },
        );

        // marked first: the entry records `parent` even if the walk fails
        host.set_marker(parent, &marker, mode, true);
        if let Some(sheet) = sheet {
            self.scheduler.upgrade_sheet(host, sheet, &prefix)?;
        }
        Ok(Transition::Activated)
    }
}

/// Style elements affected by a batch of mutations, each once: a record's
/// target if it is a style element, otherwise every added or removed style
/// element and every style element below an added or removed node.
pub fn candidates<H: DocumentHost>(
    host: &H,
    records: &[MutationRecord<H::Node>],
) -> IndexSet<H::Node> {
    let mut changes = IndexSet::new();
    for record in records {
        if host.is_style(record.target) {
            changes.insert(record.target);
            continue;
        }
        for &node in record.added.iter().chain(&record.removed) {
            if host.is_style(node) {
                changes.insert(node); // directly a style element
            } else {
                changes.extend(host.style_descendants(node));
            }
        }
    }
    changes
}

/// Make the host re-derive the node's sheet from its untouched text.
fn reset_css<H: DocumentHost>(host: &mut H, node: H::Node) {
    let css = host.text_content(node);
    host.set_text_content(node, "");
    host.set_text_content(node, &css);
}
