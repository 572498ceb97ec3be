//! Resolution Scheduler
//!
//! Drives the [`RuleWalker`] over sheets whose content is not available yet.
//! Work that cannot be done now is kept as a [`PendingUnit`] and retried on
//! the next cooperative tick. Ticks are driven by the host's own event loop:
//! the scheduler only says whether it wants one ([`Scheduler::needs_tick`]).
//!
//! There is no timeout. An import that never loads stays pending for as long
//! as its owner is alive, and a cross-origin fetch that never completes stays
//! pending forever.

use indexmap::IndexMap;
use log::{debug, trace, warn};

use crate::error::{Result, ScopeError};
use crate::host::{FetchState, ResourceLoader, RuleAccess, RuleKind, RuleParent, StyleSheetHost};
use crate::walker::{Deferred, MutationStrategy, RuleWalker};

/// Empty stand-in that keeps an `@import` slot while the real text is fetched.
/// Imports must all come first, so the slot cannot simply be dropped.
const EMPTY_IMPORT: &str = "@import url('data:text/css;base64,')";

/// A rule or sheet waiting for its content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingUnit<S, R, F> {
    /// An `@import` whose target sheet has not loaded.
    Import(R),
    /// A sheet that is not parsed yet.
    Unparsed(S),
    /// A cross-origin sheet being fetched out of band; `placeholder` is the
    /// empty import holding its place.
    Fetch { fetch: F, placeholder: R },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingReason {
    ImportNotLoaded,
    NotYetParsed,
    CrossOriginFetch,
}

impl<S, R, F> PendingUnit<S, R, F> {
    pub fn reason(&self) -> PendingReason {
        match self {
            PendingUnit::Import(_) => PendingReason::ImportNotLoaded,
            PendingUnit::Unparsed(_) => PendingReason::NotYetParsed,
            PendingUnit::Fetch { .. } => PendingReason::CrossOriginFetch,
        }
    }
}

type Unit<H> = PendingUnit<
    <H as StyleSheetHost>::Sheet,
    <H as StyleSheetHost>::Rule,
    <H as ResourceLoader>::Fetch,
>;

pub struct Scheduler<H: StyleSheetHost + ResourceLoader> {
    walker: RuleWalker<H::Sheet>,
    /// Pending units and the prefix each one must eventually get.
    pending: IndexMap<Unit<H>, String>,
    tick_requested: bool,
}

impl<H: StyleSheetHost + ResourceLoader> Scheduler<H> {
    pub fn new(strategy: MutationStrategy) -> Self {
        Scheduler {
            walker: RuleWalker::new(strategy),
            pending: IndexMap::new(),
            tick_requested: false,
        }
    }

    /// A scheduler using whichever mutation strategy the host supports.
    pub fn probe(host: &mut H) -> Result<Self> {
        Ok(Self::new(MutationStrategy::probe(host)?))
    }

    pub fn walker(&self) -> &RuleWalker<H::Sheet> {
        &self.walker
    }

    /// Forget that `sheet` and everything it imports were scoped.
    pub fn forget(&mut self, sheet: H::Sheet) {
        self.walker.forget(sheet);
    }

    /// Whether a tick has been requested and not yet run.
    pub fn needs_tick(&self) -> bool {
        self.tick_requested
    }

    pub fn pending(&self) -> impl Iterator<Item = (&Unit<H>, &str)> {
        self.pending.iter().map(|(unit, prefix)| (unit, prefix.as_str()))
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Scope `sheet` with `prefix`. Returns whether it was fully applied
    /// immediately; otherwise the rest is pending.
    pub fn upgrade_sheet(&mut self, host: &mut H, sheet: H::Sheet, prefix: &str) -> Result<bool> {
        let deferred = self.walker.walk(host, sheet, prefix)?;
        let done = deferred.is_empty();
        for item in deferred {
            self.defer(host, item, prefix)?;
        }
        Ok(done)
    }

    /// Retry every pending unit once. Returns whether another tick is needed.
    pub fn tick(&mut self, host: &mut H) -> Result<bool> {
        self.tick_requested = false;

        let units: Vec<(Unit<H>, String)> = self
            .pending
            .iter()
            .map(|(unit, prefix)| (*unit, prefix.clone()))
            .collect();
        trace!("tick with {} pending", units.len());

        for (unit, prefix) in units {
            match self.advance(host, unit, &prefix) {
                Ok(true) => {
                    self.pending.shift_remove(&unit);
                }
                Ok(false) => {}
                Err(err) => {
                    // never retried
                    self.pending.shift_remove(&unit);
                    self.request_tick_if_pending();
                    return Err(err);
                }
            }
        }

        self.request_tick_if_pending();
        Ok(self.tick_requested)
    }

    /// Returns whether `unit` is finished with, resolved or abandoned.
    fn advance(&mut self, host: &mut H, unit: Unit<H>, prefix: &str) -> Result<bool> {
        match unit {
            PendingUnit::Import(rule) => match host.rule_kind(rule) {
                RuleKind::Import {
                    target: Some(target),
                } => {
                    if let Some((RuleParent::Sheet(owner), _)) = host.rule_position(rule) {
                        self.walker.link_import(owner, target);
                    }
                    self.upgrade_sheet(host, target, prefix)?;
                    Ok(true)
                }
                _ if host.is_rule_attached(rule) => Ok(false), // still valid, keep waiting
                _ => {
                    debug!("abandoning import {:?}, its owner is gone", rule);
                    Ok(true)
                }
            },
            PendingUnit::Unparsed(sheet) => match host.read_rules(sheet) {
                RuleAccess::NotYetParsed => Ok(false),
                _ => {
                    self.upgrade_sheet(host, sheet, prefix)?;
                    Ok(true)
                }
            },
            PendingUnit::Fetch { fetch, placeholder } => {
                if !host.is_rule_attached(placeholder) {
                    debug!("abandoning fetch {:?}, its owner is gone", fetch);
                    return Ok(true);
                }
                match host.poll_fetch(fetch) {
                    FetchState::Loading => Ok(false),
                    FetchState::Loaded(text) => {
                        let url = host.create_local_url(text);
                        let import = replace_rule(host, placeholder, &format!("@import '{}'", url))?;
                        // The host reads the URL as the rule is inserted.
                        host.revoke_local_url(&url);
                        self.enqueue(PendingUnit::Import(import), prefix);
                        Ok(true)
                    }
                }
            }
        }
    }

    fn defer(
        &mut self,
        host: &mut H,
        item: Deferred<H::Sheet, H::Rule>,
        prefix: &str,
    ) -> Result<()> {
        match item {
            Deferred::Import(rule) => self.enqueue(PendingUnit::Import(rule), prefix),
            Deferred::Unparsed(sheet) => self.enqueue(PendingUnit::Unparsed(sheet), prefix),
            Deferred::CrossOrigin(sheet) => self.fetch_cross_origin(host, sheet, prefix)?,
        }
        Ok(())
    }

    /// Fetch a cross-origin sheet ourselves and rebind it to a local URL once
    /// the text is available. There is no error path: a fetch that fails is
    /// never reported as loaded and stays pending.
    fn fetch_cross_origin(&mut self, host: &mut H, sheet: H::Sheet, prefix: &str) -> Result<()> {
        let (Some(href), Some(owner)) = (host.href(sheet), host.owner_rule(sheet)) else {
            warn!("cross-origin sheet {:?} cannot be rebound, leaving it unscoped", sheet);
            return Ok(());
        };

        debug!("fetching cross-origin sheet {}", href);
        let fetch = host.begin_fetch(&href);
        let placeholder = replace_rule(host, owner, EMPTY_IMPORT)?;
        self.enqueue(PendingUnit::Fetch { fetch, placeholder }, prefix);
        Ok(())
    }

    fn enqueue(&mut self, unit: Unit<H>, prefix: &str) {
        trace!("pending {:?} ({:?})", unit, unit.reason());
        self.pending.insert(unit, prefix.to_string());
        self.tick_requested = true;
    }

    fn request_tick_if_pending(&mut self) {
        if !self.pending.is_empty() {
            self.tick_requested = true;
        }
    }
}

/// Replace a live rule with `css_text`, returning the rule it was replaced by.
fn replace_rule<H: StyleSheetHost>(host: &mut H, rule: H::Rule, css_text: &str) -> Result<H::Rule> {
    let (parent, index) = host
        .rule_position(rule)
        .ok_or_else(|| ScopeError::host("replace rule", format!("{:?} is not in a sheet", rule)))?;
    host.delete_rule(parent, index)?;
    host.insert_rule(parent, index, css_text)
}
