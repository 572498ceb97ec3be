//! Rule Walker
//!
//! Applies the selector rewriter to every style rule of a sheet, descending
//! into conditional groups and into imported sheets that have already
//! loaded. Whatever cannot be reached yet is handed back as [`Deferred`] work
//! rather than waited for.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use indexmap::IndexSet;
use log::{debug, trace};

use crate::error::{Result, ScopeError};
use crate::host::{RuleAccess, RuleKind, RuleParent, StyleSheetHost};
use crate::selector::{rewrite_selector_list, MATCH_NOTHING};

const PROBE_CSS: &str = ".style-test { color: red; }";
const PROBE_SELECTOR: &str = ".change";

/// How a rewritten selector is written back into a live rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationStrategy {
    /// Assign the rule's selector text.
    InPlace,
    /// Delete the rule and insert its rewritten text at the same index, for
    /// hosts where selector text is read-only.
    DeleteReinsert,
}

impl MutationStrategy {
    /// Find out once whether the host lets selector text be assigned.
    pub fn probe<H: StyleSheetHost>(host: &mut H) -> Result<Self> {
        let sheet = host.scratch_sheet(PROBE_CSS)?;
        let strategy = match host.read_rules(sheet) {
            RuleAccess::Rules(rules) if !rules.is_empty() => {
                let rule = rules[0];
                // A host may refuse the write or silently ignore it.
                let written = host.set_selector_text(rule, PROBE_SELECTOR).is_ok()
                    && host.selector_text(rule).as_deref() == Some(PROBE_SELECTOR);
                if written {
                    MutationStrategy::InPlace
                } else {
                    MutationStrategy::DeleteReinsert
                }
            }
            _ => MutationStrategy::DeleteReinsert,
        };
        host.discard_sheet(sheet);
        debug!("selector mutation strategy: {:?}", strategy);
        Ok(strategy)
    }

    fn apply<H: StyleSheetHost>(
        self,
        host: &mut H,
        rule: H::Rule,
        parent: RuleParent<H::Sheet, H::Rule>,
        index: usize,
        selector: &str,
    ) -> Result<()> {
        match self {
            MutationStrategy::InPlace => host.set_selector_text(rule, selector),
            MutationStrategy::DeleteReinsert => {
                // save before we delete
                let declarations = host.declarations(rule);
                host.delete_rule(parent, index)?;
                host.insert_rule(parent, index, &format!("{} {{{}}}", selector, declarations))?;
                Ok(())
            }
        }
    }
}

/// Work the walker could not finish synchronously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Deferred<S, R> {
    /// An `@import` whose sheet has not loaded.
    Import(R),
    /// A sheet whose content is not parsed yet.
    Unparsed(S),
    /// A cross-origin sheet whose rules cannot be read.
    CrossOrigin(S),
}

pub struct RuleWalker<S> {
    strategy: MutationStrategy,
    processed: HashSet<(S, String)>,
    /// Sheets being walked right now, so import cycles end.
    walking: HashSet<(S, String)>,
    /// Style rules already rewritten in sheets whose walk failed.
    progress: HashMap<(S, String), usize>,
    /// Imported sheets seen below each sheet.
    imports: HashMap<S, IndexSet<S>>,
}

/// Counts style rules in walk order, skipping those a failed walk already
/// rewrote.
struct Cursor {
    resume: usize,
    done: usize,
}

impl<S: Copy + Eq + Hash + Debug> RuleWalker<S> {
    pub fn new(strategy: MutationStrategy) -> Self {
        RuleWalker {
            strategy,
            processed: HashSet::new(),
            walking: HashSet::new(),
            progress: HashMap::new(),
            imports: HashMap::new(),
        }
    }

    pub fn strategy(&self) -> MutationStrategy {
        self.strategy
    }

    pub fn is_processed(&self, sheet: S, prefix: &str) -> bool {
        self.processed.contains(&(sheet, prefix.to_string()))
    }

    /// Number of `(sheet, prefix)` pairs remembered as walked.
    pub fn processed_len(&self) -> usize {
        self.processed.len()
    }

    /// Record that `target` is imported by `owner`, for imports resolved
    /// outside of a walk.
    pub fn link_import(&mut self, owner: S, target: S) {
        self.imports.entry(owner).or_default().insert(target);
    }

    /// Drop everything remembered about `sheet` and the sheets it imports,
    /// under any prefix.
    pub fn forget(&mut self, sheet: S) {
        let mut chain = vec![sheet];
        let mut next = 0;
        while let Some(&current) = chain.get(next) {
            for target in self.imports.remove(&current).unwrap_or_default() {
                if !chain.contains(&target) {
                    chain.push(target);
                }
            }
            next += 1;
        }
        trace!("forgetting {} sheets below {:?}", chain.len(), sheet);

        self.processed.retain(|(processed, _)| !chain.contains(processed));
        self.progress.retain(|(partial, _), _| !chain.contains(partial));
    }

    /// Scope every rule of `sheet` with `prefix`. Walking the same sheet with
    /// the same prefix again does nothing once a walk has succeeded; after a
    /// failed walk it picks up at the first rule not yet rewritten.
    pub fn walk<H: StyleSheetHost<Sheet = S>>(
        &mut self,
        host: &mut H,
        sheet: S,
        prefix: &str,
    ) -> Result<Vec<Deferred<S, H::Rule>>> {
        let mut deferred = Vec::new();
        self.walk_sheet(host, sheet, prefix, &mut deferred)?;
        Ok(deferred)
    }

    fn walk_sheet<H: StyleSheetHost<Sheet = S>>(
        &mut self,
        host: &mut H,
        sheet: S,
        prefix: &str,
        deferred: &mut Vec<Deferred<S, H::Rule>>,
    ) -> Result<()> {
        let key = (sheet, prefix.to_string());
        if self.processed.contains(&key) || self.walking.contains(&key) {
            return Ok(()); // already done
        }

        let rules = match host.read_rules(sheet) {
            RuleAccess::Rules(rules) => rules,
            RuleAccess::NotYetParsed => {
                trace!("sheet {:?} is not parsed yet", sheet);
                deferred.push(Deferred::Unparsed(sheet));
                return Ok(());
            }
            RuleAccess::AccessDenied => {
                trace!("sheet {:?} is cross-origin", sheet);
                deferred.push(Deferred::CrossOrigin(sheet));
                return Ok(());
            }
            RuleAccess::Failed(reason) => {
                return Err(ScopeError::ReadRules {
                    sheet: format!("{:?}", sheet),
                    reason,
                });
            }
        };

        let mut cursor = Cursor {
            resume: self.progress.remove(&key).unwrap_or(0),
            done: 0,
        };
        self.walking.insert(key.clone());
        let walked = self.walk_rules(host, sheet, rules, prefix, &mut cursor, deferred);
        self.walking.remove(&key);

        match walked {
            Ok(()) => {
                self.processed.insert(key);
                Ok(())
            }
            Err(err) => {
                debug!("walk of {:?} stopped after {} style rules", sheet, cursor.done);
                self.progress.insert(key, cursor.done);
                Err(err)
            }
        }
    }

    fn walk_rules<H: StyleSheetHost<Sheet = S>>(
        &mut self,
        host: &mut H,
        sheet: S,
        rules: Vec<H::Rule>,
        prefix: &str,
        cursor: &mut Cursor,
        deferred: &mut Vec<Deferred<S, H::Rule>>,
    ) -> Result<()> {
        for (index, rule) in rules.into_iter().enumerate() {
            match host.rule_kind(rule) {
                RuleKind::Import {
                    target: Some(target),
                } => {
                    self.link_import(sheet, target);
                    self.walk_sheet(host, target, prefix, deferred)?;
                }
                RuleKind::Import { target: None } => {
                    trace!("import {:?} has not loaded", rule);
                    deferred.push(Deferred::Import(rule));
                }
                kind => self.walk_rule(
                    host,
                    rule,
                    kind,
                    RuleParent::Sheet(sheet),
                    index,
                    prefix,
                    cursor,
                )?,
            }
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn walk_rule<H: StyleSheetHost<Sheet = S>>(
        &self,
        host: &mut H,
        rule: H::Rule,
        kind: RuleKind<S, H::Rule>,
        parent: RuleParent<S, H::Rule>,
        index: usize,
        prefix: &str,
        cursor: &mut Cursor,
    ) -> Result<()> {
        match kind {
            RuleKind::Group { rules } => {
                for (child_index, child) in rules.into_iter().enumerate() {
                    let child_kind = host.rule_kind(child);
                    self.walk_rule(
                        host,
                        child,
                        child_kind,
                        RuleParent::Group(rule),
                        child_index,
                        prefix,
                        cursor,
                    )?;
                }
                Ok(())
            }
            RuleKind::Style { selector } => {
                if cursor.done < cursor.resume {
                    cursor.done += 1;
                    return Ok(()); // rewritten by an earlier walk
                }
                let update = rewrite_selector_list(&selector, prefix);
                if update == MATCH_NOTHING {
                    debug!("cannot scope `{}`, it will match nothing", selector);
                }
                self.strategy.apply(host, rule, parent, index, &update)?;
                cursor.done += 1;
                Ok(())
            }
            RuleKind::Import { .. } => {
                debug!("ignoring nested import {:?}", rule);
                Ok(())
            }
            RuleKind::Other { name } => {
                debug!("can't scope {} rule {:?}", name, rule);
                Ok(())
            }
        }
    }
}
