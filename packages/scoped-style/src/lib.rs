#![deny(clippy::all)]

/*!
 * Scoped Style - `<style scoped>` for hosts without native support
 *
 * Rewrites the selectors of a scoped style sheet so that its rules only
 * match inside the element the sheet is attached to, and keeps doing so as
 * the sheet loads, imports resolve and the element moves around.
 */

// Pure selector rewriting
pub mod condition;
pub mod selector;

// Host boundary and the reference in-memory host
pub mod host;
pub mod memory;

// Sheet resolution
pub mod scheduler;
pub mod walker;

// Lifecycle and configuration
pub mod error;
pub mod options;
pub mod scope;

// Re-exports
pub use error::{Result, ScopeError};
pub use host::{DocumentHost, MarkerMode, ResourceLoader, RuleAccess, RuleKind, StyleSheetHost};
pub use options::ScopeOptions;
pub use scheduler::Scheduler;
pub use scope::{MutationRecord, ScopedStyles, Transition};
pub use selector::{rewrite_selector_list, try_rewrite_selector_list, UnsupportedSelector};
pub use walker::{Deferred, MutationStrategy, RuleWalker};
