//! In-memory host: a small document tree with a CSS object model built from
//! CSS text. Drives the tests and the command line tool.

pub mod css;
pub mod document;

pub use document::{FetchId, MemoryDocument, RuleId, SheetId};

use crate::error::Result;
use crate::scope::ScopedStyles;

/// Pump the document and the scoping service until nothing is left to do:
/// deliver queued mutation records, then alternate `advance` and `tick`
/// while a tick is requested, running at most `max_ticks` ticks.
///
/// Returns the number of ticks run. Work may still be pending when the bound
/// is hit; check [`ScopedStyles::needs_tick`].
pub fn settle(
    doc: &mut MemoryDocument,
    scoped: &mut ScopedStyles<MemoryDocument>,
    max_ticks: usize,
) -> Result<usize> {
    let mut ticks = 0;
    loop {
        let records = doc.take_records();
        if !records.is_empty() {
            scoped.observe(doc, &records)?;
            continue;
        }
        if !scoped.needs_tick() || ticks >= max_ticks {
            return Ok(ticks);
        }
        doc.advance();
        scoped.tick(doc)?;
        ticks += 1;
    }
}
