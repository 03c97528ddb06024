//! Fixed-point alias resolution.

use crate::context::ImportContext;
use dtm_core::{Alias, ImportError};
use tracing::{debug, warn};

/// Resolve pending aliases in rounds against the growing working set.
///
/// Each round scans the remaining aliases once, in order, so an alias resolved
/// early in a round is visible to the ones after it. A dependency chain can be
/// no longer than the number of aliases, so that many rounds always suffice for
/// acyclic input. Resolution also stops as soon as a round makes no progress;
/// later rounds would see the same working set. Whatever is left is returned
/// unresolved, which is how reference cycles surface.
pub async fn resolve_aliases(
    ctx: &mut ImportContext<'_>,
    aliases: Vec<Alias>,
) -> Result<Vec<Alias>, ImportError> {
    let budget = aliases.len();
    let mut pending = aliases;

    for generation in 1..=budget {
        if pending.is_empty() {
            break;
        }

        let before = pending.len();
        let mut remaining = Vec::with_capacity(before);
        for alias in pending {
            if !ctx.materialize_alias(&alias).await? {
                remaining.push(alias);
            }
        }
        pending = remaining;

        debug!(
            generation,
            resolved = before - pending.len(),
            remaining = pending.len(),
            "Alias generation"
        );
        if pending.len() == before {
            break;
        }
    }

    for alias in &pending {
        warn!(name = %alias.name, target = %alias.target, "Unresolved alias");
    }
    Ok(pending)
}
