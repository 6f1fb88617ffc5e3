//! Decoy pool resolver.
//!
//! Assembles the non-secret images for a challenge gallery from the catalog
//! in three accumulating tiers, then pads and samples down to the exact
//! requested count.

use std::collections::HashSet;

use rand::seq::index;
use rand::Rng;

use crate::catalog::ImageCatalog;
use crate::error::CoreError;
use crate::image::ImageRef;

/// Canonical category folders, in the fixed order the fallback tier walks
/// them.
pub const KNOWN_CATEGORIES: [&str; 4] = ["people", "pets", "nature", "other"];

/// Resolve exactly `required` decoys for `category`.
///
/// Tiers accumulate (no short-circuit): the category's own folder, then the
/// catalog root ("classic" set), then — only if still short — every other
/// known category in canonical order.  After de-duplication by identifier,
/// an empty pool is returned as-is for the caller to reject; a short pool is
/// padded with uniform re-picks before the final draw, so the result may
/// contain value-level repeats.  That degraded mode is deliberate.
pub fn resolve(
    catalog: &dyn ImageCatalog,
    rng: &mut impl Rng,
    category: &str,
    required: usize,
) -> Result<Vec<ImageRef>, CoreError> {
    let mut pool: Vec<ImageRef> = Vec::new();
    pool.extend(catalog.list(Some(category))?);
    pool.extend(catalog.list(None)?);

    if pool.len() < required {
        for folder in KNOWN_CATEGORIES.iter().filter(|f| **f != category) {
            pool.extend(catalog.list(Some(folder))?);
        }
    }

    // De-duplicate by identifier; ordering is not preserved and callers must
    // not rely on it.
    let mut pool: Vec<ImageRef> = pool
        .into_iter()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    if pool.is_empty() {
        return Ok(Vec::new());
    }

    while pool.len() < required {
        let pick = pool[rng.gen_range(0..pool.len())].clone();
        pool.push(pick);
    }

    let picks = index::sample(rng, pool.len(), required);
    Ok(picks.into_iter().map(|i| pool[i].clone()).collect())
}
