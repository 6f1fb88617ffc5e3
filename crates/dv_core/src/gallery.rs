//! Gallery builder — decoys plus the one true secret image, shuffled.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::catalog::ImageCatalog;
use crate::decoys;
use crate::error::CoreError;
use crate::image::ImageRef;

/// Gallery size is `DEFAULT_DECOY_COUNT + 1` (the secret).
pub const DEFAULT_DECOY_COUNT: usize = 19;

/// One gallery tile.  Exists only in builder output — the `is_secret` tag is
/// never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct GalleryEntry {
    pub image: ImageRef,
    pub is_secret: bool,
}

/// Build a shuffled gallery of `decoy_count + 1` entries with exactly one
/// `is_secret = true` tile.
///
/// The resolver guarantees the decoy count via padding, so the only failure
/// short of I/O is a fully empty pool — surfaced as `EmptyDecoyPool` because
/// a challenge with no decoys is no challenge at all.
pub fn build(
    catalog: &dyn ImageCatalog,
    rng: &mut impl Rng,
    secret: &ImageRef,
    category: &str,
    decoy_count: usize,
) -> Result<Vec<GalleryEntry>, CoreError> {
    let decoys = decoys::resolve(catalog, rng, category, decoy_count)?;
    if decoys.len() < decoy_count {
        return Err(CoreError::EmptyDecoyPool);
    }

    let mut entries: Vec<GalleryEntry> = decoys
        .into_iter()
        .map(|image| GalleryEntry {
            image,
            is_secret: false,
        })
        .collect();
    entries.push(GalleryEntry {
        image: secret.clone(),
        is_secret: true,
    });
    entries.shuffle(rng);
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::FsCatalog;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::fs;
    use tempfile::tempdir;

    fn catalog_with(names: &[&str]) -> (tempfile::TempDir, FsCatalog) {
        let dir = tempdir().unwrap();
        for n in names {
            fs::write(dir.path().join(n), b"img").unwrap();
        }
        let catalog = FsCatalog::new(dir.path());
        (dir, catalog)
    }

    #[test]
    fn exactly_one_secret_and_full_length() {
        let (_dir, catalog) = catalog_with(&["a.png", "b.png", "c.png"]);
        let mut rng = StdRng::seed_from_u64(42);
        let secret = ImageRef::new("uploads/cats.png");

        let entries = build(&catalog, &mut rng, &secret, "pets", 19).unwrap();
        assert_eq!(entries.len(), 20);
        let secrets: Vec<_> = entries.iter().filter(|e| e.is_secret).collect();
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].image, secret);
    }

    #[test]
    fn empty_pool_is_rejected() {
        let (_dir, catalog) = catalog_with(&[]);
        let mut rng = StdRng::seed_from_u64(42);
        let secret = ImageRef::new("uploads/cats.png");
        assert!(matches!(
            build(&catalog, &mut rng, &secret, "pets", 19),
            Err(CoreError::EmptyDecoyPool)
        ));
    }

    #[test]
    fn secret_position_is_roughly_uniform() {
        let (_dir, catalog) = catalog_with(&["a.png", "b.png", "c.png"]);
        let mut rng = StdRng::seed_from_u64(1);
        let secret = ImageRef::new("s.png");

        let mut position_counts = [0usize; 4];
        for _ in 0..2000 {
            let entries = build(&catalog, &mut rng, &secret, "pets", 3).unwrap();
            let pos = entries.iter().position(|e| e.is_secret).unwrap();
            position_counts[pos] += 1;
        }
        // Expected 500 per slot; ±150 is over seven standard deviations.
        for count in position_counts {
            assert!((350..=650).contains(&count), "skewed shuffle: {position_counts:?}");
        }
    }
}
