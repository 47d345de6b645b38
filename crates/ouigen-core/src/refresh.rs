//! Cache refresh orchestration.
//!
//! Composes the fetcher and the cache store into a single "ensure current"
//! operation. Offline mode is an explicit trust override that skips the
//! network entirely; it is the only sanctioned fallback, a failed online
//! fetch is fatal for the run rather than silently served from a stale
//! cache.

use std::path::PathBuf;

use tracing::info;

use crate::{
    cache::CacheStore,
    error::{OuigenError, Result},
    fetch::{fetch, FetchOutcome},
};

/// Ensures the cache artifact reflects the current remote registry and
/// returns its path.
///
/// With `offline` set, whatever is currently stored is trusted without any
/// network access, regardless of staleness. Otherwise the stored validators
/// drive a conditional fetch: `NotModified` keeps the existing artifact
/// byte-identical, `Updated` replaces it wholesale.
///
/// Returns [`OuigenError::NoDataAvailable`] if no artifact exists once the
/// refresh (or the offline skip) is done.
pub fn ensure_current(url: &str, store: &CacheStore, offline: bool) -> Result<PathBuf> {
    if offline {
        info!("Operating in offline mode; skipping connection to {url}");
    } else {
        let validators = store.read_validators();
        apply_outcome(fetch(url, &validators)?, url, store)?;
    }

    if !store.exists() {
        return Err(OuigenError::NoDataAvailable {
            path: store.artifact_path().to_path_buf(),
        });
    }
    Ok(store.artifact_path().to_path_buf())
}

/// Applies a fetch outcome to the store. Split out from [`ensure_current`]
/// so the two branches are testable without a server.
fn apply_outcome(outcome: FetchOutcome, url: &str, store: &CacheStore) -> Result<()> {
    match outcome {
        FetchOutcome::NotModified => {
            info!(
                "Remote registry not changed; using cached data at {}",
                store.artifact_path().display()
            );
        }
        FetchOutcome::Updated {
            validators,
            payload,
        } => {
            info!("Downloading {url}...");
            let artifact = store.write(&validators, payload)?;
            info!("Cached registry data at {}", artifact.display());
        }
    }
    Ok(())
}
