//! The full fetch → cache → convert pipeline.
//!
//! One invocation refreshes the cache (or trusts it, offline), streams the
//! cached registry text through the parser, and writes a fresh binary table.
//! Each run produces a full replacement table; there is no incremental mode.

use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use tracing::info;

use crate::{
    cache::CacheStore,
    encode::encode,
    error::{ErrorContext, OuigenError, Result},
    parser::parse,
    refresh::ensure_current,
};

/// Summary of one pipeline run.
#[derive(Debug)]
pub struct Generation {
    /// Path of the generated binary table.
    pub output: PathBuf,
    /// Path of the cache artifact the table was generated from.
    pub artifact: PathBuf,
    /// Number of records written. Informational only.
    pub records: u64,
}

/// Runs the whole pipeline once and returns what was produced.
///
/// The caller supplies all configuration as plain parameters; nothing is
/// read from the environment here. Any failure is fatal for the run: an
/// unusable cache plus a failed (or skipped) fetch means there is no data
/// to convert.
pub fn generate(
    url: &str,
    store: &CacheStore,
    offline: bool,
    output_dir: &Path,
    file_name: &str,
) -> Result<Generation> {
    let artifact = ensure_current(url, store, offline)?;

    fs::create_dir_all(output_dir).map_err(|err| {
        OuigenError::DirectoryCreation {
            path: output_dir.to_path_buf(),
            source: err,
        }
    })?;

    let output = output_dir.join(file_name);
    info!("Creating resource {}...", output.display());

    let payload = store.read_payload()?;
    let mut writer = BufWriter::new(
        File::create(&output).with_context(|| format!("creating {}", output.display()))?,
    );
    let records = encode(parse(payload), now_millis()?, &mut writer)?;
    info!("Added {records} OUIs.");

    Ok(Generation {
        output,
        artifact,
        records,
    })
}

/// Milliseconds since the epoch as a signed 64-bit generation timestamp.
fn now_millis() -> Result<i64> {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH)?;
    Ok(elapsed.as_millis() as i64)
}
