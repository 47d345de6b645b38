//! Core library for ouigen.
//!
//! Fetches the IEEE OUI vendor registry over HTTP(S) with conditional-GET
//! cache validation, keeps a durable single-artifact local cache, and
//! converts the registry text into a compact timestamped binary lookup
//! table.
//!
//! # Overview
//!
//! The pieces compose in one direction:
//!
//! - [`fetch`] issues the conditional request and decodes the transfer
//!   encoding,
//! - [`CacheStore`] holds the validators and payload of the last successful
//!   fetch and replaces them atomically,
//! - [`ensure_current`] ties the two together (with an offline override),
//! - [`parse`] streams the cached registry text into records,
//! - [`encode`] writes the binary table.
//!
//! [`generate`] runs the whole pipeline once.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use ouigen_core::{generate, CacheStore};
//!
//! fn build_table() -> ouigen_core::Result<()> {
//!     let store = CacheStore::new("/var/cache/ouigen");
//!     let generation = generate(
//!         "https://standards-oui.ieee.org/oui/oui.txt",
//!         &store,
//!         false,
//!         Path::new("generated-resources"),
//!         "oui.dat",
//!     )?;
//!     println!("wrote {} records to {}", generation.records, generation.output.display());
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod encode;
pub mod error;
pub mod fetch;
pub mod parser;
pub mod pipeline;
pub mod refresh;
pub mod validators;

pub use cache::{CacheStore, ARTIFACT_DIR, DATA_ENTRY, HEADERS_ENTRY};
pub use encode::{decode, encode};
pub use error::{ErrorContext, OuigenError, Result};
pub use fetch::{fetch, FetchOutcome};
pub use parser::{parse, OuiRecord};
pub use pipeline::{generate, Generation};
pub use refresh::ensure_current;
pub use validators::Validators;
