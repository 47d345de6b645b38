use std::{env, path::PathBuf};

use clap::{ArgAction, Parser, ValueHint};

/// Default location of the IEEE OUI registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://standards-oui.ieee.org/oui/oui.txt";

#[derive(Parser)]
#[command(
    version,
    about,
    help_template = "{before-help}{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}"
)]
pub struct Args {
    /// Registry source URL
    #[arg(long, default_value = DEFAULT_REGISTRY_URL, value_hint = ValueHint::Url)]
    pub url: String,

    /// Name of the generated binary table file
    #[arg(short, long, default_value = "oui.dat")]
    pub file: String,

    /// Directory the generated table is written to
    #[arg(short = 'd', long, default_value = "generated-resources", value_hint = ValueHint::DirPath)]
    pub output_dir: PathBuf,

    /// Cache storage root [default: $XDG_CACHE_HOME/ouigen or ~/.cache/ouigen]
    #[arg(long, value_hint = ValueHint::DirPath)]
    pub cache_dir: Option<PathBuf>,

    /// Skip network access and trust the cached registry as-is
    #[arg(long)]
    pub offline: bool,

    /// Print a summary of an existing binary table instead of generating
    #[arg(long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub dump: Option<PathBuf>,

    /// Set output verbosity
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Suppress outputs
    #[arg(short, long)]
    pub quiet: bool,

    /// Output logs as json
    #[arg(short, long)]
    pub json: bool,
}

/// Resolves the default cache root from the environment, the way XDG-aware
/// tools do: `$XDG_CACHE_HOME/ouigen`, falling back to `~/.cache/ouigen`.
pub fn default_cache_root() -> PathBuf {
    env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("ouigen")
}
