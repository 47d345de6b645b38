use std::fs::File;

use clap::Parser;
use cli::{default_cache_root, Args};
use logging::setup_logging;
use ouigen_core::{decode, generate, CacheStore, ErrorContext, Result};
use tracing::{debug, info};

mod cli;
mod logging;

fn handle_cli(args: Args) -> Result<()> {
    if let Some(table) = &args.dump {
        let file =
            File::open(table).with_context(|| format!("opening {}", table.display()))?;
        let (generated_at, records) = decode(file)?;
        info!("Generated at {generated_at} (ms since epoch), {} records", records.len());
        for record in &records {
            info!(
                "{:02X}-{:02X}-{:02X}  {}",
                record.prefix[0], record.prefix[1], record.prefix[2], record.organization
            );
        }
        return Ok(());
    }

    let cache_root = args.cache_dir.clone().unwrap_or_else(default_cache_root);
    debug!("Using cache root {}", cache_root.display());

    let store = CacheStore::new(cache_root);
    let generation = generate(
        &args.url,
        &store,
        args.offline,
        &args.output_dir,
        &args.file,
    )?;
    debug!(
        "Generated {} from {}",
        generation.output.display(),
        generation.artifact.display()
    );
    Ok(())
}

fn main() {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))
    .ok();

    let args = Args::parse();
    setup_logging(&args);

    if let Err(err) = handle_cli(args) {
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(1);
    }
}
