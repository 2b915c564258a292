/*!
gzsync CLI - keep an up-to-date `.gz` copy next to every file in a directory tree.

Progress is logged to stdout and failures to stderr. Individual file or
directory failures never change the exit status unless `--strict` is given.
*/

use std::path::PathBuf;

use clap::Parser;
use gzsync_core::config::DEFAULT_LEVEL;
use gzsync_core::observability::init_logging;
use gzsync_core::{create_engine_from_config, SymlinkPolicy, SyncConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "gzsync")]
#[command(about = "Create or refresh F.gz for every file F under a directory")]
#[command(version)]
struct Cli {
    /// Root directory to scan
    root: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, env = "GZSYNC_VERBOSE")]
    verbose: bool,

    /// gzip compression level (0-9)
    #[arg(short, long, env = "GZSYNC_LEVEL", default_value_t = DEFAULT_LEVEL)]
    level: u32,

    /// Worker threads; 1 runs sequentially, 0 uses one per CPU
    #[arg(short, long, env = "GZSYNC_JOBS", default_value_t = 1)]
    jobs: usize,

    /// Write each artifact to a temp file and rename it into place on success
    #[arg(long, env = "GZSYNC_ATOMIC")]
    atomic: bool,

    /// Compress files reached through symbolic links (linked directories are never entered)
    #[arg(long, env = "GZSYNC_FOLLOW_SYMLINKS")]
    follow_symlinks: bool,

    /// Exit with status 1 if any file or directory failed
    #[arg(long, env = "GZSYNC_STRICT")]
    strict: bool,

    /// Print the run summary as JSON when done
    #[arg(long)]
    summary_json: bool,
}

impl Cli {
    fn sync_config(&self) -> SyncConfig {
        let symlinks = if self.follow_symlinks {
            SymlinkPolicy::FollowFiles
        } else {
            SymlinkPolicy::Skip
        };

        SyncConfig::default()
            .with_level(self.level)
            .with_jobs(self.jobs)
            .with_atomic(self.atomic)
            .with_symlinks(symlinks)
    }
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;

    let engine = create_engine_from_config(cli.sync_config())?;
    let report = engine.run(&cli.root);

    info!("Processing complete.");
    info!("{}", report);

    if cli.summary_json {
        println!("{}", report.to_json()?);
    }

    if cli.strict && report.has_failures() {
        anyhow::bail!(
            "{} file(s) and {} folder(s) failed",
            report.file_failures,
            report.directory_failures
        );
    }

    Ok(())
}
