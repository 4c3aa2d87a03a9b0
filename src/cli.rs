//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

/// Download APKs from F-Droid.
///
/// Each argument is an exact package id, or a search query when `--search`
/// is given. Interrupted downloads resume from `<name>.apk.partial` on the
/// next run.
#[derive(Parser, Debug)]
#[command(name = "fdroid-downloader")]
#[command(author, version, about)]
pub struct Args {
    /// Package names or search queries to download
    #[arg(required = true, value_name = "PACKAGES")]
    pub packages: Vec<String>,

    /// Output directory (default: current directory)
    #[arg(short = 'd', long = "dir", value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Enable fuzzy searching in F-Droid
    #[arg(long, overrides_with = "no_search")]
    pub search: bool,

    /// Treat every argument as an exact package id
    #[arg(long = "no-search", overrides_with = "search")]
    pub no_search: bool,

    /// Repository base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Never use an external download accelerator
    #[arg(long)]
    pub no_accelerator: bool,

    /// Resolve packages and print their download info as JSON without downloading
    #[arg(long)]
    pub dry_run: bool,

    /// Read configuration from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Search mode requested on the command line, if any.
    #[must_use]
    pub fn search_override(&self) -> Option<bool> {
        if self.search {
            Some(true)
        } else if self.no_search {
            Some(false)
        } else {
            None
        }
    }
}
