// CLI module for argument parsing and configuration

use crate::config::ScanDefaults;
use crate::error::ScanError;
use crate::scan::ScanRequest;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// Tidydesk - tidy your desktop and find what is eating your disk
///
/// Sorts loose desktop files into category folders (with undo), and scans a
/// volume for its largest files while staying out of system directories.
#[derive(Parser, Debug, Clone)]
#[command(name = "tidydesk")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use this config file instead of the default location
    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Move files of a directory into category subfolders
    Organize(OrganizeArgs),
    /// Put back the files moved by the last organize run
    Undo,
    /// Find the largest files below a directory
    Scan(ScanArgs),
    /// Delete files (e.g. picked from scan results)
    Delete(DeleteArgs),
    /// Open the folder containing a file in the file manager
    Reveal {
        /// File whose folder should be shown
        path: PathBuf,
    },
    /// Show the effective configuration
    Config {
        /// Write the defaults to the config file if it does not exist yet
        #[arg(long = "init", action = ArgAction::SetTrue)]
        init: bool,
    },
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct OrganizeArgs {
    /// Directory to organize (defaults to the desktop)
    pub directory: Option<PathBuf>,

    /// List planned moves without touching any file
    #[arg(short = 'n', long = "dry-run", action = ArgAction::SetTrue)]
    pub dry_run: bool,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Directory to scan (defaults to the system root)
    pub root: Option<PathBuf>,

    /// Only report files larger than this (e.g. "100MB", "1.5GB")
    #[arg(long = "min-size")]
    pub min_size: Option<String>,

    /// Number of files to report
    #[arg(short = 'k', long = "top")]
    pub top: Option<usize>,

    /// Directory name to skip, at any depth. Can be repeated.
    #[arg(short = 'x', long = "exclude")]
    pub exclude: Vec<String>,

    /// Do not skip the built-in system directory names
    #[arg(long = "no-default-excludes", action = ArgAction::SetTrue)]
    pub no_default_excludes: bool,

    /// Give up after this many seconds
    #[arg(long = "timeout")]
    pub timeout: Option<u64>,

    /// Print results as JSON
    #[arg(long = "json", action = ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct DeleteArgs {
    /// Files to delete
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Move to the trash instead of deleting permanently
    #[arg(long = "trash", action = ArgAction::SetTrue)]
    pub trash: bool,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate the arguments and return any errors
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::Scan(scan) => scan.validate(),
            _ => Ok(()),
        }
    }
}

/// Parse a size string (e.g., "5MB", "100KB") into bytes
pub fn parse_size(size_str: &str) -> Option<u64> {
    let size_str = size_str.trim().to_uppercase();

    // Extract numeric part and suffix
    let (num_str, suffix) = if size_str.ends_with("TB") {
        (&size_str[..size_str.len() - 2], "TB")
    } else if size_str.ends_with("GB") {
        (&size_str[..size_str.len() - 2], "GB")
    } else if size_str.ends_with("MB") {
        (&size_str[..size_str.len() - 2], "MB")
    } else if size_str.ends_with("KB") {
        (&size_str[..size_str.len() - 2], "KB")
    } else if size_str.ends_with('B') {
        (&size_str[..size_str.len() - 1], "B")
    } else {
        // Assume bytes if no suffix
        (size_str.as_str(), "B")
    };

    let num: f64 = num_str.trim().parse().ok()?;
    if !num.is_finite() || num < 0.0 {
        return None;
    }

    let multiplier: u64 = match suffix {
        "TB" => 1024 * 1024 * 1024 * 1024,
        "GB" => 1024 * 1024 * 1024,
        "MB" => 1024 * 1024,
        "KB" => 1024,
        _ => 1,
    };

    Some((num * multiplier as f64) as u64)
}

impl ScanArgs {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(ref min) = self.min_size {
            if parse_size(min).is_none() {
                return Err(format!(
                    "Invalid min-size format: '{}'. Use format like '5MB', '100KB', '1GB'",
                    min
                ));
            }
        }

        if self.top == Some(0) {
            return Err("--top must be at least 1".to_string());
        }

        Ok(())
    }

    /// Excluded directory names after merging flags with the configured set
    pub fn excluded_names(&self, defaults: &ScanDefaults) -> Vec<String> {
        let mut names = if self.no_default_excludes {
            Vec::new()
        } else {
            defaults.excluded_names.clone()
        };
        for name in &self.exclude {
            if !names.contains(name) {
                names.push(name.clone());
            }
        }
        names
    }

    /// Builds the scan request; flags win over configured defaults
    pub fn to_request(&self, defaults: &ScanDefaults) -> Result<ScanRequest, ScanError> {
        let root = self.root.clone().unwrap_or_else(|| defaults.root.clone());
        let min_size = match &self.min_size {
            Some(s) => parse_size(s)
                .ok_or_else(|| ScanError::InvalidRequest(format!("invalid size: {}", s)))?,
            None => defaults.min_size_bytes,
        };
        let top_k = self.top.unwrap_or(defaults.top_k);

        let mut request = ScanRequest::new(root, min_size, self.excluded_names(defaults), top_k)?;
        if let Some(secs) = self.timeout.or(defaults.time_budget_secs) {
            request = request.with_time_budget(Duration::from_secs(secs));
        }
        Ok(request)
    }
}
