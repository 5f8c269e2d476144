use tidydesk::cli::{Args, Command, DeleteArgs, OrganizeArgs, ScanArgs};
use tidydesk::config::UserConfig;
use tidydesk::error::{Result, ScanError, TidyError};
use tidydesk::file_actions::{delete_file, reveal_in_file_manager, DeleteMode};
use tidydesk::logging::init_logging;
use tidydesk::organizer::{DirectoryOrganizer, UndoJournal};
use tidydesk::scan::{LargeFileScanner, ScanCompletion, ScanHandle, ScanResult};

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How often the foreground reports that a scan is still going
const HEARTBEAT: Duration = Duration::from_secs(5);

fn main() -> ExitCode {
    // Parse command line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    init_logging(args.verbose);

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let config_path = args.config.clone().or_else(UserConfig::config_path);
    let config = match &config_path {
        Some(path) => UserConfig::load_from(path)?,
        None => {
            warn!("could not determine config directory, using defaults");
            UserConfig::default()
        }
    };

    match &args.command {
        Command::Organize(org) => run_organize(org, &config),
        Command::Undo => run_undo(&config),
        Command::Scan(scan) => run_scan(scan, &config),
        Command::Delete(delete) => run_delete(delete, &config),
        Command::Reveal { path } => {
            reveal_in_file_manager(path)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config { init } => run_config(*init, config_path, &config),
    }
}

fn open_organizer(config: &UserConfig) -> Result<DirectoryOrganizer> {
    let journal_path = config
        .organizer
        .journal_path
        .clone()
        .or_else(UndoJournal::default_path);

    let organizer = match journal_path {
        Some(path) => DirectoryOrganizer::with_journal(UndoJournal::new(path))?,
        None => {
            warn!("no data directory available, undo history will not be kept");
            DirectoryOrganizer::new()
        }
    };

    Ok(organizer.with_skip_extensions(&config.organizer.skip_extensions))
}

fn run_organize(args: &OrganizeArgs, config: &UserConfig) -> Result<ExitCode> {
    let source = args
        .directory
        .clone()
        .or_else(|| config.organizer_source())
        .ok_or_else(|| {
            TidyError::ConfigError("Could not determine the desktop directory".to_string())
        })?;

    let mut organizer = open_organizer(config)?;

    if args.dry_run {
        let planned = organizer.plan(&source)?;
        println!("[DRY RUN] {} files would be moved", planned.len());
        for item in &planned {
            println!("   {:<12} <- {}", item.category, item.source.display());
        }
        return Ok(ExitCode::SUCCESS);
    }

    let moved = organizer.organize(&source)?;
    println!("Organized {} files in {}", moved, source.display());
    Ok(ExitCode::SUCCESS)
}

fn run_undo(config: &UserConfig) -> Result<ExitCode> {
    let mut organizer = open_organizer(config)?;
    if organizer.history().is_empty() {
        println!("Nothing to undo");
        return Ok(ExitCode::SUCCESS);
    }

    let restored = organizer.undo()?;
    println!("Restored {} files", restored);
    Ok(ExitCode::SUCCESS)
}

fn run_scan(args: &ScanArgs, config: &UserConfig) -> Result<ExitCode> {
    let request = args.to_request(&config.scan)?;

    let runtime = tokio::runtime::Runtime::new()?;
    let mut scanner = LargeFileScanner::new(runtime.handle().clone());
    let handle = scanner.start_scan(request)?;

    let completion = runtime.block_on(await_completion(&mut scanner, &handle));

    let outcome = match completion {
        Some(completion) => completion.outcome,
        None => Err(ScanError::WorkerFailed("no completion received".to_string())),
    };

    match outcome {
        Ok(result) => {
            print_results(&result, args.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(ScanError::Cancelled) => {
            eprintln!("Scan cancelled");
            Ok(ExitCode::from(130))
        }
        Err(e) => Err(e.into()),
    }
}

/// Foreground loop: stays responsive to Ctrl-C while the walk runs
async fn await_completion(
    scanner: &mut LargeFileScanner,
    handle: &ScanHandle,
) -> Option<ScanCompletion> {
    let started = Instant::now();
    let mut heartbeat = tokio::time::interval(HEARTBEAT);
    heartbeat.tick().await;

    loop {
        tokio::select! {
            finished = scanner.wait() => {
                finished?;
                return scanner.take_outcome();
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Cancelling scan...");
                scanner.cancel(handle);
            }
            _ = heartbeat.tick() => {
                info!(elapsed_secs = started.elapsed().as_secs(), "still scanning");
            }
        }
    }
}

fn print_results(result: &ScanResult, json: bool) -> Result<()> {
    if json {
        let out = serde_json::to_string_pretty(result)
            .map_err(|e| TidyError::ConfigError(format!("Failed to serialize results: {}", e)))?;
        println!("{}", out);
        return Ok(());
    }

    if result.is_empty() {
        println!("No files above the size threshold");
    } else {
        for (i, file) in result.files.iter().enumerate() {
            println!(
                "{:>3}. {:>10.2} MB  {}",
                i + 1,
                file.size_mb(),
                file.path.display()
            );
        }
    }

    let stats = &result.stats;
    println!(
        "\n{} files examined, {} skipped, {} directories pruned in {:.1}s",
        stats.files_examined,
        stats.skipped_total(),
        stats.dirs_pruned,
        stats.elapsed.as_secs_f64()
    );
    Ok(())
}

fn run_delete(args: &DeleteArgs, config: &UserConfig) -> Result<ExitCode> {
    let mode = if args.trash || config.delete_to_trash {
        DeleteMode::Trash
    } else {
        DeleteMode::Permanent
    };

    let mut failed = 0;
    for path in &args.paths {
        match delete_file(path, mode) {
            Ok(()) => println!("Deleted {}", path.display()),
            Err(e) => {
                eprintln!("Error: {}", e);
                failed += 1;
            }
        }
    }

    Ok(if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_config(init: bool, path: Option<PathBuf>, config: &UserConfig) -> Result<ExitCode> {
    match &path {
        Some(path) if init && !path.exists() => {
            config.save_to(path)?;
            println!("Wrote defaults to {}", path.display());
        }
        Some(path) => println!("# {}", path.display()),
        None => println!("# (no config directory)"),
    }

    let out = serde_json::to_string_pretty(config)
        .map_err(|e| TidyError::ConfigError(format!("Failed to serialize config: {}", e)))?;
    println!("{}", out);
    Ok(ExitCode::SUCCESS)
}
