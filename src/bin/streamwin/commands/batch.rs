use crate::cli::BatchArgs;
use crate::exit_codes;
use crate::output::{self, WindowRun};
use crate::params;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use stream_window::{reader, StreamConfig, WindowPair, WindowStream};

/// Outcome of one file in a batch
enum FileOutcome {
    Done(WindowRun),
    Failed(String),
    Skipped,
}

pub fn execute(args: BatchArgs) -> i32 {
    let files = match resolve_files(&args) {
        Ok(f) => f,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    if files.is_empty() {
        eprintln!("Error: No matching files found");
        return exit_codes::INPUT_ERROR;
    }

    if args.dry_run {
        for f in &files {
            println!("{}", f);
        }
        if !args.quiet {
            eprintln!("Found {} file(s)", files.len());
        }
        return exit_codes::SUCCESS;
    }

    let config = match params::resolve_config(&args.options) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };
    if let Err(msg) = params::validate_config(&config) {
        eprintln!("Error: {}", msg);
        return exit_codes::INPUT_ERROR;
    }

    if let Some(ref dir) = args.output_dir {
        if let Err(e) = std::fs::create_dir_all(dir) {
            eprintln!("Error: Failed to create output directory '{}': {}", dir, e);
            return exit_codes::EXECUTION_ERROR;
        }
    }

    let total = files.len();
    let start_time = Instant::now();
    let abort = AtomicBool::new(false);

    let outcomes: Vec<FileOutcome> = files
        .par_iter()
        .map(|file_path| {
            if abort.load(Ordering::Relaxed) {
                return FileOutcome::Skipped;
            }
            match window_file(file_path, &config) {
                Ok(run) => FileOutcome::Done(run),
                Err(msg) => {
                    if !args.continue_on_error {
                        abort.store(true, Ordering::Relaxed);
                    }
                    FileOutcome::Failed(msg)
                }
            }
        })
        .collect();

    let mut succeeded = 0usize;
    let mut failed = 0usize;

    for (i, (file_path, outcome)) in files.iter().zip(outcomes).enumerate() {
        let run = match outcome {
            FileOutcome::Done(run) => run,
            FileOutcome::Failed(msg) => {
                eprintln!("[{}/{}] {}: Error: {}", i + 1, total, file_path, msg);
                failed += 1;
                continue;
            }
            FileOutcome::Skipped => {
                if !args.quiet {
                    eprintln!("[{}/{}] {}: skipped", i + 1, total, file_path);
                }
                continue;
            }
        };

        if !args.quiet {
            eprintln!(
                "[{}/{}] {}: {} windows",
                i + 1,
                total,
                file_path,
                run.stats.windows_emitted
            );
        }

        match write_run(&run, file_path, &args) {
            Ok(()) => succeeded += 1,
            Err(msg) => {
                eprintln!("  Error writing output: {}", msg);
                failed += 1;
            }
        }
    }

    if !args.quiet {
        eprintln!(
            "Batch complete: {}/{} succeeded, {}/{} failed, {:.1}s",
            succeeded,
            total,
            failed,
            total,
            start_time.elapsed().as_secs_f64()
        );
    }

    if failed == 0 {
        exit_codes::SUCCESS
    } else if succeeded > 0 {
        exit_codes::PARTIAL_FAILURE
    } else {
        exit_codes::EXECUTION_ERROR
    }
}

fn window_file(file_path: &str, config: &StreamConfig) -> Result<WindowRun, String> {
    let items = reader::read_observations(file_path).map_err(|e| e.to_string())?;
    let mut stream = WindowStream::from_list(items, config.clone());
    let pairs: Vec<WindowPair> = stream
        .by_ref()
        .collect::<Result<_, _>>()
        .map_err(|e| e.to_string())?;
    Ok(WindowRun::new(file_path, config.clone(), stream.stats(), pairs))
}

/// `<output_dir>/<stem>_windows.json`, or one compact JSON line on stdout
fn write_run(run: &WindowRun, file_path: &str, args: &BatchArgs) -> Result<(), String> {
    match args.output_dir {
        Some(ref dir) => {
            let stem = Path::new(file_path)
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            let out_path = Path::new(dir).join(format!("{}_windows.json", stem));
            let json = output::to_json(run, args.compact)?;
            output::write_output(&json, out_path.to_str())
        }
        None => {
            let json = output::to_json(run, true)?;
            output::write_output(&json, None)
        }
    }
}

fn resolve_files(args: &BatchArgs) -> Result<Vec<String>, String> {
    if let Some(ref pattern) = args.glob {
        resolve_glob(pattern)
    } else if let Some(ref files) = args.files {
        Ok(files.clone())
    } else {
        Err("One of --glob or --files must be specified".to_string())
    }
}

fn resolve_glob(pattern: &str) -> Result<Vec<String>, String> {
    let paths = glob::glob(pattern)
        .map_err(|e| format!("Invalid glob pattern '{}': {}", pattern, e))?;

    let mut files: Vec<String> = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    if let Some(s) = path.to_str() {
                        files.push(s.to_string());
                    }
                }
            }
            Err(e) => {
                eprintln!("Warning: glob error: {}", e);
            }
        }
    }
    files.sort();
    Ok(files)
}
