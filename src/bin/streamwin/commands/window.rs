use crate::cli::WindowArgs;
use crate::exit_codes;
use crate::output;
use crate::params;
use serde_json::Value;
use std::io::Write;
use std::path::Path;
use stream_window::reader;
use stream_window::{Source, StreamConfig, StreamStats, WindowError, WindowPair, WindowStream};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Marker for reading JSON lines from stdin
const STDIN: &str = "-";
const STDIN_CHANNEL_CAPACITY: usize = 1024;

struct Collected {
    stats: StreamStats,
    pairs: Vec<WindowPair>,
}

pub async fn execute(args: WindowArgs) -> i32 {
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

    if args.file != STDIN && !Path::new(&args.file).is_file() {
        eprintln!("Error: File not found: {}", args.file);
        return exit_codes::INPUT_ERROR;
    }

    if !args.quiet {
        let source = if args.file == STDIN { "stdin" } else { args.file.as_str() };
        eprintln!("Windowing {}...", source);
        eprintln!(
            "  past_history={}, horizon={}, shift={}",
            config.window.past_history, config.window.forecasting_horizon, config.window.shift
        );
        eprintln!(
            "  input={}, target={}",
            config.window.input, config.window.target
        );
    }

    // Without an output file each pair goes straight to stdout as one JSON line
    let emit_lines = args.output.is_none();
    let result = if args.file == STDIN {
        run_stdin(config.clone(), emit_lines).await
    } else {
        run_file(args.file.clone(), config.clone(), emit_lines).await
    };

    let collected = match result {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_codes::for_error(&e);
        }
    };

    if let Some(ref path) = args.output {
        let run = output::WindowRun::new(&args.file, config, collected.stats.clone(), collected.pairs);
        let json = match output::to_json(&run, args.compact) {
            Ok(j) => j,
            Err(msg) => {
                eprintln!("Error: {}", msg);
                return exit_codes::EXECUTION_ERROR;
            }
        };
        if let Err(msg) = output::write_output(&json, Some(path.as_str())) {
            eprintln!("Error: {}", msg);
            return exit_codes::EXECUTION_ERROR;
        }
    }

    if !args.quiet {
        eprintln!(
            "Done: {} windows ({} with targets) from {} observations in {}ms",
            collected.stats.windows_emitted,
            collected.stats.targets_emitted,
            collected.stats.observations,
            collected.stats.elapsed_ms
        );
        if let Some(ref path) = args.output {
            eprintln!("  Output: {}", path);
        }
    }

    exit_codes::SUCCESS
}

async fn run_file(path: String, config: StreamConfig, emit_lines: bool) -> Result<Collected, WindowError> {
    run_blocking(move || {
        let items = reader::read_observations(&path)?;
        collect(WindowStream::from_list(items, config), emit_lines)
    })
    .await
}

/// Feed stdin lines through a channel into a live window stream.
///
/// Lines that are not valid JSON are forwarded as strings so they fail at the
/// ingest that reaches them, after the windows before them were emitted.
async fn run_stdin(config: StreamConfig, emit_lines: bool) -> Result<Collected, WindowError> {
    let (tx, rx) = mpsc::channel::<Value>(STDIN_CHANNEL_CAPACITY);

    let reader_task = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    let value = match reader::parse_json_line(&line) {
                        Ok(v) => v,
                        Err(e) => {
                            log::debug!("Unparseable stdin line ({}): {}", e, line);
                            Value::String(line)
                        }
                    };
                    // receiver gone: the stream stopped or hit its cap
                    if tx.send(value).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    log::error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    });

    let stream = WindowStream::from_channel(rx, config);
    let result = run_blocking(move || collect(stream, emit_lines)).await;
    reader_task.abort();
    result
}

/// Run the blocking stream driver off the async workers
async fn run_blocking<F>(job: F) -> Result<Collected, WindowError>
where
    F: FnOnce() -> Result<Collected, WindowError> + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .map_err(|e| WindowError::Source(format!("window task failed: {}", e)))?
}

/// Drain the stream, either printing each pair or keeping them for a run document
fn collect<S: Source>(mut stream: WindowStream<S>, emit_lines: bool) -> Result<Collected, WindowError> {
    let mut pairs = Vec::new();
    let stdout = std::io::stdout();

    for pair in stream.by_ref() {
        let pair = pair?;
        if emit_lines {
            let line = serde_json::to_string(&pair)?;
            let mut handle = stdout.lock();
            writeln!(handle, "{}", line)?;
            handle.flush()?;
        } else {
            pairs.push(pair);
        }
    }

    Ok(Collected {
        stats: stream.stats(),
        pairs,
    })
}
