use crate::cli::{ConfigArgs, StreamOptions};
use crate::exit_codes;
use crate::output;
use crate::params;
use stream_window::config::default_config_path;

pub fn execute(args: ConfigArgs) -> i32 {
    let options = StreamOptions {
        config: args.config.clone(),
        ..StreamOptions::default()
    };
    let config = match params::resolve_config(&options) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::INPUT_ERROR;
        }
    };

    let json = match output::to_json(&config, false) {
        Ok(j) => j,
        Err(msg) => {
            eprintln!("Error: {}", msg);
            return exit_codes::EXECUTION_ERROR;
        }
    };

    if !args.json {
        let source = match (&args.config, default_config_path()) {
            (Some(path), _) => path.clone(),
            (None, Some(path)) if path.is_file() => path.display().to_string(),
            _ => "built-in defaults".to_string(),
        };
        println!("Config source: {}", source);
        if let Some(path) = default_config_path() {
            println!("Default config path: {}", path.display());
        }
        if let Err(msg) = config.window.validate() {
            println!("Warning: {}", msg);
        }
    }

    if let Err(e) = output::write_output(&json, None) {
        eprintln!("Error: {}", e);
        return exit_codes::EXECUTION_ERROR;
    }

    exit_codes::SUCCESS
}
