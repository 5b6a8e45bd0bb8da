use crate::cli::StreamOptions;
use stream_window::StreamConfig;

/// Load the base config (explicit file, else the default location, else
/// built-in defaults) and apply command-line overrides.
pub fn resolve_config(options: &StreamOptions) -> Result<StreamConfig, String> {
    let mut config = match &options.config {
        Some(path) => StreamConfig::load(path)
            .map_err(|e| format!("Failed to load config '{}': {}", path, e))?,
        None => StreamConfig::load_default()
            .map_err(|e| format!("Failed to load default config: {}", e))?
            .unwrap_or_default(),
    };

    if let Some(past_history) = options.past_history {
        config.window.past_history = past_history;
    }
    if let Some(horizon) = options.horizon {
        config.window.forecasting_horizon = horizon;
    }
    if let Some(shift) = options.shift {
        config.window.shift = shift;
    }
    if let Some(ref selector) = options.input_idx {
        config.window.input = selector.clone();
    }
    if let Some(ref selector) = options.target_idx {
        config.window.target = selector.clone();
    }
    if let Some(source) = options.target_source {
        config.window.target_source = source.into();
    }
    if let Some(period) = options.stream_period {
        config.pacing.stream_period_ms = period;
    }
    if let Some(timeout) = options.timeout {
        config.pacing.timeout_ms = timeout;
    }
    if let Some(n_instances) = options.n_instances {
        config.n_instances = n_instances;
    }

    Ok(config)
}

/// Validate window capacities up front so a bad flag fails before any I/O
pub fn validate_config(config: &StreamConfig) -> Result<(), String> {
    config.window.validate().map_err(|e| e.to_string())
}
