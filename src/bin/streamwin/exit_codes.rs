use stream_window::WindowError;

pub const SUCCESS: i32 = 0;
pub const EXECUTION_ERROR: i32 = 1;
pub const INPUT_ERROR: i32 = 2;
pub const PARTIAL_FAILURE: i32 = 3;

/// Input problems (bad config, bad data) vs runtime failures (stall, IO)
pub fn for_error(error: &WindowError) -> i32 {
    match error {
        WindowError::InvalidConfig(_)
        | WindowError::SelectorOutOfRange { .. }
        | WindowError::Shape(_)
        | WindowError::ShapeMismatch { .. } => INPUT_ERROR,
        _ => EXECUTION_ERROR,
    }
}
