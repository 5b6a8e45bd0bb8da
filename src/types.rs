use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};

/// Feature part of an observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Features {
    /// Single-feature observation
    Scalar(f64),
    /// Ordered feature vector
    Vector(Vec<f64>),
}

impl Features {
    pub fn is_vector(&self) -> bool {
        matches!(self, Features::Vector(_))
    }

    /// Number of feature columns (1 for a scalar)
    pub fn width(&self) -> usize {
        match self {
            Features::Scalar(_) => 1,
            Features::Vector(values) => values.len(),
        }
    }

    /// Shape-uniform view: scalars become a 1-element vector
    pub fn to_vec(&self) -> Vec<f64> {
        match self {
            Features::Scalar(value) => vec![*value],
            Features::Vector(values) => values.clone(),
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Features::Scalar(_) => "scalar".to_string(),
            Features::Vector(values) => format!("vector of {}", values.len()),
        }
    }
}

impl From<f64> for Features {
    fn from(value: f64) -> Self {
        Features::Scalar(value)
    }
}

impl From<Vec<f64>> for Features {
    fn from(values: Vec<f64>) -> Self {
        Features::Vector(values)
    }
}

/// One normalized unit pulled from a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub features: Features,
    #[serde(default)]
    pub label: Option<f64>,
}

impl Observation {
    pub fn new(features: impl Into<Features>) -> Self {
        Self {
            features: features.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: f64) -> Self {
        self.label = Some(label);
        self
    }
}

/// A completed window, oldest step first.
///
/// Single-feature streams emit bare scalars per step; multi-feature streams
/// keep one vector per step. Both serialize as plain JSON arrays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Window {
    Flat(Vec<f64>),
    Nested(Vec<Vec<f64>>),
}

impl Window {
    /// Number of time steps in the window
    pub fn len(&self) -> usize {
        match self {
            Window::Flat(steps) => steps.len(),
            Window::Nested(steps) => steps.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Features per step
    pub fn width(&self) -> usize {
        match self {
            Window::Flat(_) => 1,
            Window::Nested(steps) => steps.first().map(|s| s.len()).unwrap_or(0),
        }
    }

    /// Step-wise vectors regardless of flattening
    pub fn steps(&self) -> Vec<Vec<f64>> {
        match self {
            Window::Flat(steps) => steps.iter().map(|v| vec![*v]).collect(),
            Window::Nested(steps) => steps.clone(),
        }
    }

    /// Dense `[steps × features]` matrix for numeric consumers
    pub fn to_matrix(&self) -> DMatrix<f64> {
        match self {
            Window::Flat(steps) => DMatrix::from_column_slice(steps.len(), 1, steps),
            Window::Nested(steps) => {
                let flat: Vec<f64> = steps.iter().flatten().copied().collect();
                DMatrix::from_row_slice(steps.len(), self.width(), &flat)
            }
        }
    }
}

/// One emission of the window stream.
///
/// An absent side is `None` (serialized as `null`), never omitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowPair {
    #[serde(rename = "x")]
    pub input: Option<Window>,
    #[serde(rename = "y")]
    pub target: Option<Window>,
}

/// Lifecycle of a pacer
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PacerState {
    /// Created, nothing pulled yet
    Init,
    /// First pull happened
    Running,
    /// Terminal: exhausted, stalled, failed or stopped by the consumer
    Stopped,
}

impl Default for PacerState {
    fn default() -> Self {
        Self::Init
    }
}

/// Statistics about a window stream
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StreamStats {
    pub observations: usize,
    pub windows_emitted: usize,
    pub targets_emitted: usize,
    pub elapsed_ms: u64,
    pub state: PacerState,
}
