// Pluggable observation sources
//
// A source only knows how to fetch its next raw item and normalize it into an
// `Observation`. Pacing, stall detection and counting belong to the `Pacer`
// that owns the source, so a new source type only implements `Source`.
//
// Current implementations:
// - List: finite in-memory sequence
// - Bounded: external iterator capped at `n_instances` labeled items
// - Channel: live feed over a tokio mpsc channel

mod bounded;
mod channel;
mod list;

use crate::error::{WindowError, WindowResult};
use crate::types::{Features, Observation};
use serde_json::Value;

pub use bounded::BoundedSource;
pub use channel::ChannelSource;
pub use list::ListSource;

/// Outcome of a single fetch
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch {
    /// Next observation
    Ready(Observation),
    /// Nothing available yet, the source is still open
    Pending,
    /// No further observations will ever arrive
    Exhausted,
}

/// Forward-only producer of observations
pub trait Source {
    /// Pull the next observation, if any
    fn fetch(&mut self) -> WindowResult<Fetch>;

    /// Remaining items, when the source knows it
    fn size_hint(&self) -> Option<usize> {
        None
    }
}

impl<S: Source + ?Sized> Source for Box<S> {
    fn fetch(&mut self) -> WindowResult<Fetch> {
        (**self).fetch()
    }

    fn size_hint(&self) -> Option<usize> {
        (**self).size_hint()
    }
}

/// Normalization of raw source items into observations
pub trait IntoObservation {
    /// Any accepted shape: scalar, feature vector or `(features, label)` pair
    fn into_observation(self) -> WindowResult<Observation>;

    /// Strict form used by stream adapters: the item must be a pair
    fn into_pair(self) -> WindowResult<Observation>
    where
        Self: Sized,
    {
        Err(WindowError::Shape(
            "expected a (features, label) pair".to_string(),
        ))
    }
}

impl IntoObservation for Observation {
    fn into_observation(self) -> WindowResult<Observation> {
        Ok(self)
    }

    fn into_pair(self) -> WindowResult<Observation> {
        Ok(self)
    }
}

impl IntoObservation for f64 {
    fn into_observation(self) -> WindowResult<Observation> {
        Ok(Observation::new(self))
    }
}

impl IntoObservation for Vec<f64> {
    fn into_observation(self) -> WindowResult<Observation> {
        Ok(Observation::new(self))
    }
}

impl IntoObservation for Features {
    fn into_observation(self) -> WindowResult<Observation> {
        Ok(Observation::new(self))
    }
}

impl<F: Into<Features>> IntoObservation for (F, f64) {
    fn into_observation(self) -> WindowResult<Observation> {
        Ok(Observation::new(self.0).with_label(self.1))
    }

    fn into_pair(self) -> WindowResult<Observation> {
        self.into_observation()
    }
}

impl<F: Into<Features>> IntoObservation for (F, Option<f64>) {
    fn into_observation(self) -> WindowResult<Observation> {
        Ok(Observation {
            features: self.0.into(),
            label: self.1,
        })
    }

    fn into_pair(self) -> WindowResult<Observation> {
        self.into_observation()
    }
}

/// JSON items: `3.5`, `[1, 2]`, `[[1, 2], 3]` or `{"x": .., "y": ..}`.
///
/// A two-element array counts as a pair only when its first element is itself
/// an array; `[1, 2]` is a two-column feature vector. Where a pair is required
/// (`into_pair`) any two-element array is split, so `[4, null]` is scalar 4
/// without a label.
impl IntoObservation for Value {
    fn into_observation(self) -> WindowResult<Observation> {
        match self {
            Value::Number(_) => Ok(Observation::new(number(&self)?)),
            Value::Array(items) if is_pair_array(&items) => Value::Array(items).into_pair(),
            Value::Array(items) => Ok(Observation::new(vector(&items)?)),
            Value::Object(_) => self.into_pair(),
            other => Err(WindowError::Shape(format!(
                "expected a number, an array of numbers or a pair, got {}",
                other
            ))),
        }
    }

    fn into_pair(self) -> WindowResult<Observation> {
        let (features, label) = match self {
            Value::Array(mut items) if items.len() == 2 => {
                let label = items.pop().unwrap_or(Value::Null);
                let features = items.pop().unwrap_or(Value::Null);
                (features, label)
            }
            Value::Object(mut map) => {
                let features = map.remove("x").ok_or_else(|| {
                    WindowError::Shape("pair object is missing the \"x\" key".to_string())
                })?;
                let label = map.remove("y").unwrap_or(Value::Null);
                (features, label)
            }
            other => {
                return Err(WindowError::Shape(format!(
                    "expected a (features, label) pair, got {}",
                    other
                )))
            }
        };

        let features = match features {
            Value::Number(_) => Features::Scalar(number(&features)?),
            Value::Array(items) => Features::Vector(vector(&items)?),
            other => {
                return Err(WindowError::Shape(format!(
                    "pair features must be a number or an array, got {}",
                    other
                )))
            }
        };
        let label = match label {
            Value::Null => None,
            Value::Number(_) => Some(number(&label)?),
            other => {
                return Err(WindowError::Shape(format!(
                    "pair label must be a number or null, got {}",
                    other
                )))
            }
        };

        Ok(Observation { features, label })
    }
}

fn is_pair_array(items: &[Value]) -> bool {
    items.len() == 2 && items[0].is_array()
}

fn number(value: &Value) -> WindowResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| WindowError::Shape(format!("expected a number, got {}", value)))
}

fn vector(items: &[Value]) -> WindowResult<Vec<f64>> {
    items.iter().map(number).collect()
}
