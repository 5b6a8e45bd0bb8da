//! Sliding-window transformer.
//!
//! Turns a flat observation stream into `(input, target)` window pairs. The
//! transformer is a pure function of the observations and cursors it is fed:
//! it owns two bounded FIFO buffers and never looks at time or at the source.
//!
//! # Ordering
//!
//! For each observation with 1-based cursor `c`:
//!
//! 1. the input selection is appended to the input buffer;
//! 2. once `c >= past_history + shift`, the target selection of the same
//!    observation is appended to the target buffer;
//! 3. a full input buffer is copied out and its oldest step evicted;
//! 4. a full target buffer is copied out and its oldest step evicted.
//!
//! With `data = 1..=9`, `past_history = 4`, `forecasting_horizon = 2`,
//! `shift = 1` the inputs are `[1,2,3,4] .. [6,7,8,9]` and the targets
//! `[5,6] .. [8,9]`.

use crate::config::{TargetSource, WindowConfig};
use crate::error::{WindowError, WindowResult};
use crate::selector::FeatureSelector;
use crate::types::{Features, Observation, Window, WindowPair};
use std::collections::VecDeque;

/// Stream shape fixed by the first observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Shape {
    multi_feature: bool,
    width: usize,
}

impl Shape {
    fn of(features: &Features) -> Self {
        Self {
            multi_feature: features.is_vector(),
            width: features.width(),
        }
    }

    fn describe(&self) -> String {
        if self.multi_feature {
            format!("vector of {}", self.width)
        } else {
            "scalar".to_string()
        }
    }
}

pub struct WindowTransformer {
    config: WindowConfig,
    x_window: VecDeque<Vec<f64>>,
    y_window: VecDeque<Vec<f64>>,
    shape: Option<Shape>,
    emitted: usize,
}

impl WindowTransformer {
    /// Buffers start empty; the config is checked on the first ingest, once
    /// the data shape is known.
    pub fn new(config: WindowConfig) -> Self {
        let x_capacity = config.past_history;
        let y_capacity = config.forecasting_horizon;
        Self {
            config,
            x_window: VecDeque::with_capacity(x_capacity),
            y_window: VecDeque::with_capacity(y_capacity),
            shape: None,
            emitted: 0,
        }
    }

    /// Feed one observation; `cursor` counts observations consumed so far,
    /// including this one.
    pub fn ingest(&mut self, observation: &Observation, cursor: usize) -> WindowResult<WindowPair> {
        let shape = self.check_shape(&observation.features)?;
        let row = observation.features.to_vec();

        let x_step = self.config.input.apply(&row)?;
        let y_step = if cursor >= self.config.target_start() {
            Some(self.target_step(observation, &row)?)
        } else {
            None
        };

        self.x_window.push_back(x_step);
        if let Some(step) = y_step {
            self.y_window.push_back(step);
        }

        let input = slide(&mut self.x_window, self.config.past_history, shape.multi_feature);
        let target = slide(
            &mut self.y_window,
            self.config.forecasting_horizon,
            shape.multi_feature,
        );

        if input.is_some() {
            self.emitted += 1;
            log::trace!(
                "cursor {}: input window ready (target {})",
                cursor,
                if target.is_some() { "ready" } else { "pending" }
            );
        }

        Ok(WindowPair { input, target })
    }

    /// Steps buffered toward the next input window
    pub fn buffered(&self) -> usize {
        self.x_window.len()
    }

    /// True while the input buffer holds steps that were never part of an
    /// emitted window
    pub fn is_mid_fill(&self) -> bool {
        self.emitted == 0 && !self.x_window.is_empty()
    }

    /// Input windows produced so far
    pub fn emitted(&self) -> usize {
        self.emitted
    }

    /// `None` until the first observation fixed the shape
    pub fn is_multi_feature(&self) -> Option<bool> {
        self.shape.map(|s| s.multi_feature)
    }

    pub fn config(&self) -> &WindowConfig {
        &self.config
    }

    fn check_shape(&mut self, features: &Features) -> WindowResult<Shape> {
        match self.shape {
            Some(shape) => {
                let found = Shape::of(features);
                if found != shape {
                    return Err(WindowError::ShapeMismatch {
                        expected: shape.describe(),
                        found: features.describe(),
                    });
                }
                Ok(shape)
            }
            None => {
                self.config.validate()?;
                let shape = Shape::of(features);
                if shape.multi_feature && shape.width == 0 {
                    return Err(WindowError::Shape(
                        "observation has an empty feature vector".to_string(),
                    ));
                }
                self.config.input.validate(shape.width)?;
                if self.config.target_source == TargetSource::Features {
                    self.config.target.validate(shape.width)?;
                }
                if !shape.multi_feature {
                    for selector in [&self.config.input, &self.config.target] {
                        if let FeatureSelector::Subset(indices) = selector {
                            if indices.len() > 1 {
                                return Err(WindowError::InvalidConfig(format!(
                                    "subset {} selects several columns from a single-feature stream",
                                    selector
                                )));
                            }
                        }
                    }
                }
                log::debug!(
                    "Window stream shape fixed: {} (past_history {}, horizon {}, shift {})",
                    shape.describe(),
                    self.config.past_history,
                    self.config.forecasting_horizon,
                    self.config.shift
                );
                self.shape = Some(shape);
                Ok(shape)
            }
        }
    }

    fn target_step(&self, observation: &Observation, row: &[f64]) -> WindowResult<Vec<f64>> {
        match self.config.target_source {
            TargetSource::Features => self.config.target.apply(row),
            TargetSource::Label => {
                let label = observation.label.ok_or_else(|| {
                    WindowError::Shape("target source is the label but it is absent".to_string())
                })?;
                self.config.target.apply(&[label])
            }
        }
    }
}

/// Copy out a full buffer, evict its oldest step, and flatten single-feature
/// steps to bare scalars.
fn slide(buffer: &mut VecDeque<Vec<f64>>, capacity: usize, multi_feature: bool) -> Option<Window> {
    if buffer.len() != capacity {
        return None;
    }

    let window = if multi_feature {
        Window::Nested(buffer.iter().cloned().collect())
    } else {
        Window::Flat(buffer.iter().filter_map(|step| step.first().copied()).collect())
    };
    buffer.pop_front();
    Some(window)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(config: WindowConfig, data: Vec<Observation>) -> Vec<WindowPair> {
        let mut transformer = WindowTransformer::new(config);
        data.iter()
            .enumerate()
            .map(|(i, obs)| transformer.ingest(obs, i + 1).unwrap())
            .collect()
    }

    fn scalars(range: std::ops::RangeInclusive<i32>) -> Vec<Observation> {
        range.map(|v| Observation::new(v as f64)).collect()
    }

    #[test]
    fn test_first_windows_are_absent() {
        let pairs = run(WindowConfig::new(4, 2), scalars(1..=9));
        assert!(pairs[..3].iter().all(|p| p.input.is_none()));
        assert_eq!(pairs[3].input, Some(Window::Flat(vec![1.0, 2.0, 3.0, 4.0])));
        // shift 1: target starts filling at cursor 5, first full at 6
        assert!(pairs[4].target.is_none());
        assert_eq!(pairs[5].target, Some(Window::Flat(vec![5.0, 6.0])));
    }

    #[test]
    fn test_buffers_never_exceed_capacity() {
        let mut transformer = WindowTransformer::new(WindowConfig::new(3, 2));
        for (i, obs) in scalars(1..=20).iter().enumerate() {
            transformer.ingest(obs, i + 1).unwrap();
            assert!(transformer.buffered() < 3);
        }
        assert_eq!(transformer.emitted(), 18);
    }

    #[test]
    fn test_mid_fill_only_before_first_window() {
        let mut transformer = WindowTransformer::new(WindowConfig::new(3, 1));
        assert!(!transformer.is_mid_fill());
        transformer.ingest(&Observation::new(1.0), 1).unwrap();
        assert!(transformer.is_mid_fill());
        transformer.ingest(&Observation::new(2.0), 2).unwrap();
        transformer.ingest(&Observation::new(3.0), 3).unwrap();
        assert!(!transformer.is_mid_fill());
    }

    #[test]
    fn test_shift_zero_starts_target_with_first_input() {
        let pairs = run(WindowConfig::new(3, 1).with_shift(0), scalars(1..=5));
        assert_eq!(pairs[2].input, Some(Window::Flat(vec![1.0, 2.0, 3.0])));
        assert_eq!(pairs[2].target, Some(Window::Flat(vec![3.0])));
    }

    #[test]
    fn test_horizon_longer_than_history() {
        let pairs = run(WindowConfig::new(2, 5), scalars(1..=10));
        let targets: Vec<_> = pairs.iter().filter_map(|p| p.target.clone()).collect();
        assert_eq!(targets.first(), Some(&Window::Flat(vec![3.0, 4.0, 5.0, 6.0, 7.0])));
        assert_eq!(targets.len(), 4);
    }

    #[test]
    fn test_label_target_source() {
        let config = WindowConfig::new(2, 2).with_target_source(TargetSource::Label);
        let data: Vec<Observation> = (1..=5)
            .map(|v| Observation::new(vec![v as f64, 0.0]).with_label(v as f64 * 10.0))
            .collect();
        let pairs = run(config, data);
        assert_eq!(
            pairs[4].target,
            Some(Window::Nested(vec![vec![40.0], vec![50.0]]))
        );
    }

    #[test]
    fn test_missing_label_is_shape_error() {
        let config = WindowConfig::new(1, 1)
            .with_shift(0)
            .with_target_source(TargetSource::Label);
        let mut transformer = WindowTransformer::new(config);
        let err = transformer.ingest(&Observation::new(1.0), 1).unwrap_err();
        assert!(matches!(err, WindowError::Shape(_)));
    }

    #[test]
    fn test_invalid_config_fails_on_first_ingest() {
        let mut transformer = WindowTransformer::new(WindowConfig::new(0, 2));
        assert!(matches!(
            transformer.ingest(&Observation::new(1.0), 1),
            Err(WindowError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_selector_out_of_range() {
        let config = WindowConfig::new(2, 1).with_input(FeatureSelector::Single(3));
        let mut transformer = WindowTransformer::new(config);
        let err = transformer
            .ingest(&Observation::new(vec![1.0, 2.0]), 1)
            .unwrap_err();
        assert!(matches!(
            err,
            WindowError::SelectorOutOfRange { index: 3, width: 2 }
        ));
    }

    #[test]
    fn test_shape_change_is_rejected() {
        let mut transformer = WindowTransformer::new(WindowConfig::new(2, 1));
        transformer.ingest(&Observation::new(1.0), 1).unwrap();
        assert_eq!(transformer.is_multi_feature(), Some(false));
        let err = transformer
            .ingest(&Observation::new(vec![1.0, 2.0]), 2)
            .unwrap_err();
        assert!(matches!(err, WindowError::ShapeMismatch { .. }));

        let mut transformer = WindowTransformer::new(WindowConfig::new(2, 1));
        transformer.ingest(&Observation::new(vec![1.0, 2.0]), 1).unwrap();
        assert!(transformer
            .ingest(&Observation::new(vec![1.0, 2.0, 3.0]), 2)
            .is_err());
    }

    #[test]
    fn test_single_column_vector_stays_nested() {
        let data: Vec<Observation> = (1..=3).map(|v| Observation::new(vec![v as f64])).collect();
        let pairs = run(WindowConfig::new(2, 1), data);
        assert_eq!(
            pairs[1].input,
            Some(Window::Nested(vec![vec![1.0], vec![2.0]]))
        );
    }
}
