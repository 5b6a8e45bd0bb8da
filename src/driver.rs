//! Pull-based window stream.
//!
//! [`WindowStream`] composes a [`Pacer`] over a [`Source`] with a
//! [`WindowTransformer`]. Each call to `next()` keeps pulling observations
//! until an input window completes, then yields the pair. The stream is
//! forward-only: once it ends (exhaustion or error) it never yields again, and
//! re-iterating requires building a fresh stream.
//!
//! # Example
//!
//! ```
//! use stream_window::{StreamConfig, Window, WindowConfig, WindowStream};
//!
//! let data: Vec<f64> = (1..=9).map(f64::from).collect();
//! let config = StreamConfig::from(WindowConfig::new(4, 2));
//! let pairs: Vec<_> = WindowStream::from_list(data, config)
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! assert_eq!(pairs.len(), 6);
//! assert_eq!(pairs[0].input, Some(Window::Flat(vec![1.0, 2.0, 3.0, 4.0])));
//! assert_eq!(pairs[2].target, Some(Window::Flat(vec![5.0, 6.0])));
//! ```

use crate::config::StreamConfig;
use crate::error::{WindowError, WindowResult};
use crate::pacer::Pacer;
use crate::source::{BoundedSource, ChannelSource, IntoObservation, ListSource, Source};
use crate::transformer::WindowTransformer;
use crate::types::{StreamStats, Window, WindowPair};
use tokio::sync::mpsc;

pub struct WindowStream<S> {
    pacer: Pacer<S>,
    transformer: WindowTransformer,
    finished: bool,
    windows_emitted: usize,
    targets_emitted: usize,
}

impl<S: Source> WindowStream<S> {
    pub fn new(source: S, config: StreamConfig) -> Self {
        Self {
            pacer: Pacer::new(source, config.pacing),
            transformer: WindowTransformer::new(config.window),
            finished: false,
            windows_emitted: 0,
            targets_emitted: 0,
        }
    }

    /// Install a hook fired once when the stream stops, with the number of
    /// observations consumed. Collaborators persist their state here.
    pub fn with_stop_hook(mut self, hook: impl FnMut(usize) + Send + 'static) -> Self {
        self.pacer.set_stop_hook(Box::new(hook));
        self
    }

    /// Stop pulling; idempotent
    pub fn stop(&mut self) {
        self.finished = true;
        self.pacer.stop();
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn stats(&self) -> StreamStats {
        StreamStats {
            observations: self.pacer.count(),
            windows_emitted: self.windows_emitted,
            targets_emitted: self.targets_emitted,
            elapsed_ms: self.pacer.elapsed().as_millis() as u64,
            state: self.pacer.state(),
        }
    }

    pub fn transformer(&self) -> &WindowTransformer {
        &self.transformer
    }

    fn pull(&mut self) -> WindowResult<Option<WindowPair>> {
        loop {
            let observation = match self.pacer.next()? {
                Some(observation) => observation,
                None => {
                    if self.transformer.is_mid_fill() {
                        log::warn!(
                            "Source ended with {} buffered observation(s), fewer than one input window",
                            self.transformer.buffered()
                        );
                    }
                    return Ok(None);
                }
            };

            let pair = self.transformer.ingest(&observation, self.pacer.count())?;
            if pair.input.is_some() {
                self.windows_emitted += 1;
                if pair.target.is_some() {
                    self.targets_emitted += 1;
                }
                return Ok(Some(pair));
            }
        }
    }
}

impl<T: IntoObservation> WindowStream<ListSource<T>> {
    /// Stream over a finite in-memory sequence
    pub fn from_list(items: Vec<T>, config: StreamConfig) -> Self {
        Self::new(ListSource::new(items), config)
    }
}

impl<I> WindowStream<BoundedSource<I>>
where
    I: Iterator,
    I::Item: IntoObservation,
{
    /// Stream over an external iterator of `(features, label)` pairs, capped
    /// at `config.n_instances` items
    pub fn from_pairs<T: IntoIterator<IntoIter = I>>(iter: T, config: StreamConfig) -> Self {
        let n_instances = config.n_instances;
        Self::new(BoundedSource::new(iter, n_instances), config)
    }
}

impl<T: IntoObservation> WindowStream<ChannelSource<T>> {
    /// Stream over a live channel, capped at `config.n_instances` items
    pub fn from_channel(receiver: mpsc::Receiver<T>, config: StreamConfig) -> Self {
        let n_instances = config.n_instances;
        Self::new(ChannelSource::new(receiver, n_instances), config)
    }
}

impl<S: Source> Iterator for WindowStream<S> {
    type Item = WindowResult<WindowPair>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.pull() {
            Ok(Some(pair)) => Some(Ok(pair)),
            Ok(None) => {
                self.finished = true;
                log::info!(
                    "Window stream finished: {} windows from {} observations",
                    self.windows_emitted,
                    self.pacer.count()
                );
                None
            }
            Err(e) => {
                self.stop();
                Some(Err(e))
            }
        }
    }
}

impl<S: Source> std::iter::FusedIterator for WindowStream<S> {}

/// Consumer of emitted windows, typically an online model.
///
/// Implementations may live in-process or proxy to a worker; the stream does
/// not care.
pub trait Forecaster {
    /// Update the model with one input/target pair
    fn learn_one(&mut self, input: &Window, target: &Window) -> WindowResult<()>;

    /// Forecast the target for one input window
    fn predict_one(&mut self, input: &Window) -> WindowResult<Vec<f64>>;
}

/// Outcome of [`drive_forecaster`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriveSummary {
    pub windows: usize,
    pub learned: usize,
    /// Mean absolute error of predictions made before learning each target
    pub mean_abs_error: Option<f64>,
}

/// Predict-then-learn over every pair of the stream.
///
/// Each input window is predicted first; when its target is present the
/// prediction is scored against the target's last step and the model learns
/// the pair. The first error stops the loop and is returned.
pub fn drive_forecaster<S, F>(stream: &mut WindowStream<S>, model: &mut F) -> WindowResult<DriveSummary>
where
    S: Source,
    F: Forecaster + ?Sized,
{
    let mut summary = DriveSummary::default();
    let mut abs_error_sum = 0.0;
    let mut scored = 0usize;

    for pair in stream.by_ref() {
        let pair = pair?;
        let input = pair
            .input
            .ok_or_else(|| WindowError::Source("stream yielded a pair without input".to_string()))?;
        summary.windows += 1;

        let prediction = model.predict_one(&input)?;
        if let Some(target) = pair.target {
            let expected = target.steps().last().cloned().unwrap_or_default();
            for (p, e) in prediction.iter().zip(expected.iter()) {
                abs_error_sum += (p - e).abs();
                scored += 1;
            }
            model.learn_one(&input, &target)?;
            summary.learned += 1;
        }
    }

    if scored > 0 {
        summary.mean_abs_error = Some(abs_error_sum / scored as f64);
    }
    Ok(summary)
}
