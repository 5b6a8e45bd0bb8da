// Throttled pull loop around a `Source`
//
// The pacer owns everything time-related: the minimum period between two
// emitted observations, stall detection while a live source has nothing
// ready, and the observation count that drives the window shift policy.

use crate::config::PacingConfig;
use crate::error::{WindowError, WindowResult};
use crate::source::{Fetch, Source};
use crate::types::{Observation, PacerState};
use std::time::{Duration, Instant};

/// Called once when the pacer stops, with the number of observations consumed
pub type StopHook = Box<dyn FnMut(usize) + Send>;

pub struct Pacer<S> {
    source: S,
    config: PacingConfig,
    state: PacerState,
    started_at: Option<Instant>,
    stopped_at: Option<Instant>,
    last_emit: Option<Instant>,
    count: usize,
    on_stop: Option<StopHook>,
}

impl<S: Source> Pacer<S> {
    pub fn new(source: S, config: PacingConfig) -> Self {
        Self {
            source,
            config,
            state: PacerState::Init,
            started_at: None,
            stopped_at: None,
            last_emit: None,
            count: 0,
            on_stop: None,
        }
    }

    /// Install a hook fired on the first `stop()`
    pub fn with_stop_hook(mut self, hook: impl FnMut(usize) + Send + 'static) -> Self {
        self.on_stop = Some(Box::new(hook));
        self
    }

    pub fn set_stop_hook(&mut self, hook: StopHook) {
        self.on_stop = Some(hook);
    }

    /// Next observation, `Ok(None)` once the source is exhausted.
    ///
    /// Blocks for the rest of `stream_period` since the previous emission, and
    /// while the source is pending. Stalls and source errors stop the pacer.
    pub fn next(&mut self) -> WindowResult<Option<Observation>> {
        match self.state {
            PacerState::Stopped => return Ok(None),
            PacerState::Init => {
                self.started_at = Some(Instant::now());
                self.state = PacerState::Running;
                log::debug!(
                    "Pacer running (period {}ms, timeout {}ms)",
                    self.config.stream_period_ms,
                    self.config.timeout_ms
                );
            }
            PacerState::Running => {}
        }

        self.wait_for_period();

        loop {
            let fetched = match self.source.fetch() {
                Ok(fetched) => fetched,
                Err(e) => {
                    log::error!("Source failed after {} observations: {}", self.count, e);
                    self.stop();
                    return Err(e);
                }
            };

            match fetched {
                Fetch::Ready(observation) => {
                    self.count += 1;
                    self.last_emit = Some(Instant::now());
                    return Ok(Some(observation));
                }
                Fetch::Exhausted => {
                    log::info!("Source exhausted after {} observations", self.count);
                    self.stop();
                    return Ok(None);
                }
                Fetch::Pending => {
                    let idle = self.idle_time();
                    if idle > self.config.timeout() {
                        log::warn!(
                            "Stream stalled: nothing new for {}ms (timeout {}ms)",
                            idle.as_millis(),
                            self.config.timeout_ms
                        );
                        self.stop();
                        return Err(WindowError::Stall {
                            idle_ms: idle.as_millis() as u64,
                            timeout_ms: self.config.timeout_ms,
                        });
                    }
                    let remaining = self.config.timeout().saturating_sub(idle);
                    let backoff = self
                        .config
                        .poll_interval()
                        .min(remaining)
                        .max(Duration::from_millis(1));
                    std::thread::sleep(backoff);
                }
            }
        }
    }

    /// Transition to `Stopped`; only the first call fires the stop hook
    pub fn stop(&mut self) {
        if self.state == PacerState::Stopped {
            return;
        }
        self.state = PacerState::Stopped;
        self.stopped_at = Some(Instant::now());
        log::info!("Pacer stopped after {} observations", self.count);
        if let Some(mut hook) = self.on_stop.take() {
            hook(self.count);
        }
    }

    /// Observations produced so far (1-based cursor of the last one)
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn state(&self) -> PacerState {
        self.state
    }

    /// Time from the first pull until the stop, or until now while running
    pub fn elapsed(&self) -> Duration {
        match (self.started_at, self.stopped_at) {
            (Some(start), Some(stop)) => stop.saturating_duration_since(start),
            (Some(start), None) => start.elapsed(),
            (None, _) => Duration::ZERO,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    fn wait_for_period(&self) {
        let period = self.config.stream_period();
        if period.is_zero() {
            return;
        }
        if let Some(last) = self.last_emit {
            let since = last.elapsed();
            if since < period {
                std::thread::sleep(period - since);
            }
        }
    }

    fn idle_time(&self) -> Duration {
        self.last_emit
            .or(self.started_at)
            .map(|t| t.elapsed())
            .unwrap_or_default()
    }
}
