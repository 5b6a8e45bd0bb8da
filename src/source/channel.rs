// Live source fed through a tokio channel
//
// Producers (async tasks or plain threads via `blocking_send`) push raw items;
// the pacer polls with `try_recv`, so an empty channel reports `Pending` and
// lets stall detection run. The feed ends when every sender is dropped or
// after `n_instances` items.

use super::{Fetch, IntoObservation, Source};
use crate::error::WindowResult;
use tokio::sync::mpsc::{self, error::TryRecvError};

pub struct ChannelSource<T> {
    receiver: mpsc::Receiver<T>,
    n_instances: usize,
    received: usize,
}

impl<T: IntoObservation> ChannelSource<T> {
    pub fn new(receiver: mpsc::Receiver<T>, n_instances: usize) -> Self {
        Self {
            receiver,
            n_instances,
            received: 0,
        }
    }

    /// Create a connected sender/source pair
    pub fn channel(capacity: usize, n_instances: usize) -> (mpsc::Sender<T>, Self) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (tx, Self::new(rx, n_instances))
    }

    pub fn received(&self) -> usize {
        self.received
    }
}

impl<T: IntoObservation> Source for ChannelSource<T> {
    fn fetch(&mut self) -> WindowResult<Fetch> {
        if self.received >= self.n_instances {
            self.receiver.close();
            return Ok(Fetch::Exhausted);
        }

        match self.receiver.try_recv() {
            Ok(item) => {
                self.received += 1;
                item.into_observation().map(Fetch::Ready)
            }
            Err(TryRecvError::Empty) => Ok(Fetch::Pending),
            Err(TryRecvError::Disconnected) => Ok(Fetch::Exhausted),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        None
    }
}
