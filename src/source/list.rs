// Finite in-memory source
//
// Items are normalized lazily, so a malformed element surfaces as an error at
// the pull that reaches it rather than when the source is built.

use super::{Fetch, IntoObservation, Source};
use crate::error::WindowResult;

pub struct ListSource<T> {
    items: std::vec::IntoIter<T>,
    total: usize,
}

impl<T: IntoObservation> ListSource<T> {
    pub fn new(items: Vec<T>) -> Self {
        let total = items.len();
        Self {
            items: items.into_iter(),
            total,
        }
    }

    /// Length of the underlying sequence
    pub fn total(&self) -> usize {
        self.total
    }
}

impl<T: IntoObservation> Source for ListSource<T> {
    fn fetch(&mut self) -> WindowResult<Fetch> {
        match self.items.next() {
            Some(item) => item.into_observation().map(Fetch::Ready),
            None => Ok(Fetch::Exhausted),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

impl<T: IntoObservation> From<Vec<T>> for ListSource<T> {
    fn from(items: Vec<T>) -> Self {
        Self::new(items)
    }
}
