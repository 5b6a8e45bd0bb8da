// External iterator capped at `n_instances` items
//
// Every item must decompose as a (features, label) pair; the label itself may
// be absent.

use super::{Fetch, IntoObservation, Source};
use crate::error::WindowResult;
use std::iter::Take;

pub struct BoundedSource<I: Iterator> {
    inner: Take<I>,
    n_instances: usize,
}

impl<I> BoundedSource<I>
where
    I: Iterator,
    I::Item: IntoObservation,
{
    pub fn new<T: IntoIterator<IntoIter = I>>(iter: T, n_instances: usize) -> Self {
        Self {
            inner: iter.into_iter().take(n_instances),
            n_instances,
        }
    }

    pub fn n_instances(&self) -> usize {
        self.n_instances
    }
}

impl<I> Source for BoundedSource<I>
where
    I: Iterator,
    I::Item: IntoObservation,
{
    fn fetch(&mut self) -> WindowResult<Fetch> {
        match self.inner.next() {
            Some(item) => item.into_pair().map(Fetch::Ready),
            None => Ok(Fetch::Exhausted),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        self.inner.size_hint().1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caps_at_n_instances() {
        let pairs = (0..).map(|i| (vec![i as f64], Some(i as f64 * 2.0)));
        let mut source = BoundedSource::new(pairs, 3);
        for _ in 0..3 {
            assert!(matches!(source.fetch().unwrap(), Fetch::Ready(_)));
        }
        assert_eq!(source.fetch().unwrap(), Fetch::Exhausted);
    }

    #[test]
    fn test_rejects_unpaired_items() {
        let mut source = BoundedSource::new(vec![1.0_f64, 2.0], 10);
        assert!(source.fetch().is_err());
    }

    #[test]
    fn test_json_pairs() {
        let items = vec![serde_json::json!([[1, 2], 0.5]), serde_json::json!(3)];
        let mut source = BoundedSource::new(items, 10);
        match source.fetch().unwrap() {
            Fetch::Ready(obs) => assert_eq!(obs.label, Some(0.5)),
            other => panic!("unexpected fetch: {:?}", other),
        }
        assert!(source.fetch().is_err());
    }
}
