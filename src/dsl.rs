//! Built-in worker behaviors.
//!
//! Every behavior is an ordinary [`Task`] running on the same engine; none of
//! them need special support from [`Worker`]. Workers built here carry the
//! behavior's name (`source`, `relay`, ...) in log events and errors.

use std::fmt;

use crate::config::DEFAULT_GATHERING;
use crate::error::{Error, Result};
use crate::worker::{Task, Worker};

/// A source emitting each item in order, then the end of stream forever.
///
/// Anything iterable works: vectors, ranges, `str::chars`, maps (as pairs).
pub fn source_worker<S>(items: S) -> Worker<S::Item, S::Item>
where
    S: IntoIterator,
    S::IntoIter: Send + 'static,
    S::Item: Send + 'static,
{
    source_map(items, |item| item)
}

/// A source emitting `transform(item)` for each item in order.
pub fn source_map<S, T, F>(items: S, mut transform: F) -> Worker<T, T>
where
    S: IntoIterator,
    S::IntoIter: Send + 'static,
    T: Send + 'static,
    F: FnMut(S::Item) -> T + Send + 'static,
{
    let mut items = items.into_iter();
    Worker::from_task(
        "source",
        Task::source(move |job| {
            for item in items.by_ref() {
                job.handoff(transform(item))?;
            }
            Ok(None)
        }),
    )
}

/// A source emitting whatever `generator` returns on each demand.
///
/// The first `None` ends the stream; `generator` is not called again after it.
pub fn source_fn<T, F>(mut generator: F) -> Worker<T, T>
where
    T: Send + 'static,
    F: FnMut() -> Option<T> + Send + 'static,
{
    let mut exhausted = false;
    Worker::from_task(
        "source",
        Task::source(move |_| {
            if exhausted {
                return Ok(None);
            }
            let product = generator();
            exhausted = product.is_none();
            Ok(product)
        }),
    )
}

/// Emits `transform(value)` for each upstream value.
pub fn relay_worker<I, O, F>(mut transform: F) -> Worker<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
    F: FnMut(I) -> O + Send + 'static,
{
    Worker::from_task("relay", Task::sink(move |value, _| Ok(value.map(&mut transform))))
}

/// Calls `effect` on each upstream value and emits the value unchanged.
pub fn side_worker<T, F>(mut effect: F) -> Worker<T, T>
where
    T: Send + 'static,
    F: FnMut(&T) + Send + 'static,
{
    Worker::from_task(
        "side",
        Task::sink(move |value, _| {
            if let Some(value) = &value {
                effect(value);
            }
            Ok(value)
        }),
    )
}

/// Emits only the upstream values for which `predicate` holds.
///
/// A single demand pulls as many upstream values as it takes to find one.
pub fn filter_worker<T, F>(mut predicate: F) -> Worker<T, T>
where
    T: Send + 'static,
    F: FnMut(&T) -> bool + Send + 'static,
{
    Worker::from_task(
        "filter",
        Task::sink(move |value, job| {
            let mut value = value;
            loop {
                match value {
                    Some(candidate) if !predicate(&candidate) => value = job.pull()?,
                    other => return Ok(other),
                }
            }
        }),
    )
}

type UntilFn<T> = Box<dyn FnMut(&T, &[T]) -> bool + Send>;

/// When a batch is complete.
pub enum Batch<T> {
    /// Complete once this many values are collected.
    Gathering(usize),

    /// Complete once the predicate holds for the latest value and everything
    /// collected so far (latest included).
    Until(UntilFn<T>),
}

impl<T> Batch<T> {
    #[inline]
    pub fn gathering(count: usize) -> Self {
        Self::Gathering(count)
    }

    pub fn until<F>(predicate: F) -> Self
    where
        F: FnMut(&T, &[T]) -> bool + Send + 'static,
    {
        Self::Until(Box::new(predicate))
    }

    fn is_complete(&mut self, collected: &[T]) -> bool {
        match self {
            Self::Gathering(count) => collected.len() >= *count,
            Self::Until(predicate) => collected.last().is_some_and(|latest| predicate(latest, collected)),
        }
    }
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self::Gathering(DEFAULT_GATHERING)
    }
}

impl<T> fmt::Debug for Batch<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gathering(count) => write!(f, "Batch::Gathering({count})"),
            Self::Until(_) => f.write_str("Batch::Until(..)"),
        }
    }
}

/// The batch being gathered, kept in the worker's context until it is emitted.
struct Collection<T>(Vec<T>);

/// Gathers upstream values into batches.
///
/// A batch cut short by the end of the stream is still emitted. Values
/// gathered before an upstream error stay in the batch, and gathering resumes
/// on the next demand.
///
/// # Errors
///
/// Returns a configuration error for `Batch::Gathering(0)`.
pub fn batch_worker<T>(batch: Batch<T>) -> Result<Worker<T, Vec<T>>>
where
    T: Send + 'static,
{
    if matches!(batch, Batch::Gathering(0)) {
        return Err(Error::configuration("batch worker: gathering must be at least 1"));
    }

    let mut batch = batch;
    Ok(Worker::from_task(
        "batch",
        Task::sink(move |value, job| {
            // A collection left behind by a failed pull is resumed, never replaced.
            let Some(value) = value else {
                return Ok(job.context_mut().remove::<Collection<T>>().map(|collection| collection.0));
            };
            job.context_mut().get_or_insert_with(|| Collection(Vec::new())).0.push(value);

            loop {
                let complete = job.context().get::<Collection<T>>().is_some_and(|collection| batch.is_complete(&collection.0));
                if complete {
                    break;
                }
                match job.pull()? {
                    Some(value) => job.context_mut().get_or_insert_with(|| Collection(Vec::new())).0.push(value),
                    None => break,
                }
            }

            Ok(job.context_mut().remove::<Collection<T>>().map(|collection| collection.0))
        }),
    ))
}

/// Emits the parts of each upstream value one per demand.
///
/// A value that splits into nothing is skipped.
pub fn splitter_worker<I, O, P, F>(mut split: F) -> Worker<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
    P: IntoIterator<Item = O>,
    F: FnMut(I) -> P + Send + 'static,
{
    Worker::from_task(
        "splitter",
        Task::sink(move |value, job| {
            let mut value = value;
            while let Some(whole) = value {
                let mut parts = split(whole).into_iter().peekable();
                while let Some(part) = parts.next() {
                    if parts.peek().is_none() {
                        return Ok(Some(part));
                    }
                    job.handoff(part)?;
                }
                value = job.pull()?;
            }
            Ok(None)
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::supply::{Stage, Supply};

    fn drain<T, S: Supply<T>>(supply: &S) -> Vec<T> {
        supply.products().collect::<Result<_>>().unwrap()
    }

    #[test]
    fn test_source_from_vec() {
        let worker = source_worker(vec!["fee", "fi"]);

        assert_eq!(worker.demand().unwrap(), Some("fee"));
        assert_eq!(worker.demand().unwrap(), Some("fi"));
        assert_eq!(worker.demand().unwrap(), None);
        assert_eq!(worker.demand().unwrap(), None);
    }

    #[test]
    fn test_source_from_range_and_chars() {
        assert_eq!(drain(&source_worker(0..=2)), vec![0, 1, 2]);
        assert_eq!(drain(&source_worker("abc".chars().collect::<Vec<_>>())), vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_source_from_map() {
        let map = BTreeMap::from([("bar", "yarr".to_owned()), ("foo", "2".to_owned())]);

        assert_eq!(drain(&source_worker(map)), vec![("bar", "yarr".to_owned()), ("foo", "2".to_owned())]);
    }

    #[test]
    fn test_source_keeps_falsy_payloads() {
        let worker = source_worker(vec![0, 0]);

        assert_eq!(worker.demand().unwrap(), Some(0));
        assert_eq!(worker.demand().unwrap(), Some(0));
        assert_eq!(worker.demand().unwrap(), None);
    }

    #[test]
    fn test_source_map() {
        let worker = source_map(["so", "la", "ti"], str::to_uppercase);

        assert_eq!(drain(&worker), vec!["SO", "LA", "TI"]);
        assert_eq!(worker.demand().unwrap(), None);
    }

    #[test]
    fn test_source_fn_latches_exhaustion() {
        let mut notes = vec!["doh", "ray", "me", "fa", "so", "la", "ti"];
        notes.reverse();
        let mut calls = 0;
        let worker = source_fn(move || {
            calls += 1;
            // Would start producing again after a gap if it were called.
            if calls == 5 { None } else { notes.pop() }
        });

        assert_eq!(worker.demand().unwrap(), Some("doh"));
        assert_eq!(worker.demand().unwrap(), Some("ray"));
        assert_eq!(worker.demand().unwrap(), Some("me"));
        assert_eq!(worker.demand().unwrap(), Some("fa"));
        assert_eq!(worker.demand().unwrap(), None);
        assert_eq!(worker.demand().unwrap(), None);
    }

    #[test]
    fn test_relay() {
        let source = source_worker(vec!["better", "stronger", "faster"]);
        let relay = relay_worker(|value: &'static str| value.replace('t', "+"));
        relay.set_supply(Some(source.as_supply())).unwrap();

        assert_eq!(drain(&relay), vec!["be++er", "s+ronger", "fas+er"]);
    }

    #[test]
    fn test_relay_never_sees_the_sentinel() {
        let source = source_worker(vec![1, 2, 3]);
        let calls = Arc::new(Mutex::new(0));
        let counted = Arc::clone(&calls);
        let relay = relay_worker(move |value: i32| {
            *counted.lock().unwrap() += 1;
            value * 3
        });
        relay.set_supply(Some(source.as_supply())).unwrap();

        assert_eq!(drain(&relay), vec![3, 6, 9]);
        assert_eq!(relay.demand().unwrap(), None);
        assert_eq!(*calls.lock().unwrap(), 3);
    }

    #[test]
    fn test_side_worker_keeps_values() {
        let effects = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&effects);
        let source = source_worker(0..=2);
        let side = side_worker(move |value: &i32| recorded.lock().unwrap().push(value * 2));
        side.set_supply(Some(source.as_supply())).unwrap();

        assert_eq!(drain(&side), vec![0, 1, 2]);
        assert_eq!(*effects.lock().unwrap(), vec![0, 2, 4]);
    }

    #[test]
    fn test_filter() {
        let source = source_worker(1..=3);
        let filter = filter_worker(|value: &i32| value % 2 == 0);
        filter.set_supply(Some(source.as_supply())).unwrap();

        assert_eq!(filter.demand().unwrap(), Some(2));
        assert_eq!(filter.demand().unwrap(), None);
    }

    #[test]
    fn test_filter_odd_values() {
        let source = source_worker(1..=3);
        let filter = filter_worker(|value: &i32| value % 2 > 0);
        filter.set_supply(Some(source.as_supply())).unwrap();

        assert_eq!(drain(&filter), vec![1, 3]);
    }

    #[test]
    fn test_batch_gathering() {
        let source = source_worker(0..=7);
        let batch = batch_worker(Batch::gathering(3)).unwrap();
        batch.set_supply(Some(source.as_supply())).unwrap();

        assert_eq!(batch.demand().unwrap(), Some(vec![0, 1, 2]));
        assert_eq!(batch.demand().unwrap(), Some(vec![3, 4, 5]));
        assert_eq!(batch.demand().unwrap(), Some(vec![6, 7]));
        assert_eq!(batch.demand().unwrap(), None);
    }

    #[test]
    fn test_batch_keeps_values_gathered_before_an_upstream_error() {
        let source = source_worker(1..=6);
        let picky = Worker::<i32, i32>::builder()
            .name("picky")
            .task(Task::sink(|value, _| {
                if value == Some(2) {
                    anyhow::bail!("no two");
                }
                Ok(value)
            }))
            .build()
            .unwrap();
        let batch = batch_worker(Batch::gathering(3)).unwrap();
        picky.set_supply(Some(source.as_supply())).unwrap();
        batch.set_supply(Some(picky.as_supply())).unwrap();

        let error = batch.demand().unwrap_err();
        assert!(matches!(&error, Error::Task { worker, .. } if worker == "picky"));

        assert_eq!(drain(&batch), vec![vec![1, 3, 4], vec![5, 6]]);
    }

    #[test]
    fn test_batch_emits_pending_values_when_the_stream_ends_after_an_error() {
        let source = source_worker(vec![1, 2]);
        let picky = Worker::<i32, i32>::builder()
            .task(Task::sink(|value, _| {
                if value == Some(2) {
                    anyhow::bail!("no two");
                }
                Ok(value)
            }))
            .build()
            .unwrap();
        let batch = batch_worker(Batch::gathering(3)).unwrap();
        picky.set_supply(Some(source.as_supply())).unwrap();
        batch.set_supply(Some(picky.as_supply())).unwrap();

        assert!(batch.demand().is_err());
        assert_eq!(batch.demand().unwrap(), Some(vec![1]));
        assert_eq!(batch.demand().unwrap(), None);
    }

    #[test]
    fn test_batch_defaults_to_one() {
        let source = source_worker(vec![8, 9]);
        let batch = batch_worker(Batch::default()).unwrap();
        batch.set_supply(Some(source.as_supply())).unwrap();

        assert_eq!(drain(&batch), vec![vec![8], vec![9]]);
    }

    #[test]
    fn test_batch_until() {
        let source = source_worker(1..=5);
        let batch = batch_worker(Batch::until(|latest: &i32, _| latest % 2 == 0)).unwrap();
        batch.set_supply(Some(source.as_supply())).unwrap();

        assert_eq!(batch.demand().unwrap(), Some(vec![1, 2]));
        assert_eq!(batch.demand().unwrap(), Some(vec![3, 4]));
        assert_eq!(batch.demand().unwrap(), Some(vec![5]));
        assert_eq!(batch.demand().unwrap(), None);
    }

    #[test]
    fn test_batch_until_sees_collection() {
        let source = source_worker(vec![4, 1, 2, 7, 3]);
        let batch = batch_worker(Batch::until(|_, collected: &[i32]| collected.iter().sum::<i32>() >= 5)).unwrap();
        batch.set_supply(Some(source.as_supply())).unwrap();

        assert_eq!(drain(&batch), vec![vec![4, 1], vec![2, 7], vec![3]]);
    }

    #[test]
    fn test_batch_empty_upstream() {
        let source = source_worker(Vec::<i32>::new());
        let batch = batch_worker(Batch::gathering(2)).unwrap();
        batch.set_supply(Some(source.as_supply())).unwrap();

        assert_eq!(batch.demand().unwrap(), None);
    }

    #[test]
    fn test_batch_rejects_zero_gathering() {
        let error = batch_worker::<i32>(Batch::gathering(0)).unwrap_err();

        assert!(error.is_configuration());
    }

    #[test]
    fn test_splitter() {
        let source = source_worker(vec!["A bold", "move northward"]);
        let splitter = splitter_worker(|line: &'static str| line.split_whitespace().map(str::to_owned).collect::<Vec<_>>());
        splitter.set_supply(Some(source.as_supply())).unwrap();

        assert_eq!(drain(&splitter), vec!["A", "bold", "move", "northward"]);
        assert_eq!(splitter.demand().unwrap(), None);
    }

    #[test]
    fn test_splitter_skips_empty_decompositions() {
        let source = source_worker(vec!["", "one", "  ", "two three"]);
        let splitter = splitter_worker(|line: &'static str| line.split_whitespace().collect::<Vec<_>>());
        splitter.set_supply(Some(source.as_supply())).unwrap();

        assert_eq!(drain(&splitter), vec!["one", "two", "three"]);
    }

    #[test]
    fn test_builtin_sinks_need_a_supply() {
        assert!(relay_worker(|value: i32| value).demand().unwrap_err().is_readiness());
        assert!(filter_worker(|_: &i32| true).demand().unwrap_err().is_readiness());
        assert!(splitter_worker(|value: i32| [value]).demand().unwrap_err().is_readiness());
    }

    #[test]
    fn test_sources_cannot_be_supplied() {
        let first = source_worker(vec![1]);
        let second = source_worker(vec![2]);

        assert!(second.set_supply(Some(first.as_supply())).unwrap_err().is_configuration());
    }
}
