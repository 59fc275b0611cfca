//! The `|` chaining operator.
//!
//! `&upstream | &downstream` makes `upstream` the supply of `downstream` and
//! evaluates to `downstream`, so pipelines read left to right:
//!
//! ```
//! use stepladder::{Supply, relay_worker, source_worker};
//!
//! let source = source_worker(1..=3);
//! let triple = relay_worker(|n: i32| n * 3);
//! let show = relay_worker(|n: i32| n.to_string());
//!
//! let pipeline = (&source | &triple | &show).unwrap();
//! assert_eq!(pipeline.demand().unwrap().as_deref(), Some("3"));
//! ```
//!
//! Wiring can fail, so every link evaluates to a [`Result`]; a `Result` on the
//! left keeps chaining and the first error wins.

use std::ops::BitOr;

use crate::error::Result;
use crate::gang::Gang;
use crate::supply::Stage;
use crate::worker::Worker;

impl<I, O, P> BitOr<&Worker<O, P>> for &Worker<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
    P: Send + 'static,
{
    type Output = Result<Worker<O, P>>;

    fn bitor(self, downstream: &Worker<O, P>) -> Self::Output {
        self.supplies(downstream)
    }
}

impl<I, T> BitOr<&Gang<T>> for &Worker<I, T>
where
    I: Send + 'static,
    T: Send + 'static,
{
    type Output = Result<Gang<T>>;

    fn bitor(self, downstream: &Gang<T>) -> Self::Output {
        self.supplies(downstream)
    }
}

impl<T, P> BitOr<&Worker<T, P>> for &Gang<T>
where
    T: Send + 'static,
    P: Send + 'static,
{
    type Output = Result<Worker<T, P>>;

    fn bitor(self, downstream: &Worker<T, P>) -> Self::Output {
        self.supplies(downstream)
    }
}

impl<T> BitOr<&Gang<T>> for &Gang<T>
where
    T: Send + 'static,
{
    type Output = Result<Gang<T>>;

    fn bitor(self, downstream: &Gang<T>) -> Self::Output {
        self.supplies(downstream)
    }
}

impl<I, O, P> BitOr<&Worker<O, P>> for Result<Worker<I, O>>
where
    I: Send + 'static,
    O: Send + 'static,
    P: Send + 'static,
{
    type Output = Result<Worker<O, P>>;

    fn bitor(self, downstream: &Worker<O, P>) -> Self::Output {
        self.and_then(|upstream| upstream.supplies(downstream))
    }
}

impl<I, T> BitOr<&Gang<T>> for Result<Worker<I, T>>
where
    I: Send + 'static,
    T: Send + 'static,
{
    type Output = Result<Gang<T>>;

    fn bitor(self, downstream: &Gang<T>) -> Self::Output {
        self.and_then(|upstream| upstream.supplies(downstream))
    }
}

impl<T, P> BitOr<&Worker<T, P>> for Result<Gang<T>>
where
    T: Send + 'static,
    P: Send + 'static,
{
    type Output = Result<Worker<T, P>>;

    fn bitor(self, downstream: &Worker<T, P>) -> Self::Output {
        self.and_then(|upstream| upstream.supplies(downstream))
    }
}

impl<T> BitOr<&Gang<T>> for Result<Gang<T>>
where
    T: Send + 'static,
{
    type Output = Result<Gang<T>>;

    fn bitor(self, downstream: &Gang<T>) -> Self::Output {
        self.and_then(|upstream| upstream.supplies(downstream))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl::{Batch, batch_worker, filter_worker, relay_worker, source_worker, splitter_worker};
    use crate::supply::Supply;

    fn drain<T, S: Supply<T>>(supply: &S) -> Vec<T> {
        supply.products().collect::<Result<_>>().unwrap()
    }

    #[test]
    fn test_chain_returns_downstream() {
        let source = source_worker(vec![1, 2, 3]);
        let relay = relay_worker(|n: i32| n * 3);

        let pipeline = (&source | &relay).unwrap();

        assert_eq!(pipeline, relay);
        assert!(relay.is_supplied_by(&source));
        assert_eq!(drain(&pipeline), vec![3, 6, 9]);
    }

    #[test]
    fn test_chain_changes_types() {
        let source = source_worker(vec!["A bold", "move northward"]);
        let words = splitter_worker(|line: &'static str| line.split_whitespace().collect::<Vec<_>>());
        let long = filter_worker(|word: &&'static str| word.len() > 1);
        let pairs = batch_worker(Batch::gathering(2)).unwrap();

        let pipeline = (&source | &words | &long | &pairs).unwrap();

        assert_eq!(drain(&pipeline), vec![vec!["bold", "move"], vec!["northward"]]);
    }

    #[test]
    fn test_chaining_is_associative() {
        let left = {
            let (a, b, c) = (source_worker(0..5), relay_worker(|n: i32| n + 1), relay_worker(|n: i32| n * 10));
            (&a | &b | &c).unwrap()
        };
        let right = {
            let (a, b, c) = (source_worker(0..5), relay_worker(|n: i32| n + 1), relay_worker(|n: i32| n * 10));
            let tail = Gang::new([b, c]).unwrap();
            (&a | &tail).unwrap()
        };

        assert_eq!(drain(&left), drain(&right));
    }

    #[test]
    fn test_gang_on_both_sides() {
        let front = Gang::new([source_worker(1..=4), relay_worker(|n: i32| n * 2)]).unwrap();
        let back = Gang::new([filter_worker(|n: &i32| n % 4 == 0), relay_worker(|n: i32| n + 1)]).unwrap();

        let pipeline = (&front | &back).unwrap();

        assert_eq!(pipeline, back);
        assert_eq!(drain(&pipeline), vec![5, 9]);
    }

    #[test]
    fn test_first_wiring_error_wins() {
        let source = source_worker(vec![1]);
        let other = source_worker(vec![2]);
        let relay = relay_worker(|n: i32| n);

        let error = (&source | &other | &relay).unwrap_err();

        assert!(error.is_configuration());
        assert!(relay.supply().is_none());
    }
}
