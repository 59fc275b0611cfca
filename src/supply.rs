//! The contract shared by workers and gangs.
//!
//! [`Supply`] is what a downstream stage pulls from. [`Stage`] adds the wiring
//! side: reading and replacing a stage's own upstream, and chaining it in front
//! of another stage. Anything implementing both can stand in for a single
//! worker anywhere in a pipeline.

use std::ptr;
use std::sync::Arc;

use crate::error::Result;

/// Shared, type-erased reference to an upstream stage.
pub type SupplyRef<T> = Arc<dyn Supply<T>>;

/// Something that produces values on demand.
pub trait Supply<T>: Send + Sync {
    /// Produces the next value, or `None` once the stream is exhausted.
    fn demand(&self) -> Result<Option<T>>;

    /// Returns true if a demand would reach the task instead of failing for lack of a supply.
    fn ready_to_work(&self) -> bool;

    /// Name used in log events and errors.
    fn name(&self) -> &str;

    /// Iterates over products until the end of the stream.
    fn products(&self) -> Products<'_, T>
    where
        Self: Sized,
    {
        Products { supply: self, done: false }
    }
}

/// A pipeline stage pulling `I` from its supply and producing `O`.
pub trait Stage<I, O>: Supply<O> {
    /// The current upstream, if any.
    fn supply(&self) -> Option<SupplyRef<I>>;

    /// Replaces the upstream. `None` detaches the stage.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when giving a supply to a stage whose task takes no value.
    fn set_supply(&self, supply: Option<SupplyRef<I>>) -> Result<()>;

    /// A shared handle to this stage, usable as another stage's supply.
    fn as_supply(&self) -> SupplyRef<O>;

    /// Makes this stage the supply of `downstream` and returns `downstream`.
    fn supplies<D, P>(&self, downstream: &D) -> Result<D>
    where
        Self: Sized,
        D: Stage<O, P> + Clone,
    {
        downstream.set_supply(Some(self.as_supply()))?;
        Ok(downstream.clone())
    }

    /// Returns true if `upstream` is this stage's current supply.
    fn is_supplied_by<H, U>(&self, upstream: &U) -> bool
    where
        Self: Sized,
        U: Stage<H, I>,
    {
        self.supply().is_some_and(|supply| same_supply(&supply, &upstream.as_supply()))
    }
}

/// Returns true if both references point at the same stage.
#[inline]
pub fn same_supply<T>(a: &SupplyRef<T>, b: &SupplyRef<T>) -> bool {
    ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// Iterator returned by [`Supply::products`].
///
/// Yields `Ok(value)` for each product and stops at the end of the stream or
/// after the first error.
pub struct Products<'a, T> {
    supply: &'a dyn Supply<T>,
    done: bool,
}

impl<T> Iterator for Products<'_, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.supply.demand() {
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(error) => {
                self.done = true;
                Some(Err(error))
            }
        }
    }
}
