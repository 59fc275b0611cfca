//! Task functions and the handle a task works through.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::supply::SupplyRef;
use crate::types::Role;
use crate::worker::machine::Handoff;

/// The upstream slot shared between a worker handle and its running task.
pub(crate) type SupplySlot<I> = Arc<RwLock<Option<SupplyRef<I>>>>;

type SourceFn<I, O> = Box<dyn FnMut(&mut Job<'_, I, O>) -> anyhow::Result<Option<O>> + Send>;
type SinkFn<I, O> = Box<dyn FnMut(Option<I>, &mut Job<'_, I, O>) -> anyhow::Result<Option<O>> + Send>;

/// A worker's task function.
///
/// The task is called once per product it returns. Values handed off through
/// [`Job::handoff`] before returning each satisfy one demand of their own, and
/// the task resumes right after the handoff on the following demand.
pub enum Task<I, O> {
    /// Generates values without pulling.
    Source(SourceFn<I, O>),

    /// Receives the next upstream value (`None` at end of stream) on every call.
    Sink(SinkFn<I, O>),
}

impl<I, O> Task<I, O> {
    /// Creates a task that generates values without pulling.
    ///
    /// # Arguments
    ///
    /// * `task` - Called once per product; returning `Ok(None)` ends the stream.
    pub fn source<F>(task: F) -> Self
    where
        F: FnMut(&mut Job<'_, I, O>) -> anyhow::Result<Option<O>> + Send + 'static,
    {
        Self::Source(Box::new(task))
    }

    /// Creates a task that consumes one upstream value per call.
    ///
    /// # Arguments
    ///
    /// * `task` - Receives the value pulled for this call (`None` at end of
    ///   stream) and the job it can pull further values or hand off through.
    pub fn sink<F>(task: F) -> Self
    where
        F: FnMut(Option<I>, &mut Job<'_, I, O>) -> anyhow::Result<Option<O>> + Send + 'static,
    {
        Self::Sink(Box::new(task))
    }

    /// Whether the task generates values or consumes them.
    #[inline]
    pub fn role(&self) -> Role {
        match self {
            Self::Source(_) => Role::Source,
            Self::Sink(_) => Role::Sink,
        }
    }

    /// Runs one call of the task, pulling its input first when it takes one.
    pub(crate) fn perform(&mut self, job: &mut Job<'_, I, O>) -> Result<Option<O>> {
        let outcome = match self {
            Self::Source(task) => task(job),
            Self::Sink(task) => {
                let value = job.pull()?;
                task(value, job)
            }
        };

        outcome.map_err(|error| Error::from_task(job.worker, error))
    }
}

impl<T> Task<T, T> {
    /// Passes every upstream value through unchanged.
    pub fn identity() -> Self {
        Self::sink(|value, _| Ok(value))
    }
}

impl<I, O> fmt::Debug for Task<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task::{}", self.role())
    }
}

/// What a running task sees of its worker: the supply, the suspend point and the context.
pub struct Job<'a, I, O> {
    /// Name of the running worker.
    worker: &'a str,
    /// The worker's supply, shared with its handle so rewiring is seen immediately.
    supply: &'a SupplySlot<I>,
    /// Suspend point for intermediate products.
    handoff: &'a Handoff<O>,
    /// The worker's persistent state.
    context: &'a mut Context,
}

impl<'a, I, O> Job<'a, I, O> {
    pub(crate) fn new(worker: &'a str, supply: &'a SupplySlot<I>, handoff: &'a Handoff<O>, context: &'a mut Context) -> Self {
        Self { worker, supply, handoff, context }
    }

    /// Demands the next value from the worker's supply.
    ///
    /// # Errors
    ///
    /// Returns a readiness error if the worker has no supply, or whatever the supply fails with.
    pub fn pull(&mut self) -> Result<Option<I>> {
        // Clone out of the slot so the lock is not held across the upstream demand.
        let supply = self.supply.read().clone();
        match supply {
            Some(supply) => supply.demand(),
            None => Err(Error::Readiness { worker: self.worker.to_owned() }),
        }
    }

    /// Hands `product` to the pending demand and suspends until the next one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Halted`] if the worker was dropped while suspended. The
    /// task should return it with `?` so its thread can finish.
    pub fn handoff(&mut self, product: O) -> Result<()> {
        tracing::trace!(worker = self.worker, "handoff");
        if self.handoff.give(Ok(Some(product))) { Ok(()) } else { Err(Error::Halted { worker: self.worker.to_owned() }) }
    }

    /// The worker's current supply.
    pub fn supply(&self) -> Option<SupplyRef<I>> {
        self.supply.read().clone()
    }

    /// Read access to the worker's context.
    #[inline]
    pub fn context(&self) -> &Context {
        self.context
    }

    /// Write access to the worker's context. Changes persist across demands.
    #[inline]
    pub fn context_mut(&mut self) -> &mut Context {
        self.context
    }

    /// Name of the worker running this job.
    #[inline]
    pub fn worker(&self) -> &str {
        self.worker
    }
}
