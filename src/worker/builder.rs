//! Builder for custom workers.
//!
//! Collects a worker's name, task, context, supply and thread settings, and
//! validates the combination once in [`WorkerBuilder::build`].

use std::any::Any;

use crate::config::{DEFAULT_WORKER_NAME, WORKER_STACK_SIZE};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::supply::SupplyRef;
use crate::worker::Worker;
use crate::worker::task::Task;

/// Step-by-step construction of a [`Worker`].
///
/// All wiring mistakes are reported by [`WorkerBuilder::build`], before the
/// worker can be demanded from.
pub struct WorkerBuilder<I, O> {
    /// Falls back to the default worker name when unset.
    name: Option<String>,
    /// Every task given, so a second one can be reported instead of replacing the first.
    tasks: Vec<Task<I, O>>,
    /// Initial context handed to the task.
    context: Context,
    /// Initial supply; sinks only.
    supply: Option<SupplyRef<I>>,
    /// Stack size of the task thread in bytes.
    stack_size: usize,
}

impl<I, O> WorkerBuilder<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Creates a builder with the default name, an empty context and no supply.
    #[inline]
    pub fn new() -> Self {
        Self { name: None, tasks: Vec::new(), context: Context::new(), supply: None, stack_size: WORKER_STACK_SIZE }
    }

    /// Sets the name used for the task thread, log events and errors.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the task. Exactly one task must be given.
    pub fn task(mut self, task: Task<I, O>) -> Self {
        self.tasks.push(task);
        self
    }

    /// Replaces the whole context.
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    /// Adds one entry to the context.
    pub fn with<V: Any + Send>(mut self, value: V) -> Self {
        self.context.insert(value);
        self
    }

    /// Sets the initial supply. Only sink tasks accept one.
    ///
    /// # Arguments
    ///
    /// * `supply` - The upstream stage, usually obtained with [`Stage::as_supply`](crate::Stage::as_supply).
    pub fn supply(mut self, supply: SupplyRef<I>) -> Self {
        self.supply = Some(supply);
        self
    }

    /// Stack size of the thread the task runs on.
    pub fn stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = stack_size;
        self
    }

    /// Builds the worker.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if no task or more than one task was
    /// given, if a source task was given a supply, or if the stack size is zero.
    pub fn build(self) -> Result<Worker<I, O>> {
        let name = self.name.unwrap_or_else(|| DEFAULT_WORKER_NAME.to_owned());

        let mut tasks = self.tasks.into_iter();
        let task = match (tasks.next(), tasks.next()) {
            (Some(task), None) => task,
            (None, _) => return Err(Error::configuration(format!("worker `{name}`: you must supply a task"))),
            (Some(_), Some(_)) => return Err(Error::configuration(format!("worker `{name}`: you cannot supply two tasks"))),
        };

        if self.supply.is_some() && !task.role().accepts_value() {
            return Err(Error::configuration(format!("worker `{name}` is a source and cannot accept a supply")));
        }

        if self.stack_size == 0 {
            return Err(Error::configuration(format!("worker `{name}`: stack size must be greater than zero")));
        }

        Ok(Worker::from_parts(name, task, self.context, self.supply, self.stack_size))
    }
}

impl<I, O> Default for WorkerBuilder<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supply::{Stage, Supply};
    use crate::types::Role;

    fn constant(value: u8) -> Task<u8, u8> {
        Task::source(move |_| Ok(Some(value)))
    }

    #[test]
    fn test_build_names_and_roles() {
        let worker = WorkerBuilder::new().name("seven").task(constant(7)).build().unwrap();

        assert_eq!(worker.name(), "seven");
        assert_eq!(worker.role(), Role::Source);
        assert_eq!(worker.demand().unwrap(), Some(7));
    }

    #[test]
    fn test_default_name() {
        let worker = WorkerBuilder::new().task(Task::<u8, u8>::identity()).build().unwrap();

        assert_eq!(worker.name(), DEFAULT_WORKER_NAME);
        assert_eq!(worker.role(), Role::Sink);
    }

    #[test]
    fn test_missing_task() {
        let error = WorkerBuilder::<u8, u8>::new().build().unwrap_err();

        assert!(error.is_configuration());
        assert!(error.to_string().contains("must supply a task"));
    }

    #[test]
    fn test_two_tasks() {
        let error = WorkerBuilder::new().task(constant(1)).task(constant(2)).build().unwrap_err();

        assert!(error.is_configuration());
        assert!(error.to_string().contains("two tasks"));
    }

    #[test]
    fn test_source_with_supply() {
        let upstream = WorkerBuilder::new().task(constant(1)).build().unwrap();
        let error = WorkerBuilder::new().supply(upstream.as_supply()).task(constant(2)).build().unwrap_err();

        assert!(error.to_string().contains("cannot accept a supply"));
    }

    #[test]
    fn test_sink_with_supply_is_ready() {
        let upstream = WorkerBuilder::new().task(constant(4)).build().unwrap();
        let sink = WorkerBuilder::new().supply(upstream.as_supply()).task(Task::identity()).build().unwrap();

        assert!(sink.ready_to_work());
        assert!(sink.is_supplied_by(&upstream));
        assert_eq!(sink.demand().unwrap(), Some(4));
    }

    #[test]
    fn test_zero_stack_size() {
        let error = WorkerBuilder::new().stack_size(0).task(constant(1)).build().unwrap_err();

        assert!(error.is_configuration());
    }
}
