//! Lazy, pull-driven worker.
//!
//! A [`Worker`] owns a task function, an optional supply and a [`Context`].
//! Nothing runs until the worker is demanded from. The first demand starts the
//! worker's [`Machine`]; every later demand resumes the task where its last
//! handoff left it.
//!
//! `Worker` is a cheap handle: clones share the same task, supply and context.

use std::fmt;
use std::mem;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::config::{DEFAULT_WORKER_NAME, WORKER_STACK_SIZE};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::supply::{Stage, Supply, SupplyRef};
use crate::types::Role;
use crate::worker::machine::Machine;
use crate::worker::task::SupplySlot;

pub mod builder;
pub mod machine;
pub mod task;

pub use builder::WorkerBuilder;
pub use task::{Job, Task};

/// A single pipeline stage pulling `I` and producing `O`.
pub struct Worker<I, O> {
    shared: Arc<Shared<I, O>>,
}

struct Shared<I, O> {
    /// Used for the task thread name, log events and errors.
    name: String,
    /// Fixed by the task at construction.
    role: Role,
    stack_size: usize,
    supply: SupplySlot<I>,
    /// Held for the whole demand, so a worker never runs two demands at once.
    state: Mutex<State<I, O>>,
}

enum State<I, O> {
    /// Not demanded yet; the task and context move into the machine on first demand.
    Idle { task: Task<I, O>, context: Context },
    Working(Machine<O>),
    Halted,
}

impl<I, O> Worker<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    /// Starts building a custom worker.
    pub fn builder() -> WorkerBuilder<I, O> {
        WorkerBuilder::new()
    }

    pub(crate) fn from_parts(name: String, task: Task<I, O>, context: Context, supply: Option<SupplyRef<I>>, stack_size: usize) -> Self {
        let role = task.role();
        let shared = Shared { name, role, stack_size, supply: Arc::new(RwLock::new(supply)), state: Mutex::new(State::Idle { task, context }) };

        Self { shared: Arc::new(shared) }
    }

    /// Builds a worker around `task` with an empty context and no supply.
    pub(crate) fn from_task(name: &str, task: Task<I, O>) -> Self {
        Self::from_parts(name.to_owned(), task, Context::new(), None, WORKER_STACK_SIZE)
    }

    /// The worker's name, as used in log events and errors.
    #[inline]
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Whether the worker's task generates or consumes values.
    #[inline]
    pub fn role(&self) -> Role {
        self.shared.role
    }

    /// Returns true if the task takes no value, so the worker can never be supplied.
    #[inline]
    pub fn is_source(&self) -> bool {
        self.shared.role == Role::Source
    }
}

impl<T: Send + 'static> Worker<T, T> {
    /// A worker with the default task, passing upstream values through unchanged.
    pub fn new() -> Self {
        Self::from_task(DEFAULT_WORKER_NAME, Task::identity())
    }
}

impl<T: Send + 'static> Default for Worker<T, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, O> Shared<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn readiness_error(&self) -> Error {
        Error::Readiness { worker: self.name.clone() }
    }
}

impl<I, O> Supply<O> for Shared<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    #[tracing::instrument(level = "trace", skip_all, fields(worker = %self.name))]
    fn demand(&self) -> Result<Option<O>> {
        if !self.ready_to_work() {
            return Err(self.readiness_error());
        }

        let mut state = self.state.lock();
        if matches!(*state, State::Idle { .. })
            && let State::Idle { task, context } = mem::replace(&mut *state, State::Halted)
        {
            *state = State::Working(Machine::start(&self.name, self.stack_size, task, Arc::clone(&self.supply), context)?);
        }

        match &*state {
            State::Working(machine) => machine.resume(&self.name),
            State::Idle { .. } | State::Halted => Err(Error::Halted { worker: self.name.clone() }),
        }
    }

    fn ready_to_work(&self) -> bool {
        !self.role.accepts_value() || self.supply.read().is_some()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<I, O> Supply<O> for Worker<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    #[inline]
    fn demand(&self) -> Result<Option<O>> {
        self.shared.demand()
    }

    #[inline]
    fn ready_to_work(&self) -> bool {
        self.shared.ready_to_work()
    }

    #[inline]
    fn name(&self) -> &str {
        &self.shared.name
    }
}

impl<I, O> Stage<I, O> for Worker<I, O>
where
    I: Send + 'static,
    O: Send + 'static,
{
    fn supply(&self) -> Option<SupplyRef<I>> {
        self.shared.supply.read().clone()
    }

    fn set_supply(&self, supply: Option<SupplyRef<I>>) -> Result<()> {
        if supply.is_some() && self.is_source() {
            return Err(Error::configuration(format!("worker `{}` is a source and cannot accept a supply", self.name())));
        }

        tracing::trace!(worker = self.name(), upstream = supply.as_ref().map(|s| s.name()), "supply set");
        *self.shared.supply.write() = supply;
        Ok(())
    }

    fn as_supply(&self) -> SupplyRef<O> {
        Arc::clone(&self.shared) as SupplyRef<O>
    }
}

impl<I, O> Clone for Worker<I, O> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<I, O> PartialEq for Worker<I, O> {
    /// Workers are equal when they are handles to the same worker.
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<I, O> Eq for Worker<I, O> {}

impl<I, O> fmt::Debug for Worker<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.shared.name)
            .field("role", &self.shared.role)
            .field("supplied", &self.shared.supply.read().is_some())
            .finish_non_exhaustive()
    }
}
