//! The suspendable computation behind each worker.
//!
//! A task runs on its own thread, but never at the same time as the code that
//! demanded from it. Two zero-capacity channels form a rendezvous:
//!
//! 1. `demand` sends on `resume` and blocks on `products`.
//! 2. The task thread, parked on `resume`, runs until it hands off a product,
//!    then parks on `resume` again with its locals intact.
//!
//! Dropping the [`Machine`] closes `resume`; a task parked in a handoff sees
//! [`Error::Halted`] and its thread winds down.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use flume::{Receiver, Sender};

use crate::config::THREAD_NAME_PREFIX;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::worker::task::{Job, SupplySlot, Task};

type Product<O> = Result<Option<O>>;

/// The task thread's end of the rendezvous.
pub(crate) struct Handoff<O> {
    resume: Receiver<()>,
    products: Sender<Product<O>>,
}

impl<O> Handoff<O> {
    /// Parks until the next demand. Returns false once the machine is gone.
    #[inline]
    fn wait(&self) -> bool {
        self.resume.recv().is_ok()
    }

    /// Delivers `product` to the waiting demand, then parks until the next one.
    pub(crate) fn give(&self, product: Product<O>) -> bool {
        self.products.send(product).is_ok() && self.wait()
    }
}

/// The caller's end of the rendezvous.
pub(crate) struct Machine<O> {
    resume: Sender<()>,
    products: Receiver<Product<O>>,
}

impl<O: Send + 'static> Machine<O> {
    /// Spawns the task thread. The task does not run until the first [`Machine::resume`].
    pub(crate) fn start<I: Send + 'static>(worker: &str, stack_size: usize, task: Task<I, O>, supply: SupplySlot<I>, context: Context) -> Result<Self> {
        let (resume_sender, resume_receiver) = flume::bounded(0);
        let (product_sender, product_receiver) = flume::bounded(0);
        let handoff = Handoff { resume: resume_receiver, products: product_sender };

        let role = task.role();
        let name = worker.to_owned();
        thread::Builder::new()
            .name(format!("{THREAD_NAME_PREFIX}-{worker}"))
            .stack_size(stack_size)
            .spawn(move || run(&name, task, &supply, context, &handoff))
            .map_err(|source| Error::Spawn { worker: worker.to_owned(), source })?;

        tracing::debug!(worker, %role, "worker machine started");

        Ok(Self { resume: resume_sender, products: product_receiver })
    }

    /// Resumes the task and waits for the next product.
    pub(crate) fn resume(&self, worker: &str) -> Product<O> {
        let halted = || Error::Halted { worker: worker.to_owned() };

        self.resume.send(()).map_err(|_| halted())?;
        self.products.recv().map_err(|_| halted())?
    }
}

fn run<I, O>(worker: &str, mut task: Task<I, O>, supply: &SupplySlot<I>, mut context: Context, handoff: &Handoff<O>) {
    if !handoff.wait() {
        return;
    }

    loop {
        let mut job = Job::new(worker, supply, handoff, &mut context);
        let product = match panic::catch_unwind(AssertUnwindSafe(|| task.perform(&mut job))) {
            Ok(product) => product,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(worker, %message, "worker task panicked");
                let _ = handoff.products.send(Err(Error::Panicked { worker: worker.to_owned(), message }));
                return;
            }
        };

        if !handoff.give(product) {
            break;
        }
    }

    tracing::debug!(worker, "worker machine stopped");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
