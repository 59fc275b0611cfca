//! Stepladder - lazy, pull-based processing pipelines.
//!
//! A pipeline is a chain of workers, each supplied by the one before it.
//! Nothing runs until the last worker is asked for a value; each demand then
//! travels up the chain and every worker does just enough work to answer it.
//!
//! - [`Worker`] runs one task and keeps its state between demands
//! - [`Gang`] groups workers into a single composite stage
//! - [`dsl`] builds the common behaviors: source, relay, side, filter, batch, splitter
//! - `&upstream | &downstream` wires stages together
//!
//! ```
//! use stepladder::{Supply, filter_worker, relay_worker, source_worker};
//!
//! let numbers = source_worker(1..=10);
//! let evens = filter_worker(|n: &i32| n % 2 == 0);
//! let squares = relay_worker(|n: i32| n * n);
//!
//! let pipeline = (&numbers | &evens | &squares).unwrap();
//! let squares: Vec<i32> = pipeline.products().collect::<Result<_, _>>().unwrap();
//! assert_eq!(squares, vec![4, 16, 36, 64, 100]);
//! ```

pub mod chain;
pub mod config;
pub mod context;
pub mod dsl;
pub mod error;
pub mod gang;
pub mod roster;
pub mod supply;
pub mod types;
pub mod worker;

pub use context::Context;
pub use dsl::{Batch, batch_worker, filter_worker, relay_worker, side_worker, source_fn, source_map, source_worker, splitter_worker};
pub use error::{Error, Result};
pub use gang::{Gang, Member};
pub use roster::Roster;
pub use supply::{Products, Stage, Supply, SupplyRef, same_supply};
pub use types::Role;
pub use worker::{Job, Task, Worker, WorkerBuilder};

/// Routes log events to the test harness output.
#[cfg(test)]
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_file(true).with_line_number(true).with_test_writer().with_max_level(tracing::Level::TRACE).try_init();
}
