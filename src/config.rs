//! Global Configuration Constants
//!
//! Defaults shared by the worker engine and the built-in behaviors. Anything a
//! single worker needs beyond these belongs in its [`Context`](crate::Context).

/// Batch size used by a batch worker when no completion condition is given.
pub const DEFAULT_GATHERING: usize = 1;

/// Prefix of the thread name each worker's task runs on (`stepladder-<worker>`).
pub const THREAD_NAME_PREFIX: &str = "stepladder";

/// Stack size for a worker's task thread (1 MiB).
///
/// Tasks only run user closures and pull from their supply, so this is far
/// below the platform default. Raise it per worker with
/// [`WorkerBuilder::stack_size`](crate::WorkerBuilder::stack_size).
pub const WORKER_STACK_SIZE: usize = 1024 * 1024;

/// Name given to workers built without an explicit name.
pub const DEFAULT_WORKER_NAME: &str = "worker";

/// Name used in log events and errors for a gang.
pub const GANG_NAME: &str = "gang";
