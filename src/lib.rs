// Roost - a priority-aware, self-scaling worker pool.
//
// A fixed- or auto-scaling set of OS threads pulls work items from a
// priority-ordered queue; a background observer thread adjusts pool size and
// per-thread scheduling priority in response to observed load. Single
// process, in memory, no work stealing, no FIFO guarantee among
// equal-priority items.

pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;
pub mod pool;
pub mod priority;
pub mod queue;
pub mod task;

mod observer;
mod os;
mod worker;

// Re-export the public surface.
pub use cancel::CancelToken;
pub use config::{PanicPolicy, PoolConfig, ScalingMode};
pub use error::{PoolError, QueueError};
pub use pool::{PoolMetrics, PoolState, ThreadPool};
pub use priority::Priority;
pub use queue::{PriorityHeap, WorkQueue};
pub use task::{Job, WorkItem};
