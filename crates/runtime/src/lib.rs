mod commands;
mod queue;
mod runtime;
mod scheduler;
mod subs;

pub use crate::queue::{Origin, PendingQueue, QueuedEvent};
pub use crate::runtime::{LoopState, Runtime};
pub use crate::scheduler::{BusScheduler, Scheduler};
pub use crate::subs::SubscriptionSet;
