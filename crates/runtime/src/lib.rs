pub mod metrics;
pub mod playback;
pub mod scheduler;
pub mod timer_queue;

pub use metrics::*;
pub use playback::*;
pub use scheduler::*;
pub use timer_queue::*;
