pub mod event;
pub mod markers;
pub mod selection;
pub mod viewport;

pub use event::*;
pub use markers::*;
pub use selection::*;
pub use viewport::*;
