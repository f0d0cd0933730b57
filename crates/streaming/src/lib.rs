pub mod cache;
pub mod client;
pub mod error;
pub mod protocol;
pub mod transport;

pub use cache::*;
pub use client::*;
pub use error::*;
pub use protocol::*;
pub use transport::*;
