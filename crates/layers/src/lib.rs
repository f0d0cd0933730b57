pub mod query;
pub mod symbology;

pub use query::*;
pub use symbology::*;
