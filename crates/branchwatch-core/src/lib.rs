pub mod error;
pub mod prior;
pub mod source;
pub mod types;
pub mod version;

pub use error::{Error, Result};
pub use prior::PriorState;
pub use source::{BranchSource, ResourceInput, Source};
pub use types::*;
pub use version::Version;
