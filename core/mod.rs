// Core module: shared types, errors and line framing (NO I/O dependencies)
pub mod error;
pub mod line;
pub mod types;

pub use error::*;
pub use line::*;
pub use types::*;
