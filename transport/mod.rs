// Transport module: resolve, connect and exchange newline-framed messages
pub mod connector;
pub mod factory;
pub mod netstack;
pub mod platform;
pub mod resolver;
pub mod tcp;
pub mod timeout_io;
pub mod traits;

pub use factory::*;
pub use netstack::{active_users, NetStackGuard};
pub use resolver::{resolve, CandidateAddress};
pub use tcp::*;
pub use traits::*;
