//! Haven Core - Session state, sync protocol, configuration and errors

pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod types;

pub use config::*;
pub use error::{Error, Result};
pub use protocol::*;
pub use session::*;
pub use types::*;
