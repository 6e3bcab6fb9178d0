//! Haven Gateway - HTTP surface of the session sync protocol
//!
//! One stateless route does the work: `POST /chat` hands the client's state,
//! text and history to the transition authority and returns the
//! authoritative state with the reply.

pub mod error;
pub mod server;

pub use error::ApiError;
pub use server::{build_generator, router, serve, start_gateway, AppState, ExtendedConfig};
