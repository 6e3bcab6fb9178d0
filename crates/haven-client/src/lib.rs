//! Haven Client - optimistic rendering and wholesale reconciliation of
//! server-owned session state
//!
//! The server is the only authority over `SessionState`. A client may show a
//! speculative state while a request is in flight, but every response
//! replaces what it holds, and a failed exchange leaves it exactly where it
//! was before.

pub mod error;
pub mod reconciler;
pub mod transport;

pub use error::{ClientError, ClientResult};
pub use reconciler::{DisplayedMessage, Reconciler};
pub use transport::{ChatTransport, HttpTransport};
