//! Host-facing errors: misuse of the [`Context`](crate::context::Context)
//! API itself, distinct from [`Status`](crate::context::Status) which
//! reports script execution outcomes.

use thiserror::Error;

/// An error raised by host-facing setup calls, never by script execution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    /// A host interface's name collides with a built-in control word
    /// (`if`, `then`, `elseif`, `else`, `endif`, `or`, `and`, `yield`).
    #[error("interface name \"{0}\" is reserved for a built-in control word")]
    ReservedName(String),
    /// Two host interfaces (or a host interface and a built-in) share a
    /// name.
    #[error("interface name \"{0}\" is registered more than once")]
    DuplicateName(String),
}
