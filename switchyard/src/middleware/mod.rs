//! Standard middleware.
//!
//! - [`Logging`]: logs each request and its outcome
//! - [`Timeout`]: bounds how long the rest of a chain may run

mod logging;
mod timeout;

pub use logging::Logging;
pub use timeout::{Timeout, TimeoutError};
