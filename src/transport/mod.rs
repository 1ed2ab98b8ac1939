//! ### Sending Messages
//!
//! The message is sent with the [`smtp`] transport, over a single blocking
//! session opened for each invocation.

pub mod smtp;
