//! Application layer orchestrating a payment verification attempt.
//!
//! This module defines the `VerificationSession` which owns the card form and
//! bridges server-pushed verification events into lifecycle state held by the
//! injected store. It is driven from a single `tokio` task.

pub mod session;
