//! Adapters implementing the domain ports.

pub mod channel_transport;
pub mod in_memory;
pub mod query;
