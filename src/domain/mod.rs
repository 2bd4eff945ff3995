//! Domain types: the payment form, request lifecycle, verification events,
//! the booking step, and the ports the session talks through.

pub mod booking;
pub mod event;
pub mod form;
pub mod lifecycle;
pub mod ports;
