//! JSON-lines input of verification events and JSON output of session outcomes.

pub mod event_reader;
pub mod outcome_writer;
