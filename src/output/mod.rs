//! Output formatters for engine event streams.
//!
//! The engines expose nothing but their event sequences; everything a
//! user sees (the CSV log, the summary) is derived here and in
//! [`crate::report`].

pub mod csv;

pub use csv::EventLog;
