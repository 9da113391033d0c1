//! Record payload formats

pub mod localiz;

pub use localiz::{LocalizationContainer, LocalizationRecord, decode};
