pub mod schedule;
pub mod tags;
pub mod translation;

mod error;

pub use error::{Error, Result};
pub use translation::{TranslationStatus, Transition};
