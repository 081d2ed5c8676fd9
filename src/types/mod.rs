//! Data model for the recruitment hierarchy

mod person;
mod rank;

pub use person::{Person, PersonId, Sex};
pub use rank::Rank;
