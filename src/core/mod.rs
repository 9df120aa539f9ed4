pub mod client;
pub mod cursor;
pub mod driver;
pub mod engine;
pub mod flatten;
pub mod normalizer;
pub mod params;
pub mod progress;
pub mod resolver;
pub mod tree;
pub mod walk;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::domain::ports::{Pipeline, Storage, Transport};
pub use crate::utils::error::Result;
