//! Push-progress channel plumbing

pub mod hub;

pub use hub::{ProgressEmitter, ProgressHub};
