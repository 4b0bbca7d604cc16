// Service exports
pub mod cmop;

pub use cmop::{CmopClient, CmopEntity, CmopError, Snapshot};
