//! Adapters implementing the domain ports.

pub mod feed;
pub mod in_memory;
