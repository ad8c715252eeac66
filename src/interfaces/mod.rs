//! Readers for external data formats.

pub mod csv;
