//! Provider-independent payment model and the ports the application layer
//! depends on.

pub mod ports;
pub mod price;
pub mod status;
pub mod transaction;
