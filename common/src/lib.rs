//! FlightSurety Common Types
//!
//! Shared types used across the FlightSurety protocol: principals and
//! composite keys, premium and stake amounts, flight status codes, the
//! airline admission state machine, emitted events and the error taxonomy.

pub mod identifiers;
pub mod monetary;
pub mod status;
pub mod events;
pub mod error;
pub mod time;

pub use identifiers::*;
pub use monetary::*;
pub use status::*;
pub use events::*;
pub use error::*;
pub use time::*;
