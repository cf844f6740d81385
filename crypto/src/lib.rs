//! FlightSurety Cryptographic Primitives
//!
//! Hashing used to derive oracle index assignments deterministically.

pub mod hash;

pub use hash::hash_to_index;
