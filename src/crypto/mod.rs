//! The crypto module contains our cryptographic primitives for key
//! generation, signing, and verification.

pub mod base;
pub mod sign;
