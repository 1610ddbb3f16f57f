//! The identity module holds the data an account publishes about itself: its
//! [address], the [claims][claim] it makes, and the [document] that collects
//! them.

pub mod address;
pub mod claim;
pub mod document;

pub use address::*;
pub use claim::*;
pub use document::*;
