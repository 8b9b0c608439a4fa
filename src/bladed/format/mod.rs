//! Descriptor file parsing layer.
//!
//! - [`keywords`]: the keyword table and value conversions
//! - [`header`]: turns one descriptor file into a [`Descriptor`](crate::Descriptor)
//! - [`units`]: translation of dimension codes to SI units

pub mod header;
pub mod keywords;
pub mod units;
