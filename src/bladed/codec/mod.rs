//! Binary data codecs.
//!
//! Pure data handling lives here; file discovery and descriptor parsing are
//! handled by [`discovery`](crate::bladed::discovery) and
//! [`format`](crate::bladed::format).

pub mod decoder;
