//! Core Bladed result reader module.
//!
//! ```text
//! BladedResult::scan()
//!   ├─ discovery::discover      directory listing → descriptor/data parts
//!   ├─ format::header::parse    descriptor text   → declared channels
//!   └─ ChannelIndex::build      all parts         → name → location
//! BladedResult::lookup(name)
//!   └─ codec::decoder           data file         → ndarray (cached)
//! ```

pub mod codec;
pub mod discovery;
pub mod format;
pub mod index;
pub mod iter;
pub mod result;
pub mod types;
