//! Sequential decoding of all channels of a run.
//!
//! [`ChannelIter`] decodes one channel per step and hands ownership to the
//! caller, so at most one decoded channel is held by the reader at a time.
//!
//! # Example
//! ```no_run
//! # use bladed_reader::BladedResult;
//! let mut result = BladedResult::new("results", "stab_analysis_run");
//! result.scan()?;
//! for channel in result.iter_channels()? {
//!     let channel = channel?;
//!     println!("{}: {:?}", channel.name, channel.shape());
//! }
//! # Ok::<(), bladed_reader::BladedError>(())
//! ```

use super::codec::decoder;
use super::index::ChannelIndex;
use super::types::config::ByteOrderKind;
use super::types::error::Result;
use super::types::models::{ChannelDescriptor, DecodedChannel};

/// Iterator over decoded channels in discovery order.
///
/// Created by [`BladedResult::iter_channels()`](crate::BladedResult::iter_channels).
pub struct ChannelIter<'a> {
    channels: Box<dyn Iterator<Item = &'a ChannelDescriptor> + 'a>,
    byte_order: ByteOrderKind,
}

impl<'a> ChannelIter<'a> {
    pub(super) fn new(index: &'a ChannelIndex, byte_order: ByteOrderKind) -> Self {
        Self {
            channels: Box::new(index.iter()),
            byte_order,
        }
    }
}

impl<'a> Iterator for ChannelIter<'a> {
    type Item = Result<DecodedChannel>;

    fn next(&mut self) -> Option<Self::Item> {
        let descriptor = self.channels.next()?;
        Some(decoder::decode_channel(descriptor, self.byte_order))
    }
}
