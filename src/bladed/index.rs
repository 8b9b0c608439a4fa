//! The channel index: every channel name of a run mapped to its location.
//!
//! # Layout
//!
//! All channels of one data file share the element format and the `DIMENS`
//! of their descriptor. With `nvars` channels, `count` elements per channel
//! (the product of `DIMENS[1..]`) and element width `w`:
//!
//! ```text
//! Interleaved (simulator default)      Sequential
//! ┌────┬────┬────┐ record 0            ┌──────────────┐
//! │ c0 │ c1 │ c2 │                     │ c0 × count   │
//! ├────┼────┼────┤ record 1            ├──────────────┤
//! │ c0 │ c1 │ c2 │                     │ c1 × count   │
//! └────┴────┴────┘ ... count records   └──────────────┘ ...
//! offset = i·w, stride = nvars·w       offset = i·count·w, stride = w
//! ```
//!
//! Within one channel, elements run with the secondary indices fastest and
//! the sample index slowest, i.e. the reverse of `DIMENS[1..]`.

use std::collections::HashMap;

use log::{debug, warn};

use crate::bladed::types::config::RecordLayout;
use crate::bladed::types::error::{BladedError, Result};
use crate::bladed::types::models::{
    ChannelDescriptor, ChannelLocation, Descriptor, DescriptorHeader, PartFiles,
};

/// Computes where the channel at `position` of a descriptor is stored.
pub fn locate(header: &DescriptorHeader, position: usize, layout: RecordLayout) -> ChannelLocation {
    let width = header.format.width as u64;
    let nvars = header.channel_count() as u64;
    let count = header.elements_per_channel();
    let position = position as u64;

    let (offset, stride) = match layout {
        RecordLayout::Interleaved => (position * width, nvars * width),
        RecordLayout::Sequential => (position * count as u64 * width, width),
    };

    ChannelLocation {
        offset,
        stride,
        count,
        element_width: header.format.width,
        file_len: header.data_len,
    }
}

/// Mapping from channel name to its [`ChannelDescriptor`].
///
/// When several declarations share a name, the one seen last in discovery
/// order replaces the earlier ones.
#[derive(Debug, Clone, Default)]
pub struct ChannelIndex {
    channels: HashMap<String, ChannelDescriptor>,
    order: Vec<String>,
}

impl ChannelIndex {
    /// Builds the index from parsed parts, visited in the given order.
    pub fn build<'a, I>(parts: I, layout: RecordLayout) -> Self
    where
        I: IntoIterator<Item = (&'a PartFiles, &'a Descriptor)>,
    {
        let mut index = ChannelIndex::default();

        for (part, descriptor) in parts {
            let header = &descriptor.header;
            if let Some(file) = &header.file {
                let paired = part.data.file_name().and_then(|n| n.to_str());
                if paired != Some(file.as_str()) {
                    warn!(
                        "Descriptor {} names data file '{}', using {}",
                        descriptor.path.display(),
                        file,
                        part.data.display()
                    );
                }
            }

            for channel in &descriptor.channels {
                let entry = ChannelDescriptor {
                    name: channel.name.clone(),
                    unit: channel.unit.clone(),
                    dimensionality: header.dimensionality,
                    sample_count: header.sample_count(),
                    part: part.id.clone(),
                    data_file: part.data.clone(),
                    format: header.format.clone(),
                    record_length: header.record_length,
                    location: locate(header, channel.position, layout),
                    group_label: header.group_label.clone(),
                    time_axis: header.time_axis().clone(),
                    secondary_axes: header.secondary_axes().to_vec(),
                };
                index.insert(entry);
            }
            debug!("Indexed part {}: {} channels", part.id, descriptor.channels.len());
        }

        index
    }

    fn insert(&mut self, entry: ChannelDescriptor) {
        let name = entry.name.clone();
        if let Some(previous) = self.channels.insert(name.clone(), entry) {
            warn!(
                "Channel '{}' of part {} is redeclared; the later declaration wins",
                name, previous.part
            );
            self.order.retain(|n| n != &name);
        }
        self.order.push(name);
    }

    /// Returns the descriptor of `name`.
    pub fn lookup(&self, name: &str) -> Result<&ChannelDescriptor> {
        self.channels
            .get(name)
            .ok_or_else(|| BladedError::ChannelNotFound {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Channel names in discovery order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Descriptors in discovery order.
    pub fn iter(&self) -> impl Iterator<Item = &ChannelDescriptor> {
        self.order.iter().filter_map(|name| self.channels.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
