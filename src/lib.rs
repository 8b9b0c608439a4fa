//! # bladed-reader
//!
//! A reader for Bladed simulation results.
//! A run is a set of text descriptor files (`<run>.%NN`) paired with binary
//! data files (`<run>.$NN`); channels are decoded lazily into `ndarray` arrays.
pub mod bladed;

// Re-export the main types for convenience
pub use bladed::{
    index::ChannelIndex,
    iter::ChannelIter,
    result::BladedResult,
    types::{
        config::{ByteOrderKind, ReaderConfig, RecordLayout, SuffixRule},
        error::{BladedError, Result},
        models::{
            Axis,
            AxisValues,
            ChannelData,
            ChannelDescriptor,
            ChannelLocation,
            DecodedChannel,
            DeclaredChannel,
            Descriptor,
            DescriptorHeader,
            Dimensionality,
            ElementType,
            NumericFormat,
            PartFiles,
            RunManifest,
        },
    },
};
