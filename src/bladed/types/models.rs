//! Core data structures for Bladed result components.
//!
//! This module defines the types used throughout the library:
//! - Descriptor contents (format, dimensions, axes, declared channels)
//! - Run layout (parts and manifest)
//! - Channel locations and decoded channel data

use std::fmt;
use std::path::PathBuf;

use ndarray::ArrayD;

/// The element format declared by a descriptor's `FORMAT` keyword.
///
/// Bladed writes `<kind>*<width>`, e.g. `R*4` for a 4-byte float. The token is
/// kept verbatim; [`NumericFormat::element_type`] resolves it for decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericFormat {
    pub kind: char,
    pub width: usize,
}

impl NumericFormat {
    /// Returns the decodable element type, if this kind/width pair is supported.
    pub fn element_type(&self) -> Option<ElementType> {
        match (self.kind, self.width) {
            ('R', 4) => Some(ElementType::F32),
            ('R', 8) => Some(ElementType::F64),
            ('I', 4) => Some(ElementType::I32),
            _ => None,
        }
    }
}

impl fmt::Display for NumericFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}*{}", self.kind, self.width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    F32,
    F64,
    I32,
}

impl ElementType {
    pub fn width(&self) -> usize {
        match self {
            ElementType::F32 | ElementType::I32 => 4,
            ElementType::F64 => 8,
        }
    }
}

/// Shape of one channel beyond the time axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimensionality {
    /// One value per sample.
    Scalar,
    /// One row of `n` values per sample (e.g. per blade station).
    Indexed2D(usize),
    /// An `n` by `m` block of values per sample.
    Indexed3D(usize, usize),
}

impl Dimensionality {
    /// Derives the channel dimensionality from `DIMENS`, whose first entry is
    /// the channel count and whose last entry is the sample count.
    pub fn from_dimens(dimens: &[usize]) -> Option<Self> {
        match dimens {
            [_, _] => Some(Dimensionality::Scalar),
            [_, n, _] => Some(Dimensionality::Indexed2D(*n)),
            [_, m, n, _] => Some(Dimensionality::Indexed3D(*n, *m)),
            _ => None,
        }
    }

    /// Number of values per sample, or `None` if it overflows `usize`.
    pub fn secondary_len(&self) -> Option<usize> {
        match self {
            Dimensionality::Scalar => Some(1),
            Dimensionality::Indexed2D(n) => Some(*n),
            Dimensionality::Indexed3D(n, m) => n.checked_mul(*m),
        }
    }

    /// Array shape of a channel holding `samples` samples.
    pub fn shape(&self, samples: usize) -> Vec<usize> {
        match self {
            Dimensionality::Scalar => vec![samples],
            Dimensionality::Indexed2D(n) => vec![samples, *n],
            Dimensionality::Indexed3D(n, m) => vec![samples, *n, *m],
        }
    }
}

/// Values attached to one descriptor axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AxisValues {
    /// `MIN` and `STEP`: evenly spaced values.
    Regular { start: f64, step: f64 },
    /// `AXIVAL`: one value per index.
    Explicit(Vec<f64>),
    /// `AXITICK`: one label per index.
    Ticks(Vec<String>),
    #[default]
    Unspecified,
}

/// A non-channel dimension of a descriptor: the time axis or a secondary axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Axis {
    pub label: Option<String>,
    pub unit: Option<String>,
    /// The `AXIMETH` code as written.
    pub method: Option<i64>,
    pub size: usize,
    pub values: AxisValues,
}

impl Axis {
    /// Numeric axis positions, when the axis carries numeric values.
    pub fn positions(&self) -> Option<Vec<f64>> {
        match &self.values {
            AxisValues::Regular { start, step } => {
                Some((0..self.size).map(|i| start + step * i as f64).collect())
            }
            AxisValues::Explicit(values) => Some(values.clone()),
            AxisValues::Ticks(_) | AxisValues::Unspecified => None,
        }
    }

    pub fn start(&self) -> Option<f64> {
        match &self.values {
            AxisValues::Regular { start, .. } => Some(*start),
            AxisValues::Explicit(values) => values.first().copied(),
            _ => None,
        }
    }

    pub fn step(&self) -> Option<f64> {
        match &self.values {
            AxisValues::Regular { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// A channel as declared by a descriptor, before it is located in a data file.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredChannel {
    pub name: String,
    pub unit: String,
    /// Position in the descriptor's `VARIAB` list.
    pub position: usize,
}

/// Group-level contents of one descriptor file.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorHeader {
    /// The data file named by `FILE`, if present.
    pub file: Option<String>,
    pub access: Option<String>,
    pub form: Option<String>,
    pub content: Option<String>,
    pub config: Option<String>,
    pub group_label: Option<String>,
    /// Declared element width (`RECL`).
    pub record_length: Option<usize>,
    pub format: NumericFormat,
    /// `DIMENS` as written: channel count, secondary sizes, sample count.
    pub dimens: Vec<usize>,
    pub dimensionality: Dimensionality,
    /// Axes for `DIMENS[1..]`; the last one is the time axis.
    pub axes: Vec<Axis>,
    pub var_offset: Option<f64>,
    pub var_scale: Option<Vec<f64>>,
    /// Elements stored per channel (the product of `DIMENS[1..]`).
    pub element_count: usize,
    /// Expected data file length in bytes.
    pub data_len: u64,
}

impl DescriptorHeader {
    pub fn channel_count(&self) -> usize {
        self.dimens[0]
    }

    pub fn sample_count(&self) -> usize {
        self.dimens[self.dimens.len() - 1]
    }

    /// The last axis, describing the sample dimension.
    pub fn time_axis(&self) -> &Axis {
        &self.axes[self.axes.len() - 1]
    }

    /// Axes between the channel and time dimensions, in `DIMENS` order.
    pub fn secondary_axes(&self) -> &[Axis] {
        &self.axes[..self.axes.len() - 1]
    }

    /// Elements stored per channel.
    pub fn elements_per_channel(&self) -> usize {
        self.element_count
    }
}

/// A fully parsed descriptor file.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub path: PathBuf,
    pub header: DescriptorHeader,
    /// Channels in file order.
    pub channels: Vec<DeclaredChannel>,
}

/// A descriptor file and its paired data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartFiles {
    /// The text after the role marker, e.g. `06` for `run.%06`.
    pub id: String,
    pub descriptor: PathBuf,
    pub data: PathBuf,
}

/// The file set and shared time axis of one run.
#[derive(Debug, Clone)]
pub struct RunManifest {
    pub directory: PathBuf,
    pub run_name: String,
    /// Parts in discovery order.
    pub parts: Vec<PartFiles>,
    pub time_axis: Axis,
}

impl RunManifest {
    pub fn sample_count(&self) -> usize {
        self.time_axis.size
    }

    pub fn start_time(&self) -> Option<f64> {
        self.time_axis.start()
    }

    pub fn time_step(&self) -> Option<f64> {
        self.time_axis.step()
    }
}

/// Where a channel's values sit inside its data file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelLocation {
    /// Byte offset of the first element.
    pub offset: u64,
    /// Distance in bytes between consecutive elements.
    pub stride: u64,
    /// Number of elements.
    pub count: usize,
    pub element_width: usize,
    /// Size the whole data file must have.
    pub file_len: u64,
}

/// Metadata of one channel, located in its data file.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelDescriptor {
    pub name: String,
    pub unit: String,
    pub dimensionality: Dimensionality,
    pub sample_count: usize,
    pub part: String,
    pub data_file: PathBuf,
    pub format: NumericFormat,
    pub record_length: Option<usize>,
    pub location: ChannelLocation,
    pub group_label: Option<String>,
    pub time_axis: Axis,
    pub secondary_axes: Vec<Axis>,
}

impl ChannelDescriptor {
    pub fn shape(&self) -> Vec<usize> {
        self.dimensionality.shape(self.sample_count)
    }
}

/// Decoded values in the element type declared by the descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelData {
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    I32(ArrayD<i32>),
}

impl ChannelData {
    pub fn shape(&self) -> &[usize] {
        match self {
            ChannelData::F32(a) => a.shape(),
            ChannelData::F64(a) => a.shape(),
            ChannelData::I32(a) => a.shape(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChannelData::F32(a) => a.len(),
            ChannelData::F64(a) => a.len(),
            ChannelData::I32(a) => a.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn element_type(&self) -> ElementType {
        match self {
            ChannelData::F32(_) => ElementType::F32,
            ChannelData::F64(_) => ElementType::F64,
            ChannelData::I32(_) => ElementType::I32,
        }
    }

    /// Widens every element to `f64`.
    pub fn to_f64(&self) -> ArrayD<f64> {
        match self {
            ChannelData::F32(a) => a.mapv(f64::from),
            ChannelData::F64(a) => a.clone(),
            ChannelData::I32(a) => a.mapv(f64::from),
        }
    }

    pub fn as_f32(&self) -> Option<&ArrayD<f32>> {
        match self {
            ChannelData::F32(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&ArrayD<f64>> {
        match self {
            ChannelData::F64(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<&ArrayD<i32>> {
        match self {
            ChannelData::I32(a) => Some(a),
            _ => None,
        }
    }
}

/// A materialized channel.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedChannel {
    pub name: String,
    pub unit: String,
    pub dimensionality: Dimensionality,
    pub data: ChannelData,
}

impl DecodedChannel {
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}
