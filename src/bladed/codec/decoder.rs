//! Binary data decoding for one located channel.
//!
//! The data file is opened for the duration of a single decode. Only the
//! requested channel's elements are copied out of the read buffer; values of
//! other channels are skipped over.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use log::{debug, trace, warn};
use ndarray::{ArrayD, IxDyn};

use crate::bladed::types::config::ByteOrderKind;
use crate::bladed::types::error::{BladedError, Result};
use crate::bladed::types::models::{
    ChannelData, ChannelDescriptor, ChannelLocation, DecodedChannel, ElementType,
};

/// Reads and decodes one channel from its data file.
///
/// # Errors
/// - [`BladedError::UnsupportedEncoding`] if the declared format is not
///   `R*4`, `R*8` or `I*4`, or `RECL` disagrees with the format width
/// - [`BladedError::Truncated`] if the data file is shorter than its
///   descriptor requires
/// - [`BladedError::Io`] if the file cannot be opened or read
pub fn decode_channel(channel: &ChannelDescriptor, byte_order: ByteOrderKind) -> Result<DecodedChannel> {
    let path = channel.data_file.as_path();
    let element = resolve_element_type(channel)?;
    let location = channel.location;

    let file = File::open(path).map_err(BladedError::io(path))?;
    let found = file.metadata().map_err(BladedError::io(path))?.len();
    if found < location.file_len {
        return Err(BladedError::Truncated {
            path: path.to_path_buf(),
            expected: location.file_len,
            found,
        });
    }
    if found > location.file_len {
        warn!(
            "Data file {} holds {} bytes, descriptor declares {}; trailing bytes ignored",
            path.display(),
            found,
            location.file_len
        );
    }

    debug!(
        "Decoding '{}' from {}: {} x {} at offset {}, stride {}",
        channel.name,
        path.display(),
        location.count,
        channel.format,
        location.offset,
        location.stride
    );

    let mut reader = BufReader::new(file);
    let raw = read_elements(&mut reader, &location).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            BladedError::Truncated {
                path: path.to_path_buf(),
                expected: location.file_len,
                found,
            }
        } else {
            BladedError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let shape = channel.shape();
    let data = match byte_order {
        ByteOrderKind::Little => to_channel_data::<LittleEndian>(&raw, element, &shape)?,
        ByteOrderKind::Big => to_channel_data::<BigEndian>(&raw, element, &shape)?,
    };

    Ok(DecodedChannel {
        name: channel.name.clone(),
        unit: channel.unit.clone(),
        dimensionality: channel.dimensionality,
        data,
    })
}

fn resolve_element_type(channel: &ChannelDescriptor) -> Result<ElementType> {
    let unsupported = |format: String| BladedError::UnsupportedEncoding {
        path: channel.data_file.clone(),
        format,
    };
    let element = channel
        .format
        .element_type()
        .ok_or_else(|| unsupported(channel.format.to_string()))?;
    match channel.record_length {
        Some(recl) if recl != element.width() => Err(unsupported(format!(
            "{} with RECL {}",
            channel.format, recl
        ))),
        _ => Ok(element),
    }
}

/// Copies the channel's elements into one contiguous buffer.
fn read_elements<R: Read + Seek>(reader: &mut BufReader<R>, location: &ChannelLocation) -> io::Result<Vec<u8>> {
    let width = location.element_width;
    let mut raw = vec![0u8; location.count * width];
    reader.seek(SeekFrom::Start(location.offset))?;

    let gap = location.stride as i64 - width as i64;
    if gap == 0 {
        trace!("Contiguous read of {} bytes", raw.len());
        reader.read_exact(&mut raw)?;
        return Ok(raw);
    }

    trace!("Strided read: {} elements, {} bytes skipped between", location.count, gap);
    for (i, element) in raw.chunks_exact_mut(width).enumerate() {
        if i > 0 {
            reader.seek_relative(gap)?;
        }
        reader.read_exact(element)?;
    }
    Ok(raw)
}

fn to_channel_data<B: ByteOrder>(raw: &[u8], element: ElementType, shape: &[usize]) -> Result<ChannelData> {
    let count = raw.len() / element.width();
    let shape_error =
        |e: ndarray::ShapeError| BladedError::InvalidFormat(format!("cannot shape {} elements as {:?}: {}", count, shape, e));

    let data = match element {
        ElementType::F32 => {
            let mut values = vec![0f32; count];
            B::read_f32_into(raw, &mut values);
            ChannelData::F32(ArrayD::from_shape_vec(IxDyn(shape), values).map_err(shape_error)?)
        }
        ElementType::F64 => {
            let mut values = vec![0f64; count];
            B::read_f64_into(raw, &mut values);
            ChannelData::F64(ArrayD::from_shape_vec(IxDyn(shape), values).map_err(shape_error)?)
        }
        ElementType::I32 => {
            let mut values = vec![0i32; count];
            B::read_i32_into(raw, &mut values);
            ChannelData::I32(ArrayD::from_shape_vec(IxDyn(shape), values).map_err(shape_error)?)
        }
    };
    Ok(data)
}
