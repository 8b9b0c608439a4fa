//! Descriptor file parsing.
//!
//! This module handles:
//! - Splitting descriptor lines into keyword/value pairs
//! - Converting known keywords and skipping everything else
//! - Assembling axis blocks (`AXISLAB` and the keywords following it)
//! - Validating declared counts against the listed channels and units

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use log::{debug, trace};

use super::keywords::{self, Value};
use crate::bladed::types::error::{BladedError, Result};
use crate::bladed::types::models::{
    Axis, AxisValues, DeclaredChannel, Descriptor, DescriptorHeader, Dimensionality, NumericFormat,
};

/// An axis block while its keywords are still being read.
#[derive(Debug, Default)]
struct AxisDraft {
    axis: Axis,
    min: Option<f64>,
    step: Option<f64>,
    explicit: Option<Vec<f64>>,
    ticks: Option<Vec<String>>,
}

impl AxisDraft {
    fn finish(self) -> Axis {
        let values = if let Some(values) = self.explicit {
            AxisValues::Explicit(values)
        } else if let Some(ticks) = self.ticks {
            AxisValues::Ticks(ticks)
        } else if let Some(step) = self.step {
            AxisValues::Regular {
                start: self.min.unwrap_or(0.0),
                step,
            }
        } else {
            AxisValues::Unspecified
        };
        Axis { values, ..self.axis }
    }
}

/// Returns the open axis block, opening an unlabelled one if none exists.
fn open_axis(axes: &mut Vec<AxisDraft>) -> &mut AxisDraft {
    if axes.is_empty() {
        axes.push(AxisDraft::default());
    }
    let last = axes.len() - 1;
    &mut axes[last]
}

/// Reads and parses a descriptor file.
///
/// Bytes that are not valid UTF-8 are replaced; names and units are
/// otherwise kept as written.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Descriptor> {
    let path = path.as_ref();
    debug!("Parsing descriptor {}", path.display());
    let bytes = fs::read(path).map_err(BladedError::io(path))?;
    let text = String::from_utf8_lossy(&bytes);
    parse_str(&text, path)
}

/// Parses descriptor text. `path` is only used for error reporting.
///
/// # Errors
/// - [`BladedError::Parse`] when a known keyword's value cannot be converted
///   or `NDIMENS` is outside 2..=4
/// - [`BladedError::MissingKeyword`] when a required keyword is absent
/// - [`BladedError::CountMismatch`] when `DIMENS`, `VARIAB`, `VARUNIT` or an
///   axis' values disagree in length
pub fn parse_str(text: &str, path: impl AsRef<Path>) -> Result<Descriptor> {
    let path = path.as_ref();
    let parse_error = |line: usize, message: String| BladedError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    };
    let count_mismatch = |item_type: &'static str, expected: usize, found: usize| {
        BladedError::CountMismatch {
            path: path.to_path_buf(),
            item_type,
            expected,
            found,
        }
    };

    let mut file = None;
    let mut access = None;
    let mut form = None;
    let mut content = None;
    let mut config = None;
    let mut group_label = None;
    let mut record_length = None;
    let mut format: Option<NumericFormat> = None;
    let mut ndimens: Option<(usize, i64)> = None;
    let mut dimens: Option<Vec<usize>> = None;
    let mut dimens_line = 0;
    let mut names: Option<Vec<String>> = None;
    let mut units: Option<Vec<String>> = None;
    let mut var_offset = None;
    let mut var_scale = None;
    let mut axes: Vec<AxisDraft> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        let Some((keyword, raw)) = keywords::split_line(line) else {
            trace!("line {}: no value, skipped", line_no);
            continue;
        };
        let Some(kind) = keywords::kind_of(keyword) else {
            trace!("line {}: unknown keyword {:?}, skipped", line_no, keyword);
            continue;
        };
        let value = keywords::convert(kind, raw)
            .map_err(|message| parse_error(line_no, format!("{}: {}", keyword, message)))?;
        seen.insert(keyword);

        match (keyword, value) {
            ("FILE", Value::Text(v)) => file = Some(v),
            ("ACCESS", Value::Text(v)) => access = Some(v),
            ("FORM", Value::Text(v)) => form = Some(v),
            ("CONTENT", Value::Text(v)) => content = Some(v),
            ("CONFIG", Value::Text(v)) => config = Some(v),
            ("GENLAB", Value::Text(v)) => group_label = Some(v),
            ("RECL", Value::Int(v)) => {
                let width = usize::try_from(v)
                    .map_err(|_| parse_error(line_no, format!("RECL: negative width {}", v)))?;
                record_length = Some(width);
            }
            ("FORMAT", Value::Format(v)) => format = Some(v),
            ("NDIMENS", Value::Int(v)) => ndimens = Some((line_no, v)),
            ("DIMENS", Value::IntList(v)) => {
                let sizes = v
                    .iter()
                    .map(|d| usize::try_from(*d))
                    .collect::<std::result::Result<Vec<_>, _>>()
                    .map_err(|_| parse_error(line_no, format!("DIMENS: negative size in {:?}", v)))?;
                dimens = Some(sizes);
                dimens_line = line_no;
            }
            ("VARIAB", Value::TextList(v)) => names = Some(v),
            ("VARUNIT", Value::TextList(v)) => units = Some(v),
            ("VAROFFSET", Value::Float(v)) => var_offset = Some(v),
            ("VARSCALE", Value::FloatList(v)) => var_scale = Some(v),
            ("AXISLAB", Value::Text(v)) => axes.push(AxisDraft {
                axis: Axis {
                    label: Some(v),
                    ..Axis::default()
                },
                ..AxisDraft::default()
            }),
            ("AXIUNIT", Value::Text(v)) => open_axis(&mut axes).axis.unit = Some(v),
            ("AXIMETH", Value::Int(v)) => open_axis(&mut axes).axis.method = Some(v),
            ("MIN", Value::Float(v)) => open_axis(&mut axes).min = Some(v),
            ("STEP", Value::Float(v)) => open_axis(&mut axes).step = Some(v),
            ("AXIVAL", Value::FloatList(v)) => open_axis(&mut axes).explicit = Some(v),
            ("AXITICK", Value::TextList(v)) => open_axis(&mut axes).ticks = Some(v),
            (other, _) => trace!("line {}: {} not used", line_no, other),
        }
    }

    let missing = |keyword: &'static str| BladedError::MissingKeyword {
        path: path.to_path_buf(),
        keyword,
    };
    if let Some(keyword) = keywords::REQUIRED.iter().find(|k| !seen.contains(*k)) {
        return Err(missing(*keyword));
    }
    let (ndimens_line, ndimens) = ndimens.ok_or_else(|| missing("NDIMENS"))?;
    let dimens = dimens.ok_or_else(|| missing("DIMENS"))?;
    let format = format.ok_or_else(|| missing("FORMAT"))?;
    let names = names.ok_or_else(|| missing("VARIAB"))?;
    let units = units.ok_or_else(|| missing("VARUNIT"))?;

    if !(2..=4).contains(&ndimens) {
        return Err(parse_error(
            ndimens_line,
            format!("NDIMENS: unsupported dimension count {}", ndimens),
        ));
    }
    let ndimens = ndimens as usize;
    if dimens.len() != ndimens {
        return Err(count_mismatch("dimensions", ndimens, dimens.len()));
    }
    if dimens[0] != names.len() {
        return Err(count_mismatch("channels", dimens[0], names.len()));
    }
    if units.len() != names.len() {
        return Err(count_mismatch("units", names.len(), units.len()));
    }
    let dimensionality = Dimensionality::from_dimens(&dimens).ok_or_else(|| {
        parse_error(ndimens_line, format!("NDIMENS: unsupported dimension count {}", ndimens))
    })?;

    let overflow = || {
        parse_error(dimens_line, format!("DIMENS: data size of {:?} overflows", dimens))
    };
    let element_count = dimensionality
        .secondary_len()
        .and_then(|n| n.checked_mul(dimens[dimens.len() - 1]))
        .ok_or_else(overflow)?;
    let data_len = u64::try_from(dimens[0])
        .ok()
        .zip(u64::try_from(format.width).ok())
        .and_then(|(nvars, width)| nvars.checked_mul(width))
        .and_then(|record| u64::try_from(element_count).ok()?.checked_mul(record))
        .ok_or_else(overflow)?;

    // Axis blocks describe DIMENS[1..]; missing leading blocks are unlabelled.
    let axis_count = ndimens - 1;
    if axes.len() > axis_count {
        return Err(count_mismatch("axes", axis_count, axes.len()));
    }
    let mut axes: Vec<Axis> = std::iter::repeat_with(Axis::default)
        .take(axis_count - axes.len())
        .chain(axes.into_iter().map(AxisDraft::finish))
        .collect();
    for (axis, size) in axes.iter_mut().zip(&dimens[1..]) {
        axis.size = *size;
        match &axis.values {
            AxisValues::Explicit(values) if values.len() != *size => {
                return Err(count_mismatch("axis values", *size, values.len()));
            }
            AxisValues::Ticks(ticks) if ticks.len() != *size => {
                return Err(count_mismatch("axis ticks", *size, ticks.len()));
            }
            _ => {}
        }
    }

    let channels = names
        .into_iter()
        .zip(units)
        .enumerate()
        .map(|(position, (name, unit))| DeclaredChannel {
            name,
            unit: unit.trim().to_string(),
            position,
        })
        .collect::<Vec<_>>();

    debug!(
        "Descriptor {}: {} channels, format {}, dimens {:?}",
        path.display(),
        channels.len(),
        format,
        dimens
    );

    Ok(Descriptor {
        path: path.to_path_buf(),
        header: DescriptorHeader {
            file,
            access,
            form,
            content,
            config,
            group_label,
            record_length,
            format,
            dimens,
            dimensionality,
            axes,
            var_offset,
            var_scale,
            element_count,
            data_len,
        },
        channels,
    })
}
