//! Synthetic result directories for the integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::Path;

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

/// One output group: a descriptor and the shape of its data file.
pub struct Group<'a> {
    pub format: &'a str,
    pub dimens: Vec<usize>,
    pub names: Vec<&'a str>,
    pub units: Vec<&'a str>,
}

impl<'a> Group<'a> {
    /// Scalar `R*4` channels over `samples` samples.
    pub fn scalar(names: &[&'a str], units: &[&'a str], samples: usize) -> Self {
        Self {
            format: "R*4",
            dimens: vec![names.len(), samples],
            names: names.to_vec(),
            units: units.to_vec(),
        }
    }

    pub fn width(&self) -> usize {
        self.format
            .split_once('*')
            .and_then(|(_, w)| w.parse().ok())
            .unwrap_or(4)
    }
}

/// Renders a descriptor the way the simulator writes it, including a
/// statistics block the reader must skip.
pub fn descriptor_text(data_file: &str, group: &Group) -> String {
    let mut text = String::new();
    text.push_str(&format!("FILE\t{}\n", data_file));
    text.push_str("ACCESS\tD\n");
    text.push_str("FORM\tF\n");
    text.push_str(&format!("RECL\t{}\n", group.width()));
    text.push_str(&format!("FORMAT\t{}\n", group.format));
    text.push_str("CONTENT\t'TEST'\n");
    text.push_str("CONFIG\t'STATIONARY'\n");
    text.push_str(&format!("NDIMENS\t{}\n", group.dimens.len()));
    let dimens: Vec<String> = group.dimens.iter().map(|d| d.to_string()).collect();
    text.push_str(&format!("DIMENS\t{}\n", dimens.join("\t")));
    text.push_str("GENLAB\t'Test variables'\n");
    let names: Vec<String> = group.names.iter().map(|n| format!("'{}'", n)).collect();
    text.push_str(&format!("VARIAB\t{}\n", names.join(" ")));
    text.push_str(&format!("VARUNIT\t{}\n", group.units.join(" ")));
    let secondary = &group.dimens[1..group.dimens.len() - 1];
    for (k, size) in secondary.iter().enumerate() {
        text.push_str(&format!("AXISLAB\t'Index {}'\n", k + 1));
        text.push_str("AXIUNIT\tN\n");
        text.push_str("AXIMETH\t3\n");
        let values: Vec<String> = (0..*size).map(|v| format!("{}.0", v)).collect();
        text.push_str(&format!("AXIVAL\t{}\n", values.join(" ")));
    }
    text.push_str("AXISLAB\t'Time'\n");
    text.push_str("AXIUNIT\tT\n");
    text.push_str("AXIMETH\t2\n");
    text.push_str("MIN \t0.0000000E+000\n");
    text.push_str("STEP\t5.0000001E-002\n");
    text.push_str("NVARS\t0\n");
    text.push_str("ULOADS   7.1592855E+006   7.5046815E+006\n");
    text.push_str("   7.0032420E+006   7.3428640E+006\n");
    text.push_str("MEAN   7.0889532E+006   7.4307285E+006\n");
    text
}

/// Writes `<run>.%<part>` and `<run>.$<part>`.
pub fn write_part(dir: &Path, run: &str, part: &str, group: &Group, data: &[u8]) {
    let data_name = format!("{}.${}", run, part);
    fs::write(
        dir.join(format!("{}.%{}", run, part)),
        descriptor_text(&data_name, group),
    )
    .expect("write descriptor");
    fs::write(dir.join(data_name), data).expect("write data");
}

pub fn f32_le(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for v in values {
        out.write_f32::<LittleEndian>(*v).expect("write f32");
    }
    out
}

pub fn f32_be(values: &[f32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for v in values {
        out.write_f32::<BigEndian>(*v).expect("write f32");
    }
    out
}

pub fn f64_le(values: &[f64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 8);
    for v in values {
        out.write_f64::<LittleEndian>(*v).expect("write f64");
    }
    out
}

pub fn i32_le(values: &[i32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for v in values {
        out.write_i32::<LittleEndian>(*v).expect("write i32");
    }
    out
}

/// Interleaved values of scalar channels: record `t` holds `value(channel, t)`
/// for every channel.
pub fn interleaved(channels: usize, samples: usize, value: impl Fn(usize, usize) -> f32) -> Vec<f32> {
    let mut out = Vec::with_capacity(channels * samples);
    for t in 0..samples {
        for c in 0..channels {
            out.push(value(c, t));
        }
    }
    out
}

/// The generator descriptor used by several tests: torque and power over 100 samples.
pub fn write_generator_run(dir: &Path, run: &str, part: &str) {
    let group = Group::scalar(&["Generator torque", "Electrical power"], &["kNm", "kW"], 100);
    let values = interleaved(2, 100, |c, t| if c == 0 { t as f32 * 0.5 } else { 1000.0 + t as f32 });
    write_part(dir, run, part, &group, &f32_le(&values));
}
