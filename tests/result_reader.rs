mod common;

use std::fs;
use std::sync::Arc;

use bladed_reader::{
    BladedError, BladedResult, ByteOrderKind, ChannelData, Dimensionality, ElementType,
    ReaderConfig, RecordLayout,
};
use common::{f32_be, f32_le, f64_le, i32_le, interleaved, write_generator_run, write_part, Group};
use ndarray::IxDyn;
use tempfile::TempDir;

fn scanned(dir: &TempDir, run: &str) -> BladedResult {
    let mut result = BladedResult::new(dir.path(), run);
    result.scan().expect("scan");
    result
}

#[test]
fn generator_run_end_to_end() {
    let tmp = TempDir::new().expect("tempdir");
    write_generator_run(tmp.path(), "powprod", "06");

    let mut result = scanned(&tmp, "powprod");
    let torque = result.lookup("Generator torque").expect("torque");
    assert_eq!(torque.unit, "kNm");
    assert_eq!(torque.dimensionality, Dimensionality::Scalar);
    assert_eq!(torque.shape(), &[100]);
    let values = torque.data.as_f32().expect("f32 data");
    for t in 0..100 {
        assert_eq!(values[IxDyn(&[t])], t as f32 * 0.5, "sample {}", t);
    }

    let power = result.lookup("Electrical power").expect("power");
    assert_eq!(power.unit, "kW");
    assert_eq!(power.data.to_f64()[IxDyn(&[99])], 1099.0);

    match result.lookup("Rotor speed") {
        Err(BladedError::ChannelNotFound { name }) => assert_eq!(name, "Rotor speed"),
        other => panic!("expected ChannelNotFound, got {:?}", other),
    }
}

#[test]
fn manifest_reports_parts_and_time_axis() {
    let tmp = TempDir::new().expect("tempdir");
    write_generator_run(tmp.path(), "powprod", "06");

    let result = scanned(&tmp, "powprod");
    let manifest = result.manifest().expect("manifest");
    assert_eq!(manifest.run_name, "powprod");
    assert_eq!(manifest.parts.len(), 1);
    assert_eq!(manifest.parts[0].data, tmp.path().join("powprod.$06"));
    assert_eq!(manifest.sample_count(), 100);
    assert_eq!(manifest.start_time(), Some(0.0));
    let step = manifest.time_step().expect("step");
    assert!((step - 0.05).abs() < 1e-6);

    let channel = result.channel("Generator torque").expect("descriptor");
    assert_eq!(channel.part, "06");
    assert_eq!(channel.location.offset, 0);
    assert_eq!(channel.location.stride, 8);
    assert_eq!(result.channel("Electrical power").expect("descriptor").location.offset, 4);
    assert_eq!(channel.group_label.as_deref(), Some("Test variables"));
}

#[test]
fn lookup_before_scan_fails() {
    let tmp = TempDir::new().expect("tempdir");
    write_generator_run(tmp.path(), "powprod", "06");

    let mut result = BladedResult::new(tmp.path(), "powprod");
    assert!(!result.is_scanned());
    assert!(matches!(result.lookup("Generator torque"), Err(BladedError::NotScanned)));
    assert!(matches!(result.channel_names(), Err(BladedError::NotScanned)));
    assert!(matches!(result.manifest(), Err(BladedError::NotScanned)));
    assert!(matches!(result.iter_channels(), Err(BladedError::NotScanned)));
}

#[test]
fn scan_of_missing_run_fails() {
    let tmp = TempDir::new().expect("tempdir");
    write_generator_run(tmp.path(), "powprod", "06");

    let mut result = BladedResult::new(tmp.path(), "absent");
    assert!(matches!(result.scan(), Err(BladedError::RunNotFound { .. })));
    assert!(!result.is_scanned());
}

#[test]
fn repeated_lookups_share_the_cached_array() {
    let tmp = TempDir::new().expect("tempdir");
    write_generator_run(tmp.path(), "powprod", "06");

    let mut result = scanned(&tmp, "powprod");
    let first = result.lookup("Generator torque").expect("first");
    let second = result.lookup("Generator torque").expect("second");
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(result.cached_len(), 1);

    result.scan().expect("rescan");
    assert_eq!(result.cached_len(), 0);
    let third = result.lookup("Generator torque").expect("third");
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(*first, *third);

    assert!(result.evict("Generator torque"));
    assert!(!result.evict("Generator torque"));
}

#[test]
fn rescan_is_idempotent() {
    let tmp = TempDir::new().expect("tempdir");
    write_generator_run(tmp.path(), "run", "01");
    let blade = Group {
        format: "R*4",
        dimens: vec![1, 3, 10],
        names: vec!["Blade Mx"],
        units: vec!["FL"],
    };
    write_part(tmp.path(), "run", "02", &blade, &f32_le(&[0.0; 30]));

    let mut result = scanned(&tmp, "run");
    let shapes = |r: &BladedResult| -> Vec<(String, Vec<usize>)> {
        r.index()
            .expect("index")
            .iter()
            .map(|c| (c.name.clone(), c.shape()))
            .collect()
    };
    let before = shapes(&result);
    result.scan().expect("rescan");
    assert_eq!(before, shapes(&result));
    assert_eq!(
        before,
        vec![
            ("Generator torque".to_string(), vec![100]),
            ("Electrical power".to_string(), vec![100]),
            ("Blade Mx".to_string(), vec![10, 3]),
        ]
    );
}

#[test]
fn truncated_data_file_fails() {
    let tmp = TempDir::new().expect("tempdir");
    write_generator_run(tmp.path(), "powprod", "06");
    let data = tmp.path().join("powprod.$06");
    let mut bytes = fs::read(&data).expect("read");
    bytes.pop();
    fs::write(&data, &bytes).expect("truncate");

    let mut result = scanned(&tmp, "powprod");
    for name in ["Generator torque", "Electrical power"] {
        match result.lookup(name) {
            Err(BladedError::Truncated { path, expected, found }) => {
                assert_eq!(path, data);
                assert_eq!(expected, 800);
                assert_eq!(found, 799);
            }
            other => panic!("expected Truncated for {}, got {:?}", name, other),
        }
    }
    assert_eq!(result.cached_len(), 0);
}

#[test]
fn oversized_data_file_still_decodes() {
    let tmp = TempDir::new().expect("tempdir");
    write_generator_run(tmp.path(), "powprod", "06");
    let data = tmp.path().join("powprod.$06");
    let mut bytes = fs::read(&data).expect("read");
    bytes.extend_from_slice(&[0xAB; 8]);
    fs::write(&data, &bytes).expect("extend");

    let mut result = scanned(&tmp, "powprod");
    let power = result.lookup("Electrical power").expect("power");
    assert_eq!(power.shape(), &[100]);
    assert_eq!(power.data.to_f64()[IxDyn(&[0])], 1000.0);
}

#[test]
fn split_run_merges_channel_namespaces() {
    let tmp = TempDir::new().expect("tempdir");
    write_generator_run(tmp.path(), "run", "06");
    let rotor = Group::scalar(&["Rotor speed", "Pitch angle"], &["A/T", "A"], 100);
    let values = interleaved(2, 100, |c, t| (c * 10_000 + t) as f32);
    write_part(tmp.path(), "run", "05", &rotor, &f32_le(&values));

    let mut result = scanned(&tmp, "run");
    let names = result.channel_names().expect("names").to_vec();
    assert_eq!(names, ["Rotor speed", "Pitch angle", "Generator torque", "Electrical power"]);

    let speed = result.lookup("Rotor speed").expect("speed");
    assert_eq!(speed.data.to_f64()[IxDyn(&[42])], 42.0);
    let pitch = result.lookup("Pitch angle").expect("pitch");
    assert_eq!(pitch.data.to_f64()[IxDyn(&[42])], 10_042.0);
    let torque = result.lookup("Generator torque").expect("torque");
    assert_eq!(torque.data.to_f64()[IxDyn(&[42])], 21.0);
    assert_eq!(result.channel("Pitch angle").expect("pitch").part, "05");
    assert_eq!(result.manifest().expect("manifest").parts.len(), 2);
}

#[test]
fn later_part_wins_on_duplicate_names() {
    let tmp = TempDir::new().expect("tempdir");
    let first = Group::scalar(&["Shared", "Only first"], &["N", "N"], 4);
    write_part(tmp.path(), "run", "01", &first, &f32_le(&interleaved(2, 4, |c, _| c as f32 + 1.0)));
    let second = Group::scalar(&["Shared"], &["FL"], 4);
    write_part(tmp.path(), "run", "02", &second, &f32_le(&[9.0; 4]));

    let mut result = scanned(&tmp, "run");
    let names = result.channel_names().expect("names").to_vec();
    assert_eq!(names, ["Only first", "Shared"]);
    assert_eq!(result.index().expect("index").len(), 2);

    let shared = result.lookup("Shared").expect("shared");
    assert_eq!(shared.unit, "FL");
    assert!(shared.data.to_f64().iter().all(|v| *v == 9.0));
    assert_eq!(result.channel("Shared").expect("shared").part, "02");
}

#[test]
fn indexed_2d_channels_decode_per_sample_rows() {
    let tmp = TempDir::new().expect("tempdir");
    // 2 channels, 3 stations, 4 samples; stations vary fastest within a sample.
    let group = Group {
        format: "R*4",
        dimens: vec![2, 3, 4],
        names: vec!["Blade Mx", "Blade My"],
        units: vec!["FL", "FL"],
    };
    let value = |c: usize, t: usize, s: usize| (c * 1000 + t * 10 + s) as f32;
    let mut values = Vec::new();
    for t in 0..4 {
        for s in 0..3 {
            for c in 0..2 {
                values.push(value(c, t, s));
            }
        }
    }
    write_part(tmp.path(), "blade", "41", &group, &f32_le(&values));

    let mut result = scanned(&tmp, "blade");
    let descriptor = result.channel("Blade My").expect("descriptor");
    assert_eq!(descriptor.dimensionality, Dimensionality::Indexed2D(3));
    assert_eq!(descriptor.secondary_axes.len(), 1);
    assert_eq!(descriptor.secondary_axes[0].positions(), Some(vec![0.0, 1.0, 2.0]));

    for c in 0..2 {
        let name = if c == 0 { "Blade Mx" } else { "Blade My" };
        let channel = result.lookup(name).expect("channel");
        assert_eq!(channel.shape(), &[4, 3]);
        let data = channel.data.as_f32().expect("f32");
        for t in 0..4 {
            for s in 0..3 {
                assert_eq!(data[IxDyn(&[t, s])], value(c, t, s), "{} [{}, {}]", name, t, s);
            }
        }
    }
}

#[test]
fn indexed_3d_channels_decode_to_three_axes() {
    let tmp = TempDir::new().expect("tempdir");
    // DIMENS 2 3 4 5: channel shape is (5, 4, 3).
    let group = Group {
        format: "R*4",
        dimens: vec![2, 3, 4, 5],
        names: vec!["Load A", "Load B"],
        units: vec!["F", "F"],
    };
    let value = |c: usize, t: usize, a: usize, b: usize| (c * 1000 + t * 100 + a * 10 + b) as f32;
    let mut values = Vec::new();
    for t in 0..5 {
        for a in 0..4 {
            for b in 0..3 {
                for c in 0..2 {
                    values.push(value(c, t, a, b));
                }
            }
        }
    }
    write_part(tmp.path(), "tower", "01", &group, &f32_le(&values));

    let mut result = scanned(&tmp, "tower");
    let channel = result.lookup("Load B").expect("channel");
    assert_eq!(channel.dimensionality, Dimensionality::Indexed3D(4, 3));
    assert_eq!(channel.shape(), &[5, 4, 3]);
    let data = channel.data.as_f32().expect("f32");
    for t in 0..5 {
        for a in 0..4 {
            for b in 0..3 {
                assert_eq!(data[IxDyn(&[t, a, b])], value(1, t, a, b));
            }
        }
    }
}

#[test]
fn double_and_integer_formats_decode() {
    let tmp = TempDir::new().expect("tempdir");
    let doubles = Group {
        format: "R*8",
        dimens: vec![2, 3],
        names: vec!["Wind speed", "Direction"],
        units: vec!["L/T", "A"],
    };
    write_part(tmp.path(), "run", "01", &doubles, &f64_le(&[1.25, -1.0, 2.5, -2.0, 3.75, -3.0]));
    let ints = Group {
        format: "I*4",
        dimens: vec![1, 3],
        names: vec!["State"],
        units: vec!["N"],
    };
    write_part(tmp.path(), "run", "02", &ints, &i32_le(&[-7, 0, 42]));

    let mut result = scanned(&tmp, "run");
    let wind = result.lookup("Wind speed").expect("wind");
    assert_eq!(wind.data.element_type(), ElementType::F64);
    assert_eq!(wind.data.as_f64().expect("f64").iter().copied().collect::<Vec<_>>(), [1.25, 2.5, 3.75]);

    let state = result.lookup("State").expect("state");
    match &state.data {
        ChannelData::I32(values) => assert_eq!(values.iter().copied().collect::<Vec<_>>(), [-7, 0, 42]),
        other => panic!("expected I32 data, got {:?}", other),
    }
}

#[test]
fn unsupported_element_formats_fail_at_decode() {
    let tmp = TempDir::new().expect("tempdir");
    let shorts = Group {
        format: "I*2",
        dimens: vec![1, 4],
        names: vec!["Compressed"],
        units: vec!["N"],
    };
    write_part(tmp.path(), "run", "01", &shorts, &[0u8; 8]);

    let mut result = scanned(&tmp, "run");
    match result.lookup("Compressed") {
        Err(BladedError::UnsupportedEncoding { format, .. }) => assert_eq!(format, "I*2"),
        other => panic!("expected UnsupportedEncoding, got {:?}", other),
    }
}

#[test]
fn record_length_must_match_format() {
    let tmp = TempDir::new().expect("tempdir");
    write_generator_run(tmp.path(), "run", "01");
    let descriptor = tmp.path().join("run.%01");
    let text = fs::read_to_string(&descriptor).expect("read");
    fs::write(&descriptor, text.replace("RECL\t4", "RECL\t8")).expect("write");

    let mut result = scanned(&tmp, "run");
    assert!(matches!(
        result.lookup("Generator torque"),
        Err(BladedError::UnsupportedEncoding { .. })
    ));
}

#[test]
fn big_endian_configuration() {
    let tmp = TempDir::new().expect("tempdir");
    let group = Group::scalar(&["A", "B"], &["N", "N"], 3);
    write_part(tmp.path(), "run", "01", &group, &f32_be(&[1.0, 10.0, 2.0, 20.0, 3.0, 30.0]));

    let config = ReaderConfig {
        byte_order: ByteOrderKind::Big,
        ..ReaderConfig::default()
    };
    let mut result = BladedResult::with_config(tmp.path(), "run", config);
    result.scan().expect("scan");
    let b = result.lookup("B").expect("B");
    assert_eq!(b.data.to_f64().iter().copied().collect::<Vec<_>>(), [10.0, 20.0, 30.0]);
}

#[test]
fn sequential_layout_configuration() {
    let tmp = TempDir::new().expect("tempdir");
    let group = Group::scalar(&["A", "B"], &["N", "N"], 3);
    write_part(tmp.path(), "run", "01", &group, &f32_le(&[1.0, 2.0, 3.0, 10.0, 20.0, 30.0]));

    let config = ReaderConfig {
        layout: RecordLayout::Sequential,
        ..ReaderConfig::default()
    };
    let mut result = BladedResult::with_config(tmp.path(), "run", config);
    result.scan().expect("scan");
    let location = result.channel("B").expect("B").location;
    assert_eq!((location.offset, location.stride), (12, 4));
    let b = result.lookup("B").expect("B");
    assert_eq!(b.data.to_f64().iter().copied().collect::<Vec<_>>(), [10.0, 20.0, 30.0]);
}

#[test]
fn failed_rescan_keeps_previous_index() {
    let tmp = TempDir::new().expect("tempdir");
    write_generator_run(tmp.path(), "run", "01");

    let mut result = scanned(&tmp, "run");
    let torque = result.lookup("Generator torque").expect("torque");

    // A descriptor without data makes the run malformed.
    fs::write(tmp.path().join("run.%02"), "FORMAT\tR*4\n").expect("write");
    assert!(matches!(result.scan(), Err(BladedError::MalformedRun { .. })));

    assert!(result.is_scanned());
    assert_eq!(result.cached_len(), 1);
    let again = result.lookup("Generator torque").expect("still cached");
    assert!(Arc::ptr_eq(&torque, &again));
    assert!(result.channel("Electrical power").is_ok());

    // A broken descriptor fails the scan with a parse error and also keeps the index.
    fs::write(tmp.path().join("run.$02"), [0u8; 4]).expect("write");
    let err = result.scan().expect_err("broken descriptor");
    assert!(err.is_parse_error(), "unexpected error {:?}", err);
    assert!(result.channel("Electrical power").is_ok());
}

#[test]
fn caching_can_be_disabled() {
    let tmp = TempDir::new().expect("tempdir");
    write_generator_run(tmp.path(), "run", "01");

    let config = ReaderConfig {
        retain_decoded: false,
        ..ReaderConfig::default()
    };
    let mut result = BladedResult::with_config(tmp.path(), "run", config);
    result.scan().expect("scan");
    let first = result.lookup("Generator torque").expect("first");
    let second = result.lookup("Generator torque").expect("second");
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(*first, *second);
    assert_eq!(result.cached_len(), 0);
}

#[test]
fn iter_channels_decodes_in_index_order() {
    let tmp = TempDir::new().expect("tempdir");
    write_generator_run(tmp.path(), "run", "01");

    let result = scanned(&tmp, "run");
    let decoded: Vec<_> = result
        .iter_channels()
        .expect("iter")
        .map(|c| c.expect("decode"))
        .collect();
    let names: Vec<&str> = decoded.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["Generator torque", "Electrical power"]);
    assert!(decoded.iter().all(|c| c.shape() == [100]));
    assert_eq!(result.cached_len(), 0);
}

#[test]
fn toml_configuration_selects_suffixes() {
    let tmp = TempDir::new().expect("tempdir");
    let group = Group::scalar(&["A"], &["N"], 2);
    let data_name = "run.dat1";
    fs::write(tmp.path().join("run.hdr1"), common::descriptor_text(data_name, &group)).expect("write");
    fs::write(tmp.path().join(data_name), f32_le(&[5.0, 6.0])).expect("write");

    let config = ReaderConfig::from_toml_str(
        r#"
        byte_order = "little"
        layout = "interleaved"

        [[suffixes]]
        descriptor = "hdr"
        data = "dat"
        "#,
    )
    .expect("config");
    assert!(config.retain_decoded);

    let mut result = BladedResult::with_config(tmp.path(), "run", config);
    result.scan().expect("scan");
    let a = result.lookup("A").expect("A");
    assert_eq!(a.data.to_f64().iter().copied().collect::<Vec<_>>(), [5.0, 6.0]);

    let path = tmp.path().join("reader.toml");
    fs::write(&path, "retain_decoded = false\n").expect("write");
    let from_file = ReaderConfig::from_file(&path).expect("config file");
    assert!(!from_file.retain_decoded);
    assert_eq!(from_file.suffixes, ReaderConfig::default().suffixes);
}

#[test]
fn invalid_configuration_is_rejected() {
    for text in [
        "suffixes = []",
        "byte_order = \"middle\"",
        "unknown = 1",
        "[[suffixes]]\ndescriptor = \"%\"\ndata = \"%\"",
        "[[suffixes]]\ndescriptor = \"%\"\ndata = \"$\"\npart = \"(\"",
    ] {
        assert!(
            matches!(ReaderConfig::from_toml_str(text), Err(BladedError::Config { .. })),
            "accepted {:?}",
            text
        );
    }
}

#[test]
fn scan_ignores_project_and_message_files() {
    let tmp = TempDir::new().expect("tempdir");
    common::write_generator_run(tmp.path(), "powprod_12ms", "06");
    fs::write(tmp.path().join("powprod_12ms.$PJ"), "").expect("write");
    fs::write(tmp.path().join("powprod_12ms.$ME"), "").expect("write");

    let mut result = BladedResult::new(tmp.path(), "powprod_12ms");
    result.scan().expect("scan");
    assert_eq!(result.manifest().expect("manifest").parts.len(), 1);
    assert_eq!(result.lookup("Electrical power").expect("power").shape(), [100]);
}
