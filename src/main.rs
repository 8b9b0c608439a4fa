use bladed_reader::{BladedResult, ReaderConfig};
use bladed_reader::bladed::format::units::si_unit;
use std::env;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} <result-dir> <run-name> [--config <file.toml>] [--channel <name>]...",
            args[0]
        );
        std::process::exit(1);
    }

    let result_dir = &args[1];
    let run_name = &args[2];
    let mut config_path: Option<&str> = None;
    let mut channels: Vec<&str> = Vec::new();

    let mut rest = args[3..].iter();
    while let Some(arg) = rest.next() {
        match arg.as_str() {
            "--config" | "--channel" => {
                let Some(value) = rest.next() else {
                    eprintln!("ERROR: {} flag requires an argument.", arg);
                    std::process::exit(1);
                };
                if arg == "--config" {
                    config_path = Some(value.as_str());
                } else {
                    channels.push(value.as_str());
                }
            }
            other => {
                eprintln!("ERROR: Unknown argument '{}'.", other);
                std::process::exit(1);
            }
        }
    }

    let config = match config_path {
        Some(path) => match ReaderConfig::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("ERROR: Failed to load configuration");
                eprintln!("  {}", e);
                std::process::exit(1);
            }
        },
        None => ReaderConfig::default(),
    };

    println!("Reading Bladed run '{}' in {}", run_name, result_dir);
    println!("{}", "=".repeat(60));

    let mut result = BladedResult::with_config(result_dir, run_name.as_str(), config);
    if let Err(e) = result.scan() {
        eprintln!("\nERROR: Failed to scan result directory");
        eprintln!("  {}", e);
        std::process::exit(1);
    }

    // A successful scan always yields a manifest and an index.
    let (Ok(manifest), Ok(index)) = (result.manifest(), result.index()) else {
        std::process::exit(1);
    };

    println!("\nRun Information:");
    println!("  Parts: {}", manifest.parts.len());
    for part in &manifest.parts {
        println!("    {} -> {}", part.descriptor.display(), part.data.display());
    }
    println!("  Samples: {}", manifest.sample_count());
    if let (Some(start), Some(step)) = (manifest.start_time(), manifest.time_step()) {
        println!("  Time axis: start {} step {}", start, step);
    }

    println!("\nChannels ({}):", index.len());
    for channel in index.iter() {
        let unit = match si_unit(&channel.unit) {
            Some(si) => format!("{} [{}]", channel.unit, si),
            None => channel.unit.clone(),
        };
        println!(
            "  [{}] {} ({}) {:?} {}",
            channel.part,
            channel.name,
            unit,
            channel.shape(),
            channel.format
        );
    }

    let mut failed = false;
    for name in channels {
        match result.lookup(name) {
            Ok(channel) => {
                let values = channel.data.to_f64();
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let mean = values.mean().unwrap_or(f64::NAN);
                println!("\n{} [{}]", channel.name, channel.unit);
                println!("  Shape: {:?}", channel.shape());
                println!("  Min: {}  Max: {}  Mean: {}", min, max, mean);
            }
            Err(e) => {
                eprintln!("\nERROR: {}", e);
                failed = true;
            }
        }
    }

    if failed {
        std::process::exit(1);
    }
}
