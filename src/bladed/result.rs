use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};

use super::codec::decoder;
use super::discovery;
use super::format;
use super::index::ChannelIndex;
use super::iter::ChannelIter;
use super::types::config::ReaderConfig;
use super::types::error::{BladedError, Result};
use super::types::models::{ChannelDescriptor, DecodedChannel, Descriptor, RunManifest};

/// The state produced by one successful scan.
#[derive(Debug)]
struct Scanned {
    manifest: RunManifest,
    index: ChannelIndex,
}

/// Access to the output of one simulation run.
///
/// Construction is free of I/O. [`scan`](Self::scan) reads the descriptor
/// files; channels are decoded on first [`lookup`](Self::lookup) and cached
/// until the next scan.
///
/// ```no_run
/// # use bladed_reader::BladedResult;
/// let mut result = BladedResult::new("results/2D", "powprod_12ms");
/// result.scan()?;
/// let torque = result.lookup("Generator torque")?;
/// println!("{:?} [{}]", torque.shape(), torque.unit);
/// # Ok::<(), bladed_reader::BladedError>(())
/// ```
#[derive(Debug)]
pub struct BladedResult {
    directory: PathBuf,
    run_name: String,
    config: ReaderConfig,
    scanned: Option<Scanned>,
    cache: HashMap<String, Arc<DecodedChannel>>,
}

impl BladedResult {
    /// Creates a reader for run `run_name` in `directory` with the default configuration.
    pub fn new(directory: impl AsRef<Path>, run_name: impl Into<String>) -> Self {
        Self::with_config(directory, run_name, ReaderConfig::default())
    }

    pub fn with_config(
        directory: impl AsRef<Path>,
        run_name: impl Into<String>,
        config: ReaderConfig,
    ) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            run_name: run_name.into(),
            config,
            scanned: None,
            cache: HashMap::new(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Discovers the run's files, parses every descriptor and rebuilds the
    /// channel index.
    ///
    /// The previous index and cache stay in place unless the whole scan
    /// succeeds; on success the cache is cleared.
    pub fn scan(&mut self) -> Result<()> {
        info!("Scanning run '{}' in {}", self.run_name, self.directory.display());

        let parts = discovery::discover(&self.directory, &self.run_name, &self.config.suffixes)?;
        let descriptors = parts
            .iter()
            .map(|part| format::header::parse_file(&part.descriptor))
            .collect::<Result<Vec<Descriptor>>>()?;

        let index = ChannelIndex::build(parts.iter().zip(&descriptors), self.config.layout);

        let time_axis = descriptors[0].header.time_axis().clone();
        for descriptor in &descriptors[1..] {
            let samples = descriptor.header.sample_count();
            if samples != time_axis.size {
                warn!(
                    "Descriptor {} declares {} samples, run time axis has {}",
                    descriptor.path.display(),
                    samples,
                    time_axis.size
                );
            }
        }

        let manifest = RunManifest {
            directory: self.directory.clone(),
            run_name: self.run_name.clone(),
            parts,
            time_axis,
        };

        info!(
            "Scan complete: {} parts, {} channels, {} samples",
            manifest.parts.len(),
            index.len(),
            manifest.sample_count()
        );

        self.scanned = Some(Scanned { manifest, index });
        self.cache.clear();
        Ok(())
    }

    pub fn is_scanned(&self) -> bool {
        self.scanned.is_some()
    }

    fn scanned(&self) -> Result<&Scanned> {
        self.scanned.as_ref().ok_or(BladedError::NotScanned)
    }

    pub fn manifest(&self) -> Result<&RunManifest> {
        Ok(&self.scanned()?.manifest)
    }

    pub fn index(&self) -> Result<&ChannelIndex> {
        Ok(&self.scanned()?.index)
    }

    /// Channel names in discovery order.
    pub fn channel_names(&self) -> Result<&[String]> {
        Ok(self.scanned()?.index.names())
    }

    /// Returns a channel's metadata without decoding it.
    pub fn channel(&self, name: &str) -> Result<&ChannelDescriptor> {
        self.scanned()?.index.lookup(name)
    }

    /// Returns the decoded channel `name`, reading it on first access.
    ///
    /// Repeated lookups return the same `Arc` until the next scan, unless
    /// `retain_decoded` is disabled in the configuration.
    pub fn lookup(&mut self, name: &str) -> Result<Arc<DecodedChannel>> {
        let scanned = self.scanned.as_ref().ok_or(BladedError::NotScanned)?;
        if let Some(channel) = self.cache.get(name) {
            return Ok(Arc::clone(channel));
        }

        let descriptor = scanned.index.lookup(name)?;
        let decoded = Arc::new(decoder::decode_channel(descriptor, self.config.byte_order)?);
        if self.config.retain_decoded {
            self.cache.insert(name.to_string(), Arc::clone(&decoded));
        }
        Ok(decoded)
    }

    /// Decodes every channel in discovery order without touching the cache.
    pub fn iter_channels(&self) -> Result<ChannelIter<'_>> {
        let scanned = self.scanned()?;
        Ok(ChannelIter::new(&scanned.index, self.config.byte_order))
    }

    /// Number of decoded channels currently cached.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    /// Drops one cached channel; returns whether it was cached.
    pub fn evict(&mut self, name: &str) -> bool {
        self.cache.remove(name).is_some()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
