//! Run discovery: finding the descriptor/data file pairs of one run.
//!
//! A run named `powprod_12ms` writes files such as `powprod_12ms.%06` (a
//! descriptor) and `powprod_12ms.$06` (its data). The text after the role
//! marker is the part id; files of the same id and rule form one part.
//! Ids rejected by the rule's part pattern belong to sidecar files such as
//! `powprod_12ms.$PJ` and are skipped.
//!
//! The naming rule itself is [`group_run_files`], a pure function over a
//! directory listing. [`discover`] performs the listing.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, info};
use regex::Regex;

use crate::bladed::types::config::SuffixRule;
use crate::bladed::types::error::{BladedError, Result};
use crate::bladed::types::models::PartFiles;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Descriptor,
    Data,
}

/// Orders part ids: numeric ids by value, then the rest lexicographically.
fn compare_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Classifies one file name against the run name and the suffix rules.
///
/// Returns the rule index, role and part id for files of the run.
fn classify<'a>(
    name: &'a str,
    run: &str,
    rules: &[(&SuffixRule, Regex)],
) -> Option<(usize, Role, &'a str)> {
    let rest = name.strip_prefix(run)?.strip_prefix('.')?;
    rules.iter().enumerate().find_map(|(index, (rule, part))| {
        let (role, id) = if let Some(id) = rest.strip_prefix(rule.descriptor.as_str()) {
            (Role::Descriptor, id)
        } else if let Some(id) = rest.strip_prefix(rule.data.as_str()) {
            (Role::Data, id)
        } else {
            return None;
        };
        if id.is_empty() {
            return None;
        }
        if !part.is_match(id) {
            debug!("Skipping {}: part id '{}' is not a run part", name, id);
            return None;
        }
        Some((index, role, id))
    })
}

/// Groups the file names of a directory listing into the parts of one run.
///
/// Parts are returned in discovery order: by part id (see module docs), then
/// by the position of the matching rule in `rules`. Names that do not belong
/// to the run, or whose part id the rule's pattern rejects, are ignored.
///
/// # Errors
/// - [`BladedError::Config`] if a rule's part pattern is not a valid regex
/// - [`BladedError::RunNotFound`] if no name belongs to the run
/// - [`BladedError::MalformedRun`] if a descriptor has no data file or a
///   data file has no descriptor
pub fn group_run_files<I, S>(
    directory: &Path,
    names: I,
    run: &str,
    rules: &[SuffixRule],
) -> Result<Vec<PartFiles>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let compiled = rules
        .iter()
        .map(|rule| rule.part_regex().map(|regex| (rule, regex)))
        .collect::<Result<Vec<_>>>()?;

    // (rule index, part id) -> (descriptor name, data name)
    let mut groups: BTreeMap<(usize, String), (Option<String>, Option<String>)> = BTreeMap::new();

    for name in names {
        let name = name.as_ref();
        let Some((rule, role, id)) = classify(name, run, &compiled) else {
            continue;
        };
        let slot = groups.entry((rule, id.to_string())).or_default();
        match role {
            Role::Descriptor => slot.0 = Some(name.to_string()),
            Role::Data => slot.1 = Some(name.to_string()),
        }
    }

    if groups.is_empty() {
        return Err(BladedError::RunNotFound {
            directory: directory.to_path_buf(),
            run: run.to_string(),
        });
    }

    let mut keys: Vec<&(usize, String)> = groups.keys().collect();
    keys.sort_by(|a, b| compare_ids(&a.1, &b.1).then(a.0.cmp(&b.0)));

    let mut parts = Vec::with_capacity(keys.len());
    for key in keys {
        let (rule_index, id) = key;
        let rule = &rules[*rule_index];
        match &groups[key] {
            (Some(descriptor), Some(data)) => parts.push(PartFiles {
                id: id.clone(),
                descriptor: directory.join(descriptor),
                data: directory.join(data),
            }),
            (Some(descriptor), None) => {
                return Err(BladedError::MalformedRun {
                    path: directory.join(descriptor),
                    reason: format!(
                        "descriptor has no data file (expected {}.{}{})",
                        run, rule.data, id
                    ),
                });
            }
            (None, Some(data)) => {
                return Err(BladedError::MalformedRun {
                    path: directory.join(data),
                    reason: format!(
                        "data file has no descriptor (expected {}.{}{})",
                        run, rule.descriptor, id
                    ),
                });
            }
            (None, None) => {}
        }
    }

    Ok(parts)
}

/// Lists `directory` and groups the files belonging to `run`.
pub fn discover(directory: &Path, run: &str, rules: &[SuffixRule]) -> Result<Vec<PartFiles>> {
    info!("Discovering run '{}' in {}", run, directory.display());

    let mut names = Vec::new();
    for entry in fs::read_dir(directory).map_err(BladedError::io(directory))? {
        let entry = entry.map_err(BladedError::io(directory))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(name) => debug!("Skipping non UTF-8 file name {:?}", name),
        }
    }

    let parts = group_run_files(directory, &names, run, rules)?;
    for part in &parts {
        debug!(
            "Part {}: {} + {}",
            part.id,
            part.descriptor.display(),
            part.data.display()
        );
    }
    Ok(parts)
}
