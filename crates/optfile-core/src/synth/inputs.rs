//! Step-input helpers shared by the synthesizers

use crate::error::{PrepError, PrepResult};
use crate::keys;
use crate::types::ParameterSet;
use std::path::{Path, PathBuf};

const GENERATOR_EXTENSIONS: [&str; 2] = [".stdhep", ".hepevt"];

/// Random seed for a job step
///
/// An explicit seed wins; otherwise the production id and job id are
/// concatenated, otherwise the job id alone is used.
///
/// # Errors
/// Returns [`PrepError::FieldMissing`] naming the seed key when none of the
/// three is available
pub fn derive_seed(params: &ParameterSet) -> PrepResult<String> {
    if let Some(seed) = params.text(keys::SEED) {
        return Ok(seed);
    }
    match (params.int(keys::PRODUCTION_ID), params.int(keys::JOB_ID)) {
        (Some(production), Some(job)) => Ok(format!("{production}{job}")),
        (None, Some(job)) => Ok(job.to_string()),
        _ => Err(PrepError::field_missing(keys::SEED)),
    }
}

/// First generator event file in the job's input data
#[must_use]
pub fn pick_generator_file(input_data: &[String]) -> Option<&str> {
    input_data
        .iter()
        .map(String::as_str)
        .find(|name| {
            let lower = name.to_ascii_lowercase();
            GENERATOR_EXTENSIONS.iter().any(|ext| lower.contains(ext))
        })
}

/// Logical names of the generator file for a step
///
/// Taken from the generator parameter (a list, or `;`-separated text),
/// else picked from the job input data.
#[must_use]
pub fn generator_names(params: &ParameterSet) -> Vec<String> {
    let names: Vec<String> = params
        .list(keys::GENERATOR_FILE)
        .iter()
        .flat_map(|entry| entry.split(';'))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();
    if !names.is_empty() {
        return names;
    }
    pick_generator_file(&params.list(keys::INPUT_DATA))
        .map(|name| vec![name.to_string()])
        .unwrap_or_default()
}

/// Locate a user mac or steering file
///
/// Looked up by base name in the working directory, then in the
/// installation's steering directory.
///
/// # Errors
/// Returns [`PrepError::ResourceNotFound`] naming the file when neither
/// holds it
pub fn locate_mac(name: &str, working_dir: &Path, steering_dir: Option<&Path>) -> PrepResult<PathBuf> {
    let base = Path::new(name)
        .file_name()
        .ok_or_else(|| PrepError::resource_not_found(name))?;
    let candidates = std::iter::once(working_dir).chain(steering_dir);
    for dir in candidates {
        let path = dir.join(base);
        if path.is_file() {
            tracing::debug!(name, path = %path.display(), "mac file located");
            return Ok(path);
        }
    }
    Err(PrepError::resource_not_found(name))
}
