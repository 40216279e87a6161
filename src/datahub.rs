//! Data hub transfers and solution downloads

use std::path::{Path, PathBuf};

use globset::{Glob, GlobSetBuilder};
use prepost_cloud::{CommandResponse, SolutionType};
use walkdir::WalkDir;

use crate::cloud::{CloudClient, CloudError};

/// Data hub task errors
#[derive(Debug, thiserror::Error)]
pub enum DatahubError {
    #[error(transparent)]
    Cloud(#[from] CloudError),

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Print the messages the CLI reported for a command and return them
pub fn print_messages(responses: &[CommandResponse]) -> Vec<String> {
    let messages: Vec<String> = responses
        .iter()
        .filter_map(|r| r.message.clone())
        .collect();
    for message in &messages {
        println!("{}", message);
    }
    messages
}

/// Download remote files matching `pattern` into `output_path`.
///
/// Returns the messages the CLI printed about the transfer.
pub fn download(client: &CloudClient, pattern: &str, output_path: &Path) -> Result<Vec<String>, DatahubError> {
    println!(
        "Downloading Data: {} to: {}",
        pattern,
        output_path.display()
    );
    let responses = client.datahub_download(&[pattern.to_string()], output_path)?;
    Ok(print_messages(&responses))
}

/// Local files under `folder` matching `pattern`, relative to `folder`, sorted
pub fn matching_files(folder: &Path, pattern: &str) -> Result<Vec<PathBuf>, DatahubError> {
    let mut builder = GlobSetBuilder::new();
    builder.add(Glob::new(pattern)?);
    let set = builder.build()?;

    let mut matches = Vec::new();
    if !folder.is_dir() {
        return Ok(matches);
    }

    for entry in WalkDir::new(folder).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry.path().strip_prefix(folder).unwrap_or(entry.path());
        if set.is_match(relative) {
            matches.push(relative.to_path_buf());
        }
    }

    Ok(matches)
}

/// Upload files under `output_path` matching `pattern` to `remote_path`.
///
/// Uploads are unversioned. Returns the local files the pattern matched;
/// the upload is still attempted when none match.
pub fn upload(
    client: &CloudClient,
    pattern: &str,
    remote_path: &str,
    output_path: &Path,
) -> Result<Vec<PathBuf>, DatahubError> {
    println!("Uploading Data: {} to: {}", pattern, remote_path);

    let files = matching_files(output_path, pattern)?;
    if files.is_empty() {
        tracing::warn!(
            "No files under {} match {}",
            output_path.display(),
            pattern
        );
    }
    for file in &files {
        tracing::debug!("Matched {}", file.display());
    }

    let responses = client.datahub_upload(output_path, remote_path, &[pattern.to_string()], false)?;
    print_messages(&responses);
    Ok(files)
}

/// Download every kind of solution data, overwriting existing files
pub fn download_solution_data(
    client: &CloudClient,
    solution_id: &str,
    output_directory: &Path,
) -> Result<(), DatahubError> {
    for solution_type in SolutionType::ALL {
        tracing::info!("Downloading {} for solution {}", solution_type, solution_id);
        let responses = client.download_solution(solution_id, output_directory, solution_type, true)?;
        print_messages(&responses);
    }

    println!("Solution data downloaded");
    Ok(())
}
