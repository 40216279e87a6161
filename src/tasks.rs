//! Small workflow utilities

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use walkdir::WalkDir;

use crate::config::Settings;
use crate::wait::Clock;

/// Utility task errors
#[derive(Debug, thiserror::Error)]
pub enum UtilityError {
    #[error("Failed to remove {path}: {source}")]
    Remove {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Print the simulation id and the resolved paths
pub fn print_environment(settings: &Settings, out: &mut dyn Write) -> io::Result<()> {
    match &settings.simulation_id {
        Some(id) => writeln!(out, "{}", id)?,
        None => writeln!(out, "simulation_id is not set")?,
    }
    writeln!(out, "simulation_path: {}", settings.simulation_path.display())?;
    writeln!(out, "output_path: {}", settings.output_path.display())?;
    writeln!(out, "duck_db_path: {}", settings.duck_db_path().display())?;
    writeln!(out, "reference database: {}", settings.reference_db_path().display())?;
    writeln!(out, "memberships file: {}", settings.memberships_csv_path().display())?;
    Ok(())
}

/// Every file under `root` in walk order; nothing when `root` is missing
pub fn list_files(root: &Path) -> Result<Vec<PathBuf>, UtilityError> {
    let mut files = Vec::new();
    if !root.exists() {
        return Ok(files);
    }
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Remove each file, stopping at the first failure
pub fn remove_files(files: &[PathBuf]) -> Result<(), UtilityError> {
    for file in files {
        println!("Cleaning {}", file.display());
        fs::remove_file(file).map_err(|source| UtilityError::Remove {
            path: file.display().to_string(),
            source,
        })?;
    }
    Ok(())
}

/// Sleep `interval` at a time until `total` has elapsed, printing the local
/// time after each sleep. Returns the number of ticks.
pub fn sleep_loop(total: Duration, interval: Duration, clock: &dyn Clock) -> u32 {
    let start = clock.elapsed();
    let mut ticks = 0;

    while clock.elapsed().saturating_sub(start) < total {
        clock.sleep(interval);
        ticks += 1;
        println!("Current time: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
        let _ = io::stdout().flush();
    }

    ticks
}
