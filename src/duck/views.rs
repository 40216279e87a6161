//! DuckDB views over a model's Parquet output
//!
//! The directory mapping file lists, per model, where its Parquet tree was
//! unpacked. Every subdirectory of that tree becomes a view reading all
//! Parquet files beneath it. Enumeration follows a top-down walk: the
//! children of a directory are listed before descending into the first of
//! them, and it stops at the first partition directory (`dataFileId=`)
//! below `data`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use walkdir::WalkDir;

use super::runner::{Database, SqlRunner};
use super::sql::{quote_ident, quote_path};
use super::DuckError;

/// Marker of the first partition directory; enumeration stops there
pub const PARTITION_MARKER: &str = "datadataFileId=";

/// Entry of the directory mapping file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DirectoryMapping {
    pub name: String,
    pub parquet_path: PathBuf,
}

/// A view to create
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDefinition {
    pub name: String,
    pub directory: PathBuf,
}

impl ViewDefinition {
    /// Glob over every Parquet file under the directory
    pub fn parquet_glob(&self) -> PathBuf {
        self.directory.join("**").join("*.parquet")
    }

    pub fn create_statement(&self) -> String {
        format!(
            "CREATE OR REPLACE VIEW {} AS SELECT * FROM {};",
            quote_ident(&self.name),
            quote_path(&self.parquet_glob())
        )
    }

    pub fn preview_statement(&self) -> String {
        format!("select * from {} limit 2;", quote_ident(&self.name))
    }
}

/// Look up the Parquet directory of a model in the mapping file
pub fn read_model_directory(mapping_file: &Path, model_name: &str) -> Result<PathBuf, DuckError> {
    let text = fs::read_to_string(mapping_file).map_err(|e| DuckError::Mapping {
        path: mapping_file.display().to_string(),
        message: e.to_string(),
    })?;
    let entries: Vec<DirectoryMapping> =
        serde_json::from_str(&text).map_err(|e| DuckError::Mapping {
            path: mapping_file.display().to_string(),
            message: e.to_string(),
        })?;

    entries
        .into_iter()
        .find(|e| e.name == model_name)
        .map(|e| e.parquet_path)
        .ok_or_else(|| DuckError::ModelNotFound {
            model: model_name.to_string(),
        })
}

/// Subdirectories of `dir`, sorted by name
fn child_directories(dir: &Path) -> Result<Vec<PathBuf>, DuckError> {
    let mut children = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_dir() {
            children.push(entry.into_path());
        }
    }
    Ok(children)
}

/// All subdirectories of `root` in top-down walk order
pub fn find_subdirectories(root: &Path) -> Result<Vec<PathBuf>, DuckError> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let children = child_directories(&dir)?;
        // Visit the first child next, as a recursive walk would
        pending.extend(children.iter().rev().cloned());
        found.extend(children);
    }

    Ok(found)
}

/// View name: the path below the model directory with separators removed
pub fn view_name(model_directory: &Path, directory: &Path) -> String {
    let relative = directory
        .strip_prefix(model_directory)
        .unwrap_or(directory)
        .to_string_lossy();
    relative.chars().filter(|c| *c != '/' && *c != '\\').collect()
}

/// Views for every subdirectory up to the first partition directory
pub fn plan_views(model_directory: &Path) -> Result<Vec<ViewDefinition>, DuckError> {
    let mut views = Vec::new();

    for directory in find_subdirectories(model_directory)? {
        let name = view_name(model_directory, &directory);
        if name.contains(PARTITION_MARKER) {
            break;
        }
        views.push(ViewDefinition { name, directory });
    }

    Ok(views)
}

/// Create the views for `model_name` in `database`.
///
/// With `verbose`, each statement is printed and followed by a two-row
/// preview of the new view.
pub fn configure_views(
    runner: &dyn SqlRunner,
    database: &Path,
    mapping_file: &Path,
    model_name: &str,
    verbose: bool,
) -> Result<Vec<ViewDefinition>, DuckError> {
    println!("Setting up DUCK Views - using {}", database.display());

    let model_directory = read_model_directory(mapping_file, model_name)?;
    println!(
        "Solution data found for {}: {}",
        model_name,
        model_directory.display()
    );

    let views = plan_views(&model_directory)?;
    let target = Database::file(database);
    tracing::info!("Creating {} view(s) for {}", views.len(), model_name);

    if verbose {
        for view in &views {
            let create = view.create_statement();
            println!("{}", create);
            let output = runner.run(&target, &[create, view.preview_statement()])?;
            print!("{}", output);
        }
    } else if !views.is_empty() {
        let statements: Vec<String> = views.iter().map(ViewDefinition::create_statement).collect();
        runner.run(&target, &statements)?;
    }

    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_tree(root: &Path, dirs: &[&str]) {
        for dir in dirs {
            fs::create_dir_all(root.join(dir)).unwrap();
        }
    }

    #[test]
    fn test_view_name_strips_separators() {
        let root = Path::new("/sim/model");
        assert_eq!(view_name(root, Path::new("/sim/model/fullkeyinfo")), "fullkeyinfo");
        assert_eq!(
            view_name(root, Path::new("/sim/model/data/dataFileId=1")),
            "datadataFileId=1"
        );
    }

    #[test]
    fn test_top_down_order() {
        let temp = TempDir::new().unwrap();
        make_tree(temp.path(), &["a/x/deep", "a/y", "b/z"]);

        let found = find_subdirectories(temp.path()).unwrap();
        let names: Vec<String> = found.iter().map(|p| view_name(temp.path(), p)).collect();
        assert_eq!(names, vec!["a", "b", "ax", "ay", "axdeep", "bz"]);
    }

    #[test]
    fn test_plan_stops_at_partition_directory() {
        let temp = TempDir::new().unwrap();
        make_tree(
            temp.path(),
            &["Period", "data/dataFileId=1", "data/dataFileId=2", "fullkeyinfo"],
        );

        let views = plan_views(temp.path()).unwrap();
        let names: Vec<&str> = views.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Period", "data", "fullkeyinfo"]);
    }

    #[test]
    fn test_create_statement() {
        let view = ViewDefinition {
            name: "fullkeyinfo".to_string(),
            directory: PathBuf::from("/sim/model/fullkeyinfo"),
        };
        assert_eq!(
            view.create_statement(),
            "CREATE OR REPLACE VIEW fullkeyinfo AS SELECT * FROM '/sim/model/fullkeyinfo/**/*.parquet';"
        );
        assert_eq!(view.preview_statement(), "select * from fullkeyinfo limit 2;");
    }

    #[test]
    fn test_model_lookup() {
        let temp = TempDir::new().unwrap();
        let mapping = temp.path().join("directorymapping.json");
        fs::write(
            &mapping,
            r#"[{"Name": "Base", "ParquetPath": "/sim/base"}, {"Name": "High", "ParquetPath": "/sim/high"}]"#,
        )
        .unwrap();

        assert_eq!(read_model_directory(&mapping, "High").unwrap(), PathBuf::from("/sim/high"));

        let err = read_model_directory(&mapping, "Low").unwrap_err();
        assert_eq!(err.to_string(), "Unable to find output for model name provided Low");
    }

    #[test]
    fn test_missing_mapping_file() {
        let err = read_model_directory(Path::new("/nonexistent/map.json"), "Base").unwrap_err();
        assert!(matches!(err, DuckError::Mapping { .. }));
    }
}
