//! Membership extraction from the reference SQLite database

use std::path::Path;

use super::runner::{Database, SqlRunner};
use super::sql::quote_path;
use super::DuckError;

/// Parent/child object memberships with their classes and collection
pub const MEMBERSHIP_QUERY: &str = "select cl1.Name as parent_class, cl2.Name as child_class, col.Name as collection, obj1.Name as parent_object, obj2.Name as child_object, '' as subcollection_name
    from t_membership mem
    inner join t_object obj1 on obj1.object_id = mem.parent_object_id
    inner join t_object obj2 on obj2.object_id = mem.child_object_id
    inner join t_collection col on col.collection_id = mem.collection_id
    inner join t_class cl1 on cl1.class_id = mem.parent_class_id
    inner join t_class cl2 on cl2.class_id = mem.child_class_id";

/// Statements that attach `reference_db` and make it the default catalog
pub fn attach_statements(reference_db: &Path) -> Vec<String> {
    vec![
        "INSTALL sqlite;".to_string(),
        "LOAD sqlite;".to_string(),
        format!("ATTACH {} (TYPE SQLITE);", quote_path(reference_db)),
        "USE reference;".to_string(),
    ]
}

/// Write the membership table to CSV and print it.
///
/// Runs in an in-memory database; the reference database is only read.
pub fn write_memberships(
    runner: &dyn SqlRunner,
    reference_db: &Path,
    csv_path: &Path,
) -> Result<(), DuckError> {
    println!(
        "Configuring Duck to look at existing sqlite database: {}",
        reference_db.display()
    );
    println!("Reading membership data from {}", reference_db.display());

    let mut statements = attach_statements(reference_db);
    statements.push(format!(
        "COPY ({}) TO {} WITH (HEADER, DELIMITER ',');",
        MEMBERSHIP_QUERY,
        quote_path(csv_path)
    ));
    statements.push(format!("{};", MEMBERSHIP_QUERY));

    let output = runner.run(&Database::InMemory, &statements)?;
    print!("{}", output);
    println!("Membership information written to {}", csv_path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duck::RecordingRunner;

    #[test]
    fn test_attach_statements() {
        let statements = attach_statements(Path::new("/simulation/reference.db"));
        assert_eq!(statements[2], "ATTACH '/simulation/reference.db' (TYPE SQLITE);");
        assert_eq!(statements[3], "USE reference;");
    }

    #[test]
    fn test_write_memberships_runs_in_memory() {
        let runner = RecordingRunner::new().with_output("parent_class | child_class\n");
        write_memberships(
            &runner,
            Path::new("/simulation/reference.db"),
            Path::new("/output/memberships_data.csv"),
        )
        .unwrap();

        let scripts = runner.scripts();
        assert_eq!(scripts.len(), 1);
        assert_eq!(scripts[0].database, Database::InMemory);
        assert_eq!(scripts[0].statements.len(), 6);
        assert!(scripts[0].statements[4].starts_with("COPY (select cl1.Name"));
        assert!(scripts[0].statements[4].ends_with("TO '/output/memberships_data.csv' WITH (HEADER, DELIMITER ',');"));
    }
}
