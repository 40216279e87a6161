//! Reporting extracts
//!
//! Builds the reporting views on top of the solution views and copies the
//! result to dated Parquet (and optionally CSV) files in the output directory.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{Local, NaiveDate, NaiveDateTime};

use super::runner::{Database, SqlRunner};
use super::sql::quote_path;
use super::DuckError;

/// Generation and available capacity of generators, per interval
pub const REGIONAL_GENERATION_CAPACITY_VIEW: &str = "CREATE OR REPLACE VIEW regional_generation_capacity AS
    SELECT
        key.*,
        d.PeriodId,
        d.Value
    FROM fullkeyinfo AS key
    INNER JOIN data d on d.SeriesId = key.SeriesId
    WHERE
        key.PeriodTypeName = 'Interval' AND
        key.PhaseName = 'ST' AND
        key.ParentClassName = 'System' AND
        key.ChildClassName = 'Generator' AND
        key.PropertyName IN ('Generation', 'Available Capacity');";

/// Totals of the capacity view per region and period
pub const REGION_AGGREGATE_TOTALS_VIEW: &str = "CREATE OR REPLACE VIEW region_aggregate_totals AS
    SELECT
        PhaseName, BandId, PeriodTypeName,
        ParentObjectCategoryName, ParentObjectName, ChildObjectCategoryName,
        ParentClassName, CollectionName, ChildClassName, PropertyName, UnitValue, TimesliceName, ModelName, SampleId, SampleName, PeriodId,
        SUM(Value) as TotalValue
    FROM regional_generation_capacity ag
    GROUP BY
        PhaseName, BandId, PeriodTypeName,
        ParentObjectCategoryName, ParentObjectName, ChildObjectCategoryName,
        ParentClassName, CollectionName, ChildClassName, PropertyName, UnitValue, TimesliceName, ModelName, SampleId, SampleName, PeriodId;";

/// Totals joined with period dates and stamped with the solution date
pub const REPORTING_DATA_VIEW: &str = "CREATE OR REPLACE VIEW reporting_data AS
    SELECT
        t.PhaseName, t.BandId, t.PeriodTypeName,
        t.ParentObjectCategoryName, t.ParentObjectName, t.ChildObjectCategoryName,
        t.ParentClassName, t.CollectionName, t.ChildClassName, t.PropertyName, t.UnitValue, t.TimesliceName, t.ModelName, t.SampleId, t.SampleName,
        p.StartDate, p.EndDate, current_localtimestamp() as SolutionDate,
        t.TotalValue
    FROM region_aggregate_totals t
    INNER JOIN Period p on p.PeriodId = t.PeriodId;";

/// System-level series for the sample report
pub const SAMPLE_QUERY: &str = "SELECT
        PhaseName, BandId, PeriodTypeName,
        ChildObjectName, ChildObjectCategoryName,
        ParentClassName, CollectionName, ChildClassName, PropertyName, UnitValue, TimesliceName, ModelName, SampleId, SampleName, d.PeriodId,
        Value
    FROM fullkeyinfo AS key
    INNER JOIN data d on d.SeriesId = key.SeriesId
    INNER JOIN Period p on p.PeriodId = d.PeriodId
    WHERE
        key.PeriodTypeName = 'Interval' AND
        key.PhaseName = 'ST' AND
        key.ParentClassName = 'System'
        AND key.PropertyName IN ('Load', 'Generation', 'Dump Energy', 'Price', 'Generation Capacity')";

/// `COPY (<query>) TO '<path>'` as zstd Parquet
pub fn copy_to_parquet(query: &str, path: &Path) -> String {
    format!(
        "COPY ({}) TO {} (FORMAT parquet, COMPRESSION zstd, ROW_GROUP_SIZE 100_000);",
        query,
        quote_path(path)
    )
}

/// `COPY` of a Parquet file to CSV
pub fn copy_parquet_to_csv(parquet: &Path, csv: &Path) -> String {
    format!(
        "COPY (select * from {}) TO {} (DELIMITER ',');",
        quote_path(parquet),
        quote_path(csv)
    )
}

/// `<output>/solution_data_<YYYY-MM-DD>.parquet`
pub fn report_path(output_path: &Path, date: NaiveDate) -> PathBuf {
    output_path.join(format!("solution_data_{}.parquet", date.format("%Y-%m-%d")))
}

/// `<output>/Report_<YYYYMMDD-HHMMSS>.parquet`
pub fn sample_report_path(output_path: &Path, at: NaiveDateTime) -> PathBuf {
    output_path.join(format!("Report_{}.parquet", at.format("%Y%m%d-%H%M%S")))
}

/// Same file name with a `.csv` extension
pub fn csv_path(parquet: &Path) -> PathBuf {
    parquet.with_extension("csv")
}

/// Files produced by [`write_report`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    pub parquet: PathBuf,
    pub csv: Option<PathBuf>,
}

/// Configure the reporting views and export `reporting_data`
pub fn write_report(
    runner: &dyn SqlRunner,
    database: &Path,
    output_path: &Path,
    date: NaiveDate,
    convert_csv: bool,
) -> Result<ReportFiles, DuckError> {
    let target = Database::file(database);
    let total = Instant::now();

    runner.run(
        &target,
        &[
            REGIONAL_GENERATION_CAPACITY_VIEW.to_string(),
            REGION_AGGREGATE_TOTALS_VIEW.to_string(),
            REPORTING_DATA_VIEW.to_string(),
        ],
    )?;

    let parquet = report_path(output_path, date);
    let step = Instant::now();
    runner.run(&target, &[copy_to_parquet("select * from reporting_data", &parquet)])?;
    println!(
        "{} produced in: {} seconds",
        parquet.display(),
        step.elapsed().as_secs_f64()
    );

    let csv = if convert_csv {
        let csv = csv_path(&parquet);
        let step = Instant::now();
        runner.run(&target, &[copy_parquet_to_csv(&parquet, &csv)])?;
        println!(
            "{} produced in: {} seconds",
            csv.display(),
            step.elapsed().as_secs_f64()
        );
        Some(csv)
    } else {
        None
    };

    println!(
        "Complete execution took: {} seconds",
        total.elapsed().as_secs_f64()
    );

    Ok(ReportFiles { parquet, csv })
}

/// Print the sample series query and export it as a timestamped Parquet file
pub fn sample_query(
    runner: &dyn SqlRunner,
    database: &Path,
    output_path: &Path,
) -> Result<PathBuf, DuckError> {
    let target = Database::file(database);

    println!("Starting DUCK");
    let output = runner.run(&target, &[format!("{};", SAMPLE_QUERY)])?;
    print!("{}", output);

    println!("Exporting");
    let path = sample_report_path(output_path, Local::now().naive_local());
    runner.run(&target, &[copy_to_parquet(SAMPLE_QUERY, &path)])?;
    tracing::info!("Sample report written to {}", path.display());

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::duck::RecordingRunner;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_report_path() {
        assert_eq!(
            report_path(Path::new("/output"), date()),
            PathBuf::from("/output/solution_data_2024-03-09.parquet")
        );
        assert_eq!(
            csv_path(&report_path(Path::new("/output"), date())),
            PathBuf::from("/output/solution_data_2024-03-09.csv")
        );
    }

    #[test]
    fn test_sample_report_path() {
        let at = date().and_hms_opt(14, 5, 7).unwrap();
        assert_eq!(
            sample_report_path(Path::new("/out"), at),
            PathBuf::from("/out/Report_20240309-140507.parquet")
        );
    }

    #[test]
    fn test_copy_statement() {
        assert_eq!(
            copy_to_parquet("select * from reporting_data", Path::new("/o/r.parquet")),
            "COPY (select * from reporting_data) TO '/o/r.parquet' (FORMAT parquet, COMPRESSION zstd, ROW_GROUP_SIZE 100_000);"
        );
    }

    #[test]
    fn test_write_report_without_csv() {
        let runner = RecordingRunner::new();
        let files = write_report(&runner, Path::new("/o/v.ddb"), Path::new("/o"), date(), false).unwrap();

        assert!(files.csv.is_none());
        let scripts = runner.scripts();
        assert_eq!(scripts.len(), 2);
        assert_eq!(scripts[0].statements.len(), 3);
        assert!(scripts[0].statements[2].contains("VIEW reporting_data"));
        assert_eq!(scripts[1].database, Database::file("/o/v.ddb"));
    }

    #[test]
    fn test_write_report_with_csv() {
        let runner = RecordingRunner::new();
        let files = write_report(&runner, Path::new("/o/v.ddb"), Path::new("/o"), date(), true).unwrap();

        assert_eq!(files.csv, Some(PathBuf::from("/o/solution_data_2024-03-09.csv")));
        let last = runner.statements().pop().unwrap();
        assert_eq!(
            last,
            "COPY (select * from '/o/solution_data_2024-03-09.parquet') TO '/o/solution_data_2024-03-09.csv' (DELIMITER ',');"
        );
    }

    #[test]
    fn test_view_failure_stops_export() {
        let runner = RecordingRunner::new().failing_on("region_aggregate_totals");
        let result = write_report(&runner, Path::new("/o/v.ddb"), Path::new("/o"), date(), true);

        assert!(result.is_err());
        assert_eq!(runner.scripts().len(), 1);
    }
}
