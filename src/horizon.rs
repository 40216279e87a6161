//! Horizon parameter file
//!
//! Writes an `UndocumentedParam` XML document moving a model's horizon
//! (`Date From` and `Chrono Date From`) to a given date, expressed as an OLE
//! automation date.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

/// XML namespace of the parameter document
pub const XMLNS: &str = "http://tempuri.org/UndocumentedParam.xsd";

/// Default output file name
pub const DEFAULT_OUTPUT: &str = "filename.xml";

/// Date argument meaning "now"
pub const TODAY: &str = "TODAY";

/// Horizon attributes set to the same date
pub const ATTRIBUTES: [&str; 2] = ["Date From", "Chrono Date From"];

/// Horizon task errors
#[derive(Debug, thiserror::Error)]
pub enum HorizonError {
    #[error("Invalid date '{value}', expected TODAY or MM/DD/YY: {source}")]
    InvalidDate {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn ole_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

/// Days since 1899-12-30 plus the fraction of the day elapsed
pub fn to_ole(at: NaiveDateTime) -> f64 {
    let delta = at - ole_epoch();
    let days = delta.num_days();
    let seconds = (delta - chrono::Duration::days(days)).num_seconds();
    days as f64 + seconds as f64 / 86400.0
}

/// `TODAY` (the current local time) or a `MM/DD/YY` date at midnight
pub fn parse_date(value: &str) -> Result<NaiveDateTime, HorizonError> {
    if value == TODAY {
        return Ok(Local::now().naive_local());
    }

    let date = NaiveDate::parse_from_str(value, "%m/%d/%y").map_err(|source| {
        HorizonError::InvalidDate {
            value: value.to_string(),
            source,
        }
    })?;
    Ok(date.and_time(NaiveTime::MIN))
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attribute(text: &str) -> String {
    escape_text(text).replace('"', "&quot;")
}

/// The parameter document for `model_name` with both horizon dates at `ole_date`
pub fn render_xml(model_name: &str, ole_date: f64) -> String {
    let mut xml = format!("<UndocumentedParam xmlns=\"{}\">", escape_attribute(XMLNS));
    for attribute in ATTRIBUTES {
        xml.push_str(&format!(
            "<Attributes><Class>Horizon</Class><Name>{}</Name><Attribute>{}</Attribute><Value>{:?}</Value></Attributes>",
            escape_text(model_name),
            escape_text(attribute),
            ole_date
        ));
    }
    xml.push_str("</UndocumentedParam>");
    xml
}

/// Write the horizon file and return its path
pub fn write_horizon(
    model_name: &str,
    date: NaiveDateTime,
    output: Option<&Path>,
) -> Result<PathBuf, HorizonError> {
    println!("User specified parameters: MODEL: {}, DATE: {}", model_name, date);

    let ole_date = to_ole(date);
    for attribute in ATTRIBUTES {
        println!("Setting {} to {:?}", attribute, ole_date);
    }

    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT));
    fs::write(&path, render_xml(model_name, ole_date)).map_err(|source| HorizonError::Write {
        path: path.display().to_string(),
        source,
    })?;
    tracing::info!("Horizon parameters written to {}", path.display());

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_ole_dates() {
        assert_eq!(to_ole(at(1899, 12, 30, 0, 0)), 0.0);
        assert_eq!(to_ole(at(1900, 1, 1, 0, 0)), 2.0);
        assert_eq!(to_ole(at(2024, 12, 31, 0, 0)), 45657.0);
        assert_eq!(to_ole(at(2024, 12, 31, 12, 0)), 45657.5);
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("12/31/24").unwrap(), at(2024, 12, 31, 0, 0));
        assert_eq!(parse_date("01/02/99").unwrap(), at(1999, 1, 2, 0, 0));
        assert!(matches!(
            parse_date("2024-12-31"),
            Err(HorizonError::InvalidDate { .. })
        ));
        assert!(parse_date(TODAY).is_ok());
    }

    #[test]
    fn test_render_xml() {
        let xml = render_xml("Base", 45657.0);
        assert!(xml.starts_with("<UndocumentedParam xmlns=\"http://tempuri.org/UndocumentedParam.xsd\">"));
        assert!(xml.contains(
            "<Attributes><Class>Horizon</Class><Name>Base</Name><Attribute>Date From</Attribute><Value>45657.0</Value></Attributes>"
        ));
        assert!(xml.contains("<Attribute>Chrono Date From</Attribute>"));
        assert!(xml.ends_with("</UndocumentedParam>"));
    }

    #[test]
    fn test_render_escapes_model_name() {
        let xml = render_xml("R&D <test>", 1.0);
        assert!(xml.contains("<Name>R&amp;D &lt;test&gt;</Name>"));
    }

    #[test]
    fn test_write_horizon() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("horizon.xml");

        let path = write_horizon("Base", at(2024, 12, 31, 0, 0), Some(&target)).unwrap();
        let written = std::fs::read_to_string(path).unwrap();
        assert_eq!(written.matches("<Value>45657.0</Value>").count(), 2);
    }
}
