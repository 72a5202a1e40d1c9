// utils/csv_import.rs
use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{models::taskmodel::TaskDraft, service::error::ServiceError};

/// Drafts that parsed cleanly plus one message per rejected row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRows {
    pub drafts: Vec<TaskDraft>,
    pub errors: Vec<String>,
}

#[derive(Debug, Default)]
struct Columns {
    title: Option<usize>,
    description: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
    location_name: Option<usize>,
    start_time: Option<usize>,
    end_time: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &csv::StringRecord) -> Self {
        let mut columns = Columns::default();
        for (index, header) in headers.iter().enumerate() {
            match header.trim().to_lowercase().as_str() {
                "title" => columns.title = Some(index),
                "description" => columns.description = Some(index),
                "latitude" | "lat" => columns.latitude = Some(index),
                "longitude" | "lng" | "lon" => columns.longitude = Some(index),
                "location_name" => columns.location_name = Some(index),
                "start_time" => columns.start_time = Some(index),
                "end_time" => columns.end_time = Some(index),
                _ => {}
            }
        }
        columns
    }
}

fn field<'a>(record: &'a csv::StringRecord, index: Option<usize>) -> Option<&'a str> {
    index
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn coordinate(record: &csv::StringRecord, index: Option<usize>) -> Option<f64> {
    field(record, index)?.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD HH:MM:SS` taken as UTC.
fn timestamp(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?;
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|t| t.and_utc())
        })
}

/// Parse an uploaded CSV into task drafts. Rows are numbered from 1,
/// counting data rows only.
pub fn parse_task_rows(bytes: &[u8]) -> Result<ParsedRows, ServiceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| ServiceError::Validation(format!("Unreadable CSV header: {}", e)))?
        .clone();
    let columns = Columns::from_headers(&headers);

    let mut parsed = ParsedRows::default();

    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                parsed.errors.push(format!("Row {}: {}", row, e));
                continue;
            }
        };

        let (Some(latitude), Some(longitude)) = (
            coordinate(&record, columns.latitude),
            coordinate(&record, columns.longitude),
        ) else {
            parsed.errors.push(format!("Row {}: invalid latitude/longitude", row));
            continue;
        };

        parsed.drafts.push(TaskDraft {
            title: field(&record, columns.title)
                .map(str::to_string)
                .unwrap_or_else(|| format!("Task {}", row)),
            description: field(&record, columns.description)
                .map(str::to_string)
                .unwrap_or_default(),
            latitude: Some(latitude),
            longitude: Some(longitude),
            location_name: field(&record, columns.location_name).map(str::to_string),
            start_time: timestamp(field(&record, columns.start_time)),
            end_time: timestamp(field(&record, columns.end_time)),
        });
    }

    Ok(parsed)
}
