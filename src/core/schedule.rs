//! Date display and status labels for exams and important dates

use crate::core::field;
use crate::core::record::Record;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

/// Format a date field as `dd/mm/yyyy`, or `""` when it cannot be read
pub fn format_date(value: Option<&Value>) -> String {
    field::date(value)
        .map(|date| date.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

/// How far away an exam is, relative to a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "days", rename_all = "camelCase")]
pub enum ExamStatus {
    Today,
    InDays(i64),
    Past,
}

impl ExamStatus {
    pub fn label(&self) -> String {
        match self {
            ExamStatus::Today => "Today".to_string(),
            ExamStatus::InDays(1) => "In 1 day".to_string(),
            ExamStatus::InDays(days) => format!("In {} days", days),
            ExamStatus::Past => "Past".to_string(),
        }
    }
}

/// Status of an exam date relative to `today`; `None` when the date is unreadable
pub fn exam_status(value: Option<&Value>, today: NaiveDate) -> Option<ExamStatus> {
    let date = field::date(value)?;
    let days = (date - today).num_days();
    Some(match days {
        0 => ExamStatus::Today,
        d if d > 0 => ExamStatus::InDays(d),
        _ => ExamStatus::Past,
    })
}

/// Where `now` falls relative to a start/end window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowStatus {
    Upcoming,
    Ongoing,
    Past,
}

impl WindowStatus {
    pub fn label(&self) -> &'static str {
        match self {
            WindowStatus::Upcoming => "Upcoming",
            WindowStatus::Ongoing => "Ongoing",
            WindowStatus::Past => "Past",
        }
    }
}

/// Status of an important date window at `now`
///
/// Bounds are inclusive. Either bound may be unreadable; the status is then
/// decided by the other one alone, or `None` if neither applies.
pub fn window_status(
    start: Option<&Value>,
    end: Option<&Value>,
    now: DateTime<Utc>,
) -> Option<WindowStatus> {
    let now = now.timestamp_millis();
    let start = bound(start);
    let end = bound(end);

    if let Some(start) = start
        && now < start
    {
        return Some(WindowStatus::Upcoming);
    }
    match (start, end) {
        (Some(start), Some(end)) if now >= start && now <= end => Some(WindowStatus::Ongoing),
        (_, Some(end)) if now > end => Some(WindowStatus::Past),
        _ => None,
    }
}

fn bound(value: Option<&Value>) -> Option<i64> {
    match field::epoch_millis(value) {
        0 => None,
        millis => Some(millis),
    }
}

/// Display fields derived from a record's dates
///
/// Exams get their formatted `examDate` and an exam status label; important
/// dates get formatted bounds and a window status label.
pub fn display_fields(collection: &str, record: &Record, now: DateTime<Utc>) -> serde_json::Map<String, Value> {
    let mut display = serde_json::Map::new();
    match collection {
        crate::config::collections::EXAMS => {
            let date = record.get("examDate");
            display.insert("formattedDate".to_string(), format_date(date).into());
            if let Some(status) = exam_status(date, now.date_naive()) {
                display.insert("statusLabel".to_string(), status.label().into());
            }
        }
        crate::config::collections::IMPORTANT_DATES => {
            let (start, end) = (record.get("startDate"), record.get("endDate"));
            display.insert("formattedStart".to_string(), format_date(start).into());
            display.insert("formattedEnd".to_string(), format_date(end).into());
            if let Some(status) = window_status(start, end, now) {
                display.insert("statusLabel".to_string(), status.label().into());
            }
        }
        _ => {}
    }
    display
}
