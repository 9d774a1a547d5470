//! Data export
//!
//! Per-entity CSV, a full-state JSON document, and the bedtime reminder as a
//! calendar-interchange document. CSV fields containing commas, quotes, or
//! line breaks are quoted; notes survive a round trip through a spreadsheet.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::TrackerError;
use crate::store::RecordStore;
use crate::types::{
    ArmAssignment, CheckIn, CustomDataPoint, Experiment, MedIntake, Medication, Nap,
    Settings, SleepEntry,
};

/// Render records as CSV. The header row comes from the first record's
/// field names; every record of a collection shares one shape, so that is
/// the collection's schema. An empty slice renders to an empty string.
pub fn records_to_csv<T: Serialize>(records: &[T]) -> Result<String, TrackerError> {
    let first = match records.first() {
        Some(first) => first,
        None => return Ok(String::new()),
    };

    let header_row = match serde_json::to_value(first)? {
        Value::Object(map) => map.keys().cloned().collect::<Vec<String>>(),
        _ => {
            return Err(TrackerError::EncodingError(
                "CSV export requires struct-shaped records".to_string(),
            ))
        }
    };

    let mut lines = Vec::with_capacity(records.len() + 1);
    lines.push(
        header_row
            .iter()
            .map(|h| csv_field(h))
            .collect::<Vec<_>>()
            .join(","),
    );

    for record in records {
        let value = serde_json::to_value(record)?;
        let map = match value {
            Value::Object(map) => map,
            _ => {
                return Err(TrackerError::EncodingError(
                    "CSV export requires struct-shaped records".to_string(),
                ))
            }
        };
        let row = header_row
            .iter()
            .map(|header| match map.get(header) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => csv_field(s),
                Some(other) => csv_field(&other.to_string()),
            })
            .collect::<Vec<_>>()
            .join(",");
        lines.push(row);
    }

    Ok(lines.join("\n"))
}

/// Quote a field when it contains a delimiter, quote, or line break
fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
    {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Every collection in one JSON document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    pub sleep_entries: Vec<SleepEntry>,
    pub naps: Vec<Nap>,
    pub check_ins: Vec<CheckIn>,
    pub medications: Vec<Medication>,
    pub med_intakes: Vec<MedIntake>,
    pub experiments: Vec<Experiment>,
    pub arm_assignments: Vec<ArmAssignment>,
    pub custom_data_points: Vec<CustomDataPoint>,
    pub settings: Settings,
}

impl FullExport {
    /// Snapshot every collection from the store
    pub fn from_store(store: &dyn RecordStore) -> Self {
        Self {
            sleep_entries: store.sleep_entries(),
            naps: store.naps(),
            check_ins: store.check_ins(),
            medications: store.medications(),
            med_intakes: store.med_intakes(),
            experiments: store.experiments(),
            arm_assignments: store.arm_assignments(),
            custom_data_points: store.custom_data_points(),
            settings: store.settings(),
        }
    }

    pub fn to_json_pretty(&self) -> Result<String, TrackerError> {
        let json = serde_json::to_string_pretty(self)?;
        debug!(bytes = json.len(), "rendered full export");
        Ok(json)
    }
}

/// The bedtime reminder as a static calendar document: one daily-recurring
/// event at the configured time with a display alarm 10 minutes prior.
pub fn bedtime_reminder_ics(reminder_time: NaiveTime) -> String {
    format!(
        "BEGIN:VCALENDAR\n\
         VERSION:2.0\n\
         PRODID:-//Somnolog//EN\n\
         BEGIN:VEVENT\n\
         UID:bedtime-reminder@somnolog\n\
         DTSTART:20250101T{:02}{:02}00\n\
         RRULE:FREQ=DAILY\n\
         SUMMARY:Bedtime \u{2013} Log Sleep\n\
         DESCRIPTION:Time to prepare for bed and log yesterday's sleep\n\
         BEGIN:VALARM\n\
         ACTION:DISPLAY\n\
         DESCRIPTION:Bedtime Reminder\n\
         TRIGGER:-PT10M\n\
         END:VALARM\n\
         END:VEVENT\n\
         END:VCALENDAR",
        reminder_time.hour(),
        reminder_time.minute(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CheckInContext;
    use chrono::{NaiveDate, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn entry_with_notes(notes: Option<&str>) -> SleepEntry {
        SleepEntry {
            id: None,
            date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            bedtime: NaiveTime::from_hms_opt(22, 30, 0),
            sleep_onset: NaiveTime::from_hms_opt(23, 0, 0),
            wake_time: NaiveTime::from_hms_opt(7, 0, 0),
            quality: 4,
            notes: notes.map(|n| n.to_string()),
        }
    }

    #[test]
    fn test_empty_records_render_empty_csv() {
        let csv = records_to_csv::<SleepEntry>(&[]).unwrap();
        assert_eq!(csv, "");
    }

    #[test]
    fn test_csv_header_from_first_record() {
        // serde_json maps are key-sorted, so columns come out alphabetically
        let csv = records_to_csv(&[entry_with_notes(None)]).unwrap();
        let mut lines = csv.lines();
        let header = lines.next().unwrap();
        assert_eq!(header, "bedtime,date,quality,sleep_onset,wake_time");
        let row = lines.next().unwrap();
        assert_eq!(row, "22:30:00,2024-01-15,4,23:00:00,07:00:00");
    }

    #[test]
    fn test_csv_columns_follow_first_record() {
        // A later record's extra field is dropped; the first record is the
        // collection's schema
        let records = vec![entry_with_notes(None), entry_with_notes(Some("noisy night"))];
        let csv = records_to_csv(&records).unwrap();
        let header = csv.lines().next().unwrap();
        assert!(!header.contains("notes"));
        assert!(!csv.contains("noisy night"));
    }

    #[test]
    fn test_csv_quotes_embedded_commas_and_newlines() {
        let csv = records_to_csv(&[entry_with_notes(Some("restless, kept waking\nup"))])
            .unwrap();
        assert!(csv.contains("\"restless, kept waking\nup\""));
        // Quoted field stays one logical field: the data row splits into
        // exactly the header's column count on unquoted commas
        let header_cols = csv.lines().next().unwrap().split(',').count();
        assert_eq!(header_cols, 6);
    }

    #[test]
    fn test_csv_doubles_embedded_quotes() {
        let csv = records_to_csv(&[entry_with_notes(Some("felt \"off\" all day"))]).unwrap();
        assert!(csv.contains("\"felt \"\"off\"\" all day\""));
    }

    #[test]
    fn test_csv_array_fields_are_single_fields() {
        let check_in = CheckIn {
            id: None,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 15, 14, 0, 0).unwrap(),
            context: CheckInContext::Midday,
            sss: 4,
            notes: None,
            selected_data_points: vec!["caffeine".to_string(), "exercise".to_string()],
        };
        let csv = records_to_csv(&[check_in]).unwrap();
        // The JSON-array rendering contains commas and must be quoted
        assert!(csv.contains("\"[\"\"caffeine\"\",\"\"exercise\"\"]\""));
    }

    #[test]
    fn test_ics_document_shape() {
        let ics = bedtime_reminder_ics(NaiveTime::from_hms_opt(22, 30, 0).unwrap());
        assert!(ics.starts_with("BEGIN:VCALENDAR"));
        assert!(ics.ends_with("END:VCALENDAR"));
        assert!(ics.contains("DTSTART:20250101T223000"));
        assert!(ics.contains("RRULE:FREQ=DAILY"));
        assert!(ics.contains("TRIGGER:-PT10M"));
        assert!(ics.contains("UID:bedtime-reminder@somnolog"));
    }

    #[test]
    fn test_ics_zero_pads_early_times() {
        let ics = bedtime_reminder_ics(NaiveTime::from_hms_opt(7, 5, 0).unwrap());
        assert!(ics.contains("DTSTART:20250101T070500"));
    }

    #[test]
    fn test_full_export_roundtrip() {
        use crate::store::{MemoryStore, RecordStore};
        use uuid::Uuid;

        let mut store = MemoryStore::open(Uuid::new_v4());
        store.insert_sleep_entry(entry_with_notes(Some("fine"))).unwrap();

        let export = FullExport::from_store(&store);
        let json = export.to_json_pretty().unwrap();
        let parsed: FullExport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.sleep_entries.len(), 1);
        assert_eq!(parsed.settings, store.settings());
    }
}
