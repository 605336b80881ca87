use serde::{Deserialize, Serialize};

/// A single class-schedule entry.
///
/// Field renames preserve the source vocabulary used in the persisted JSON
/// blob and the CSV interchange format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    #[serde(default)]
    pub id: i64,
    #[serde(rename = "mataKuliah")]
    pub course_name: String,
    #[serde(rename = "hari")]
    pub day: String,
    #[serde(rename = "jam")]
    pub time: String,
    #[serde(rename = "ruang")]
    pub room: String,
}

/// A candidate record before the store assigns an id.
#[derive(Debug, Clone, Default)]
pub struct RecordDraft {
    pub course_name: String,
    pub day: String,
    pub time: String,
    pub room: String,
}

impl RecordDraft {
    pub fn new(
        course_name: impl Into<String>,
        day: impl Into<String>,
        time: impl Into<String>,
        room: impl Into<String>,
    ) -> Self {
        Self {
            course_name: course_name.into(),
            day: day.into(),
            time: time.into(),
            room: room.into(),
        }
    }

    /// Copy of the draft with surrounding whitespace removed from every field.
    pub fn trimmed(&self) -> Self {
        Self {
            course_name: self.course_name.trim().to_string(),
            day: self.day.trim().to_string(),
            time: self.time.trim().to_string(),
            room: self.room.trim().to_string(),
        }
    }
}

/// Weekday names accepted at the CLI surface.
///
/// The store itself keeps `day` as free text and does not enforce this
/// enumeration, so blobs produced elsewhere (e.g. with Indonesian day names)
/// still load and filter by exact string match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl std::fmt::Display for Weekday {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        };
        write!(f, "{}", name)
    }
}
