//! Health record model.
//!
//! Every record type is a variant of a closed enum. Per-type behaviour
//! (table, payload columns, category) is a `match` over [`RecordType`]
//! rather than a runtime registry.

use rusqlite::types::Value;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

/// Discriminator for the health data schema a row follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordType {
    Steps,
    Weight,
    HeartRate,
    ExerciseSession,
    PlannedExerciseSession,
}

impl RecordType {
    /// All record types, in a stable order.
    pub const ALL: [RecordType; 5] = [
        Self::Steps,
        Self::Weight,
        Self::HeartRate,
        Self::ExerciseSession,
        Self::PlannedExerciseSession,
    ];

    /// Stable integer id stored in log, usage and change tables.
    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Steps => 1,
            Self::Weight => 2,
            Self::HeartRate => 3,
            Self::ExerciseSession => 4,
            Self::PlannedExerciseSession => 5,
        }
    }

    #[must_use]
    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    #[must_use]
    pub const fn table_name(self) -> &'static str {
        match self {
            Self::Steps => "steps_record_table",
            Self::Weight => "weight_record_table",
            Self::HeartRate => "heart_rate_record_table",
            Self::ExerciseSession => "exercise_session_record_table",
            Self::PlannedExerciseSession => "planned_exercise_session_record_table",
        }
    }

    /// Type-specific columns, in the order [`RecordData::payload_values`] binds them.
    #[must_use]
    pub const fn payload_columns(self) -> &'static [&'static str] {
        match self {
            Self::Steps => &["count"],
            Self::Weight => &["weight_grams"],
            Self::HeartRate => &[],
            Self::ExerciseSession => &["title", "notes", "exercise_type", "planned_exercise_session_id"],
            Self::PlannedExerciseSession => {
                &["title", "notes", "exercise_type", "completed_exercise_session_id"]
            }
        }
    }

    #[must_use]
    pub const fn category(self) -> HealthDataCategory {
        match self {
            Self::Steps | Self::ExerciseSession | Self::PlannedExerciseSession => {
                HealthDataCategory::Activity
            }
            Self::Weight => HealthDataCategory::BodyMeasurements,
            Self::HeartRate => HealthDataCategory::Vitals,
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Steps => write!(f, "steps"),
            Self::Weight => write!(f, "weight"),
            Self::HeartRate => write!(f, "heart_rate"),
            Self::ExerciseSession => write!(f, "exercise_session"),
            Self::PlannedExerciseSession => write!(f, "planned_exercise_session"),
        }
    }
}

/// Data category used for source priority ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthDataCategory {
    Activity,
    BodyMeasurements,
    CycleTracking,
    Nutrition,
    Sleep,
    Vitals,
}

impl HealthDataCategory {
    #[must_use]
    pub const fn id(self) -> i32 {
        match self {
            Self::Activity => 1,
            Self::BodyMeasurements => 2,
            Self::CycleTracking => 3,
            Self::Nutrition => 4,
            Self::Sleep => 5,
            Self::Vitals => 6,
        }
    }

    #[must_use]
    pub fn from_id(id: i32) -> Option<Self> {
        [
            Self::Activity,
            Self::BodyMeasurements,
            Self::CycleTracking,
            Self::Nutrition,
            Self::Sleep,
            Self::Vitals,
        ]
        .into_iter()
        .find(|c| c.id() == id)
    }
}

/// One heart rate sample in a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartRateSample {
    pub epoch_millis: i64,
    pub beats_per_minute: i64,
}

/// Type-specific payload of a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecordData {
    Steps {
        count: i64,
    },
    Weight {
        weight_grams: f64,
    },
    HeartRate {
        samples: Vec<HeartRateSample>,
    },
    ExerciseSession {
        title: Option<String>,
        notes: Option<String>,
        exercise_type: i32,
        /// UUID of the planned session this workout followed.
        planned_exercise_session_id: Option<String>,
    },
    PlannedExerciseSession {
        title: Option<String>,
        notes: Option<String>,
        exercise_type: i32,
        /// UUID of the session that completed this plan. Maintained by
        /// storage when the exercise session is written.
        completed_exercise_session_id: Option<String>,
    },
}

impl RecordData {
    #[must_use]
    pub const fn record_type(&self) -> RecordType {
        match self {
            Self::Steps { .. } => RecordType::Steps,
            Self::Weight { .. } => RecordType::Weight,
            Self::HeartRate { .. } => RecordType::HeartRate,
            Self::ExerciseSession { .. } => RecordType::ExerciseSession,
            Self::PlannedExerciseSession { .. } => RecordType::PlannedExerciseSession,
        }
    }

    /// Values for [`RecordType::payload_columns`], in the same order.
    #[must_use]
    pub fn payload_values(&self) -> Vec<Value> {
        match self {
            Self::Steps { count } => vec![Value::Integer(*count)],
            Self::Weight { weight_grams } => vec![Value::Real(*weight_grams)],
            Self::HeartRate { .. } => Vec::new(),
            Self::ExerciseSession {
                title,
                notes,
                exercise_type,
                planned_exercise_session_id: linked,
            }
            | Self::PlannedExerciseSession {
                title,
                notes,
                exercise_type,
                completed_exercise_session_id: linked,
            } => vec![
                optional_text(title.as_deref()),
                optional_text(notes.as_deref()),
                Value::Integer(i64::from(*exercise_type)),
                optional_text(linked.as_deref()),
            ],
        }
    }

    /// Decode the payload columns of a row starting at `offset`.
    ///
    /// Satellite data (heart rate samples) is left empty; the caller fills it.
    pub fn from_row(record_type: RecordType, row: &Row, offset: usize) -> rusqlite::Result<Self> {
        Ok(match record_type {
            RecordType::Steps => Self::Steps {
                count: row.get(offset)?,
            },
            RecordType::Weight => Self::Weight {
                weight_grams: row.get(offset)?,
            },
            RecordType::HeartRate => Self::HeartRate {
                samples: Vec::new(),
            },
            RecordType::ExerciseSession => Self::ExerciseSession {
                title: row.get(offset)?,
                notes: row.get(offset + 1)?,
                exercise_type: row.get(offset + 2)?,
                planned_exercise_session_id: row.get(offset + 3)?,
            },
            RecordType::PlannedExerciseSession => Self::PlannedExerciseSession {
                title: row.get(offset)?,
                notes: row.get(offset + 1)?,
                exercise_type: row.get(offset + 2)?,
                completed_exercise_session_id: row.get(offset + 3)?,
            },
        })
    }
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::Text(s.to_string()))
}

/// A health record with its common columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Globally unique id assigned when the record was first written.
    pub uuid: String,
    /// App identity row id, valid only inside the database it was read from.
    pub app_info_id: i64,
    pub client_record_id: Option<String>,
    /// Unix milliseconds.
    pub last_modified_time: i64,
    /// Unix milliseconds. Instant records use the same value for start and end.
    pub start_time: i64,
    pub end_time: i64,
    /// Offset from UTC in seconds.
    pub zone_offset: Option<i32>,
    pub data: RecordData,
}

impl Record {
    #[must_use]
    pub const fn record_type(&self) -> RecordType {
        self.data.record_type()
    }
}

/// Position in a paged read of one record table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageToken {
    /// Largest row id already returned.
    pub last_row_id: i64,
}

/// Whether a paged read has more rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
    More(PageToken),
    End,
}

/// One page of records.
#[derive(Debug, Clone)]
pub struct RecordPage {
    pub records: Vec<Record>,
    pub next: PageCursor,
}

/// How a batch of records is attributed and identified on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertMode {
    /// An app writing its own data: a fresh UUID is minted for each record
    /// and the access is logged against `package`.
    Client { package: String },
    /// Restoring or merging existing data: the record UUID is kept and no
    /// package is attributed.
    Restore,
}
