//! Canonical roster schema types shared across the aggregation engine.
//!
//! Snapshot documents are decoded leniently at the engine boundary: the
//! department/nurse/shift record types here tolerate missing fields, and
//! the day/shift code parsers return `None` for codes they do not know.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

/// Time-of-day bucket a shift code resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ShiftOfDay {
    Morning,
    Evening,
    Night,
}

impl ShiftOfDay {
    pub const ALL: [ShiftOfDay; 3] = [ShiftOfDay::Morning, ShiftOfDay::Evening, ShiftOfDay::Night];

    /// Classify a raw shift code ("Full-Morning", "Half-Night", ...) by
    /// stripping its duration prefix. Unknown codes return `None` so the
    /// caller can drop that single entry.
    pub fn from_code(code: &str) -> Option<Self> {
        let time_of_day = code
            .strip_prefix("Full-")
            .or_else(|| code.strip_prefix("Half-"))
            .unwrap_or(code);
        match time_of_day {
            "Morning" => Some(Self::Morning),
            "Evening" => Some(Self::Evening),
            "Night" => Some(Self::Night),
            _ => None,
        }
    }
}

/// Day of the calendar week, ordered Monday first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    /// Parse the 3-letter abbreviation used by snapshot producers.
    pub fn from_abbr(abbr: &str) -> Option<Self> {
        match abbr {
            "Mon" => Some(Self::Monday),
            "Tue" => Some(Self::Tuesday),
            "Wed" => Some(Self::Wednesday),
            "Thu" => Some(Self::Thursday),
            "Fri" => Some(Self::Friday),
            "Sat" => Some(Self::Saturday),
            "Sun" => Some(Self::Sunday),
            _ => None,
        }
    }
}

/// Whether an assignment covers a full or half shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationClass {
    Full,
    Half,
}

impl DurationClass {
    /// Any code containing "Full" is a full shift; everything else is half.
    pub fn of_code(code: &str) -> Self {
        if code.contains("Full") {
            Self::Full
        } else {
            Self::Half
        }
    }
}

/// One nurse placed in one shift/day cell of the canonical index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub nurse_id: String,
    pub display_name: String,
    pub duration_class: DurationClass,
    pub original_shift_code: String,
}

/// Shift-of-day -> day-of-week -> assignments for one department.
pub type ShiftGrid = BTreeMap<ShiftOfDay, BTreeMap<DayOfWeek, Vec<Assignment>>>;

/// Department key -> fully shaped 3x7 shift grid.
///
/// Every department present in the index carries all 3 shift-of-day and
/// all 7 day buckets, so consumers only ever check list emptiness, never
/// bucket presence. Department keys are the case-folded (lowercased) form.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CanonicalIndex {
    pub departments: BTreeMap<String, ShiftGrid>,
}

impl CanonicalIndex {
    /// Register a department key, shaping all of its buckets.
    pub fn add_department(&mut self, key: &str) {
        self.departments
            .entry(key.to_string())
            .or_insert_with(full_grid);
    }

    /// Assignments for one cell; departments or buckets that were never
    /// registered read as empty.
    pub fn bucket(&self, department: &str, shift: ShiftOfDay, day: DayOfWeek) -> &[Assignment] {
        self.departments
            .get(department)
            .and_then(|grid| grid.get(&shift))
            .and_then(|days| days.get(&day))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Mutable cell access, registering the department on first touch.
    pub fn bucket_mut(
        &mut self,
        department: &str,
        shift: ShiftOfDay,
        day: DayOfWeek,
    ) -> &mut Vec<Assignment> {
        self.departments
            .entry(department.to_string())
            .or_insert_with(full_grid)
            .entry(shift)
            .or_default()
            .entry(day)
            .or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.departments.is_empty()
    }
}

fn full_grid() -> ShiftGrid {
    let mut grid = ShiftGrid::new();
    for shift in ShiftOfDay::ALL {
        let days = grid.entry(shift).or_default();
        for day in DayOfWeek::ALL {
            days.entry(day).or_default();
        }
    }
    grid
}

// ============================================================================
// Snapshot document types
// ============================================================================

/// One department entry inside a raw snapshot document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartmentDoc {
    pub name: String,
    #[serde(default)]
    pub nurses: Vec<NurseShiftRecord>,
}

impl DepartmentDoc {
    /// Decode the `departments` array of a snapshot.
    ///
    /// Returns `None` when the document has no `departments` array at all
    /// (the malformed-shape case). Individual entries that fail to decode
    /// are skipped with a warning rather than aborting the document.
    pub fn decode_all(snapshot: &Value) -> Option<Vec<DepartmentDoc>> {
        let raw = snapshot.get("departments")?.as_array()?;
        let mut departments = Vec::with_capacity(raw.len());
        for entry in raw {
            match serde_json::from_value::<DepartmentDoc>(entry.clone()) {
                Ok(dept) => departments.push(dept),
                Err(err) => warn!("skipping malformed department entry: {}", err),
            }
        }
        Some(departments)
    }
}

/// One nurse's shift list as a producer wrote it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NurseShiftRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub shifts: Vec<ShiftEntry>,
}

impl NurseShiftRecord {
    /// Embedded name when present and non-empty, else "Nurse {id}".
    pub fn display_name(&self) -> String {
        match &self.name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("Nurse {}", self.id),
        }
    }
}

/// A single (day, shift code) pair on a nurse record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftEntry {
    pub day: String,
    pub shift: String,
}

/// One (snapshot file, department) pair produced during aggregation.
/// Created once per pass and immutable thereafter; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekRecord {
    pub week: String,
    pub department: String,
    pub nurses: Vec<NurseShiftRecord>,
    pub source_key: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub size_bytes: u64,
}

// ============================================================================
// Nurse profile types
// ============================================================================

/// Seniority band from the nurse-profile document. The producer writes
/// capitalized values; the lowercase forms are the canonical ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeniorityLevel {
    #[serde(alias = "Junior")]
    Junior,
    #[serde(alias = "Mid")]
    Mid,
    #[serde(alias = "Senior")]
    Senior,
}

/// Flat nurse-profile row from the directory document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NurseProfile {
    #[serde(rename = "nurse_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience_years: u32,
    pub seniority_level: SeniorityLevel,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_shift_code_classification() {
        assert_eq!(ShiftOfDay::from_code("Full-Morning"), Some(ShiftOfDay::Morning));
        assert_eq!(ShiftOfDay::from_code("Half-Night"), Some(ShiftOfDay::Night));
        assert_eq!(ShiftOfDay::from_code("Evening"), Some(ShiftOfDay::Evening));
        assert_eq!(ShiftOfDay::from_code("Full-Lunch"), None);
        assert_eq!(ShiftOfDay::from_code(""), None);

        assert_eq!(DurationClass::of_code("Full-Morning"), DurationClass::Full);
        assert_eq!(DurationClass::of_code("Half-Morning"), DurationClass::Half);
        assert_eq!(DurationClass::of_code("Evening"), DurationClass::Half);
    }

    #[test]
    fn test_day_abbreviations() {
        assert_eq!(DayOfWeek::from_abbr("Mon"), Some(DayOfWeek::Monday));
        assert_eq!(DayOfWeek::from_abbr("Sun"), Some(DayOfWeek::Sunday));
        assert_eq!(DayOfWeek::from_abbr("monday"), None);
        assert_eq!(DayOfWeek::from_abbr(""), None);
    }

    #[test]
    fn test_index_bucket_defaults_empty() {
        let mut index = CanonicalIndex::default();
        index.add_department("icu");

        assert!(index.bucket("icu", ShiftOfDay::Morning, DayOfWeek::Monday).is_empty());
        // Unregistered departments read as empty too.
        assert!(index.bucket("er", ShiftOfDay::Night, DayOfWeek::Friday).is_empty());
    }

    #[test]
    fn test_display_name_default() {
        let named = NurseShiftRecord {
            id: "N1".into(),
            name: Some("Alice".into()),
            shifts: vec![],
        };
        assert_eq!(named.display_name(), "Alice");

        let anonymous = NurseShiftRecord {
            id: "N2".into(),
            name: None,
            shifts: vec![],
        };
        assert_eq!(anonymous.display_name(), "Nurse N2");

        let blank = NurseShiftRecord {
            id: "N3".into(),
            name: Some(String::new()),
            shifts: vec![],
        };
        assert_eq!(blank.display_name(), "Nurse N3");
    }

    #[test]
    fn test_decode_departments() {
        let snapshot = json!({
            "departments": [
                {"name": "ICU", "nurses": [{"id": "N1", "shifts": []}]},
                {"name": "ER"},
                {"nurses": []},
            ]
        });

        let departments = DepartmentDoc::decode_all(&snapshot).unwrap();
        // The nameless entry is skipped, the nurse-less one defaults to [].
        assert_eq!(departments.len(), 2);
        assert_eq!(departments[0].name, "ICU");
        assert!(departments[1].nurses.is_empty());

        assert!(DepartmentDoc::decode_all(&json!({"weeks": []})).is_none());
        assert!(DepartmentDoc::decode_all(&json!({"departments": "nope"})).is_none());
    }

    #[test]
    fn test_seniority_accepts_producer_casing() {
        let profile: NurseProfile = serde_json::from_value(json!({
            "nurse_id": "N9",
            "name": "Dana",
            "skills": ["ICU"],
            "experience_years": 4,
            "seniority_level": "Senior"
        }))
        .unwrap();
        assert_eq!(profile.seniority_level, SeniorityLevel::Senior);
        assert_eq!(
            serde_json::to_value(profile.seniority_level).unwrap(),
            json!("senior")
        );
    }
}
