//! Cross-snapshot aggregation: flat week records, history grouping, and
//! latest-week roster selection.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::schema::{DepartmentDoc, NurseShiftRecord, WeekRecord};
use crate::store::SnapshotFile;
use crate::week::WeekResolver;

/// A department's merged roster for the selected week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DepartmentRoster {
    pub name: String,
    pub nurses: Vec<NurseShiftRecord>,
}

/// The chronologically latest week with its full department set.
#[derive(Debug, Clone, Serialize)]
pub struct LatestRoster {
    pub week: String,
    pub departments: Vec<DepartmentRoster>,
    pub file_count: usize,
    pub last_modified: Option<DateTime<Utc>>,
}

/// File-level provenance attached to each history entry.
#[derive(Debug, Clone, Serialize)]
pub struct RecordMetadata {
    pub source_key: String,
    pub last_modified: Option<DateTime<Utc>>,
    pub size_bytes: u64,
}

/// One history row: a (file, department) pair with its shift totals.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub week: String,
    pub department: String,
    pub nurses: Vec<NurseShiftRecord>,
    pub total_nurses: usize,
    pub full_shifts: usize,
    pub half_shifts: usize,
    pub metadata: RecordMetadata,
}

/// Flatten snapshot files into one WeekRecord per (file, department) pair.
///
/// The input list is assumed to be already filtered of fetch and parse
/// failures; a file that still lacks a departments array is skipped with
/// a diagnostic. A department's declared week (the document's `week`
/// field) wins over anything derivable from the key.
pub fn flatten(files: &[SnapshotFile], resolver: &WeekResolver) -> Vec<WeekRecord> {
    let mut records = Vec::new();

    for file in files {
        let declared = file.content.get("week").and_then(Value::as_str);
        let week = resolver.resolve_week(&file.key, declared);

        let Some(departments) = DepartmentDoc::decode_all(&file.content) else {
            warn!("{}: no departments array, skipping file", file.key);
            continue;
        };

        for dept in departments {
            records.push(WeekRecord {
                week: week.clone(),
                department: dept.name.to_lowercase(),
                nurses: dept.nurses,
                source_key: file.key.clone(),
                last_modified: file.last_modified,
                size_bytes: file.size_bytes,
            });
        }
    }

    debug!("flattened {} files into {} week records", files.len(), records.len());
    records
}

/// Select the latest week and union its department rosters.
///
/// Weeks compare lexicographically, which is chronologically correct only
/// while every producer emits the same identifier format; mixed formats
/// sort by plain string order. Within a department, nurses are
/// deduplicated by id across contributing files, keeping the first-seen
/// record and appending later files' new nurses in file order. Returns
/// `None` when no records exist (the "no roster history" condition).
pub fn latest_week_roster(records: &[WeekRecord]) -> Option<LatestRoster> {
    let week = records.iter().map(|r| r.week.as_str()).max()?.to_string();

    let mut dept_order: Vec<String> = Vec::new();
    let mut rosters: HashMap<String, Vec<NurseShiftRecord>> = HashMap::new();
    let mut seen_ids: HashMap<String, HashSet<String>> = HashMap::new();
    let mut file_keys: HashSet<&str> = HashSet::new();
    let mut last_modified: Option<DateTime<Utc>> = None;

    for record in records.iter().filter(|r| r.week == week) {
        file_keys.insert(record.source_key.as_str());
        if let Some(ts) = record.last_modified {
            last_modified = Some(last_modified.map_or(ts, |current| current.max(ts)));
        }

        if !seen_ids.contains_key(&record.department) {
            dept_order.push(record.department.clone());
        }
        let seen = seen_ids.entry(record.department.clone()).or_default();
        let nurses = rosters.entry(record.department.clone()).or_default();

        for nurse in &record.nurses {
            if seen.insert(nurse.id.clone()) {
                nurses.push(nurse.clone());
            }
        }
    }

    let departments = dept_order
        .into_iter()
        .map(|key| DepartmentRoster {
            name: title_case(&key),
            nurses: rosters.remove(&key).unwrap_or_default(),
        })
        .collect();

    Some(LatestRoster {
        week,
        departments,
        file_count: file_keys.len(),
        last_modified,
    })
}

/// One history entry per (file, department) pair, no cross-file
/// deduplication. This is the history view's feed; the latest-week fast
/// path lives in [`latest_week_roster`].
pub fn group_by_week_and_department(records: Vec<WeekRecord>) -> Vec<HistoryEntry> {
    records
        .into_iter()
        .map(|record| {
            let (full_shifts, half_shifts) = shift_counts(&record.nurses);
            HistoryEntry {
                week: record.week,
                department: record.department,
                total_nurses: record.nurses.len(),
                full_shifts,
                half_shifts,
                metadata: RecordMetadata {
                    source_key: record.source_key,
                    last_modified: record.last_modified,
                    size_bytes: record.size_bytes,
                },
                nurses: record.nurses,
            }
        })
        .collect()
}

/// Count full and half shift assignments across a nurse list by raw code.
fn shift_counts(nurses: &[NurseShiftRecord]) -> (usize, usize) {
    let mut full = 0;
    let mut half = 0;
    for nurse in nurses {
        for entry in &nurse.shifts {
            if entry.shift.contains("Full") {
                full += 1;
            } else if entry.shift.contains("Half") {
                half += 1;
            }
        }
    }
    (full, half)
}

/// Capitalize only the first character of a department key for display.
fn title_case(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
