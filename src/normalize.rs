//! Snapshot normalization into the canonical department/shift/day index.
//!
//! Pure function over one already-parsed snapshot document. Malformed
//! shapes produce an empty index with a diagnostic instead of an error;
//! a bad day or shift code drops only that single entry.

use serde_json::Value;
use tracing::warn;

use crate::schema::{
    Assignment, CanonicalIndex, DayOfWeek, DepartmentDoc, DurationClass, ShiftOfDay,
};

/// Convert one raw snapshot document into the canonical index.
///
/// Every department that appears gets all 3x7 shift/day buckets, even
/// when nothing is assigned to them. Assignments keep their insertion
/// order within a bucket.
pub fn normalize(snapshot: &Value) -> CanonicalIndex {
    let mut index = CanonicalIndex::default();

    let Some(departments) = DepartmentDoc::decode_all(snapshot) else {
        warn!("snapshot has no departments array, producing empty index");
        return index;
    };

    for dept in departments {
        let key = dept.name.to_lowercase();
        index.add_department(&key);

        for nurse in &dept.nurses {
            let display_name = nurse.display_name();
            for entry in &nurse.shifts {
                let Some(day) = DayOfWeek::from_abbr(&entry.day) else {
                    continue;
                };
                let Some(shift) = ShiftOfDay::from_code(&entry.shift) else {
                    continue;
                };
                index.bucket_mut(&key, shift, day).push(Assignment {
                    nurse_id: nurse.id.clone(),
                    display_name: display_name.clone(),
                    duration_class: DurationClass::of_code(&entry.shift),
                    original_shift_code: entry.shift.clone(),
                });
            }
        }
    }

    index
}
