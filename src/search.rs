//! Free-text location of a nurse inside the canonical index, used by the
//! dashboard to decide which department timetable to highlight.

use crate::directory::NurseDirectory;
use crate::schema::{CanonicalIndex, DayOfWeek, ShiftOfDay};

/// Find the first department containing a nurse matching `query`.
///
/// Matching is a case-insensitive substring test against the assignment's
/// nurse id and its directory-resolved display name. Departments are
/// scanned in the index's order, shifts then days in the caller's order,
/// and the first department with any match wins; ties are broken by scan
/// order, never ranked. Queries shorter than 2 characters mean "no
/// search" and return `None`.
pub fn locate(
    index: &CanonicalIndex,
    directory: &NurseDirectory,
    shifts: &[ShiftOfDay],
    days: &[DayOfWeek],
    query: &str,
) -> Option<String> {
    let query = query.trim();
    if query.chars().count() < 2 {
        return None;
    }
    let needle = query.to_lowercase();

    for department in index.departments.keys() {
        for &shift in shifts {
            for &day in days {
                let found = index.bucket(department, shift, day).iter().any(|a| {
                    a.nurse_id.to_lowercase().contains(&needle)
                        || directory
                            .lookup_name(&a.nurse_id)
                            .to_lowercase()
                            .contains(&needle)
                });
                if found {
                    return Some(department.clone());
                }
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::schema::{NurseProfile, SeniorityLevel};
    use serde_json::json;

    fn index() -> CanonicalIndex {
        normalize(&json!({
            "departments": [
                {
                    "name": "ER",
                    "nurses": [
                        {"id": "N7", "shifts": [{"day": "Fri", "shift": "Half-Evening"}]}
                    ]
                },
                {
                    "name": "ICU",
                    "nurses": [
                        {"id": "N1", "shifts": [{"day": "Mon", "shift": "Full-Morning"}]},
                        {"id": "N7", "shifts": [{"day": "Tue", "shift": "Full-Night"}]}
                    ]
                }
            ]
        }))
    }

    fn directory() -> NurseDirectory {
        NurseDirectory::build(vec![NurseProfile {
            id: "N1".into(),
            name: "Alice Carter".into(),
            skills: vec![],
            experience_years: 3,
            seniority_level: SeniorityLevel::Mid,
        }])
    }

    #[test]
    fn test_short_queries_are_no_search() {
        let idx = index();
        let dir = directory();
        assert_eq!(locate(&idx, &dir, &ShiftOfDay::ALL, &DayOfWeek::ALL, "n"), None);
        assert_eq!(locate(&idx, &dir, &ShiftOfDay::ALL, &DayOfWeek::ALL, " 7 "), None);
        assert_eq!(locate(&idx, &dir, &ShiftOfDay::ALL, &DayOfWeek::ALL, ""), None);
    }

    #[test]
    fn test_match_by_id() {
        let found = locate(&index(), &directory(), &ShiftOfDay::ALL, &DayOfWeek::ALL, "n1");
        assert_eq!(found.as_deref(), Some("icu"));
    }

    #[test]
    fn test_match_by_directory_name() {
        let found = locate(&index(), &directory(), &ShiftOfDay::ALL, &DayOfWeek::ALL, "carter");
        assert_eq!(found.as_deref(), Some("icu"));
    }

    #[test]
    fn test_first_department_wins() {
        // N7 sits in both departments; "er" iterates first and hides the
        // ICU placement.
        let found = locate(&index(), &directory(), &ShiftOfDay::ALL, &DayOfWeek::ALL, "N7");
        assert_eq!(found.as_deref(), Some("er"));
    }

    #[test]
    fn test_no_match() {
        let found = locate(&index(), &directory(), &ShiftOfDay::ALL, &DayOfWeek::ALL, "zelda");
        assert_eq!(found, None);
    }
}
