//! Nurse directory: id -> profile lookup built from the flat profile
//! document, plus the profile filters the dashboard's detail views use.

use std::collections::HashMap;

use serde::Serialize;

use crate::schema::{NurseProfile, SeniorityLevel};

/// O(1) id -> profile index, rebuilt fully on each load.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct NurseDirectory {
    by_id: HashMap<String, NurseProfile>,
}

impl NurseDirectory {
    /// Build the index. Duplicate ids resolve last-write-wins.
    pub fn build(profiles: Vec<NurseProfile>) -> Self {
        let mut by_id = HashMap::with_capacity(profiles.len());
        for profile in profiles {
            by_id.insert(profile.id.clone(), profile);
        }
        Self { by_id }
    }

    pub fn get(&self, id: &str) -> Option<&NurseProfile> {
        self.by_id.get(id)
    }

    /// Display name for an id. Unknown ids fall back to the id itself, so
    /// callers always have something to show.
    pub fn lookup_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.by_id.get(id).map(|p| p.name.as_str()).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Profiles whose skill list contains `skill` (case-insensitive substring).
pub fn filter_by_skill(profiles: &[NurseProfile], skill: &str) -> Vec<NurseProfile> {
    let needle = skill.to_lowercase();
    profiles
        .iter()
        .filter(|p| p.skills.iter().any(|s| s.to_lowercase().contains(&needle)))
        .cloned()
        .collect()
}

/// Profiles with experience inside `[min, max]`, both bounds inclusive.
pub fn filter_by_experience(profiles: &[NurseProfile], min: u32, max: u32) -> Vec<NurseProfile> {
    profiles
        .iter()
        .filter(|p| p.experience_years >= min && p.experience_years <= max)
        .cloned()
        .collect()
}

/// Profiles at exactly the given seniority band.
pub fn filter_by_seniority(profiles: &[NurseProfile], level: SeniorityLevel) -> Vec<NurseProfile> {
    profiles
        .iter()
        .filter(|p| p.seniority_level == level)
        .cloned()
        .collect()
}

/// Profiles holding every one of the required skills.
pub fn with_all_skills(profiles: &[NurseProfile], required: &[&str]) -> Vec<NurseProfile> {
    profiles
        .iter()
        .filter(|p| {
            required.iter().all(|req| {
                let needle = req.to_lowercase();
                p.skills.iter().any(|s| s.to_lowercase().contains(&needle))
            })
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str, name: &str, skills: &[&str], years: u32, level: SeniorityLevel) -> NurseProfile {
        NurseProfile {
            id: id.to_string(),
            name: name.to_string(),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            experience_years: years,
            seniority_level: level,
        }
    }

    fn roster() -> Vec<NurseProfile> {
        vec![
            profile("N1", "Alice", &["ICU", "General"], 7, SeniorityLevel::Senior),
            profile("N2", "Bob", &["ER"], 2, SeniorityLevel::Junior),
            profile("N3", "Cara", &["icu", "Pediatrics"], 4, SeniorityLevel::Mid),
        ]
    }

    #[test]
    fn test_build_and_lookup() {
        let directory = NurseDirectory::build(roster());
        assert_eq!(directory.len(), 3);
        assert_eq!(directory.lookup_name("N2"), "Bob");
        assert_eq!(directory.lookup_name("N99"), "N99");
        assert_eq!(directory.get("N1").unwrap().experience_years, 7);
    }

    #[test]
    fn test_duplicate_ids_last_write_wins() {
        let mut profiles = roster();
        profiles.push(profile("N1", "Alicia", &["OT"], 8, SeniorityLevel::Senior));

        let directory = NurseDirectory::build(profiles);
        assert_eq!(directory.len(), 3);
        assert_eq!(directory.lookup_name("N1"), "Alicia");
    }

    #[test]
    fn test_skill_filter_is_case_insensitive() {
        let profiles = roster();
        let matched = filter_by_skill(&profiles, "icu");
        let ids: Vec<&str> = matched.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["N1", "N3"]);

        assert!(filter_by_skill(&profiles, "radiology").is_empty());
    }

    #[test]
    fn test_experience_bounds_inclusive() {
        let profiles = roster();
        let matched = filter_by_experience(&profiles, 2, 4);
        let ids: Vec<&str> = matched.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["N2", "N3"]);
    }

    #[test]
    fn test_seniority_filter() {
        let profiles = roster();
        let matched = filter_by_seniority(&profiles, SeniorityLevel::Mid);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "N3");
    }

    #[test]
    fn test_with_all_skills() {
        let profiles = roster();
        let matched = with_all_skills(&profiles, &["ICU", "general"]);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].id, "N1");

        assert_eq!(with_all_skills(&profiles, &[]).len(), 3);
    }
}
