use crate::types::ListingRecord;

/// Keep records whose title contains at least one skill, case-insensitively.
///
/// An empty skill list passes every record through untouched.
pub fn filter_by_skills(records: Vec<ListingRecord>, skills: &[String]) -> Vec<ListingRecord> {
    if skills.is_empty() {
        return records;
    }
    let needles: Vec<String> = skills.iter().map(|s| s.to_lowercase()).collect();
    records
        .into_iter()
        .filter(|record| {
            let title = record.title.to_lowercase();
            needles.iter().any(|skill| title.contains(skill.as_str()))
        })
        .collect()
}
