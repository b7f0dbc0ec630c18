use crate::service::employee::EmployeeRecord;

/// Case-insensitive, multi-field, OR-combined filter over employee
/// records. The query matches when it appears as a substring in the
/// first name, last name, email, department name or any account type
/// name. An empty or whitespace-only query returns the full collection.
/// Records are unique per employee id by construction, so multi-valued
/// account types never duplicate rows.
pub fn filter_employees(records: Vec<EmployeeRecord>, query: &str) -> Vec<EmployeeRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| matches(r, &needle))
        .collect()
}

fn matches(record: &EmployeeRecord, needle: &str) -> bool {
    if record.first_name.to_lowercase().contains(needle)
        || record.last_name.to_lowercase().contains(needle)
        || record.email.to_lowercase().contains(needle)
    {
        return true;
    }
    if let Some(department) = &record.department {
        if department.to_lowercase().contains(needle) {
            return true;
        }
    }
    record
        .account_types
        .iter()
        .any(|name| name.to_lowercase().contains(needle))
}
