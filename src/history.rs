use crate::models::SemesterRecord;

pub fn is_supplementary(label: &str) -> bool {
    label.to_lowercase().contains("supplementary")
}

/// Display labels for past semesters. Regular semesters are numbered in order,
/// supplementary attempts keep their own label and are not counted.
pub fn semester_labels<'a, I>(labels: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut regular = 0;
    labels
        .into_iter()
        .map(|label| {
            if is_supplementary(label) {
                label.to_string()
            } else {
                regular += 1;
                format!("Sem {regular} ({label})")
            }
        })
        .collect()
}

pub fn label_semesters(semesters: &[SemesterRecord]) -> Vec<(String, &SemesterRecord)> {
    semester_labels(semesters.iter().map(|sem| sem.semester.as_str()))
        .into_iter()
        .zip(semesters.iter())
        .collect()
}
