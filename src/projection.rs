use thiserror::Error;

use crate::models::{Numeric, Scenario, StudentRecord};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("malformed semester {0:?}, expected \"Semester <n>\"")]
    MalformedSemester(String),
    #[error("prior CGPA is required to project semester {semester}")]
    MissingData { semester: u32 },
    #[error("SGPA {0:?} is not a number")]
    InvalidInput(String),
}

/// Semester index from a label of the exact form `"Semester <n>"`, `n >= 1`.
pub fn parse_semester(label: &str) -> Result<u32, ProjectionError> {
    let malformed = || ProjectionError::MalformedSemester(label.to_string());
    let digits = label.strip_prefix("Semester ").ok_or_else(malformed)?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    match digits.parse::<u32>() {
        Ok(index) if index >= 1 => Ok(index),
        _ => Err(malformed()),
    }
}

pub fn projected_cgpa(
    semester: u32,
    prior_cgpa: Option<f64>,
    candidate: &Numeric,
) -> Result<f64, ProjectionError> {
    let sgpa = candidate
        .as_f64()
        .ok_or_else(|| ProjectionError::InvalidInput(candidate.to_string()))?;

    if semester <= 1 {
        return Ok(sgpa);
    }

    let prior = prior_cgpa.ok_or(ProjectionError::MissingData { semester })?;
    let completed = f64::from(semester - 1);
    Ok(round_cents((prior * completed + sgpa) / f64::from(semester)))
}

pub fn project_record(record: &StudentRecord, candidate: &Numeric) -> Result<f64, ProjectionError> {
    let semester = parse_semester(&record.semester)?;
    projected_cgpa(semester, record.prior_cgpa(), candidate)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioProjection {
    pub scenario: Scenario,
    pub sgpa: Option<Numeric>,
    pub cgpa: Option<Result<f64, ProjectionError>>,
}

pub fn project_scenarios(record: &StudentRecord) -> Vec<ScenarioProjection> {
    Scenario::ALL
        .iter()
        .map(|&scenario| {
            let sgpa = record.prediction(scenario).cloned();
            let cgpa = sgpa.as_ref().map(|value| project_record(record, value));
            ScenarioProjection { scenario, sgpa, cgpa }
        })
        .collect()
}

// Half-up to two decimals; the nudge absorbs binary error such as 8.335 -> 8.33499...
fn round_cents(value: f64) -> f64 {
    ((value * 100.0) + 1e-9).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AcademicHistory, CumulativeStats, PredictionResult, Predictions};

    fn record(semester: &str, prior: Option<f64>) -> StudentRecord {
        StudentRecord {
            name: "Jules Moreno".to_string(),
            usn: "1MS22IS045".to_string(),
            semester: semester.to_string(),
            cgpa: prior.map(Numeric::from),
            courses: Vec::new(),
            academic_history: Some(AcademicHistory {
                cumulative: Some(CumulativeStats {
                    cgpa: prior.map(Numeric::from),
                    ..CumulativeStats::default()
                }),
                semesters: Vec::new(),
            }),
            predictions: None,
        }
    }

    #[test]
    fn parses_semester_labels() {
        assert_eq!(parse_semester("Semester 1"), Ok(1));
        assert_eq!(parse_semester("Semester 12"), Ok(12));
    }

    #[test]
    fn rejects_malformed_semester_labels() {
        for label in ["Semester", "Semester ", "Sem 3", "semester 3", "Semester 3a", "Semester -1", "Semester 0", "3"] {
            assert!(
                matches!(parse_semester(label), Err(ProjectionError::MalformedSemester(_))),
                "{label}"
            );
        }
    }

    #[test]
    fn first_semester_keeps_sgpa() {
        assert_eq!(projected_cgpa(1, None, &Numeric::from(8.5)), Ok(8.5));
        assert_eq!(projected_cgpa(1, None, &Numeric::Text("8.567".to_string())), Ok(8.567));
    }

    #[test]
    fn later_semesters_blend_with_history() {
        assert_eq!(projected_cgpa(3, Some(8.0), &Numeric::from(9.0)), Ok(8.33));
        assert_eq!(projected_cgpa(2, Some(7.0), &Numeric::Text("8.35".to_string())), Ok(7.68));
    }

    #[test]
    fn rounds_half_up() {
        // (8.0 + 8.67) / 2 = 8.335
        assert_eq!(projected_cgpa(2, Some(8.0), &Numeric::from(8.67)), Ok(8.34));
    }

    #[test]
    fn missing_prior_cgpa_is_reported() {
        assert_eq!(
            projected_cgpa(4, None, &Numeric::from(9.0)),
            Err(ProjectionError::MissingData { semester: 4 })
        );
    }

    #[test]
    fn non_numeric_candidate_is_invalid() {
        assert_eq!(
            projected_cgpa(1, None, &Numeric::Text("N/A".to_string())),
            Err(ProjectionError::InvalidInput("N/A".to_string()))
        );
    }

    #[test]
    fn scenarios_are_projected_independently() {
        let mut student = record("Semester 3", Some(8.0));
        student.predictions = Some(Predictions {
            atleast: Some(PredictionResult { predicted_sgpa: Some(Numeric::from(9.0)) }),
            mostlikely: Some(PredictionResult { predicted_sgpa: Some(Numeric::Text("soon".to_string())) }),
            maxeffort: None,
        });

        let projections = project_scenarios(&student);
        assert_eq!(projections.len(), 3);
        assert_eq!(projections[0].cgpa, Some(Ok(8.33)));
        assert!(matches!(projections[1].cgpa, Some(Err(ProjectionError::InvalidInput(_)))));
        assert_eq!(projections[2].sgpa, None);
        assert_eq!(projections[2].cgpa, None);
    }

    #[test]
    fn top_level_cgpa_is_not_a_prior() {
        let mut student = record("Semester 3", None);
        student.cgpa = Some(Numeric::from(8.0));
        student.academic_history = None;

        assert_eq!(
            project_record(&student, &Numeric::from(9.0)),
            Err(ProjectionError::MissingData { semester: 3 })
        );
    }

    #[test]
    fn malformed_semester_fails_each_scenario() {
        let mut student = record("Term 3", Some(8.0));
        student.predictions = Some(Predictions {
            atleast: Some(PredictionResult { predicted_sgpa: Some(Numeric::from(9.0)) }),
            ..Predictions::default()
        });

        let projections = project_scenarios(&student);
        assert!(matches!(projections[0].cgpa, Some(Err(ProjectionError::MalformedSemester(_)))));
    }
}
