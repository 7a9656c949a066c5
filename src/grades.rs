use crate::models::{Course, StudentRecord};

pub const PASS_FLOOR: f64 = 35.0;
pub const SEE_MAX: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeThreshold {
    pub label: &'static str,
    pub target: f64,
}

pub const GRADE_THRESHOLDS: [GradeThreshold; 7] = [
    GradeThreshold { label: "O", target: 90.0 },
    GradeThreshold { label: "A+", target: 80.0 },
    GradeThreshold { label: "A", target: 70.0 },
    GradeThreshold { label: "B+", target: 60.0 },
    GradeThreshold { label: "B", target: 55.0 },
    GradeThreshold { label: "C", target: 50.0 },
    GradeThreshold { label: "P", target: 40.0 },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeBand {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
}

pub const GRADE_BANDS: [GradeBand; 7] = [
    GradeBand { label: "O", min: 90.0, max: 100.0 },
    GradeBand { label: "A+", min: 80.0, max: 89.0 },
    GradeBand { label: "A", min: 70.0, max: 79.0 },
    GradeBand { label: "B+", min: 60.0, max: 69.0 },
    GradeBand { label: "B", min: 55.0, max: 59.0 },
    GradeBand { label: "C", min: 50.0, max: 54.0 },
    GradeBand { label: "P", min: 40.0, max: 49.0 },
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Requirement {
    Secured,
    Marks(f64),
    Unreachable,
}

impl Requirement {
    pub fn marks(self) -> Option<f64> {
        match self {
            Requirement::Marks(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_pass_floor(self) -> bool {
        matches!(self, Requirement::Marks(value) if value == PASS_FLOOR)
    }
}

/// SEE marks (out of 100) needed so that `internal + see / 2 >= target`.
pub fn required_see(internal_score: f64, target: f64) -> Requirement {
    let required = (target - internal_score) * 2.0;
    if required <= 0.0 {
        return Requirement::Secured;
    }

    let clamped = required.max(PASS_FLOOR);
    if clamped > SEE_MAX {
        Requirement::Unreachable
    } else {
        Requirement::Marks(clamped)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeRequirement {
    pub label: &'static str,
    pub requirement: Requirement,
}

pub fn course_requirements(course: &Course) -> Vec<GradeRequirement> {
    GRADE_THRESHOLDS
        .iter()
        .map(|threshold| GradeRequirement {
            label: threshold.label,
            requirement: required_see(course.internal_score, threshold.target),
        })
        .collect()
}

pub fn achievable_grades(course: &Course) -> Vec<(&'static str, f64)> {
    course_requirements(course)
        .into_iter()
        .filter_map(|grade| grade.requirement.marks().map(|marks| (grade.label, marks)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BandRange {
    Single(f64),
    Span { high: f64, low: f64 },
}

impl BandRange {
    pub fn render(self) -> String {
        match self {
            BandRange::Single(value) => format_marks(value),
            BandRange::Span { high, low } => {
                format!("{} - {}", format_marks(high), format_marks(low))
            }
        }
    }

    // The lower edge of a band sits one point below the next band's floor,
    // so a band reachable with pass marks alone renders as "36 - 35".
    fn is_collapsed(self) -> bool {
        matches!(self, BandRange::Span { high, low } if high == PASS_FLOOR + 1.0 && low == PASS_FLOOR)
    }
}

pub fn band_range(internal_score: f64, band: &GradeBand) -> Option<BandRange> {
    let low = ((band.min - internal_score) * 2.0).max(PASS_FLOOR);
    let high = ((band.max - internal_score) * 2.0).max(PASS_FLOOR) + 1.0;

    if low > SEE_MAX {
        return None;
    }
    let high = high.min(SEE_MAX);

    if low == high {
        Some(BandRange::Single(low))
    } else {
        Some(BandRange::Span { high, low })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BandCell {
    pub label: &'static str,
    pub range: BandRange,
}

pub fn course_bands(course: &Course) -> Vec<BandCell> {
    GRADE_BANDS
        .iter()
        .filter_map(|band| {
            let range = band_range(course.internal_score, band)?;
            (!range.is_collapsed()).then_some(BandCell { label: band.label, range })
        })
        .collect()
}

/// The most grades any course needs above the pass floor, never fewer than one.
pub fn table_columns(record: &StudentRecord) -> &'static [GradeThreshold] {
    let widest = record
        .courses
        .iter()
        .map(|course| {
            achievable_grades(course)
                .iter()
                .filter(|(_, marks)| *marks > PASS_FLOOR)
                .count()
        })
        .max()
        .unwrap_or(0);

    &GRADE_THRESHOLDS[..widest.max(1)]
}

pub fn format_marks(value: f64) -> String {
    format!("{value}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn course(internal_score: f64) -> Course {
        Course {
            course_code: "CS51".to_string(),
            course_name: "Compiler Design".to_string(),
            internal_score,
        }
    }

    #[test]
    fn thresholds_are_strictly_descending() {
        for pair in GRADE_THRESHOLDS.windows(2) {
            assert!(pair[0].target > pair[1].target);
        }
    }

    #[test]
    fn full_internals_secure_a_pass() {
        assert_eq!(required_see(50.0, 40.0), Requirement::Secured);
    }

    #[test]
    fn zero_internals_cannot_reach_o() {
        assert_eq!(required_see(0.0, 90.0), Requirement::Unreachable);
    }

    #[test]
    fn requirement_doubles_the_gap() {
        assert_eq!(required_see(30.0, 60.0), Requirement::Marks(60.0));
        assert!(!required_see(30.0, 60.0).is_pass_floor());
    }

    #[test]
    fn small_requirements_rise_to_pass_floor() {
        let requirement = required_see(48.0, 50.0);
        assert_eq!(requirement, Requirement::Marks(35.0));
        assert!(requirement.is_pass_floor());
    }

    #[test]
    fn exactly_one_hundred_is_still_reachable() {
        assert_eq!(required_see(40.0, 90.0), Requirement::Marks(100.0));
        assert_eq!(required_see(39.5, 90.0), Requirement::Unreachable);
    }

    #[test]
    fn more_internals_never_raise_the_requirement() {
        let rank = |requirement: Requirement| match requirement {
            Requirement::Secured => 0.0,
            Requirement::Marks(value) => value,
            Requirement::Unreachable => f64::INFINITY,
        };

        for threshold in GRADE_THRESHOLDS.iter() {
            let mut previous = f64::INFINITY;
            for half_points in 0..=100 {
                let internal = half_points as f64 / 2.0;
                let current = rank(required_see(internal, threshold.target));
                assert!(current <= previous, "{} at {internal}", threshold.label);
                assert_eq!(required_see(internal, threshold.target), required_see(internal, threshold.target));
                previous = current;
            }
        }
    }

    #[test]
    fn achievable_grades_keep_table_order() {
        let grades = achievable_grades(&course(30.0));
        let labels: Vec<&str> = grades.iter().map(|(label, _)| *label).collect();
        assert_eq!(labels, vec!["A+", "A", "B+", "B", "C", "P"]);
        assert_eq!(grades[0].1, 100.0);
        assert_eq!(grades[5].1, 35.0);
    }

    #[test]
    fn achievable_grades_may_be_empty() {
        assert!(achievable_grades(&course(0.0)).is_empty());
    }

    #[test]
    fn pass_band_collapses_when_floor_is_enough() {
        // P band for 45/50: low = max(35, -10) = 35, high = max(35, 8) + 1 = 36.
        let range = band_range(45.0, &GRADE_BANDS[6]).unwrap();
        assert_eq!(range.render(), "36 - 35");

        // B and C collapse the same way at 45/50.
        let labels: Vec<&str> = course_bands(&course(45.0)).iter().map(|cell| cell.label).collect();
        assert_eq!(labels, vec!["O", "A+", "A", "B+"]);
    }

    #[test]
    fn bands_render_high_then_low() {
        let cells = course_bands(&course(30.0));
        let rendered: Vec<(&str, String)> =
            cells.iter().map(|cell| (cell.label, cell.range.render())).collect();
        assert_eq!(
            rendered,
            vec![
                ("A+", "100".to_string()),
                ("A", "99 - 80".to_string()),
                ("B+", "79 - 60".to_string()),
                ("B", "59 - 50".to_string()),
                ("C", "49 - 40".to_string()),
                ("P", "39 - 35".to_string()),
            ]
        );
    }

    #[test]
    fn fractional_internals_render_with_decimals() {
        assert_eq!(required_see(22.5, 60.0), Requirement::Marks(75.0));
        assert_eq!(format_marks(75.0), "75");
        assert_eq!(format_marks(46.5), "46.5");
    }

    #[test]
    fn table_columns_ignore_floor_only_grades() {
        let record = StudentRecord {
            name: "Avery Lee".to_string(),
            usn: "1MS21CS001".to_string(),
            semester: "Semester 1".to_string(),
            cgpa: None,
            courses: vec![course(48.0), course(42.0)],
            academic_history: None,
            predictions: None,
        };
        // 42/50 needs more than the floor for O through B+.
        assert_eq!(table_columns(&record).len(), 4);

        let record = StudentRecord { courses: Vec::new(), ..record };
        assert_eq!(table_columns(&record).len(), 1);
    }
}
