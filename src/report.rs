use std::fmt::Write;

use chrono::NaiveDate;
use tracing::debug;

use crate::grades::{self, Requirement, GRADE_THRESHOLDS};
use crate::history;
use crate::models::{Numeric, StudentRecord};
use crate::projection;

const NOT_AVAILABLE: &str = "N/A";

fn or_na(value: Option<&Numeric>) -> String {
    value.map_or_else(|| NOT_AVAILABLE.to_string(), Numeric::to_string)
}

pub fn render_marks_table(record: &StudentRecord) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Required SEE Marks for Target Grades");
    if record.courses.is_empty() {
        let _ = writeln!(output, "No course data available");
        return output;
    }

    let columns = grades::table_columns(record);
    let _ = write!(output, "| Course Name |");
    for threshold in columns {
        let _ = write!(output, " {} (≥{}) |", threshold.label, threshold.target);
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "|---|{}", "---|".repeat(columns.len()));

    let mut any_floor = false;
    for course in record.courses.iter() {
        let _ = write!(output, "| {} |", course.course_name);
        for threshold in columns {
            let cell = match grades::required_see(course.internal_score, threshold.target) {
                requirement @ Requirement::Marks(value) if requirement.is_pass_floor() => {
                    any_floor = true;
                    format!("{}+*", grades::format_marks(value))
                }
                Requirement::Marks(value) => format!("{}+", grades::format_marks(value)),
                Requirement::Secured | Requirement::Unreachable => String::new(),
            };
            let _ = write!(output, " {cell} |");
        }
        let _ = writeln!(output);
    }

    if any_floor {
        let _ = writeln!(output);
        let _ = writeln!(output, "\\* pass marks are enough for this grade");
    }

    output
}

pub fn render_ranges(record: &StudentRecord) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## SEE Ranges per Grade");
    if record.courses.is_empty() {
        let _ = writeln!(output, "No course data available");
        return output;
    }

    for course in record.courses.iter() {
        let _ = writeln!(output);
        let _ = writeln!(output, "### {}", course.course_name);
        let _ = writeln!(
            output,
            "Internal Score: {} / 50",
            grades::format_marks(course.internal_score)
        );

        let cells = grades::course_bands(course);
        if cells.is_empty() {
            let _ = writeln!(output, "- no grade band is reachable");
            continue;
        }
        for cell in cells.iter() {
            let _ = writeln!(output, "- {}: {}", cell.label, cell.range.render());
        }
    }

    output
}

pub fn render_predictions(record: &StudentRecord) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Predicted SGPA");
    if record.predictions.is_none() {
        let _ = writeln!(
            output,
            "Predicted SGPA data not available. Please reload the data to view predictions."
        );
        return output;
    }

    for projection in projection::project_scenarios(record) {
        let cgpa = match &projection.cgpa {
            Some(Ok(value)) => format!("{value:.2}"),
            Some(Err(err)) => {
                debug!(scenario = projection.scenario.key(), error = %err, "projection skipped");
                NOT_AVAILABLE.to_string()
            }
            None => NOT_AVAILABLE.to_string(),
        };
        let _ = writeln!(
            output,
            "- {}: SGPA {} (CGPA: {}) - {}",
            projection.scenario.title(),
            or_na(projection.sgpa.as_ref()),
            cgpa,
            projection.scenario.description()
        );
    }

    output
}

pub fn render_academic_history(record: &StudentRecord) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "## Academic History");
    let history = match record.academic_history.as_ref() {
        Some(history) if history.cumulative.is_some() || !history.semesters.is_empty() => history,
        _ => {
            let _ = writeln!(output, "No academic history found.");
            return output;
        }
    };

    if let Some(cumulative) = history.cumulative.as_ref() {
        let _ = writeln!(output, "- CGPA: {}", or_na(cumulative.cgpa.as_ref()));
        let _ = writeln!(output, "- Credits Earned: {}", or_na(cumulative.credits_earned.as_ref()));
        let _ = writeln!(
            output,
            "- Credits Remaining: {}",
            or_na(cumulative.credits_to_be_earned.as_ref())
        );
    }

    if !history.semesters.is_empty() {
        let _ = writeln!(output);
        for (label, semester) in history::label_semesters(&history.semesters) {
            let _ = writeln!(
                output,
                "- {}: SGPA {} | CGPA {} | Credits {}/{}",
                label,
                or_na(semester.sgpa.as_ref()),
                or_na(semester.cgpa.as_ref()),
                or_na(semester.credits_earned.as_ref()),
                or_na(semester.credits_registered.as_ref())
            );
        }
    }

    output
}

pub fn build_report(record: &StudentRecord, endpoint: Option<&str>, generated_on: NaiveDate) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# NoteRep Report");
    let _ = writeln!(
        output,
        "{} ({}), {}",
        record.name, record.usn, record.semester
    );
    let _ = writeln!(
        output,
        "Generated on {} from endpoint {}",
        generated_on,
        endpoint.unwrap_or(NOT_AVAILABLE)
    );

    for section in [
        render_marks_table(record),
        render_ranges(record),
        render_predictions(record),
        render_academic_history(record),
    ] {
        let _ = writeln!(output);
        output.push_str(&section);
    }

    output
}

/// Required-marks grid for every course and threshold.
pub fn write_marks_csv<W: std::io::Write>(record: &StudentRecord, writer: W) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["course_code", "course_name", "internal_score"];
    header.extend(GRADE_THRESHOLDS.iter().map(|threshold| threshold.label));
    csv.write_record(&header)?;

    for course in record.courses.iter() {
        let mut row = vec![
            course.course_code.clone(),
            course.course_name.clone(),
            grades::format_marks(course.internal_score),
        ];
        row.extend(grades::course_requirements(course).into_iter().map(|grade| {
            match grade.requirement {
                Requirement::Secured => "secured".to_string(),
                Requirement::Marks(value) => grades::format_marks(value),
                Requirement::Unreachable => "unreachable".to_string(),
            }
        }));
        csv.write_record(&row)?;
    }

    csv.flush()?;
    Ok(())
}
