use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A decimal as the records API sends it: sometimes a JSON number, sometimes a
/// string such as `"8.42"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    pub fn as_f64(&self) -> Option<f64> {
        let value = match self {
            Numeric::Number(value) => *value,
            Numeric::Text(text) => text.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Numeric::Text(text) if text.trim().is_empty())
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Number(value)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Number(value) => write!(f, "{value}"),
            Numeric::Text(text) => f.write_str(text.trim()),
        }
    }
}

// `null`, a missing key and `""` all mean "no value".
fn non_blank<'de, D>(deserializer: D) -> Result<Option<Numeric>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Numeric>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_blank()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub usn: String,
    pub semester: String,
    #[serde(default, deserialize_with = "non_blank", skip_serializing_if = "Option::is_none")]
    pub cgpa: Option<Numeric>,
    pub courses: Vec<Course>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub academic_history: Option<AcademicHistory>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predictions: Option<Predictions>,
}

impl StudentRecord {
    /// Prior cumulative CGPA as reported by the academic history.
    pub fn prior_cgpa(&self) -> Option<f64> {
        self.academic_history
            .as_ref()?
            .cumulative
            .as_ref()?
            .cgpa
            .as_ref()?
            .as_f64()
    }

    pub fn prediction(&self, scenario: Scenario) -> Option<&Numeric> {
        self.predictions.as_ref()?.get(scenario)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Course {
    #[serde(default)]
    pub course_code: String,
    pub course_name: String,
    pub internal_score: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcademicHistory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cumulative: Option<CumulativeStats>,
    #[serde(default)]
    pub semesters: Vec<SemesterRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CumulativeStats {
    #[serde(default, deserialize_with = "non_blank")]
    pub cgpa: Option<Numeric>,
    #[serde(default, deserialize_with = "non_blank")]
    pub credits_earned: Option<Numeric>,
    #[serde(default, deserialize_with = "non_blank")]
    pub credits_to_be_earned: Option<Numeric>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterRecord {
    pub semester: String,
    #[serde(default, deserialize_with = "non_blank")]
    pub sgpa: Option<Numeric>,
    #[serde(default, deserialize_with = "non_blank")]
    pub cgpa: Option<Numeric>,
    #[serde(default, deserialize_with = "non_blank")]
    pub credits_earned: Option<Numeric>,
    #[serde(default, deserialize_with = "non_blank")]
    pub credits_registered: Option<Numeric>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Predictions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atleast: Option<PredictionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mostlikely: Option<PredictionResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maxeffort: Option<PredictionResult>,
}

impl Predictions {
    pub fn get(&self, scenario: Scenario) -> Option<&Numeric> {
        let result = match scenario {
            Scenario::AtLeast => self.atleast.as_ref(),
            Scenario::MostLikely => self.mostlikely.as_ref(),
            Scenario::MaxEffort => self.maxeffort.as_ref(),
        };
        result?.predicted_sgpa.as_ref()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    #[serde(default, deserialize_with = "non_blank")]
    pub predicted_sgpa: Option<Numeric>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    AtLeast,
    MostLikely,
    MaxEffort,
}

impl Scenario {
    pub const ALL: [Scenario; 3] = [Scenario::AtLeast, Scenario::MostLikely, Scenario::MaxEffort];

    pub fn key(self) -> &'static str {
        match self {
            Scenario::AtLeast => "atleast",
            Scenario::MostLikely => "mostlikely",
            Scenario::MaxEffort => "maxeffort",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Scenario::AtLeast => "Minimum Expected",
            Scenario::MostLikely => "Most Likely",
            Scenario::MaxEffort => "Maximum Potential",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Scenario::AtLeast => "Your baseline grade with current effort",
            Scenario::MostLikely => "Expected grade based on current performance",
            Scenario::MaxEffort => "Achievable with maximum effort",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginHistoryEntry {
    pub usn: String,
    pub dob: String,
    pub name: String,
    pub last_used: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint_title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub name: String,
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointCatalog {
    #[serde(default)]
    pub active_endpoints: Vec<Endpoint>,
    #[serde(default)]
    pub current: Option<String>,
}

impl EndpointCatalog {
    pub fn title_of(&self, name: &str) -> Option<&str> {
        self.active_endpoints
            .iter()
            .find(|endpoint| endpoint.name == name)
            .map(|endpoint| endpoint.title.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accepts_numbers_and_strings() {
        let json = r#"{
            "name": "Avery Lee",
            "usn": "1MS21CS001",
            "semester": "Semester 3",
            "cgpa": "8.10",
            "courses": [
                {"CourseCode": "CS31", "CourseName": "Data Structures", "InternalScore": 42.5}
            ],
            "academicHistory": {
                "cumulative": {"cgpa": 8.1, "creditsEarned": "44", "creditsToBeEarned": ""},
                "semesters": [{"semester": "Sem A", "sgpa": "8.0", "creditsEarned": 22, "creditsRegistered": 22}]
            },
            "predictions": {
                "atleast": {"predicted_sgpa": "7.9"},
                "mostlikely": {"predicted_sgpa": 8.4}
            }
        }"#;

        let record: StudentRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.courses[0].internal_score, 42.5);
        assert_eq!(record.prior_cgpa(), Some(8.1));
        let cumulative = record.academic_history.as_ref().unwrap().cumulative.as_ref().unwrap();
        assert!(cumulative.credits_to_be_earned.is_none());
        assert_eq!(record.prediction(Scenario::AtLeast).and_then(Numeric::as_f64), Some(7.9));
        assert_eq!(record.prediction(Scenario::MostLikely).and_then(Numeric::as_f64), Some(8.4));
        assert!(record.prediction(Scenario::MaxEffort).is_none());
    }

    #[test]
    fn numeric_display_keeps_api_text() {
        assert_eq!(Numeric::Text(" 8.50 ".to_string()).to_string(), "8.50");
        assert_eq!(Numeric::Number(9.0).to_string(), "9");
        assert_eq!(Numeric::Text("N/A".to_string()).as_f64(), None);
    }
}
