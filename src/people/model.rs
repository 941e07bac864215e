use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Year with an optional month, ordered chronologically. A missing month
/// sorts before any explicit month of the same year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartialDate {
    pub year: i32,
    pub month: Option<u8>,
}

impl PartialDate {
    pub fn parse(raw: &str) -> Option<Self> {
        let mut parts = raw.trim().split(['-', '/']);
        let year = parts.next()?.trim().parse::<i32>().ok()?;
        let month = match parts.next() {
            Some(value) => {
                let month = value.trim().parse::<u8>().ok()?;
                if !(1..=12).contains(&month) {
                    return None;
                }
                Some(month)
            }
            None => None,
        };

        Some(Self { year, month })
    }
}

impl fmt::Display for PartialDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(month) => write!(f, "{:04}-{month:02}", self.year),
            None => write!(f, "{:04}", self.year),
        }
    }
}

impl Serialize for PartialDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<PartialDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(serde_json::Value::String(text)) => PartialDate::parse(&text),
        Some(serde_json::Value::Number(number)) => number
            .as_i64()
            .and_then(|year| i32::try_from(year).ok())
            .map(|year| PartialDate { year, month: None }),
        _ => None,
    })
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EducationRecord {
    /// Canonical school identifier, when the source had one.
    #[serde(default)]
    pub school_id: Option<String>,
    #[serde(default)]
    pub school_name: String,
    #[serde(default)]
    pub degree: Option<String>,
    /// `None` means ongoing.
    #[serde(default, deserialize_with = "lenient_date")]
    pub end: Option<PartialDate>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Employer {
    pub key: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub city_name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// One normalized profile. Attribute keys are expected to be normalized by
/// the ingestion side already; employers are listed most recent first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub education: Vec<EducationRecord>,
    #[serde(default)]
    pub companies: Vec<Employer>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub skills: Vec<String>,
}

impl Person {
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() { &self.id } else { name }
    }

    /// Cheap connectivity estimate used to pick which people to keep when the
    /// population has to be capped.
    pub fn connectivity_estimate(&self) -> usize {
        self.companies.len() + self.education.len() + self.skills.len()
    }

    /// Education records ordered most recent first; ongoing studies count as
    /// the most recent.
    pub fn education_by_recency(&self) -> Vec<&EducationRecord> {
        let mut records = self.education.iter().collect::<Vec<_>>();
        records.sort_by(|a, b| match (a.end, b.end) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(a_end), Some(b_end)) => b_end.cmp(&a_end),
        });
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_dates_parse_year_and_month() {
        assert_eq!(
            PartialDate::parse("2019-06"),
            Some(PartialDate {
                year: 2019,
                month: Some(6)
            })
        );
        assert_eq!(
            PartialDate::parse(" 2021 "),
            Some(PartialDate {
                year: 2021,
                month: None
            })
        );
        assert_eq!(PartialDate::parse("2021-13"), None);
        assert_eq!(PartialDate::parse("soon"), None);
    }

    #[test]
    fn unparsable_end_dates_become_undated() {
        let record: EducationRecord = serde_json::from_value(serde_json::json!({
            "school_name": "Delft",
            "end": "someday"
        }))
        .unwrap();
        assert_eq!(record.end, None);

        let record: EducationRecord = serde_json::from_value(serde_json::json!({
            "school_name": "Delft",
            "end": 2014
        }))
        .unwrap();
        assert_eq!(record.end.map(|date| date.year), Some(2014));
    }

    #[test]
    fn ongoing_education_sorts_first() {
        let person: Person = serde_json::from_value(serde_json::json!({
            "id": "p1",
            "education": [
                { "school_name": "Old", "end": "2010" },
                { "school_name": "Current" },
                { "school_name": "Recent", "end": "2018-09" }
            ]
        }))
        .unwrap();

        let names = person
            .education_by_recency()
            .into_iter()
            .map(|record| record.school_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["Current", "Recent", "Old"]);
    }

    #[test]
    fn display_name_falls_back_to_id() {
        let person: Person = serde_json::from_value(serde_json::json!({ "id": "p7" })).unwrap();
        assert_eq!(person.display_name(), "p7");
    }
}
