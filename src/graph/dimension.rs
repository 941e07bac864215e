use std::collections::HashSet;

use clap::ValueEnum;
use eframe::egui::Color32;
use serde::{Deserialize, Serialize};

use crate::people::{EducationRecord, Person};
use crate::util::{humanize_key, slugify};

/// Key reported for a person who has a location record without a city.
pub const UNKNOWN_LOCATION_KEY: &str = "unknown";

const SYNTHETIC_SCHOOL_PREFIX: &str = "school:";
const SAME_COUNTRY_STRENGTH: f32 = 0.3;

/// The relationship axis people are grouped along.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    #[default]
    Education,
    Company,
    Location,
    Skills,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Similarity {
    pub strength: f32,
    pub shared: Vec<String>,
}

impl Dimension {
    pub const ALL: [Self; 4] = [Self::Education, Self::Company, Self::Location, Self::Skills];

    pub fn label(self) -> &'static str {
        match self {
            Self::Education => "Education",
            Self::Company => "Company",
            Self::Location => "Location",
            Self::Skills => "Skills",
        }
    }

    pub fn plural_label(self) -> &'static str {
        match self {
            Self::Education => "Schools",
            Self::Company => "Companies",
            Self::Location => "Locations",
            Self::Skills => "Skills",
        }
    }

    /// Color used for pairwise edges in this dimension.
    pub fn link_color(self) -> Color32 {
        match self {
            Self::Education => Color32::from_rgb(102, 153, 255),
            Self::Company => Color32::from_rgb(255, 153, 51),
            Self::Location => Color32::from_rgb(76, 187, 120),
            Self::Skills => Color32::from_rgb(204, 102, 204),
        }
    }

    /// Group keys of `person` in this dimension, in record order without
    /// duplicates. Missing data yields an empty list.
    pub fn attributes_for(self, person: &Person) -> Vec<String> {
        let keys: Vec<String> = match self {
            Self::Education => person.education.iter().filter_map(school_key).collect(),
            Self::Company => person
                .companies
                .iter()
                .map(|employer| employer.key.trim())
                .filter(|key| !key.is_empty())
                .map(str::to_owned)
                .collect(),
            Self::Location => match &person.location {
                Some(location) => vec![
                    non_blank(location.city.as_deref())
                        .unwrap_or(UNKNOWN_LOCATION_KEY)
                        .to_owned(),
                ],
                None => Vec::new(),
            },
            Self::Skills => person
                .skills
                .iter()
                .map(|skill| skill.trim())
                .filter(|skill| !skill.is_empty())
                .map(str::to_owned)
                .collect(),
        };

        let mut seen = HashSet::with_capacity(keys.len());
        keys.into_iter().filter(|key| seen.insert(key.clone())).collect()
    }

    /// Similarity of two people in this dimension, or `None` when they have
    /// nothing in common. The result is symmetric in its arguments.
    pub fn strength_of(self, a: &Person, b: &Person) -> Option<Similarity> {
        if self == Self::Location {
            return location_similarity(a, b);
        }

        let a_keys = self.attributes_for(a);
        let b_keys = self.attributes_for(b);
        let b_set = b_keys.iter().collect::<HashSet<_>>();
        let mut shared = a_keys
            .iter()
            .filter(|key| b_set.contains(key))
            .cloned()
            .collect::<Vec<_>>();
        if shared.is_empty() {
            return None;
        }
        shared.sort();

        let denominator = match self {
            Self::Skills => {
                let union = a_keys.len() + b_keys.len() - shared.len();
                union as f32
            }
            _ => a_keys.len().max(b_keys.len()).max(1) as f32,
        };
        let strength = if denominator > 0.0 {
            (shared.len() as f32 / denominator).min(1.0)
        } else {
            0.0
        };

        Some(Similarity { strength, shared })
    }

    /// Display label for `key` as `person` reports it, if they have it.
    pub fn group_label(self, person: &Person, key: &str) -> Option<String> {
        match self {
            Self::Education => person
                .education
                .iter()
                .find(|record| school_key(record).as_deref() == Some(key))
                .and_then(|record| non_blank(Some(&record.school_name)))
                .map(str::to_owned),
            Self::Company => person
                .companies
                .iter()
                .find(|employer| employer.key.trim() == key)
                .and_then(|employer| non_blank(Some(&employer.name)))
                .map(str::to_owned),
            Self::Location => {
                if key == UNKNOWN_LOCATION_KEY {
                    return Some("Unknown location".to_owned());
                }
                person
                    .location
                    .as_ref()
                    .filter(|location| non_blank(location.city.as_deref()) == Some(key))
                    .and_then(|location| non_blank(location.city_name.as_deref()))
                    .map(str::to_owned)
            }
            Self::Skills => None,
        }
    }

    /// Group a person is shown under when none of their groups are featured:
    /// latest school, current employer, their city or their first skill.
    pub fn fallback_group(self, person: &Person) -> Option<(String, String)> {
        let key = match self {
            Self::Education => person
                .education_by_recency()
                .into_iter()
                .find_map(school_key),
            _ => self.attributes_for(person).into_iter().next(),
        }?;

        let label = self.resolve_label(person, &key);
        Some((key, label))
    }

    pub fn resolve_label(self, person: &Person, key: &str) -> String {
        self.group_label(person, key)
            .unwrap_or_else(|| self.label_from_key(key))
    }

    /// Readable label derived from the key alone.
    pub fn label_from_key(self, key: &str) -> String {
        if self == Self::Location && key == UNKNOWN_LOCATION_KEY {
            "Unknown location".to_owned()
        } else {
            humanize_key(key)
        }
    }
}

/// Canonical school id when present, otherwise a key derived from the school
/// name so identical school text always lands on the same key.
pub fn school_key(record: &EducationRecord) -> Option<String> {
    if let Some(id) = non_blank(record.school_id.as_deref()) {
        return Some(id.to_owned());
    }

    let slug = slugify(&record.school_name);
    if slug.is_empty() {
        None
    } else {
        Some(format!("{SYNTHETIC_SCHOOL_PREFIX}{slug}"))
    }
}

fn location_similarity(a: &Person, b: &Person) -> Option<Similarity> {
    let a_location = a.location.as_ref()?;
    let b_location = b.location.as_ref()?;

    let a_city = non_blank(a_location.city.as_deref());
    if let Some(city) = a_city
        && a_city == non_blank(b_location.city.as_deref())
        && city != UNKNOWN_LOCATION_KEY
    {
        return Some(Similarity {
            strength: 1.0,
            shared: vec![city.to_owned()],
        });
    }

    let a_country = non_blank(a_location.country.as_deref());
    if let Some(country) = a_country
        && a_country == non_blank(b_location.country.as_deref())
    {
        return Some(Similarity {
            strength: SAME_COUNTRY_STRENGTH,
            shared: vec![country.to_owned()],
        });
    }

    None
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn person(value: serde_json::Value) -> Person {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn missing_data_yields_empty_keys() {
        let empty = person(json!({ "id": "x" }));
        for dimension in Dimension::ALL {
            assert!(dimension.attributes_for(&empty).is_empty());
        }
    }

    #[test]
    fn location_yields_at_most_one_key() {
        let with_city = person(json!({
            "id": "a",
            "location": { "city": "berlin", "country": "de" }
        }));
        let without_city = person(json!({ "id": "b", "location": { "country": "de" } }));

        assert_eq!(Dimension::Location.attributes_for(&with_city), ["berlin"]);
        assert_eq!(
            Dimension::Location.attributes_for(&without_city),
            [UNKNOWN_LOCATION_KEY]
        );
    }

    #[test]
    fn schools_without_ids_collide_on_name() {
        let a = person(json!({
            "id": "a",
            "education": [{ "school_name": "Universidad de Chile" }]
        }));
        let b = person(json!({
            "id": "b",
            "education": [{ "school_name": "  universidad de  CHILE" }]
        }));

        let a_keys = Dimension::Education.attributes_for(&a);
        assert_eq!(a_keys, ["school:universidad-de-chile"]);
        assert_eq!(a_keys, Dimension::Education.attributes_for(&b));
    }

    #[test]
    fn canonical_school_ids_win_over_names() {
        let a = person(json!({
            "id": "a",
            "education": [
                { "school_id": "mit", "school_name": "MIT" },
                { "school_id": "mit", "school_name": "Massachusetts Institute of Technology" }
            ]
        }));
        assert_eq!(Dimension::Education.attributes_for(&a), ["mit"]);
    }

    #[test]
    fn education_strength_uses_larger_set() {
        let a = person(json!({
            "id": "a",
            "education": [{ "school_id": "s1" }, { "school_id": "s2" }]
        }));
        let b = person(json!({ "id": "b", "education": [{ "school_id": "s1" }] }));

        let ab = Dimension::Education.strength_of(&a, &b).unwrap();
        let ba = Dimension::Education.strength_of(&b, &a).unwrap();
        assert_eq!(ab.strength, 0.5);
        assert_eq!(ab, ba);
        assert_eq!(ab.shared, ["s1"]);
    }

    #[test]
    fn skills_strength_is_jaccard() {
        let a = person(json!({ "id": "a", "skills": ["rust", "go", "sql"] }));
        let b = person(json!({ "id": "b", "skills": ["rust", "sql", "k8s", "c"] }));

        let similarity = Dimension::Skills.strength_of(&a, &b).unwrap();
        assert!((similarity.strength - 2.0 / 5.0).abs() < 1e-6);
        assert_eq!(similarity.shared, ["rust", "sql"]);
    }

    #[test]
    fn location_strength_prefers_city_over_country() {
        let berlin = person(json!({ "id": "a", "location": { "city": "berlin", "country": "de" } }));
        let berlin_too =
            person(json!({ "id": "b", "location": { "city": "berlin", "country": "de" } }));
        let munich = person(json!({ "id": "c", "location": { "city": "munich", "country": "de" } }));
        let lima = person(json!({ "id": "d", "location": { "city": "lima", "country": "pe" } }));

        let location = Dimension::Location;
        assert_eq!(location.strength_of(&berlin, &berlin_too).unwrap().strength, 1.0);
        assert_eq!(location.strength_of(&berlin, &munich).unwrap().strength, 0.3);
        assert!(location.strength_of(&berlin, &lima).is_none());
    }

    #[test]
    fn unknown_cities_do_not_match_each_other() {
        let a = person(json!({ "id": "a", "location": { "country": "de" } }));
        let b = person(json!({ "id": "b", "location": { "country": "fr" } }));
        assert!(Dimension::Location.strength_of(&a, &b).is_none());
    }

    #[test]
    fn disjoint_people_have_no_similarity() {
        let a = person(json!({ "id": "a", "companies": [{ "key": "acme" }] }));
        let b = person(json!({ "id": "b", "companies": [{ "key": "globex" }] }));
        assert!(Dimension::Company.strength_of(&a, &b).is_none());
    }

    #[test]
    fn education_fallback_picks_most_recent_school() {
        let a = person(json!({
            "id": "a",
            "education": [
                { "school_name": "Old School", "end": "2005" },
                { "school_name": "New School", "end": "2015-06" }
            ]
        }));

        let (key, label) = Dimension::Education.fallback_group(&a).unwrap();
        assert_eq!(key, "school:new-school");
        assert_eq!(label, "New School");
    }

    #[test]
    fn labels_fall_back_to_humanized_keys() {
        let a = person(json!({ "id": "a", "companies": [{ "key": "acme-labs" }] }));
        assert_eq!(Dimension::Company.resolve_label(&a, "acme-labs"), "Acme Labs");
        assert_eq!(Dimension::Skills.resolve_label(&a, "rust"), "Rust");
    }
}
