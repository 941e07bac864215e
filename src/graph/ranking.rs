use std::collections::HashMap;

use eframe::egui::Color32;
use serde::Serialize;

use crate::people::Person;
use crate::util::serialize_color;

use super::dimension::{Dimension, UNKNOWN_LOCATION_KEY};

/// Colors handed out to featured groups by rank.
pub const PALETTE: [Color32; 12] = [
    Color32::from_rgb(78, 121, 167),
    Color32::from_rgb(242, 142, 43),
    Color32::from_rgb(225, 87, 89),
    Color32::from_rgb(118, 183, 178),
    Color32::from_rgb(89, 161, 79),
    Color32::from_rgb(237, 201, 72),
    Color32::from_rgb(176, 122, 161),
    Color32::from_rgb(255, 157, 167),
    Color32::from_rgb(156, 117, 95),
    Color32::from_rgb(102, 194, 255),
    Color32::from_rgb(188, 189, 34),
    Color32::from_rgb(148, 103, 189),
];

/// Shared color for every group outside the featured set.
pub const OVERFLOW_COLOR: Color32 = Color32::from_rgb(140, 146, 156);

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RankedGroup {
    pub key: String,
    pub label: String,
    pub count: usize,
    pub rank: usize,
    #[serde(serialize_with = "serialize_color")]
    pub color: Color32,
}

/// Frequency ranking of one dimension's groups over a population, with the
/// featured groups' color assignment. Computed once per generation pass and
/// shared by node building and legend aggregation.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupRanking {
    dimension: Dimension,
    featured: Vec<RankedGroup>,
    rank_by_key: HashMap<String, usize>,
}

impl GroupRanking {
    pub fn compute(population: &[&Person], dimension: Dimension, top_n: usize) -> Self {
        let top_n = top_n.min(PALETTE.len());

        let mut counts: HashMap<String, usize> = HashMap::new();
        for person in population {
            for key in dimension.attributes_for(person) {
                if key == UNKNOWN_LOCATION_KEY && dimension == Dimension::Location {
                    continue;
                }
                *counts.entry(key).or_default() += 1;
            }
        }

        let mut ranked = counts.into_iter().collect::<Vec<_>>();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(top_n);

        let featured = ranked
            .into_iter()
            .enumerate()
            .map(|(rank, (key, count))| {
                let label = population
                    .iter()
                    .find_map(|person| dimension.group_label(person, &key))
                    .unwrap_or_else(|| dimension.label_from_key(&key));
                RankedGroup {
                    label,
                    count,
                    rank,
                    color: PALETTE[rank],
                    key,
                }
            })
            .collect::<Vec<_>>();

        let rank_by_key = featured
            .iter()
            .map(|group| (group.key.clone(), group.rank))
            .collect();

        Self {
            dimension,
            featured,
            rank_by_key,
        }
    }

    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn featured(&self) -> &[RankedGroup] {
        &self.featured
    }

    pub fn rank_of(&self, key: &str) -> Option<usize> {
        self.rank_by_key.get(key).copied()
    }

    pub fn color_for(&self, key: &str) -> Color32 {
        self.rank_of(key)
            .map(|rank| self.featured[rank].color)
            .unwrap_or(OVERFLOW_COLOR)
    }

    /// Featured groups among `keys`, best rank first.
    pub fn memberships(&self, keys: &[String]) -> Vec<&RankedGroup> {
        let mut groups = keys
            .iter()
            .filter_map(|key| self.rank_of(key))
            .map(|rank| &self.featured[rank])
            .collect::<Vec<_>>();
        groups.sort_by_key(|group| group.rank);
        groups
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn people(values: Vec<serde_json::Value>) -> Vec<Person> {
        values
            .into_iter()
            .map(|value| serde_json::from_value(value).unwrap())
            .collect()
    }

    fn skills(id: &str, skills: &[&str]) -> serde_json::Value {
        json!({ "id": id, "skills": skills })
    }

    #[test]
    fn ranks_by_count_then_key() {
        let population = people(vec![
            skills("a", &["rust", "go"]),
            skills("b", &["rust", "sql"]),
            skills("c", &["go", "rust"]),
            skills("d", &["sql", "c"]),
        ]);
        let refs = population.iter().collect::<Vec<_>>();

        let ranking = GroupRanking::compute(&refs, Dimension::Skills, 3);
        let keys = ranking
            .featured()
            .iter()
            .map(|group| (group.key.as_str(), group.count))
            .collect::<Vec<_>>();
        assert_eq!(keys, [("rust", 3), ("go", 2), ("sql", 2)]);
        assert_eq!(ranking.color_for("rust"), PALETTE[0]);
        assert_eq!(ranking.color_for("sql"), PALETTE[2]);
        assert_eq!(ranking.color_for("c"), OVERFLOW_COLOR);
    }

    #[test]
    fn ranking_is_deterministic() {
        let population = people(
            (0..30)
                .map(|index| {
                    let skill = format!("skill-{}", index % 7);
                    json!({ "id": format!("p{index}"), "skills": [skill, "shared"] })
                })
                .collect(),
        );
        let refs = population.iter().collect::<Vec<_>>();

        let first = GroupRanking::compute(&refs, Dimension::Skills, 6);
        let second = GroupRanking::compute(&refs, Dimension::Skills, 6);
        assert_eq!(first, second);
    }

    #[test]
    fn oversized_top_n_is_clamped_and_colors_stay_distinct() {
        let population = people(
            (0..40)
                .map(|index| json!({ "id": format!("p{index}"), "skills": [format!("s{index}")] }))
                .collect(),
        );
        let refs = population.iter().collect::<Vec<_>>();

        let ranking = GroupRanking::compute(&refs, Dimension::Skills, 50);
        assert_eq!(ranking.featured().len(), PALETTE.len());

        let mut colors = ranking
            .featured()
            .iter()
            .map(|group| group.color.to_array())
            .collect::<Vec<_>>();
        colors.sort();
        colors.dedup();
        assert_eq!(colors.len(), PALETTE.len());
        assert!(!colors.contains(&OVERFLOW_COLOR.to_array()));
    }

    #[test]
    fn empty_population_features_nothing() {
        let ranking = GroupRanking::compute(&[], Dimension::Company, 8);
        assert!(ranking.featured().is_empty());
        assert_eq!(ranking.color_for("anything"), OVERFLOW_COLOR);
    }

    #[test]
    fn unknown_location_is_never_featured() {
        let population = people(vec![
            json!({ "id": "a", "location": { "country": "de" } }),
            json!({ "id": "b", "location": { "country": "fr" } }),
            json!({ "id": "c", "location": { "city": "lima", "city_name": "Lima" } }),
        ]);
        let refs = population.iter().collect::<Vec<_>>();

        let ranking = GroupRanking::compute(&refs, Dimension::Location, 6);
        assert_eq!(ranking.featured().len(), 1);
        assert_eq!(ranking.featured()[0].label, "Lima");
    }

    #[test]
    fn memberships_are_sorted_by_rank() {
        let population = people(vec![
            skills("a", &["rust", "go"]),
            skills("b", &["rust"]),
        ]);
        let refs = population.iter().collect::<Vec<_>>();
        let ranking = GroupRanking::compute(&refs, Dimension::Skills, 6);

        let keys = ["go".to_owned(), "rust".to_owned(), "cobol".to_owned()];
        let ranks = ranking
            .memberships(&keys)
            .iter()
            .map(|group| group.key.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ranks, ["rust", "go"]);
    }
}
