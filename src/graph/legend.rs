use std::collections::HashSet;

use super::config::TopologyMode;
use super::ranking::{GroupRanking, OVERFLOW_COLOR};
use super::types::{LegendEntry, Node};

/// Summarizes the generated graph into legend rows, largest group first.
///
/// Every featured group gets a row counting all of its members, so a person in
/// two featured groups counts toward both. Pairwise legends also fold the gray
/// groups into a single trailing "Other" row whose count is the number of
/// distinct people colored gray.
pub fn aggregate_legend(mode: TopologyMode, ranking: &GroupRanking, nodes: &[Node]) -> Vec<LegendEntry> {
    let mut entries = ranking
        .featured()
        .iter()
        .map(|group| LegendEntry {
            key: group.key.clone(),
            label: group.label.clone(),
            color: group.color,
            count: group.count,
            collapsed_groups: 0,
        })
        .collect::<Vec<_>>();

    sort_entries(&mut entries);

    if mode == TopologyMode::Pairwise
        && let Some(other) = overflow_entry(ranking, nodes)
    {
        entries.push(other);
    }

    entries
}

fn overflow_entry(ranking: &GroupRanking, nodes: &[Node]) -> Option<LegendEntry> {
    let mut gray_groups = HashSet::new();
    let mut gray_people = HashSet::new();
    for node in nodes.iter().filter(|node| !node.featured && !node.is_group()) {
        if let Some(key) = node.group_key.as_deref() {
            gray_groups.insert(key);
            gray_people.insert(node.id.as_str());
        }
    }

    if gray_groups.is_empty() {
        return None;
    }

    let dimension = ranking.dimension();
    Some(LegendEntry {
        key: format!("other:{}", dimension.label().to_lowercase()),
        label: format!("Other {} ({})", dimension.plural_label(), gray_groups.len()),
        color: OVERFLOW_COLOR,
        count: gray_people.len(),
        collapsed_groups: gray_groups.len(),
    })
}

fn sort_entries(entries: &mut [LegendEntry]) {
    entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::super::build::build_graph;
    use super::super::config::GraphConfig;
    use super::super::dimension::Dimension;
    use super::*;
    use crate::people::Person;

    fn people(values: Vec<serde_json::Value>) -> Vec<Person> {
        values
            .into_iter()
            .map(|value| serde_json::from_value(value).unwrap())
            .collect()
    }

    fn company_population() -> Vec<Person> {
        let mut values = Vec::new();
        // nine companies; "big" has the most people so it ranks first
        for index in 0..4 {
            values.push(json!({ "id": format!("big{index}"), "companies": [{ "key": "big", "name": "Big Co" }] }));
        }
        for company in 0..8 {
            for member in 0..2 {
                values.push(json!({
                    "id": format!("c{company}m{member}"),
                    "companies": [{ "key": format!("co-{company}") }]
                }));
            }
        }
        // people outside the featured eight
        values.push(json!({ "id": "solo1", "companies": [{ "key": "tiny-a" }] }));
        values.push(json!({ "id": "solo2", "companies": [{ "key": "tiny-a" }, { "key": "tiny-b" }] }));
        values.push(json!({ "id": "solo3", "companies": [{ "key": "tiny-c" }] }));
        values.push(json!({ "id": "nobody" }));
        people(values)
    }

    fn pairwise_config() -> GraphConfig {
        GraphConfig {
            mode: TopologyMode::Pairwise,
            dimension: Dimension::Company,
            top_n: 8,
            max_nodes: 100,
            ..GraphConfig::default()
        }
    }

    #[test]
    fn pairwise_legend_collapses_gray_groups() {
        let output = build_graph(&company_population(), &pairwise_config());

        let other = output.legend.last().unwrap();
        assert!(other.is_overflow());
        assert_eq!(other.color, OVERFLOW_COLOR);
        // co-7 falls out of the top eight along with the tiny companies
        assert_eq!(other.collapsed_groups, 3);
        assert_eq!(other.label, "Other Companies (3)");
        assert_eq!(other.count, 5);
    }

    #[test]
    fn pairwise_legend_lists_groups_that_only_appear_as_secondary_colors() {
        let population = people(vec![
            json!({ "id": "a", "skills": ["rust", "go"] }),
            json!({ "id": "b", "skills": ["rust", "go"] }),
            json!({ "id": "c", "skills": ["rust"] }),
        ]);
        let config = GraphConfig {
            dimension: Dimension::Skills,
            ..pairwise_config()
        };
        let output = build_graph(&population, &config);

        // nobody is colored by "go", but it still rings two nodes
        assert!(output.nodes.iter().all(|node| node.group_key.as_deref() == Some("rust")));
        let ringed = output
            .nodes
            .iter()
            .filter(|node| node.secondary_colors.len() == 2)
            .count();
        assert_eq!(ringed, 2);

        let rows = output
            .legend
            .iter()
            .map(|entry| (entry.key.as_str(), entry.count))
            .collect::<Vec<_>>();
        assert_eq!(rows, [("rust", 3), ("go", 2)]);
    }

    #[test]
    fn pairwise_legend_counts_every_attributed_person_once() {
        let population = company_population();
        let output = build_graph(&population, &pairwise_config());

        let with_attributes = population
            .iter()
            .filter(|person| !Dimension::Company.attributes_for(person).is_empty())
            .count();
        let total = output.legend.iter().map(|entry| entry.count).sum::<usize>();
        assert_eq!(total, with_attributes);
    }

    #[test]
    fn entries_sort_by_count_then_label() {
        let output = build_graph(&company_population(), &pairwise_config());
        let featured = output
            .legend
            .iter()
            .filter(|entry| !entry.is_overflow())
            .collect::<Vec<_>>();

        assert_eq!(featured[0].label, "Big Co");
        assert_eq!(featured[0].count, 4);
        for pair in featured.windows(2) {
            assert!(
                pair[0].count > pair[1].count
                    || (pair[0].count == pair[1].count && pair[0].label <= pair[1].label)
            );
        }
    }

    #[test]
    fn bipartite_legend_has_no_overflow_row() {
        let config = GraphConfig {
            mode: TopologyMode::Bipartite,
            ..pairwise_config()
        };
        let output = build_graph(&company_population(), &config);

        assert_eq!(output.legend.len(), 8);
        assert!(output.legend.iter().all(|entry| !entry.is_overflow()));
        assert_eq!(output.legend[0].count, 4);
    }
}
