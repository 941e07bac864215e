use tracing::{debug, info};

use crate::people::{IdentityCheck, Person, ProcessingError};
use crate::util::normalize_log;

use super::config::{GraphConfig, TopologyMode};
use super::legend::aggregate_legend;
use super::ranking::{GroupRanking, OVERFLOW_COLOR, RankedGroup};
use super::types::{Connection, Edge, GraphMetadata, GraphOutput, Node, NodeKind};

const ENTITY_RADIUS: f32 = 7.0;
const MAX_ENTITY_RADIUS: f32 = 18.0;
const ISOLATED_RADIUS: f32 = 5.0;
const MIN_GROUP_RADIUS: f32 = 14.0;
const MAX_GROUP_RADIUS: f32 = 36.0;

/// Builds nodes, edges and legend for `people` under `config`. Pure: the same
/// inputs always produce an equal output.
pub fn build_graph(people: &[Person], config: &GraphConfig) -> GraphOutput {
    let config = config.sanitized();
    let (candidates, processing_errors) = validate_people(people);
    let population = select_population(candidates, config.max_nodes);
    let ranking = GroupRanking::compute(&population, config.dimension, config.top_n);

    let mut built = match config.mode {
        TopologyMode::Pairwise => build_pairwise(&population, &ranking, &config),
        TopologyMode::Bipartite => build_bipartite(&population, &ranking, &config),
    };

    let legend = aggregate_legend(config.mode, &ranking, &built.nodes);
    let total_entities = built.nodes.iter().filter(|node| !node.is_group()).count();
    let total_edges = built.edges.len();
    built.metadata.total_entities = total_entities;
    built.metadata.total_edges = total_edges;
    built.metadata.average_degree = total_edges as f32 / total_entities.max(1) as f32;
    built.metadata.processing_errors = processing_errors;

    info!(
        mode = ?config.mode,
        dimension = ?config.dimension,
        people = population.len(),
        nodes = built.nodes.len(),
        edges = total_edges,
        featured = ranking.featured().len(),
        "generated graph"
    );

    GraphOutput {
        dimension: config.dimension,
        mode: config.mode,
        nodes: built.nodes,
        edges: built.edges,
        connections: built.connections,
        legend,
        metadata: built.metadata,
    }
}

#[derive(Default)]
struct Built {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    connections: Vec<Connection>,
    metadata: GraphMetadata,
}

/// Drops people without an identity and repeated identities, keeping the
/// first occurrence. Indices refer to positions in `people`.
fn validate_people(people: &[Person]) -> (Vec<&Person>, Vec<ProcessingError>) {
    let mut identities = IdentityCheck::default();
    let mut valid = Vec::with_capacity(people.len());
    let mut errors = Vec::new();

    for (index, person) in people.iter().enumerate() {
        match identities.admit(index, &person.id) {
            Ok(()) => valid.push(person),
            Err(error) => errors.push(error),
        }
    }

    if !errors.is_empty() {
        debug!(skipped = errors.len(), "skipped invalid people");
    }
    (valid, errors)
}

/// Keeps at most `max_nodes` people, preferring the ones with the most
/// attributes overall.
fn select_population(mut candidates: Vec<&Person>, max_nodes: usize) -> Vec<&Person> {
    if candidates.len() > max_nodes {
        candidates.sort_by_key(|person| std::cmp::Reverse(person.connectivity_estimate()));
        candidates.truncate(max_nodes);
    }
    candidates
}

fn entity_node(person: &Person, ranking: &GroupRanking, keys: &[String]) -> Node {
    let dimension = ranking.dimension();
    let memberships = ranking.memberships(keys);
    let secondary_colors = if memberships.len() > 1 {
        memberships.iter().map(|group| group.color).collect()
    } else {
        Vec::new()
    };

    let (color, group_key, group_label, featured) = match memberships.first() {
        Some(best) => (
            best.color,
            Some(best.key.clone()),
            Some(best.label.clone()),
            true,
        ),
        None => {
            let fallback = dimension.fallback_group(person);
            let (key, label) = fallback.unzip();
            (OVERFLOW_COLOR, key, label, false)
        }
    };

    Node {
        id: Node::entity_id(person.id.trim()),
        label: person.display_name().to_owned(),
        kind: NodeKind::Entity {
            entity: person.clone(),
        },
        radius: ENTITY_RADIUS,
        color,
        secondary_colors,
        group_key,
        group_label,
        featured,
    }
}

fn build_pairwise(population: &[&Person], ranking: &GroupRanking, config: &GraphConfig) -> Built {
    let dimension = config.dimension;
    let mut built = Built::default();

    for person in population {
        let keys = dimension.attributes_for(person);
        built.nodes.push(entity_node(person, ranking, &keys));
    }

    let mut degree = vec![0usize; population.len()];
    for (i, a) in population.iter().enumerate() {
        for (j, b) in population.iter().enumerate().skip(i + 1) {
            let Some(similarity) = dimension.strength_of(a, b) else {
                continue;
            };
            if similarity.strength <= 0.0 || similarity.strength < config.threshold {
                continue;
            }

            let rest_length =
                config.physics.link_distance * (1.6 - similarity.strength).clamp(0.6, 1.6);
            built.edges.push(Edge::new(
                i,
                j,
                similarity.strength,
                dimension.link_color(),
                rest_length,
            ));
            built.connections.push(Connection {
                a: a.id.trim().to_owned(),
                b: b.id.trim().to_owned(),
                strength: similarity.strength,
                dimension,
                shared: similarity.shared,
            });
            degree[i] += 1;
            degree[j] += 1;
        }
    }

    for (node, degree) in built.nodes.iter_mut().zip(degree) {
        node.radius = (ENTITY_RADIUS + (degree as f32).sqrt() * 2.0).min(MAX_ENTITY_RADIUS);
    }

    built
}

fn group_node(group: &RankedGroup, min_count: usize, max_count: usize) -> Node {
    let scale = normalize_log(group.count, min_count, max_count);
    Node {
        id: Node::group_id(&group.key),
        label: group.label.clone(),
        kind: NodeKind::Group {
            key: group.key.clone(),
            members: group.count,
        },
        radius: MIN_GROUP_RADIUS + (MAX_GROUP_RADIUS - MIN_GROUP_RADIUS) * scale,
        color: group.color,
        secondary_colors: Vec::new(),
        group_key: Some(group.key.clone()),
        group_label: Some(group.label.clone()),
        featured: true,
    }
}

fn build_bipartite(population: &[&Person], ranking: &GroupRanking, config: &GraphConfig) -> Built {
    let dimension = config.dimension;
    let featured = ranking.featured();
    let min_count = featured.iter().map(|group| group.count).min().unwrap_or(1);
    let max_count = featured.iter().map(|group| group.count).max().unwrap_or(1);

    let mut built = Built::default();
    built
        .nodes
        .extend(featured.iter().map(|group| group_node(group, min_count, max_count)));

    let mut isolated = 0usize;
    for person in population {
        let keys = dimension.attributes_for(person);
        let memberships = ranking.memberships(&keys);

        if memberships.is_empty() {
            isolated += 1;
            if config.include_isolated {
                let mut node = entity_node(person, ranking, &keys);
                node.radius = ISOLATED_RADIUS;
                built.nodes.push(node);
            }
            continue;
        }

        let entity_index = built.nodes.len();
        for group in &memberships {
            let group_radius = built.nodes[group.rank].radius;
            built.edges.push(Edge::new(
                entity_index,
                group.rank,
                1.0,
                group.color,
                config.physics.link_distance + group_radius,
            ));
        }

        let mut node = entity_node(person, ranking, &keys);
        node.radius = (ENTITY_RADIUS + 1.5 * (memberships.len() - 1) as f32).min(MAX_ENTITY_RADIUS);
        built.nodes.push(node);
    }

    built.metadata.isolated_count = Some(isolated);
    built
}
