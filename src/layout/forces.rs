use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

const BARNES_HUT_THETA: f32 = 0.8;

#[derive(Clone, Copy)]
pub(super) struct ChargeParams {
    /// Already scaled by the current alpha.
    pub(super) strength: f32,
    pub(super) min_distance: f32,
    pub(super) max_distance: f32,
}

#[derive(Clone, Copy)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    pub(super) radius_multiplier: f32,
    pub(super) max_distance_sq: f32,
}

/// Deterministic unit vector for bodies that sit exactly on top of each other.
fn jiggle(from: usize, to: usize) -> Vec2 {
    let angle = ((from as f32) * 0.618_034 + (to as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

fn charge_between(delta: Vec2, mass: f32, params: ChargeParams, from: usize, to: usize) -> Vec2 {
    let distance = delta.length();
    if distance > params.max_distance {
        return Vec2::ZERO;
    }

    let direction = if distance > 1e-4 {
        delta / distance
    } else {
        jiggle(from, to)
    };
    direction * (params.strength * mass / distance.max(params.min_distance))
}

/// Adds the inverse-distance repulsion acting on body `index`, approximating
/// distant clusters by their center of mass.
pub(super) fn accumulate_charge(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    params: ChargeParams,
    force: &mut Vec2,
) {
    if node.mass <= 0.0 {
        return;
    }

    let point = positions[index];
    let max_distance_sq = params.max_distance * params.max_distance;
    if node.bounds.distance_sq_to_point(point) > max_distance_sq {
        return;
    }

    if node.is_leaf() {
        for &other in &node.indices {
            if other != index {
                *force += charge_between(point - positions[other], 1.0, params, index, other);
            }
        }
        return;
    }

    let delta = point - node.center_of_mass;
    let distance = delta.length().max(1e-4);
    let can_approximate = !node.bounds.contains(point)
        && node.bounds.side_length() / distance < BARNES_HUT_THETA
        && node.mass > 1.0;
    if can_approximate {
        *force += charge_between(delta, node.mass, params, index, usize::MAX);
        return;
    }

    for child in node.children() {
        accumulate_charge(child, index, positions, params, force);
    }
}

fn push_apart(
    from: usize,
    to: usize,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    let delta = positions[from] - positions[to];
    let distance = delta.length();
    let min_distance = (radii[from] + radii[to]) * params.radius_multiplier;
    if distance >= min_distance {
        return;
    }

    let direction = if distance > 1e-4 {
        delta / distance
    } else {
        jiggle(from, to)
    };
    let push = direction * ((min_distance - distance) * params.strength * 0.5);
    forces[from] += push;
    forces[to] -= push;
}

/// Separates every pair of bodies whose scaled radii overlap, visiting only
/// quadtree cells close enough to contain such a pair.
pub(super) fn accumulate_collisions(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    positions: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    forces: &mut [Vec2],
) {
    if node_a.bounds.distance_sq_to(node_b.bounds) > params.max_distance_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &from) in node_a.indices.iter().enumerate() {
                for &to in &node_a.indices[offset + 1..] {
                    push_apart(from, to, positions, radii, params, forces);
                }
            }
        } else {
            for &from in &node_a.indices {
                for &to in &node_b.indices {
                    push_apart(from, to, positions, radii, params, forces);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (offset, child_a) in children.iter().enumerate() {
            accumulate_collisions(child_a, child_a, true, positions, radii, params, forces);
            for child_b in &children[offset + 1..] {
                accumulate_collisions(child_a, child_b, false, positions, radii, params, forces);
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.bounds.half_extent >= node_b.bounds.half_extent
    };

    if split_a {
        for child in node_a.children() {
            accumulate_collisions(child, node_b, false, positions, radii, params, forces);
        }
    } else {
        for child in node_b.children() {
            accumulate_collisions(node_a, child, false, positions, radii, params, forces);
        }
    }
}
