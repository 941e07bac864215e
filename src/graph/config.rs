use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::dimension::Dimension;
use super::ranking::PALETTE;

pub const THRESHOLD_RANGE: (f32, f32) = (0.0, 1.0);
pub const MAX_NODES_RANGE: (usize, usize) = (10, 100);
pub const TOP_N_RANGE: (usize, usize) = (6, 20);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TopologyMode {
    /// Entity-to-entity similarity edges.
    Pairwise,
    /// Entity-to-group membership edges.
    #[default]
    Bipartite,
}

impl TopologyMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pairwise => "Pairwise similarity",
            Self::Bipartite => "People → groups",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    pub repulsion: f32,
    pub link_strength: f32,
    pub link_distance: f32,
    pub collision_radius_multiplier: f32,
    pub velocity_decay: f32,
    pub alpha_decay: f32,
    pub centering_strength: f32,
    /// Repulsion is evaluated as if nodes were never closer than this.
    pub charge_min_distance: f32,
    /// Pairs further apart than this do not repel.
    pub charge_max_distance: f32,
}

impl PhysicsParams {
    pub const REPULSION_RANGE: (f32, f32) = (10.0, 1000.0);
    pub const LINK_STRENGTH_RANGE: (f32, f32) = (0.01, 1.0);
    pub const LINK_DISTANCE_RANGE: (f32, f32) = (20.0, 300.0);
    pub const COLLISION_RANGE: (f32, f32) = (0.5, 3.0);
    pub const VELOCITY_DECAY_RANGE: (f32, f32) = (0.05, 0.9);
    pub const ALPHA_DECAY_RANGE: (f32, f32) = (0.001, 0.1);
    pub const CENTERING_RANGE: (f32, f32) = (0.0, 0.2);
    pub const CHARGE_MIN_DISTANCE_RANGE: (f32, f32) = (0.5, 50.0);
    pub const CHARGE_MAX_DISTANCE_RANGE: (f32, f32) = (50.0, 5000.0);

    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        let charge_min_distance = clamp_f32(
            self.charge_min_distance,
            Self::CHARGE_MIN_DISTANCE_RANGE,
            defaults.charge_min_distance,
        );
        let charge_max_distance = clamp_f32(
            self.charge_max_distance,
            Self::CHARGE_MAX_DISTANCE_RANGE,
            defaults.charge_max_distance,
        )
        .max(charge_min_distance);

        Self {
            repulsion: clamp_f32(self.repulsion, Self::REPULSION_RANGE, defaults.repulsion),
            link_strength: clamp_f32(
                self.link_strength,
                Self::LINK_STRENGTH_RANGE,
                defaults.link_strength,
            ),
            link_distance: clamp_f32(
                self.link_distance,
                Self::LINK_DISTANCE_RANGE,
                defaults.link_distance,
            ),
            collision_radius_multiplier: clamp_f32(
                self.collision_radius_multiplier,
                Self::COLLISION_RANGE,
                defaults.collision_radius_multiplier,
            ),
            velocity_decay: clamp_f32(
                self.velocity_decay,
                Self::VELOCITY_DECAY_RANGE,
                defaults.velocity_decay,
            ),
            alpha_decay: clamp_f32(self.alpha_decay, Self::ALPHA_DECAY_RANGE, defaults.alpha_decay),
            centering_strength: clamp_f32(
                self.centering_strength,
                Self::CENTERING_RANGE,
                defaults.centering_strength,
            ),
            charge_min_distance,
            charge_max_distance,
        }
    }
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            repulsion: 260.0,
            link_strength: 0.35,
            link_distance: 90.0,
            collision_radius_multiplier: 1.4,
            velocity_decay: 0.4,
            alpha_decay: 0.0228,
            centering_strength: 0.04,
            charge_min_distance: 4.0,
            charge_max_distance: 900.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub dimension: Dimension,
    pub mode: TopologyMode,
    /// Minimum similarity for a pairwise connection.
    pub threshold: f32,
    pub max_nodes: usize,
    pub top_n: usize,
    pub include_isolated: bool,
    pub physics: PhysicsParams,
}

impl GraphConfig {
    /// Clamps every option into its documented range. `top_n` is additionally
    /// capped at the palette size so every featured group gets its own color.
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            dimension: self.dimension,
            mode: self.mode,
            threshold: clamp_f32(self.threshold, THRESHOLD_RANGE, defaults.threshold),
            max_nodes: self.max_nodes.clamp(MAX_NODES_RANGE.0, MAX_NODES_RANGE.1),
            top_n: self
                .top_n
                .clamp(TOP_N_RANGE.0, TOP_N_RANGE.1)
                .min(PALETTE.len()),
            include_isolated: self.include_isolated,
            physics: self.physics.sanitized(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            dimension: Dimension::Education,
            mode: TopologyMode::Bipartite,
            threshold: 0.1,
            max_nodes: 60,
            top_n: 8,
            include_isolated: false,
            physics: PhysicsParams::default(),
        }
    }
}

fn clamp_f32(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_options_are_clamped() {
        let config = GraphConfig {
            threshold: 3.5,
            max_nodes: 5_000,
            top_n: 1,
            ..GraphConfig::default()
        }
        .sanitized();

        assert_eq!(config.threshold, 1.0);
        assert_eq!(config.max_nodes, MAX_NODES_RANGE.1);
        assert_eq!(config.top_n, TOP_N_RANGE.0);
    }

    #[test]
    fn top_n_is_capped_at_palette_size() {
        let config = GraphConfig {
            top_n: 20,
            ..GraphConfig::default()
        }
        .sanitized();
        assert_eq!(config.top_n, PALETTE.len());
    }

    #[test]
    fn nan_physics_values_fall_back_to_defaults() {
        let physics = PhysicsParams {
            repulsion: f32::NAN,
            velocity_decay: -4.0,
            charge_min_distance: 40.0,
            charge_max_distance: 10.0,
            ..PhysicsParams::default()
        }
        .sanitized();

        assert_eq!(physics.repulsion, PhysicsParams::default().repulsion);
        assert_eq!(physics.velocity_decay, PhysicsParams::VELOCITY_DECAY_RANGE.0);
        assert!(physics.charge_max_distance >= physics.charge_min_distance);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: GraphConfig =
            serde_json::from_str(r#"{ "dimension": "skills", "mode": "pairwise" }"#).unwrap();
        assert_eq!(config.dimension, Dimension::Skills);
        assert_eq!(config.mode, TopologyMode::Pairwise);
        assert_eq!(config.max_nodes, GraphConfig::default().max_nodes);
    }
}
