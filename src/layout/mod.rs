//! Force-directed layout over a generated graph.
//!
//! The simulation is driven by calling [`Simulation::step`] from whatever
//! scheduler the caller has: the UI calls it once per frame, the headless
//! summary and tests call it in a loop. Positions live in viewport
//! coordinates, `[0, width] x [0, height]`.

mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::graph::{Edge, Node, PhysicsParams};
use forces::{ChargeParams, CollisionParams, accumulate_charge, accumulate_collisions};
use quadtree::QuadNode;

/// Motion stops once alpha decays below this.
pub const ALPHA_MIN: f32 = 0.001;
/// Alpha is held around this while a body is being dragged.
const DRAG_ALPHA_TARGET: f32 = 0.3;
const COLLISION_STRENGTH: f32 = 0.7;
const SPRING_DAMPING: f32 = 0.1;
const MAX_SPEED: f32 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationState {
    /// Built but never started.
    Idle,
    Running,
    /// Alpha decayed below [`ALPHA_MIN`].
    Settled,
    /// Halted from outside.
    Stopped,
}

impl SimulationState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Settled => "settled",
            Self::Stopped => "stopped",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Body {
    pub id: String,
    pub position: Vec2,
    pub velocity: Vec2,
    pub radius: f32,
    pub pinned: bool,
}

#[derive(Clone, Copy, Debug)]
struct Spring {
    from: usize,
    to: usize,
    rest_length: f32,
    weight: f32,
}

#[derive(Default)]
struct Scratch {
    forces: Vec<Vec2>,
    positions: Vec<Vec2>,
    radii: Vec<f32>,
}

pub struct Simulation {
    bodies: Vec<Body>,
    springs: Vec<Spring>,
    params: PhysicsParams,
    viewport: Vec2,
    alpha: f32,
    alpha_target: f32,
    state: SimulationState,
    scratch: Scratch,
}

impl Simulation {
    /// Bodies found in `seed` start at their recorded position; everyone else
    /// is placed on a grid covering the viewport.
    pub fn new(
        nodes: &[Node],
        edges: &[Edge],
        params: PhysicsParams,
        viewport: Vec2,
        seed: Option<&HashMap<String, Vec2>>,
    ) -> Self {
        let viewport = sanitize_viewport(viewport);
        let grid = grid_positions(nodes.len(), viewport);

        let mut bodies = nodes
            .iter()
            .zip(grid)
            .map(|(node, slot)| Body {
                id: node.id.clone(),
                position: seed
                    .and_then(|seed| seed.get(&node.id))
                    .copied()
                    .filter(|position| position.is_finite())
                    .unwrap_or(slot),
                velocity: Vec2::ZERO,
                radius: node.radius.max(0.0),
                pinned: false,
            })
            .collect::<Vec<_>>();
        for body in &mut bodies {
            body.position = clamp_into(body.position, body.radius, viewport);
        }

        let springs = edges
            .iter()
            .filter(|edge| {
                edge.source != edge.target
                    && edge.source < bodies.len()
                    && edge.target < bodies.len()
            })
            .map(|edge| Spring {
                from: edge.source,
                to: edge.target,
                rest_length: edge.rest_length.max(0.0),
                weight: edge.weight,
            })
            .collect();

        Self {
            bodies,
            springs,
            params: params.sanitized(),
            viewport,
            alpha: 1.0,
            alpha_target: 0.0,
            state: SimulationState::Idle,
            scratch: Scratch::default(),
        }
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Snapshot of every body's position, used to seed the next simulation.
    pub fn positions(&self) -> HashMap<String, Vec2> {
        self.bodies
            .iter()
            .map(|body| (body.id.clone(), body.position))
            .collect()
    }

    pub fn start(&mut self) {
        if matches!(self.state, SimulationState::Idle | SimulationState::Stopped) {
            self.state = SimulationState::Running;
        } else if self.state == SimulationState::Settled {
            self.reheat();
        }
    }

    /// Restores full energy and resumes ticking.
    pub fn reheat(&mut self) {
        self.alpha = 1.0;
        self.state = SimulationState::Running;
    }

    pub fn stop(&mut self) {
        self.state = SimulationState::Stopped;
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        let viewport = sanitize_viewport(viewport);
        if viewport == self.viewport {
            return;
        }
        self.viewport = viewport;
        for body in &mut self.bodies {
            body.position = clamp_into(body.position, body.radius, viewport);
        }
        if self.state == SimulationState::Settled {
            self.alpha = self.alpha.max(DRAG_ALPHA_TARGET);
            self.state = SimulationState::Running;
        }
    }

    /// Takes body `index` out of force control and holds it at `position`.
    pub fn pin(&mut self, index: usize, position: Vec2) {
        let viewport = self.viewport;
        let Some(body) = self.bodies.get_mut(index) else {
            return;
        };
        body.pinned = true;
        body.velocity = Vec2::ZERO;
        if position.is_finite() {
            body.position = clamp_into(position, body.radius, viewport);
        }

        self.alpha_target = DRAG_ALPHA_TARGET;
        if self.state == SimulationState::Settled {
            self.alpha = self.alpha.max(DRAG_ALPHA_TARGET);
            self.state = SimulationState::Running;
        }
    }

    pub fn unpin(&mut self, index: usize) {
        if let Some(body) = self.bodies.get_mut(index) {
            body.pinned = false;
        }
        if self.bodies.iter().all(|body| !body.pinned) {
            self.alpha_target = 0.0;
        }
    }

    /// Advances the layout by one tick. `dt` is the frame time in seconds and
    /// only scales integration; the tick itself is the unit of cooling.
    /// Returns whether the simulation is still running afterwards.
    pub fn step(&mut self, dt: f32) -> bool {
        if self.state != SimulationState::Running {
            return false;
        }

        let time_scale = if dt.is_finite() {
            (dt * 60.0).clamp(0.25, 3.0)
        } else {
            1.0
        };
        let params = self.params;
        self.alpha += (self.alpha_target - self.alpha) * params.alpha_decay;

        self.accumulate_forces(params);
        self.integrate(params, time_scale);

        if self.alpha < ALPHA_MIN && self.alpha_target < ALPHA_MIN {
            self.state = SimulationState::Settled;
            debug!(bodies = self.bodies.len(), "layout settled");
            return false;
        }
        true
    }

    fn accumulate_forces(&mut self, params: PhysicsParams) {
        let count = self.bodies.len();
        let alpha = self.alpha;
        let scratch = &mut self.scratch;
        scratch.forces.clear();
        scratch.forces.resize(count, Vec2::ZERO);
        scratch.positions.clear();
        scratch.radii.clear();
        let mut max_radius = 0.0_f32;
        for body in &self.bodies {
            scratch.positions.push(body.position);
            scratch.radii.push(body.radius);
            max_radius = max_radius.max(body.radius);
        }

        let forces = &mut scratch.forces;
        let positions = &scratch.positions;
        let radii = &scratch.radii;

        if count > 1
            && let Some(tree) = QuadNode::build(positions)
        {
            let charge = ChargeParams {
                strength: params.repulsion * alpha,
                min_distance: params.charge_min_distance,
                max_distance: params.charge_max_distance,
            };
            for (index, force) in forces.iter_mut().enumerate() {
                accumulate_charge(&tree, index, positions, charge, force);
            }

            let reach = max_radius * 2.0 * params.collision_radius_multiplier;
            if reach > 0.0 {
                accumulate_collisions(
                    &tree,
                    &tree,
                    true,
                    positions,
                    radii,
                    CollisionParams {
                        strength: COLLISION_STRENGTH,
                        radius_multiplier: params.collision_radius_multiplier,
                        max_distance_sq: reach * reach,
                    },
                    forces,
                );
            }
        }

        for spring in &self.springs {
            let delta = positions[spring.to] - positions[spring.from];
            let distance = delta.length();
            if distance <= 1e-4 {
                continue;
            }
            let direction = delta / distance;

            let stretch = (distance - spring.rest_length)
                * params.link_strength
                * spring.weight.max(0.1)
                * alpha;
            let relative_velocity =
                self.bodies[spring.to].velocity - self.bodies[spring.from].velocity;
            let damping = relative_velocity.dot(direction) * SPRING_DAMPING * alpha;
            let correction = direction * ((stretch + damping) * 0.5);

            forces[spring.from] += correction;
            forces[spring.to] -= correction;
        }

        let center = self.viewport * 0.5;
        for (force, position) in forces.iter_mut().zip(positions) {
            *force += (center - *position) * (params.centering_strength * alpha);
        }
    }

    fn integrate(&mut self, params: PhysicsParams, time_scale: f32) {
        let retain = 1.0 - params.velocity_decay;
        let viewport = self.viewport;

        for (body, force) in self.bodies.iter_mut().zip(&self.scratch.forces) {
            if body.pinned {
                body.velocity = Vec2::ZERO;
                continue;
            }

            let mut velocity = (body.velocity + *force) * retain;
            if !velocity.is_finite() {
                velocity = Vec2::ZERO;
            }
            let speed = velocity.length();
            if speed > MAX_SPEED {
                velocity *= MAX_SPEED / speed;
            }

            body.velocity = velocity;
            body.position = clamp_into(body.position + velocity * time_scale, body.radius, viewport);
        }
    }
}

fn sanitize_viewport(viewport: Vec2) -> Vec2 {
    let fix = |value: f32| if value.is_finite() { value.max(1.0) } else { 1.0 };
    vec2(fix(viewport.x), fix(viewport.y))
}

/// Places `count` points on a grid with `ceil(sqrt(count))` columns, each
/// point in the middle of its cell.
pub fn grid_positions(count: usize, viewport: Vec2) -> Vec<Vec2> {
    if count == 0 {
        return Vec::new();
    }

    let columns = (count as f32).sqrt().ceil().max(1.0) as usize;
    let rows = count.div_ceil(columns);
    let cell = vec2(viewport.x / columns as f32, viewport.y / rows as f32);

    (0..count)
        .map(|index| {
            let column = (index % columns) as f32;
            let row = (index / columns) as f32;
            vec2((column + 0.5) * cell.x, (row + 0.5) * cell.y)
        })
        .collect()
}

/// Keeps a body of `radius` fully inside the viewport. Non-finite positions
/// are sent back to the center.
pub fn clamp_into(position: Vec2, radius: f32, viewport: Vec2) -> Vec2 {
    let clamp_axis = |value: f32, extent: f32| {
        if !value.is_finite() {
            return extent * 0.5;
        }
        if extent < radius * 2.0 {
            extent * 0.5
        } else {
            value.clamp(radius, extent - radius)
        }
    };
    vec2(
        clamp_axis(position.x, viewport.x),
        clamp_axis(position.y, viewport.y),
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::graph::{GraphConfig, TopologyMode, build_graph};
    use crate::people::Person;

    const VIEWPORT: Vec2 = vec2(800.0, 600.0);

    fn sample_graph(mode: TopologyMode) -> crate::graph::GraphOutput {
        let people = (0..40)
            .map(|index| {
                serde_json::from_value::<Person>(json!({
                    "id": format!("p{index}"),
                    "skills": [format!("s{}", index % 6), format!("t{}", index % 4)]
                }))
                .unwrap()
            })
            .collect::<Vec<_>>();
        build_graph(
            &people,
            &GraphConfig {
                mode,
                dimension: crate::graph::Dimension::Skills,
                ..GraphConfig::default()
            },
        )
    }

    fn run(simulation: &mut Simulation, steps: usize) {
        for _ in 0..steps {
            simulation.step(1.0 / 60.0);
        }
    }

    fn assert_in_bounds(simulation: &Simulation) {
        let viewport = simulation.viewport();
        for body in simulation.bodies() {
            let position = body.position;
            assert!(position.is_finite(), "{} is not finite", body.id);
            assert!(position.x >= body.radius - 1e-3 && position.x <= viewport.x - body.radius + 1e-3);
            assert!(position.y >= body.radius - 1e-3 && position.y <= viewport.y - body.radius + 1e-3);
        }
    }

    #[test]
    fn grid_uses_ceil_sqrt_columns() {
        let positions = grid_positions(5, vec2(300.0, 200.0));
        assert_eq!(positions.len(), 5);
        assert_eq!(positions[0], vec2(50.0, 50.0));
        assert_eq!(positions[2], vec2(250.0, 50.0));
        assert_eq!(positions[3], vec2(50.0, 150.0));
    }

    #[test]
    fn new_simulation_is_idle_until_started() {
        let graph = sample_graph(TopologyMode::Bipartite);
        let mut simulation =
            Simulation::new(&graph.nodes, &graph.edges, PhysicsParams::default(), VIEWPORT, None);

        assert_eq!(simulation.state(), SimulationState::Idle);
        let before = simulation.positions();
        assert!(!simulation.step(1.0 / 60.0));
        assert_eq!(simulation.positions(), before);

        simulation.start();
        assert!(simulation.step(1.0 / 60.0));
    }

    #[test]
    fn simulation_settles_inside_viewport() {
        for mode in [TopologyMode::Bipartite, TopologyMode::Pairwise] {
            let graph = sample_graph(mode);
            let mut simulation =
                Simulation::new(&graph.nodes, &graph.edges, PhysicsParams::default(), VIEWPORT, None);
            simulation.start();
            run(&mut simulation, 2_000);

            assert_eq!(simulation.state(), SimulationState::Settled);
            assert!(simulation.alpha() < ALPHA_MIN);
            assert_in_bounds(&simulation);
        }
    }

    #[test]
    fn extreme_parameters_stay_in_bounds() {
        let graph = sample_graph(TopologyMode::Pairwise);
        let extremes = [
            PhysicsParams {
                repulsion: PhysicsParams::REPULSION_RANGE.1,
                link_strength: PhysicsParams::LINK_STRENGTH_RANGE.1,
                link_distance: PhysicsParams::LINK_DISTANCE_RANGE.1,
                collision_radius_multiplier: PhysicsParams::COLLISION_RANGE.1,
                velocity_decay: PhysicsParams::VELOCITY_DECAY_RANGE.0,
                alpha_decay: PhysicsParams::ALPHA_DECAY_RANGE.0,
                centering_strength: PhysicsParams::CENTERING_RANGE.1,
                charge_min_distance: PhysicsParams::CHARGE_MIN_DISTANCE_RANGE.0,
                charge_max_distance: PhysicsParams::CHARGE_MAX_DISTANCE_RANGE.1,
            },
            PhysicsParams {
                repulsion: f32::INFINITY,
                velocity_decay: f32::NAN,
                ..PhysicsParams::default()
            },
        ];

        for params in extremes {
            let mut simulation =
                Simulation::new(&graph.nodes, &graph.edges, params, vec2(120.0, 90.0), None);
            simulation.start();
            run(&mut simulation, 300);
            assert_in_bounds(&simulation);
        }
    }

    #[test]
    fn seeded_positions_are_reused() {
        let graph = sample_graph(TopologyMode::Bipartite);
        let mut first =
            Simulation::new(&graph.nodes, &graph.edges, PhysicsParams::default(), VIEWPORT, None);
        first.start();
        run(&mut first, 50);
        let snapshot = first.positions();

        let restarted = Simulation::new(
            &graph.nodes,
            &graph.edges,
            PhysicsParams {
                repulsion: 500.0,
                ..PhysicsParams::default()
            },
            VIEWPORT,
            Some(&snapshot),
        );
        assert_eq!(restarted.positions(), snapshot);
        assert_eq!(restarted.state(), SimulationState::Idle);
    }

    #[test]
    fn pinned_bodies_do_not_move() {
        let graph = sample_graph(TopologyMode::Bipartite);
        let mut simulation =
            Simulation::new(&graph.nodes, &graph.edges, PhysicsParams::default(), VIEWPORT, None);
        simulation.start();
        simulation.pin(0, vec2(5_000.0, 100.0));

        let radius = simulation.bodies()[0].radius;
        let pinned_at = simulation.bodies()[0].position;
        assert_eq!(pinned_at, vec2(VIEWPORT.x - radius, 100.0));

        run(&mut simulation, 100);
        assert_eq!(simulation.bodies()[0].position, pinned_at);
        assert_eq!(simulation.state(), SimulationState::Running);

        simulation.unpin(0);
        run(&mut simulation, 3_000);
        assert_eq!(simulation.state(), SimulationState::Settled);
    }

    #[test]
    fn stopped_simulation_ignores_steps() {
        let graph = sample_graph(TopologyMode::Bipartite);
        let mut simulation =
            Simulation::new(&graph.nodes, &graph.edges, PhysicsParams::default(), VIEWPORT, None);
        simulation.start();
        run(&mut simulation, 5);
        simulation.stop();

        let frozen = simulation.positions();
        run(&mut simulation, 20);
        assert_eq!(simulation.positions(), frozen);
        assert_eq!(simulation.state(), SimulationState::Stopped);
    }

    #[test]
    fn shrinking_viewport_clamps_bodies() {
        let graph = sample_graph(TopologyMode::Bipartite);
        let mut simulation =
            Simulation::new(&graph.nodes, &graph.edges, PhysicsParams::default(), VIEWPORT, None);
        simulation.set_viewport(vec2(200.0, 150.0));
        assert_in_bounds(&simulation);
    }

    #[test]
    fn clamp_recovers_non_finite_positions() {
        let viewport = vec2(100.0, 80.0);
        assert_eq!(clamp_into(vec2(f32::NAN, 5.0), 10.0, viewport), vec2(50.0, 10.0));
        assert_eq!(clamp_into(vec2(300.0, f32::INFINITY), 10.0, viewport), vec2(90.0, 40.0));
        assert_eq!(clamp_into(vec2(3.0, 3.0), 60.0, viewport), vec2(50.0, 40.0));
    }
}
