//! Pointer gesture state kept apart from egui so it can be tested directly.
//!
//! World coordinates are the simulation's viewport coordinates; screen
//! coordinates are egui points. [`ViewTransform`] maps between the two.

use std::collections::HashMap;

use eframe::egui::{Pos2, Vec2};

use crate::graph::Node;

pub const MIN_ZOOM: f32 = 0.2;
pub const MAX_ZOOM: f32 = 5.0;
/// Total pointer travel, in screen points, after which a press counts as a drag.
pub const DRAG_THRESHOLD: f32 = 5.0;

/// Pan and uniform zoom applied to the whole scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub pan: Vec2,
    pub zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn world_to_screen(&self, origin: Pos2, world: Vec2) -> Pos2 {
        origin + self.pan + world * self.zoom
    }

    pub fn screen_to_world(&self, origin: Pos2, screen: Pos2) -> Vec2 {
        (screen - origin - self.pan) / self.zoom
    }

    /// Scales by `factor` while keeping the world point under `pointer` fixed.
    pub fn zoom_at(&mut self, origin: Pos2, pointer: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let anchor = self.screen_to_world(origin, pointer);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        self.pan = pointer - origin - anchor * self.zoom;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        if delta.is_finite() {
            self.pan += delta;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GestureOutcome {
    /// Released without travelling past [`DRAG_THRESHOLD`].
    Click { index: usize },
    DragEnd { index: usize },
}

#[derive(Clone, Copy, Debug)]
struct Grab {
    index: usize,
    pointer_start: Pos2,
    pointer_last: Pos2,
    travelled: f32,
    world_start: Vec2,
    dragging: bool,
}

/// Tracks a press on a node through to its release. The caller pins the node
/// on press, moves it on every [`GestureTracker::pointer_move`] and unpins it
/// on release.
#[derive(Debug, Default)]
pub struct GestureTracker {
    grab: Option<Grab>,
}

impl GestureTracker {
    pub fn pointer_down(&mut self, index: usize, pointer: Pos2, node_world: Vec2) {
        self.grab = Some(Grab {
            index,
            pointer_start: pointer,
            pointer_last: pointer,
            travelled: 0.0,
            world_start: node_world,
            dragging: false,
        });
    }

    /// Returns the grabbed node and the world position it should be held at.
    pub fn pointer_move(&mut self, pointer: Pos2, transform: &ViewTransform) -> Option<(usize, Vec2)> {
        let grab = self.grab.as_mut()?;
        grab.travelled += (pointer - grab.pointer_last).length();
        grab.pointer_last = pointer;
        if grab.travelled > DRAG_THRESHOLD {
            grab.dragging = true;
        }
        let offset = pointer - grab.pointer_start;
        Some((grab.index, grab.world_start + offset / transform.zoom))
    }

    pub fn pointer_up(&mut self) -> Option<GestureOutcome> {
        let grab = self.grab.take()?;
        Some(if grab.dragging {
            GestureOutcome::DragEnd { index: grab.index }
        } else {
            GestureOutcome::Click { index: grab.index }
        })
    }

    pub fn active(&self) -> Option<usize> {
        self.grab.map(|grab| grab.index)
    }

    pub fn is_dragging(&self) -> bool {
        self.grab.is_some_and(|grab| grab.dragging)
    }

    pub fn cancel(&mut self) -> Option<usize> {
        self.grab.take().map(|grab| grab.index)
    }
}

pub type ClickHandler = Box<dyn Fn(&Node)>;

/// Click handlers keyed by node id. Nodes carry no behavior of their own.
#[derive(Default)]
pub struct ClickDispatcher {
    handlers: HashMap<String, ClickHandler>,
}

impl ClickDispatcher {
    pub fn register(&mut self, node_id: impl Into<String>, handler: ClickHandler) {
        self.handlers.insert(node_id.into(), handler);
    }

    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    /// Invokes the handler registered for `node`, if any.
    pub fn dispatch(&self, node: &Node) -> bool {
        match self.handlers.get(&node.id) {
            Some(handler) => {
                handler(node);
                true
            }
            None => false,
        }
    }
}
