mod forces;
mod quadtree;

use std::collections::HashMap;

use eframe::egui::{Vec2, vec2};

use crate::config::ForceParams;
use crate::error::{InvariantViolation, report_violation};
use crate::graph::{CanonicalGraph, VisibleSubgraph};
use crate::render::node_radius;
use crate::util::stable_pair;

use forces::{
    CollisionParams, SimLink, accumulate_charge, accumulate_collision_pairs, apply_centering,
    apply_links,
};
use quadtree::QuadNode;

pub const ALPHA_MIN: f32 = 0.001;
pub const REHEAT_ALPHA: f32 = 0.3;
const VELOCITY_DECAY: f32 = 0.4;
const COLLISION_STRENGTH: f32 = 1.0;
const BARNES_HUT_THETA: f32 = 0.9;
const SEED_SPACING: f32 = 10.0;
const SEED_JITTER: f32 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationPhase {
    Idle,
    Running,
    Dragging,
    Cooling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReseedOutcome {
    Started { nodes: usize, links: usize },
    NothingToSimulate,
    Disposed,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    pub generation: u64,
    pub phase: SimulationPhase,
    pub moved: bool,
}

#[derive(Default)]
struct Scratch {
    predicted: Vec<Vec2>,
    charge: Vec<Vec2>,
}

pub struct Simulation {
    params: ForceParams,
    ids: Vec<String>,
    index_by_id: HashMap<String, usize>,
    degrees: Vec<usize>,
    radii: Vec<f32>,
    positions: Vec<Vec2>,
    velocities: Vec<Vec2>,
    pins: Vec<Option<Vec2>>,
    links: Vec<SimLink>,
    alpha: f32,
    alpha_target: f32,
    alpha_decay: f32,
    dragged: Option<usize>,
    generation: u64,
    disposed: bool,
    scratch: Scratch,
}

impl Simulation {
    pub fn new(params: ForceParams) -> Self {
        Self {
            params,
            ids: Vec::new(),
            index_by_id: HashMap::new(),
            degrees: Vec::new(),
            radii: Vec::new(),
            positions: Vec::new(),
            velocities: Vec::new(),
            pins: Vec::new(),
            links: Vec::new(),
            alpha: 0.0,
            alpha_target: 0.0,
            alpha_decay: 1.0 - ALPHA_MIN.powf(1.0 / 300.0),
            dragged: None,
            generation: 0,
            disposed: false,
            scratch: Scratch::default(),
        }
    }

    pub fn phase(&self) -> SimulationPhase {
        if self.disposed || self.positions.is_empty() {
            SimulationPhase::Idle
        } else if self.dragged.is_some() {
            SimulationPhase::Dragging
        } else if self.alpha < ALPHA_MIN {
            SimulationPhase::Idle
        } else if self.alpha < REHEAT_ALPHA {
            SimulationPhase::Cooling
        } else {
            SimulationPhase::Running
        }
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn params(&self) -> ForceParams {
        self.params
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.positions.len()
    }

    /// Positions in the node order of the subgraph passed to the last reseed.
    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn position_of(&self, id: &str) -> Option<Vec2> {
        self.index_by_id.get(id).map(|&index| self.positions[index])
    }

    pub fn radius_of(&self, id: &str) -> Option<f32> {
        self.index_by_id.get(id).map(|&index| self.radii[index])
    }

    pub fn is_pinned(&self, id: &str) -> bool {
        self.index_by_id
            .get(id)
            .is_some_and(|&index| self.pins[index].is_some())
    }

    pub fn dragged_id(&self) -> Option<&str> {
        self.dragged.map(|index| self.ids[index].as_str())
    }

    pub fn reseed(&mut self, graph: &CanonicalGraph, visible: &VisibleSubgraph) -> ReseedOutcome {
        if self.disposed {
            tracing::debug!("ignoring reseed on a disposed simulation");
            return ReseedOutcome::Disposed;
        }

        self.generation = self.generation.wrapping_add(1);
        self.ids.clear();
        self.index_by_id.clear();
        self.degrees.clear();
        self.radii.clear();
        self.positions.clear();
        self.velocities.clear();
        self.pins.clear();
        self.links.clear();
        self.dragged = None;
        self.alpha_target = 0.0;

        if visible.is_empty() {
            self.alpha = 0.0;
            tracing::debug!(generation = self.generation, "nothing to simulate");
            return ReseedOutcome::NothingToSimulate;
        }

        let count = visible.node_count();
        for (local, (&canonical, &degree)) in visible
            .node_indices()
            .iter()
            .zip(visible.degrees())
            .enumerate()
        {
            let id = graph.nodes()[canonical].id.clone();
            self.positions.push(seed_position(local, &id));
            self.index_by_id.insert(id.clone(), local);
            self.ids.push(id);
            self.degrees.push(degree);
            self.radii.push(node_radius(degree, self.params.node_size_floor));
        }
        self.velocities.resize(count, Vec2::ZERO);
        self.pins.resize(count, None);

        let mut link_counts = vec![0usize; count];
        let mut accepted = Vec::with_capacity(visible.edge_count());
        for (&(source, target), &edge_index) in visible.links().iter().zip(visible.edge_indices()) {
            let edge = &graph.edges()[edge_index];
            if source >= count || target >= count {
                report_violation(&InvariantViolation::DanglingEdge {
                    edge_id: edge.id.clone(),
                    node_id: if source >= count {
                        edge.source.clone()
                    } else {
                        edge.target.clone()
                    },
                });
                continue;
            }
            link_counts[source] += 1;
            link_counts[target] += 1;
            accepted.push((source, target, edge.weight));
        }
        self.links = accepted
            .into_iter()
            .map(|(source, target, weight)| SimLink {
                source,
                target,
                weight,
                bias: link_counts[source] as f32
                    / (link_counts[source] + link_counts[target]) as f32,
            })
            .collect();

        self.alpha = 1.0;
        tracing::info!(
            generation = self.generation,
            nodes = count,
            links = self.links.len(),
            "reseeded simulation"
        );
        ReseedOutcome::Started {
            nodes: count,
            links: self.links.len(),
        }
    }

    pub fn reconfigure(&mut self, params: ForceParams) {
        if self.disposed {
            return;
        }
        self.params = params;
        for (radius, &degree) in self.radii.iter_mut().zip(&self.degrees) {
            *radius = node_radius(degree, params.node_size_floor);
        }
        self.alpha = 1.0;
        tracing::debug!(?params, "reconfigured simulation");
    }

    pub fn start_drag(&mut self, id: &str, pointer: Vec2) -> bool {
        if self.disposed || !pointer.is_finite() {
            return false;
        }
        let Some(&index) = self.index_by_id.get(id) else {
            tracing::debug!(id, "drag requested for a node outside the simulation");
            return false;
        };

        if let Some(previous) = self.dragged.replace(index) {
            self.pins[previous] = None;
        }
        self.pins[index] = Some(pointer);
        self.positions[index] = pointer;
        self.velocities[index] = Vec2::ZERO;
        self.alpha_target = REHEAT_ALPHA;
        self.alpha = self.alpha.max(REHEAT_ALPHA);
        tracing::debug!(id, "drag started");
        true
    }

    pub fn update_drag(&mut self, pointer: Vec2) {
        if self.disposed || !pointer.is_finite() {
            return;
        }
        if let Some(index) = self.dragged {
            self.pins[index] = Some(pointer);
        }
    }

    /// Releases the dragged node. Energy is left where it is and allowed to decay.
    pub fn end_drag(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        let Some(index) = self.dragged.take() else {
            return false;
        };
        self.pins[index] = None;
        self.alpha_target = 0.0;
        tracing::debug!(id = %self.ids[index], "drag ended");
        true
    }

    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.alpha = 0.0;
        self.alpha_target = 0.0;
        self.dragged = None;
        self.ids = Vec::new();
        self.index_by_id = HashMap::new();
        self.degrees = Vec::new();
        self.radii = Vec::new();
        self.positions = Vec::new();
        self.velocities = Vec::new();
        self.pins = Vec::new();
        self.links = Vec::new();
        self.scratch = Scratch::default();
        tracing::debug!(generation = self.generation, "simulation disposed");
    }

    /// A node whose state is non-finite goes back to its seed before any force
    /// reads it, so the anomaly stays on that node.
    pub fn tick(&mut self) -> TickReport {
        let phase = self.phase();
        if phase == SimulationPhase::Idle {
            return TickReport {
                generation: self.generation,
                phase,
                moved: false,
            };
        }

        for index in 0..self.positions.len() {
            if !self.positions[index].is_finite() || !self.velocities[index].is_finite() {
                self.reset_to_seed(index);
            }
        }

        self.alpha += (self.alpha_target - self.alpha) * self.alpha_decay;
        let alpha = self.alpha;
        let params = self.params;

        apply_links(
            &self.links,
            &self.positions,
            &mut self.velocities,
            params.link_distance,
            params.link_strength,
            alpha,
        );

        let tree = (params.charge_strength != 0.0)
            .then(|| QuadNode::build(&self.positions))
            .flatten();
        if let Some(tree) = tree {
            let charge = &mut self.scratch.charge;
            charge.clear();
            charge.resize(self.positions.len(), Vec2::ZERO);
            for (index, velocity) in charge.iter_mut().enumerate() {
                accumulate_charge(
                    &tree,
                    index,
                    &self.positions,
                    params.charge_strength,
                    alpha,
                    BARNES_HUT_THETA,
                    velocity,
                );
            }
            for (velocity, delta) in self.velocities.iter_mut().zip(charge.iter()) {
                *velocity += *delta;
            }
        }

        apply_centering(&mut self.positions, params.center_strength);

        let predicted = &mut self.scratch.predicted;
        predicted.clear();
        predicted.extend(
            self.positions
                .iter()
                .zip(&self.velocities)
                .map(|(position, velocity)| *position + *velocity),
        );
        if let Some(tree) = QuadNode::build(predicted) {
            let collision_radii = self
                .radii
                .iter()
                .map(|radius| radius + params.collision_margin)
                .collect::<Vec<_>>();
            let widest = collision_radii.iter().copied().fold(0.0_f32, f32::max);
            accumulate_collision_pairs(
                &tree,
                &tree,
                true,
                predicted,
                &collision_radii,
                CollisionParams {
                    strength: COLLISION_STRENGTH,
                    reach_sq: (widest * 2.0) * (widest * 2.0),
                },
                &mut self.velocities,
            );
        }

        let mut moved = false;
        for index in 0..self.positions.len() {
            if let Some(pin) = self.pins[index] {
                self.positions[index] = pin;
                self.velocities[index] = Vec2::ZERO;
                continue;
            }

            self.velocities[index] *= 1.0 - VELOCITY_DECAY;
            self.positions[index] += self.velocities[index];

            if !self.positions[index].is_finite() || !self.velocities[index].is_finite() {
                self.reset_to_seed(index);
                continue;
            }
            moved |= self.velocities[index].length_sq() > 1e-6;
        }

        TickReport {
            generation: self.generation,
            phase: self.phase(),
            moved,
        }
    }

    fn reset_to_seed(&mut self, index: usize) {
        tracing::warn!(id = %self.ids[index], "non-finite node state, resetting to seed");
        self.positions[index] = seed_position(index, &self.ids[index]);
        self.velocities[index] = Vec2::ZERO;
    }

    #[cfg(test)]
    fn corrupt_velocity(&mut self, id: &str) {
        let index = self.index_by_id[id];
        self.velocities[index] = vec2(f32::NAN, f32::INFINITY);
    }
}

fn seed_position(index: usize, id: &str) -> Vec2 {
    let golden_angle = std::f32::consts::PI * (3.0 - 5.0_f32.sqrt());
    let radius = SEED_SPACING * (0.5 + index as f32).sqrt();
    let angle = index as f32 * golden_angle;
    let (jx, jy) = stable_pair(id);
    vec2(angle.cos(), angle.sin()) * radius + vec2(jx, jy) * SEED_JITTER
}
