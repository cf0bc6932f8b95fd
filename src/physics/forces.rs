use eframe::egui::{Vec2, vec2};

use super::quadtree::QuadNode;

const DISTANCE_MIN_SQ: f32 = 1.0;

#[derive(Clone, Copy, Debug)]
pub(super) struct SimLink {
    pub(super) source: usize,
    pub(super) target: usize,
    pub(super) weight: f32,
    /// Share of the correction applied to the target; the rest goes to the source.
    pub(super) bias: f32,
}

fn jiggle(first: usize, second: usize) -> Vec2 {
    let angle = ((first as f32) * 0.618_034 + (second as f32) * 0.414_214) * std::f32::consts::TAU;
    vec2(angle.cos(), angle.sin())
}

pub(super) fn apply_links(
    links: &[SimLink],
    positions: &[Vec2],
    velocities: &mut [Vec2],
    distance: f32,
    strength: f32,
    alpha: f32,
) {
    for link in links {
        let (source, target) = (link.source, link.target);
        let mut delta = (positions[target] + velocities[target])
            - (positions[source] + velocities[source]);
        if delta.length_sq() <= f32::EPSILON {
            delta = jiggle(source, target) * 1e-3;
        }
        let length = delta.length();
        let link_strength = (strength * link.weight.sqrt()).min(1.0);
        let correction = delta * ((length - distance) / length * alpha * link_strength);

        velocities[target] -= correction * link.bias;
        velocities[source] += correction * (1.0 - link.bias);
    }
}

pub(super) fn accumulate_charge(
    node: &QuadNode,
    index: usize,
    positions: &[Vec2],
    strength: f32,
    alpha: f32,
    theta: f32,
    velocity: &mut Vec2,
) {
    if node.count <= 0.0 {
        return;
    }

    let point = positions[index];

    if node.is_leaf() {
        for &other in &node.indices {
            if other == index {
                continue;
            }
            *velocity += pair_charge(point, positions[other], index, other, strength * alpha);
        }
        return;
    }

    let delta = node.centroid - point;
    let distance_sq = delta.length_sq().max(DISTANCE_MIN_SQ);
    let far_enough = !node.cell.contains(point)
        && node.cell.side() * node.cell.side() < theta * theta * distance_sq;
    if far_enough {
        *velocity += delta * (strength * alpha * node.count / distance_sq);
        return;
    }

    for child in node.children() {
        accumulate_charge(child, index, positions, strength, alpha, theta, velocity);
    }
}

fn pair_charge(point: Vec2, other: Vec2, index: usize, other_index: usize, scale: f32) -> Vec2 {
    let mut delta = other - point;
    let mut distance_sq = delta.length_sq();
    if distance_sq <= f32::EPSILON {
        delta = jiggle(index, other_index) * 1e-3;
        distance_sq = delta.length_sq();
    }
    if distance_sq < DISTANCE_MIN_SQ {
        distance_sq = (DISTANCE_MIN_SQ * distance_sq).sqrt();
    }
    delta * (scale / distance_sq)
}

pub(super) fn apply_centering(positions: &mut [Vec2], strength: f32) {
    if positions.is_empty() || strength <= 0.0 {
        return;
    }
    let centroid = positions.iter().fold(Vec2::ZERO, |sum, point| sum + *point)
        / positions.len() as f32;
    let shift = centroid * strength;
    if shift.length_sq() <= f32::EPSILON {
        return;
    }
    for point in positions {
        *point -= shift;
    }
}

#[derive(Clone, Copy, Debug)]
pub(super) struct CollisionParams {
    pub(super) strength: f32,
    /// Pairs of cells further apart than this cannot contain overlapping nodes.
    pub(super) reach_sq: f32,
}

fn resolve_overlap(
    first: usize,
    second: usize,
    predicted: &[Vec2],
    radii: &[f32],
    strength: f32,
    velocities: &mut [Vec2],
) {
    let reach = radii[first] + radii[second];
    let mut delta = predicted[first] - predicted[second];
    let mut distance_sq = delta.length_sq();
    if distance_sq >= reach * reach {
        return;
    }
    if distance_sq <= f32::EPSILON {
        delta = jiggle(first, second) * 1e-3;
        distance_sq = delta.length_sq();
    }

    let distance = distance_sq.sqrt();
    let push = delta * ((reach - distance) / distance * strength);
    let first_sq = radii[first] * radii[first];
    let second_sq = radii[second] * radii[second];
    // The smaller node yields more.
    let share = second_sq / (first_sq + second_sq);

    velocities[first] += push * share;
    velocities[second] -= push * (1.0 - share);
}

pub(super) fn accumulate_collision_pairs(
    node_a: &QuadNode,
    node_b: &QuadNode,
    same_node: bool,
    predicted: &[Vec2],
    radii: &[f32],
    params: CollisionParams,
    velocities: &mut [Vec2],
) {
    if node_a.cell.gap_sq(node_b.cell) > params.reach_sq {
        return;
    }

    if node_a.is_leaf() && node_b.is_leaf() {
        if same_node {
            for (offset, &first) in node_a.indices.iter().enumerate() {
                for &second in &node_a.indices[offset + 1..] {
                    resolve_overlap(first, second, predicted, radii, params.strength, velocities);
                }
            }
        } else {
            for &first in &node_a.indices {
                for &second in &node_b.indices {
                    resolve_overlap(first, second, predicted, radii, params.strength, velocities);
                }
            }
        }
        return;
    }

    if same_node {
        let children = node_a.children().collect::<Vec<_>>();
        for (offset, child_a) in children.iter().enumerate() {
            accumulate_collision_pairs(child_a, child_a, true, predicted, radii, params, velocities);
            for child_b in &children[offset + 1..] {
                accumulate_collision_pairs(
                    child_a, child_b, false, predicted, radii, params, velocities,
                );
            }
        }
        return;
    }

    let split_a = if node_a.is_leaf() {
        false
    } else if node_b.is_leaf() {
        true
    } else {
        node_a.cell.half_extent >= node_b.cell.half_extent
    };

    if split_a {
        for child in node_a.children() {
            accumulate_collision_pairs(child, node_b, false, predicted, radii, params, velocities);
        }
    } else {
        for child in node_b.children() {
            accumulate_collision_pairs(node_a, child, false, predicted, radii, params, velocities);
        }
    }
}
