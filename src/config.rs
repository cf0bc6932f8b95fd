use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorBy {
    #[default]
    Category,
    FirstTag,
}

/// Settings for one graph view. Every field has a default so partial JSON files load.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub charge_strength: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub node_size_floor: f32,
    pub show_labels: bool,
    pub collision_margin: f32,
    pub center_strength: f32,
    pub color_by: ColorBy,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub click_slop: f32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            charge_strength: -600.0,
            link_distance: 80.0,
            link_strength: 0.5,
            node_size_floor: 12.0,
            show_labels: true,
            collision_margin: 5.0,
            center_strength: 1.0,
            color_by: ColorBy::Category,
            min_zoom: 0.1,
            max_zoom: 4.0,
            click_slop: 4.0,
        }
    }
}

impl GraphConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid config JSON in {}", path.display()))?;
        Ok(config.sanitized())
    }

    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, fallback: f32| if value.is_finite() { value } else { fallback };

        self.charge_strength = finite_or(self.charge_strength, defaults.charge_strength)
            .clamp(-5_000.0, 0.0);
        self.link_distance = finite_or(self.link_distance, defaults.link_distance).clamp(1.0, 1_000.0);
        self.link_strength = finite_or(self.link_strength, defaults.link_strength).clamp(0.0, 1.0);
        self.node_size_floor =
            finite_or(self.node_size_floor, defaults.node_size_floor).clamp(1.0, 100.0);
        self.collision_margin =
            finite_or(self.collision_margin, defaults.collision_margin).clamp(0.0, 50.0);
        self.center_strength =
            finite_or(self.center_strength, defaults.center_strength).clamp(0.0, 1.0);
        self.min_zoom = finite_or(self.min_zoom, defaults.min_zoom).clamp(0.01, 1.0);
        self.max_zoom = finite_or(self.max_zoom, defaults.max_zoom).clamp(1.0, 50.0);
        self.click_slop = finite_or(self.click_slop, defaults.click_slop).clamp(0.0, 32.0);
        self
    }

    pub fn live(&self) -> LiveConfig {
        LiveConfig {
            charge_strength: self.charge_strength,
            link_distance: self.link_distance,
            link_strength: self.link_strength,
            node_size_floor: self.node_size_floor,
            show_labels: self.show_labels,
        }
    }

    pub fn with_live(mut self, live: LiveConfig) -> Self {
        self.charge_strength = live.charge_strength;
        self.link_distance = live.link_distance;
        self.link_strength = live.link_strength;
        self.node_size_floor = live.node_size_floor;
        self.show_labels = live.show_labels;
        self.sanitized()
    }

    pub fn forces(&self) -> ForceParams {
        ForceParams {
            charge_strength: self.charge_strength,
            link_distance: self.link_distance,
            link_strength: self.link_strength,
            node_size_floor: self.node_size_floor,
            collision_margin: self.collision_margin,
            center_strength: self.center_strength,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LiveConfig {
    pub charge_strength: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub node_size_floor: f32,
    pub show_labels: bool,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceParams {
    pub charge_strength: f32,
    pub link_distance: f32,
    pub link_strength: f32,
    pub node_size_floor: f32,
    pub collision_margin: f32,
    pub center_strength: f32,
}

impl Default for ForceParams {
    fn default() -> Self {
        GraphConfig::default().forces()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: GraphConfig =
            serde_json::from_str(r#"{"link_distance": 120, "color_by": "first_tag"}"#).unwrap();
        assert_eq!(config.link_distance, 120.0);
        assert_eq!(config.color_by, ColorBy::FirstTag);
        assert_eq!(config.charge_strength, -600.0);
        assert!(config.show_labels);
    }

    #[test]
    fn sanitized_clamps_out_of_range_values() {
        let config = GraphConfig {
            charge_strength: 250.0,
            link_strength: 3.0,
            node_size_floor: f32::NAN,
            min_zoom: 0.0,
            ..GraphConfig::default()
        }
        .sanitized();

        assert_eq!(config.charge_strength, 0.0);
        assert_eq!(config.link_strength, 1.0);
        assert_eq!(config.node_size_floor, 12.0);
        assert_eq!(config.min_zoom, 0.01);
    }

    #[test]
    fn live_round_trip_keeps_other_fields() {
        let base = GraphConfig {
            collision_margin: 9.0,
            ..GraphConfig::default()
        };
        let mut live = base.live();
        live.link_distance = 150.0;
        live.show_labels = false;

        let next = base.with_live(live);
        assert_eq!(next.link_distance, 150.0);
        assert!(!next.show_labels);
        assert_eq!(next.collision_margin, 9.0);
    }
}
