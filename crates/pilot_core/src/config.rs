use serde::{Deserialize, Serialize};

/// Tuning for graph construction, search cadence and steering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Radius around the craft whose objects enter the visibility graph.
    pub field_of_view: f64,
    /// Execution ticks between forced replans.
    pub replan_interval: u32,
    /// A blocker closer than this to the edge origin may be bypassed.
    pub close_escape: f64,
    /// Rotation of the origin→blocker heading used to place bypass candidates.
    pub bypass_angle_deg: f64,
    /// Extra clearance around a blocker, in craft radii.
    pub bypass_margin: f64,
    /// Corridor half-width for line-of-sight tests, in craft radii.
    pub clearance_factor: f64,
    /// A waypoint counts as reached within this many craft radii.
    pub arrival_multiplier: f64,
    /// Heading error above which the craft slows to half speed.
    pub alignment_threshold_deg: f64,
    /// Depots below this energy are not considered refuel sources.
    pub min_depot_energy: f64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            field_of_view: 500.0,
            replan_interval: 10,
            close_escape: 75.0,
            bypass_angle_deg: 120.0,
            bypass_margin: 3.0,
            clearance_factor: 2.0,
            arrival_multiplier: 2.0,
            alignment_threshold_deg: 45.0,
            min_depot_energy: 1000.0,
        }
    }
}

impl PlannerConfig {
    pub fn alignment_threshold(&self) -> f64 {
        self.alignment_threshold_deg.to_radians()
    }
}
