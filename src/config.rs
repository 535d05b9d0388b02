//! Tunables for the visualizer and the ids of the elements it mounts onto.

use serde::{Deserialize, Serialize};

use crate::components::architecture::Viewport;
use crate::error::{Result, VisualizerError};

/// Visualizer tunables. Every field has a default so a host catalog may set
/// only the ones it cares about.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VisualizerConfig {
	/// Frame the diagram definitions' coordinates are authored in.
	pub reference_viewport: Viewport,
	/// Max pointer-to-node distance that counts as hovering.
	pub hit_radius: f64,
	/// Particles per edge when a diagram does not override it.
	pub default_particles_per_edge: usize,
	/// Lower bound of per-tick progress for a particle.
	pub particle_speed_min: f64,
	/// Upper bound of per-tick progress for a particle.
	pub particle_speed_max: f64,
	/// Side of a node's icon or placeholder tile.
	pub node_size: f64,
	pub particle_radius: f64,
	/// Gap between pointer and tooltip.
	pub tooltip_offset: f64,
	/// Project shown on mount.
	pub initial_project: String,
	pub mount_attempts: u32,
	pub mount_retry_delay_ms: u64,
}

impl Default for VisualizerConfig {
	fn default() -> Self {
		Self {
			reference_viewport: Viewport::REFERENCE,
			hit_radius: 30.0,
			default_particles_per_edge: 5,
			particle_speed_min: 0.002,
			particle_speed_max: 0.006,
			node_size: 48.0,
			particle_radius: 3.0,
			tooltip_offset: 12.0,
			initial_project: "lic".into(),
			mount_attempts: 5,
			mount_retry_delay_ms: 200,
		}
	}
}

impl VisualizerConfig {
	/// Checks the invariants the rest of the crate relies on.
	pub fn validate(self) -> Result<Self> {
		if self.reference_viewport.is_degenerate() {
			return Err(VisualizerError::Config(
				"reference viewport must have a positive size".into(),
			));
		}
		if self.hit_radius <= 0.0 || self.node_size <= 0.0 || self.particle_radius <= 0.0 {
			return Err(VisualizerError::Config(
				"hit radius, node size and particle radius must be positive".into(),
			));
		}
		if self.particle_speed_min <= 0.0 || self.particle_speed_max < self.particle_speed_min {
			return Err(VisualizerError::Config(format!(
				"particle speed range {}..{} is invalid",
				self.particle_speed_min, self.particle_speed_max
			)));
		}
		if self.mount_attempts == 0 {
			return Err(VisualizerError::Config("mount attempts must be at least 1".into()));
		}
		Ok(self)
	}
}

/// Stable element ids the visualizer looks up on mount.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MountIds {
	pub surface: String,
	pub tooltip: String,
	pub controls: String,
	pub fallback: String,
	/// Optional `<script type="application/json">` holding a host catalog.
	pub catalog: String,
}

impl Default for MountIds {
	fn default() -> Self {
		Self {
			surface: "architecture-canvas".into(),
			tooltip: "architecture-tooltip".into(),
			controls: "architecture-controls".into(),
			fallback: "architecture-fallback".into(),
			catalog: "architecture-catalog".into(),
		}
	}
}
