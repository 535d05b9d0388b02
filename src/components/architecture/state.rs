use log::{debug, info, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use super::animation::AnimationController;
use super::interaction::resolve_hovered_node;
use super::layout::rescale;
use super::particles::ParticleEngine;
use super::registry::{DiagramRegistry, TooltipCatalog};
use super::render::{RenderStyle, draw_frame};
use super::surface::Surface;
use super::types::{Diagram, Edge, PlacedNode, Point, TooltipDescriptor, Viewport};
use crate::config::VisualizerConfig;
use crate::error::{Result, VisualizerError};

/// The diagram currently on screen, with live node geometry and icons.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveDiagram<I> {
	pub project_key: String,
	pub title: String,
	pub nodes: Vec<PlacedNode<I>>,
	pub edges: Vec<Edge>,
	pub particles_per_edge: Option<usize>,
	/// Viewport the node positions are currently expressed in.
	frame: Viewport,
	generation: u64,
}

impl<I> ActiveDiagram<I> {
	/// Fresh copy of `diagram`, positions still in `frame`, no icons.
	pub fn install(diagram: &Diagram, frame: Viewport, generation: u64) -> Self {
		Self {
			project_key: diagram.project_key.clone(),
			title: diagram.title.clone(),
			nodes: diagram.nodes.iter().cloned().map(PlacedNode::new).collect(),
			edges: diagram.edges.clone(),
			particles_per_edge: diagram.particles_per_edge,
			frame,
			generation,
		}
	}

	pub fn node(&self, id: &str) -> Option<&PlacedNode<I>> {
		self.nodes.iter().find(|n| n.id() == id)
	}

	/// Endpoints of `edge`, or `None` when either id is missing.
	pub fn edge_endpoints(&self, edge: &Edge) -> Option<(Point, Point)> {
		Some((
			self.node(&edge.from_id)?.position(),
			self.node(&edge.to_id)?.position(),
		))
	}

	/// Moves all nodes into `viewport`.
	fn fit_to(&mut self, viewport: Viewport) {
		rescale(
			self.nodes.iter_mut().map(|n| &mut n.node.position),
			self.frame,
			viewport,
		);
		self.frame = viewport;
	}
}

/// A switch that has installed its diagram and is waiting on icons.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingSwitch {
	pub generation: u64,
	pub project_key: String,
	pub icon_refs: Vec<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwitchOutcome {
	/// The new diagram is active and drawn.
	Applied,
	/// A later switch started first; the results were dropped.
	Stale,
	/// Unknown project key; nothing changed.
	Ignored,
}

/// Hover result: the node under the pointer and its tooltip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HoverTarget<'a> {
	pub node_id: &'a str,
	pub tooltip: &'a TooltipDescriptor,
}

/// Owns all visualizer state and the drawing surface.
pub struct Visualizer<S: Surface> {
	registry: DiagramRegistry,
	tooltips: TooltipCatalog,
	config: VisualizerConfig,
	surface: S,
	viewport: Viewport,
	active: Option<ActiveDiagram<S::Image>>,
	generation: u64,
	particles: ParticleEngine,
	animation: AnimationController,
	rng: SmallRng,
	halted: bool,
}

impl<S: Surface> Visualizer<S> {
	pub fn new(
		surface: S,
		viewport: Viewport,
		registry: DiagramRegistry,
		tooltips: TooltipCatalog,
		config: VisualizerConfig,
		seed: u64,
	) -> Self {
		let particles = ParticleEngine::new(config.particle_speed_min, config.particle_speed_max);
		Self {
			registry,
			tooltips,
			viewport: viewport.or(config.reference_viewport),
			config,
			surface,
			active: None,
			generation: 0,
			particles,
			animation: AnimationController::new(),
			rng: SmallRng::seed_from_u64(seed),
			halted: false,
		}
	}

	pub fn config(&self) -> &VisualizerConfig {
		&self.config
	}

	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	pub fn is_running(&self) -> bool {
		self.animation.is_running()
	}

	pub fn is_halted(&self) -> bool {
		self.halted
	}

	/// Starts a switch to `project_key`: installs its nodes, already fitted to
	/// the current viewport, as the active diagram and returns what still has
	/// to be loaded. Unknown keys leave everything untouched.
	pub fn begin_switch(&mut self, project_key: &str) -> Result<PendingSwitch> {
		let diagram = self
			.registry
			.get(project_key)
			.ok_or_else(|| VisualizerError::UnknownProject(project_key.to_owned()))?;

		self.generation += 1;
		let mut active = ActiveDiagram::install(diagram, self.config.reference_viewport, self.generation);
		active.fit_to(self.viewport);
		let icon_refs = diagram.nodes.iter().map(|n| n.icon_ref.clone()).collect();
		self.active = Some(active);
		self.particles.clear();

		Ok(PendingSwitch {
			generation: self.generation,
			project_key: project_key.to_owned(),
			icon_refs,
		})
	}

	/// Gives node `index` of the switch `generation` its icon. Icons for a
	/// superseded switch are dropped and `false` is returned.
	pub fn attach_icon(&mut self, generation: u64, index: usize, icon: S::Image) -> bool {
		let current = self.generation;
		match self
			.active
			.as_mut()
			.filter(|a| a.generation == generation && generation == current)
			.and_then(|a| a.nodes.get_mut(index))
		{
			Some(node) => {
				node.icon = Some(icon);
				true
			}
			None => false,
		}
	}

	/// Finishes a switch once all its icons settled: fit to the current
	/// viewport, respawn particles, draw. Results of a superseded switch are
	/// dropped.
	pub fn complete_switch(&mut self, pending: PendingSwitch) -> Result<SwitchOutcome> {
		let viewport = self.viewport;
		let Some(active) = self
			.active
			.as_mut()
			.filter(|a| a.generation == pending.generation && pending.generation == self.generation)
		else {
			debug!(
				"architecture: dropping stale switch to '{}' (generation {})",
				pending.project_key, pending.generation
			);
			return Ok(SwitchOutcome::Stale);
		};

		active.fit_to(viewport);
		info!("architecture: showing '{}' ({})", active.title, active.project_key);
		self.respawn_particles();
		self.render()?;
		Ok(SwitchOutcome::Applied)
	}

	/// Applies a new surface size to the active diagram and redraws.
	pub fn resize(&mut self, viewport: Viewport) -> Result<()> {
		let viewport = viewport.or(self.config.reference_viewport);
		if let Some(active) = self.active.as_mut() {
			active.fit_to(viewport);
		}
		self.viewport = viewport;
		self.render()
	}

	/// Draws the current state. Particles are shown only while running and
	/// never moved here.
	pub fn render(&mut self) -> Result<()> {
		if self.halted {
			return Ok(());
		}
		let style = RenderStyle {
			node_size: self.config.node_size,
			particle_radius: self.config.particle_radius,
		};
		draw_frame(
			&mut self.surface,
			self.active.as_ref(),
			self.viewport,
			&self.particles,
			self.animation.is_running(),
			style,
		)
	}

	/// Paused -> Running with a fresh batch of particles. No-op when already
	/// running or halted.
	pub fn play(&mut self) -> bool {
		if self.halted || !self.animation.play() {
			return false;
		}
		self.respawn_particles();
		info!("architecture: animation started");
		true
	}

	/// Running -> Paused. The last frame stays on screen.
	pub fn pause(&mut self) -> bool {
		let paused = self.animation.pause();
		if paused {
			info!("architecture: animation paused");
		}
		paused
	}

	pub fn claim_frame(&mut self) -> bool {
		!self.halted && self.animation.claim_frame()
	}

	/// Moves every particle one step along its edge while running.
	pub fn tick(&mut self) {
		if self.animation.is_running() {
			self.particles.advance_all();
		}
	}

	/// Body of one scheduled frame: tick and draw, then claim the next frame.
	/// A frame that fires after a pause draws nothing, so the last frame stays
	/// on screen. Returns whether another frame should be requested.
	pub fn run_frame(&mut self) -> Result<bool> {
		self.animation.frame_fired();
		if self.halted || !self.animation.is_running() {
			return Ok(false);
		}
		self.tick();
		self.render()?;
		Ok(self.claim_frame())
	}

	/// Stops everything for good after a fatal render error.
	pub fn halt(&mut self) {
		if !self.halted {
			warn!("architecture: visualizer halted");
		}
		self.halted = true;
		self.animation.pause();
	}

	/// Node under `pointer` that has a tooltip. Read-only.
	pub fn hover(&self, pointer: Point) -> Option<HoverTarget<'_>> {
		let active = self.active.as_ref()?;
		let node = resolve_hovered_node(pointer, &active.nodes, self.config.hit_radius)?;
		let tooltip = self.tooltips.get(node.id())?;
		Some(HoverTarget {
			node_id: node.id(),
			tooltip,
		})
	}

	fn respawn_particles(&mut self) {
		let Some(active) = self.active.as_ref() else {
			self.particles.clear();
			return;
		};
		let per_edge = active
			.particles_per_edge
			.unwrap_or(self.config.default_particles_per_edge);
		self.particles
			.regenerate(active.edges.len(), per_edge, &mut self.rng);
	}
}

#[cfg(test)]
impl<S: Surface> Visualizer<S> {
	pub fn active(&self) -> Option<&ActiveDiagram<S::Image>> {
		self.active.as_ref()
	}

	pub fn particles(&self) -> &ParticleEngine {
		&self.particles
	}

	pub fn surface(&self) -> &S {
		&self.surface
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::architecture::surface::testing::{Op, RecordingSurface};

	fn visualizer() -> Visualizer<RecordingSurface> {
		visualizer_at(Viewport::REFERENCE)
	}

	fn visualizer_at(viewport: Viewport) -> Visualizer<RecordingSurface> {
		Visualizer::new(
			RecordingSurface::default(),
			viewport,
			DiagramRegistry::builtin(),
			TooltipCatalog::builtin(),
			VisualizerConfig::default(),
			42,
		)
	}

	fn switch(vis: &mut Visualizer<RecordingSurface>, key: &str) -> SwitchOutcome {
		let pending = vis.begin_switch(key).unwrap();
		attach_all(vis, &pending);
		vis.complete_switch(pending).unwrap()
	}

	fn attach_all(vis: &mut Visualizer<RecordingSurface>, pending: &PendingSwitch) {
		for (index, url) in pending.icon_refs.iter().enumerate() {
			vis.attach_icon(pending.generation, index, url.clone());
		}
	}

	/// Particles visible since the last clear.
	fn circles_on_screen(surface: &RecordingSurface) -> usize {
		let start = surface.ops.iter().rposition(|op| *op == Op::Clear).unwrap_or(0);
		surface.ops[start..]
			.iter()
			.filter(|op| matches!(op, Op::Circle { .. }))
			.count()
	}

	fn progress(vis: &Visualizer<RecordingSurface>) -> Vec<f64> {
		vis.particles().particles().iter().map(|p| p.progress).collect()
	}

	#[test]
	fn test_switch_applies_and_draws() {
		let mut vis = visualizer();
		assert_eq!(switch(&mut vis, "lic"), SwitchOutcome::Applied);

		let active = vis.active().unwrap();
		assert_eq!(active.project_key, "lic");
		assert_eq!(active.nodes.len(), 7);
		assert!(active.nodes.iter().all(|n| n.icon.is_some()));
		assert_eq!(vis.particles().len(), 30);
		assert!(!vis.surface().ops.is_empty());
	}

	#[test]
	fn test_unknown_project_changes_nothing() {
		let mut vis = visualizer();
		switch(&mut vis, "lic");
		vis.play();

		let before = vis.active().cloned();
		let nodes_ptr = vis.active().unwrap().nodes.as_ptr();
		let particles = vis.particles().particles().to_vec();

		let err = vis.begin_switch("unknown").unwrap_err();
		assert!(matches!(err, VisualizerError::UnknownProject(_)));

		assert_eq!(vis.active().cloned(), before);
		assert_eq!(vis.active().unwrap().nodes.as_ptr(), nodes_ptr);
		assert_eq!(vis.particles().particles(), &particles[..]);
	}

	#[test]
	fn test_second_play_keeps_particles() {
		let mut vis = visualizer();
		switch(&mut vis, "lic");
		assert!(vis.play());
		let spawned = vis.particles().particles().to_vec();

		assert!(!vis.play());
		assert!(vis.is_running());
		assert_eq!(vis.particles().particles(), &spawned[..]);
	}

	#[test]
	fn test_pause_keeps_last_frame() {
		let mut vis = visualizer();
		switch(&mut vis, "lic");
		vis.play();
		vis.render().unwrap();
		let drawn = vis.surface().ops.len();

		assert!(vis.pause());
		assert!(!vis.claim_frame());
		assert_eq!(vis.surface().ops.len(), drawn);
	}

	#[test]
	fn test_pending_frame_after_pause_draws_nothing() {
		let mut vis = visualizer();
		switch(&mut vis, "lic");
		assert!(vis.play());
		assert!(vis.claim_frame());
		assert!(vis.run_frame().unwrap());
		assert_eq!(circles_on_screen(vis.surface()), 30);
		let drawn = vis.surface().ops.len();

		assert!(vis.pause());
		// the frame requested before the pause still fires
		assert!(!vis.run_frame().unwrap());

		assert_eq!(vis.surface().ops.len(), drawn);
		assert_eq!(circles_on_screen(vis.surface()), 30);
		assert!(!vis.claim_frame());
	}

	#[test]
	fn test_pause_then_play_before_frame_keeps_loop() {
		let mut vis = visualizer();
		switch(&mut vis, "lic");
		vis.play();
		assert!(vis.claim_frame());

		vis.pause();
		assert!(vis.play());
		// the outstanding frame is reused
		assert!(!vis.claim_frame());
		assert!(vis.run_frame().unwrap());
		assert_eq!(circles_on_screen(vis.surface()), 30);
	}

	#[test]
	fn test_only_frames_advance_particles() {
		let mut vis = visualizer();
		switch(&mut vis, "lic");
		vis.play();
		let start = progress(&vis);

		vis.resize(Viewport::new(1000.0, 400.0)).unwrap();
		vis.resize(Viewport::new(1000.0, 500.0)).unwrap();
		vis.render().unwrap();
		assert_eq!(progress(&vis), start);

		vis.claim_frame();
		vis.run_frame().unwrap();
		let moved = vis.particles().particles();
		assert!(moved.iter().zip(&start).all(|(p, before)| {
			let expected = (before + p.speed) % 1.0;
			(p.progress - expected).abs() < 1e-12
		}));
	}

	#[test]
	fn test_tick_while_paused_is_noop() {
		let mut vis = visualizer();
		switch(&mut vis, "lic");
		vis.play();
		vis.pause();
		let start = progress(&vis);
		vis.tick();
		assert_eq!(progress(&vis), start);
	}

	#[test]
	fn test_install_fits_current_viewport() {
		let mut vis = visualizer_at(Viewport::new(1600.0, 800.0));
		let pending = vis.begin_switch("lic").unwrap();

		// lambda is authored at (330, 200)
		let p = vis.active().unwrap().node("lambda").unwrap().position();
		assert_eq!((p.x, p.y), (660.0, 400.0));
		assert_eq!(vis.hover(Point::new(660.0, 400.0)).unwrap().node_id, "lambda");

		attach_all(&mut vis, &pending);
		vis.complete_switch(pending).unwrap();
		let p = vis.active().unwrap().node("lambda").unwrap().position();
		assert_eq!((p.x, p.y), (660.0, 400.0));
	}

	#[test]
	fn test_icons_attach_one_by_one() {
		let mut vis = visualizer();
		let pending = vis.begin_switch("lic").unwrap();

		assert!(vis.attach_icon(pending.generation, 2, "/icons/lambda.svg".into()));
		let active = vis.active().unwrap();
		assert!(active.node("lambda").unwrap().icon.is_some());
		assert_eq!(active.nodes.iter().filter(|n| n.icon.is_some()).count(), 1);

		assert!(!vis.attach_icon(pending.generation, 99, "/nowhere.svg".into()));
	}

	#[test]
	fn test_stale_icon_is_dropped() {
		let mut vis = visualizer();
		let first = vis.begin_switch("lic").unwrap();
		let second = vis.begin_switch("ecommerce").unwrap();

		assert!(!vis.attach_icon(first.generation, 0, "/icons/apigw.svg".into()));
		assert!(vis.active().unwrap().nodes.iter().all(|n| n.icon.is_none()));
		assert!(vis.attach_icon(second.generation, 0, "/icons/cloudfront.svg".into()));
	}

	#[test]
	fn test_stale_switch_is_dropped() {
		let mut vis = visualizer();
		let first = vis.begin_switch("lic").unwrap();
		let second = vis.begin_switch("iot").unwrap();

		attach_all(&mut vis, &second);
		assert_eq!(vis.complete_switch(second).unwrap(), SwitchOutcome::Applied);

		attach_all(&mut vis, &first);
		assert_eq!(vis.complete_switch(first).unwrap(), SwitchOutcome::Stale);

		assert_eq!(vis.active().unwrap().project_key, "iot");
		// iot overrides particles per edge: 4 edges * 6
		assert_eq!(vis.particles().len(), 24);
	}

	#[test]
	fn test_stale_completion_before_latest() {
		let mut vis = visualizer();
		let first = vis.begin_switch("lic").unwrap();
		let second = vis.begin_switch("ecommerce").unwrap();

		assert_eq!(vis.complete_switch(first).unwrap(), SwitchOutcome::Stale);
		assert_eq!(vis.active().unwrap().project_key, "ecommerce");
		assert!(vis.active().unwrap().nodes.iter().all(|n| n.icon.is_none()));

		attach_all(&mut vis, &second);
		assert_eq!(vis.complete_switch(second).unwrap(), SwitchOutcome::Applied);
	}

	#[test]
	fn test_resize_rescales_from_previous_viewport() {
		let mut vis = visualizer();
		switch(&mut vis, "lic");
		let original = vis.active().unwrap().node("lambda").unwrap().position();

		vis.resize(Viewport::new(1600.0, 800.0)).unwrap();
		vis.resize(Viewport::new(400.0, 200.0)).unwrap();

		let p = vis.active().unwrap().node("lambda").unwrap().position();
		assert!((p.x - original.x / 2.0).abs() < 1e-9);
		assert!((p.y - original.y / 2.0).abs() < 1e-9);
		assert_eq!(vis.viewport(), Viewport::new(400.0, 200.0));
	}

	#[test]
	fn test_resize_during_pending_switch() {
		let mut vis = visualizer();
		let pending = vis.begin_switch("lic").unwrap();
		let authored = vis.active().unwrap().node("sns").unwrap().position();

		// resize races the icon load and touches the freshly installed nodes
		vis.resize(Viewport::new(1200.0, 600.0)).unwrap();
		attach_all(&mut vis, &pending);
		vis.complete_switch(pending).unwrap();

		let p = vis.active().unwrap().node("sns").unwrap().position();
		assert!((p.x - authored.x * 1.5).abs() < 1e-9);
		assert!((p.y - authored.y * 1.5).abs() < 1e-9);
	}

	#[test]
	fn test_zero_viewport_uses_reference() {
		let mut vis = visualizer();
		switch(&mut vis, "lic");
		let before = vis.active().unwrap().node("s3").unwrap().position();
		vis.resize(Viewport::new(0.0, 0.0)).unwrap();
		assert_eq!(vis.viewport(), Viewport::REFERENCE);
		assert_eq!(vis.active().unwrap().node("s3").unwrap().position(), before);
	}

	#[test]
	fn test_hover_reads_tooltip() {
		let mut vis = visualizer();
		assert!(vis.hover(Point::new(330.0, 200.0)).is_none());

		switch(&mut vis, "lic");
		let particles = vis.particles().particles().to_vec();
		let hit = vis.hover(Point::new(335.0, 195.0)).unwrap();
		assert_eq!(hit.node_id, "lambda");
		assert_eq!(hit.tooltip.title, "AWS Lambda");
		assert!(vis.hover(Point::new(5.0, 5.0)).is_none());
		assert_eq!(vis.particles().particles(), &particles[..]);
	}

	#[test]
	fn test_hover_without_descriptor_hides() {
		let mut vis = visualizer();
		switch(&mut vis, "iot");
		// "processor" has no tooltip entry
		assert!(vis.hover(Point::new(470.0, 200.0)).is_none());
		assert!(vis.hover(Point::new(280.0, 200.0)).is_some());
	}

	#[test]
	fn test_halt_is_terminal() {
		let mut vis = visualizer();
		switch(&mut vis, "lic");
		vis.play();
		vis.halt();

		assert!(!vis.is_running());
		assert!(!vis.play());
		assert!(!vis.claim_frame());
		let drawn = vis.surface().ops.len();
		vis.render().unwrap();
		assert_eq!(vis.surface().ops.len(), drawn);
	}
}
