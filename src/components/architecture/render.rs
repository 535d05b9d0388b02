use super::particles::ParticleEngine;
use super::state::ActiveDiagram;
use super::surface::Surface;
use super::types::{Point, Viewport};
use crate::error::Result;

const BACKGROUND: &str = "#0f172a";
const EDGE_COLOR: &str = "rgba(148, 163, 184, 0.7)";
const EDGE_LABEL_COLOR: &str = "#cbd5e1";
const NODE_LABEL_COLOR: &str = "#f8fafc";
const PARTICLE_COLOR: &str = "#38bdf8";
const EDGE_WIDTH: f64 = 2.0;
const ARROW_SIZE: f64 = 9.0;
/// Lift of an edge label above its line.
const EDGE_LABEL_LIFT: f64 = 8.0;
const LABEL_GAP: f64 = 14.0;
const EDGE_FONT: &str = "11px sans-serif";
const NODE_FONT: &str = "12px sans-serif";
const TILE_FONT: &str = "bold 10px sans-serif";

/// Per-frame sizes taken from the config.
#[derive(Clone, Copy, Debug)]
pub struct RenderStyle {
	pub node_size: f64,
	pub particle_radius: f64,
}

/// Draws one frame: background, edges with labels, nodes, then particles
/// when `animating`. Never moves the particles.
pub fn draw_frame<S: Surface>(
	surface: &mut S,
	diagram: Option<&ActiveDiagram<S::Image>>,
	viewport: Viewport,
	particles: &ParticleEngine,
	animating: bool,
	style: RenderStyle,
) -> Result<()> {
	surface.clear(viewport);
	surface.fill_rect(0.0, 0.0, viewport.width, viewport.height, BACKGROUND);

	let Some(diagram) = diagram else {
		return Ok(());
	};
	draw_edges(surface, diagram, style)?;
	draw_nodes(surface, diagram, style)?;
	if animating {
		draw_particles(surface, diagram, particles, style)?;
	}
	Ok(())
}

fn draw_edges<S: Surface>(
	surface: &mut S,
	diagram: &ActiveDiagram<S::Image>,
	style: RenderStyle,
) -> Result<()> {
	let half = style.node_size / 2.0;
	for (from, to, label) in diagram
		.edges
		.iter()
		.filter_map(|e| diagram.edge_endpoints(e).map(|(a, b)| (a, b, e.label.as_str())))
	{
		surface.stroke_line(from, to, EDGE_COLOR, EDGE_WIDTH);

		let (dx, dy) = (to.x - from.x, to.y - from.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist > half {
			let (ux, uy) = (dx / dist, dy / dist);
			let tip = Point::new(to.x - ux * half, to.y - uy * half);
			let back = Point::new(tip.x - ux * ARROW_SIZE, tip.y - uy * ARROW_SIZE);
			let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
			surface.fill_triangle(
				tip,
				Point::new(back.x + px, back.y + py),
				Point::new(back.x - px, back.y - py),
				EDGE_COLOR,
			);
		}

		if !label.is_empty() {
			let mid = from.lerp(to, 0.5);
			surface.fill_text(
				label,
				Point::new(mid.x, mid.y - EDGE_LABEL_LIFT),
				EDGE_FONT,
				EDGE_LABEL_COLOR,
			)?;
		}
	}
	Ok(())
}

fn draw_nodes<S: Surface>(
	surface: &mut S,
	diagram: &ActiveDiagram<S::Image>,
	style: RenderStyle,
) -> Result<()> {
	let (size, half) = (style.node_size, style.node_size / 2.0);
	for placed in &diagram.nodes {
		let Point { x, y } = placed.position();
		let name = placed.node.display_name.as_str();
		match &placed.icon {
			Some(image) => surface.draw_image(image, x - half, y - half, size, size)?,
			None => {
				surface.fill_rect(x - half, y - half, size, size, placed.node.category.color());
				surface.fill_text(name, Point::new(x, y), TILE_FONT, NODE_LABEL_COLOR)?;
			}
		}
		surface.fill_text(name, Point::new(x, y + half + LABEL_GAP), NODE_FONT, NODE_LABEL_COLOR)?;
	}
	Ok(())
}

fn draw_particles<S: Surface>(
	surface: &mut S,
	diagram: &ActiveDiagram<S::Image>,
	particles: &ParticleEngine,
	style: RenderStyle,
) -> Result<()> {
	for particle in particles.particles() {
		let Some((from, to)) = diagram
			.edges
			.get(particle.edge)
			.and_then(|e| diagram.edge_endpoints(e))
		else {
			continue;
		};
		surface.fill_circle(particle.position(from, to), style.particle_radius, PARTICLE_COLOR)?;
	}
	Ok(())
}
