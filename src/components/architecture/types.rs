use serde::{Deserialize, Serialize};

/// A position in surface coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}

	/// Linear interpolation towards `other`, `t` in `[0, 1]`.
	pub fn lerp(self, other: Point, t: f64) -> Point {
		Point::new(
			self.x + (other.x - self.x) * t,
			self.y + (other.y - self.y) * t,
		)
	}
}

/// Pixel dimensions of the drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	/// Frame the built-in diagrams are authored in.
	pub const REFERENCE: Viewport = Viewport::new(800.0, 400.0);

	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}

	/// True when the surface is not laid out yet (zero or negative size).
	pub fn is_degenerate(&self) -> bool {
		!(self.width > 0.0 && self.height > 0.0)
	}

	/// Substitutes `fallback` when this viewport is degenerate.
	pub fn or(self, fallback: Viewport) -> Viewport {
		if self.is_degenerate() { fallback } else { self }
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
	Gateway,
	Compute,
	Database,
	Storage,
	Cdn,
	Messaging,
	Monitoring,
	Auth,
}

impl NodeCategory {
	/// Fill colour for the placeholder tile.
	pub fn color(self) -> &'static str {
		match self {
			Self::Gateway => "#8c4fff",
			Self::Compute => "#ed7100",
			Self::Database => "#3b48cc",
			Self::Storage => "#3f8624",
			Self::Cdn => "#7d3c98",
			Self::Messaging => "#e7157b",
			Self::Monitoring => "#c7131f",
			Self::Auth => "#dd344c",
		}
	}
}

/// One labelled service box in a diagram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceNode {
	pub id: String,
	pub display_name: String,
	pub position: Point,
	/// URL of the node's icon.
	#[serde(default)]
	pub icon_ref: String,
	pub category: NodeCategory,
}

/// Directed, labelled connection between two nodes of the same diagram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
	pub from_id: String,
	pub to_id: String,
	#[serde(default)]
	pub label: String,
}

/// A static diagram definition as held by the registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagram {
	pub project_key: String,
	#[serde(default)]
	pub title: String,
	pub nodes: Vec<ServiceNode>,
	#[serde(default)]
	pub edges: Vec<Edge>,
	/// Overrides the configured particle count per edge.
	#[serde(default)]
	pub particles_per_edge: Option<usize>,
}

impl Diagram {
	#[cfg(test)]
	pub fn node(&self, id: &str) -> Option<&ServiceNode> {
		self.nodes.iter().find(|n| n.id == id)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TooltipDescriptor {
	pub title: String,
	pub description: String,
	#[serde(default)]
	pub use_cases: Vec<String>,
}

/// A node of the active diagram together with its resolved icon, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct PlacedNode<I> {
	pub node: ServiceNode,
	pub icon: Option<I>,
}

impl<I> PlacedNode<I> {
	pub fn new(node: ServiceNode) -> Self {
		Self { node, icon: None }
	}

	pub fn id(&self) -> &str {
		&self.node.id
	}

	pub fn position(&self) -> Point {
		self.node.position
	}
}
