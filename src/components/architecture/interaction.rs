use super::types::{PlacedNode, Point, Viewport};

/// First node in draw order whose centre is strictly within `hit_radius` of
/// the pointer.
pub fn resolve_hovered_node<I>(
	pointer: Point,
	nodes: &[PlacedNode<I>],
	hit_radius: f64,
) -> Option<&PlacedNode<I>> {
	nodes
		.iter()
		.find(|n| n.position().distance(pointer) < hit_radius)
}

/// Top-left corner for a tooltip of `size` near `pointer`.
///
/// Prefers right of and above the pointer; flips left when it would run past
/// the right edge and below when it would run past the top edge.
pub fn place_tooltip(pointer: Point, size: (f64, f64), viewport: Viewport, offset: f64) -> Point {
	let (w, h) = size;
	let mut x = pointer.x + offset;
	if x + w > viewport.width {
		x = (pointer.x - offset - w).max(0.0);
	}
	let mut y = pointer.y - offset - h;
	if y < 0.0 {
		y = pointer.y + offset;
	}
	Point::new(x, y)
}
