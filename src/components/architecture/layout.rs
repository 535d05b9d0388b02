use log::warn;

use super::types::{Point, Viewport};

/// Maps every position proportionally from the `from` frame into `to`.
///
/// Callers pass the viewport the positions are *currently* expressed in, so
/// repeated resizes compose instead of snapping back to the design frame.
pub fn rescale<'a>(positions: impl IntoIterator<Item = &'a mut Point>, from: Viewport, to: Viewport) {
	if from.is_degenerate() || to.is_degenerate() {
		warn!("architecture: refusing to rescale {:?} -> {:?}", from, to);
		return;
	}
	if from == to {
		return;
	}
	let (sx, sy) = (to.width / from.width, to.height / from.height);
	for p in positions {
		p.x *= sx;
		p.y *= sy;
	}
}
