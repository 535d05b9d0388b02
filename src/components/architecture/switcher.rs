use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use super::assets::{IconSource, load_icons};
use super::state::{SwitchOutcome, Visualizer};
use super::surface::Surface;
use crate::error::{Result, VisualizerError};

/// Swaps the active diagram: install -> load icons -> rescale -> respawn
/// particles -> draw.
///
/// The visualizer is only borrowed briefly: to install, once per icon as it
/// arrives, and to finish. Frames, resizes and input keep flowing while icons
/// load, and each node drops its placeholder as soon as its own icon is in.
/// If another switch starts in the meantime, this one completes as
/// [`SwitchOutcome::Stale`].
pub async fn set_project<S, L>(
	visualizer: &Rc<RefCell<Visualizer<S>>>,
	loader: &L,
	project_key: &str,
) -> Result<SwitchOutcome>
where
	S: Surface,
	L: IconSource<Image = S::Image>,
{
	let pending = match visualizer.borrow_mut().begin_switch(project_key) {
		Ok(pending) => pending,
		Err(e @ VisualizerError::UnknownProject(_)) => {
			warn!("architecture: ignoring switch: {}", e);
			return Ok(SwitchOutcome::Ignored);
		}
		Err(e) => return Err(e),
	};

	let generation = pending.generation;
	load_icons(loader, &pending.icon_refs, |index, icon| {
		visualizer.borrow_mut().attach_icon(generation, index, icon);
	})
	.await;
	visualizer.borrow_mut().complete_switch(pending)
}
