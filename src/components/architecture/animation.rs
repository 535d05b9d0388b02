#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnimationState {
	#[default]
	Paused,
	Running,
}

/// Play/pause state plus the bookkeeping for the self-rescheduling frame loop.
#[derive(Clone, Debug, Default)]
pub struct AnimationController {
	state: AnimationState,
	frame_pending: bool,
}

impl AnimationController {
	pub fn new() -> Self {
		Self::default()
	}

	#[cfg(test)]
	pub fn state(&self) -> AnimationState {
		self.state
	}

	pub fn is_running(&self) -> bool {
		self.state == AnimationState::Running
	}

	/// Paused -> Running. Returns false when already running.
	pub fn play(&mut self) -> bool {
		if self.is_running() {
			return false;
		}
		self.state = AnimationState::Running;
		true
	}

	/// Running -> Paused. Returns false when already paused.
	pub fn pause(&mut self) -> bool {
		if !self.is_running() {
			return false;
		}
		self.state = AnimationState::Paused;
		true
	}

	/// Claims the right to request the next frame. At most one request is
	/// outstanding, so a pause/play pair before it fires cannot fork the loop.
	pub fn claim_frame(&mut self) -> bool {
		if !self.is_running() || self.frame_pending {
			return false;
		}
		self.frame_pending = true;
		true
	}

	/// Called at the start of every scheduled frame.
	pub fn frame_fired(&mut self) {
		self.frame_pending = false;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_starts_paused() {
		let anim = AnimationController::new();
		assert_eq!(anim.state(), AnimationState::Paused);
		assert!(!anim.is_running());
	}

	#[test]
	fn test_transitions_are_guarded() {
		let mut anim = AnimationController::new();
		assert!(!anim.pause());
		assert!(anim.play());
		assert!(!anim.play());
		assert!(anim.is_running());
		assert!(anim.pause());
		assert!(!anim.pause());
	}

	#[test]
	fn test_one_outstanding_frame() {
		let mut anim = AnimationController::new();
		assert!(!anim.claim_frame());

		anim.play();
		assert!(anim.claim_frame());
		assert!(!anim.claim_frame());

		// pause and resume before the pending frame fires
		anim.pause();
		anim.play();
		assert!(!anim.claim_frame());

		anim.frame_fired();
		assert!(anim.claim_frame());
	}

	#[test]
	fn test_paused_loop_stops() {
		let mut anim = AnimationController::new();
		anim.play();
		assert!(anim.claim_frame());
		anim.pause();
		anim.frame_fired();
		assert!(!anim.claim_frame());
	}
}
