//! Error types for the architecture diagram visualizer.

use thiserror::Error;
use wasm_bindgen::JsValue;

/// A specialized `Result` type for visualizer operations.
pub type Result<T> = std::result::Result<T, VisualizerError>;

/// Everything that can go wrong inside the visualizer.
#[derive(Error, Debug)]
pub enum VisualizerError {
	/// A required mount point never appeared in the document.
	#[error("mount point '{0}' not found")]
	MissingMount(String),

	/// A mount point exists but is the wrong kind of element.
	#[error("mount point '{id}' is not a {expected}")]
	WrongMountType { id: String, expected: &'static str },

	/// `set_project` was called with a key the registry does not know.
	#[error("unknown project '{0}'")]
	UnknownProject(String),

	/// A single icon failed to load or decode.
	#[error("failed to load icon {url}: {reason}")]
	Asset { url: String, reason: String },

	/// A drawing call failed mid-frame.
	#[error("render error: {0}")]
	Render(String),

	/// Rejected configuration value.
	#[error("invalid configuration: {0}")]
	Config(String),

	/// A diagram definition violates a structural rule.
	#[error("invalid diagram '{key}': {reason}")]
	InvalidDiagram { key: String, reason: String },

	/// The host catalog JSON could not be parsed.
	#[error("catalog parse error: {0}")]
	Catalog(#[from] serde_json::Error),

	/// A browser API call failed.
	#[error("browser error: {0}")]
	Dom(String),
}

impl VisualizerError {
	/// Wraps a JS exception thrown while drawing.
	pub fn render(value: JsValue) -> Self {
		Self::Render(format!("{value:?}"))
	}

	/// Only initialization and render failures are shown to the user; the
	/// rest are recovered locally.
	pub fn is_user_visible(&self) -> bool {
		matches!(
			self,
			Self::MissingMount(_) | Self::WrongMountType { .. } | Self::Render(_) | Self::Dom(_)
		)
	}
}

impl From<JsValue> for VisualizerError {
	fn from(value: JsValue) -> Self {
		Self::Dom(format!("{value:?}"))
	}
}
