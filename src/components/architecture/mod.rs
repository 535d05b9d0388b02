//! Interactive architecture diagram: service nodes and labelled edges drawn
//! on a canvas, with animated flow particles, hover tooltips and hot-swappable
//! diagrams.

mod animation;
mod assets;
mod component;
mod interaction;
mod layout;
mod particles;
mod registry;
mod render;
mod state;
mod surface;
mod switcher;
mod types;

pub use component::ArchitectureDiagram;
pub use types::Viewport;
