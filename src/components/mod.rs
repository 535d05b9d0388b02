//! Canvas components.

pub mod architecture;
