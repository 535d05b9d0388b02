use std::f64::consts::PI;

use web_sys::{CanvasRenderingContext2d, HtmlImageElement};

use super::types::{Point, Viewport};
use crate::error::{Result, VisualizerError};

/// The drawing primitives the renderer needs.
pub trait Surface {
	type Image;

	fn clear(&mut self, viewport: Viewport);
	fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str);
	fn stroke_line(&mut self, from: Point, to: Point, color: &str, width: f64);
	fn fill_triangle(&mut self, a: Point, b: Point, c: Point, color: &str);
	fn fill_circle(&mut self, center: Point, radius: f64, color: &str) -> Result<()>;
	/// Centred text.
	fn fill_text(&mut self, text: &str, at: Point, font: &str, color: &str) -> Result<()>;
	fn draw_image(&mut self, image: &Self::Image, x: f64, y: f64, w: f64, h: f64) -> Result<()>;
}

impl Surface for CanvasRenderingContext2d {
	type Image = HtmlImageElement;

	fn clear(&mut self, viewport: Viewport) {
		self.clear_rect(0.0, 0.0, viewport.width, viewport.height);
	}

	fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64, color: &str) {
		self.set_fill_style_str(color);
		CanvasRenderingContext2d::fill_rect(self, x, y, w, h);
	}

	fn stroke_line(&mut self, from: Point, to: Point, color: &str, width: f64) {
		self.set_stroke_style_str(color);
		self.set_line_width(width);
		self.begin_path();
		self.move_to(from.x, from.y);
		self.line_to(to.x, to.y);
		self.stroke();
	}

	fn fill_triangle(&mut self, a: Point, b: Point, c: Point, color: &str) {
		self.set_fill_style_str(color);
		self.begin_path();
		self.move_to(a.x, a.y);
		self.line_to(b.x, b.y);
		self.line_to(c.x, c.y);
		self.close_path();
		self.fill();
	}

	fn fill_circle(&mut self, center: Point, radius: f64, color: &str) -> Result<()> {
		self.set_fill_style_str(color);
		self.begin_path();
		self.arc(center.x, center.y, radius, 0.0, 2.0 * PI)
			.map_err(VisualizerError::render)?;
		self.fill();
		Ok(())
	}

	fn fill_text(&mut self, text: &str, at: Point, font: &str, color: &str) -> Result<()> {
		self.set_fill_style_str(color);
		self.set_font(font);
		self.set_text_align("center");
		self.set_text_baseline("middle");
		CanvasRenderingContext2d::fill_text(self, text, at.x, at.y).map_err(VisualizerError::render)
	}

	fn draw_image(&mut self, image: &HtmlImageElement, x: f64, y: f64, w: f64, h: f64) -> Result<()> {
		self.draw_image_with_html_image_element_and_dw_and_dh(image, x, y, w, h)
			.map_err(VisualizerError::render)
	}
}
