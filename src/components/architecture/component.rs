use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, Document, Element, Event, EventTarget, HtmlButtonElement,
	HtmlCanvasElement, HtmlElement, HtmlScriptElement, HtmlSelectElement, MouseEvent,
};

use super::assets::WebIconSource;
use super::interaction::place_tooltip;
use super::registry::{DiagramRegistry, HostCatalog, TooltipCatalog};
use super::state::Visualizer;
use super::switcher::set_project;
use super::types::{Point, TooltipDescriptor, Viewport};
use crate::config::{MountIds, VisualizerConfig};
use crate::error::{Result, VisualizerError};

type WebVisualizer = Visualizer<CanvasRenderingContext2d>;
type Shared = Rc<RefCell<WebVisualizer>>;
type FrameLoop = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// Everything resolved before the mount points are found.
struct Setup {
	ids: MountIds,
	registry: DiagramRegistry,
	tooltips: TooltipCatalog,
	config: VisualizerConfig,
}

/// Next step after the mount points could not be found.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MountRetry {
	After(Duration),
	GiveUp,
}

/// Fixed-delay retry while `attempt` is below the configured bound.
fn mount_retry(attempt: u32, config: &VisualizerConfig) -> MountRetry {
	if attempt < config.mount_attempts {
		MountRetry::After(Duration::from_millis(config.mount_retry_delay_ms))
	} else {
		MountRetry::GiveUp
	}
}

struct Mounts {
	document: Document,
	canvas: HtmlCanvasElement,
	tooltip: HtmlElement,
	play: HtmlButtonElement,
	pause: HtmlButtonElement,
	select: HtmlSelectElement,
	fallback: Option<HtmlElement>,
}

/// Renders the mount points and attaches the visualizer to them.
#[component]
pub fn ArchitectureDiagram(#[prop(default = 400)] height: u32) -> impl IntoView {
	let ids = MountIds::default();
	let mount_ids = ids.clone();

	Effect::new(move |_| {
		mount(mount_ids.clone());
	});

	view! {
		<div class="architecture-diagram">
			<div id=ids.controls class="architecture-controls">
				<button data-action="play">"Play"</button>
				<button data-action="pause" disabled=true>"Pause"</button>
				<select data-action="project"></select>
			</div>
			<div style="position: relative;">
				<canvas
					id=ids.surface
					style=format!("display: block; width: 100%; height: {height}px;")
				/>
				<div
					id=ids.tooltip
					class="architecture-tooltip"
					style="position: absolute; display: none; pointer-events: none;"
				></div>
			</div>
			<div id=ids.fallback class="architecture-fallback" style="display: none;">
				"The architecture diagram could not be displayed."
			</div>
		</div>
	}
}

/// Attaches to the elements named by `ids`, retrying on a fixed delay while
/// they are missing. Falls back to the error message when it gives up.
pub fn mount(ids: MountIds) {
	let Some(document) = web_sys::window().and_then(|w| w.document()) else {
		error!("architecture: no document available");
		return;
	};
	let (registry, tooltips, config) = load_catalog(&document, &ids.catalog);
	attempt_mount(
		Setup {
			ids,
			registry,
			tooltips,
			config,
		},
		1,
	);
}

fn attempt_mount(setup: Setup, attempt: u32) {
	let Some(document) = web_sys::window().and_then(|w| w.document()) else {
		return;
	};
	match find_mounts(&document, &setup.ids) {
		Ok(mounts) => {
			let fallback = mounts.fallback.clone();
			if let Err(e) = start(mounts, setup) {
				error!("architecture: initialization failed: {}", e);
				show_fallback(fallback.as_ref());
			}
		}
		Err(e) => match mount_retry(attempt, &setup.config) {
			MountRetry::After(delay) => {
				debug!("architecture: {} (attempt {}), retrying", e, attempt);
				set_timeout(move || attempt_mount(setup, attempt + 1), delay);
			}
			MountRetry::GiveUp => {
				error!("architecture: giving up after {} attempts: {}", attempt, e);
				show_fallback(lookup::<HtmlElement>(&document, &setup.ids.fallback, "element").ok().as_ref());
			}
		},
	}
}

/// Built-in catalog, merged with the host's JSON catalog when present.
fn load_catalog(document: &Document, id: &str) -> (DiagramRegistry, TooltipCatalog, VisualizerConfig) {
	let (mut registry, mut tooltips) = (DiagramRegistry::builtin(), TooltipCatalog::builtin());
	let mut config = VisualizerConfig::default();

	let json = document
		.get_element_by_id(id)
		.and_then(|el| el.dyn_into::<HtmlScriptElement>().ok())
		.and_then(|script| script.text().ok());
	let Some(json) = json else {
		return (registry, tooltips, config);
	};

	match HostCatalog::from_json(&json) {
		Ok(catalog) => {
			if let Some(host) = catalog.apply(&mut registry, &mut tooltips) {
				match host.validate() {
					Ok(host) => config = host,
					Err(e) => warn!("architecture: ignoring host config: {}", e),
				}
			}
			info!("architecture: host catalog loaded, {} diagrams", registry.len());
		}
		Err(e) => warn!("architecture: failed to parse host catalog: {}", e),
	}
	(registry, tooltips, config)
}

fn lookup<T: JsCast>(document: &Document, id: &str, expected: &'static str) -> Result<T> {
	document
		.get_element_by_id(id)
		.ok_or_else(|| VisualizerError::MissingMount(id.to_owned()))?
		.dyn_into::<T>()
		.map_err(|_| VisualizerError::WrongMountType {
			id: id.to_owned(),
			expected,
		})
}

fn control<T: JsCast>(controls: &Element, controls_id: &str, action: &str, expected: &'static str) -> Result<T> {
	let name = format!("{controls_id} [data-action={action}]");
	controls
		.query_selector(&format!("[data-action={action}]"))?
		.ok_or_else(|| VisualizerError::MissingMount(name.clone()))?
		.dyn_into::<T>()
		.map_err(|_| VisualizerError::WrongMountType { id: name, expected })
}

fn find_mounts(document: &Document, ids: &MountIds) -> Result<Mounts> {
	let canvas = lookup::<HtmlCanvasElement>(document, &ids.surface, "canvas")?;
	let tooltip = lookup::<HtmlElement>(document, &ids.tooltip, "element")?;
	let controls = lookup::<Element>(document, &ids.controls, "element")?;
	Ok(Mounts {
		document: document.clone(),
		canvas,
		tooltip,
		play: control(&controls, &ids.controls, "play", "button")?,
		pause: control(&controls, &ids.controls, "pause", "button")?,
		select: control(&controls, &ids.controls, "project", "select")?,
		fallback: lookup(document, &ids.fallback, "element").ok(),
	})
}

fn start(mounts: Mounts, setup: Setup) -> Result<()> {
	let Mounts {
		document,
		canvas,
		tooltip,
		play,
		pause,
		select,
		fallback,
	} = mounts;
	let Setup {
		ids,
		registry,
		tooltips,
		config,
	} = setup;

	let viewport = fit_canvas(&canvas, config.reference_viewport);
	let ctx: CanvasRenderingContext2d = canvas
		.get_context("2d")?
		.ok_or_else(|| VisualizerError::Dom("2d context unavailable".into()))?
		.dyn_into()
		.map_err(|_| VisualizerError::Dom("unexpected context type".into()))?;

	fill_project_select(&document, &select, &registry, &config.initial_project)?;
	let initial = select.value();

	let vis: Shared = Rc::new(RefCell::new(Visualizer::new(
		ctx,
		viewport,
		registry,
		tooltips,
		config,
		js_sys::Date::now() as u64,
	)));

	// Frame loop: tick and draw, then reschedule only while running.
	let frame: FrameLoop = Rc::new(RefCell::new(None));
	let (vis_frame, frame_inner, fallback_frame) = (vis.clone(), frame.clone(), fallback.clone());
	let (play_frame, pause_frame) = (play.clone(), pause.clone());
	*frame.borrow_mut() = Some(Closure::new(move || {
		let mut v = vis_frame.borrow_mut();
		let outcome = v.run_frame();
		match outcome {
			Ok(true) => {
				drop(v);
				request_frame(&frame_inner);
			}
			Ok(false) => {}
			Err(e) => {
				fail(&mut v, fallback_frame.as_ref(), &e);
				sync_buttons(&play_frame, &pause_frame, &v);
			}
		}
	}));

	let (vis_play, frame_play, play_btn, pause_btn) =
		(vis.clone(), frame.clone(), play.clone(), pause.clone());
	listen(&play, "click", move |_| {
		let mut v = vis_play.borrow_mut();
		if v.play() && v.claim_frame() {
			drop(v);
			request_frame(&frame_play);
		} else {
			drop(v);
		}
		sync_buttons(&play_btn, &pause_btn, &vis_play.borrow());
	})?;

	let (vis_pause, play_btn, pause_btn) = (vis.clone(), play.clone(), pause.clone());
	listen(&pause, "click", move |_| {
		vis_pause.borrow_mut().pause();
		sync_buttons(&play_btn, &pause_btn, &vis_pause.borrow());
	})?;

	let (vis_select, select_inner, fallback_select) = (vis.clone(), select.clone(), fallback.clone());
	listen(&select, "change", move |_| {
		switch_project(vis_select.clone(), select_inner.value(), fallback_select.clone());
	})?;

	let window = web_sys::window().ok_or_else(|| VisualizerError::Dom("no window".into()))?;
	let (vis_resize, canvas_resize, fallback_resize) = (vis.clone(), canvas.clone(), fallback.clone());
	listen(&window, "resize", move |_| {
		let mut v = vis_resize.borrow_mut();
		let viewport = fit_canvas(&canvas_resize, v.config().reference_viewport);
		if let Err(e) = v.resize(viewport) {
			fail(&mut v, fallback_resize.as_ref(), &e);
		}
	})?;

	let shown: Rc<RefCell<Option<String>>> = Rc::new(RefCell::new(None));
	let (vis_move, canvas_move, tooltip_move, shown_move) =
		(vis.clone(), canvas.clone(), tooltip.clone(), shown.clone());
	listen(&canvas, "mousemove", move |event| {
		let Ok(ev) = event.dyn_into::<MouseEvent>() else {
			return;
		};
		let rect = canvas_move.get_bounding_client_rect();
		let pointer = Point::new(
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);
		if let Err(e) = update_tooltip(&document, &vis_move.borrow(), &tooltip_move, &shown_move, pointer) {
			warn!("architecture: tooltip update failed: {}", e);
		}
	})?;

	let (tooltip_leave, shown_leave) = (tooltip.clone(), shown.clone());
	listen(&canvas, "mouseleave", move |_| {
		hide_tooltip(&tooltip_leave, &shown_leave);
	})?;

	sync_buttons(&play, &pause, &vis.borrow());
	info!("architecture: mounted on #{}", ids.surface);
	switch_project(vis, initial, fallback);
	Ok(())
}

fn switch_project(vis: Shared, key: String, fallback: Option<HtmlElement>) {
	spawn_local(async move {
		if let Err(e) = set_project(&vis, &WebIconSource, &key).await {
			fail(&mut vis.borrow_mut(), fallback.as_ref(), &e);
		}
	});
}

fn listen(target: &EventTarget, event: &str, handler: impl FnMut(Event) + 'static) -> Result<()> {
	let cb = Closure::<dyn FnMut(Event)>::new(handler);
	target.add_event_listener_with_callback(event, cb.as_ref().unchecked_ref())?;
	// lives as long as the page
	cb.forget();
	Ok(())
}

fn request_frame(frame: &FrameLoop) {
	let Some(window) = web_sys::window() else {
		return;
	};
	if let Some(ref cb) = *frame.borrow() {
		let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
	}
}

/// Matches the canvas backing store to its laid-out size.
fn fit_canvas(canvas: &HtmlCanvasElement, fallback: Viewport) -> Viewport {
	let viewport = Viewport::new(canvas.client_width() as f64, canvas.client_height() as f64).or(fallback);
	canvas.set_width(viewport.width as u32);
	canvas.set_height(viewport.height as u32);
	viewport
}

fn fill_project_select(
	document: &Document,
	select: &HtmlSelectElement,
	registry: &DiagramRegistry,
	initial: &str,
) -> Result<()> {
	if select.length() == 0 {
		for (key, title) in registry.projects() {
			let option = document.create_element("option")?;
			option.set_attribute("value", key)?;
			option.set_text_content(Some(if title.is_empty() { key } else { title }));
			select.append_child(&option)?;
		}
	}
	if registry.get(initial).is_some() {
		select.set_value(initial);
	}
	Ok(())
}

/// `(play disabled, pause disabled)`.
fn button_states(running: bool, halted: bool) -> (bool, bool) {
	(running || halted, !running)
}

fn sync_buttons(play: &HtmlButtonElement, pause: &HtmlButtonElement, vis: &WebVisualizer) {
	let (play_disabled, pause_disabled) = button_states(vis.is_running(), vis.is_halted());
	play.set_disabled(play_disabled);
	pause.set_disabled(pause_disabled);
}

fn update_tooltip(
	document: &Document,
	vis: &WebVisualizer,
	tooltip: &HtmlElement,
	shown: &RefCell<Option<String>>,
	pointer: Point,
) -> Result<()> {
	let Some(target) = vis.hover(pointer) else {
		hide_tooltip(tooltip, shown);
		return Ok(());
	};

	if shown.borrow().as_deref() != Some(target.node_id) {
		fill_tooltip(document, tooltip, target.tooltip)?;
		*shown.borrow_mut() = Some(target.node_id.to_owned());
	}
	let style = tooltip.style();
	style.set_property("display", "block")?;

	let size = (tooltip.offset_width() as f64, tooltip.offset_height() as f64);
	let at = place_tooltip(pointer, size, vis.viewport(), vis.config().tooltip_offset);
	style.set_property("left", &format!("{}px", at.x))?;
	style.set_property("top", &format!("{}px", at.y))?;
	Ok(())
}

fn fill_tooltip(document: &Document, tooltip: &HtmlElement, descriptor: &TooltipDescriptor) -> Result<()> {
	tooltip.set_inner_html("");

	let title = document.create_element("h4")?;
	title.set_text_content(Some(&descriptor.title));
	tooltip.append_child(&title)?;

	let description = document.create_element("p")?;
	description.set_text_content(Some(&descriptor.description));
	tooltip.append_child(&description)?;

	if !descriptor.use_cases.is_empty() {
		let list = document.create_element("ul")?;
		for use_case in &descriptor.use_cases {
			let item = document.create_element("li")?;
			item.set_text_content(Some(use_case));
			list.append_child(&item)?;
		}
		tooltip.append_child(&list)?;
	}
	Ok(())
}

fn hide_tooltip(tooltip: &HtmlElement, shown: &RefCell<Option<String>>) {
	let _ = tooltip.style().set_property("display", "none");
	shown.borrow_mut().take();
}

/// Logs `err`; initialization and render failures also halt the visualizer
/// and reveal the fallback message.
fn fail(vis: &mut WebVisualizer, fallback: Option<&HtmlElement>, err: &VisualizerError) {
	if !err.is_user_visible() {
		warn!("architecture: {}", err);
		return;
	}
	error!("architecture: {}", err);
	vis.halt();
	show_fallback(fallback);
}

fn show_fallback(fallback: Option<&HtmlElement>) {
	if let Some(el) = fallback {
		let _ = el.style().set_property("display", "block");
	}
}


#[cfg(all(test, target_arch = "wasm32"))]
mod web_tests {
	use wasm_bindgen_test::*;

	use super::*;

	wasm_bindgen_test_configure!(run_in_browser);

	fn document() -> Document {
		web_sys::window().unwrap().document().unwrap()
	}

	/// Adds a full set of mount points named after `prefix` to the page.
	fn mount_points(prefix: &str) -> MountIds {
		let ids = MountIds {
			surface: format!("{prefix}-canvas"),
			tooltip: format!("{prefix}-tooltip"),
			controls: format!("{prefix}-controls"),
			fallback: format!("{prefix}-fallback"),
			catalog: format!("{prefix}-catalog"),
		};
		let root = document().create_element("div").unwrap();
		root.set_inner_html(&format!(
			r#"<div id="{controls}">
				<button data-action="play">Play</button>
				<button data-action="pause" disabled>Pause</button>
				<select data-action="project"></select>
			</div>
			<canvas id="{surface}" style="width: 640px; height: 320px;"></canvas>
			<div id="{tooltip}" style="display: none;"></div>
			<div id="{fallback}" style="display: none;"></div>"#,
			controls = ids.controls,
			surface = ids.surface,
			tooltip = ids.tooltip,
			fallback = ids.fallback,
		));
		document().body().unwrap().append_child(&root).unwrap();
		ids
	}

	fn setup(ids: MountIds, mount_attempts: u32) -> Setup {
		Setup {
			ids,
			registry: DiagramRegistry::builtin(),
			tooltips: TooltipCatalog::builtin(),
			config: VisualizerConfig {
				mount_attempts,
				..VisualizerConfig::default()
			},
		}
	}

	fn display(id: &str) -> String {
		lookup::<HtmlElement>(&document(), id, "element")
			.unwrap()
			.style()
			.get_property_value("display")
			.unwrap()
	}

	fn buttons(ids: &MountIds) -> (HtmlButtonElement, HtmlButtonElement) {
		let controls = lookup::<Element>(&document(), &ids.controls, "element").unwrap();
		(
			control(&controls, &ids.controls, "play", "button").unwrap(),
			control(&controls, &ids.controls, "pause", "button").unwrap(),
		)
	}

	/// Mounts the visualizer the way `attempt_mount` does, with the leptos
	/// executor running so the initial switch can be spawned.
	fn started(prefix: &str) -> MountIds {
		let host: HtmlElement = document().create_element("div").unwrap().unchecked_into();
		drop(leptos::mount::mount_to(host, || ()));
		let ids = mount_points(prefix);
		let mounts = find_mounts(&document(), &ids).unwrap();
		start(mounts, setup(ids.clone(), 1)).unwrap();
		ids
	}

	#[wasm_bindgen_test]
	fn test_missing_canvas_shows_fallback_after_last_attempt() {
		let mut ids = mount_points("missing-last");
		ids.surface = "missing-last-nowhere".into();
		let fallback = ids.fallback.clone();

		attempt_mount(setup(ids, 1), 1);

		assert_eq!(display(&fallback), "block");
	}

	#[wasm_bindgen_test]
	fn test_missing_canvas_retries_before_fallback() {
		let mut ids = mount_points("missing-retry");
		ids.surface = "missing-retry-nowhere".into();
		let fallback = ids.fallback.clone();

		attempt_mount(setup(ids, 3), 1);

		// a retry is scheduled, nothing shown yet
		assert_eq!(display(&fallback), "none");
	}

	#[wasm_bindgen_test]
	fn test_init_failure_shows_fallback() {
		let ids = mount_points("no-context");
		// a canvas holds one kind of context for good
		let canvas = lookup::<HtmlCanvasElement>(&document(), &ids.surface, "canvas").unwrap();
		let _ = canvas.get_context("bitmaprenderer");
		let fallback = ids.fallback.clone();

		attempt_mount(setup(ids, 1), 1);

		assert_eq!(display(&fallback), "block");
	}

	#[wasm_bindgen_test]
	fn test_mouseleave_hides_tooltip() {
		let ids = started("leave");
		let tooltip = lookup::<HtmlElement>(&document(), &ids.tooltip, "element").unwrap();
		tooltip.style().set_property("display", "block").unwrap();

		let canvas = lookup::<HtmlCanvasElement>(&document(), &ids.surface, "canvas").unwrap();
		canvas
			.dispatch_event(&Event::new("mouseleave").unwrap())
			.unwrap();

		assert_eq!(display(&ids.tooltip), "none");
	}

	#[wasm_bindgen_test]
	fn test_buttons_follow_play_and_pause() {
		let ids = started("buttons");
		let (play, pause) = buttons(&ids);
		assert!(!play.disabled());
		assert!(pause.disabled());

		play.click();
		assert!(play.disabled());
		assert!(!pause.disabled());

		pause.click();
		assert!(!play.disabled());
		assert!(pause.disabled());
	}

	#[wasm_bindgen_test]
	fn test_tooltip_lists_use_cases() {
		let ids = mount_points("fill");
		let tooltip = lookup::<HtmlElement>(&document(), &ids.tooltip, "element").unwrap();
		let descriptor = TooltipDescriptor {
			title: "Queue".into(),
			description: "Buffers work.".into(),
			use_cases: vec!["retries".into(), "fan-out".into()],
		};

		fill_tooltip(&document(), &tooltip, &descriptor).unwrap();

		assert_eq!(tooltip.child_element_count(), 3);
		assert_eq!(tooltip.query_selector("ul").unwrap().unwrap().child_element_count(), 2);
		assert_eq!(tooltip.text_content().unwrap(), "QueueBuffers work.retriesfan-out");
	}
}
