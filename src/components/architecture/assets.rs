use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::StreamExt;
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::HtmlImageElement;

use crate::error::{Result, VisualizerError};

/// Fetches and decodes one icon.
pub trait IconSource {
	type Image;

	fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<Self::Image>>;
}

/// Resolves every icon concurrently and hands each one to `on_loaded` with
/// its index in `icon_refs` as soon as it arrives. Never fails: a broken icon
/// is logged and skipped while the rest still load. Empty refs are not
/// fetched. Returns once every fetch has settled.
pub async fn load_icons<L, F>(loader: &L, icon_refs: &[String], mut on_loaded: F)
where
	L: IconSource,
	F: FnMut(usize, L::Image),
{
	let mut pending: FuturesUnordered<_> = icon_refs
		.iter()
		.enumerate()
		.filter(|(_, url)| !url.is_empty())
		.map(|(index, url)| loader.fetch(url).map(move |outcome| (index, outcome)))
		.collect();

	while let Some((index, outcome)) = pending.next().await {
		match outcome {
			Ok(image) => on_loaded(index, image),
			Err(e) => warn!("architecture: {}", e),
		}
	}
}

/// Loads icons through `<img>` elements.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebIconSource;

impl IconSource for WebIconSource {
	type Image = HtmlImageElement;

	fn fetch(&self, url: &str) -> LocalBoxFuture<'static, Result<HtmlImageElement>> {
		let url = url.to_owned();
		async move {
			let image = HtmlImageElement::new()?;
			let (tx, rx) = oneshot::channel::<bool>();
			let tx = Rc::new(RefCell::new(Some(tx)));

			let tx_load = tx.clone();
			let onload = Closure::<dyn FnMut()>::new(move || {
				if let Some(tx) = tx_load.borrow_mut().take() {
					let _ = tx.send(true);
				}
			});
			let onerror = Closure::<dyn FnMut()>::new(move || {
				if let Some(tx) = tx.borrow_mut().take() {
					let _ = tx.send(false);
				}
			});
			image.set_onload(Some(onload.as_ref().unchecked_ref()));
			image.set_onerror(Some(onerror.as_ref().unchecked_ref()));
			image.set_src(&url);

			let loaded = rx.await.unwrap_or(false);
			image.set_onload(None);
			image.set_onerror(None);
			drop((onload, onerror));

			if loaded {
				Ok(image)
			} else {
				Err(VisualizerError::Asset {
					url,
					reason: "image failed to load or decode".into(),
				})
			}
		}
		.boxed_local()
	}
}
