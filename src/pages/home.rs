use leptos::prelude::*;

use crate::components::architecture::ArchitectureDiagram;

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<section class="architecture-page">
				<h1>"Architecture"</h1>
				<p class="subtitle">"Hover a service for details. Press play to watch requests flow."</p>
				<ArchitectureDiagram height=420 />
			</section>
		</ErrorBoundary>
	}
}
