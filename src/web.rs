//! Browser binding through [`web_sys`].

use crate::{
	config::{ObserverConfig, Options, Threshold},
	controller::Controller,
	host::{Host, IntersectionEvent},
	reveal::{Rect, RevealTarget},
};
use core::cell::RefCell;
use js_sys::{Array, Object, Reflect};
use lignin::DomRef;
use std::rc::{Rc, Weak};
use tracing::{debug, error, instrument, trace, trace_span, warn};
use wasm_bindgen::{closure::Closure, JsCast, JsValue};
use web_sys::{
	AddEventListenerOptions, Element, Event, EventTarget, HtmlElement, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit, MutationObserver,
	MutationObserverInit, Node, SvgElement, Window,
};

type SharedController = Rc<RefCell<Controller<WebHost>>>;

/// Lazily reveals images below one root element.
///
/// Stops on drop.
///
/// ```rust,no_run
/// use lazy_reveal_dom::web::LazyReveal;
/// use wasm_bindgen::JsValue;
///
/// let document = web_sys::window().unwrap().document().unwrap();
/// let gallery = document.get_element_by_id("gallery").unwrap();
///
/// let lazy_reveal = LazyReveal::with_js_config(gallery, &JsValue::UNDEFINED);
/// lazy_reveal.start();
/// ```
#[derive(Debug)]
pub struct LazyReveal(SharedController);
impl LazyReveal {
	#[must_use]
	#[instrument(skip(options))]
	pub fn new(root: Element, options: Options<Element>) -> Self {
		Self(Rc::new_cyclic(|controller| RefCell::new(Controller::new(WebHost::new(root, controller.clone()), options))))
	}

	/// Reads the intersection watcher options from an untyped `{ root, rootMargin, threshold }` object.
	///
	/// See [`ObserverConfig::from_js`].
	#[must_use]
	pub fn with_js_config(root: Element, config: &JsValue) -> Self {
		Self::new(
			root,
			Options {
				observer: ObserverConfig::from_js(config),
				..Options::default()
			},
		)
	}

	/// Call once the root element is attached.
	pub fn start(&self) {
		with_controller(&self.0, Controller::start);
	}

	/// Call before the root element is detached. Idempotent.
	pub fn stop(&self) {
		with_controller(&self.0, Controller::stop);
	}

	pub fn controller(&self) -> &RefCell<Controller<WebHost>> {
		&self.0
	}
}
impl Drop for LazyReveal {
	fn drop(&mut self) {
		self.stop();
	}
}

/// Starts and stops a [`LazyReveal`] from a [`lignin`] DOM binding's attach and detach notifications.
#[derive(Debug)]
pub struct LazyRevealBinding {
	options: Options<Element>,
	active: Option<LazyReveal>,
}
impl LazyRevealBinding {
	#[must_use]
	pub fn new(options: Options<Element>) -> Self {
		Self { options, active: None }
	}

	pub fn update(&mut self, dom_ref: DomRef<&Element>) {
		match dom_ref {
			DomRef::Added(element) => {
				if self.active.take().is_some() {
					warn!("Rebinding without prior removal. Stopped the previous instance.");
				}
				let lazy_reveal = LazyReveal::new(element.clone(), self.options.clone());
				lazy_reveal.start();
				self.active = Some(lazy_reveal);
			}
			DomRef::Removing(element) => match self.active.take() {
				Some(lazy_reveal) => drop(lazy_reveal),
				None => warn!("Unbinding {:?} that wasn't bound.", element),
			},
		}
	}

	#[must_use]
	pub fn active(&self) -> Option<&LazyReveal> {
		self.active.as_ref()
	}
}

fn with_controller(controller: &RefCell<Controller<WebHost>>, f: impl FnOnce(&mut Controller<WebHost>)) {
	match controller.try_borrow_mut() {
		Ok(mut controller) => f(&mut controller),
		Err(_) => error!("Re-entrant call into lazy-reveal controller ignored."),
	}
}

fn with_weak_controller(controller: &Weak<RefCell<Controller<WebHost>>>, f: impl FnOnce(&mut Controller<WebHost>)) {
	match controller.upgrade() {
		Some(controller) => with_controller(&controller, f),
		None => trace!("Controller dropped. Ignoring callback."),
	}
}

/// [`Host`] over a live `web_sys` DOM.
///
/// All callbacks are created once and kept alive until the host is dropped,
/// so that detaching from inside a callback never frees the running closure.
#[derive(Debug)]
pub struct WebHost {
	root: Element,
	window: Option<Window>,
	on_mutation: Closure<dyn FnMut(Array, MutationObserver)>,
	on_intersection: Closure<dyn FnMut(Array, IntersectionObserver)>,
	on_page_event: Closure<dyn FnMut(Event)>,
	mutation_observer: Option<MutationObserver>,
	intersection_observer: Option<IntersectionObserver>,
	listening: bool,
}

static DOCUMENT_EVENTS: [&str; 1] = ["DOMContentLoaded"];
static WINDOW_EVENTS: [&str; 3] = ["load", "resize", "scroll"];

impl WebHost {
	fn new(root: Element, controller: Weak<RefCell<Controller<WebHost>>>) -> Self {
		let on_mutation = {
			let controller = controller.clone();
			Closure::wrap(Box::new(move |records: Array, _: MutationObserver| {
				let span = trace_span!("on_mutation", records = records.length());
				let _enter = span.enter();
				with_weak_controller(&controller, Controller::on_mutations);
			}) as Box<dyn FnMut(Array, MutationObserver)>)
		};

		let on_intersection = {
			let controller = controller.clone();
			Closure::wrap(Box::new(move |entries: Array, _: IntersectionObserver| {
				let span = trace_span!("on_intersection", entries = entries.length());
				let _enter = span.enter();
				let events = entries
					.iter()
					.filter_map(|entry| match entry.dyn_into::<IntersectionObserverEntry>() {
						Ok(entry) => Some(IntersectionEvent {
							target: entry.target(),
							is_intersecting: entry.is_intersecting(),
						}),
						Err(entry) => {
							error!("Expected `IntersectionObserverEntry` but found {:?}.", entry);
							None
						}
					})
					.collect::<Vec<_>>();
				with_weak_controller(&controller, move |controller| controller.on_intersections(events));
			}) as Box<dyn FnMut(Array, IntersectionObserver)>)
		};

		let on_page_event = Closure::wrap(Box::new(move |event: Event| {
			let span = trace_span!("on_page_event", event = %event.type_());
			let _enter = span.enter();
			with_weak_controller(&controller, Controller::on_page_event);
		}) as Box<dyn FnMut(Event)>);

		Self {
			root,
			window: web_sys::window(),
			on_mutation,
			on_intersection,
			on_page_event,
			mutation_observer: None,
			intersection_observer: None,
			listening: false,
		}
	}

	pub fn root(&self) -> &Element {
		&self.root
	}

	fn page_targets(&self) -> Vec<(EventTarget, &'static [&'static str])> {
		let mut targets = Vec::with_capacity(2);
		if let Some(window) = &self.window {
			if let Some(document) = window.document() {
				targets.push((document.into(), &DOCUMENT_EVENTS[..]));
			}
			targets.push((window.clone().into(), &WINDOW_EVENTS[..]));
		}
		targets
	}
}

impl Host for WebHost {
	type Element = Element;
	type Error = JsValue;

	fn is_browser(&self) -> bool {
		self.window.as_ref().and_then(Window::document).is_some()
	}

	fn supports_intersection_watch(&self) -> bool {
		self.window.as_ref().map_or(false, |window| {
			Reflect::get(window, &JsValue::from_str("IntersectionObserver"))
				.map(|constructor| constructor.is_function())
				.unwrap_or(false)
		})
	}

	#[instrument(skip(self))]
	fn discover(&self, selector: &str) -> Result<Vec<Element>, JsValue> {
		let nodes = self.root.query_selector_all(selector)?;
		Ok((0..nodes.length()).filter_map(|i| nodes.get(i)).filter_map(|node| node.dyn_into::<Element>().ok()).collect())
	}

	fn contains(&self, element: &Element) -> bool {
		let node: &Node = element.as_ref();
		self.root.contains(Some(node))
	}

	fn viewport_size(&self) -> Option<(f64, f64)> {
		let window = self.window.as_ref()?;
		let dimension = |value: Result<JsValue, JsValue>| value.ok().and_then(|value| value.as_f64()).filter(|value| *value > 0.);
		match (dimension(window.inner_width()), dimension(window.inner_height())) {
			(Some(width), Some(height)) => Some((width, height)),
			_ => {
				let document_element = window.document()?.document_element()?;
				Some((f64::from(document_element.client_width()), f64::from(document_element.client_height())))
			}
		}
	}

	#[instrument(skip(self))]
	fn connect_mutation_watch(&mut self) -> Result<(), JsValue> {
		self.disconnect_mutation_watch();
		let observer = MutationObserver::new(self.on_mutation.as_ref().unchecked_ref())?;
		let options: MutationObserverInit = dictionary(&[
			("attributes", JsValue::TRUE),
			("characterData", JsValue::TRUE),
			("childList", JsValue::TRUE),
			("subtree", JsValue::TRUE),
		])?
		.unchecked_into();
		observer.observe_with_options(&self.root, &options)?;
		self.mutation_observer = Some(observer);
		Ok(())
	}

	fn disconnect_mutation_watch(&mut self) {
		if let Some(observer) = self.mutation_observer.take() {
			observer.disconnect();
			trace!("Disconnected mutation observer.");
		}
	}

	#[instrument(skip(self))]
	fn connect_intersection_watch(&mut self, config: &ObserverConfig<Element>) -> Result<(), JsValue> {
		self.disconnect_intersection_watch();
		let observer = IntersectionObserver::new_with_options(self.on_intersection.as_ref().unchecked_ref(), &config.to_js()?)?;
		self.intersection_observer = Some(observer);
		Ok(())
	}

	fn watch(&mut self, element: &Element) {
		match &self.intersection_observer {
			Some(observer) => observer.observe(element),
			None => error!("Tried to watch {:?} without an intersection observer.", element),
		}
	}

	fn unwatch(&mut self, element: &Element) {
		if let Some(observer) = &self.intersection_observer {
			observer.unobserve(element);
		}
	}

	fn disconnect_intersection_watch(&mut self) {
		if let Some(observer) = self.intersection_observer.take() {
			observer.disconnect();
			trace!("Disconnected intersection observer.");
		}
	}

	#[instrument(skip(self))]
	fn attach_page_listeners(&mut self) -> Result<(), JsValue> {
		if self.listening {
			debug!("Page listeners already attached.");
			return Ok(());
		}
		let options: AddEventListenerOptions = dictionary(&[("passive", JsValue::TRUE)])?.unchecked_into();
		// Set first, so that a partial attachment is still detached.
		self.listening = true;
		let listener = self.on_page_event.as_ref().unchecked_ref();
		for (target, events) in self.page_targets() {
			for event in events {
				target.add_event_listener_with_callback_and_add_event_listener_options(event, listener, &options)?;
			}
		}
		Ok(())
	}

	#[instrument(skip(self))]
	fn detach_page_listeners(&mut self) {
		if !self.listening {
			return trace!("Page listeners not attached.");
		}
		let listener = self.on_page_event.as_ref().unchecked_ref();
		for (target, events) in self.page_targets() {
			for event in events {
				if let Err(error) = target.remove_event_listener_with_callback(event, listener) {
					error!("Failed to remove {:?} listener: {:?}", event, error);
				}
			}
		}
		self.listening = false;
	}
}

impl Drop for WebHost {
	fn drop(&mut self) {
		self.disconnect_mutation_watch();
		self.disconnect_intersection_watch();
		self.detach_page_listeners();
	}
}

fn dictionary(entries: &[(&str, JsValue)]) -> Result<Object, JsValue> {
	let object = Object::new();
	for (key, value) in entries {
		Reflect::set(&object, &JsValue::from_str(key), value)?;
	}
	Ok(object)
}

impl ObserverConfig<Element> {
	/// Reads `{ root, rootMargin, threshold }` from an untyped configuration value.
	///
	/// Anything that isn't an object yields the default configuration.
	/// Unrecognised keys are ignored and malformed values fall back to the watcher's default for that key.
	#[must_use]
	pub fn from_js(value: &JsValue) -> Self {
		if !value.is_object() {
			debug!("Ignoring non-object intersection observer configuration {:?}.", value);
			return Self::default();
		}

		let get = |key: &str| Reflect::get(value, &JsValue::from_str(key)).ok().filter(|value| !value.is_undefined() && !value.is_null());

		Self {
			root: get("root").and_then(|root| match root.dyn_into::<Element>() {
				Ok(root) => Some(root),
				Err(root) => {
					debug!("Ignoring non-element `root` {:?}.", root);
					None
				}
			}),
			root_margin: get("rootMargin").and_then(|root_margin| root_margin.as_string()),
			threshold: get("threshold").and_then(|threshold| threshold_from_js(&threshold)),
		}
	}

	fn to_js(&self) -> Result<IntersectionObserverInit, JsValue> {
		let mut entries = Vec::with_capacity(3);
		if let Some(root) = &self.root {
			entries.push(("root", JsValue::from(root.clone())));
		}
		if let Some(root_margin) = &self.root_margin {
			entries.push(("rootMargin", JsValue::from_str(root_margin)));
		}
		match &self.threshold {
			Some(Threshold::Single(threshold)) => entries.push(("threshold", JsValue::from_f64(*threshold))),
			Some(Threshold::Multiple(thresholds)) => entries.push(("threshold", thresholds.iter().copied().map(JsValue::from_f64).collect::<Array>().into())),
			None => (),
		}
		Ok(dictionary(&entries)?.unchecked_into())
	}
}

fn threshold_from_js(value: &JsValue) -> Option<Threshold> {
	if let Some(threshold) = value.as_f64() {
		return Some(Threshold::Single(threshold));
	}
	if Array::is_array(value) {
		let thresholds = value.unchecked_ref::<Array>().iter().map(|threshold| threshold.as_f64()).collect::<Option<Vec<_>>>();
		if thresholds.is_none() {
			debug!("Ignoring `threshold` with non-numeric entries.");
		}
		return thresholds.map(Threshold::Multiple);
	}
	debug!("Ignoring malformed `threshold` {:?}.", value);
	None
}

impl RevealTarget for Element {
	type Error = JsValue;

	fn attribute(&self, name: &str) -> Option<String> {
		self.get_attribute(name)
	}

	fn assign_attribute(&self, name: &str, value: &str) -> Result<(), JsValue> {
		self.set_attribute(name, value)
	}

	fn unset_attribute(&self, name: &str) -> Result<(), JsValue> {
		self.remove_attribute(name)
	}

	fn assign_style(&self, property: &str, value: &str) -> Result<(), JsValue> {
		if let Some(html_element) = self.dyn_ref::<HtmlElement>() {
			html_element.style().set_property(property, value)
		} else if let Some(svg_element) = self.dyn_ref::<SvgElement>() {
			svg_element.style().set_property(property, value)
		} else {
			Err(JsValue::from_str("element has no inline style"))
		}
	}

	fn add_class(&self, class: &str) -> Result<(), JsValue> {
		self.class_list().add_1(class)
	}

	fn bounding_rect(&self) -> Rect {
		let rect = self.get_bounding_client_rect();
		Rect {
			top: rect.top(),
			left: rect.left(),
			bottom: rect.bottom(),
			right: rect.right(),
		}
	}
}
