#![allow(dead_code)]

use hashbrown::HashMap;
use lazy_reveal_dom::{
	config::ObserverConfig,
	host::Host,
	reveal::{Rect, RevealTarget},
};
use std::{
	cell::{Cell, RefCell},
	rc::Rc,
};

#[derive(Debug, Default)]
pub struct FakeNode {
	pub tag: String,
	pub attributes: RefCell<HashMap<String, String>>,
	pub style: RefCell<HashMap<String, String>>,
	pub classes: RefCell<Vec<String>>,
	pub rect: Cell<Rect>,
	pub read_only: Cell<bool>,
}

/// Compares by identity.
#[derive(Debug, Clone)]
pub struct FakeElement(pub Rc<FakeNode>);
impl PartialEq for FakeElement {
	fn eq(&self, other: &Self) -> bool {
		Rc::ptr_eq(&self.0, &other.0)
	}
}

pub type Snapshot = (Vec<(String, String)>, Vec<(String, String)>, Vec<String>);

impl FakeElement {
	pub fn new(tag: &str) -> Self {
		Self(Rc::new(FakeNode {
			tag: tag.to_owned(),
			..FakeNode::default()
		}))
	}

	pub fn with(self, name: &str, value: &str) -> Self {
		self.set(name, value);
		self
	}

	/// Places the element at `top`..`top + 100`, `0..100`.
	pub fn at(self, top: f64) -> Self {
		self.move_to(top);
		self
	}

	pub fn move_to(&self, top: f64) {
		self.0.rect.set(Rect {
			top,
			left: 0.,
			bottom: top + 100.,
			right: 100.,
		});
	}

	pub fn set(&self, name: &str, value: &str) {
		self.0.attributes.borrow_mut().insert(name.to_owned(), value.to_owned());
	}

	pub fn get(&self, name: &str) -> Option<String> {
		self.0.attributes.borrow().get(name).cloned()
	}

	pub fn style(&self, property: &str) -> Option<String> {
		self.0.style.borrow().get(property).cloned()
	}

	pub fn has_class(&self, class: &str) -> bool {
		self.0.classes.borrow().iter().any(|c| c == class)
	}

	pub fn snapshot(&self) -> Snapshot {
		let mut attributes = self.0.attributes.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect::<Vec<_>>();
		attributes.sort();
		let mut style = self.0.style.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect::<Vec<_>>();
		style.sort();
		(attributes, style, self.0.classes.borrow().clone())
	}

	fn matches(&self, selector: &str) -> bool {
		selector.split(',').map(str::trim).any(|part| {
			let (tag, rest) = part.split_at(part.find('[').unwrap_or(part.len()));
			let attribute = rest.trim_start_matches('[').trim_end_matches(']');
			(tag.is_empty() || tag == self.0.tag) && (attribute.is_empty() || self.0.attributes.borrow().contains_key(attribute))
		})
	}
}

impl RevealTarget for FakeElement {
	type Error = String;

	fn attribute(&self, name: &str) -> Option<String> {
		self.get(name)
	}

	fn assign_attribute(&self, name: &str, value: &str) -> Result<(), String> {
		if self.0.read_only.get() {
			return Err(format!("read-only: {}", name));
		}
		self.set(name, value);
		Ok(())
	}

	fn unset_attribute(&self, name: &str) -> Result<(), String> {
		self.0.attributes.borrow_mut().remove(name);
		Ok(())
	}

	fn assign_style(&self, property: &str, value: &str) -> Result<(), String> {
		if self.0.read_only.get() {
			return Err(format!("read-only: {}", property));
		}
		self.0.style.borrow_mut().insert(property.to_owned(), value.to_owned());
		Ok(())
	}

	fn add_class(&self, class: &str) -> Result<(), String> {
		if !self.has_class(class) {
			self.0.classes.borrow_mut().push(class.to_owned());
		}
		Ok(())
	}

	fn bounding_rect(&self) -> Rect {
		self.0.rect.get()
	}
}

#[derive(Debug)]
pub struct FakeHost {
	pub browser: bool,
	pub intersection_supported: bool,
	pub viewport: Option<(f64, f64)>,
	pub children: Vec<FakeElement>,

	pub mutation_connected: bool,
	pub intersection_connected: bool,
	pub intersection_config: Option<ObserverConfig<FakeElement>>,
	pub watching: Vec<FakeElement>,
	pub listening: bool,
	pub attach_count: usize,
	pub detach_count: usize,
}

impl FakeHost {
	pub fn new(children: Vec<FakeElement>) -> Self {
		Self {
			browser: true,
			intersection_supported: true,
			viewport: Some((800., 600.)),
			children,
			mutation_connected: false,
			intersection_connected: false,
			intersection_config: None,
			watching: Vec::new(),
			listening: false,
			attach_count: 0,
			detach_count: 0,
		}
	}

	pub fn without_intersection_watch(children: Vec<FakeElement>) -> Self {
		Self {
			intersection_supported: false,
			..Self::new(children)
		}
	}

	pub fn is_watching(&self, element: &FakeElement) -> bool {
		self.watching.contains(element)
	}
}

impl Host for FakeHost {
	type Element = FakeElement;
	type Error = String;

	fn is_browser(&self) -> bool {
		self.browser
	}

	fn supports_intersection_watch(&self) -> bool {
		self.intersection_supported
	}

	fn discover(&self, selector: &str) -> Result<Vec<FakeElement>, String> {
		Ok(self.children.iter().filter(|child| child.matches(selector)).cloned().collect())
	}

	fn contains(&self, element: &FakeElement) -> bool {
		self.children.contains(element)
	}

	fn viewport_size(&self) -> Option<(f64, f64)> {
		self.viewport
	}

	fn connect_mutation_watch(&mut self) -> Result<(), String> {
		self.mutation_connected = true;
		Ok(())
	}

	fn disconnect_mutation_watch(&mut self) {
		self.mutation_connected = false;
	}

	fn connect_intersection_watch(&mut self, config: &ObserverConfig<FakeElement>) -> Result<(), String> {
		if !self.intersection_supported {
			return Err("IntersectionObserver is not defined".to_owned());
		}
		self.intersection_connected = true;
		self.intersection_config = Some(config.clone());
		Ok(())
	}

	fn watch(&mut self, element: &FakeElement) {
		assert!(self.intersection_connected, "watch without intersection watcher");
		self.watching.push(element.clone());
	}

	fn unwatch(&mut self, element: &FakeElement) {
		self.watching.retain(|watched| watched != element);
	}

	fn disconnect_intersection_watch(&mut self) {
		self.intersection_connected = false;
		self.watching.clear();
	}

	fn attach_page_listeners(&mut self) -> Result<(), String> {
		assert!(!self.listening, "page listeners attached twice");
		self.listening = true;
		self.attach_count += 1;
		Ok(())
	}

	fn detach_page_listeners(&mut self) {
		if self.listening {
			self.listening = false;
			self.detach_count += 1;
		}
	}
}
