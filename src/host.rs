//! The page-side capabilities a [`Controller`](`crate::controller::Controller`) is driven through.

use crate::{config::ObserverConfig, reveal::RevealTarget};
use core::fmt::Debug;

/// Environment accessor and observation primitives for one root container.
///
/// Implementations deliver their callbacks back into the owning controller
/// ([`on_mutations`](`crate::controller::Controller::on_mutations`),
/// [`on_intersections`](`crate::controller::Controller::on_intersections`),
/// [`on_page_event`](`crate::controller::Controller::on_page_event`)),
/// and must not deliver any after the corresponding disconnect or detach.
pub trait Host {
	type Element: RevealTarget;
	type Error: Debug;

	fn is_browser(&self) -> bool;
	fn supports_intersection_watch(&self) -> bool;

	/// A fresh snapshot of the root container's descendants matching `selector`.
	fn discover(&self, selector: &str) -> Result<Vec<Self::Element>, Self::Error>;

	/// Whether `element` is still below the root container.
	fn contains(&self, element: &Self::Element) -> bool;

	/// `(width, height)` of the current viewport.
	fn viewport_size(&self) -> Option<(f64, f64)>;

	/// Watches attributes, character data and child lists of the whole root subtree.
	fn connect_mutation_watch(&mut self) -> Result<(), Self::Error>;
	fn disconnect_mutation_watch(&mut self);

	fn connect_intersection_watch(&mut self, config: &ObserverConfig<Self::Element>) -> Result<(), Self::Error>;
	fn watch(&mut self, element: &Self::Element);
	fn unwatch(&mut self, element: &Self::Element);
	fn disconnect_intersection_watch(&mut self);

	/// Attaches content-loaded, load, resize and scroll listeners.
	fn attach_page_listeners(&mut self) -> Result<(), Self::Error>;
	fn detach_page_listeners(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionEvent<E> {
	pub target: E,
	pub is_intersecting: bool,
}
