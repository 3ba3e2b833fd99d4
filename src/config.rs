//! Construction-time options.
//!
//! For the untyped configuration object accepted by the browser binding, see
//! [`ObserverConfig::from_js`](`crate::config::ObserverConfig::from_js`).

use crate::staging::{Selector, REVEALED_CLASS};

/// Forwarded to the intersection watcher. [`None`] fields use the watcher's own defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ObserverConfig<E> {
	pub root: Option<E>,
	pub root_margin: Option<String>,
	pub threshold: Option<Threshold>,
}
impl<E> Default for ObserverConfig<E> {
	fn default() -> Self {
		Self {
			root: None,
			root_margin: None,
			threshold: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum Threshold {
	Single(f64),
	Multiple(Vec<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Options<E> {
	pub observer: ObserverConfig<E>,
	pub selector: Selector,
	/// Added to each element once it's revealed. Defaults to [`REVEALED_CLASS`].
	pub revealed_class: Option<String>,
}
impl<E> Default for Options<E> {
	fn default() -> Self {
		Self {
			observer: ObserverConfig::default(),
			selector: Selector::default(),
			revealed_class: Some(REVEALED_CLASS.to_owned()),
		}
	}
}
