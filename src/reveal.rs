//! Promotion of staging attributes on a single element.

use crate::staging::{self, LiveEffect, StagingAttribute};
use core::fmt::Debug;
use tracing::{error, instrument, trace};

/// The element operations a reveal needs.
///
/// Identity is [`PartialEq`]: two values are the same element iff they compare equal.
pub trait RevealTarget: Clone + PartialEq + Debug {
	type Error: Debug;

	fn attribute(&self, name: &str) -> Option<String>;
	fn assign_attribute(&self, name: &str, value: &str) -> Result<(), Self::Error>;
	fn unset_attribute(&self, name: &str) -> Result<(), Self::Error>;
	fn assign_style(&self, property: &str, value: &str) -> Result<(), Self::Error>;
	/// Adding a class that is already present must not duplicate it.
	fn add_class(&self, class: &str) -> Result<(), Self::Error>;
	/// The border box relative to the viewport.
	fn bounding_rect(&self) -> Rect;
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Rect {
	pub top: f64,
	pub left: f64,
	pub bottom: f64,
	pub right: f64,
}
impl Rect {
	/// Whether all four edges lie within `[0, width] × [0, height]`.
	#[must_use]
	pub fn is_within(&self, width: f64, height: f64) -> bool {
		self.top >= 0. && self.left >= 0. && self.bottom <= height && self.right <= width
	}
}

/// Applies the `data-placeholder-*` attributes of `target`. Returns how many were applied.
#[instrument]
pub fn apply_placeholders<T: RevealTarget>(target: &T) -> usize {
	apply(target, &staging::PLACEHOLDERS)
}

/// Applies the final staging attributes of `target`, marks it as revealed and adds `revealed_class`, if any.
///
/// Calling this again on the same element changes nothing, since each applied staging attribute is removed.
/// Returns how many staging attributes were applied.
#[instrument]
pub fn reveal<T: RevealTarget>(target: &T, revealed_class: Option<&str>) -> usize {
	let applied = apply(target, &staging::FINAL);
	if let Err(error) = target.assign_attribute(staging::REVEALED_MARKER, "") {
		error!("Could not mark as revealed: {:?}", error);
	}
	if let Some(class) = revealed_class {
		if let Err(error) = target.add_class(class) {
			error!("Could not add class {:?}: {:?}", class, error);
		}
	}
	applied
}

/// Whether [`reveal`] has run on `target`.
pub fn is_revealed<T: RevealTarget>(target: &T) -> bool {
	target.attribute(staging::REVEALED_MARKER).is_some()
}

fn apply<T: RevealTarget>(target: &T, mapping: &[StagingAttribute]) -> usize {
	mapping.iter().filter(|staging| promote(target, staging)).count()
}

fn promote<T: RevealTarget>(target: &T, &StagingAttribute { name, effect }: &StagingAttribute) -> bool {
	let value = match target.attribute(name) {
		Some(value) => value,
		None => return false,
	};

	if value.is_empty() {
		trace!("Dropping empty {:?}.", name);
		if let Err(error) = target.unset_attribute(name) {
			error!("Could not remove empty {:?}: {:?}", name, error);
		}
		return false;
	}

	if cfg!(feature = "dangerous-logging") {
		trace!("Promoting {:?}={:?} ({:?}).", name, value, effect);
	} else {
		trace!("Promoting {:?} ({:?}).", name, effect);
	}

	let written = match effect {
		LiveEffect::Attribute(live) => target.assign_attribute(live, &value),
		LiveEffect::BackgroundImage => target.assign_style(staging::BACKGROUND_IMAGE_PROPERTY, &staging::background_image(&value)),
	};
	if let Err(error) = written {
		// The staging attribute stays, so a later pass can retry.
		error!("Could not apply {:?} ({:?}): {:?}", name, effect, error);
		return false;
	}

	if let Err(error) = target.unset_attribute(name) {
		error!("Could not remove {:?} after applying it: {:?}", name, error);
	}
	true
}
