//! The fixed mapping from staging attributes to their live effects.

/// What promoting a staging attribute does to its element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveEffect {
	/// Sets the named attribute to the staged value.
	Attribute(&'static str),
	/// Sets the inline `background-image` style to `url(…)` of the staged value.
	BackgroundImage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingAttribute {
	pub name: &'static str,
	pub effect: LiveEffect,
}

/// Final URLs, in application order.
pub const FINAL: [StagingAttribute; 3] = [
	StagingAttribute {
		name: "data-src",
		effect: LiveEffect::Attribute("src"),
	},
	StagingAttribute {
		name: "data-srcset",
		effect: LiveEffect::Attribute("srcset"),
	},
	StagingAttribute {
		name: "data-background-src",
		effect: LiveEffect::BackgroundImage,
	},
];

/// Interim URLs shown until the element is revealed, in application order.
pub const PLACEHOLDERS: [StagingAttribute; 3] = [
	StagingAttribute {
		name: "data-placeholder-src",
		effect: LiveEffect::Attribute("src"),
	},
	StagingAttribute {
		name: "data-placeholder-srcset",
		effect: LiveEffect::Attribute("srcset"),
	},
	StagingAttribute {
		name: "data-placeholder-background-src",
		effect: LiveEffect::BackgroundImage,
	},
];

/// Class added to revealed elements unless configured otherwise.
pub const REVEALED_CLASS: &str = "lazy-load-images__loaded";

/// Set on each revealed element, so discovery can skip it without the controller holding on to it.
pub const REVEALED_MARKER: &str = "data-lazy-revealed";

pub const BACKGROUND_IMAGE_PROPERTY: &str = "background-image";

#[must_use]
pub fn background_image(url: &str) -> String {
	format!("url({})", url)
}

/// Which elements discovery picks up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
	/// `<img data-src>` and `[data-background-src]` only.
	Legacy,
	/// [`Legacy`](`Selector::Legacy`) plus `[data-srcset]`.
	Standard,
	/// [`Standard`](`Selector::Standard`) plus elements that carry only placeholder attributes.
	WithPlaceholders,
}
impl Default for Selector {
	fn default() -> Self {
		Self::Standard
	}
}
impl Selector {
	#[must_use]
	pub fn as_str(self) -> &'static str {
		match self {
			Selector::Legacy => "img[data-src], [data-background-src]",
			Selector::Standard => "img[data-src], [data-srcset], [data-background-src]",
			Selector::WithPlaceholders => {
				"img[data-src], [data-srcset], [data-background-src], \
				[data-placeholder-src], [data-placeholder-srcset], [data-placeholder-background-src]"
			}
		}
	}
}
