#![doc(html_root_url = "https://docs.rs/lazy-reveal-dom/0.0.1")]
#![warn(clippy::pedantic)]
//! Lazily reveals images inside a DOM subtree.
//!
//! Elements below a root container are marked up with *staging attributes* (`data-src`, `data-srcset`, `data-background-src`
//! and their `data-placeholder-*` variants). A [`Controller`](`controller::Controller`) discovers them, watches them for
//! viewport intersection and, on first intersection, promotes each staging attribute to its live counterpart.
//!
//! The browser binding lives in [`web`]. Everything else is independent of [`web_sys`] and talks to the page only through
//! the [`Host`](`host::Host`) and [`RevealTarget`](`reveal::RevealTarget`) traits.

pub use lignin;

#[cfg(doctest)]
pub mod readme {
	doc_comment::doctest!("../README.md");
}

pub mod config;
pub mod controller;
pub mod host;
pub mod reveal;
pub mod staging;
pub mod web;
