//! The lazy-reveal state machine.

use crate::{
	config::Options,
	host::{Host, IntersectionEvent},
	reveal::{self, RevealTarget},
};
use core::mem;
use tracing::{debug, error, info, instrument, trace, warn};

/// Owns the watch lifecycle of one root container.
///
/// Created idle. [`start`](`Controller::start`) selects [`ModeKind::PrimaryWatch`] if the host can watch intersections
/// and [`ModeKind::FallbackPoll`] otherwise. [`stop`](`Controller::stop`) releases everything the host holds for it.
#[derive(Debug)]
pub struct Controller<H: Host> {
	host: H,
	options: Options<H::Element>,
	mode: Mode<H::Element>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeKind {
	Idle,
	PrimaryWatch,
	FallbackPoll,
}

#[derive(Debug)]
enum Mode<E> {
	Idle,
	PrimaryWatch(WatchSet<E>),
	FallbackPoll(WatchSet<E>),
}

/// Elements currently watched, or pending when polling.
///
/// Holds each element at most once, and only while it's still found or still below the root container.
/// Revealed elements carry [`REVEALED_MARKER`](`crate::staging::REVEALED_MARKER`) and are never added again.
#[derive(Debug)]
struct WatchSet<E> {
	watched: Vec<E>,
}

struct Refresh<E> {
	added: Vec<E>,
	dropped: Vec<E>,
}

impl<E: RevealTarget> WatchSet<E> {
	fn new() -> Self {
		Self { watched: Vec::new() }
	}

	fn take(&mut self, element: &E) -> Option<E> {
		let index = self.watched.iter().position(|watched| watched == element)?;
		Some(self.watched.swap_remove(index))
	}

	/// Drops watched elements that are neither in `found` nor attached, then adds the unrevealed rest of `found`.
	fn refresh(&mut self, found: Vec<E>, is_attached: impl Fn(&E) -> bool) -> Refresh<E> {
		let (kept, dropped) = mem::take(&mut self.watched)
			.into_iter()
			.partition::<Vec<_>, _>(|watched| found.contains(watched) || is_attached(watched));
		self.watched = kept;

		let mut added = Vec::new();
		for element in found {
			if !reveal::is_revealed(&element) && !self.watched.contains(&element) && !added.contains(&element) {
				added.push(element);
			}
		}
		self.watched.extend(added.iter().cloned());
		Refresh { added, dropped }
	}
}

impl<H: Host> Controller<H> {
	/// Performs no I/O.
	#[must_use]
	pub fn new(host: H, options: Options<H::Element>) -> Self {
		Self { host, options, mode: Mode::Idle }
	}

	pub fn host(&self) -> &H {
		&self.host
	}

	pub fn host_mut(&mut self) -> &mut H {
		&mut self.host
	}

	pub fn options(&self) -> &Options<H::Element> {
		&self.options
	}

	#[must_use]
	pub fn mode(&self) -> ModeKind {
		match self.mode {
			Mode::Idle => ModeKind::Idle,
			Mode::PrimaryWatch(_) => ModeKind::PrimaryWatch,
			Mode::FallbackPoll(_) => ModeKind::FallbackPoll,
		}
	}

	/// Elements registered with the intersection watcher, or still pending while polling.
	#[must_use]
	pub fn watched(&self) -> &[H::Element] {
		match &self.mode {
			Mode::Idle => &[],
			Mode::PrimaryWatch(watch_set) | Mode::FallbackPoll(watch_set) => &watch_set.watched,
		}
	}

	#[instrument(skip(self))]
	pub fn start(&mut self) {
		if !matches!(self.mode, Mode::Idle) {
			return debug!("Already started.");
		}
		if !self.host.is_browser() {
			return debug!("Not a browser environment. Staying idle.");
		}

		if self.host.supports_intersection_watch() {
			match self.host.connect_intersection_watch(&self.options.observer) {
				Ok(()) => return self.start_primary(),
				Err(error) => error!("Could not create intersection watcher, polling instead: {:?}", error),
			}
		} else {
			warn!("Intersection watching is unavailable. Polling on page events instead.");
		}
		self.start_fallback();
	}

	fn start_primary(&mut self) {
		debug!("Entering primary watch.");
		self.mode = Mode::PrimaryWatch(WatchSet::new());
		if let Err(error) = self.host.connect_mutation_watch() {
			warn!("Could not watch for DOM mutations. Elements added later won't be found: {:?}", error);
		}
		self.on_mutations();
	}

	fn start_fallback(&mut self) {
		let mut watch_set = WatchSet::new();
		self.rescan(&mut watch_set);
		if watch_set.watched.is_empty() {
			return warn!("No lazily loaded elements found. Not listening for page events.");
		}

		if let Err(error) = self.host.attach_page_listeners() {
			error!("Could not attach page event listeners: {:?}", error);
			// Still try once, in case something is already visible.
		}
		debug!("Entering fallback poll with {} pending element(s).", watch_set.watched.len());
		self.mode = Mode::FallbackPoll(watch_set);
		self.on_page_event();
	}

	/// Stops all watching. Does nothing if not started.
	#[instrument(skip(self))]
	pub fn stop(&mut self) {
		match mem::replace(&mut self.mode, Mode::Idle) {
			Mode::Idle => trace!("Not started."),
			Mode::PrimaryWatch(watch_set) => {
				self.host.disconnect_mutation_watch();
				self.host.disconnect_intersection_watch();
				debug!("Stopped primary watch with {} unrevealed element(s).", watch_set.watched.len());
			}
			Mode::FallbackPoll(watch_set) => {
				self.host.detach_page_listeners();
				debug!("Stopped fallback poll with {} pending element(s).", watch_set.watched.len());
			}
		}
	}

	/// Re-runs discovery, watches elements not seen before and unwatches detached ones.
	#[instrument(skip(self))]
	pub fn on_mutations(&mut self) {
		let Self { host, options, mode } = self;
		let watch_set = match mode {
			Mode::PrimaryWatch(watch_set) => watch_set,
			Mode::Idle | Mode::FallbackPoll(_) => return trace!("Not watching. Ignoring mutations."),
		};

		let found = match host.discover(options.selector.as_str()) {
			Ok(found) => found,
			Err(error) => return error!("Discovery failed: {:?}", error),
		};
		if found.is_empty() {
			debug!("No lazily loaded elements found.");
		}

		let Refresh { added, dropped } = watch_set.refresh(found, |element| host.contains(element));
		for element in dropped {
			trace!("{:?} was detached. Unwatching.", element);
			host.unwatch(&element);
		}
		for element in added {
			reveal::apply_placeholders(&element);
			host.watch(&element);
			trace!("Watching {:?}.", element);
		}
	}

	/// Reveals and unwatches each intersecting, watched target. Other events are discarded.
	#[instrument(skip(self, events))]
	pub fn on_intersections(&mut self, events: impl IntoIterator<Item = IntersectionEvent<H::Element>>) {
		let Self { host, options, mode } = self;
		let watch_set = match mode {
			Mode::PrimaryWatch(watch_set) => watch_set,
			Mode::Idle | Mode::FallbackPoll(_) => return trace!("Not watching. Ignoring intersections."),
		};

		for IntersectionEvent { target, is_intersecting } in events {
			if !is_intersecting {
				continue;
			}
			let element = match watch_set.take(&target) {
				Some(element) => element,
				None => {
					trace!("Ignoring intersection of unwatched {:?}.", target);
					continue;
				}
			};
			reveal::reveal(&element, options.revealed_class.as_deref());
			host.unwatch(&element);
		}
	}

	/// Reveals each pending element that lies fully within the viewport, then re-runs discovery.
	///
	/// Detaches the page listeners and returns to idle once nothing is pending.
	#[instrument(skip(self))]
	pub fn on_page_event(&mut self) {
		let Self { host, options, mode } = self;
		let watch_set = match mode {
			Mode::FallbackPoll(watch_set) => watch_set,
			Mode::Idle | Mode::PrimaryWatch(_) => return trace!("Not polling. Ignoring page event."),
		};

		match host.viewport_size() {
			Some((width, height)) => {
				let revealed_class = options.revealed_class.as_deref();
				let (visible, pending) = mem::take(&mut watch_set.watched)
					.into_iter()
					.partition::<Vec<_>, _>(|element| element.bounding_rect().is_within(width, height));
				watch_set.watched = pending;
				for element in visible {
					reveal::reveal(&element, revealed_class);
				}
			}
			None => warn!("Viewport size unavailable. Skipping visibility check."),
		}

		let mut pending = mem::replace(watch_set, WatchSet::new());
		self.rescan(&mut pending);

		if pending.watched.is_empty() {
			self.host.detach_page_listeners();
			self.mode = Mode::Idle;
			info!("All lazily loaded elements revealed. Detached page listeners.");
		} else {
			self.mode = Mode::FallbackPoll(pending);
		}
	}

	fn rescan(&mut self, watch_set: &mut WatchSet<H::Element>) {
		let found = match self.host.discover(self.options.selector.as_str()) {
			Ok(found) => found,
			Err(error) => return error!("Discovery failed: {:?}", error),
		};
		let host = &self.host;
		let Refresh { added, dropped } = watch_set.refresh(found, |element| host.contains(element));
		if !dropped.is_empty() {
			trace!("Dropped {} detached pending element(s).", dropped.len());
		}
		for element in &added {
			reveal::apply_placeholders(element);
		}
	}
}
