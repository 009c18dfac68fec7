// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_drag --heading-base-level=0

//! Understory Drag: pointer and touch drag tracking for UI runtimes.
//!
//! ## Overview
//!
//! This crate owns the listener lifecycle of a drag gesture. It does not read
//! platform input and it does not lay anything out. The embedder feeds
//! [`PointerEvent`](crate::event::PointerEvent)s into a [`Host`](crate::host::Host),
//! and exposes its element hierarchy through [`ElementTree`](crate::tree::ElementTree).
//!
//! ## Pieces
//!
//! - [`event`]: mouse and touch event kinds, input families, and the event payload.
//! - [`coords`]: the page coordinate of an event, whichever family it belongs to.
//! - [`host`]: listener registration, dispatch, and host-driven timers.
//! - [`tree`] and [`arena`]: the element tree seam, positioned-ancestor
//!   resolution, and an in-memory tree for headless use.
//! - [`behavior`]: the [`DragBehavior`](crate::behavior::DragBehavior) trait and
//!   the default [`MoveToPointer`](crate::behavior::MoveToPointer) behavior.
//! - [`session`]: one tracking session per gesture, with an idempotent cancel handle.
//! - [`detect`]: a future that tells a drag from a click.
//! - [`delegate`]: a single gesture-start listener for many draggable elements.
//! - [`remove`]: removing matching items from a list, for re-tagging elements.
//!
//! ## Workflow
//!
//! 1) Attach one [`delegate_gesture_start`](crate::delegate::delegate_gesture_start)
//!    listener for the draggable elements.
//! 2) On a gesture start, either start a session right away with
//!    [`start_tracking`](crate::session::start_tracking), or first await
//!    [`detect_movement`](crate::detect::detect_movement) and treat a rejection
//!    as a click.
//! 3) The session moves the element (or runs custom logic) on every move
//!    event, calls the drop callback when the gesture ends, and detaches.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use understory_drag::arena::ElementArena;
//! use understory_drag::event::{EventKind, PointerEvent, TouchPoint};
//! use understory_drag::host::Host;
//! use understory_drag::session::{DragHandler, TrackConfig, start_tracking};
//! use understory_drag::tree::{ElementTree, Position};
//!
//! let mut tree = ElementArena::new(Rect::new(0.0, 0.0, 400.0, 400.0));
//! let card = tree.insert(tree.body(), Rect::new(40.0, 40.0, 140.0, 90.0));
//! tree.set_position(card, Position::Absolute);
//!
//! let host = Host::new();
//! let finger = |x, y| [TouchPoint::new(1, Point::new(x, y))];
//! start_tracking(
//!     &host,
//!     &tree,
//!     TrackConfig::new(
//!         PointerEvent::touch(EventKind::TouchStart, card, finger(50.0, 50.0)),
//!         DragHandler::move_to_pointer(),
//!         |_, _| {},
//!     ),
//! );
//!
//! host.dispatch(&PointerEvent::touch(EventKind::TouchMove, card, finger(150.0, 60.0)), &mut tree);
//! assert_eq!(tree.bounding_rect(card).origin(), Point::new(140.0, 50.0));
//! host.dispatch(&PointerEvent::bare(EventKind::TouchEnd, card), &mut tree);
//! assert_eq!(host.total_listeners(), 0);
//! ```
//!
//! ## Features
//!
//! - `std` (default): forwards to `kurbo/std`.
//! - `libm`: forwards to `kurbo/libm` for `no_std` targets.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod arena;
pub mod behavior;
pub mod coords;
pub mod delegate;
pub mod detect;
pub mod event;
pub mod host;
pub mod remove;
pub mod session;
pub mod tree;
