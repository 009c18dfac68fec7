// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture-start delegation.
//!
//! Rather than attaching a listener to every draggable element, consumers
//! attach one [`delegate_gesture_start`] listener. It receives every
//! `MouseDown` and `TouchStart`, resolves the closest element matching a
//! selector from the event target, and hands both to the consumer, who
//! usually starts a tracking session or a movement detection from there.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use kurbo::{Point, Rect};
//! use understory_drag::arena::ElementArena;
//! use understory_drag::delegate::delegate_gesture_start;
//! use understory_drag::event::{EventKind, PointerEvent};
//! use understory_drag::host::Host;
//! use understory_drag::tree::ElementTree;
//!
//! let mut tree = ElementArena::new(Rect::new(0.0, 0.0, 800.0, 600.0));
//! let piece = tree.insert(tree.body(), Rect::new(0.0, 0.0, 50.0, 50.0));
//! tree.add_class(piece, "piece");
//! let glyph = tree.insert(piece, Rect::new(10.0, 10.0, 40.0, 40.0));
//!
//! let host: Host<_, ElementArena> = Host::new();
//! let grabbed = Rc::new(Cell::new(None));
//! let seen = Rc::clone(&grabbed);
//! let delegation = delegate_gesture_start(&host, "piece".to_string(), move |_, el, _| {
//!     seen.set(Some(el));
//! });
//!
//! host.dispatch(&PointerEvent::mouse(EventKind::MouseDown, glyph, Point::new(20.0, 20.0)), &mut tree);
//! assert_eq!(grabbed.get(), Some(piece));
//! assert!(delegation.detach());
//! ```

use alloc::rc::Rc;
use core::cell::Cell;
use core::fmt;

use crate::event::{EventKind, PointerEvent};
use crate::host::{Host, Listener, ListenerOptions};
use crate::tree::ElementTree;

const START_KINDS: [EventKind; 2] = [EventKind::MouseDown, EventKind::TouchStart];

/// Handle for a delegated gesture-start listener.
///
/// Dropping the handle leaves the listener attached.
pub struct Delegation<N, C> {
    host: Host<N, C>,
    listener: Listener<N, C>,
    attached: Rc<Cell<bool>>,
}

impl<N, C> Delegation<N, C> {
    /// Removes the listener from both gesture-start kinds.
    ///
    /// Returns `false` if it was already detached.
    pub fn detach(&self) -> bool {
        if !self.attached.replace(false) {
            return false;
        }
        for kind in START_KINDS {
            self.host.remove_listener(kind, &self.listener, false);
        }
        log::debug!("gesture-start delegation detached");
        true
    }

    /// Returns `true` while the listener is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.get()
    }
}

impl<N, C> fmt::Debug for Delegation<N, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delegation")
            .field("attached", &self.is_attached())
            .finish_non_exhaustive()
    }
}

/// Calls `handler` for gesture starts landing inside an element matching `selector`.
///
/// The handler receives the start event, the closest inclusive ancestor of
/// its target that matches, and the host context. Starts outside any match
/// are ignored.
pub fn delegate_gesture_start<N, C>(
    host: &Host<N, C>,
    selector: C::Selector,
    mut handler: impl FnMut(&PointerEvent<N>, N, &mut C) + 'static,
) -> Delegation<N, C>
where
    N: Copy + Eq + fmt::Debug + 'static,
    C: ElementTree<Node = N> + 'static,
    C::Selector: 'static,
{
    let listener = Listener::new(move |event: &PointerEvent<N>, ctx: &mut C| {
        match ctx.closest(event.target, &selector) {
            Some(element) => handler(event, element, ctx),
            None => log::trace!(
                "{:?} on {:?} outside delegated elements",
                event.kind,
                event.target
            ),
        }
    });
    for kind in START_KINDS {
        host.add_listener(kind, &listener, ListenerOptions::ACTIVE);
    }
    Delegation {
        host: host.clone(),
        listener,
        attached: Rc::new(Cell::new(true)),
    }
}
