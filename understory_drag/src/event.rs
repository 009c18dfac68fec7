// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Gesture input: event kinds, input families, and the pointer event payload.
//!
//! Mouse and touch hosts deliver structurally different events. Mouse events
//! carry one page coordinate; touch events carry a list of active touch points.
//! [`PointerEvent`] holds both shapes so the tracker can treat them uniformly,
//! and [`InputFamily`] maps a gesture-start kind to the move/end kinds that
//! belong to the same gesture.

use core::cell::Cell;

use kurbo::Point;
use smallvec::SmallVec;

/// The kinds of gesture input the tracker listens for.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Mouse button pressed.
    MouseDown,
    /// Mouse moved.
    MouseMove,
    /// Mouse button released.
    MouseUp,
    /// A touch point started.
    TouchStart,
    /// One or more touch points moved.
    TouchMove,
    /// A touch point ended.
    TouchEnd,
}

impl EventKind {
    /// The input family this kind belongs to.
    #[must_use]
    pub const fn family(self) -> InputFamily {
        match self {
            Self::TouchStart | Self::TouchMove | Self::TouchEnd => InputFamily::Touch,
            Self::MouseDown | Self::MouseMove | Self::MouseUp => InputFamily::Mouse,
        }
    }

    /// Returns `true` for the kinds that begin a gesture.
    #[must_use]
    pub const fn is_start(self) -> bool {
        matches!(self, Self::MouseDown | Self::TouchStart)
    }
}

/// Mouse-family or touch-family input.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InputFamily {
    /// `MouseDown` / `MouseMove` / `MouseUp`.
    Mouse,
    /// `TouchStart` / `TouchMove` / `TouchEnd`.
    Touch,
}

impl InputFamily {
    /// Kind that starts a gesture of this family.
    #[must_use]
    pub const fn start_kind(self) -> EventKind {
        match self {
            Self::Mouse => EventKind::MouseDown,
            Self::Touch => EventKind::TouchStart,
        }
    }

    /// Kind that reports movement for this family.
    #[must_use]
    pub const fn move_kind(self) -> EventKind {
        match self {
            Self::Mouse => EventKind::MouseMove,
            Self::Touch => EventKind::TouchMove,
        }
    }

    /// Kind that ends a gesture of this family.
    #[must_use]
    pub const fn end_kind(self) -> EventKind {
        match self {
            Self::Mouse => EventKind::MouseUp,
            Self::Touch => EventKind::TouchEnd,
        }
    }
}

/// One active touch point, in page coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TouchPoint {
    /// Host-assigned identifier, stable for the lifetime of the touch.
    pub id: u64,
    /// Page coordinate of the touch.
    pub page: Point,
}

impl TouchPoint {
    /// Creates a touch point.
    #[must_use]
    pub const fn new(id: u64, page: Point) -> Self {
        Self { id, page }
    }
}

/// A gesture event as delivered by the host.
///
/// `N` is the host's element handle type. `target` is the element the host
/// originally delivered the event to.
///
/// The default-prevented flag uses interior mutability so listeners, which
/// only see `&PointerEvent`, can call [`PointerEvent::prevent_default`].
#[derive(Clone, Debug)]
pub struct PointerEvent<N> {
    /// Event kind; used to pick the input family.
    pub kind: EventKind,
    /// Element the event was originally delivered to.
    pub target: N,
    /// Page coordinate of a mouse event. Touch events usually leave this empty.
    pub page: Option<Point>,
    /// Active touch points, first touch first.
    pub touches: SmallVec<[TouchPoint; 2]>,
    default_prevented: Cell<bool>,
    in_passive_listener: Cell<bool>,
}

impl<N> PointerEvent<N> {
    /// Creates a mouse-style event with a page coordinate.
    #[must_use]
    pub fn mouse(kind: EventKind, target: N, page: Point) -> Self {
        Self {
            kind,
            target,
            page: Some(page),
            touches: SmallVec::new(),
            default_prevented: Cell::new(false),
            in_passive_listener: Cell::new(false),
        }
    }

    /// Creates a touch-style event from its active touch points.
    #[must_use]
    pub fn touch(
        kind: EventKind,
        target: N,
        touches: impl IntoIterator<Item = TouchPoint>,
    ) -> Self {
        Self {
            kind,
            target,
            page: None,
            touches: touches.into_iter().collect(),
            default_prevented: Cell::new(false),
            in_passive_listener: Cell::new(false),
        }
    }

    /// Creates an event with neither a page coordinate nor touch points.
    ///
    /// Hosts deliver these for `TouchEnd` when the last finger lifts.
    #[must_use]
    pub fn bare(kind: EventKind, target: N) -> Self {
        Self {
            kind,
            target,
            page: None,
            touches: SmallVec::new(),
            default_prevented: Cell::new(false),
            in_passive_listener: Cell::new(false),
        }
    }

    /// Input family of this event.
    #[must_use]
    pub fn family(&self) -> InputFamily {
        self.kind.family()
    }

    /// Cancels the host's default action (for example page scrolling).
    ///
    /// Has no effect while a passive listener is running.
    pub fn prevent_default(&self) {
        if !self.in_passive_listener.get() {
            self.default_prevented.set(true);
        }
    }

    /// Returns `true` if a non-passive listener called [`PointerEvent::prevent_default`].
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub(crate) fn set_passive(&self, passive: bool) {
        self.in_passive_listener.set(passive);
    }
}
