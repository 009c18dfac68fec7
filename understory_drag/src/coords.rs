// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate extraction: one page point per event, whatever the input family.

use kurbo::Point;

use crate::event::PointerEvent;

/// Returns the page coordinate of `event`.
///
/// If the event carries active touch points, the first touch wins. Otherwise
/// the event's own page coordinate is used. Returns `None` only for events
/// that carry neither.
///
/// ```
/// use kurbo::Point;
/// use understory_drag::coords::page_point;
/// use understory_drag::event::{EventKind, PointerEvent, TouchPoint};
///
/// let mouse = PointerEvent::mouse(EventKind::MouseMove, 0_u32, Point::new(3.0, 4.0));
/// assert_eq!(page_point(&mouse), Some(Point::new(3.0, 4.0)));
///
/// let touch = PointerEvent::touch(
///     EventKind::TouchMove,
///     0_u32,
///     [TouchPoint::new(7, Point::new(10.0, 20.0)), TouchPoint::new(8, Point::new(0.0, 0.0))],
/// );
/// assert_eq!(page_point(&touch), Some(Point::new(10.0, 20.0)));
/// ```
#[must_use]
pub fn page_point<N>(event: &PointerEvent<N>) -> Option<Point> {
    match event.touches.first() {
        Some(touch) => Some(touch.page),
        None => event.page,
    }
}
