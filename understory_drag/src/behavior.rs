// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drag behaviors: what happens to the world while a gesture moves.
//!
//! A tracking session forwards every move event to one [`DragBehavior`] and
//! tells it when the gesture ends. Closures with the right shape are
//! behaviors too, which covers one-off custom drag logic.
//!
//! [`MoveToPointer`] is the default: it keeps the dragged element under the
//! pointer, at the same spot the user grabbed it.
//!
//! ## Offsets
//!
//! The element's inline left/top are measured from its positioned ancestor
//! (see [`positioned_ancestor`]). At gesture start the offset is
//!
//! ```text
//! offset = (element.origin - ancestor.origin) - start_point
//! ```
//!
//! so that on every move `left/top = offset + pointer` reproduces the
//! element's starting position when the pointer has not moved, and keeps the
//! grab point fixed relative to the element afterwards.

use kurbo::{Point, Vec2};

use crate::coords::page_point;
use crate::event::PointerEvent;
use crate::tree::{ElementTree, positioned_ancestor};

/// Per-gesture drag logic.
///
/// `N` is the element handle, `C` the host context.
pub trait DragBehavior<N, C> {
    /// Called for every move event while the session is live.
    fn on_move(&mut self, event: &PointerEvent<N>, ctx: &mut C);

    /// Called once when the gesture ends, before the session's drop callback.
    fn on_end(&mut self, event: &PointerEvent<N>, ctx: &mut C) {
        let _ = (event, ctx);
    }
}

impl<N, C, F> DragBehavior<N, C> for F
where
    F: FnMut(&PointerEvent<N>, &mut C),
{
    fn on_move(&mut self, event: &PointerEvent<N>, ctx: &mut C) {
        self(event, ctx);
    }
}

/// Moves an element so it follows the pointer.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MoveToPointer<N> {
    target: N,
    offset: Vec2,
}

impl<N: Copy + Eq + core::fmt::Debug> MoveToPointer<N> {
    /// Resolves the element to drag and its offset from the gesture-start event.
    ///
    /// - With a `selector`, the element is the closest inclusive ancestor of the
    ///   event target that matches it; without a match, the target itself.
    /// - Without an `offset`, one is computed from the element's bounds
    ///   relative to its positioned ancestor and the start coordinate.
    pub fn new<T>(
        tree: &T,
        start: &PointerEvent<N>,
        selector: Option<&T::Selector>,
        offset: Option<Vec2>,
    ) -> Self
    where
        T: ElementTree<Node = N> + ?Sized,
    {
        let target = match selector {
            Some(selector) => tree.closest(start.target, selector).unwrap_or_else(|| {
                log::warn!(
                    "no ancestor of {:?} matches the drag selector; dragging the target itself",
                    start.target
                );
                start.target
            }),
            None => start.target,
        };
        let offset = offset.unwrap_or_else(|| grab_offset(tree, target, start));
        Self { target, offset }
    }

    /// Creates a behavior for a known element and offset.
    #[must_use]
    pub const fn with_offset(target: N, offset: Vec2) -> Self {
        Self { target, offset }
    }

    /// The element being moved.
    #[must_use]
    pub fn target(&self) -> N {
        self.target
    }

    /// Offset added to the pointer coordinate to get the element's left/top.
    #[must_use]
    pub fn offset(&self) -> Vec2 {
        self.offset
    }

    /// Left/top the element takes when the pointer is at `pointer`.
    #[must_use]
    pub fn position_for(&self, pointer: Point) -> Point {
        pointer + self.offset
    }
}

fn grab_offset<T>(tree: &T, target: T::Node, start: &PointerEvent<T::Node>) -> Vec2
where
    T: ElementTree + ?Sized,
{
    let anchor = positioned_ancestor(tree, target);
    let relative = tree.bounding_rect(target).origin() - tree.bounding_rect(anchor).origin();
    let start_point = page_point(start).unwrap_or_else(|| {
        log::warn!("gesture start without coordinates; measuring the offset from the origin");
        Point::ZERO
    });
    relative - start_point.to_vec2()
}

impl<N, C> DragBehavior<N, C> for MoveToPointer<N>
where
    N: Copy + Eq + core::fmt::Debug,
    C: ElementTree<Node = N>,
{
    fn on_move(&mut self, event: &PointerEvent<N>, ctx: &mut C) {
        let Some(pointer) = page_point(event) else {
            return;
        };
        let at = self.position_for(pointer);
        ctx.set_offset_position(self.target, at.x, at.y);
    }
}
