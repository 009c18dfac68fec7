// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Element tree seam and positioned-ancestor resolution.
//!
//! The tracker never owns elements. It reads parent links, computed
//! positioning and page-space bounds through [`ElementTree`], and writes the
//! inline left/top offset of the element being dragged.
//!
//! ## Positioned ancestors
//!
//! An absolutely positioned element's left/top are measured from its nearest
//! ancestor whose positioning is not [`Position::Static`]. When none exists
//! below the body, the body is the origin. [`positioned_ancestor`] computes
//! that origin so a drag offset can be expressed in the same space as the
//! element's left/top.

use core::fmt::Debug;

use kurbo::Rect;

/// Computed positioning scheme of an element.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Position {
    /// Normal flow; does not establish an offset origin.
    #[default]
    Static,
    /// Offset relative to its normal-flow position.
    Relative,
    /// Offset from the nearest positioned ancestor.
    Absolute,
    /// Offset from the viewport.
    Fixed,
    /// Flow position until a scroll threshold is crossed.
    Sticky,
}

impl Position {
    /// Returns `true` if descendants measure their offsets from this element.
    #[must_use]
    pub const fn is_positioned(self) -> bool {
        !matches!(self, Self::Static)
    }
}

/// Read access to an element hierarchy plus the one write the tracker performs.
pub trait ElementTree {
    /// Element handle.
    type Node: Copy + Eq + Debug;
    /// Selector used to find the element to drag from an event target.
    type Selector;

    /// Parent of `node`. `None` for the document root and detached elements.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// The top-level body element.
    fn body(&self) -> Self::Node;

    /// Computed positioning of `node`.
    fn position(&self, node: Self::Node) -> Position;

    /// Border box of `node` in page coordinates.
    fn bounding_rect(&self, node: Self::Node) -> Rect;

    /// Returns `true` if `node` matches `selector`.
    fn matches(&self, node: Self::Node, selector: &Self::Selector) -> bool;

    /// Sets the inline left/top offset of `node`, in pixels.
    fn set_offset_position(&mut self, node: Self::Node, left: f64, top: f64);

    /// Nearest inclusive ancestor of `node` matching `selector`.
    fn closest(&self, node: Self::Node, selector: &Self::Selector) -> Option<Self::Node> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.matches(n, selector) {
                return Some(n);
            }
            current = self.parent(n);
        }
        None
    }
}

/// Nearest ancestor of `node` that establishes an offset origin.
///
/// Walks up from the parent of `node`, stopping at the first element whose
/// [`Position`] is not static. Reaching the body returns the body, as does
/// running off a detached subtree. The document root is never returned.
pub fn positioned_ancestor<T: ElementTree + ?Sized>(tree: &T, node: T::Node) -> T::Node {
    let body = tree.body();
    let mut current = tree.parent(node);
    while let Some(n) = current {
        let parent = tree.parent(n);
        // Parentless: the document root, or the top of a detached subtree.
        if parent.is_none() {
            break;
        }
        if n == body || tree.position(n).is_positioned() {
            return n;
        }
        current = parent;
    }
    body
}
