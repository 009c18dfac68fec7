// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A small in-memory [`ElementTree`] for headless hosts and tests.
//!
//! [`ElementArena`] stores elements in a flat `Vec` with parent links, a
//! class list, a computed [`Position`], a layout rect in page space, and an
//! optional inline left/top offset. Selectors are plain class names.
//!
//! Geometry follows the usual CSS rules closely enough for dragging:
//!
//! - Static elements ignore their inline offset.
//! - Relative and sticky elements are shifted from their layout rect.
//! - Absolute elements are placed at their positioned ancestor's origin plus the offset.
//! - Fixed elements are placed at the viewport origin plus the offset.
//!
//! ```
//! use kurbo::{Point, Rect};
//! use understory_drag::arena::ElementArena;
//! use understory_drag::tree::{ElementTree, Position};
//!
//! let mut tree = ElementArena::new(Rect::new(0.0, 0.0, 800.0, 600.0));
//! let board = tree.insert(tree.body(), Rect::new(100.0, 100.0, 500.0, 500.0));
//! tree.set_position(board, Position::Relative);
//! let piece = tree.insert(board, Rect::new(150.0, 150.0, 200.0, 200.0));
//! tree.set_position(piece, Position::Absolute);
//!
//! tree.set_offset_position(piece, 10.0, 20.0);
//! assert_eq!(tree.bounding_rect(piece).origin(), Point::new(110.0, 120.0));
//! ```

use alloc::string::String;
use alloc::vec::Vec;

use kurbo::{Point, Rect, Vec2};

use crate::tree::{ElementTree, Position, positioned_ancestor};

/// Handle to an element in an [`ElementArena`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(u32);

impl ElementId {
    const fn idx(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Debug)]
struct Element {
    parent: Option<ElementId>,
    position: Position,
    rect: Rect,
    offset: Option<Vec2>,
    classes: Vec<String>,
}

impl Element {
    fn new(parent: Option<ElementId>, rect: Rect) -> Self {
        Self {
            parent,
            position: Position::Static,
            rect,
            offset: None,
            classes: Vec::new(),
        }
    }
}

/// Flat element storage implementing [`ElementTree`].
#[derive(Clone, Debug)]
pub struct ElementArena {
    elements: Vec<Element>,
}

const ROOT: ElementId = ElementId(0);
const BODY: ElementId = ElementId(1);

impl ElementArena {
    /// Creates a document root and a body, both covering `viewport`.
    #[must_use]
    pub fn new(viewport: Rect) -> Self {
        Self {
            elements: alloc::vec![
                Element::new(None, viewport),
                Element::new(Some(ROOT), viewport),
            ],
        }
    }

    /// The document root (parent of the body).
    #[must_use]
    pub fn root(&self) -> ElementId {
        ROOT
    }

    /// Inserts a static element under `parent` with layout rect `rect`.
    pub fn insert(&mut self, parent: ElementId, rect: Rect) -> ElementId {
        self.push(Element::new(Some(parent), rect))
    }

    /// Inserts an element with no parent.
    pub fn insert_detached(&mut self, rect: Rect) -> ElementId {
        self.push(Element::new(None, rect))
    }

    fn push(&mut self, element: Element) -> ElementId {
        let id = ElementId(u32::try_from(self.elements.len()).unwrap_or(u32::MAX));
        self.elements.push(element);
        id
    }

    /// Adds a class name to `id`. Duplicates are ignored.
    pub fn add_class(&mut self, id: ElementId, class: &str) {
        if let Some(el) = self.elements.get_mut(id.idx())
            && !el.classes.iter().any(|c| c == class)
        {
            el.classes.push(class.into());
        }
    }

    /// Removes a class name from `id`.
    pub fn remove_class(&mut self, id: ElementId, class: &str) {
        if let Some(el) = self.elements.get_mut(id.idx()) {
            el.classes.retain(|c| c != class);
        }
    }

    /// Returns `true` if `id` carries `class`.
    #[must_use]
    pub fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.elements
            .get(id.idx())
            .is_some_and(|el| el.classes.iter().any(|c| c == class))
    }

    /// Sets the computed positioning of `id`.
    pub fn set_position(&mut self, id: ElementId, position: Position) {
        if let Some(el) = self.elements.get_mut(id.idx()) {
            el.position = position;
        }
    }

    /// Replaces the layout rect of `id`.
    pub fn set_layout_rect(&mut self, id: ElementId, rect: Rect) {
        if let Some(el) = self.elements.get_mut(id.idx()) {
            el.rect = rect;
        }
    }

    /// Inline left/top offset of `id`, if one was set.
    #[must_use]
    pub fn offset_position(&self, id: ElementId) -> Option<Point> {
        self.elements
            .get(id.idx())
            .and_then(|el| el.offset)
            .map(Vec2::to_point)
    }
}

impl ElementTree for ElementArena {
    type Node = ElementId;
    type Selector = String;

    fn parent(&self, node: ElementId) -> Option<ElementId> {
        self.elements.get(node.idx()).and_then(|el| el.parent)
    }

    fn body(&self) -> ElementId {
        BODY
    }

    fn position(&self, node: ElementId) -> Position {
        self.elements
            .get(node.idx())
            .map_or(Position::Static, |el| el.position)
    }

    fn bounding_rect(&self, node: ElementId) -> Rect {
        let Some(el) = self.elements.get(node.idx()) else {
            return Rect::ZERO;
        };
        let Some(offset) = el.offset else {
            return el.rect;
        };
        let origin = match el.position {
            Position::Static => return el.rect,
            Position::Relative | Position::Sticky => el.rect.origin(),
            Position::Absolute => self
                .bounding_rect(positioned_ancestor(self, node))
                .origin(),
            Position::Fixed => self.bounding_rect(ROOT).origin(),
        };
        Rect::from_origin_size(origin + offset, el.rect.size())
    }

    fn matches(&self, node: ElementId, selector: &String) -> bool {
        self.has_class(node, selector)
    }

    fn set_offset_position(&mut self, node: ElementId, left: f64, top: f64) {
        if let Some(el) = self.elements.get_mut(node.idx()) {
            el.offset = Some(Vec2::new(left, top));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport() -> Rect {
        Rect::new(0.0, 0.0, 800.0, 600.0)
    }

    #[test]
    fn new_arena_has_root_and_body() {
        let tree = ElementArena::new(viewport());
        assert_eq!(tree.parent(tree.body()), Some(tree.root()));
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.bounding_rect(tree.body()), viewport());
    }

    #[test]
    fn classes_are_deduplicated_and_removable() {
        let mut tree = ElementArena::new(viewport());
        let el = tree.insert(tree.body(), Rect::ZERO);
        tree.add_class(el, "piece");
        tree.add_class(el, "piece");
        tree.add_class(el, "white");
        assert!(tree.matches(el, &"piece".into()));
        tree.remove_class(el, "piece");
        assert!(!tree.has_class(el, "piece"));
        assert!(tree.has_class(el, "white"));
    }

    #[test]
    fn static_elements_ignore_inline_offsets() {
        let mut tree = ElementArena::new(viewport());
        let el = tree.insert(tree.body(), Rect::new(5.0, 5.0, 15.0, 15.0));
        tree.set_offset_position(el, 100.0, 100.0);
        assert_eq!(tree.bounding_rect(el), Rect::new(5.0, 5.0, 15.0, 15.0));
        assert_eq!(tree.offset_position(el), Some(Point::new(100.0, 100.0)));
    }

    #[test]
    fn relative_elements_shift_from_layout() {
        let mut tree = ElementArena::new(viewport());
        let el = tree.insert(tree.body(), Rect::new(5.0, 5.0, 15.0, 15.0));
        tree.set_position(el, Position::Relative);
        tree.set_offset_position(el, 1.0, 2.0);
        assert_eq!(tree.bounding_rect(el), Rect::new(6.0, 7.0, 16.0, 17.0));
    }

    #[test]
    fn absolute_elements_follow_their_positioned_ancestor() {
        let mut tree = ElementArena::new(viewport());
        let board = tree.insert(tree.body(), Rect::new(50.0, 60.0, 450.0, 460.0));
        tree.set_position(board, Position::Relative);
        let piece = tree.insert(board, Rect::new(0.0, 0.0, 50.0, 50.0));
        tree.set_position(piece, Position::Absolute);
        tree.set_offset_position(piece, 100.0, 0.0);
        assert_eq!(
            tree.bounding_rect(piece),
            Rect::new(150.0, 60.0, 200.0, 110.0)
        );

        // Moving the board moves the piece with it.
        tree.set_layout_rect(board, Rect::new(0.0, 0.0, 400.0, 400.0));
        assert_eq!(tree.bounding_rect(piece).origin(), Point::new(100.0, 0.0));
    }
}
