// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracking sessions: own the move/end listeners for exactly one gesture.
//!
//! ## Lifecycle
//!
//! 1) A gesture starts (`MouseDown` or `TouchStart`). The caller builds a
//!    [`TrackConfig`] from that event and calls [`start_tracking`].
//! 2) The session attaches, on the [`Host`], one move listener and one end
//!    listener for the event's [`InputFamily`]. Touch sessions also attach a
//!    non-passive `TouchStart` listener that prevents the default action, so
//!    page scrolling does not fight the drag.
//! 3) Every move event goes to the session's [`DragBehavior`].
//! 4) The end event goes to [`DragBehavior::on_end`], then to the drop
//!    callback; then the session detaches itself.
//! 5) [`Tracking::cancel`] detaches early. It removes exactly the listener
//!    handles the session attached, and is a no-op once the session is gone.
//!
//! Only one session should be live per gesture. Starting another without
//! cancelling the first is not detected: both keep receiving events.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::{Point, Rect};
//! use understory_drag::arena::ElementArena;
//! use understory_drag::event::{EventKind, PointerEvent};
//! use understory_drag::host::Host;
//! use understory_drag::session::{DragHandler, TrackConfig, start_tracking};
//! use understory_drag::tree::{ElementTree, Position};
//!
//! let mut tree = ElementArena::new(Rect::new(0.0, 0.0, 800.0, 600.0));
//! let piece = tree.insert(tree.body(), Rect::new(10.0, 10.0, 60.0, 60.0));
//! tree.set_position(piece, Position::Absolute);
//!
//! let host = Host::new();
//! let start = PointerEvent::mouse(EventKind::MouseDown, piece, Point::new(20.0, 20.0));
//! let tracking = start_tracking(
//!     &host,
//!     &tree,
//!     TrackConfig::new(start, DragHandler::move_to_pointer(), |_, _| {}),
//! );
//!
//! host.dispatch(&PointerEvent::mouse(EventKind::MouseMove, piece, Point::new(30.0, 25.0)), &mut tree);
//! assert_eq!(tree.bounding_rect(piece).origin(), Point::new(20.0, 15.0));
//!
//! host.dispatch(&PointerEvent::mouse(EventKind::MouseUp, piece, Point::new(30.0, 25.0)), &mut tree);
//! assert!(!tracking.is_active());
//! assert_eq!(host.total_listeners(), 0);
//! ```

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use kurbo::Vec2;

use crate::behavior::{DragBehavior, MoveToPointer};
use crate::event::{EventKind, InputFamily, PointerEvent};
use crate::host::{Host, Listener, ListenerOptions};
use crate::tree::ElementTree;

type DropCallback<N, C> = Box<dyn FnMut(&PointerEvent<N>, &mut C)>;
type BoxedBehavior<N, C> = Box<dyn DragBehavior<N, C>>;
type Resolver<N, C> = Box<dyn FnOnce(&PointerEvent<N>, Option<Vec2>, &C) -> BoxedBehavior<N, C>>;

enum HandlerKind<N, C> {
    Ready(BoxedBehavior<N, C>),
    Deferred(Resolver<N, C>),
}

/// How a session reacts to movement.
///
/// Either a custom [`DragBehavior`], or the default [`MoveToPointer`]
/// behavior, which is built when the session starts because it needs the
/// element tree and the start event.
pub struct DragHandler<N, C>(HandlerKind<N, C>);

impl<N, C> DragHandler<N, C> {
    /// Uses `behavior` for every move and end event.
    pub fn custom(behavior: impl DragBehavior<N, C> + 'static) -> Self {
        Self(HandlerKind::Ready(Box::new(behavior)))
    }

    fn resolve(
        self,
        start: &PointerEvent<N>,
        offset: Option<Vec2>,
        ctx: &C,
    ) -> BoxedBehavior<N, C> {
        match self.0 {
            HandlerKind::Ready(behavior) => behavior,
            HandlerKind::Deferred(resolve) => resolve(start, offset, ctx),
        }
    }
}

impl<N, C> DragHandler<N, C>
where
    N: Copy + Eq + fmt::Debug + 'static,
    C: ElementTree<Node = N> + 'static,
{
    /// Moves the event target with the pointer.
    #[must_use]
    pub fn move_to_pointer() -> Self {
        Self(HandlerKind::Deferred(Box::new(
            |start: &PointerEvent<N>, offset: Option<Vec2>, tree: &C| -> BoxedBehavior<N, C> {
                Box::new(MoveToPointer::new(tree, start, None, offset))
            },
        )))
    }

    /// Moves the closest ancestor of the event target matching `selector`
    /// with the pointer.
    #[must_use]
    pub fn closest(selector: C::Selector) -> Self
    where
        C::Selector: 'static,
    {
        Self(HandlerKind::Deferred(Box::new(
            move |start: &PointerEvent<N>, offset: Option<Vec2>, tree: &C| -> BoxedBehavior<N, C> {
                Box::new(MoveToPointer::new(tree, start, Some(&selector), offset))
            },
        )))
    }
}

impl<N, C> Default for DragHandler<N, C>
where
    N: Copy + Eq + fmt::Debug + 'static,
    C: ElementTree<Node = N> + 'static,
{
    fn default() -> Self {
        Self::move_to_pointer()
    }
}

impl<N, C> fmt::Debug for DragHandler<N, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.0 {
            HandlerKind::Ready(_) => "custom",
            HandlerKind::Deferred(_) => "move_to_pointer",
        };
        f.debug_tuple("DragHandler").field(&kind).finish()
    }
}

/// Everything [`start_tracking`] needs for one gesture.
pub struct TrackConfig<N, C> {
    start: PointerEvent<N>,
    drag: DragHandler<N, C>,
    on_drop: DropCallback<N, C>,
    offset: Option<Vec2>,
}

impl<N, C> TrackConfig<N, C> {
    /// Tracks the gesture begun by `start`, moving with `drag` and finishing with `on_drop`.
    pub fn new(
        start: PointerEvent<N>,
        drag: DragHandler<N, C>,
        on_drop: impl FnMut(&PointerEvent<N>, &mut C) + 'static,
    ) -> Self {
        Self {
            start,
            drag,
            on_drop: Box::new(on_drop),
            offset: None,
        }
    }

    /// Uses a precomputed grab offset instead of measuring one at start.
    #[must_use]
    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = Some(offset);
        self
    }

    /// The gesture-start event.
    #[must_use]
    pub fn start(&self) -> &PointerEvent<N> {
        &self.start
    }
}

impl<N: fmt::Debug, C> fmt::Debug for TrackConfig<N, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackConfig")
            .field("start", &self.start)
            .field("drag", &self.drag)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

struct SessionListeners<N, C> {
    on_move: Listener<N, C>,
    on_end: Listener<N, C>,
    suppress_scroll: Option<Listener<N, C>>,
}

struct SessionState<N, C> {
    host: Host<N, C>,
    family: InputFamily,
    listeners: RefCell<Option<SessionListeners<N, C>>>,
}

impl<N, C> SessionState<N, C> {
    fn detach(&self) -> bool {
        let Some(listeners) = self.listeners.borrow_mut().take() else {
            return false;
        };
        self.host
            .remove_listener(self.family.move_kind(), &listeners.on_move, false);
        self.host
            .remove_listener(self.family.end_kind(), &listeners.on_end, false);
        if let Some(suppress) = &listeners.suppress_scroll {
            self.host
                .remove_listener(EventKind::TouchStart, suppress, false);
        }
        log::debug!("{:?} tracking session detached", self.family);
        true
    }
}

/// Cancellation handle for a live tracking session.
///
/// Dropping the handle does not end the session; the session ends with the
/// gesture or with [`Tracking::cancel`].
pub struct Tracking<N, C> {
    state: Rc<SessionState<N, C>>,
}

impl<N, C> Tracking<N, C> {
    /// Detaches the session's listeners.
    ///
    /// Returns `true` if this call detached them, `false` if the session had
    /// already ended or been cancelled.
    pub fn cancel(&self) -> bool {
        self.state.detach()
    }

    /// Returns `true` while the session's listeners are attached.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state.listeners.borrow().is_some()
    }

    /// Input family the session tracks.
    #[must_use]
    pub fn family(&self) -> InputFamily {
        self.state.family
    }
}

impl<N, C> Clone for Tracking<N, C> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<N, C> fmt::Debug for Tracking<N, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracking")
            .field("family", &self.state.family)
            .field("active", &self.is_active())
            .finish()
    }
}

/// Starts tracking the gesture described by `config`.
///
/// `ctx` is only read, to build the default drag behavior.
pub fn start_tracking<N, C>(host: &Host<N, C>, ctx: &C, config: TrackConfig<N, C>) -> Tracking<N, C>
where
    N: 'static,
    C: 'static,
{
    let TrackConfig {
        start,
        drag,
        mut on_drop,
        offset,
    } = config;
    let family = start.family();
    let behavior = Rc::new(RefCell::new(drag.resolve(&start, offset, ctx)));

    let state = Rc::new(SessionState {
        host: host.clone(),
        family,
        listeners: RefCell::new(None),
    });

    let on_move = {
        let behavior = Rc::clone(&behavior);
        Listener::new(move |event: &PointerEvent<N>, ctx: &mut C| {
            if let Ok(mut behavior) = behavior.try_borrow_mut() {
                behavior.on_move(event, ctx);
            }
        })
    };
    let on_end = {
        // Strong reference: the session outlives its handle until the gesture
        // ends. `detach` drops the listeners, which breaks the cycle.
        let state = Rc::clone(&state);
        Listener::new(move |event: &PointerEvent<N>, ctx: &mut C| {
            if let Ok(mut behavior) = behavior.try_borrow_mut() {
                behavior.on_end(event, ctx);
            }
            on_drop(event, ctx);
            state.detach();
        })
    };
    let suppress_scroll = (family == InputFamily::Touch).then(|| {
        Listener::new(|event: &PointerEvent<N>, _: &mut C| event.prevent_default())
    });

    host.add_listener(family.move_kind(), &on_move, ListenerOptions::ACTIVE);
    host.add_listener(family.end_kind(), &on_end, ListenerOptions::ACTIVE);
    if let Some(suppress) = &suppress_scroll {
        host.add_listener(EventKind::TouchStart, suppress, ListenerOptions::ACTIVE);
    }
    *state.listeners.borrow_mut() = Some(SessionListeners {
        on_move,
        on_end,
        suppress_scroll,
    });
    log::debug!("{family:?} tracking session started");

    Tracking { state }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{ElementArena, ElementId};
    use crate::event::TouchPoint;
    use crate::tree::Position;
    use alloc::string::String;
    use alloc::vec;
    use alloc::vec::Vec;
    use kurbo::{Point, Rect};

    fn setup() -> (Host<ElementId, ElementArena>, ElementArena, ElementId) {
        let mut tree = ElementArena::new(Rect::new(0.0, 0.0, 800.0, 800.0));
        let piece = tree.insert(tree.body(), Rect::new(100.0, 100.0, 150.0, 150.0));
        tree.set_position(piece, Position::Absolute);
        tree.add_class(piece, "piece");
        (Host::new(), tree, piece)
    }

    fn mouse(kind: EventKind, target: ElementId, x: f64, y: f64) -> PointerEvent<ElementId> {
        PointerEvent::mouse(kind, target, Point::new(x, y))
    }

    fn touch(kind: EventKind, target: ElementId, x: f64, y: f64) -> PointerEvent<ElementId> {
        PointerEvent::touch(kind, target, [TouchPoint::new(0, Point::new(x, y))])
    }

    fn noop_drop() -> impl FnMut(&PointerEvent<ElementId>, &mut ElementArena) + 'static {
        |_, _| {}
    }

    #[test]
    fn mouse_session_attaches_one_move_and_one_end_listener() {
        let (host, tree, piece) = setup();
        let start = mouse(EventKind::MouseDown, piece, 110.0, 110.0);
        let tracking = start_tracking(
            &host,
            &tree,
            TrackConfig::new(start, DragHandler::move_to_pointer(), noop_drop()),
        );

        assert_eq!(tracking.family(), InputFamily::Mouse);
        assert_eq!(host.listener_count(EventKind::MouseMove), 1);
        assert_eq!(host.listener_count(EventKind::MouseUp), 1);
        assert_eq!(host.listener_count(EventKind::TouchStart), 0);
        assert_eq!(host.total_listeners(), 2);
    }

    #[test]
    fn touch_session_adds_non_passive_scroll_suppression() {
        let (host, mut tree, piece) = setup();
        let start = touch(EventKind::TouchStart, piece, 110.0, 110.0);
        let tracking = start_tracking(
            &host,
            &tree,
            TrackConfig::new(start, DragHandler::move_to_pointer(), noop_drop()),
        );

        assert_eq!(tracking.family(), InputFamily::Touch);
        assert_eq!(host.listener_count(EventKind::TouchMove), 1);
        assert_eq!(host.listener_count(EventKind::TouchEnd), 1);
        assert_eq!(host.listener_count(EventKind::TouchStart), 1);

        let second_finger = touch(EventKind::TouchStart, piece, 300.0, 300.0);
        assert!(!host.dispatch(&second_finger, &mut tree));

        tracking.cancel();
        assert_eq!(host.total_listeners(), 0);
        let later = touch(EventKind::TouchStart, piece, 300.0, 300.0);
        assert!(host.dispatch(&later, &mut tree));
    }

    #[test]
    fn cancel_removes_only_session_listeners_and_is_idempotent() {
        let (host, tree, piece) = setup();
        let bystander = Listener::new(|_: &PointerEvent<ElementId>, _: &mut ElementArena| {});
        host.add_listener(EventKind::MouseMove, &bystander, ListenerOptions::ACTIVE);

        let tracking = start_tracking(
            &host,
            &tree,
            TrackConfig::new(
                mouse(EventKind::MouseDown, piece, 110.0, 110.0),
                DragHandler::move_to_pointer(),
                noop_drop(),
            ),
        );
        assert_eq!(host.total_listeners(), 3);

        assert!(tracking.cancel());
        assert_eq!(host.total_listeners(), 1);
        assert_eq!(host.listener_count(EventKind::MouseMove), 1);

        assert!(!tracking.cancel());
        assert!(!tracking.clone().cancel());
        assert_eq!(host.total_listeners(), 1);
    }

    #[test]
    fn no_move_reaches_the_behavior_after_cancel() {
        let (host, mut tree, piece) = setup();
        let moves = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&moves);
        let tracking = start_tracking(
            &host,
            &tree,
            TrackConfig::new(
                mouse(EventKind::MouseDown, piece, 0.0, 0.0),
                DragHandler::custom(move |ev: &PointerEvent<ElementId>, _: &mut ElementArena| {
                    seen.borrow_mut().extend(ev.page);
                }),
                noop_drop(),
            ),
        );

        host.dispatch(&mouse(EventKind::MouseMove, piece, 1.0, 1.0), &mut tree);
        tracking.cancel();
        host.dispatch(&mouse(EventKind::MouseMove, piece, 2.0, 2.0), &mut tree);
        assert_eq!(*moves.borrow(), vec![Point::new(1.0, 1.0)]);
    }

    #[test]
    fn end_runs_behavior_end_then_drop_then_detaches() {
        struct Recorder(Rc<RefCell<Vec<&'static str>>>);
        impl DragBehavior<ElementId, ElementArena> for Recorder {
            fn on_move(&mut self, _: &PointerEvent<ElementId>, _: &mut ElementArena) {
                self.0.borrow_mut().push("move");
            }
            fn on_end(&mut self, _: &PointerEvent<ElementId>, _: &mut ElementArena) {
                self.0.borrow_mut().push("end");
            }
        }

        let (host, mut tree, piece) = setup();
        let log = Rc::new(RefCell::new(Vec::new()));
        let drop_log = Rc::clone(&log);
        let tracking = start_tracking(
            &host,
            &tree,
            TrackConfig::new(
                mouse(EventKind::MouseDown, piece, 0.0, 0.0),
                DragHandler::custom(Recorder(Rc::clone(&log))),
                move |_, _| drop_log.borrow_mut().push("drop"),
            ),
        );

        host.dispatch(&mouse(EventKind::MouseMove, piece, 1.0, 1.0), &mut tree);
        host.dispatch(&mouse(EventKind::MouseUp, piece, 1.0, 1.0), &mut tree);
        host.dispatch(&mouse(EventKind::MouseMove, piece, 2.0, 2.0), &mut tree);
        host.dispatch(&mouse(EventKind::MouseUp, piece, 2.0, 2.0), &mut tree);

        assert_eq!(*log.borrow(), vec!["move", "end", "drop"]);
        assert!(!tracking.is_active());
        assert_eq!(host.total_listeners(), 0);
        // Cancelling after the gesture ended is harmless.
        assert!(!tracking.cancel());
    }

    #[test]
    fn drop_callback_may_cancel_its_own_session() {
        let (host, mut tree, piece) = setup();
        let slot: Rc<RefCell<Option<Tracking<ElementId, ElementArena>>>> =
            Rc::new(RefCell::new(None));
        let from_drop = Rc::clone(&slot);
        let tracking = start_tracking(
            &host,
            &tree,
            TrackConfig::new(
                mouse(EventKind::MouseDown, piece, 0.0, 0.0),
                DragHandler::move_to_pointer(),
                move |_, _| {
                    if let Some(t) = from_drop.borrow().as_ref() {
                        assert!(t.cancel());
                    }
                },
            ),
        );
        *slot.borrow_mut() = Some(tracking.clone());

        host.dispatch(&mouse(EventKind::MouseUp, piece, 0.0, 0.0), &mut tree);
        assert!(!tracking.is_active());
        assert_eq!(host.total_listeners(), 0);
        slot.borrow_mut().take();
    }

    #[test]
    fn mouse_end_kind_does_not_end_touch_session() {
        let (host, mut tree, piece) = setup();
        let tracking = start_tracking(
            &host,
            &tree,
            TrackConfig::new(
                touch(EventKind::TouchStart, piece, 110.0, 110.0),
                DragHandler::move_to_pointer(),
                noop_drop(),
            ),
        );
        host.dispatch(&mouse(EventKind::MouseUp, piece, 0.0, 0.0), &mut tree);
        assert!(tracking.is_active());
        host.dispatch(&PointerEvent::bare(EventKind::TouchEnd, piece), &mut tree);
        assert!(!tracking.is_active());
    }

    #[test]
    fn closest_handler_drags_the_matching_ancestor() {
        let (host, mut tree, piece) = setup();
        let glyph = tree.insert(piece, Rect::new(110.0, 110.0, 140.0, 140.0));
        start_tracking(
            &host,
            &tree,
            TrackConfig::new(
                mouse(EventKind::MouseDown, glyph, 120.0, 120.0),
                DragHandler::closest(String::from("piece")),
                noop_drop(),
            ),
        );
        host.dispatch(&mouse(EventKind::MouseMove, glyph, 130.0, 125.0), &mut tree);
        assert_eq!(tree.bounding_rect(piece).origin(), Point::new(110.0, 105.0));
        assert_eq!(tree.offset_position(glyph), None);
    }

    #[test]
    fn supplied_offset_overrides_measurement() {
        let (host, mut tree, piece) = setup();
        let config = TrackConfig::new(
            mouse(EventKind::MouseDown, piece, 110.0, 110.0),
            DragHandler::default(),
            noop_drop(),
        )
        .with_offset(Vec2::new(-25.0, -25.0));
        assert_eq!(config.start().target, piece);
        assert_eq!(config.start().page, Some(Point::new(110.0, 110.0)));
        start_tracking(&host, &tree, config);
        host.dispatch(&mouse(EventKind::MouseMove, piece, 200.0, 200.0), &mut tree);
        assert_eq!(tree.offset_position(piece), Some(Point::new(175.0, 175.0)));
    }
}
