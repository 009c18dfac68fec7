// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `understory_drag` crate.
//!
//! These drive whole gestures through a `Host` the way an embedder would:
//! delegated starts, click-versus-drag detection, and dragging pieces across
//! a board laid out in an `ElementArena`.

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use kurbo::{Point, Rect, Vec2};
use understory_drag::arena::{ElementArena, ElementId};
use understory_drag::delegate::delegate_gesture_start;
use understory_drag::detect::{MovementConfig, MovementDetection, MovementRejected, detect_movement};
use understory_drag::event::{EventKind, PointerEvent, TouchPoint};
use understory_drag::host::Host;
use understory_drag::remove::{Criterion, remove_from};
use understory_drag::session::{DragHandler, TrackConfig, start_tracking};
use understory_drag::tree::{ElementTree, Position};

type TestHost = Host<ElementId, ElementArena>;

struct Chess {
    tree: ElementArena,
    board: ElementId,
    knight: ElementId,
    glyph: ElementId,
}

fn chess() -> Chess {
    let mut tree = ElementArena::new(Rect::new(0.0, 0.0, 1024.0, 768.0));
    let board = tree.insert(tree.body(), Rect::new(100.0, 200.0, 500.0, 600.0));
    tree.set_position(board, Position::Relative);
    let knight = tree.insert(board, Rect::new(150.0, 250.0, 200.0, 300.0));
    tree.set_position(knight, Position::Absolute);
    tree.add_class(knight, "piece");
    let glyph = tree.insert(knight, Rect::new(155.0, 255.0, 195.0, 295.0));
    Chess {
        tree,
        board,
        knight,
        glyph,
    }
}

fn mouse(kind: EventKind, target: ElementId, x: f64, y: f64) -> PointerEvent<ElementId> {
    PointerEvent::mouse(kind, target, Point::new(x, y))
}

#[test]
fn element_keeps_grab_point_under_pointer_for_every_move() {
    let Chess {
        mut tree,
        knight,
        ..
    } = chess();
    let host = TestHost::new();
    let start = Point::new(170.0, 280.0);
    let origin = tree.bounding_rect(knight).origin();

    start_tracking(
        &host,
        &tree,
        TrackConfig::new(
            mouse(EventKind::MouseDown, knight, start.x, start.y),
            DragHandler::move_to_pointer(),
            |_, _| {},
        ),
    );

    for step in 0..25 {
        let step = f64::from(step);
        let pointer = Point::new(170.0 + step * 7.0, 280.0 - step * 3.0);
        host.dispatch(
            &mouse(EventKind::MouseMove, knight, pointer.x, pointer.y),
            &mut tree,
        );
        assert_eq!(
            tree.bounding_rect(knight).origin(),
            origin + (pointer - start)
        );
    }
}

#[test]
fn moving_the_pointer_back_restores_the_starting_position() {
    let Chess {
        mut tree,
        board,
        knight,
        ..
    } = chess();
    let host = TestHost::new();
    start_tracking(
        &host,
        &tree,
        TrackConfig::new(
            mouse(EventKind::MouseDown, knight, 170.0, 280.0),
            DragHandler::move_to_pointer(),
            |_, _| {},
        ),
    );
    host.dispatch(
        &mouse(EventKind::MouseMove, knight, 400.0, 400.0),
        &mut tree,
    );
    host.dispatch(
        &mouse(EventKind::MouseMove, knight, 170.0, 280.0),
        &mut tree,
    );
    // Left/top are expressed relative to the board, not the page.
    assert_eq!(tree.offset_position(knight), Some(Point::new(50.0, 50.0)));
    assert_eq!(
        tree.bounding_rect(knight).origin(),
        Point::new(150.0, 250.0)
    );
    assert_eq!(tree.bounding_rect(board).origin(), Point::new(100.0, 200.0));
}

#[test]
fn touch_drag_of_a_nested_glyph_moves_the_piece() {
    let Chess {
        mut tree,
        knight,
        glyph,
        ..
    } = chess();
    let host = TestHost::new();
    let touch = |kind, x, y| {
        PointerEvent::touch(kind, glyph, [TouchPoint::new(3, Point::new(x, y))])
    };

    let tracking = start_tracking(
        &host,
        &tree,
        TrackConfig::new(
            touch(EventKind::TouchStart, 160.0, 260.0),
            DragHandler::closest(String::from("piece")),
            |_, _| {},
        ),
    );
    assert_eq!(host.total_listeners(), 3);

    host.dispatch(&touch(EventKind::TouchMove, 210.0, 360.0), &mut tree);
    assert_eq!(
        tree.bounding_rect(knight).origin(),
        Point::new(200.0, 350.0)
    );
    assert_eq!(tree.offset_position(glyph), None);

    // A second finger landing mid-drag must not scroll the page.
    let second_finger = touch(EventKind::TouchStart, 10.0, 10.0);
    assert!(!host.dispatch(&second_finger, &mut tree));

    host.dispatch(&PointerEvent::bare(EventKind::TouchEnd, glyph), &mut tree);
    assert!(!tracking.is_active());
    assert_eq!(host.total_listeners(), 0);
}

#[test]
fn precomputed_offset_is_reused_across_sessions() {
    let Chess {
        mut tree,
        knight,
        ..
    } = chess();
    let host = TestHost::new();
    let offset = Vec2::new(-20.0, -30.0);

    for round in 0..3 {
        let x = 100.0 + f64::from(round) * 40.0;
        start_tracking(
            &host,
            &tree,
            TrackConfig::new(
                mouse(EventKind::MouseDown, knight, x, x),
                DragHandler::move_to_pointer(),
                |_, _| {},
            )
            .with_offset(offset),
        );
        host.dispatch(
            &mouse(EventKind::MouseMove, knight, x + 5.0, x + 5.0),
            &mut tree,
        );
        host.dispatch(
            &mouse(EventKind::MouseUp, knight, x + 5.0, x + 5.0),
            &mut tree,
        );
        assert_eq!(
            tree.offset_position(knight),
            Some(Point::new(x + 5.0 - 20.0, x + 5.0 - 30.0))
        );
    }
    assert_eq!(host.total_listeners(), 0);
}

/// What the consumer does with a gesture start.
#[derive(Default)]
struct Pending {
    start: Option<PointerEvent<ElementId>>,
    detection: Option<MovementDetection<ElementId, ElementArena>>,
}

fn click_or_drag(host: &TestHost, threshold: f64) -> Rc<RefCell<Pending>> {
    let pending = Rc::new(RefCell::new(Pending::default()));
    let slot = Rc::clone(&pending);
    let detect_on = host.clone();
    // The delegation stays attached for the host's lifetime.
    let _ = delegate_gesture_start(
        host,
        String::from("piece"),
        move |event: &PointerEvent<ElementId>, _, tree: &mut ElementArena| {
            let detection =
                detect_movement(&detect_on, &*tree, event, MovementConfig::new(threshold));
            let mut slot = slot.borrow_mut();
            slot.start = Some(event.clone());
            slot.detection = Some(detection);
        },
    );
    pending
}

#[test]
fn release_without_movement_is_a_click() {
    let Chess {
        mut tree,
        knight,
        glyph,
        ..
    } = chess();
    let host = TestHost::new();
    let pending = click_or_drag(&host, 4.0);

    host.dispatch(&mouse(EventKind::MouseDown, glyph, 170.0, 280.0), &mut tree);
    host.dispatch(&mouse(EventKind::MouseMove, glyph, 172.0, 281.0), &mut tree);
    host.dispatch(&mouse(EventKind::MouseUp, glyph, 172.0, 281.0), &mut tree);

    let detection = pending.borrow_mut().detection.take();
    let outcome = detection.and_then(FutureExt::now_or_never);
    assert_eq!(outcome, Some(Err(MovementRejected::ReleasedEarly)));
    // Clicks do not move anything.
    assert_eq!(tree.offset_position(knight), None);
    // Only the delegated start listeners remain.
    assert_eq!(host.total_listeners(), 2);
}

#[test]
fn movement_past_threshold_becomes_a_drag() {
    let Chess {
        mut tree,
        knight,
        glyph,
        ..
    } = chess();
    let host = TestHost::new();
    let pending = click_or_drag(&host, 4.0);

    host.dispatch(&mouse(EventKind::MouseDown, glyph, 170.0, 280.0), &mut tree);
    host.dispatch(&mouse(EventKind::MouseMove, glyph, 172.0, 282.0), &mut tree);
    host.dispatch(&mouse(EventKind::MouseMove, glyph, 175.0, 283.0), &mut tree);

    let (start, detection) = {
        let mut slot = pending.borrow_mut();
        (slot.start.take(), slot.detection.take())
    };
    let (Some(start), Some(mut detection)) = (start, detection) else {
        panic!("gesture start was not delegated");
    };
    assert_eq!(
        (&mut detection).now_or_never(),
        Some(Ok(Point::new(175.0, 283.0)))
    );
    assert_eq!(host.total_listeners(), 2);

    let tags = Rc::new(RefCell::new(vec!["piece", "selected", "hover", "selected"]));
    let drop_tags = Rc::clone(&tags);
    start_tracking(
        &host,
        &tree,
        TrackConfig::new(
            start,
            DragHandler::closest(String::from("piece")),
            move |_, _| {
                let stale =
                    Criterion::any_of([Criterion::Value("hover"), Criterion::Value("selected")]);
                let mut tags = drop_tags.borrow_mut();
                remove_from(&mut *tags, &stale, true);
                tags.push("moved");
            },
        ),
    );

    host.dispatch(&mouse(EventKind::MouseMove, glyph, 270.0, 380.0), &mut tree);
    assert_eq!(
        tree.bounding_rect(knight).origin(),
        Point::new(250.0, 350.0)
    );
    host.dispatch(&mouse(EventKind::MouseUp, glyph, 270.0, 380.0), &mut tree);

    assert_eq!(*tags.borrow(), ["piece", "moved"]);
    assert_eq!(host.total_listeners(), 2);
}

#[test]
fn holding_still_times_out() {
    let mut tree = ElementArena::new(Rect::new(0.0, 0.0, 100.0, 100.0));
    let target = tree.body();
    let host = TestHost::new();
    host.advance_to(1_000, &mut tree);

    let mut detection = detect_movement(
        &host,
        &tree,
        &mouse(EventKind::MouseDown, target, 50.0, 50.0),
        MovementConfig::new(10.0).with_timeout(100),
    );
    host.advance_by(99, &mut tree);
    assert!((&mut detection).now_or_never().is_none());
    host.advance_by(1, &mut tree);
    assert_eq!(host.now(), 1_100);
    assert_eq!(
        futures::executor::block_on(detection),
        Err(MovementRejected::TimedOut)
    );
    assert_eq!(host.total_listeners(), 0);
    assert_eq!(host.pending_timers(), 0);
}
