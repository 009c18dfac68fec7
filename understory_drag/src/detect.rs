// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Movement detection: tell a drag from a click.
//!
//! [`detect_movement`] races three outcomes for one gesture:
//!
//! - the pointer moves strictly farther than `threshold` from where the
//!   gesture started: resolves `Ok(point)` with the first point past it;
//! - the gesture ends first: resolves `Err(MovementRejected::ReleasedEarly)`;
//! - `timeout` ticks pass first: resolves `Err(MovementRejected::TimedOut)`.
//!
//! The result is a [`MovementDetection`] future that settles exactly once.
//! Whichever outcome wins, settlement cancels the internal tracking session
//! and clears the timeout before the result is sent, so a settled detector
//! never holds listeners or timers. Dropping an unsettled detection aborts it
//! the same way.
//!
//! Distances are compared squared, so no square root is taken per move.
//!
//! ## Minimal example
//!
//! ```
//! use futures::FutureExt;
//! use kurbo::Point;
//! use understory_drag::detect::{MovementConfig, MovementRejected, detect_movement};
//! use understory_drag::event::{EventKind, PointerEvent};
//! use understory_drag::host::Host;
//!
//! let host: Host<u32, ()> = Host::new();
//! let down = PointerEvent::mouse(EventKind::MouseDown, 1, Point::new(0.0, 0.0));
//!
//! // A press that is released without moving is a click.
//! let mut detection = detect_movement(&host, &(), &down, MovementConfig::new(5.0));
//! host.dispatch(&PointerEvent::mouse(EventKind::MouseUp, 1, Point::ZERO), &mut ());
//! assert_eq!((&mut detection).now_or_never(), Some(Err(MovementRejected::ReleasedEarly)));
//!
//! // A press that travels past the threshold is a drag.
//! let mut detection = detect_movement(&host, &(), &down, MovementConfig::new(5.0));
//! host.dispatch(&PointerEvent::mouse(EventKind::MouseMove, 1, Point::new(3.0, 4.0)), &mut ());
//! assert!(!detection.is_settled());
//! host.dispatch(&PointerEvent::mouse(EventKind::MouseMove, 1, Point::new(4.0, 4.0)), &mut ());
//! assert_eq!((&mut detection).now_or_never(), Some(Ok(Point::new(4.0, 4.0))));
//! assert_eq!(host.total_listeners(), 0);
//! ```

use alloc::rc::Rc;
use core::cell::{Cell, RefCell};
use core::fmt;
use core::future::Future;
use core::pin::Pin;
use core::task::{Context, Poll};

use futures_channel::oneshot;
use kurbo::Point;
use understory_timing::TimerId;

use crate::coords::page_point;
use crate::event::PointerEvent;
use crate::host::Host;
use crate::session::{DragHandler, TrackConfig, Tracking, start_tracking};

/// Timeout used by [`MovementConfig::new`], in host ticks.
pub const DEFAULT_TIMEOUT: u64 = 250;

/// Why a gesture was not classified as movement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MovementRejected {
    /// The gesture ended before the threshold was crossed.
    ReleasedEarly,
    /// The timeout elapsed before the threshold was crossed.
    TimedOut,
}

impl MovementRejected {
    /// Stable reason code: `"released-early"` or `"timed-out"`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ReleasedEarly => "released-early",
            Self::TimedOut => "timed-out",
        }
    }
}

impl fmt::Display for MovementRejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReleasedEarly => f.write_str("gesture released before the movement threshold"),
            Self::TimedOut => f.write_str("movement threshold not reached before the timeout"),
        }
    }
}

impl core::error::Error for MovementRejected {}

/// Outcome of a movement detection.
pub type MovementResult = Result<Point, MovementRejected>;

/// Threshold and timeout for [`detect_movement`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MovementConfig {
    /// Distance, in page units, the pointer must exceed.
    pub threshold: f64,
    /// Ticks to wait before giving up. `0` disables the timeout.
    pub timeout: u64,
}

impl MovementConfig {
    /// Detects movement past `threshold`, timing out after [`DEFAULT_TIMEOUT`] ticks.
    #[must_use]
    pub const fn new(threshold: f64) -> Self {
        Self {
            threshold,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the timeout. `0` disables it.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Waits for movement or release indefinitely.
    #[must_use]
    pub const fn without_timeout(self) -> Self {
        self.with_timeout(0)
    }
}

struct DetectState<N, C> {
    host: Host<N, C>,
    origin: Point,
    threshold_sq: f64,
    sender: RefCell<Option<oneshot::Sender<MovementResult>>>,
    session: RefCell<Option<Tracking<N, C>>>,
    timer: Cell<Option<TimerId>>,
}

impl<N, C> DetectState<N, C> {
    fn exceeds(&self, point: Point) -> bool {
        (point - self.origin).hypot2() > self.threshold_sq
    }

    /// Releases the session and timer, then sends `outcome` if nothing was sent yet.
    fn settle(&self, outcome: Option<MovementResult>) {
        let Some(sender) = self.sender.borrow_mut().take() else {
            return;
        };
        let session = self.session.borrow_mut().take();
        if let Some(session) = session {
            session.cancel();
        }
        if let Some(timer) = self.timer.take() {
            self.host.clear_timeout(timer);
        }
        match outcome {
            Some(outcome) => {
                log::debug!("movement detection settled: {outcome:?}");
                // The receiver may already be gone; nobody is left to tell.
                let _ = sender.send(outcome);
            }
            None => log::debug!("movement detection aborted"),
        }
    }
}

/// A pending movement detection. Resolves once; see the [module docs](self).
#[must_use = "dropping a MovementDetection aborts it"]
pub struct MovementDetection<N, C> {
    state: Rc<DetectState<N, C>>,
    receiver: oneshot::Receiver<MovementResult>,
    outcome: Option<MovementResult>,
}

impl<N, C> MovementDetection<N, C> {
    /// Returns `true` once an outcome has been produced.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.state.sender.borrow().is_none()
    }

    /// Page coordinate the displacement is measured from.
    #[must_use]
    pub fn origin(&self) -> Point {
        self.state.origin
    }
}

impl<N, C> Future for MovementDetection<N, C> {
    type Output = MovementResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if let Some(outcome) = self.outcome {
            return Poll::Ready(outcome);
        }
        let outcome = match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => outcome,
            // Only `settle(None)` drops the sender unsent, and it runs on drop.
            Poll::Ready(Err(oneshot::Canceled)) => Err(MovementRejected::ReleasedEarly),
            Poll::Pending => return Poll::Pending,
        };
        self.outcome = Some(outcome);
        Poll::Ready(outcome)
    }
}

impl<N, C> Drop for MovementDetection<N, C> {
    fn drop(&mut self) {
        self.state.settle(None);
    }
}

impl<N, C> fmt::Debug for MovementDetection<N, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MovementDetection")
            .field("origin", &self.state.origin)
            .field("settled", &self.is_settled())
            .finish_non_exhaustive()
    }
}

/// Starts classifying the gesture begun by `start` as movement or not.
///
/// `ctx` is passed through to the internal tracking session.
pub fn detect_movement<N, C>(
    host: &Host<N, C>,
    ctx: &C,
    start: &PointerEvent<N>,
    config: MovementConfig,
) -> MovementDetection<N, C>
where
    N: Clone + 'static,
    C: 'static,
{
    let origin = page_point(start).unwrap_or_else(|| {
        log::warn!("movement detection started without coordinates; measuring from the origin");
        Point::ZERO
    });
    let (sender, receiver) = oneshot::channel();
    let state = Rc::new(DetectState {
        host: host.clone(),
        origin,
        threshold_sq: config.threshold * config.threshold,
        sender: RefCell::new(Some(sender)),
        session: RefCell::new(None),
        timer: Cell::new(None),
    });

    let on_move = {
        let state = Rc::downgrade(&state);
        move |event: &PointerEvent<N>, _: &mut C| {
            let Some(state) = state.upgrade() else {
                return;
            };
            if let Some(point) = page_point(event)
                && state.exceeds(point)
            {
                state.settle(Some(Ok(point)));
            }
        }
    };
    let on_drop = {
        let state = Rc::downgrade(&state);
        move |_: &PointerEvent<N>, _: &mut C| {
            if let Some(state) = state.upgrade() {
                state.settle(Some(Err(MovementRejected::ReleasedEarly)));
            }
        }
    };
    let session = start_tracking(
        host,
        ctx,
        TrackConfig::new(start.clone(), DragHandler::custom(on_move), on_drop),
    );
    *state.session.borrow_mut() = Some(session);

    if config.timeout > 0 {
        let weak = Rc::downgrade(&state);
        let timer = host.set_timeout(config.timeout, move |_: &mut C| {
            if let Some(state) = weak.upgrade() {
                state.settle(Some(Err(MovementRejected::TimedOut)));
            }
        });
        state.timer.set(Some(timer));
    }

    MovementDetection {
        state,
        receiver,
        outcome: None,
    }
}
