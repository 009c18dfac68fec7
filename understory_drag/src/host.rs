// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener host: the document-wide attachment point for gesture listeners, plus timers.
//!
//! A [`Host`] plays the part a page plays for browser code: listeners are
//! attached to it per [`EventKind`], the embedder feeds it input with
//! [`Host::dispatch`], and it runs deferred callbacks when the embedder moves
//! its clock forward with [`Host::advance_to`].
//!
//! ## Listener identity
//!
//! A [`Listener`] is a shared handle to one callback. Registrations are keyed
//! by `(kind, listener identity, capture)`: adding the same handle twice is a
//! no-op, and removal only succeeds with a clone of the handle that was
//! added. A new listener wrapping an identical closure is a different
//! listener.
//!
//! ## Dispatch rules
//!
//! - Capture listeners run before non-capture listeners; each group runs in
//!   registration order.
//! - The listener list is snapshotted when dispatch begins. Listeners added
//!   during dispatch see the next event; listeners removed during dispatch are
//!   skipped if they have not run yet.
//! - No host borrow is held while a listener runs, so listeners may add or
//!   remove listeners and timers.
//! - A listener that is already running (re-entrant dispatch) is skipped.
//! - [`PointerEvent::prevent_default`] is ignored inside passive listeners.
//!
//! ## Minimal example
//!
//! ```
//! use kurbo::Point;
//! use understory_drag::event::{EventKind, PointerEvent};
//! use understory_drag::host::{Host, Listener, ListenerOptions};
//!
//! let host: Host<u32, Vec<Point>> = Host::new();
//! let log_moves = Listener::new(|ev: &PointerEvent<u32>, seen: &mut Vec<Point>| {
//!     seen.extend(ev.page);
//! });
//! host.add_listener(EventKind::MouseMove, &log_moves, ListenerOptions::default());
//!
//! let mut seen = Vec::new();
//! host.dispatch(&PointerEvent::mouse(EventKind::MouseMove, 1, Point::new(2.0, 3.0)), &mut seen);
//! assert_eq!(seen, vec![Point::new(2.0, 3.0)]);
//!
//! assert!(host.remove_listener(EventKind::MouseMove, &log_moves, false));
//! assert_eq!(host.total_listeners(), 0);
//! ```

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;
use understory_timing::{TimerId, TimerQueue};

use crate::event::{EventKind, PointerEvent};

type Callback<N, C> = dyn FnMut(&PointerEvent<N>, &mut C);
type TimerCallback<C> = Box<dyn FnOnce(&mut C)>;

/// Options for a listener registration.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ListenerOptions {
    /// Run in the capture group, ahead of non-capture listeners.
    pub capture: bool,
    /// Promise not to cancel the default action; `prevent_default` is ignored.
    pub passive: bool,
}

impl ListenerOptions {
    /// Non-capturing, non-passive.
    pub const ACTIVE: Self = Self {
        capture: false,
        passive: false,
    };

    /// Non-capturing, passive.
    pub const PASSIVE: Self = Self {
        capture: false,
        passive: true,
    };
}

/// A shared, identity-compared handle to a listener callback.
///
/// Cloning the handle shares the callback and its identity.
pub struct Listener<N, C>(Rc<RefCell<Box<Callback<N, C>>>>);

impl<N, C> Listener<N, C> {
    /// Wraps a callback in a new listener identity.
    pub fn new(callback: impl FnMut(&PointerEvent<N>, &mut C) + 'static) -> Self {
        Self(Rc::new(RefCell::new(Box::new(callback))))
    }

    /// Returns `true` if both handles refer to the same listener.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<N, C> Clone for Listener<N, C> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<N, C> fmt::Debug for Listener<N, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Rc::as_ptr(&self.0))
            .finish()
    }
}

struct Registration<N, C> {
    listener: Listener<N, C>,
    options: ListenerOptions,
    live: Rc<Cell<bool>>,
}

struct HostState<N, C> {
    listeners: HashMap<EventKind, Vec<Registration<N, C>>>,
    timers: TimerQueue<TimerCallback<C>>,
    now: u64,
}

/// Document-wide listener registry and timer source.
///
/// `N` is the element handle type carried by events, `C` the context passed
/// to every listener and timer callback (typically the element tree).
///
/// `Host` is a cheap handle; clones share the same registry. It is
/// single-threaded by construction.
pub struct Host<N, C> {
    state: Rc<RefCell<HostState<N, C>>>,
}

impl<N, C> Clone for Host<N, C> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<N, C> Default for Host<N, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<N, C> fmt::Debug for Host<N, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Host")
            .field("now", &state.now)
            .field(
                "listeners",
                &state.listeners.values().map(Vec::len).sum::<usize>(),
            )
            .field("timers", &state.timers.len())
            .finish()
    }
}

impl<N, C> Host<N, C> {
    /// Creates a host with no listeners, no timers, and its clock at zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(HostState {
                listeners: HashMap::new(),
                timers: TimerQueue::new(),
                now: 0,
            })),
        }
    }

    /// Attaches `listener` for `kind`.
    ///
    /// Returns `false` (and changes nothing) if the same listener is already
    /// attached for `kind` with the same `capture` flag.
    pub fn add_listener(
        &self,
        kind: EventKind,
        listener: &Listener<N, C>,
        options: ListenerOptions,
    ) -> bool {
        let mut state = self.state.borrow_mut();
        let regs = state.listeners.entry(kind).or_default();
        if regs
            .iter()
            .any(|r| r.listener.ptr_eq(listener) && r.options.capture == options.capture)
        {
            return false;
        }
        regs.push(Registration {
            listener: listener.clone(),
            options,
            live: Rc::new(Cell::new(true)),
        });
        true
    }

    /// Detaches `listener` from `kind`.
    ///
    /// Returns `false` if no registration with this identity and `capture`
    /// flag exists.
    pub fn remove_listener(
        &self,
        kind: EventKind,
        listener: &Listener<N, C>,
        capture: bool,
    ) -> bool {
        let removed = {
            let mut state = self.state.borrow_mut();
            let Some(regs) = state.listeners.get_mut(&kind) else {
                return false;
            };
            let Some(index) = regs
                .iter()
                .position(|r| r.listener.ptr_eq(listener) && r.options.capture == capture)
            else {
                return false;
            };
            regs.remove(index)
        };
        removed.live.set(false);
        // `removed` drops here, after the borrow is released: the callback may
        // own values whose destructors call back into the host.
        true
    }

    /// Number of listeners attached for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.state.borrow().listeners.get(&kind).map_or(0, Vec::len)
    }

    /// Number of listeners attached across all kinds.
    #[must_use]
    pub fn total_listeners(&self) -> usize {
        self.state.borrow().listeners.values().map(Vec::len).sum()
    }

    /// Delivers `event` to the listeners attached for its kind.
    ///
    /// Returns `false` if a non-passive listener prevented the default action.
    pub fn dispatch(&self, event: &PointerEvent<N>, ctx: &mut C) -> bool {
        let snapshot: SmallVec<[(Listener<N, C>, bool, Rc<Cell<bool>>); 4]> = {
            let state = self.state.borrow();
            match state.listeners.get(&event.kind) {
                Some(regs) => regs
                    .iter()
                    .filter(|r| r.options.capture)
                    .chain(regs.iter().filter(|r| !r.options.capture))
                    .map(|r| (r.listener.clone(), r.options.passive, Rc::clone(&r.live)))
                    .collect(),
                None => SmallVec::new(),
            }
        };

        log::trace!(
            "dispatching {:?} to {} listener(s)",
            event.kind,
            snapshot.len()
        );

        for (listener, passive, live) in &snapshot {
            if !live.get() {
                continue;
            }
            let Ok(mut callback) = listener.0.try_borrow_mut() else {
                log::trace!("skipping re-entrant listener for {:?}", event.kind);
                continue;
            };
            event.set_passive(*passive);
            (&mut **callback)(event, ctx);
            event.set_passive(false);
        }

        !event.default_prevented()
    }

    /// Current host time in ticks.
    #[must_use]
    pub fn now(&self) -> u64 {
        self.state.borrow().now
    }

    /// Schedules `callback` to run `delay` ticks from now.
    pub fn set_timeout(&self, delay: u64, callback: impl FnOnce(&mut C) + 'static) -> TimerId {
        let mut state = self.state.borrow_mut();
        let deadline = state.now.saturating_add(delay);
        state.timers.schedule(deadline, Box::new(callback))
    }

    /// Cancels a pending timeout. Returns `false` if it already ran or was cleared.
    pub fn clear_timeout(&self, id: TimerId) -> bool {
        let cancelled = self.state.borrow_mut().timers.cancel(id);
        cancelled.is_some()
    }

    /// Number of pending timeouts.
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.state.borrow().timers.len()
    }

    /// Moves the clock forward to `now`, running every timeout that becomes due.
    ///
    /// Timeouts run in deadline order; while one runs, [`Host::now`] reports its
    /// deadline. The clock never moves backwards. Returns the number of
    /// timeouts that ran.
    pub fn advance_to(&self, now: u64, ctx: &mut C) -> usize {
        let mut fired = 0;
        loop {
            let due = {
                let mut state = self.state.borrow_mut();
                match state.timers.next_deadline().filter(|deadline| *deadline <= now) {
                    Some(deadline) => {
                        state.now = state.now.max(deadline);
                        state.timers.pop_due(deadline)
                    }
                    None => {
                        state.now = state.now.max(now);
                        None
                    }
                }
            };
            let Some((_, callback)) = due else {
                break;
            };
            callback(ctx);
            fired += 1;
        }
        fired
    }

    /// Moves the clock forward by `delta` ticks. See [`Host::advance_to`].
    pub fn advance_by(&self, delta: u64, ctx: &mut C) -> usize {
        let target = self.now().saturating_add(delta);
        self.advance_to(target, ctx)
    }
}
