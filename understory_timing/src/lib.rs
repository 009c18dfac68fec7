// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_timing --heading-base-level=0

//! Understory Timing: host-agnostic timer queue primitives for UI runtimes.
//!
//! This crate does not own a clock and never sleeps. The host decides what a
//! tick is (milliseconds since launch, frame counts, a test clock) and asks the
//! queue which timers are due at a given instant.
//!
//! ## Semantics
//!
//! - [`TimerQueue::schedule`] inserts a payload with an absolute deadline and returns a [`TimerId`].
//! - [`TimerQueue::cancel`] removes a pending timer and hands its payload back.
//! - [`TimerQueue::pop_due`] pops the earliest timer whose deadline is `<= now`.
//!   Ties fire in the order they were scheduled.
//! - A cancelled timer never pops, and ids are never reused.
//!
//! ## Minimal example
//!
//! ```
//! use understory_timing::TimerQueue;
//!
//! let mut timers = TimerQueue::new();
//! let a = timers.schedule(100, "a");
//! let b = timers.schedule(50, "b");
//! let _c = timers.schedule(100, "c");
//!
//! assert_eq!(timers.next_deadline(), Some(50));
//! assert_eq!(timers.pop_due(49), None);
//! assert_eq!(timers.pop_due(50), Some((b, "b")));
//!
//! // Cancelled timers never fire.
//! assert_eq!(timers.cancel(a), Some("a"));
//! let (_, payload) = timers.pop_due(1_000).unwrap();
//! assert_eq!(payload, "c");
//! assert!(timers.is_empty());
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

use alloc::collections::BinaryHeap;
use core::cmp::Reverse;

use hashbrown::HashMap;

/// Stale heap entries tolerated before `cancel` compacts the heap.
const COMPACT_SLACK: usize = 32;

/// Identifier for a scheduled timer.
///
/// Ids are handed out in scheduling order and are never reused by the queue
/// that issued them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(u64);

impl TimerId {
    /// Returns the raw id value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// A deadline-ordered queue of cancellable timers.
///
/// Deadlines are absolute host ticks. Cancellation is lazy: the heap entry
/// stays behind until it reaches the front, but its payload is gone, so it is
/// skipped. Once stale entries outnumber pending timers, cancellation compacts
/// the heap, so a queue whose clock never advances still stays bounded.
#[derive(Debug)]
pub struct TimerQueue<T> {
    next_id: u64,
    order: BinaryHeap<Reverse<(u64, TimerId)>>,
    payloads: HashMap<TimerId, T>,
}

impl<T> Default for TimerQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TimerQueue<T> {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 0,
            order: BinaryHeap::new(),
            payloads: HashMap::new(),
        }
    }

    /// Schedules `payload` to become due at `deadline`.
    pub fn schedule(&mut self, deadline: u64, payload: T) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.order.push(Reverse((deadline, id)));
        self.payloads.insert(id, payload);
        id
    }

    /// Cancels a pending timer, returning its payload.
    ///
    /// Returns `None` if the timer already fired or was cancelled before.
    pub fn cancel(&mut self, id: TimerId) -> Option<T> {
        let payload = self.payloads.remove(&id)?;
        if self.order.len() > 2 * self.payloads.len() + COMPACT_SLACK {
            let payloads = &self.payloads;
            self.order.retain(|Reverse((_, id))| payloads.contains_key(id));
        }
        Some(payload)
    }

    /// Returns `true` if `id` is scheduled and has not fired or been cancelled.
    #[must_use]
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.payloads.contains_key(&id)
    }

    /// Number of pending timers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payloads.len()
    }

    /// Returns `true` if no timers are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payloads.is_empty()
    }

    /// Deadline of the earliest pending timer.
    ///
    /// Takes `&mut self` to discard cancelled entries at the front of the queue.
    pub fn next_deadline(&mut self) -> Option<u64> {
        self.discard_cancelled();
        self.order.peek().map(|Reverse((deadline, _))| *deadline)
    }

    /// Pops the earliest timer whose deadline is at or before `now`.
    pub fn pop_due(&mut self, now: u64) -> Option<(TimerId, T)> {
        self.discard_cancelled();
        let Reverse((deadline, id)) = *self.order.peek()?;
        if deadline > now {
            return None;
        }
        self.order.pop();
        self.payloads.remove(&id).map(|payload| (id, payload))
    }

    /// Drops every pending timer.
    pub fn clear(&mut self) {
        self.order.clear();
        self.payloads.clear();
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse((_, id))) = self.order.peek() {
            if self.payloads.contains_key(id) {
                break;
            }
            self.order.pop();
        }
    }
}
