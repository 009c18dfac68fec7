// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Removing matching items from an ordered collection.
//!
//! Consumers use this to strip stale tags (for example a previous
//! classification class) from a list before re-tagging an element.
//!
//! ```
//! use understory_drag::remove::{Criterion, remove_from};
//!
//! let mut tags = vec!["piece", "selected", "hover", "selected"];
//! let stale = Criterion::any_of([Criterion::Value("hover"), Criterion::Value("selected")]);
//! assert_eq!(remove_from(&mut tags, &stale, true), 3);
//! assert_eq!(tags, ["piece"]);
//! ```

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

/// What [`remove_from`] matches.
pub enum Criterion<'a, T> {
    /// Items equal to the value.
    Value(T),
    /// Each nested criterion, applied in turn.
    AnyOf(Vec<Criterion<'a, T>>),
    /// Items for which the predicate returns `true`.
    Where(Box<dyn Fn(&T) -> bool + 'a>),
}

impl<'a, T> Criterion<'a, T> {
    /// Matches items for which `predicate` returns `true`.
    pub fn matching(predicate: impl Fn(&T) -> bool + 'a) -> Self {
        Self::Where(Box::new(predicate))
    }

    /// Combines several criteria.
    pub fn any_of(criteria: impl IntoIterator<Item = Self>) -> Self {
        Self::AnyOf(criteria.into_iter().collect())
    }
}

impl<T: PartialEq> Criterion<'_, T> {
    /// Returns `true` if `item` satisfies this criterion.
    pub fn matches(&self, item: &T) -> bool {
        match self {
            Self::Value(value) => value == item,
            Self::AnyOf(criteria) => criteria.iter().any(|c| c.matches(item)),
            Self::Where(predicate) => predicate(item),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Criterion<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::AnyOf(criteria) => f.debug_tuple("AnyOf").field(criteria).finish(),
            Self::Where(_) => f.write_str("Where(..)"),
        }
    }
}

/// Removes items matching `criterion` from `items`, preserving the order of
/// the rest. Returns how many were removed.
///
/// With `all` unset only the first match goes. [`Criterion::AnyOf`] applies
/// each nested criterion in turn with the same `all` flag, so
/// `AnyOf([a, b])` with `all` unset can remove one `a` and one `b`.
pub fn remove_from<T: PartialEq>(
    items: &mut Vec<T>,
    criterion: &Criterion<'_, T>,
    all: bool,
) -> usize {
    if let Criterion::AnyOf(criteria) = criterion {
        return criteria.iter().map(|c| remove_from(items, c, all)).sum();
    }
    if all {
        let before = items.len();
        items.retain(|item| !criterion.matches(item));
        before - items.len()
    } else {
        match items.iter().position(|item| criterion.matches(item)) {
            Some(index) => {
                items.remove(index);
                1
            }
            None => 0,
        }
    }
}
