// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
//! Argument Selection
//!
//! A reporting call site passes the exact arguments of its log call. Which
//! of them end up on the wire is decided by the registry at runtime, so the
//! list is kept typed and each value is converted only when its position is
//! asked for.
//!
//! # Invariants
//! - `arg_text(i)` formats argument `i` and nothing else
//! - A position outside `[0, arg_count)` is a registry/call-site mismatch
//!   and panics

use std::fmt::Display;

/// A fixed, heterogeneously typed argument list addressable by position.
///
/// Implemented for tuples of `Display` values up to twelve elements, and
/// for slices of `&dyn Display` when a call site has more arguments.
pub trait TestArgs {
    /// Number of arguments the call site passed.
    fn arg_count(&self) -> usize;

    /// Text of the argument at `position`.
    ///
    /// # Panics
    /// If `position >= self.arg_count()`.
    fn arg_text(&self, position: usize) -> String;
}

#[cold]
#[inline(never)]
#[track_caller]
fn out_of_range(position: usize, count: usize) -> ! {
    panic!(
        "test event argument position {} out of range for a call with {} argument(s)",
        position, count
    )
}

impl TestArgs for () {
    fn arg_count(&self) -> usize {
        0
    }

    fn arg_text(&self, position: usize) -> String {
        out_of_range(position, 0)
    }
}

// One match arm per slot: the position is dispatched in a single jump and
// only the selected slot goes through `to_string`.
macro_rules! impl_test_args {
    ($count:expr; $($idx:tt $ty:ident),+) => {
        impl<$($ty: Display),+> TestArgs for ($($ty,)+) {
            fn arg_count(&self) -> usize {
                $count
            }

            fn arg_text(&self, position: usize) -> String {
                match position {
                    $($idx => self.$idx.to_string(),)+
                    _ => out_of_range(position, $count),
                }
            }
        }
    };
}

impl_test_args!(1; 0 A0);
impl_test_args!(2; 0 A0, 1 A1);
impl_test_args!(3; 0 A0, 1 A1, 2 A2);
impl_test_args!(4; 0 A0, 1 A1, 2 A2, 3 A3);
impl_test_args!(5; 0 A0, 1 A1, 2 A2, 3 A3, 4 A4);
impl_test_args!(6; 0 A0, 1 A1, 2 A2, 3 A3, 4 A4, 5 A5);
impl_test_args!(7; 0 A0, 1 A1, 2 A2, 3 A3, 4 A4, 5 A5, 6 A6);
impl_test_args!(8; 0 A0, 1 A1, 2 A2, 3 A3, 4 A4, 5 A5, 6 A6, 7 A7);
impl_test_args!(9; 0 A0, 1 A1, 2 A2, 3 A3, 4 A4, 5 A5, 6 A6, 7 A7, 8 A8);
impl_test_args!(10; 0 A0, 1 A1, 2 A2, 3 A3, 4 A4, 5 A5, 6 A6, 7 A7, 8 A8, 9 A9);
impl_test_args!(11; 0 A0, 1 A1, 2 A2, 3 A3, 4 A4, 5 A5, 6 A6, 7 A7, 8 A8, 9 A9, 10 A10);
impl_test_args!(12; 0 A0, 1 A1, 2 A2, 3 A3, 4 A4, 5 A5, 6 A6, 7 A7, 8 A8, 9 A9, 10 A10, 11 A11);

impl TestArgs for [&dyn Display] {
    fn arg_count(&self) -> usize {
        self.len()
    }

    fn arg_text(&self, position: usize) -> String {
        match self.get(position) {
            Some(arg) => arg.to_string(),
            None => out_of_range(position, self.len()),
        }
    }
}

impl<const N: usize> TestArgs for [&dyn Display; N] {
    fn arg_count(&self) -> usize {
        N
    }

    fn arg_text(&self, position: usize) -> String {
        self.as_slice().arg_text(position)
    }
}

impl<T: TestArgs + ?Sized> TestArgs for &T {
    fn arg_count(&self) -> usize {
        (**self).arg_count()
    }

    fn arg_text(&self, position: usize) -> String {
        (**self).arg_text(position)
    }
}

