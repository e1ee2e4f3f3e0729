//! A value that is either present or absent with a typed reason.
//!
//! [`Fallible<T, E>`] holds exactly one of `Success(T)` or `Failure(E)`.
//! Sequences of fallible steps are composed with the combinators below
//! instead of branching by hand at every step; the first failure
//! short-circuits everything downstream and is carried to the caller
//! unchanged.
//!
//! # Example
//!
//! ```rust
//! use activation::fallible::Fallible;
//!
//! fn parse_port(raw: &str) -> Fallible<u16, &'static str> {
//!     Fallible::from_option(raw.parse().ok(), "not a number")
//! }
//!
//! let port = parse_port("8080")
//!     .filter(|p| *p >= 1024, "privileged port")
//!     .map(|p| p + 1);
//! assert_eq!(port, Fallible::success(8081));
//!
//! let rejected = parse_port("80").filter(|p| *p >= 1024, "privileged port");
//! assert_eq!(rejected, Fallible::failure("privileged port"));
//! ```
//!
//! The usual way to pull a plain value out is [`Fallible::match_with`],
//! which forces both outcomes to be handled. [`Fallible::force_unwrap`]
//! exists for places where a failure is a bug, and panics when misused.

use std::fmt;

/// A present `T`, or a reason `E` for its absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fallible<T, E> {
    /// A value is present.
    Success(T),
    /// No value; the reason is carried instead.
    Failure(E),
}

pub use Fallible::{Failure, Success};

impl<T, E> Fallible<T, E> {
    /// Wrap a present value.
    ///
    /// `T` is always a real value in Rust, so a `Success` can never hold
    /// "nothing". Sources that may be empty must go through
    /// [`Fallible::from_option`], which requires a reason for the empty case.
    pub fn success(value: T) -> Self {
        Success(value)
    }

    /// Wrap a reason for absence.
    pub fn failure(reason: E) -> Self {
        Failure(reason)
    }

    /// Convert an optional value, attaching `reason` when it is `None`.
    ///
    /// This is the boundary between `Option`-returning sources and the
    /// fallible pipeline.
    pub fn from_option(value: Option<T>, reason: E) -> Self {
        match value {
            Some(v) => Success(v),
            None => Failure(reason),
        }
    }

    /// Convert a `Result`, keeping its error as the reason.
    pub fn from_result(result: Result<T, E>) -> Self {
        match result {
            Ok(v) => Success(v),
            Err(e) => Failure(e),
        }
    }

    pub fn has_value(&self) -> bool {
        matches!(self, Success(_))
    }

    /// Transform the value. `f` is never called on a `Failure`.
    ///
    /// Use [`Fallible::flat_map`] when the transformation can itself fail.
    pub fn map<U, F>(self, f: F) -> Fallible<U, E>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Success(v) => Success(f(v)),
            Failure(e) => Failure(e),
        }
    }

    /// Transform the reason. `f` is never called on a `Success`.
    pub fn map_failure<E2, F>(self, f: F) -> Fallible<T, E2>
    where
        F: FnOnce(E) -> E2,
    {
        match self {
            Success(v) => Success(v),
            Failure(e) => Failure(f(e)),
        }
    }

    /// Chain a fallible step.
    ///
    /// On `Success(v)` the result of `f(v)` is returned as is (no nesting);
    /// on `Failure` the reason passes through and `f` is not called.
    /// Chains are associative: `x.flat_map(f).flat_map(g)` equals
    /// `x.flat_map(|v| f(v).flat_map(g))`.
    pub fn flat_map<U, F>(self, f: F) -> Fallible<U, E>
    where
        F: FnOnce(T) -> Fallible<U, E>,
    {
        match self {
            Success(v) => f(v),
            Failure(e) => Failure(e),
        }
    }

    /// Keep the value only if `predicate` accepts it.
    ///
    /// A rejected value becomes `Failure(reason_if_rejected)`; an existing
    /// failure passes through untouched.
    pub fn filter<P>(self, predicate: P, reason_if_rejected: E) -> Self
    where
        P: FnOnce(&T) -> bool,
    {
        match self {
            Success(v) if predicate(&v) => Success(v),
            Success(_) => Failure(reason_if_rejected),
            Failure(e) => Failure(e),
        }
    }

    /// Reduce to a single value by handling both outcomes.
    ///
    /// Exactly one of the two closures runs.
    pub fn match_with<R, S, F>(self, on_success: S, on_failure: F) -> R
    where
        S: FnOnce(T) -> R,
        F: FnOnce(E) -> R,
    {
        match self {
            Success(v) => on_success(v),
            Failure(e) => on_failure(e),
        }
    }

    /// Run a side effect on the value, if there is one.
    pub fn match_success<F>(&self, side_effect: F)
    where
        F: FnOnce(&T),
    {
        if let Success(v) = self {
            side_effect(v);
        }
    }

    /// Run a side effect on the reason, if there is one.
    pub fn match_failure<F>(&self, side_effect: F)
    where
        F: FnOnce(&E),
    {
        if let Failure(e) = self {
            side_effect(e);
        }
    }

    /// True iff there is a value and `predicate` accepts it.
    pub fn exists<P>(&self, predicate: P) -> bool
    where
        P: FnOnce(&T) -> bool,
    {
        match self {
            Success(v) => predicate(v),
            Failure(_) => false,
        }
    }

    /// Compute an alternative only when this one failed.
    ///
    /// `fallback` receives the reason and is not called on `Success`.
    pub fn value_or<F>(self, fallback: F) -> Self
    where
        F: FnOnce(E) -> Self,
    {
        match self {
            Success(v) => Success(v),
            Failure(e) => fallback(e),
        }
    }

    /// Borrow the contents without consuming `self`.
    pub fn as_ref(&self) -> Fallible<&T, &E> {
        match self {
            Success(v) => Success(v),
            Failure(e) => Failure(e),
        }
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Success(v) => Ok(v),
            Failure(e) => Err(e),
        }
    }

    /// Extract the value, panicking on `Failure`.
    ///
    /// # Panics
    ///
    /// Panics with the failure reason if `self` is a `Failure`.
    #[track_caller]
    pub fn force_unwrap(self) -> T
    where
        E: fmt::Debug,
    {
        match self {
            Success(v) => v,
            Failure(e) => panic!("called `Fallible::force_unwrap()` on a `Failure`: {e:?}"),
        }
    }
}

impl<T, E> From<Result<T, E>> for Fallible<T, E> {
    fn from(result: Result<T, E>) -> Self {
        Fallible::from_result(result)
    }
}

impl<T, E> From<Fallible<T, E>> for Result<T, E> {
    fn from(value: Fallible<T, E>) -> Self {
        value.into_result()
    }
}
