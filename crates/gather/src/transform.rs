// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Per-element transforms and their receiver binding.
//!
//! A transform sees each element exactly once, together with the zero-based
//! element index, and its result is resolved exactly once before storage —
//! a transform may hand back a ready value or something still pending, and
//! the run loop treats both the same. The receiver rules mirror the source
//! semantics: [`BoundTransform`] threads the exact receiver it was built
//! with into every invocation, while [`FnTransform`] passes none at all.
//! The materializer never substitutes its own state as a receiver.

use std::future::{ready, Future, IntoFuture};

/// One element in, one (possibly deferred) element out.
///
/// Implementations are driven strictly sequentially: `apply` for element
/// N+1 is not called until the future returned for element N has resolved.
pub trait ElementTransform<T, E> {
    /// Element type written to the output container.
    type Out;

    /// Map `value` at `index`. The returned future is resolved exactly once.
    fn apply(&mut self, value: T, index: u64) -> impl Future<Output = Result<Self::Out, E>>;
}

/// The no-transform transform: elements pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl<T, E> ElementTransform<T, E> for Identity {
    type Out = T;

    fn apply(&mut self, value: T, _index: u64) -> impl Future<Output = Result<T, E>> {
        ready(Ok(value))
    }
}

/// A receiver-less transform function.
///
/// The function observes no receiver — only the element and its index.
pub struct FnTransform<F> {
    func: F,
}

impl<F> FnTransform<F> {
    pub(crate) fn new(func: F) -> Self {
        Self { func }
    }
}

impl<T, E, U, F, Fut> ElementTransform<T, E> for FnTransform<F>
where
    F: FnMut(T, u64) -> Fut,
    Fut: IntoFuture<Output = Result<U, E>>,
{
    type Out = U;

    fn apply(&mut self, value: T, index: u64) -> impl Future<Output = Result<U, E>> {
        (self.func)(value, index).into_future()
    }
}

/// A transform function bound to an explicit receiver.
///
/// Every invocation observes `&mut` the exact receiver value the transform
/// was built with, as its first argument.
pub struct BoundTransform<C, F> {
    receiver: C,
    func: F,
}

impl<C, F> BoundTransform<C, F> {
    pub(crate) fn new(receiver: C, func: F) -> Self {
        Self { receiver, func }
    }
}

impl<T, E, U, C, F, Fut> ElementTransform<T, E> for BoundTransform<C, F>
where
    F: FnMut(&mut C, T, u64) -> Fut,
    Fut: IntoFuture<Output = Result<U, E>>,
{
    type Out = U;

    fn apply(&mut self, value: T, index: u64) -> impl Future<Output = Result<U, E>> {
        (self.func)(&mut self.receiver, value, index).into_future()
    }
}
