// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Source classification: the closed union over the three shapes a finite
//! sequence can arrive in.
//!
//! A source is classified exactly once, at construction, by choosing one of
//! the shape constructors on [`SequenceSource`]. The run loop reads the
//! resulting [`SourceShape`] tag a single time at entry and never re-probes.
//! For a value that could serve more than one shape, async-pull outranks
//! sync-pull, which outranks indexed access: an adapter over a
//! dual-capability source must call [`SequenceSource::async_pull`].

use std::convert::Infallible;
use std::fmt;
use std::future::{IntoFuture, Ready};
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_util::Stream;

/// A classified sequence source.
///
/// The three variants mirror the three ways elements can be produced. The
/// unused slots of a classified source are filled with unconstructible
/// placeholder types ([`NoAsyncPull`], [`NoSyncPull`], [`NoIndexed`]), so a
/// value built through one constructor can only ever be its own shape.
pub enum SequenceSource<S, I, X> {
    /// The pull itself suspends; yielded values are taken as yielded,
    /// without a second resolution step.
    AsyncPull(S),
    /// Pulls return immediately; each yielded item may still be pending and
    /// is resolved exactly once before use.
    SyncPull(I),
    /// A passive collection addressed by `length` plus per-index fetches;
    /// every fetched element is resolved exactly once, unconditionally.
    Indexed(X),
}

impl<S, I, X> SequenceSource<S, I, X> {
    /// The shape this source was classified as.
    ///
    /// Read once at run entry; classification never changes after
    /// construction.
    pub fn shape(&self) -> SourceShape {
        match self {
            Self::AsyncPull(_) => SourceShape::AsyncPull,
            Self::SyncPull(_) => SourceShape::SyncPull,
            Self::Indexed(_) => SourceShape::Indexed,
        }
    }
}

impl<S, T, E> SequenceSource<S, NoSyncPull<T, E>, NoIndexed<T, E>>
where
    S: Stream<Item = Result<T, E>>,
{
    /// Classify `stream` as an async-pull source.
    ///
    /// This is the highest-priority shape: a source that could also be
    /// pulled synchronously or indexed belongs here.
    pub fn async_pull(stream: S) -> Self {
        Self::AsyncPull(stream)
    }
}

impl<I, T, E> SequenceSource<NoAsyncPull<T, E>, I, NoIndexed<T, E>>
where
    I: Iterator,
    I::Item: IntoFuture<Output = Result<T, E>>,
{
    /// Classify `values` as a sync-pull source.
    ///
    /// Items may be ready values (`std::future::ready(Ok(v))`) or still
    /// pending; either way each is resolved exactly once by the run loop.
    pub fn sync_pull<V>(values: V) -> Self
    where
        V: IntoIterator<IntoIter = I>,
    {
        Self::SyncPull(values.into_iter())
    }
}

impl<X, T, E> SequenceSource<NoAsyncPull<T, E>, NoSyncPull<T, E>, X>
where
    X: IndexedSource<T, E>,
{
    /// Classify `source` as a passive indexed source.
    ///
    /// The lowest-priority shape, for values with no pull protocol at all.
    pub fn indexed(source: X) -> Self {
        Self::Indexed(source)
    }
}

/// Shape tag produced by classifying a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceShape {
    /// Async-pull protocol.
    AsyncPull,
    /// Sync-pull protocol.
    SyncPull,
    /// Passive indexed access.
    Indexed,
}

impl fmt::Display for SourceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AsyncPull => "async-pull",
            Self::SyncPull => "sync-pull",
            Self::Indexed => "indexed",
        };
        f.write_str(name)
    }
}

/// A passive collection exposing a length and per-index element fetches.
///
/// The run loop reads [`length`](Self::length) once, before any element, and
/// then fetches indexes `0..length` in order. An index at or past the
/// declared length is never fetched, so entries a source might additionally
/// carry beyond its length are invisible.
pub trait IndexedSource<T, E> {
    /// Deferred element handle returned by [`fetch`](Self::fetch).
    ///
    /// Resolved exactly once per element, whether or not a transform is
    /// installed.
    type Element: IntoFuture<Output = Result<T, E>>;

    /// The declared element count. A failure here ends the run before any
    /// element is touched.
    fn length(&self) -> Result<u64, E>;

    /// Fetch the element at `index`. Never called with
    /// `index >= length()`.
    fn fetch(&mut self, index: u64) -> Result<Self::Element, E>;
}

/// Placeholder filling the async-pull slot of a source classified as another
/// shape. Cannot be constructed.
pub struct NoAsyncPull<T, E> {
    never: Infallible,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T, E> Stream for NoAsyncPull<T, E> {
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.get_mut().never {}
    }
}

/// Placeholder filling the sync-pull slot of a source classified as another
/// shape. Cannot be constructed.
pub struct NoSyncPull<T, E> {
    never: Infallible,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T, E> Iterator for NoSyncPull<T, E> {
    type Item = Ready<Result<T, E>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.never {}
    }
}

/// Placeholder filling the indexed slot of a source classified as another
/// shape. Cannot be constructed.
pub struct NoIndexed<T, E> {
    never: Infallible,
    _marker: PhantomData<fn() -> (T, E)>,
}

impl<T, E> IndexedSource<T, E> for NoIndexed<T, E> {
    type Element = Ready<Result<T, E>>;

    fn length(&self) -> Result<u64, E> {
        match self.never {}
    }

    fn fetch(&mut self, _index: u64) -> Result<Self::Element, E> {
        match self.never {}
    }
}
