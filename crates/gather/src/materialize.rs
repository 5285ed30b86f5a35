// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The materialization run itself: one builder, one loop per source shape.
//!
//! Processing is strictly sequential. The only suspension points are the
//! async pull itself, resolving a pulled or fetched element, and resolving
//! the transform's result; between them execution is synchronous. Each run
//! owns its counter and container outright, so concurrent runs share
//! nothing. There is no cancellation and no timeout: a source that never
//! completes leaves the run pending, and bounding that is the caller's job.

use std::future::IntoFuture;
use std::pin::pin;

use futures_util::{Stream, StreamExt};
use tracing::trace;

use crate::error::MaterializeError;
use crate::output::{Materialized, OutputContainer, OutputFactory, VecFactory};
use crate::source::{IndexedSource, SequenceSource};
use crate::transform::{BoundTransform, ElementTransform, FnTransform, Identity};

/// Ceiling on the element counter: the largest exactly-representable
/// integer of the reference semantics, `2^53 - 1`.
///
/// An element whose index would pass this ceiling fails the run with
/// [`MaterializeError::InputTooLong`].
pub const SAFE_LENGTH_CEILING: u64 = (1_u64 << 53) - 1;

/// Materialize `source` into a plain `Vec`, with no transform.
///
/// The one-shot form of [`Materializer`] for the common case.
///
/// # Errors
///
/// Settles on the first failure of any stage; see [`MaterializeError`].
pub async fn materialize<S, I, X, T, E>(
    source: SequenceSource<S, I, X>,
) -> Result<Vec<T>, MaterializeError<E>>
where
    S: Stream<Item = Result<T, E>>,
    I: Iterator,
    I::Item: IntoFuture<Output = Result<T, E>>,
    X: IndexedSource<T, E>,
{
    Materializer::new(source)
        .run()
        .await
        .map(Materialized::into_vec)
}

/// A configured materialization run.
///
/// Built around a classified [`SequenceSource`], with two optional slots: a
/// per-element transform (default: pass-through) and an output factory
/// (default: intrinsic `Vec`). Each slot change consumes the builder and
/// re-types it, so a run's configuration is pinned down at compile time.
pub struct Materializer<Src, M = Identity, F = VecFactory> {
    source: Src,
    transform: M,
    factory: F,
    length_ceiling: u64,
}

impl<Src> Materializer<Src> {
    /// Start a run over `source` with no transform and `Vec` output.
    pub fn new(source: Src) -> Self {
        Self {
            source,
            transform: Identity,
            factory: VecFactory,
            length_ceiling: SAFE_LENGTH_CEILING,
        }
    }
}

impl<Src, M, F> Materializer<Src, M, F> {
    /// Install a receiver-less per-element transform.
    ///
    /// `func` observes each element (already resolved, for the shapes that
    /// resolve) and its zero-based index; its result is resolved once before
    /// storage.
    pub fn transform<G>(self, func: G) -> Materializer<Src, FnTransform<G>, F> {
        Materializer {
            source: self.source,
            transform: FnTransform::new(func),
            factory: self.factory,
            length_ceiling: self.length_ceiling,
        }
    }

    /// Install a per-element transform bound to an explicit receiver.
    ///
    /// Every invocation of `func` observes `&mut receiver` — exactly the
    /// value given here — as its first argument.
    pub fn transform_with<C, G>(
        self,
        receiver: C,
        func: G,
    ) -> Materializer<Src, BoundTransform<C, G>, F> {
        Materializer {
            source: self.source,
            transform: BoundTransform::new(receiver, func),
            factory: self.factory,
            length_ceiling: self.length_ceiling,
        }
    }

    /// Install an output factory to elect the concrete output container.
    pub fn output_factory<F2>(self, factory: F2) -> Materializer<Src, M, F2> {
        Materializer {
            source: self.source,
            transform: self.transform,
            factory,
            length_ceiling: self.length_ceiling,
        }
    }

    /// Lower the counter ceiling so tests can reach it.
    #[cfg(test)]
    pub(crate) fn length_ceiling(mut self, ceiling: u64) -> Self {
        self.length_ceiling = ceiling;
        self
    }
}

impl<S, I, X, T, E, M, F> Materializer<SequenceSource<S, I, X>, M, F>
where
    S: Stream<Item = Result<T, E>>,
    I: Iterator,
    I::Item: IntoFuture<Output = Result<T, E>>,
    X: IndexedSource<T, E>,
    M: ElementTransform<T, E>,
    F: OutputFactory<M::Out, E>,
{
    /// Drive the source to exhaustion and hand back the populated container.
    ///
    /// # Errors
    ///
    /// Settles on the first failure of any stage — pulling, resolving an
    /// element, the transform, a real container construction — with the
    /// original error value, or on [`MaterializeError::InputTooLong`] when
    /// the counter passes the ceiling. No partial container surfaces.
    pub async fn run(self) -> Result<Materialized<F::Container, M::Out>, MaterializeError<E>> {
        let Self {
            source,
            mut transform,
            mut factory,
            length_ceiling,
        } = self;
        let shape = source.shape();
        trace!(%shape, "materializing sequence");

        match source {
            SequenceSource::AsyncPull(stream) => {
                let mut out = elect_empty(&mut factory)?;
                let mut stream = pin!(stream);
                let mut index: u64 = 0;
                while let Some(pulled) = stream.next().await {
                    // The pull was the wait: the yielded value is used as
                    // yielded, never resolved a second time.
                    let value = pulled.map_err(MaterializeError::Halted)?;
                    ensure_below_ceiling(index, length_ceiling)?;
                    let mapped = transform
                        .apply(value, index)
                        .await
                        .map_err(MaterializeError::Halted)?;
                    out.put(index, mapped);
                    index += 1;
                }
                out.finish(index);
                trace!(count = index, "sequence materialized");
                Ok(out)
            }
            SequenceSource::SyncPull(values) => {
                let mut out = elect_empty(&mut factory)?;
                let mut index: u64 = 0;
                for pulled in values {
                    // A synchronous pull may yield a still-pending value;
                    // resolve it exactly once before the transform sees it.
                    let value = pulled
                        .into_future()
                        .await
                        .map_err(MaterializeError::Halted)?;
                    ensure_below_ceiling(index, length_ceiling)?;
                    let mapped = transform
                        .apply(value, index)
                        .await
                        .map_err(MaterializeError::Halted)?;
                    out.put(index, mapped);
                    index += 1;
                }
                out.finish(index);
                trace!(count = index, "sequence materialized");
                Ok(out)
            }
            SequenceSource::Indexed(mut indexed) => {
                let length = indexed.length().map_err(MaterializeError::Halted)?;
                let mut out = elect_sized(&mut factory, length)?;
                let mut index: u64 = 0;
                while index < length {
                    ensure_below_ceiling(index, length_ceiling)?;
                    let element = indexed.fetch(index).map_err(MaterializeError::Halted)?;
                    // Indexed elements resolve unconditionally, transform
                    // or not.
                    let value = element
                        .into_future()
                        .await
                        .map_err(MaterializeError::Halted)?;
                    let mapped = transform
                        .apply(value, index)
                        .await
                        .map_err(MaterializeError::Halted)?;
                    out.put(index, mapped);
                    index += 1;
                }
                out.finish(index);
                trace!(count = index, "sequence materialized");
                Ok(out)
            }
        }
    }
}

fn elect_empty<F, T, E>(
    factory: &mut F,
) -> Result<Materialized<F::Container, T>, MaterializeError<E>>
where
    F: OutputFactory<T, E>,
{
    if factory.constructible() {
        factory
            .make_empty()
            .map(Materialized::Custom)
            .map_err(MaterializeError::Halted)
    } else {
        Ok(Materialized::Intrinsic(Vec::new()))
    }
}

fn elect_sized<F, T, E>(
    factory: &mut F,
    length: u64,
) -> Result<Materialized<F::Container, T>, MaterializeError<E>>
where
    F: OutputFactory<T, E>,
{
    if factory.constructible() {
        factory
            .make_sized(length)
            .map(Materialized::Custom)
            .map_err(MaterializeError::Halted)
    } else {
        Ok(Materialized::Intrinsic(
            usize::try_from(length).map_or_else(|_| Vec::new(), Vec::with_capacity),
        ))
    }
}

fn ensure_below_ceiling<E>(index: u64, ceiling: u64) -> Result<(), MaterializeError<E>> {
    if index > ceiling {
        return Err(MaterializeError::InputTooLong);
    }
    Ok(())
}
