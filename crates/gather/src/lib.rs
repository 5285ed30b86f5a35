// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Eager materialization of finite sequences into concrete containers.
//!
//! `gather` converts a finite sequence source into one ordered, fully
//! populated container, resolving element-level asynchrony along the way. A
//! source arrives in exactly one of three shapes:
//!
//! - **async-pull** — a [`Stream`](futures_util::Stream) whose pulls suspend;
//!   yielded values are taken exactly as yielded,
//! - **sync-pull** — an [`Iterator`] whose pulls return immediately but whose
//!   items may still be pending; each item is resolved once before use,
//! - **indexed** — a passive [`IndexedSource`] exposing a length and
//!   per-index fetches; every fetched element is resolved once,
//!   unconditionally.
//!
//! Classification is fixed when the [`SequenceSource`] is built and is never
//! revisited mid-run. Elements land in source order; element N+1 is not
//! touched until element N's transform result has resolved. The first failure
//! from any stage ends the run with the original error value, and no partial
//! container ever reaches the caller.
//!
//! # Output Election
//!
//! The caller may supply an [`OutputFactory`] to pick the concrete output
//! container. The factory's constructibility probe decides between the
//! factory's container and the intrinsic `Vec` fallback: a probe failure is
//! swallowed and elects the fallback, while a real construction failure
//! propagates. Pull-shaped sources construct with no size; indexed sources
//! construct with the declared length up front.
//!
//! # Example
//!
//! ```
//! use gather::{materialize, SequenceSource};
//!
//! # async fn demo() -> Result<(), gather::MaterializeError<std::convert::Infallible>> {
//! let source = SequenceSource::sync_pull(
//!     (0..3).map(|n| std::future::ready(Ok::<_, std::convert::Infallible>(n * 2))),
//! );
//! let out = materialize(source).await?;
//! assert_eq!(out, vec![0, 2, 4]);
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::unreadable_literal,
    clippy::missing_const_for_fn,
    clippy::suboptimal_flops,
    clippy::redundant_pub_crate,
    clippy::many_single_char_names,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod error;
mod materialize;
mod output;
mod source;
mod transform;

pub use error::MaterializeError;
pub use materialize::{materialize, Materializer, SAFE_LENGTH_CEILING};
pub use output::{Materialized, OutputContainer, OutputFactory, VecFactory};
pub use source::{IndexedSource, NoAsyncPull, NoIndexed, NoSyncPull, SequenceSource, SourceShape};
pub use transform::{BoundTransform, ElementTransform, FnTransform, Identity};
