// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The single caller-visible failure surface of a materialization run.

/// Why a materialization run ended without a container.
///
/// There is exactly one failure channel: the run either fulfills with a
/// complete container or settles on the first error. Failures from the
/// source, an element's resolution, the transform, or a real (non-probe)
/// container construction all travel through [`Halted`](Self::Halted) with
/// the original error value untouched — no wrapping, no context stacking, no
/// downgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MaterializeError<E> {
    /// The element counter passed the safe length ceiling.
    ///
    /// Fatal and non-negotiable; the diagnostic text is fixed.
    #[error("[GATHER_TOO_LONG] input is too long and exceeded the safe length ceiling")]
    InputTooLong,
    /// A stage failed; the payload is the original error value, unchanged.
    #[error("{0}")]
    Halted(E),
}

impl<E> MaterializeError<E> {
    /// Unwrap the original stage error, if this is a stage failure.
    pub fn into_halted(self) -> Option<E> {
        match self {
            Self::InputTooLong => None,
            Self::Halted(error) => Some(error),
        }
    }
}
