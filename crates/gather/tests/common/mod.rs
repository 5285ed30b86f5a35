// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(dead_code)]

use std::fmt;
use std::future::{ready, Future, Ready};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use gather::{IndexedSource, OutputContainer, OutputFactory};

/// Marker error for failure-injection tests. Compared by its tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Boom(pub &'static str);

impl fmt::Display for Boom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "boom: {}", self.0)
    }
}

/// A deferred value that counts how many times it is resolved.
///
/// Resolution is observed at poll time, so an element that is stored without
/// being awaited leaves the counter untouched.
pub struct CountedResolve<T> {
    outcome: Option<Result<T, Boom>>,
    resolutions: Arc<AtomicUsize>,
}

impl<T> CountedResolve<T> {
    pub fn ok(value: T, resolutions: &Arc<AtomicUsize>) -> Self {
        Self {
            outcome: Some(Ok(value)),
            resolutions: Arc::clone(resolutions),
        }
    }

    pub fn err(error: Boom, resolutions: &Arc<AtomicUsize>) -> Self {
        Self {
            outcome: Some(Err(error)),
            resolutions: Arc::clone(resolutions),
        }
    }
}

impl<T: Unpin> Future for CountedResolve<T> {
    type Output = Result<T, Boom>;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        this.resolutions.fetch_add(1, Ordering::SeqCst);
        Poll::Ready(this.outcome.take().expect("resolved more than once"))
    }
}

/// Indexed source over a fixed script of plain values, recording every fetch.
///
/// The script may be longer than the declared length (the excess must never
/// be fetched) or shorter (a fetch past the script fails, standing in for a
/// throwing element read).
pub struct IndexedValues<T> {
    values: Vec<T>,
    declared_length: u64,
    fetched: Arc<Mutex<Vec<u64>>>,
}

impl<T> IndexedValues<T> {
    pub fn new(values: Vec<T>, declared_length: u64) -> (Self, Arc<Mutex<Vec<u64>>>) {
        let fetched = Arc::new(Mutex::new(Vec::new()));
        let source = Self {
            values,
            declared_length,
            fetched: Arc::clone(&fetched),
        };
        (source, fetched)
    }
}

impl<T: Clone + Unpin> IndexedSource<T, Boom> for IndexedValues<T> {
    type Element = Ready<Result<T, Boom>>;

    fn length(&self) -> Result<u64, Boom> {
        Ok(self.declared_length)
    }

    fn fetch(&mut self, index: u64) -> Result<Self::Element, Boom> {
        self.fetched.lock().unwrap().push(index);
        let slot = usize::try_from(index)
            .ok()
            .and_then(|i| self.values.get(i));
        match slot {
            Some(value) => Ok(ready(Ok(value.clone()))),
            None => Err(Boom("fetched past the script")),
        }
    }
}

/// Indexed source whose elements are [`CountedResolve`] deferreds sharing
/// one resolution counter.
pub struct CountingIndexed {
    values: Vec<Result<i64, Boom>>,
    resolutions: Arc<AtomicUsize>,
}

impl CountingIndexed {
    pub fn new(values: Vec<Result<i64, Boom>>) -> (Self, Arc<AtomicUsize>) {
        let resolutions = Arc::new(AtomicUsize::new(0));
        let source = Self {
            values,
            resolutions: Arc::clone(&resolutions),
        };
        (source, resolutions)
    }
}

impl IndexedSource<i64, Boom> for CountingIndexed {
    type Element = CountedResolve<i64>;

    fn length(&self) -> Result<u64, Boom> {
        Ok(self.values.len() as u64)
    }

    fn fetch(&mut self, index: u64) -> Result<Self::Element, Boom> {
        let outcome = self.values[usize::try_from(index).unwrap()];
        Ok(match outcome {
            Ok(value) => CountedResolve::ok(value, &self.resolutions),
            Err(error) => CountedResolve::err(error, &self.resolutions),
        })
    }
}

/// Indexed source whose length read itself fails.
pub struct BrokenLength;

impl IndexedSource<i64, Boom> for BrokenLength {
    type Element = Ready<Result<i64, Boom>>;

    fn length(&self) -> Result<u64, Boom> {
        Err(Boom("length read failed"))
    }

    fn fetch(&mut self, _index: u64) -> Result<Self::Element, Boom> {
        Err(Boom("fetch after broken length"))
    }
}

/// Grow-only container that records how it was constructed and finished.
#[derive(Debug, PartialEq, Eq)]
pub struct Bucket<T> {
    pub items: Vec<T>,
    pub sized_hint: Option<u64>,
    pub finished_length: Option<u64>,
}

// Manual impl: the derive would demand `T: Default` for no reason.
impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            sized_hint: None,
            finished_length: None,
        }
    }
}

impl<T> OutputContainer<T> for Bucket<T> {
    fn put(&mut self, _index: u64, value: T) {
        self.items.push(value);
    }

    fn finish(&mut self, length: u64) {
        self.finished_length = Some(length);
    }
}

/// Factory with a scripted probe flag and failure injection, recording
/// every construction call.
pub struct BucketFactory {
    pub constructible: bool,
    pub fail_construction: Option<Boom>,
    pub empty_calls: Arc<AtomicUsize>,
    pub sized_calls: Arc<Mutex<Vec<u64>>>,
}

impl BucketFactory {
    pub fn new(constructible: bool) -> Self {
        Self {
            constructible,
            fail_construction: None,
            empty_calls: Arc::new(AtomicUsize::new(0)),
            sized_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: Boom) -> Self {
        let mut factory = Self::new(true);
        factory.fail_construction = Some(error);
        factory
    }
}

impl<T> OutputFactory<T, Boom> for BucketFactory {
    type Container = Bucket<T>;

    // Flag-style probe: constructibility is answered without a throwaway
    // construction, so a construction failure can only be a real one.
    fn constructible(&mut self) -> bool {
        self.constructible
    }

    fn make_empty(&mut self) -> Result<Bucket<T>, Boom> {
        self.empty_calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_construction {
            Some(error) => Err(error),
            None => Ok(Bucket::default()),
        }
    }

    fn make_sized(&mut self, length: u64) -> Result<Bucket<T>, Boom> {
        self.sized_calls.lock().unwrap().push(length);
        match self.fail_construction {
            Some(error) => Err(error),
            None => Ok(Bucket {
                sized_hint: Some(length),
                ..Bucket::default()
            }),
        }
    }
}

/// Factory relying on the default throwaway-construction probe.
pub struct ProbedFactory {
    pub fail_construction: Option<Boom>,
    pub empty_calls: Arc<AtomicUsize>,
}

impl ProbedFactory {
    pub fn new(fail_construction: Option<Boom>) -> Self {
        Self {
            fail_construction,
            empty_calls: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl<T> OutputFactory<T, Boom> for ProbedFactory {
    type Container = Bucket<T>;

    fn make_empty(&mut self) -> Result<Bucket<T>, Boom> {
        self.empty_calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_construction {
            Some(error) => Err(error),
            None => Ok(Bucket::default()),
        }
    }

    fn make_sized(&mut self, length: u64) -> Result<Bucket<T>, Boom> {
        self.empty_calls.fetch_add(1, Ordering::SeqCst);
        match self.fail_construction {
            Some(error) => Err(error),
            None => Ok(Bucket {
                sized_hint: Some(length),
                ..Bucket::default()
            }),
        }
    }
}
