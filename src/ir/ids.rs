//! Newtype IDs and identifier allocation policies.
//!
//! Image, annotation and category ids live in separate namespaces, so each
//! gets its own newtype. Raw `u64` values are produced by an [`IdAllocator`]:
//! collections use [`SequentialIds`], the single-image generator uses
//! [`RandomizedIds`]. A collection is always built from one policy.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            #[inline]
            pub fn new(id: u64) -> Self {
                Self(id)
            }

            #[inline]
            pub fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(
    /// Identifier of an image within a collection.
    ImageId
);
id_newtype!(
    /// Identifier of an annotation within a collection.
    AnnotationId
);
id_newtype!(
    /// Identifier of a category. Foreground categories start at 1; 0 is
    /// reserved for the labeling-tool background placeholder.
    CategoryId
);

/// Source of raw identifier values.
pub trait IdAllocator {
    /// Returns the next identifier. Never returns the same value twice for
    /// one allocator instance.
    fn next_id(&mut self) -> u64;
}

/// Monotonic counter starting at 1.
///
/// Used for collection assembly where ids must be deterministic.
#[derive(Clone, Debug)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> u64 {
        self.next - 1
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator for SequentialIds {
    fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Random identifiers salted with the wall clock.
///
/// Each id is seven random digits followed by the last three digits of the
/// current unix time in seconds, e.g. `4821937` + `042` = `4821937042`.
/// Values already handed out by this allocator are redrawn.
#[derive(Clone, Debug)]
pub struct RandomizedIds {
    clock: fn() -> u64,
    issued: HashSet<u64>,
}

const RANDOM_PART_MIN: u64 = 1_000_000;
const RANDOM_PART_MAX: u64 = 9_999_999;

impl RandomizedIds {
    pub fn new() -> Self {
        Self::with_clock(unix_seconds)
    }

    /// Creates an allocator reading time from `clock` (seconds).
    pub fn with_clock(clock: fn() -> u64) -> Self {
        Self {
            clock,
            issued: HashSet::new(),
        }
    }
}

impl Default for RandomizedIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdAllocator for RandomizedIds {
    fn next_id(&mut self) -> u64 {
        loop {
            let random_part: u64 = rand::random_range(RANDOM_PART_MIN..=RANDOM_PART_MAX);
            let timestamp_part = (self.clock)() % 1000;
            let id = random_part * 1000 + timestamp_part;
            if self.issued.insert(id) {
                return id;
            }
        }
    }
}

fn unix_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
