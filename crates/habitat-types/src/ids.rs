//! Process-unique integer identifiers.
//!
//! Every agent and every model carries a strongly-typed ID so the two can
//! never be mixed up at compile time. IDs are drawn from process-wide
//! atomic counters: each counter starts at 0, only ever increases, and is
//! shared by every model in the process. An agent ID therefore stays unique
//! for the lifetime of the program, whichever model the agent ends up in.

use core::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `u64` backed by its own allocator.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident, $counter:ident
    ) => {
        static $counter: AtomicU64 = AtomicU64::new(0);

        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            /// Allocate the next identifier from the process-wide counter.
            ///
            /// Allocation is a single atomic increment, so identifiers stay
            /// unique even when entities are created from several threads.
            pub fn allocate() -> Self {
                Self($counter.fetch_add(1, Ordering::Relaxed))
            }

            /// Return the raw integer value.
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for an agent, assigned once at construction.
    AgentId, NEXT_AGENT_ID
}

define_id! {
    /// Unique identifier for a model instance.
    ModelId, NEXT_MODEL_ID
}
