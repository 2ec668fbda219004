//! Payload id allocation
//!
//! Candidates are drawn uniformly from the 10-digit decimal range and probed
//! against the store. The probe only makes collisions rare; the store's
//! insert is what actually guarantees uniqueness.

use crate::error::{RegistryError, RegistryResult};
use crate::metrics;
use crate::models::PayloadId;
use crate::store::VideoStore;
use rand::Rng;
use tracing::debug;

/// Smallest 10-digit payload id
pub const PAYLOAD_ID_MIN: i64 = 1_000_000_000;

/// Largest 10-digit payload id
pub const PAYLOAD_ID_MAX: i64 = 9_999_999_999;

/// Default bound on existence probes per allocation
pub const DEFAULT_MAX_PROBES: u32 = 16;

/// Source of candidate payload ids
pub trait CandidateSource: Send + Sync {
    fn next_candidate(&self) -> PayloadId;
}

/// Uniform draw over `[PAYLOAD_ID_MIN, PAYLOAD_ID_MAX]`
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformDigits;

impl CandidateSource for UniformDigits {
    fn next_candidate(&self) -> PayloadId {
        PayloadId::new(rand::thread_rng().gen_range(PAYLOAD_ID_MIN..=PAYLOAD_ID_MAX))
    }
}

pub struct IdAllocator {
    source: Box<dyn CandidateSource>,
    max_probes: u32,
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new(UniformDigits, DEFAULT_MAX_PROBES)
    }
}

impl IdAllocator {
    pub fn new(source: impl CandidateSource + 'static, max_probes: u32) -> Self {
        Self {
            source: Box::new(source),
            max_probes: max_probes.max(1),
        }
    }

    pub fn max_probes(&self) -> u32 {
        self.max_probes
    }

    /// Return a candidate that was free at the instant of the probe.
    ///
    /// # Errors
    ///
    /// `AllocationExhausted` once `max_probes` candidates in a row were taken,
    /// which in practice means the id space is close to saturated.
    pub async fn allocate(&self, store: &dyn VideoStore) -> RegistryResult<PayloadId> {
        for probe in 1..=self.max_probes {
            let candidate = self.source.next_candidate();
            if !store.exists(candidate).await? {
                return Ok(candidate);
            }
            metrics::record_collision("probe");
            debug!(payload_id = %candidate, probe, "Payload id candidate already taken");
        }

        Err(RegistryError::AllocationExhausted {
            attempts: self.max_probes,
        })
    }
}
