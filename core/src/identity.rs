//! Per-run uniqueness tracking for national (DNI) and tax (RUC) IDs.
//!
//! IDs are drawn by rejection sampling from a fixed numeric range.
//! Every draw is bounded: after `max_attempts` consecutive collisions
//! the sampler gives up with `GenError::IdSpaceExhausted` instead of
//! spinning forever on a saturated range.

use crate::{
    config::IdRange,
    error::{GenError, GenResult},
    rng::PhaseRng,
};
use std::collections::HashSet;

pub struct UniqueIdSampler {
    kind: &'static str,
    range: IdRange,
    max_attempts: u32,
    issued: HashSet<i64>,
}

impl UniqueIdSampler {
    pub fn new(kind: &'static str, range: IdRange, max_attempts: u32) -> Self {
        Self {
            kind,
            range,
            max_attempts,
            issued: HashSet::new(),
        }
    }

    /// Make room for `additional` more draws, failing up front when the
    /// range cannot hold that many distinct values.
    pub fn reserve(&mut self, additional: usize) -> GenResult<()> {
        let needed = (self.issued.len() + additional) as u64;
        if needed > self.range.len() {
            return Err(GenError::IdSpaceExhausted {
                kind: self.kind,
                attempts: 0,
            });
        }
        self.issued.reserve(additional);
        Ok(())
    }

    /// Draw a value not issued before in this run.
    pub fn draw(&mut self, rng: &mut PhaseRng) -> GenResult<i64> {
        for _ in 0..self.max_attempts {
            let candidate = self.range.sample(rng);
            if self.issued.insert(candidate) {
                return Ok(candidate);
            }
        }
        Err(GenError::IdSpaceExhausted {
            kind: self.kind,
            attempts: self.max_attempts,
        })
    }

    pub fn issued(&self) -> usize {
        self.issued.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_are_unique_and_in_range() {
        let range = IdRange::new(70_000_000, 79_999_999);
        let mut sampler = UniqueIdSampler::new("dni", range, 100);
        let mut rng = PhaseRng::new(1, 0);
        let mut seen = HashSet::new();
        for _ in 0..5_000 {
            let id = sampler.draw(&mut rng).unwrap();
            assert!(range.contains(id));
            assert!(seen.insert(id), "duplicate id {id}");
        }
        assert_eq!(sampler.issued(), 5_000);
    }

    #[test]
    fn small_range_fills_completely() {
        let mut sampler = UniqueIdSampler::new("tiny", IdRange::new(1, 8), 10_000);
        let mut rng = PhaseRng::new(2, 0);
        let mut all: Vec<i64> = (0..8).map(|_| sampler.draw(&mut rng).unwrap()).collect();
        all.sort_unstable();
        assert_eq!(all, (1..=8).collect::<Vec<_>>());
    }

    #[test]
    fn saturated_range_fails_instead_of_spinning() {
        let mut sampler = UniqueIdSampler::new("tiny", IdRange::new(1, 2), 50);
        let mut rng = PhaseRng::new(3, 0);
        sampler.draw(&mut rng).unwrap();
        sampler.draw(&mut rng).unwrap();
        let err = sampler.draw(&mut rng).unwrap_err();
        assert!(matches!(err, GenError::IdSpaceExhausted { kind: "tiny", attempts: 50 }));
    }

    #[test]
    fn reserve_rejects_oversized_requests() {
        let mut sampler = UniqueIdSampler::new("ruc", IdRange::new(10, 19), 10);
        assert!(sampler.reserve(10).is_ok());
        assert!(matches!(
            sampler.reserve(11),
            Err(GenError::IdSpaceExhausted { kind: "ruc", .. })
        ));
    }
}
