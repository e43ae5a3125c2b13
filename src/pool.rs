//! The vetted sample pool (`spec.md` §3): an ordered run of filtered
//! samples plus a consumption cursor, readable by the consumer only after
//! the run that filled it has passed qualification.

/// `N` filtered samples plus a cursor counting how many have been handed
/// out. Created exhausted (`consumed == N`) so the very first call to
/// [`crate::QualificationEngine::random_32_bytes`] always triggers a
/// fresh acquisition rather than serving zeroed samples (`spec.md` §3:
/// "created empty").
///
/// [`SamplePool::reset_cursor`] is the only way to make samples readable
/// again; the engine calls it exactly once, after a run's verdict is
/// `TestFailures::PASS` (`crate::verdict::TestFailures`), so a failed run
/// leaves the pool exhausted and its samples unreachable.
#[derive(Clone)]
pub struct SamplePool<const N: usize> {
    samples: [u16; N],
    consumed: usize,
}

impl<const N: usize> Default for SamplePool<N> {
    fn default() -> Self {
        Self {
            samples: [0; N],
            consumed: N,
        }
    }
}

impl<const N: usize> SamplePool<N> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether every sample has already been handed to the consumer (or
    /// the pool has never been filled).
    pub fn is_exhausted(&self) -> bool {
        self.consumed >= N
    }

    /// All `N` samples, for histogramming and PSD accumulation over the
    /// whole pool (`spec.md` §4.7 steps 3-4).
    pub fn samples(&self) -> &[u16; N] {
        &self.samples
    }

    /// Overwrite one decimated block (`block.len()` samples starting at
    /// `block_index * block.len()`) with a FIR decimator's output,
    /// reinterpreting each rounded `i16` as its `u16` bit pattern (the
    /// data model's `FilteredSample`, `spec.md` §3).
    pub fn fill_block(&mut self, block_index: usize, block: &[i16]) {
        let start = block_index * block.len();
        let end = start + block.len();
        for (slot, &sample) in self.samples[start..end].iter_mut().zip(block) {
            *slot = sample as u16;
        }
    }

    /// Make the pool's samples readable from the start again. Called once
    /// per run, only on a `PASS` verdict.
    pub fn reset_cursor(&mut self) {
        self.consumed = 0;
    }

    /// Take the next 16 samples as little-endian bytes, advancing the
    /// cursor by exactly 16 (`spec.md` §4.7, §8 "cursor advance"). `None`
    /// if fewer than 16 samples remain, which cannot happen given `N` is
    /// checked at construction to be a multiple of 16.
    pub fn take16_le_bytes(&mut self) -> Option<[u8; 32]> {
        if self.consumed + 16 > N {
            return None;
        }
        let mut out = [0u8; 32];
        for (chunk, &sample) in out
            .chunks_exact_mut(2)
            .zip(&self.samples[self.consumed..self.consumed + 16])
        {
            chunk.copy_from_slice(&sample.to_le_bytes());
        }
        self.consumed += 16;
        Some(out)
    }
}
