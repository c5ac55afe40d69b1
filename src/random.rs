//! Pluggable random source for spawn sizes, spawn colours and slide direction.

use rand::Rng;
use rand::rngs::StdRng;

/// Uniform choice among `n` options.
pub trait RandomSource {
    /// Index in `0..n`. `n` is never zero.
    fn pick(&mut self, n: usize) -> usize;
}

impl RandomSource for StdRng {
    #[inline]
    fn pick(&mut self, n: usize) -> usize {
        self.gen_range(0..n)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    #[inline]
    fn pick(&mut self, n: usize) -> usize {
        (**self).pick(n)
    }
}

/// Replays a fixed list of picks (each taken modulo `n`), then repeats the
/// last one. For tests that need a specific spawn or slide.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct Scripted {
    picks: std::collections::VecDeque<usize>,
    last: usize,
}

#[cfg(test)]
impl Scripted {
    pub(crate) fn new(picks: impl IntoIterator<Item = usize>) -> Self {
        Self {
            picks: picks.into_iter().collect(),
            last: 0,
        }
    }
}

#[cfg(test)]
impl RandomSource for Scripted {
    fn pick(&mut self, n: usize) -> usize {
        if let Some(next) = self.picks.pop_front() {
            self.last = next;
        }
        self.last % n
    }
}
