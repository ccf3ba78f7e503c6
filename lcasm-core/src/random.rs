use rand::rngs::{StdRng, ThreadRng};
use rand::Rng;

/// Source of the random draws made by non-deterministic instructions.
///
/// A seeded [`StdRng`] gives a reproducible stream per machine; [`ThreadRng`]
/// gives the unseeded behavior.
pub trait RandomSource {
    /// Uniform integer in `0..bound`. `bound` must be non-zero.
    fn below(&mut self, bound: u32) -> u32;
}

macro_rules! impl_random_source {
    ($($rng:ty),+) => {
        $(impl RandomSource for $rng {
            fn below(&mut self, bound: u32) -> u32 {
                self.gen_range(0..bound)
            }
        })+
    };
}

impl_random_source!(StdRng, ThreadRng);

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn below(&mut self, bound: u32) -> u32 {
        (**self).below(bound)
    }
}
