//! Row-parallel iteration with rayon when the `parallel` feature is on,
//! plain iterators otherwise. Algorithms write `(0..rows).into_par_iter()`
//! either way.

#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
pub use serial::IntoParallelIterator;

#[cfg(not(feature = "parallel"))]
mod serial {
    pub trait IntoParallelIterator: IntoIterator + Sized {
        fn into_par_iter(self) -> Self::IntoIter {
            self.into_iter()
        }
    }

    impl<I: IntoIterator> IntoParallelIterator for I {}
}
