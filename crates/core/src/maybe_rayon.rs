//! Row-parallel iteration shim.
//!
//! With the `parallel` feature the elementwise kernels fan rows out over
//! rayon's thread pool. Without it `into_par_iter()` falls back to a plain
//! `into_iter()`, so kernel code is written once against either backend.

#[cfg(feature = "parallel")]
pub(crate) use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    pub(crate) trait IntoParallelIterator {
        type Iter;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub(crate) use sequential::*;
