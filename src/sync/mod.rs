pub mod future;

pub use future::{FutureReader, FutureState, OneShotFuture};
