// Infinite scroll on top of the list controller

pub mod accumulator;

pub use accumulator::{AccumulatorState, InfiniteAccumulator};
