// Order Book Aggregation - cross-venue depth merging

pub mod book_merger;

pub use book_merger::{BookMerger, DepthSource, MergedBook};
