mod aggregator;
mod metadata;
mod table;

pub use aggregator::BatchAggregator;
