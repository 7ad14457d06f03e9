//! Custody domain: bucket keys.

pub mod bucket;

pub use bucket::CustodyBucket;
