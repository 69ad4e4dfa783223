//! Access-pattern tracking pipeline.

pub mod tracker;

#[cfg(test)]
mod tracker_test;

pub use tracker::Tracker;
