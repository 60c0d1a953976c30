//! Prometheus exporter for Jenkins.
//!
//! A [`scheduler::Scheduler`] polls Jenkins on an interval and publishes each
//! cycle's results into a [`cache::SnapshotCache`]; the web handlers render
//! the cached snapshot on every scrape.

pub mod cache;
pub mod collector;
pub mod config;
pub mod jenkins;
pub mod metrics;
pub mod scheduler;
pub mod web;
