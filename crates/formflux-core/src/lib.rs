//! # FormFlux Core Library
//!
//! This library provides the headless core of a multi-step form wizard:
//! the cumulative answer bag, declarative step schemas, the form state
//! engine with gated navigation and snapshot persistence, recipe cost
//! calculation, and the wizard shell that drives a flow end to end.

pub mod answers;
pub mod costing;
pub mod engine;
pub mod events;
pub mod schema;
pub mod store;
pub mod units;
pub mod wizard;
