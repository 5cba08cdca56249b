//! Query modules for the REE price SDK.
//!
//! Each module provides a query struct that borrows from a [`ReeSdk`](crate::ReeSdk)
//! and exposes date-range helpers on top of the fetch pipeline.

pub mod prices;

pub use prices::PriceQuery;
