//! Deterministic cycle forecasting.
//!
//! # Responsibility
//! - Derive next-period, ovulation and fertility-window dates from a start
//!   date and a cycle length.
//! - Classify calendar days for the cycle calendar view.
//!
//! # Invariants
//! - No I/O and no wall-clock reads: `today` is always a parameter.
//! - Identical inputs always produce identical output.

pub mod calendar;
pub mod cycle;
