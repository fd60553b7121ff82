//! Fantasy football draft-parameter optimizer.
//!
//! A baseline document lists candidate values for every scoring parameter.
//! Each configuration in their Cartesian product drives one team's draft in a
//! simulated league; the season is played out many times in parallel and the
//! configuration with the best mean win rate is kept.

pub mod accuracy;
pub mod cli;
pub mod data;
pub mod league;
pub mod logging;
pub mod optimizer;
pub mod parallel;
pub mod params;
pub mod rng;
pub mod schedule;
