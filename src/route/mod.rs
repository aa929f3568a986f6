//! # Shortest-Path Routing
//!
//! Search algorithms over the graph layer.
//!
//! | Entry point | Algorithm |
//! |-------------|-----------|
//! | [`shortest_path`] | Dijkstra, criterion-weighted |
//! | [`k_shortest_paths`] | Yen's loopless k-shortest, length-weighted |
//!
//! Both are deterministic: equal-cost alternatives resolve to whichever was
//! discovered first, and discovery order follows the graph's sorted neighbor
//! order rather than insertion history.

pub mod dijkstra;
pub mod yen;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::graph::EdgeData;
use crate::model::attrs::{FREE_SPEED, MAX_SPEED};
use crate::model::{positive_attr, AttrMap};
use crate::Error;

pub use dijkstra::shortest_path;
pub use yen::k_shortest_paths;

/// What a shortest-path search minimizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Sum of edge weights (lengths).
    Distance,
    /// Sum of per-edge travel times, see [`edge_travel_time`].
    Time,
}

impl Criterion {
    pub(crate) fn edge_cost(&self, edge: &EdgeData) -> f64 {
        match self {
            Criterion::Distance => edge.weight,
            Criterion::Time => edge_travel_time(edge.weight, &edge.attrs),
        }
    }
}

impl FromStr for Criterion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "distance" => Ok(Criterion::Distance),
            "time" => Ok(Criterion::Time),
            _ => Err(Error::InvalidCriterion(s.to_owned())),
        }
    }
}

impl fmt::Display for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Criterion::Distance => "distance",
            Criterion::Time => "time",
        })
    }
}

/// Travel time of one edge: length over the best available speed.
///
/// Prefers a positive `max_speed`, falls back to a positive `free_speed`,
/// and degrades to the raw length when neither is set so that time-based
/// routing still works on bare graphs.
pub fn edge_travel_time(length: f64, attrs: &AttrMap) -> f64 {
    if let Some(speed) = positive_attr(attrs, MAX_SPEED) {
        return length / speed;
    }
    if let Some(speed) = positive_attr(attrs, FREE_SPEED) {
        return length / speed;
    }
    length
}
