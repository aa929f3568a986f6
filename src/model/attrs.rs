//! Attribute maps and the well-known attribute keys.
//!
//! Every node and edge in a network graph carries an [`AttrMap`]. The routing
//! and congestion layers look up the keys below; anything else riding in the
//! map is preserved verbatim through document round-trips.

use hashbrown::HashMap;

use super::AttrValue;

/// String-keyed attribute map attached to every node and edge.
pub type AttrMap = HashMap<String, AttrValue>;

// ============================================================================
// Well-known keys
// ============================================================================

/// Node x coordinate.
pub const X: &str = "x";
/// Node y coordinate.
pub const Y: &str = "y";
/// Train node: station or terminal flag.
pub const IS_TERMINAL: &str = "is_terminal";
/// Train node: dwell time at the stop, seconds.
pub const DWELL_TIME: &str = "dwell_time";

/// External (vendor file) identifier of the link an edge came from.
pub const LINK_ID: &str = "link_id";
/// Hard speed limit on a link. Preferred by time-based routing when positive.
pub const MAX_SPEED: &str = "max_speed";
/// Uncongested travel speed on a link.
pub const FREE_SPEED: &str = "free_speed";
/// Number of running lanes on a road link.
pub const LANES: &str = "lanes";
/// Per-lane saturation flow of a road link, vehicles/hour.
pub const SATURATION_FLOW: &str = "saturation_flow";
/// Multiplier applied to length by cost-based path metrics.
pub const COST_FACTOR: &str = "cost_factor";

// ============================================================================
// Typed lookups
// ============================================================================

/// Numeric attribute lookup with Int -> Float coercion.
pub fn float_attr(attrs: &AttrMap, key: &str) -> Option<f64> {
    attrs.get(key).and_then(AttrValue::as_float)
}

/// Like [`float_attr`] but only accepts strictly positive, finite values.
///
/// Speeds and flows use this: a zero or negative value in a vendor file means
/// "not set", and must fall back to the caller's default instead of producing
/// an infinite or negative travel time.
pub fn positive_attr(attrs: &AttrMap, key: &str) -> Option<f64> {
    float_attr(attrs, key).filter(|v| v.is_finite() && *v > 0.0)
}

/// Integer attribute lookup.
pub fn int_attr(attrs: &AttrMap, key: &str) -> Option<i64> {
    attrs.get(key).and_then(AttrValue::as_int)
}

/// Boolean attribute lookup.
pub fn bool_attr(attrs: &AttrMap, key: &str) -> Option<bool> {
    attrs.get(key).and_then(AttrValue::as_bool)
}
