//! # Attribute Model
//!
//! Data types shared by every layer, from the graph up to the facades.
//!
//! Design rule: this module is pure data. No locks, no I/O.

pub mod attrs;
pub mod value;

pub use attrs::{bool_attr, float_attr, int_attr, positive_attr, AttrMap};
pub use value::AttrValue;
