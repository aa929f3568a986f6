//! # Attributed Digraph Engine
//!
//! The generic storage layer. [`Graph`] holds nodes and directed edges, each
//! with a weight and an [`crate::model::AttrMap`], behind one lock. Facades
//! pick a key type (the vendor formats use `i64`) and project their records
//! onto it.
//!
//! | Piece | What it is |
//! |-------|------------|
//! | [`Graph`] | thread-safe attributed digraph |
//! | [`GraphEvent`] / [`GraphObserver`] | change notification seam |
//! | [`GraphDocument`] | lossless serializable snapshot |

pub mod digraph;
pub mod document;
pub mod event;

use std::fmt;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use digraph::Graph;
pub use document::{EdgeEntry, GraphDocument, NodeEntry};
pub use event::{GraphEvent, GraphObserver};

pub(crate) use digraph::{EdgeData, GraphInner};

/// Everything a node identifier must support.
///
/// `Ord` gives deterministic iteration and sorted snapshots, `Hash` feeds the
/// routing layer's distance maps, `Display` keeps error messages readable,
/// and the serde bounds make documents work. Implemented automatically; `i64`
/// and `String` both qualify.
pub trait NodeKey:
    Clone
    + Eq
    + Ord
    + Hash
    + fmt::Debug
    + fmt::Display
    + Send
    + Sync
    + Serialize
    + DeserializeOwned
    + 'static
{
}

impl<T> NodeKey for T where
    T: Clone
        + Eq
        + Ord
        + Hash
        + fmt::Debug
        + fmt::Display
        + Send
        + Sync
        + Serialize
        + DeserializeOwned
        + 'static
{
}
