/**
 * Change Records
 *
 * A change record describes what data a resolver touched: the operation
 * (read or update), its arity, the destination type, and the ids and
 * attributes involved. Read records become a subscription's interest set;
 * update records are matched against interest sets to find stale
 * subscriptions.
 */

use serde::{Deserialize, Serialize};

/// What the resolver did with the destination entities
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Update,
}

/// How many destination entities were touched
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Arity {
    One,
    Many,
}

/// One entity access recorded by a resolver
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub op: Operation,
    pub arity: Arity,
    /// Destination entity type name
    pub dst_type: String,
    /// Ids touched; empty means "all instances of the type"
    pub dst_ids: Vec<String>,
    /// Attributes touched; empty means "all attributes"
    pub dst_attrs: Vec<String>,
}

impl ChangeRecord {
    /// A single-entity read record
    pub fn read_one(dst_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            op: Operation::Read,
            arity: Arity::One,
            dst_type: dst_type.into(),
            dst_ids: vec![id.into()],
            dst_attrs: Vec::new(),
        }
    }

    /// A many-entity read record
    pub fn read_many(dst_type: impl Into<String>, ids: Vec<String>) -> Self {
        Self {
            op: Operation::Read,
            arity: Arity::Many,
            dst_type: dst_type.into(),
            dst_ids: ids,
            dst_attrs: Vec::new(),
        }
    }

    /// A single-entity update record
    pub fn update_one(dst_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            op: Operation::Update,
            arity: Arity::One,
            dst_type: dst_type.into(),
            dst_ids: vec![id.into()],
            dst_attrs: Vec::new(),
        }
    }

    /// Restrict the record to the given attributes
    pub fn with_attrs(mut self, attrs: Vec<String>) -> Self {
        self.dst_attrs = attrs;
        self
    }

    /// Whether this (update) record invalidates the given interest record
    ///
    /// Type names must match exactly; id and attribute sets match when they
    /// overlap, with an empty set acting as a wildcard on either side.
    pub fn invalidates(&self, interest: &ChangeRecord) -> bool {
        self.dst_type == interest.dst_type
            && overlaps(&self.dst_ids, &interest.dst_ids)
            && overlaps(&self.dst_attrs, &interest.dst_attrs)
    }
}

fn overlaps(a: &[String], b: &[String]) -> bool {
    a.is_empty() || b.is_empty() || a.iter().any(|x| b.contains(x))
}
