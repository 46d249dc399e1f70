//! Precomputed per-entity counts handed to the serializers.
//!
//! A lookup for an id that was not part of the batch is an error: the
//! mapping and the rows being serialized must come from the same slice.

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateKind {
    CommentsPerPost,
    PostsPerTag,
}

impl AggregateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AggregateKind::CommentsPerPost => "comments-per-post",
            AggregateKind::PostsPerTag => "posts-per-tag",
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no {kind} count was prefetched for `{id}`")]
pub struct MissingAggregate {
    pub kind: AggregateKind,
    pub id: Uuid,
}

#[derive(Debug, Clone)]
pub struct Counts {
    kind: AggregateKind,
    values: HashMap<Uuid, u64>,
}

impl Counts {
    pub fn new(kind: AggregateKind, values: HashMap<Uuid, u64>) -> Self {
        Self { kind, values }
    }

    pub fn get(&self, id: Uuid) -> Result<u64, MissingAggregate> {
        self.values.get(&id).copied().ok_or(MissingAggregate {
            kind: self.kind,
            id,
        })
    }
}
