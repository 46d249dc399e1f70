//! Application services: page assembly on top of the repository traits.

pub mod aggregates;
pub mod chrome;
pub mod error;
pub mod feed;
pub mod repos;
pub mod serializers;
