//! Metadata about the relational schema the pipeline is allowed to query.

pub mod metadata;
