//! Tests for the relation loader.
//!
//! Organized by functionality:
//! - belongs-to resolution and sibling widening
//! - has-many resolution and grouping
//! - deduplication of concurrent traversals
//! - negative caching (missing rows, parents without children)
//! - failure propagation and timeouts
//! - confluence across interleavings

mod mocks;
