//! Template planning.
//!
//! A plan holds whatever a kernel needs to score placements of one child
//! image: raw channel bytes for SSD, zero-mean luma for ZNCC.

mod plan;

pub use plan::{SsdTemplatePlan, ZnccTemplatePlan};
