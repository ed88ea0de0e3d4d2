//! Candidate placements and deterministic best-peak selection.

pub(crate) mod topk;
