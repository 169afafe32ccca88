//! Audit: asset resolution, report assembly, strict gating, and the two pipelines.

pub mod assets;
pub mod backend;
pub mod frontend;
pub mod gate;
pub mod report;
