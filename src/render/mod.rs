//! Report rendering for humans: combined HTML.

pub mod html;
