//! Markup rendering to image attachments.

pub mod latex;

pub use latex::LatexRenderer;
