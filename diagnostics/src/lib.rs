//! Source positions and diagnostic rendering shared by the parser, the
//! compiler, and the command-line tools.

pub mod location;
pub mod render;

pub use location::{Position, SourceLocation};
pub use render::render_snippet;
