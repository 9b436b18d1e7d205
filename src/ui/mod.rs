pub mod render;
pub mod style;

pub use render::{LiveView, render_segments};
