// Template module.
// Renders cached feed records into HTML through loop and container templates.

pub mod date;
pub mod filter;
pub mod render;

pub use filter::{Filter, FilterKind};
pub use render::{
    RenderContext, render_container, render_feed, render_item, replace_field, stylesheet,
};
