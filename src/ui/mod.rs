mod gauge_widget;
mod layout;

pub use layout::{draw_ui, gauge_container_width};
