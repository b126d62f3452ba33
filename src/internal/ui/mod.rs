pub mod animation;
pub mod app;
pub mod back_to_top;
pub mod show_more;
pub mod view;
