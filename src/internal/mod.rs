pub mod debounce;
pub mod locale;
pub mod models;
pub mod notification;
pub mod page;
pub mod render;
pub mod search;
pub mod ui;
