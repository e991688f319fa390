pub mod config;
pub mod default_link;
pub mod error;
pub mod feedback;
pub mod ui_state;
