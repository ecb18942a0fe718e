pub mod export;
pub mod project;
pub mod setup;
pub mod ui;
