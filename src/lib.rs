pub mod catalog;
pub mod config;
pub mod db;
pub mod detail;
pub mod factory;
pub mod images;
pub mod model;
pub mod pagination;
pub mod state;
pub mod task_group;
