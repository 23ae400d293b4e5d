pub mod analytics;
pub mod cli;
pub mod config;
pub mod form;
pub mod predict;
pub mod render;
pub mod web;
