//! Environment-driven viewer: runs one detection or feedback query and
//! renders the view model.

pub mod config;
pub mod viewer;
