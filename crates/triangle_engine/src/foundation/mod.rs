//! Foundation module - logging setup

pub mod logging;
