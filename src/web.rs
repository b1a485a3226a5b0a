//! Web presentation layer.

pub mod ui;
