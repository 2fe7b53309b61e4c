//! Self-contained helpers.

pub mod date_time;
pub mod url;
