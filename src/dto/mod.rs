//! Page data handed from services to templates.

pub mod list;
