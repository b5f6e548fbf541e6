//! HTTP Routes

pub mod form;
pub mod predictions;
