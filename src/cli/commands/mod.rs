//! Command implementations

pub mod ask;
pub mod chart;
pub mod doctor;
