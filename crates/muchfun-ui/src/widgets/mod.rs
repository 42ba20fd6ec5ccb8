//! Custom widgets

pub mod custom;
pub mod level_meter;

pub use level_meter::LevelMeter;
