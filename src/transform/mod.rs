// src/transform/mod.rs

pub mod clean;
pub mod features;
pub mod normalize;
pub mod reshape;
pub mod select;
