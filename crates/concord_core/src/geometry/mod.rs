//! # Geometry
//!
//! Bounding boxes and rays for target acquisition.

mod aabb;
mod ray;

pub use aabb::Aabb;
pub use ray::Ray;
