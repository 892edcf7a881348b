//! Geometrical primitives.

pub use tiny_skia_path::{Point, Rect, Size, Transform};
