//! Graphics primitives: colors, graphics states, images and shadings.

pub mod color;
pub mod ext_g_state;
pub mod image;
pub mod shading;
