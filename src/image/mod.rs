//! Image buffers and geometry.

pub mod array2d;
pub mod color;
pub mod geom;
pub mod lab_image;

pub use array2d::{Array2D, Tile, TileIter};
pub use geom::Rect;
pub use lab_image::{Channel, LabImage, LabPixel};
