//! Path-to-mesh tessellation core for antialiased 2D vector graphics.
//!
//! This crate is the CPU stage of an immediate-mode vector renderer: it
//! takes flattened polyline contours and expands them into
//! triangle-strip-friendly vertex buffers the GPU can rasterize directly,
//! with antialiasing coverage baked into the vertex `(u, v)` attributes.
//! Join and cap classification, miter-limit decisions, convexity
//! detection and fringe generation all happen here; curve flattening,
//! paint state and buffer upload are the caller's business.
//!
//! ```
//! use picotess::{LineCap, LineJoin, Path, PointFlags, Solidity};
//!
//! let mut path = Path::new(Solidity::Solid);
//! path.add_point(0.0, 0.0, PointFlags::CORNER);
//! path.add_point(100.0, 0.0, PointFlags::CORNER);
//! path.add_point(100.0, 100.0, PointFlags::CORNER);
//! path.close();
//!
//! path.flatten();
//! path.calculate_joins(2.0, LineJoin::Miter, 10.0);
//! path.expand_stroke(1.0, 0.0, 1.0, 2.0, LineCap::Butt, LineJoin::Miter, 8);
//!
//! // Upload as a triangle strip.
//! let _vertices = path.stroke();
//! ```

mod color;
pub use color::Color;

pub(crate) mod geometry;
pub use geometry::Bounds;

mod path;
pub use path::{curve_divisions, Convexity, LineCap, LineJoin, Path, PointFlags, Solidity};

mod vertex;
pub use vertex::Vertex;
