//! WebGPU rendering module
//!
//! The simulation paints into a `VertexBatch` through `DrawSurface`; the
//! batch is then uploaded and drawn as a single triangle list.

pub mod batch;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use batch::VertexBatch;
pub use pipeline::RenderState;
pub use vertex::{Vertex, colors};
