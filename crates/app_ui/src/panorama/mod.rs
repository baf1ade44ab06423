//! Spherical projection of equirectangular panoramas

pub mod orbit;
pub mod pipeline;
pub mod sphere;

pub use orbit::{OrbitCamera, OrbitSettings};
pub use pipeline::{PanoramaCallback, PanoramaResources};
pub use sphere::{SphereMesh, SphereVertex};
