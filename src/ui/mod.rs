pub mod surface;

pub use surface::{MapSurfaceController, SurfaceFactory, SurfaceView};
