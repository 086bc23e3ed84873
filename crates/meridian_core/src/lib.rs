//! Meridian Core
//!
//! Foundational types shared by the Meridian camera engine:
//!
//! - **Geo primitives**: coordinates, screen points, insets, Web Mercator math
//! - **Camera types**: partial [`CameraPose`] and full [`CameraState`]
//! - **Collaborators**: the [`CameraRenderer`] and [`Clock`] traits the
//!   animation engine is written against, plus in-memory implementations
//!
//! # Example
//!
//! ```rust
//! use meridian_core::{CameraPose, CameraRenderer, CameraState, Coordinate, HeadlessRenderer, Size};
//!
//! let renderer = HeadlessRenderer::new(
//!     CameraState::new(Coordinate::new(0.0, 0.0), 3.0, 0.0, 0.0),
//!     Size::new(375.0, 812.0),
//! );
//! renderer.set_camera(&CameraPose::new().with_zoom(5.0));
//! assert_eq!(renderer.camera_state().zoom, 5.0);
//! ```

pub mod camera;
pub mod clock;
pub mod geo;
pub mod renderer;

pub use camera::{CameraBounds, CameraPose, CameraState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use geo::{
    mercator, normalize_bearing, shortest_angle_delta, wrap, Coordinate, EdgeInsets, ScreenPoint,
    Size,
};
pub use renderer::{CameraRenderer, HeadlessRenderer};
