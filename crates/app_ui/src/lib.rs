//! Site Survey Viewer UI Layer
//!
//! Provides:
//! - egui-based GUI components
//! - wgpu rendering pipeline and the spherical panorama renderer
//! - Window fullscreen platform
//! - Input handling

pub mod components;
pub mod fullscreen;
pub mod input;
pub mod panorama;
pub mod renderer;
pub mod theme;

pub use fullscreen::{WindowFullscreen, WINDOW_CONTAINER};
pub use input::InputHandler;
pub use renderer::{GpuCaps, Renderer};
pub use theme::Theme;
