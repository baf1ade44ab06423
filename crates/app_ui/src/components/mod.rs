//! UI Components

pub mod asset_image;
pub mod calendar;
pub mod file_explorer;
pub mod flat_viewer;
pub mod spherical_viewer;
pub mod status_bar;
pub mod viewer_chrome;

pub use asset_image::AssetImage;
pub use calendar::Calendar;
pub use file_explorer::{ExplorerAction, FileExplorer};
pub use flat_viewer::{fit_rect, FlatView};
pub use spherical_viewer::SphericalView;
pub use status_bar::{StatusBar, StatusInfo};
pub use viewer_chrome::{AnnotationNotes, ViewerAction, ViewerChrome};
