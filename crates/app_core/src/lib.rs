//! Site Survey Viewer Core Domain Logic
//!
//! This crate contains:
//! - Asset path resolution
//! - Fullscreen viewport sessions
//! - Viewer mode coordination and history
//! - Capture catalog and date selection
//! - Configuration
//! - Command ids
//! - Error types
//! - Image loading

pub mod asset;
pub mod catalog;
pub mod command;
pub mod config;
pub mod context;
pub mod date_selection;
pub mod error;
pub mod image_loader;
pub mod navigation;
pub mod viewport;

pub use asset::{resolve, AssetReference, CaptureDate, ResolvedAsset, UNKNOWN_DATE_LABEL};
pub use catalog::{Catalog, CatalogEntry, MediaKind};
pub use command::{Command, CommandId};
pub use config::{AppConfig, CatalogConfig, GeneralConfig, ViewerConfig};
pub use context::AppContext;
pub use date_selection::DateSelection;
pub use error::AppError;
pub use image_loader::{
    is_supported_image, load_image_sync, mip_chain, mip_level_count, ImageLoader, LoadPoll, LoadTicket, LoadedImage,
    ThumbnailGenerator,
};
pub use navigation::{NavigationPayload, ViewerCoordinator, ViewerKind, ViewerMode};
pub use viewport::{ContainerId, FullscreenChange, FullscreenPlatform, FullscreenSignal, Subscription, ViewportSession};
