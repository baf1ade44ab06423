//! Viewer mode state and navigation history

use crate::asset::AssetReference;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Back entries kept; older ones are forgotten
pub const HISTORY_LIMIT: usize = 50;

/// Which viewer to mount for an asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerKind {
    /// Orbit-controlled spherical projection
    Interactive,
    /// Flat high-resolution image
    Static,
}

impl ViewerKind {
    pub fn other(&self) -> Self {
        match self {
            ViewerKind::Interactive => ViewerKind::Static,
            ViewerKind::Static => ViewerKind::Interactive,
        }
    }

    /// Caption of the button that switches *to* this viewer
    pub fn open_label(&self) -> &'static str {
        match self {
            ViewerKind::Interactive => "Open in Interactive Viewer",
            ViewerKind::Static => "Open in Static Viewer",
        }
    }
}

/// Navigation state handed to a viewer on entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationPayload {
    pub image_url: Option<String>,
}

impl NavigationPayload {
    pub fn with_image(url: impl Into<String>) -> Self {
        Self {
            image_url: Some(url.into()),
        }
    }
}

/// What the main area currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerMode {
    Browsing,
    Interactive(AssetReference),
    Static(AssetReference),
}

impl ViewerMode {
    pub fn viewing(kind: ViewerKind, asset: AssetReference) -> Self {
        match kind {
            ViewerKind::Interactive => ViewerMode::Interactive(asset),
            ViewerKind::Static => ViewerMode::Static(asset),
        }
    }

    pub fn kind(&self) -> Option<ViewerKind> {
        match self {
            ViewerMode::Browsing => None,
            ViewerMode::Interactive(_) => Some(ViewerKind::Interactive),
            ViewerMode::Static(_) => Some(ViewerKind::Static),
        }
    }

    pub fn asset(&self) -> Option<&AssetReference> {
        match self {
            ViewerMode::Browsing => None,
            ViewerMode::Interactive(asset) | ViewerMode::Static(asset) => Some(asset),
        }
    }
}

impl fmt::Display for ViewerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewerMode::Browsing => f.write_str("browsing"),
            ViewerMode::Interactive(asset) => write!(f, "interactive({})", asset),
            ViewerMode::Static(asset) => write!(f, "static({})", asset),
        }
    }
}

/// Moves between the explorer and the two viewers.
///
/// Each transition bumps [`generation`](Self::generation); a viewer mounted
/// for an older generation must be torn down and rebuilt.
pub struct ViewerCoordinator {
    default_asset: AssetReference,
    mode: ViewerMode,
    history: VecDeque<ViewerMode>,
    forward: Vec<ViewerMode>,
    generation: u64,
}

impl ViewerCoordinator {
    pub fn new(default_image_url: impl Into<String>) -> Self {
        Self {
            default_asset: AssetReference::new(default_image_url),
            mode: ViewerMode::Browsing,
            history: VecDeque::new(),
            forward: Vec::new(),
            generation: 0,
        }
    }

    pub fn mode(&self) -> &ViewerMode {
        &self.mode
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn current_asset(&self) -> Option<&AssetReference> {
        self.mode.asset()
    }

    pub fn default_asset(&self) -> &AssetReference {
        &self.default_asset
    }

    /// Open an explorer selection in the viewer the user picked
    pub fn open(&mut self, payload: NavigationPayload, kind: ViewerKind) {
        let asset = self.asset_for(payload);
        self.navigate_to(ViewerMode::viewing(kind, asset));
    }

    /// Direct entry, e.g. from the command line. `None` kind means the explorer.
    pub fn enter(&mut self, kind: Option<ViewerKind>, payload: Option<NavigationPayload>) {
        let mode = match kind {
            Some(kind) => ViewerMode::viewing(kind, self.asset_for(payload.unwrap_or_default())),
            None => ViewerMode::Browsing,
        };
        self.navigate_to(mode);
    }

    /// Hand the current asset to the other viewer
    pub fn open_in_other_viewer(&mut self) -> bool {
        let next = match &self.mode {
            ViewerMode::Browsing => return false,
            ViewerMode::Interactive(asset) => ViewerMode::Static(asset.clone()),
            ViewerMode::Static(asset) => ViewerMode::Interactive(asset.clone()),
        };
        self.navigate_to(next);
        true
    }

    pub fn back_to_explorer(&mut self) -> bool {
        if self.mode == ViewerMode::Browsing {
            return false;
        }
        self.navigate_to(ViewerMode::Browsing);
        true
    }

    /// Go back in history
    pub fn go_back(&mut self) -> bool {
        if let Some(prev) = self.history.pop_back() {
            let current = std::mem::replace(&mut self.mode, prev);
            self.forward.push(current);
            self.bump();
            true
        } else {
            false
        }
    }

    /// Go forward in history
    pub fn go_forward(&mut self) -> bool {
        if let Some(next) = self.forward.pop() {
            let current = std::mem::replace(&mut self.mode, next);
            self.remember(current);
            self.bump();
            true
        } else {
            false
        }
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_go_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    fn asset_for(&self, payload: NavigationPayload) -> AssetReference {
        match payload.image_url {
            Some(url) => AssetReference::new(url),
            None => {
                tracing::debug!("No image in navigation state, using {}", self.default_asset);
                self.default_asset.clone()
            }
        }
    }

    fn navigate_to(&mut self, mode: ViewerMode) {
        let old = std::mem::replace(&mut self.mode, mode);
        self.remember(old);
        self.forward.clear();
        self.bump();
    }

    fn remember(&mut self, mode: ViewerMode) {
        self.history.push_back(mode);
        if self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
    }

    fn bump(&mut self) {
        self.generation += 1;
        tracing::info!(generation = self.generation, "viewer mode -> {}", self.mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::resolve;

    const DEFAULT: &str = "/Images/panoramas/20241007/room02.jpg";
    const ROOM05: &str = "/Images/panoramas/20241009/room05.jpg";

    #[test]
    fn test_switching_viewers_preserves_asset() {
        let mut nav = ViewerCoordinator::new(DEFAULT);
        nav.open(NavigationPayload::with_image(ROOM05), ViewerKind::Interactive);

        assert!(nav.open_in_other_viewer());
        assert_eq!(nav.mode(), &ViewerMode::Static(AssetReference::new(ROOM05)));

        assert!(nav.open_in_other_viewer());
        assert_eq!(nav.mode(), &ViewerMode::Interactive(AssetReference::new(ROOM05)));
        assert_eq!(nav.current_asset().map(|a| a.path()), Some(ROOM05));
    }

    #[test]
    fn test_missing_payload_uses_default() {
        for kind in [ViewerKind::Interactive, ViewerKind::Static] {
            let mut nav = ViewerCoordinator::new(DEFAULT);
            nav.enter(Some(kind), None);
            let asset = nav.current_asset().unwrap();
            assert_eq!(asset.path(), DEFAULT);
            assert_eq!(nav.mode().kind(), Some(kind));

            let resolved = resolve(asset.path());
            assert_eq!(resolved.file_name, "room02.jpg");
            assert_eq!(resolved.date_label(), "2024-10-07");
        }

        let mut nav = ViewerCoordinator::new(DEFAULT);
        nav.open(NavigationPayload::default(), ViewerKind::Static);
        assert_eq!(nav.current_asset().unwrap().path(), DEFAULT);
    }

    #[test]
    fn test_back_to_explorer_drops_asset() {
        let mut nav = ViewerCoordinator::new(DEFAULT);
        assert!(!nav.back_to_explorer());

        nav.open(NavigationPayload::with_image(ROOM05), ViewerKind::Static);
        assert!(nav.back_to_explorer());
        assert_eq!(nav.mode(), &ViewerMode::Browsing);
        assert!(nav.current_asset().is_none());
        assert!(!nav.open_in_other_viewer());
    }

    #[test]
    fn test_history_restores_modes() {
        let mut nav = ViewerCoordinator::new(DEFAULT);
        nav.open(NavigationPayload::with_image(ROOM05), ViewerKind::Interactive);
        nav.open_in_other_viewer();

        assert!(nav.go_back());
        assert_eq!(nav.mode(), &ViewerMode::Interactive(AssetReference::new(ROOM05)));
        assert!(nav.go_back());
        assert_eq!(nav.mode(), &ViewerMode::Browsing);
        assert!(!nav.go_back());

        assert!(nav.go_forward());
        assert!(nav.go_forward());
        assert_eq!(nav.mode(), &ViewerMode::Static(AssetReference::new(ROOM05)));
        assert!(!nav.can_go_forward());

        // A fresh transition discards the forward stack
        nav.go_back();
        nav.back_to_explorer();
        assert!(!nav.go_forward());
    }

    #[test]
    fn test_history_is_bounded() {
        let mut nav = ViewerCoordinator::new(DEFAULT);
        for _ in 0..HISTORY_LIMIT {
            nav.open(NavigationPayload::with_image(ROOM05), ViewerKind::Interactive);
            nav.back_to_explorer();
        }
        nav.open(NavigationPayload::with_image(ROOM05), ViewerKind::Static);

        let mut steps = 0;
        while nav.go_back() {
            steps += 1;
        }
        assert_eq!(steps, HISTORY_LIMIT);
        // The initial explorer entry is gone; the walk stops at a viewer
        assert_eq!(nav.mode(), &ViewerMode::Interactive(AssetReference::new(ROOM05)));

        while nav.go_forward() {}
        assert_eq!(nav.mode(), &ViewerMode::Static(AssetReference::new(ROOM05)));
        assert!(nav.can_go_back());
    }

    #[test]
    fn test_every_transition_bumps_generation() {
        let mut nav = ViewerCoordinator::new(DEFAULT);
        let mut last = nav.generation();

        nav.open(NavigationPayload::with_image(ROOM05), ViewerKind::Interactive);
        assert!(nav.generation() > last);
        last = nav.generation();

        nav.open_in_other_viewer();
        assert!(nav.generation() > last);
        last = nav.generation();

        // Same asset, same kind: still a remount
        nav.open(NavigationPayload::with_image(ROOM05), ViewerKind::Static);
        assert!(nav.generation() > last);
        last = nav.generation();

        nav.go_back();
        assert!(nav.generation() > last);
    }

    #[test]
    fn test_payload_serde_shape() {
        let payload: NavigationPayload = serde_json::from_str(r#"{"image_url":"/a/b/20240101/c.jpg"}"#).unwrap();
        assert_eq!(payload.image_url.as_deref(), Some("/a/b/20240101/c.jpg"));
        let empty: NavigationPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, NavigationPayload::default());
    }
}
