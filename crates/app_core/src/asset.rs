//! Asset path resolution
//!
//! Survey assets live at `/<category>/<kind>/<YYYYMMDD>/<file>`, where `kind`
//! is `thumbnails` for the explorer grid and `panoramas` for full resolution.

use crate::AppError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Index of the date segment in `path.split('/')` (leading empty segment included)
pub const DATE_SEGMENT_INDEX: usize = 3;

/// Directory token used by the explorer thumbnails
pub const THUMBNAIL_TOKEN: &str = "thumbnails";

/// Directory token used by full-resolution panoramas
pub const PANORAMA_TOKEN: &str = "panoramas";

/// Label shown when the capture date cannot be read from a path
pub const UNKNOWN_DATE_LABEL: &str = "Unknown date";

/// One viewable item, identified by its asset path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetReference {
    path: String,
}

impl AssetReference {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Derive display metadata
    pub fn resolve(&self) -> ResolvedAsset {
        resolve(&self.path)
    }

    /// Location of the asset under a local asset root
    pub fn local_path(&self, asset_root: &Path) -> PathBuf {
        asset_root.join(self.path.trim_start_matches('/'))
    }
}

impl fmt::Display for AssetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// Capture date embedded in an asset path
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CaptureDate {
    year: u16,
    month: u8,
    day: u8,
}

impl CaptureDate {
    /// Parse the `YYYYMMDD` segment of an asset path
    pub fn from_path(path: &str) -> Result<Self, AppError> {
        let segment = path
            .split('/')
            .nth(DATE_SEGMENT_INDEX)
            .ok_or_else(|| AppError::malformed(path, "no date segment"))?;
        Self::from_segment(segment).map_err(|reason| AppError::malformed(path, reason))
    }

    fn from_segment(segment: &str) -> Result<Self, String> {
        if segment.len() != 8 {
            return Err(format!("date segment {:?} is not 8 characters", segment));
        }
        if !segment.bytes().all(|b| b.is_ascii_digit()) {
            return Err(format!("date segment {:?} is not numeric", segment));
        }

        // All-digit and 8 bytes long, so these slices and parses cannot fail
        let year = segment[0..4].parse().map_err(|_| "bad year".to_string())?;
        let month = segment[4..6].parse().map_err(|_| "bad month".to_string())?;
        let day = segment[6..8].parse().map_err(|_| "bad day".to_string())?;

        Ok(Self { year, month, day })
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    /// Calendar date, if the digits form a real date
    pub fn to_naive_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)
    }
}

impl fmt::Display for CaptureDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// Display metadata derived from an asset path
#[derive(Debug)]
pub struct ResolvedAsset {
    pub file_name: String,
    pub capture_date: Result<CaptureDate, AppError>,
    pub high_resolution_path: String,
}

impl ResolvedAsset {
    /// `YYYY-MM-DD`, or a placeholder when the path carries no readable date
    pub fn date_label(&self) -> String {
        match &self.capture_date {
            Ok(date) => date.to_string(),
            Err(_) => UNKNOWN_DATE_LABEL.to_string(),
        }
    }
}

/// Resolve file name, capture date and full-resolution sibling of an asset path.
///
/// Never fails; a malformed date segment is reported through `capture_date`.
pub fn resolve(path: &str) -> ResolvedAsset {
    let capture_date = CaptureDate::from_path(path);
    if let Err(e) = &capture_date {
        tracing::debug!("{}", e);
    }

    ResolvedAsset {
        file_name: file_name(path).to_string(),
        capture_date,
        high_resolution_path: high_resolution_path(path),
    }
}

/// Final `/`-delimited segment
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Swap the first thumbnail token for the panorama token
pub fn high_resolution_path(path: &str) -> String {
    path.replacen(THUMBNAIL_TOKEN, PANORAMA_TOKEN, 1)
}

/// Swap the first panorama token back to the thumbnail token
pub fn thumbnail_path(path: &str) -> String {
    path.replacen(PANORAMA_TOKEN, THUMBNAIL_TOKEN, 1)
}
