//! Image loading and decoding service

use crate::AppError;
use crossbeam_channel::Receiver;
use image::{GenericImageView, ImageBuffer, ImageReader, Rgba, RgbaImage};
use rayon::prelude::*;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use xxhash_rust::xxh3::xxh3_64;

/// Image loader service
#[derive(Clone)]
pub struct ImageLoader {
    /// Channel for load requests
    request_tx: mpsc::UnboundedSender<LoadRequest>,
}

/// Load request
#[derive(Debug)]
struct LoadRequest {
    path: PathBuf,
    max_side: Option<u32>,
    mips: bool,
    callback: oneshot::Sender<Result<LoadedImage, AppError>>,
}

/// Decoded RGBA8 image
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    /// Hash of the encoded file
    pub hash: u64,
    /// Halved levels below `data`, down to 1x1. Empty unless requested.
    pub mips: Vec<RgbaImage>,
}

impl LoadedImage {
    /// Total levels including the base
    pub fn level_count(&self) -> u32 {
        1 + self.mips.len() as u32
    }

    /// Fill [`mips`](Self::mips) with a full chain
    pub fn with_mips(mut self) -> Self {
        self.mips = mip_chain(self.width, self.height, &self.data);
        self
    }
}

/// Outcome of polling a [`LoadTicket`]
#[derive(Debug)]
pub enum LoadPoll {
    Pending,
    Ready(Arc<LoadedImage>),
    Failed(AppError),
}

/// Handle to one in-flight load.
///
/// Dropping the ticket abandons the load: the worker's reply goes nowhere.
pub struct LoadTicket {
    rx: Option<oneshot::Receiver<Result<LoadedImage, AppError>>>,
}

impl LoadTicket {
    /// Non-blocking check; yields Ready/Failed exactly once
    pub fn poll(&mut self) -> LoadPoll {
        let Some(rx) = self.rx.as_mut() else {
            return LoadPoll::Pending;
        };

        match rx.try_recv() {
            Ok(Ok(image)) => {
                self.rx = None;
                LoadPoll::Ready(Arc::new(image))
            }
            Ok(Err(e)) => {
                self.rx = None;
                LoadPoll::Failed(e)
            }
            Err(oneshot::error::TryRecvError::Empty) => LoadPoll::Pending,
            Err(oneshot::error::TryRecvError::Closed) => {
                self.rx = None;
                LoadPoll::Failed(AppError::SystemResource("Image loader response failed".into()))
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.rx.is_none()
    }
}

impl ImageLoader {
    /// Create a new image loader
    pub fn new() -> Self {
        let (request_tx, mut request_rx) = mpsc::unbounded_channel::<LoadRequest>();

        // Spawn worker thread
        std::thread::Builder::new()
            .name("image-loader".into())
            .spawn(move || {
                while let Some(request) = request_rx.blocking_recv() {
                    if request.callback.is_closed() {
                        tracing::debug!("Skipping abandoned load: {}", request.path.display());
                        continue;
                    }
                    let result = load_image_sync(&request.path, request.max_side)
                        .map(|image| if request.mips { image.with_mips() } else { image });
                    // Receiver may be gone if the viewer unmounted meanwhile
                    let _ = request.callback.send(result);
                }
                tracing::debug!("Image loader worker stopped");
            })
            .ok();

        Self { request_tx }
    }

    /// Queue a load and return a ticket to poll from the UI thread
    pub fn request(&self, path: impl Into<PathBuf>, max_side: Option<u32>) -> LoadTicket {
        self.enqueue(path.into(), max_side, false)
    }

    /// Like [`request`](Self::request), with the mip chain built on the worker
    pub fn request_mipmapped(&self, path: impl Into<PathBuf>, max_side: Option<u32>) -> LoadTicket {
        self.enqueue(path.into(), max_side, true)
    }

    fn enqueue(&self, path: PathBuf, max_side: Option<u32>, mips: bool) -> LoadTicket {
        let (tx, rx) = oneshot::channel();
        let request = LoadRequest {
            path,
            max_side,
            mips,
            callback: tx,
        };

        if let Err(mpsc::error::SendError(request)) = self.request_tx.send(request) {
            let _ = request
                .callback
                .send(Err(AppError::SystemResource("Image loader channel closed".into())));
        }

        LoadTicket { rx: Some(rx) }
    }
}

impl Default for ImageLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Read and decode a file to RGBA8, shrinking it to fit `max_side` if given
pub fn load_image_sync(path: &Path, max_side: Option<u32>) -> Result<LoadedImage, AppError> {
    tracing::debug!("Loading image: {}", path.display());

    let data = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AppError::FileNotFound(path.display().to_string()),
        _ => AppError::Io(e),
    })?;
    let hash = xxh3_64(&data);

    let img = ImageReader::new(Cursor::new(&data))
        .with_guessed_format()
        .map_err(|e| AppError::ImageDecode(e.to_string()))?
        .decode()?;

    let img = match max_side {
        Some(max) => {
            let (w, h) = img.dimensions();
            if w > max || h > max {
                tracing::info!("Downscaling {}x{} image to fit {}", w, h, max);
                img.resize(max, max, image::imageops::FilterType::Triangle)
            } else {
                img
            }
        }
        None => img,
    };

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(LoadedImage {
        path: path.to_path_buf(),
        width,
        height,
        data: rgba.into_raw(),
        hash,
        mips: Vec::new(),
    })
}

/// Number of levels in a full mip chain down to 1x1
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Successively halved copies of an RGBA8 buffer, excluding the base level
pub fn mip_chain(width: u32, height: u32, data: &[u8]) -> Vec<RgbaImage> {
    let Some(base) = ImageBuffer::<Rgba<u8>, &[u8]>::from_raw(width, height, data) else {
        tracing::warn!("pixel buffer does not match {}x{}", width, height);
        return Vec::new();
    };

    let count = mip_level_count(width, height) as usize;
    let mut levels: Vec<RgbaImage> = Vec::with_capacity(count.saturating_sub(1));
    for _ in 1..count {
        let next = match levels.last() {
            Some(prev) => halve(prev),
            None => halve(&base),
        };
        levels.push(next);
    }
    levels
}

fn halve<I: GenericImageView<Pixel = Rgba<u8>>>(image: &I) -> RgbaImage {
    let (width, height) = image.dimensions();
    image::imageops::resize(
        image,
        (width / 2).max(1),
        (height / 2).max(1),
        image::imageops::FilterType::Triangle,
    )
}

/// Thumbnail generator
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailGenerator {
    size: u32,
}

impl ThumbnailGenerator {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    /// Generate thumbnail for an image file
    pub fn generate(&self, path: &Path) -> Result<LoadedImage, AppError> {
        let mut image = load_image_sync(path, None)?;
        let buffer = image::RgbaImage::from_raw(image.width, image.height, std::mem::take(&mut image.data))
            .ok_or_else(|| AppError::ImageDecode("pixel buffer size mismatch".into()))?;

        let thumb = image::DynamicImage::ImageRgba8(buffer).thumbnail(self.size, self.size);
        let rgba = thumb.to_rgba8();
        image.width = rgba.width();
        image.height = rgba.height();
        image.data = rgba.into_raw();
        Ok(image)
    }

    /// Generate thumbnails for multiple files in parallel
    pub fn generate_batch(&self, paths: &[PathBuf]) -> Vec<Result<LoadedImage, AppError>> {
        paths.par_iter().map(|path| self.generate(path)).collect()
    }

    /// Run [`generate_batch`](Self::generate_batch) off the calling thread.
    ///
    /// The receiver yields one vector in input order. Dropping it before
    /// the batch finishes discards the results.
    pub fn spawn_batch(self, paths: Vec<PathBuf>) -> Receiver<Vec<Result<LoadedImage, AppError>>> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        rayon::spawn(move || {
            let results = self.generate_batch(&paths);
            let _ = tx.send(results);
        });
        rx
    }
}

/// Check if a file is a supported image format
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            matches!(
                e.to_lowercase().as_str(),
                "jpg" | "jpeg" | "png" | "gif" | "webp" | "bmp"
            )
        })
        .unwrap_or(false)
}
