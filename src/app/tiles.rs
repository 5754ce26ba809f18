//! Basemap tile download and texture cache
//!
//! Tiles are fetched on a small tokio runtime, written to the on-disk cache
//! and turned into textures on the UI thread once the file is there.

use crate::constants::*;
use eframe::egui;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Textures kept in memory before the cache is flushed
const MAX_TILE_TEXTURES: usize = 512;
const MAX_CONCURRENT_FETCHES: usize = 4;

/// Slippy-map tile address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct TileId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileId {
    /// Wrap `x` around the antimeridian. None when `y` is off the map.
    pub fn wrapped(z: u8, x: i64, y: i64) -> Option<Self> {
        let n = 1i64 << z;
        if !(0..n).contains(&y) {
            return None;
        }
        Some(Self {
            z,
            x: x.rem_euclid(n) as u32,
            y: y as u32,
        })
    }

    pub fn url(&self, template: &str) -> String {
        template
            .replace("{z}", &self.z.to_string())
            .replace("{x}", &self.x.to_string())
            .replace("{y}", &self.y.to_string())
    }

    fn cache_path(&self, dir: &Path) -> PathBuf {
        dir.join(self.z.to_string())
            .join(self.x.to_string())
            .join(format!("{}.png", self.y))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum TileStatus {
    Pending,
    Fetched,
    Failed,
}

struct Fetcher {
    runtime: tokio::runtime::Runtime,
    client: reqwest::Client,
}

fn start_fetcher() -> Result<Fetcher, String> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .thread_name("tile-fetch")
        .enable_all()
        .build()
        .map_err(|e| e.to_string())?;
    let client = reqwest::Client::builder()
        .user_agent(TILE_USER_AGENT)
        .build()
        .map_err(|e| e.to_string())?;
    Ok(Fetcher { runtime, client })
}

async fn fetch_tile(client: &reqwest::Client, url: &str, dest: &Path) -> Result<(), String> {
    let response = client.get(url).send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("tile server responded with {}", response.status()));
    }
    let bytes = response.bytes().await.map_err(|e| e.to_string())?;
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    std::fs::write(dest, &bytes).map_err(|e| e.to_string())
}

pub(crate) struct TileCache {
    dir: PathBuf,
    url_template: String,
    // Started on first request
    fetcher: Option<Fetcher>,
    fetcher_failed: bool,
    semaphore: Arc<tokio::sync::Semaphore>,
    status: Arc<Mutex<HashMap<TileId, TileStatus>>>,
    textures: HashMap<TileId, egui::TextureHandle>,
}

impl TileCache {
    pub fn new(dir: PathBuf, url_template: String) -> Self {
        Self {
            dir,
            url_template,
            fetcher: None,
            fetcher_failed: false,
            semaphore: Arc::new(tokio::sync::Semaphore::new(MAX_CONCURRENT_FETCHES)),
            status: Arc::new(Mutex::new(HashMap::new())),
            textures: HashMap::new(),
        }
    }

    fn status_of(&self, id: TileId) -> Option<TileStatus> {
        self.status.lock().ok().and_then(|s| s.get(&id).copied())
    }

    fn set_status(&self, id: TileId, status: TileStatus) {
        if let Ok(mut s) = self.status.lock() {
            s.insert(id, status);
        }
    }

    /// Texture for a tile, or None while it is loading (or unavailable).
    /// Missing tiles are queued for download.
    pub fn texture(&mut self, ctx: &egui::Context, id: TileId) -> Option<egui::TextureHandle> {
        if let Some(texture) = self.textures.get(&id) {
            return Some(texture.clone());
        }

        let status = self.status_of(id);
        if matches!(status, Some(TileStatus::Pending | TileStatus::Failed)) {
            return None;
        }

        let path = id.cache_path(&self.dir);
        if path.exists() {
            return self.load_texture(ctx, id, &path);
        }
        if status.is_none() {
            self.request(ctx, id, path);
        }
        None
    }

    fn load_texture(
        &mut self,
        ctx: &egui::Context,
        id: TileId,
        path: &Path,
    ) -> Option<egui::TextureHandle> {
        let img = match image::open(path) {
            Ok(img) => img,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Cached tile unreadable, discarding");
                std::fs::remove_file(path).ok();
                self.set_status(id, TileStatus::Failed);
                return None;
            }
        };

        if self.textures.len() >= MAX_TILE_TEXTURES {
            debug!(count = self.textures.len(), "Flushing tile textures");
            self.textures.clear();
        }

        let rgba = img.to_rgba8();
        let size = [rgba.width() as usize, rgba.height() as usize];
        let texture = ctx.load_texture(
            format!("tile_{}_{}_{}", id.z, id.x, id.y),
            egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw()),
            egui::TextureOptions::LINEAR,
        );
        self.textures.insert(id, texture.clone());
        Some(texture)
    }

    fn request(&mut self, ctx: &egui::Context, id: TileId, dest: PathBuf) {
        if self.fetcher.is_none() && !self.fetcher_failed {
            match start_fetcher() {
                Ok(fetcher) => self.fetcher = Some(fetcher),
                Err(e) => {
                    warn!(error = %e, "Tile downloads unavailable");
                    self.fetcher_failed = true;
                }
            }
        }
        let Some(fetcher) = &self.fetcher else {
            self.set_status(id, TileStatus::Failed);
            return;
        };

        self.set_status(id, TileStatus::Pending);
        let url = id.url(&self.url_template);
        let client = fetcher.client.clone();
        let semaphore = self.semaphore.clone();
        let status = self.status.clone();
        let ctx = ctx.clone();

        fetcher.runtime.spawn(async move {
            let _permit = semaphore.acquire().await.ok();
            let outcome = match fetch_tile(&client, &url, &dest).await {
                Ok(()) => TileStatus::Fetched,
                Err(e) => {
                    warn!(url = %url, error = %e, "Tile download failed");
                    TileStatus::Failed
                }
            };
            if let Ok(mut s) = status.lock() {
                s.insert(id, outcome);
            }
            ctx.request_repaint();
        });
    }

    /// Forget failed downloads so they are tried again
    pub fn retry_failed(&mut self) {
        if let Ok(mut s) = self.status.lock() {
            s.retain(|_, status| *status != TileStatus::Failed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_id_wraps_x_and_rejects_y() {
        assert_eq!(TileId::wrapped(2, -1, 0), Some(TileId { z: 2, x: 3, y: 0 }));
        assert_eq!(TileId::wrapped(2, 5, 3), Some(TileId { z: 2, x: 1, y: 3 }));
        assert_eq!(TileId::wrapped(2, 0, 4), None);
        assert_eq!(TileId::wrapped(2, 0, -1), None);
    }

    #[test]
    fn test_tile_url_and_cache_path() {
        let id = TileId { z: 10, x: 612, y: 391 };
        assert_eq!(id.url(DEFAULT_TILE_URL), "https://tile.openstreetmap.org/10/612/391.png");
        assert_eq!(
            id.cache_path(Path::new("tiles")),
            Path::new("tiles").join("10").join("612").join("391.png")
        );
    }

    #[test]
    fn test_cached_tile_becomes_texture() {
        let dir = tempfile::tempdir().unwrap();
        let id = TileId { z: 1, x: 0, y: 1 };
        let path = id.cache_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        image::RgbaImage::new(4, 4).save(&path).unwrap();

        let ctx = egui::Context::default();
        let mut cache = TileCache::new(dir.path().to_path_buf(), DEFAULT_TILE_URL.to_string());
        let texture = cache.texture(&ctx, id).unwrap();
        assert_eq!(texture.size(), [4, 4]);
        assert!(cache.fetcher.is_none());
    }

    #[test]
    fn test_corrupt_cached_tile_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let id = TileId { z: 1, x: 1, y: 1 };
        let path = id.cache_path(dir.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not an image").unwrap();

        let ctx = egui::Context::default();
        let mut cache = TileCache::new(dir.path().to_path_buf(), DEFAULT_TILE_URL.to_string());
        assert!(cache.texture(&ctx, id).is_none());
        assert!(!path.exists());
        assert_eq!(cache.status_of(id), Some(TileStatus::Failed));

        cache.retry_failed();
        assert_eq!(cache.status_of(id), None);
    }
}
