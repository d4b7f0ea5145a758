use image::ImageReader;
use image::imageops::FilterType;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use resvg::usvg::{Options, Tree};
use tiny_skia::{ColorU8, Pixmap, Transform};

pub const MISSING_ICON: &str = "image-missing";
pub const FOLDER_ICON: &str = "folder";

const THEME_SUBDIRS: [&str; 11] = [
    "hicolor/48x48/apps",
    "hicolor/scalable/apps",
    "hicolor/32x32/apps",
    "hicolor/64x64/apps",
    "hicolor/48x48/places",
    "hicolor/scalable/places",
    "Adwaita/48x48/apps",
    "Adwaita/scalable/apps",
    "Adwaita/48x48/places",
    "Adwaita/scalable/places",
    "",
];

/// Resolves icon names or paths into pixmaps of a fixed size.
///
/// Lookups are memoized per name, so the many items sharing a fallback icon
/// share one pixmap.
pub struct IconTheme {
    search_paths: Vec<PathBuf>,
    size: u32,
    cache: Mutex<HashMap<String, Option<Arc<Pixmap>>>>,
}

impl IconTheme {
    pub fn new(size: u32) -> Self {
        let mut paths = Vec::new();
        if let Some(home) = directories::BaseDirs::new() {
            paths.push(home.data_dir().join("icons"));
        }
        paths.push(PathBuf::from("/usr/share/icons"));
        paths.push(PathBuf::from("/usr/share/pixmaps"));

        Self::with_paths(paths, size)
    }

    pub fn with_paths(search_paths: Vec<PathBuf>, size: u32) -> Self {
        Self {
            search_paths,
            size,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Same search paths, different size. Starts with an empty cache.
    pub fn resized(&self, size: u32) -> Self {
        Self::with_paths(self.search_paths.clone(), size)
    }

    /// Looks up `icon`, returning `None` when it cannot be found or decoded.
    pub fn load(&self, icon: &str) -> Option<Arc<Pixmap>> {
        if icon.is_empty() {
            return None;
        }

        if let Ok(cache) = self.cache.lock() {
            if let Some(cached) = cache.get(icon) {
                return cached.clone();
            }
        }

        let pixmap = self.find_and_load(icon).map(Arc::new);
        if pixmap.is_none() {
            debug!("Icon {:?} could not be resolved", icon);
        }
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(icon.to_string(), pixmap.clone());
        }
        pixmap
    }

    /// Like [`load`](Self::load), but substitutes the missing-image placeholder.
    pub fn load_or_missing(&self, icon: &str) -> Option<Arc<Pixmap>> {
        self.load(icon).or_else(|| self.load(MISSING_ICON))
    }

    fn find_and_load(&self, icon: &str) -> Option<Pixmap> {
        let path = Path::new(icon);
        if icon.contains('/') {
            return if path.exists() { self.load_from_path(path) } else { None };
        }

        for root in &self.search_paths {
            if !root.exists() { continue; }

            for sub in THEME_SUBDIRS {
                let dir = root.join(sub);
                if !dir.exists() { continue; }

                for ext in ["png", "svg", "xpm"] {
                    let file_path = dir.join(format!("{}.{}", icon, ext));
                    if file_path.exists() {
                        return self.load_from_path(&file_path);
                    }
                }
            }
        }
        None
    }

    fn load_from_path(&self, path: &Path) -> Option<Pixmap> {
        if path.extension().is_some_and(|ext| ext == "svg") {
            self.rasterize_svg(path)
        } else {
            self.decode_raster(path)
        }
    }

    fn decode_raster(&self, path: &Path) -> Option<Pixmap> {
        let rgba = ImageReader::open(path)
            .ok()?
            .decode()
            .ok()?
            .resize_exact(self.size, self.size, FilterType::Triangle)
            .into_rgba8();

        let mut pixmap = Pixmap::new(rgba.width(), rgba.height())?;
        for (target, source) in pixmap.pixels_mut().iter_mut().zip(rgba.pixels()) {
            let [r, g, b, a] = source.0;
            *target = ColorU8::from_rgba(r, g, b, a).premultiply();
        }
        Some(pixmap)
    }

    /// Renders an SVG centered in a square, keeping its aspect ratio.
    fn rasterize_svg(&self, path: &Path) -> Option<Pixmap> {
        let data = fs::read(path).ok()?;
        let tree = Tree::from_data(&data, &Options::default()).ok()?;

        let side = self.size as f32;
        let (width, height) = (tree.size().width(), tree.size().height());
        let scale = side / width.max(height);
        let transform = Transform::from_scale(scale, scale)
            .post_translate((side - width * scale) / 2.0, (side - height * scale) / 2.0);

        let mut pixmap = Pixmap::new(self.size, self.size)?;
        resvg::render(&tree, transform, &mut pixmap.as_mut());
        Some(pixmap)
    }
}
