use crate::config::Config;
use crate::error::LaunchError;
use crate::executor;
use crate::icons::{FOLDER_ICON, IconTheme};
use crate::model::{Item, Payload};
use crate::providers::{self, Provider};
use directories::UserDirs;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_skia::Pixmap;

pub const NAME: &str = "directory_indexer";

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct DirectoryOptions {
    /// Glob patterns, `~` expands to the home directory.
    pub include: Vec<String>,
    /// Also index the well-known user directories (desktop, documents, ...).
    pub user_directories: bool,
    /// Program used to open a directory, the path is appended as last argument.
    pub open_command: String,
}

impl Default for DirectoryOptions {
    fn default() -> Self {
        Self {
            include: vec![
                "~/Documents/*".to_string(),
                "~/Projects".to_string(),
                "~/Projects/*".to_string(),
            ],
            user_directories: true,
            open_command: default_open_command().to_string(),
        }
    }
}

fn default_open_command() -> &'static str {
    if cfg!(target_os = "macos") { "open" } else { "xdg-open" }
}

/// Folders: the user's special directories plus whatever the include globs match.
pub struct DirectoryProvider {
    options: DirectoryOptions,
    icons: IconTheme,
    special_dirs: Option<Vec<PathBuf>>,
}

impl DirectoryProvider {
    pub fn new() -> Self {
        Self {
            options: DirectoryOptions::default(),
            icons: IconTheme::new(44),
            special_dirs: None,
        }
    }

    /// Uses `special_dirs` instead of asking the system for the user directories.
    pub fn with_special_dirs(special_dirs: Vec<PathBuf>, icons: IconTheme) -> Self {
        Self {
            options: DirectoryOptions::default(),
            icons,
            special_dirs: Some(special_dirs),
        }
    }

    fn special_dirs(&self) -> Vec<PathBuf> {
        if !self.options.user_directories {
            return Vec::new();
        }
        if let Some(dirs) = &self.special_dirs {
            return dirs.clone();
        }

        let Some(user_dirs) = UserDirs::new() else {
            debug!("No home directory, skipping user directories");
            return Vec::new();
        };

        [
            user_dirs.desktop_dir(),
            user_dirs.document_dir(),
            user_dirs.download_dir(),
            user_dirs.audio_dir(),
            user_dirs.picture_dir(),
            user_dirs.public_dir(),
            user_dirs.template_dir(),
            user_dirs.video_dir(),
        ]
        .into_iter()
        .flatten()
        .map(Path::to_path_buf)
        .collect()
    }

    fn build_item(&self, dir: PathBuf, icon: Option<Arc<Pixmap>>) -> Item {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| dir.to_string_lossy().to_string());

        Item::new(
            name.clone(),
            dir.to_string_lossy().to_string(),
            vec![name],
            Payload::Directory(dir),
        )
        .with_icon(icon)
    }
}

impl Default for DirectoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Expands `~` and the glob, keeping only directories.
pub fn expand_pattern(pattern: &str) -> Vec<PathBuf> {
    let expanded = shellexpand::tilde(pattern);
    let paths = match glob::glob(&expanded) {
        Ok(paths) => paths,
        Err(e) => {
            warn!("Invalid include pattern {:?}: {}", pattern, e);
            return Vec::new();
        }
    };

    paths
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                debug!("Skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|path| path.is_dir())
        .map(|path| std::path::absolute(&path).unwrap_or(path))
        .collect()
}

impl Provider for DirectoryProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn configure(&mut self, own: &Map<String, Value>, config: &Config) {
        self.options = providers::options(NAME, own);
        self.icons = self.icons.resized(config.icon_size);
    }

    fn provide(&self) -> Vec<Item> {
        let mut dirs = self.special_dirs();
        for pattern in &self.options.include {
            let matched = expand_pattern(pattern);
            debug!("Pattern {:?} matched {} directories", pattern, matched.len());
            dirs.extend(matched);
        }

        let icon = self.icons.load(FOLDER_ICON);
        let items: Vec<Item> = dirs
            .into_iter()
            .map(|dir| self.build_item(dir, icon.clone()))
            .collect();

        info!("DirectoryProvider: found {} entries", items.len());
        items
    }

    fn launch(&self, item: &Item) -> Result<(), LaunchError> {
        let Payload::Directory(path) = &item.payload else {
            return Err(LaunchError::ForeignItem { name: item.name.clone(), provider: NAME });
        };
        if !path.is_dir() {
            return Err(LaunchError::NotADirectory(path.clone()));
        }

        let mut argv: Vec<String> = self
            .options
            .open_command
            .split_whitespace()
            .map(str::to_string)
            .collect();
        argv.push(path.to_string_lossy().to_string());

        info!("Opening {:?}", path);
        executor::spawn_detached(argv)
    }

    fn launchable(&self, item: &Item) -> bool {
        match &item.payload {
            Payload::Directory(path) => path.is_dir(),
            _ => false,
        }
    }
}
