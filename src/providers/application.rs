use crate::config::Config;
use crate::error::{ExecError, LaunchError};
use crate::executor;
use crate::icons::IconTheme;
use crate::model::{Item, Payload};
use crate::providers::desktop_entry::{DesktopEntry, split_exec};
use crate::providers::{self, Provider};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

pub const NAME: &str = "application_indexer";

/// Field codes that would be filled in with files or URLs. The launcher never
/// passes any, so they are dropped.
pub const PLACEHOLDERS: [&str; 7] = ["%f", "%F", "%u", "%U", "%i", "%c", "%k"];

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ApplicationOptions {
    /// Searched recursively for `.desktop` files, `~` expands to the home directory.
    pub directories: Vec<String>,
    /// Prepended to commands of entries that ask for a terminal.
    pub terminal_emulator_command: String,
}

impl Default for ApplicationOptions {
    fn default() -> Self {
        Self {
            directories: vec![
                "~/.local/share/applications".to_string(),
                "/usr/share/applications".to_string(),
                "/usr/local/share/applications".to_string(),
            ],
            terminal_emulator_command: "x-terminal-emulator -e".to_string(),
        }
    }
}

/// Applications described by desktop entries.
pub struct ApplicationProvider {
    options: ApplicationOptions,
    icons: IconTheme,
}

impl ApplicationProvider {
    pub fn new() -> Self {
        Self::with_icons(IconTheme::new(44))
    }

    pub fn with_icons(icons: IconTheme) -> Self {
        Self {
            options: ApplicationOptions::default(),
            icons,
        }
    }

    fn scan_directory(&self, dir: &Path, items: &mut Vec<Item>) {
        debug!("Scanning desktop files in {:?}", dir);
        for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
            let path = entry.path();
            if entry.file_type().is_dir() { continue; }
            if path.extension().and_then(|s| s.to_str()) != Some("desktop") { continue; }

            if let Some(item) = self.build_item(path) {
                items.push(item);
            }
        }
    }

    fn build_item(&self, path: &Path) -> Option<Item> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                debug!("Skipping {:?}: {}", path, e);
                return None;
            }
        };

        let entry = DesktopEntry::parse(&content);
        if !entry.is_visible() {
            return None;
        }
        let Some(name) = entry.name else {
            debug!("Skipping {:?}: no Name", path);
            return None;
        };

        let command = match resolve_command(
            &entry.exec,
            entry.terminal,
            &self.options.terminal_emulator_command,
        ) {
            Ok(command) => command,
            Err(e) => {
                warn!("Skipping {:?}: unusable Exec line: {}", path, e);
                return None;
            }
        };

        let words = name.split_whitespace().map(str::to_string).collect();
        let icon = self.icons.load_or_missing(&entry.icon);

        Some(Item::new(name, entry.comment, words, Payload::Command(command)).with_icon(icon))
    }
}

impl Default for ApplicationProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalizes an `Exec` line to single-space separated words and wraps it in
/// `terminal_command` when the entry needs a terminal. Field codes stay in.
pub fn resolve_command(exec: &str, terminal: bool, terminal_command: &str) -> Result<String, ExecError> {
    let command = split_exec(exec)?.join(" ");
    if terminal {
        Ok(format!("{} '{}'", terminal_command, command))
    } else {
        Ok(command)
    }
}

pub fn strip_placeholders(command: &str) -> String {
    PLACEHOLDERS
        .iter()
        .fold(command.to_string(), |command, code| command.replace(code, ""))
        .trim()
        .to_string()
}

/// The argument vector a resolved command is started with. Quoting was already
/// consumed by [`resolve_command`], so this splits on whitespace only.
pub fn launch_argv(command: &str) -> Vec<String> {
    strip_placeholders(command)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

impl Provider for ApplicationProvider {
    fn name(&self) -> &'static str {
        NAME
    }

    fn configure(&mut self, own: &Map<String, Value>, config: &Config) {
        self.options = providers::options(NAME, own);
        self.icons = self.icons.resized(config.icon_size);
    }

    fn provide(&self) -> Vec<Item> {
        let mut items = Vec::new();
        for dir in &self.options.directories {
            let expanded = shellexpand::tilde(dir);
            let dir = Path::new(&*expanded);
            if !dir.exists() {
                debug!("Application directory {:?} does not exist, skipping", dir);
                continue;
            }
            self.scan_directory(dir, &mut items);
        }

        items.sort_by(|a, b| a.name.cmp(&b.name));

        info!("ApplicationProvider: found {} entries", items.len());
        items
    }

    fn launch(&self, item: &Item) -> Result<(), LaunchError> {
        let Payload::Command(command) = &item.payload else {
            return Err(LaunchError::ForeignItem { name: item.name.clone(), provider: NAME });
        };

        let argv = launch_argv(command);
        if argv.is_empty() {
            return Err(LaunchError::EmptyCommand { name: item.name.clone() });
        }

        info!("Launching {:?}: {:?}", item.name, argv);
        executor::spawn_detached(argv)
    }

    fn launchable(&self, item: &Item) -> bool {
        match &item.payload {
            Payload::Command(command) => !strip_placeholders(command).is_empty(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_entry(dir: &Path, file: &str, body: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(file), format!("[Desktop Entry]\nType=Application\n{}", body)).unwrap();
    }

    fn provider(dirs: &[PathBuf], terminal: &str) -> ApplicationProvider {
        let mut provider = ApplicationProvider::with_icons(IconTheme::with_paths(vec![], 44));
        let own = match json!({
            "directories": dirs,
            "terminal_emulator_command": terminal,
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        provider.configure(&own, &Config::default());
        provider
    }

    fn command(item: &Item) -> &str {
        match &item.payload {
            Payload::Command(command) => command,
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn walks_directories_recursively_and_sorts_by_name() {
        let root = TempDir::new().unwrap();
        write_entry(root.path(), "zed.desktop", "Name=Zed\nExec=zed\n");
        write_entry(&root.path().join("nested/deeper"), "term.desktop", "Name=alacritty\nExec=alacritty\n");
        write_entry(root.path(), "firefox.desktop", "Name=Firefox Web Browser\nComment=Browse\nExec=firefox %u\n");
        fs::write(root.path().join("README"), "Name=Not an entry").unwrap();

        let items = provider(&[root.path().to_path_buf()], "xterm -e").provide();

        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Firefox Web Browser", "Zed", "alacritty"]);
        assert_eq!(items[0].description, "Browse");
        assert_eq!(items[0].words, ["Firefox", "Web", "Browser"]);
        assert_eq!(command(&items[0]), "firefox %u");
    }

    #[test]
    fn hidden_entries_never_show_up() {
        let root = TempDir::new().unwrap();
        write_entry(root.path(), "a.desktop", "Name=Settings Daemon\nExec=daemon\nNoDisplay=true\n");
        write_entry(root.path(), "b.desktop", "Name=Settings Removed\nExec=removed\nHidden=true\n");
        write_entry(root.path(), "c.desktop", "Name=Settings\nExec=settings\n");

        let items = provider(&[root.path().to_path_buf()], "xterm -e").provide();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Settings");
    }

    #[test]
    fn broken_entries_are_skipped_individually() {
        let root = TempDir::new().unwrap();
        write_entry(root.path(), "quote.desktop", "Name=Broken\nExec=run 'unterminated\n");
        write_entry(root.path(), "nameless.desktop", "Exec=ghost\n");
        fs::write(root.path().join("binary.desktop"), b"\xff\xfe\x00").unwrap();
        write_entry(root.path(), "fine.desktop", "Name=Fine\nExec=fine\n");

        let items = provider(&[root.path().to_path_buf()], "xterm -e").provide();

        let names: Vec<&str> = items.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["Fine"]);
    }

    #[test]
    fn missing_directories_yield_nothing() {
        let items = provider(&[PathBuf::from("/no/such/applications")], "xterm -e").provide();
        assert!(items.is_empty());
    }

    #[test]
    fn terminal_entries_are_wrapped() {
        let root = TempDir::new().unwrap();
        write_entry(root.path(), "vim.desktop", "Name=Vim\nExec=vim\nTerminal=true\n");

        let items = provider(&[root.path().to_path_buf()], "xterm -e").provide();

        assert_eq!(command(&items[0]), "xterm -e 'vim'");
        assert_eq!(launch_argv(command(&items[0])), ["xterm", "-e", "'vim'"]);
    }

    #[test]
    fn launch_does_not_unescape_a_second_time() {
        let command = resolve_command(r#"app "x\\y" --flag %f"#, false, "unused").unwrap();

        assert_eq!(command, r"app x\y --flag %f");
        assert_eq!(launch_argv(&command), ["app", r"x\y", "--flag"]);
    }

    #[test]
    fn wrapped_commands_with_quotes_split_the_same_way() {
        let command = resolve_command(r#"sh -c "echo it's""#, true, "xterm -e").unwrap();

        assert_eq!(command, "xterm -e 'sh -c echo it's'");
        assert_eq!(launch_argv(&command), ["xterm", "-e", "'sh", "-c", "echo", "it's'"]);
    }

    #[test]
    fn exec_lines_are_normalized_but_not_filled_in() {
        assert_eq!(
            resolve_command(r#"env   "FOO=1"  app %F"#, false, "unused").unwrap(),
            "env FOO=1 app %F"
        );
    }

    #[test]
    fn placeholders_are_stripped_for_launch() {
        assert_eq!(launch_argv("app.bin %f %u --flag"), ["app.bin", "--flag"]);
        assert_eq!(strip_placeholders("  %U %i %c %k "), "");
    }

    #[test]
    fn launchable_needs_a_command_beyond_placeholders() {
        let provider = provider(&[], "xterm -e");
        let app = |command: &str| {
            Item::new("App".into(), String::new(), vec![], Payload::Command(command.into()))
        };

        assert!(provider.launchable(&app("app %U")));
        assert!(!provider.launchable(&app("%U")));
        assert!(!provider.launchable(&app("")));
        assert!(matches!(
            provider.launch(&app("%f %F")),
            Err(LaunchError::EmptyCommand { .. })
        ));
    }

    #[test]
    fn entry_without_exec_is_kept_but_not_launchable() {
        let root = TempDir::new().unwrap();
        write_entry(root.path(), "doc.desktop", "Name=Manual\n");

        let provider = provider(&[root.path().to_path_buf()], "xterm -e");
        let items = provider.provide();

        assert_eq!(items.len(), 1);
        assert!(!provider.launchable(&items[0]));
    }

    #[test]
    fn directory_items_are_refused() {
        let provider = provider(&[], "xterm -e");
        let item = Item::new("tmp".into(), "/tmp".into(), vec![], Payload::Directory("/tmp".into()));

        assert!(!provider.launchable(&item));
        assert!(matches!(provider.launch(&item), Err(LaunchError::ForeignItem { .. })));
    }
}
