use std::path::Path;
use std::path::PathBuf;

use crate::config::config_dir;
use crate::state::ThemeMode;

pub const THEME_FILE: &str = "theme";

/// The one preference that survives restarts: `dark` or `light` as plain text.
#[derive(Debug, Clone)]
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn open_default() -> Option<Self> {
        config_dir().map(|dir| Self::open(dir.join(THEME_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when nothing was stored or the stored flag is unrecognised.
    pub fn load(&self) -> std::io::Result<Option<ThemeMode>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.path)?;
        let mode = ThemeMode::parse(raw.trim());
        if mode.is_none() {
            tracing::warn!(path = %self.path.display(), value = raw.trim(), "ignoring unknown theme flag");
        }
        Ok(mode)
    }

    pub fn save(&self, mode: ThemeMode) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, mode.label())
    }

    /// Stored preference, else the detected system preference.
    pub fn resolve(&self) -> ThemeMode {
        match self.load() {
            Ok(Some(mode)) => mode,
            Ok(None) => detect_system_theme(),
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "theme preference unreadable");
                detect_system_theme()
            }
        }
    }
}

pub fn detect_system_theme() -> ThemeMode {
    theme_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

/// `COLORFGBG` is `fg;bg` in ANSI indices; bg 7 or 15 means a light terminal.
pub fn theme_from_colorfgbg(colorfgbg: Option<&str>) -> ThemeMode {
    let bg = colorfgbg
        .and_then(|value| value.split(';').next_back())
        .and_then(|bg| bg.trim().parse::<u8>().ok());
    match bg {
        Some(7) | Some(15) => ThemeMode::Light,
        _ => ThemeMode::Dark,
    }
}
