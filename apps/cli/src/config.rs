//! Release settings on disk.
//!
//! Settings are stored as TOML:
//! - Linux/macOS: `~/.config/launchpad/settings.toml`
//! - Windows: `%APPDATA%/launchpad/settings.toml`

use std::path::{Path, PathBuf};

use launchpad_actions::ReleaseSettings;

/// Loads settings from `path`, writing defaults first if it is missing.
pub fn load_or_create(path: &Path) -> anyhow::Result<ReleaseSettings> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let settings: ReleaseSettings = toml::from_str(&content)?;
        tracing::debug!(path = %path.display(), "settings loaded");
        Ok(settings)
    } else {
        let settings = ReleaseSettings::default();
        save(path, &settings)?;
        tracing::info!(path = %path.display(), "created default settings");
        Ok(settings)
    }
}

/// Writes settings to `path`.
pub fn save(path: &Path, settings: &ReleaseSettings) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(settings)?;
    std::fs::write(path, content)?;

    // Tokens live in this file.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    tracing::debug!(path = %path.display(), "settings saved");
    Ok(())
}

/// Returns the platform-specific settings path.
pub fn default_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("launchpad").join("settings.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("launchpad")
            .join("settings.toml")
    }
}
