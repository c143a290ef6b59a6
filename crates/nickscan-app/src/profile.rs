use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use nickscan_config::Config;
use nickscan_core::ConfigStore;
use serde::{Deserialize, Serialize};

pub const MAIN_PROFILE: &str = "main";

/// A named configuration stored as `<profiles>/<name>.json`
#[derive(Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    pub value: Config,
}

/// Profile directory under the platform config dir
pub fn default_profiles_dir() -> anyhow::Result<PathBuf> {
    let base = dirs::config_dir().context("No config directory on this platform")?;
    Ok(base.join("nickscan").join("profiles"))
}

/// Reads and writes one profile; saving always targets the selected profile
pub struct ProfileStore {
    dir: PathBuf,
    name: String,
}

impl ProfileStore {
    pub fn new(dir: impl Into<PathBuf>, name: &str) -> Self {
        Self {
            dir: dir.into(),
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path_of(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    /// Create the profile directory and a `main` profile if missing
    pub fn init(&self) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create {}", self.dir.display()))?;

        let main = self.path_of(MAIN_PROFILE);
        if !main.exists() {
            write_profile(&main, MAIN_PROFILE, &Config::new())?;
            tracing::info!("Created main profile at {}", main.display());
        }
        Ok(())
    }

    /// Load the selected profile, falling back to `main` when it does not exist.
    ///
    /// An unreadable profile is moved aside to `<name>.json.bak` and replaced
    /// with defaults.
    pub fn load(&self) -> anyhow::Result<Config> {
        self.init()?;

        let path = self.path_of(&self.name);
        if path.exists() {
            return self.load_or_reset(&path, &self.name);
        }

        tracing::warn!("Profile {} not found, falling back to main profile", self.name);
        self.load_or_reset(&self.path_of(MAIN_PROFILE), MAIN_PROFILE)
    }

    fn load_or_reset(&self, path: &Path, name: &str) -> anyhow::Result<Config> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        match serde_json::from_str::<Profile>(&data) {
            Ok(profile) => Ok(profile.value),
            Err(e) => {
                let backup = path.with_extension("json.bak");
                tracing::error!(
                    "Profile {name} is corrupt ({e}), moving it to {}",
                    backup.display()
                );
                fs::rename(path, &backup)
                    .with_context(|| format!("Failed to back up {}", path.display()))?;

                let config = Config::new();
                write_profile(path, name, &config)?;
                Ok(config)
            }
        }
    }
}

impl ConfigStore for ProfileStore {
    fn save(&self, config: &Config) -> anyhow::Result<()> {
        fs::create_dir_all(&self.dir)?;
        write_profile(&self.path_of(&self.name), &self.name, config)?;
        tracing::debug!("Saved profile {}", self.name);
        Ok(())
    }
}

/// Written to a sibling temp file, then renamed into place
fn write_profile(path: &Path, name: &str, config: &Config) -> anyhow::Result<()> {
    let profile = Profile {
        name: name.to_string(),
        value: config.clone(),
    };
    let json = serde_json::to_string_pretty(&profile)?;

    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
