use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

pub const ENV_CONFIG_DIR: &str = "FLUIDGRAD_CONFIG_DIR";
pub const CONFIG_FILE_NAME: &str = "config.toml";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "fluidgrad";
const APPLICATION: &str = "fluidgrad";

/// Where the config file lives and whether the user named it explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigLocation {
    Explicit(PathBuf),
    Default(PathBuf),
}

impl ConfigLocation {
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Ok(Self::Explicit(path.to_path_buf())),
            None => Ok(Self::Default(config_dir()?.join(CONFIG_FILE_NAME))),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(path) | Self::Default(path) => path,
        }
    }
}

pub fn config_dir() -> Result<PathBuf> {
    if let Some(value) = env_override(ENV_CONFIG_DIR) {
        return Ok(value);
    }
    let project_dirs = ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
        .ok_or_else(|| anyhow!("failed to determine user directories"))?;
    Ok(project_dirs.config_dir().to_path_buf())
}

fn env_override(name: &str) -> Option<PathBuf> {
    match env::var_os(name) {
        Some(value) if !value.as_os_str().is_empty() => Some(PathBuf::from(value)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use std::sync::{Mutex, OnceLock};
    use tempfile::TempDir;

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    struct EnvGuard {
        key: &'static str,
        previous: Option<OsString>,
    }

    impl EnvGuard {
        fn set(key: &'static str, value: &Path) -> Self {
            let previous = env::var_os(key);
            env::set_var(key, value);
            Self { key, previous }
        }

        fn clear(key: &'static str) -> Self {
            let previous = env::var_os(key);
            env::remove_var(key);
            Self { key, previous }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            if let Some(value) = self.previous.take() {
                env::set_var(self.key, value);
            } else {
                env::remove_var(self.key);
            }
        }
    }

    #[test]
    fn env_override_takes_precedence() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _config = EnvGuard::set(ENV_CONFIG_DIR, root.path());

        let location = ConfigLocation::resolve(None).unwrap();
        assert_eq!(
            location,
            ConfigLocation::Default(root.path().join(CONFIG_FILE_NAME))
        );
    }

    #[test]
    fn explicit_path_wins_over_env() {
        let _guard = env_lock().lock().unwrap();
        let root = TempDir::new().unwrap();
        let _config = EnvGuard::set(ENV_CONFIG_DIR, root.path());
        let explicit = root.path().join("other.toml");

        let location = ConfigLocation::resolve(Some(&explicit)).unwrap();
        assert_eq!(location.path(), explicit.as_path());
        assert!(matches!(location, ConfigLocation::Explicit(_)));
    }

    #[test]
    fn empty_override_falls_back_to_project_dirs() {
        let _guard = env_lock().lock().unwrap();
        let _config = EnvGuard::clear(ENV_CONFIG_DIR);
        if let Ok(dir) = config_dir() {
            assert!(dir.is_absolute());
        }
    }
}
