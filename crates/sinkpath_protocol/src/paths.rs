use std::path::PathBuf;
use std::sync::Once;

static CREATE_DIR_WARNED: Once = Once::new();

/// Environment variable overriding the sinkpath home directory.
pub const HOME_ENV_VAR: &str = "SINKPATH_HOME";

/// Resolve the sinkpath home directory.
///
/// Priority:
/// 1) SINKPATH_HOME
/// 2) the user's home directory
/// 3) ./.sinkpath
pub fn sinkpath_home() -> PathBuf {
    if let Ok(override_path) = std::env::var(HOME_ENV_VAR) {
        return PathBuf::from(override_path);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".sinkpath"),
        None => PathBuf::from(".").join(".sinkpath"),
    }
}

fn ensure_home_dir(home: &PathBuf) {
    if let Err(err) = std::fs::create_dir_all(home) {
        CREATE_DIR_WARNED.call_once(|| {
            eprintln!(
                "Warning: failed to create sinkpath home directory {}: {}. Set {} or pass --config.",
                home.display(),
                err,
                HOME_ENV_VAR
            );
        });
    }
}

/// Default system config path: ~/.sinkpath/config.toml
pub fn default_config_path() -> PathBuf {
    sinkpath_home().join("config.toml")
}

/// Default cluster registry path: ~/.sinkpath/clusters.toml
pub fn default_registry_path() -> PathBuf {
    sinkpath_home().join("clusters.toml")
}

/// Default logs directory: ~/.sinkpath/logs
pub fn default_logs_dir() -> PathBuf {
    let home = sinkpath_home();
    ensure_home_dir(&home);
    home.join("logs")
}
