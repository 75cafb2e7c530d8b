use std::path::PathBuf;

/// Per-user directories for an application
///
/// Follows the XDG base directory variables on Unix-like systems and
/// `%APPDATA%` on Windows:
/// - config: `$XDG_CONFIG_HOME/{name}` (default `~/.config/{name}`)
/// - data: `$XDG_DATA_HOME/{name}` (default `~/.local/share/{name}`)
#[derive(Debug, Clone)]
pub struct ProjectPaths {
    name: String,
}

impl ProjectPaths {
    /// Returns `None` when no home directory can be determined
    pub fn new(name: &str) -> Option<Self> {
        home_dir()?;
        Some(ProjectPaths {
            name: name.to_string(),
        })
    }

    pub fn config_dir(&self) -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            appdata_dir(&self.name)
        }

        #[cfg(not(target_os = "windows"))]
        {
            xdg_dir("XDG_CONFIG_HOME", &[".config"]).join(&self.name)
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            appdata_dir(&self.name)
        }

        #[cfg(not(target_os = "windows"))]
        {
            xdg_dir("XDG_DATA_HOME", &[".local", "share"]).join(&self.name)
        }
    }

    /// Where log files go
    pub fn log_dir(&self) -> PathBuf {
        self.data_dir().join("logs")
    }
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}

/// `$var` if set, else `$HOME` joined with `fallback`
#[cfg(not(target_os = "windows"))]
fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    let relative: PathBuf = fallback.iter().collect();
    std::env::var(var)
        .ok()
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .or_else(|| home_dir().map(|home| home.join(&relative)))
        .unwrap_or(relative)
}

#[cfg(target_os = "windows")]
fn appdata_dir(name: &str) -> PathBuf {
    std::env::var("APPDATA")
        .ok()
        .map(|appdata| PathBuf::from(appdata).join(name))
        .unwrap_or_else(|| PathBuf::from(format!(".{}", name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirs_end_with_app_name() {
        if let Some(paths) = ProjectPaths::new("arenakit") {
            assert!(paths.config_dir().ends_with("arenakit"));
            assert!(paths.data_dir().ends_with("arenakit"));
            assert!(paths.log_dir().ends_with("logs"));
        }
    }

    #[test]
    #[cfg(not(target_os = "windows"))]
    fn test_xdg_fallback_is_under_home_or_relative() {
        let dir = xdg_dir("ARENAKIT_TEST_UNSET_VARIABLE", &[".local", "share"]);
        assert!(dir.ends_with(".local/share"));
    }
}
