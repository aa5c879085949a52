use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

const CLAWX_CONFIG_DIR: &str = ".clawx";
const OPENCLAW_CONFIG_DIR: &str = ".openclaw";
const APP_DATA_DIR: &str = "ClawX";
const OPENCLAW_PACKAGE_DIR: &str = "openclaw";
const OPENCLAW_ENTRY: &str = "openclaw.mjs";

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(std::env::temp_dir)
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_path(path: &str) -> PathBuf {
    expand_path_with_home(path, &home_dir())
}

pub fn expand_path_with_home(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        return home.to_path_buf();
    }
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => home.join(rest),
        None => PathBuf::from(path),
    }
}

pub fn clawx_config_dir() -> PathBuf {
    home_dir().join(CLAWX_CONFIG_DIR)
}

pub fn openclaw_config_dir() -> PathBuf {
    home_dir().join(OPENCLAW_CONFIG_DIR)
}

pub fn logs_dir() -> PathBuf {
    clawx_config_dir().join("logs")
}

pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(clawx_config_dir)
        .join(APP_DATA_DIR)
}

pub fn ensure_dir(path: &Path) -> io::Result<()> {
    std::fs::create_dir_all(path)
}

/// Location of the bundled OpenClaw package under the app resources.
pub fn openclaw_dir(resources_dir: &Path) -> PathBuf {
    resources_dir.join(OPENCLAW_PACKAGE_DIR)
}

pub fn openclaw_entry_path(resources_dir: &Path) -> PathBuf {
    openclaw_dir(resources_dir).join(OPENCLAW_ENTRY)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenClawStatus {
    pub package_exists: bool,
    pub is_built: bool,
    pub entry_path: PathBuf,
    pub dir: PathBuf,
    pub version: Option<String>,
}

pub fn openclaw_status(resources_dir: &Path) -> OpenClawStatus {
    let dir = openclaw_dir(resources_dir);
    let manifest = dir.join("package.json");
    let version = std::fs::read(&manifest)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(&bytes).ok())
        .and_then(|json| json.get("version")?.as_str().map(str::to_string));

    OpenClawStatus {
        package_exists: manifest.is_file(),
        is_built: dir.join("dist").is_dir(),
        entry_path: openclaw_entry_path(resources_dir),
        dir,
        version,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_path_handles_tilde_forms() {
        let home = Path::new("/home/alice");
        assert_eq!(expand_path_with_home("~", home), PathBuf::from("/home/alice"));
        assert_eq!(
            expand_path_with_home("~/.openclaw/config.json", home),
            PathBuf::from("/home/alice/.openclaw/config.json")
        );
        assert_eq!(expand_path_with_home("/etc/hosts", home), PathBuf::from("/etc/hosts"));
        assert_eq!(expand_path_with_home("~bob/x", home), PathBuf::from("~bob/x"));
    }

    #[test]
    fn config_dirs_live_under_home() {
        assert!(clawx_config_dir().ends_with(".clawx"));
        assert!(openclaw_config_dir().ends_with(".openclaw"));
        assert!(logs_dir().ends_with(".clawx/logs"));
        assert!(data_dir().ends_with("ClawX"));
    }

    #[test]
    fn openclaw_status_reports_missing_package() {
        let dir = tempfile::tempdir().unwrap();
        let status = openclaw_status(dir.path());
        assert!(!status.package_exists);
        assert!(!status.is_built);
        assert_eq!(status.version, None);
        assert!(status.entry_path.ends_with("openclaw/openclaw.mjs"));
    }

    #[test]
    fn openclaw_status_reads_version_and_build_output() {
        let dir = tempfile::tempdir().unwrap();
        let pkg = openclaw_dir(dir.path());
        ensure_dir(&pkg.join("dist")).unwrap();
        std::fs::write(pkg.join("package.json"), r#"{"name":"openclaw","version":"2026.2.1"}"#)
            .unwrap();

        let status = openclaw_status(dir.path());
        assert!(status.package_exists);
        assert!(status.is_built);
        assert_eq!(status.version.as_deref(), Some("2026.2.1"));
    }
}
