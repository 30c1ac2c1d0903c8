use std::env;
use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;

use directories_next::ProjectDirs;
use tracing::debug;

pub const ENV_SHADER_DIR: &str = "FXCHECK_SHADER_DIR";
pub const ENV_CONFIG_FILE: &str = "FXCHECK_CONFIG";
pub const CONFIG_FILE: &str = "fxcheck.toml";

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "postfx";
const APPLICATION: &str = "fxcheck";

/// Per-user directories; either may be missing on exotic platforms.
#[derive(Debug, Clone, Default)]
pub struct AppPaths {
    config_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
}

impl AppPaths {
    pub fn discover() -> Self {
        match ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION) {
            Some(dirs) => Self {
                config_dir: Some(dirs.config_dir().to_path_buf()),
                data_dir: Some(dirs.data_dir().to_path_buf()),
            },
            None => {
                debug!("no home directory; using working-directory defaults only");
                Self::default()
            }
        }
    }

    /// The per-user config file, if it exists.
    pub fn default_config(&self) -> Option<PathBuf> {
        self.config_dir
            .as_ref()
            .map(|dir| dir.join(CONFIG_FILE))
            .filter(|path| path.is_file())
    }

    pub fn default_roots(&self) -> Vec<PathBuf> {
        let mut roots = vec![PathBuf::from("shaders")];
        if let Some(data_dir) = &self.data_dir {
            roots.push(data_dir.join("shaders"));
        }
        roots
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootOrigin {
    Flag,
    Config,
    Environment,
    Default,
}

impl fmt::Display for RootOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => f.write_str("--root"),
            Self::Config => f.write_str("config file"),
            Self::Environment => write!(f, "${ENV_SHADER_DIR}"),
            Self::Default => f.write_str("defaults"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoots {
    pub paths: Vec<PathBuf>,
    pub origin: RootOrigin,
}

/// Picks the first non-empty source: flags, config, environment, defaults.
pub fn resolve_roots(
    flags: &[PathBuf],
    config: &[PathBuf],
    environment: Option<OsString>,
    defaults: impl FnOnce() -> Vec<PathBuf>,
) -> SearchRoots {
    if !flags.is_empty() {
        return SearchRoots {
            paths: flags.to_vec(),
            origin: RootOrigin::Flag,
        };
    }
    if !config.is_empty() {
        return SearchRoots {
            paths: config.to_vec(),
            origin: RootOrigin::Config,
        };
    }
    let from_env: Vec<PathBuf> = environment
        .as_deref()
        .map(|value| {
            env::split_paths(value)
                .filter(|path| !path.as_os_str().is_empty())
                .collect()
        })
        .unwrap_or_default();
    if !from_env.is_empty() {
        return SearchRoots {
            paths: from_env,
            origin: RootOrigin::Environment,
        };
    }
    SearchRoots {
        paths: defaults(),
        origin: RootOrigin::Default,
    }
}
