//! Configuration parsed from `moq.toml` files, and the Go environment that it
//! resolves to.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use which::which;

use crate::syntax::constraint::BuildContext;

pub const CONFIG_FILE: &str = "moq.toml";

/// The release assumed when neither the configuration nor `$GOROOT/VERSION`
/// names one.
pub const DEFAULT_RELEASE: u32 = 22;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub go: GoConfig,
}

/// Overrides for the values that would otherwise come from the `go` command's
/// environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GoConfig {
    pub goroot: Option<Box<Path>>,
    pub gopath: Option<Box<[Box<Path>]>>,
    pub gomodcache: Option<Box<Path>>,
    pub goos: Option<Box<str>>,
    pub goarch: Option<Box<str>>,
    pub cgo: Option<bool>,
    /// Extra build tags.
    pub tags: Box<[Box<str>]>,
    /// The minor version of the newest satisfied `go1.N` release tag.
    pub release: Option<u32>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read the config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse the config file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// The fully resolved locations and build settings used to find and filter
/// Go packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoEnv {
    pub goroot: Option<Box<Path>>,
    pub gopath: Box<[Box<Path>]>,
    pub gomodcache: Option<Box<Path>>,
    pub build: BuildContext,
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file_contents = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&file_contents)?;
        Ok(config)
    }

    /// Loads `moq.toml` from `dir` if it exists, and otherwise returns the
    /// default configuration.
    pub fn discover(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        match path.is_file() {
            true => Self::load(path),
            false => Ok(Self::default()),
        }
    }

    /// Resolves the Go environment using the process environment variables.
    pub fn go_env(&self) -> GoEnv {
        self.go_env_with(|key| std::env::var(key).ok())
    }

    /// Resolves the Go environment, reading environment variables through
    /// `var`. Configured values always win over the environment.
    pub fn go_env_with(&self, var: impl Fn(&str) -> Option<String>) -> GoEnv {
        let var = |key: &str| var(key).filter(|value| !value.is_empty());
        let go = &self.go;

        let goroot = go
            .goroot
            .clone()
            .or_else(|| var("GOROOT").map(|root| PathBuf::from(root).into()))
            .or_else(find_goroot);

        let gopath: Box<[Box<Path>]> = match &go.gopath {
            Some(paths) => paths.clone(),
            None => match var("GOPATH") {
                Some(paths) => std::env::split_paths(&paths)
                    .map(PathBuf::into_boxed_path)
                    .collect(),
                None => var("HOME")
                    .or_else(|| var("USERPROFILE"))
                    .map(|home| Path::new(&home).join("go").into_boxed_path())
                    .into_iter()
                    .collect(),
            },
        };

        let gomodcache = go
            .gomodcache
            .clone()
            .or_else(|| var("GOMODCACHE").map(|dir| PathBuf::from(dir).into()))
            .or_else(|| {
                gopath
                    .first()
                    .map(|path| path.join("pkg").join("mod").into_boxed_path())
            });

        let goos: Box<str> = go
            .goos
            .clone()
            .or_else(|| var("GOOS").map(Into::into))
            .unwrap_or_else(|| host_os().into());

        let goarch: Box<str> = go
            .goarch
            .clone()
            .or_else(|| var("GOARCH").map(Into::into))
            .unwrap_or_else(|| host_arch().into());

        let cgo = go.cgo.unwrap_or_else(|| match var("CGO_ENABLED") {
            Some(enabled) => enabled == "1",
            None => *goos == *host_os() && *goarch == *host_arch(),
        });

        let release = go
            .release
            .or_else(|| goroot.as_deref().and_then(goroot_release))
            .unwrap_or(DEFAULT_RELEASE);

        tracing::debug!(?goroot, ?gopath, ?gomodcache, %goos, %goarch, release, "resolved go environment");

        GoEnv {
            goroot,
            gopath,
            gomodcache,
            build: BuildContext {
                goos,
                goarch,
                cgo,
                tags: go.tags.clone(),
                release,
            },
        }
    }
}

/// Finds `$GOROOT` relative to a `go` binary on the `PATH`.
fn find_goroot() -> Option<Box<Path>> {
    let go = which("go").ok()?;
    let go = go.canonicalize().unwrap_or(go);
    go.parent()?.parent().map(Into::into)
}

/// Reads the minor release from the first line of `$GOROOT/VERSION`, which
/// looks like `go1.22.3`.
fn goroot_release(goroot: &Path) -> Option<u32> {
    let version = std::fs::read_to_string(goroot.join("VERSION")).ok()?;
    parse_release(version.lines().next()?)
}

fn parse_release(version: &str) -> Option<u32> {
    let minor = version.trim().strip_prefix("go1.")?;
    let end = minor
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(minor.len());
    minor[..end].parse().ok()
}

fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        os => os,
    }
}

fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        "wasm32" => "wasm",
        arch => arch,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn parses_go_section() {
        let config: Config = toml::from_str(
            r#"
            [go]
            goroot = "/opt/go"
            goos = "windows"
            tags = ["integration"]
            release = 21
            "#,
        )
        .unwrap();

        assert_eq!(config.go.goroot.as_deref(), Some(Path::new("/opt/go")));
        assert_eq!(config.go.goos.as_deref(), Some("windows"));
        assert_eq!(&*config.go.tags, &["integration".into()]);
        assert_eq!(config.go.release, Some(21));
    }

    #[test]
    fn rejects_unknown_keys() {
        assert!(toml::from_str::<Config>("[go]\ngoroott = \"/opt/go\"\n").is_err());
    }

    #[test]
    fn config_wins_over_environment() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("GOROOT", "/usr/local/go"),
            ("GOPATH", "/home/gopher/go"),
            ("GOOS", "linux"),
            ("GOARCH", "arm64"),
            ("CGO_ENABLED", "0"),
        ]);

        let config = Config {
            go: GoConfig {
                goos: Some("darwin".into()),
                release: Some(20),
                ..GoConfig::default()
            },
        };

        let env = config.go_env_with(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(env.goroot.as_deref(), Some(Path::new("/usr/local/go")));
        assert_eq!(&*env.gopath, &[Path::new("/home/gopher/go").into()]);
        assert_eq!(
            env.gomodcache.as_deref(),
            Some(Path::new("/home/gopher/go/pkg/mod"))
        );
        assert_eq!(&*env.build.goos, "darwin");
        assert_eq!(&*env.build.goarch, "arm64");
        assert!(!env.build.cgo);
        assert_eq!(env.build.release, 20);
    }

    #[test]
    fn release_from_version_file() {
        assert_eq!(parse_release("go1.22.3"), Some(22));
        assert_eq!(parse_release("go1.21rc2"), Some(21));
        assert_eq!(parse_release("devel +abc"), None);
    }
}
