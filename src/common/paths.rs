//! Reclient directory resolution and configuration paths
//!
//! The source checkout is the only required location. The reclient config
//! and tool directories default to templates relative to it:
//! - `{src_dir}/buildtools/reclient_cfgs`
//! - `{src_dir}/buildtools/reclient`
//!
//! Templates may reference any directory resolved before them, so an
//! explicit `--reclient_dir={src_dir}/third_party/reclient` works too.
//! Available placeholders, in resolution order: `script_dir` (directory of
//! the running executable), `src_dir`, `exec_root`, `build_dir`,
//! `reclient_cfgs_dir`, `reclient_dir`.
//!
//! The reclient configs must live under `exec_root`, which is the source
//! checkout itself.

use std::path::{Component, Path, PathBuf};

use super::{Error, Result};

/// Name used for the configuration directory
const APP_NAME: &str = "reclient-check";

/// Template for the reclient exec root
const EXEC_ROOT: &str = "{src_dir}";

/// Template for the build directory
const BUILD_DIR: &str = "{src_dir}/out/a";

/// Default template for the reclient configs directory
pub const DEFAULT_RECLIENT_CFGS_DIR: &str = "{src_dir}/buildtools/reclient_cfgs";

/// Default template for the reclient tools directory
pub const DEFAULT_RECLIENT_DIR: &str = "{src_dir}/buildtools/reclient";

/// Resolved reclient directories, immutable once built
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReclientPaths {
    /// Chromium-style source checkout root
    pub src_dir: PathBuf,
    /// Directory holding `reproxy.cfg` and rewrapper configs
    pub reclient_cfgs_dir: PathBuf,
    /// Directory holding the `bootstrap` and `rewrapper` executables
    pub reclient_dir: PathBuf,
}

impl ReclientPaths {
    /// Resolve all directories from the source root and optional templates
    ///
    /// `None` selects the default template for that directory. Relative
    /// results are made absolute against the current working directory.
    pub fn resolve(
        src_dir: &Path,
        reclient_cfgs_dir: Option<&str>,
        reclient_dir: Option<&str>,
    ) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let exe = std::env::current_exe().ok();
        Self::resolve_with(
            &cwd,
            exe.as_deref().and_then(Path::parent),
            src_dir,
            reclient_cfgs_dir,
            reclient_dir,
        )
    }

    /// Same as [`ReclientPaths::resolve`] with an explicit base directory
    ///
    /// `{script_dir}` is not available to templates resolved this way.
    pub fn resolve_from(
        base: &Path,
        src_dir: &Path,
        reclient_cfgs_dir: Option<&str>,
        reclient_dir: Option<&str>,
    ) -> Result<Self> {
        Self::resolve_with(base, None, src_dir, reclient_cfgs_dir, reclient_dir)
    }

    fn resolve_with(
        base: &Path,
        script_dir: Option<&Path>,
        src_dir: &Path,
        reclient_cfgs_dir: Option<&str>,
        reclient_dir: Option<&str>,
    ) -> Result<Self> {
        let mut vars = PathVars::default();

        if let Some(script_dir) = script_dir {
            vars.insert("script_dir", &absolutize(base, script_dir));
        }

        let src_dir = absolutize(base, src_dir);
        vars.insert("src_dir", &src_dir);

        let exec_root = vars.create_path(base, "exec_root", EXEC_ROOT)?;
        vars.create_path(base, "build_dir", BUILD_DIR)?;

        let reclient_cfgs_dir = vars.create_path(
            base,
            "reclient_cfgs_dir",
            reclient_cfgs_dir.unwrap_or(DEFAULT_RECLIENT_CFGS_DIR),
        )?;
        let reclient_dir = vars.create_path(
            base,
            "reclient_dir",
            reclient_dir.unwrap_or(DEFAULT_RECLIENT_DIR),
        )?;

        if !reclient_cfgs_dir.starts_with(&exec_root) {
            return Err(Error::Config(format!(
                "{} should be under {}",
                reclient_cfgs_dir.display(),
                exec_root.display()
            )));
        }

        Ok(Self {
            src_dir,
            reclient_cfgs_dir,
            reclient_dir,
        })
    }

    /// The proxy configuration file passed to `bootstrap --cfg`
    pub fn reproxy_cfg(&self) -> PathBuf {
        self.reclient_cfgs_dir.join("reproxy.cfg")
    }

    /// The proxy bootstrap executable
    pub fn bootstrap(&self) -> PathBuf {
        self.tool("bootstrap")
    }

    /// The remote execution wrapper executable
    pub fn rewrapper(&self) -> PathBuf {
        self.tool("rewrapper")
    }

    fn tool(&self, name: &str) -> PathBuf {
        self.reclient_dir
            .join(format!("{}{}", name, std::env::consts::EXE_SUFFIX))
    }
}

/// Already-resolved directories available to later templates
#[derive(Debug, Default)]
struct PathVars {
    vars: Vec<(&'static str, String)>,
}

impl PathVars {
    fn insert(&mut self, name: &'static str, path: &Path) {
        self.vars.push((name, display_path(path)));
    }

    fn create_path(&mut self, base: &Path, name: &'static str, template: &str) -> Result<PathBuf> {
        let expanded = self.expand(name, template)?;
        let path = absolutize(base, Path::new(&expanded));
        self.insert(name, &path);
        Ok(path)
    }

    /// Expand `{var}` placeholders; `{{` and `}}` are literal braces
    fn expand(&self, name: &str, template: &str) -> Result<String> {
        let mut out = String::with_capacity(template.len());
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    out.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    out.push('}');
                }
                '{' => {
                    let mut var = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(c) => var.push(c),
                            None => {
                                return Err(Error::Config(format!(
                                    "Unterminated placeholder in {name} '{template}'"
                                )))
                            }
                        }
                    }
                    let value = self
                        .vars
                        .iter()
                        .find(|(known, _)| *known == var)
                        .map(|(_, value)| value.as_str())
                        .ok_or_else(|| {
                            Error::Config(format!(
                                "Unknown placeholder '{{{var}}}' in {name} '{template}'"
                            ))
                        })?;
                    out.push_str(value);
                }
                '}' => {
                    return Err(Error::Config(format!(
                        "Unmatched '}}' in {name} '{template}'"
                    )))
                }
                c => out.push(c),
            }
        }

        Ok(out)
    }
}

/// Join `path` onto `base` when relative and collapse `.` and `..` lexically
pub fn absolutize(base: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Render a path with forward slashes for template substitution
fn display_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Get the configuration directory path
///
/// Uses the directories crate for platform-appropriate locations:
/// - Linux: `~/.config/reclient-check/`
/// - macOS: `~/Library/Application Support/reclient-check/`
/// - Windows: `%APPDATA%\reclient-check\`
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the default configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
