use camino::{Utf8Path, Utf8PathBuf};
use std::process::Command;
use tracing::debug;

/// One-time-detected set of optional transformation tools.
///
/// Probing is a pure function of the PATH variable and the working
/// directory's `node_modules`; callers cache the value for the process
/// lifetime and pass it down by value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolchainCapabilities {
    /// Native compiler for the statically-typed dialect (`tsc`).
    pub native_compiler: Option<Utf8PathBuf>,
    /// General-purpose transformer (`babel`), either generation.
    pub transformer: Option<BabelToolchain>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BabelToolchain {
    pub path: Utf8PathBuf,
    /// Major version reported by `babel --version` (7+ is the current
    /// generation with scoped plugin names).
    pub major: u32,
    /// Whether the legacy type-stripping plugin is installed.
    pub legacy_type_plugin: bool,
}

impl BabelToolchain {
    /// The current generation can strip the statically-typed dialect too.
    pub fn supports_typed_dialect(&self) -> bool {
        self.major >= 7
    }
}

impl ToolchainCapabilities {
    /// Probe the host environment. Call once per process.
    pub fn probe(cwd: &Utf8Path) -> ToolchainCapabilities {
        let path_var = std::env::var_os("PATH").unwrap_or_default();
        Self::probe_with_path(cwd, &path_var)
    }

    /// Probe against an explicit PATH value (test seam).
    pub fn probe_with_path(cwd: &Utf8Path, path_var: &std::ffi::OsStr) -> ToolchainCapabilities {
        let native_compiler = find_executable(path_var, "tsc");
        let transformer = find_executable(path_var, "babel").map(|path| {
            let major = babel_major_version(&path).unwrap_or(7);
            BabelToolchain {
                path,
                major,
                legacy_type_plugin: legacy_type_plugin_installed(cwd),
            }
        });
        let caps = ToolchainCapabilities {
            native_compiler,
            transformer,
        };
        debug!(?caps, "probed host toolchain");
        caps
    }
}

fn find_executable(path_var: &std::ffi::OsStr, name: &str) -> Option<Utf8PathBuf> {
    for dir in std::env::split_paths(path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            if let Ok(utf8) = Utf8PathBuf::from_path_buf(candidate) {
                return Some(utf8);
            }
        }
    }
    None
}

fn babel_major_version(path: &Utf8Path) -> Option<u32> {
    let output = Command::new(path.as_std_path()).arg("--version").output().ok()?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    let digits: String = stdout.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

fn legacy_type_plugin_installed(cwd: &Utf8Path) -> bool {
    let scoped = cwd.join("node_modules/@babel/plugin-transform-flow-strip-types");
    let legacy = cwd.join("node_modules/babel-plugin-transform-flow-strip-types");
    scoped.is_dir() || legacy.is_dir()
}
