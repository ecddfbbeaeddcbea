use crate::config::{find_compiler_config, interoperable_project_config};
use crate::plan::{plan_for, TransformPlan, TransformToggles};
use crate::probe::ToolchainCapabilities;
use crate::in_dependency_dir;
use camino::{Utf8Path, Utf8PathBuf};
use revet_types::Dialect;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("could not spawn {tool}: {source}")]
    ToolchainSpawn {
        tool: String,
        source: std::io::Error,
    },

    /// The compiler/transformer rejected the input (syntax error). The
    /// tool's own output carries the original file/line, which sanitization
    /// kept accurate.
    #[error("{tool} rejected the input:\n{output}")]
    CompilerRejected { tool: String, output: String },

    #[error("transform scratch space: {0}")]
    Io(#[from] std::io::Error),
}

/// Compiles sanitized source down to a directly executable form.
///
/// Holds the immutable probe result and toggles; per-file dispatch is
/// [`plan_for`]. Structure of the output is otherwise unchanged — no
/// renaming, no bundling.
#[derive(Clone, Debug)]
pub struct TransformPipeline {
    caps: ToolchainCapabilities,
    toggles: TransformToggles,
    cwd: Utf8PathBuf,
}

impl TransformPipeline {
    pub fn new(caps: ToolchainCapabilities, toggles: TransformToggles, cwd: Utf8PathBuf) -> Self {
        TransformPipeline { caps, toggles, cwd }
    }

    /// Transform a local file's (already sanitized) source. The path is
    /// used for dialect-independent concerns: dependency-directory
    /// detection and compiler-config discovery.
    pub fn transform_local(
        &self,
        path: &Utf8Path,
        source: &str,
    ) -> Result<String, TransformError> {
        let dialect = Dialect::from_path_or_default(path.as_str());
        let config_dir = path
            .parent()
            .map(Utf8Path::to_owned)
            .unwrap_or_else(|| self.cwd.clone());
        self.run(dialect, in_dependency_dir(path), &config_dir, source)
    }

    /// Transform fetched remote content. Remote files have no local
    /// directory, so config discovery falls back to the working directory
    /// only.
    pub fn transform_remote(
        &self,
        dialect: Dialect,
        source: &str,
    ) -> Result<String, TransformError> {
        let cwd = self.cwd.clone();
        self.run(dialect, false, &cwd, source)
    }

    fn run(
        &self,
        dialect: Dialect,
        dependency: bool,
        config_dir: &Utf8Path,
        source: &str,
    ) -> Result<String, TransformError> {
        let plan = plan_for(dialect, dependency, &self.caps, self.toggles);
        debug!(?dialect, ?plan, "transforming source");
        match plan {
            TransformPlan::PassThrough => Ok(source.to_string()),
            TransformPlan::NativeCompiler => {
                let tsc = self.caps.native_compiler.clone().ok_or_else(|| {
                    TransformError::ToolchainSpawn {
                        tool: "tsc".to_string(),
                        source: std::io::Error::other("native compiler not probed"),
                    }
                })?;
                self.native_compile(&tsc, dialect, config_dir, source)
            }
            TransformPlan::TransformerTypeStripping => self.babel(
                source,
                dialect,
                &["@babel/plugin-transform-typescript", MODULES_PLUGIN_V7],
            ),
            TransformPlan::Transformer { strip_legacy_types } => {
                let generation = self
                    .caps
                    .transformer
                    .as_ref()
                    .map_or(7, |babel| babel.major);
                let mut plugins: Vec<&str> = Vec::new();
                if generation >= 7 {
                    plugins.push(MODULES_PLUGIN_V7);
                    if strip_legacy_types {
                        plugins.push("@babel/plugin-transform-flow-strip-types");
                    }
                } else {
                    plugins.push(MODULES_PLUGIN_V6);
                    if strip_legacy_types {
                        plugins.push("transform-flow-strip-types");
                    }
                }
                self.babel(source, dialect, &plugins)
            }
        }
    }

    fn native_compile(
        &self,
        tsc: &Utf8Path,
        dialect: Dialect,
        config_dir: &Utf8Path,
        source: &str,
    ) -> Result<String, TransformError> {
        let scratch = tempfile::tempdir()?;
        let scratch_dir = Utf8PathBuf::from_path_buf(scratch.path().to_path_buf())
            .map_err(|_| TransformError::Io(std::io::Error::other("non-UTF-8 temp dir")))?;

        let input = scratch_dir.join(format!("input.{}", dialect.extension()));
        let out_dir = scratch_dir.join("out");
        std::fs::write(input.as_std_path(), source)?;

        let found = find_compiler_config(config_dir, &self.cwd);
        let project = interoperable_project_config(found.as_deref(), &input, &out_dir);
        let project_path = scratch_dir.join("tsconfig.json");
        std::fs::write(project_path.as_std_path(), project.to_string())?;

        let output = Command::new(tsc.as_std_path())
            .arg("--project")
            .arg(project_path.as_str())
            .current_dir(self.cwd.as_std_path())
            .output()
            .map_err(|source| TransformError::ToolchainSpawn {
                tool: tsc.to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(TransformError::CompilerRejected {
                tool: "tsc".to_string(),
                output: String::from_utf8_lossy(&output.stdout).into_owned()
                    + &String::from_utf8_lossy(&output.stderr),
            });
        }

        let emitted = out_dir.join("input.js");
        Ok(std::fs::read_to_string(emitted.as_std_path())?)
    }

    fn babel(
        &self,
        source: &str,
        dialect: Dialect,
        plugins: &[&str],
    ) -> Result<String, TransformError> {
        let babel = self.caps.transformer.as_ref().ok_or_else(|| {
            TransformError::ToolchainSpawn {
                tool: "babel".to_string(),
                source: std::io::Error::other("transformer not probed"),
            }
        })?;

        let scratch = tempfile::tempdir()?;
        let input = scratch.path().join(format!("input.{}", dialect.extension()));
        std::fs::write(&input, source)?;

        let output = Command::new(babel.path.as_std_path())
            .arg(&input)
            .arg("--no-babelrc")
            .arg("--plugins")
            .arg(plugins.join(","))
            .current_dir(self.cwd.as_std_path())
            .output()
            .map_err(|source| TransformError::ToolchainSpawn {
                tool: babel.path.to_string(),
                source,
            })?;
        if !output.status.success() {
            return Err(TransformError::CompilerRejected {
                tool: "babel".to_string(),
                output: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

const MODULES_PLUGIN_V7: &str = "@babel/plugin-transform-modules-commonjs";
const MODULES_PLUGIN_V6: &str = "transform-es2015-modules-commonjs";
