use crate::probe::ToolchainCapabilities;
use revet_types::Dialect;

/// Environment toggle: disable all transformation (pass-through mode).
pub const ENV_NO_TRANSFORM: &str = "REVET_NO_TRANSFORM";
/// Environment toggle: disable only the native-compiler path.
pub const ENV_NO_NATIVE_COMPILER: &str = "REVET_NO_TSC";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TransformToggles {
    pub disable_all: bool,
    pub disable_native_compiler: bool,
}

impl TransformToggles {
    pub fn from_env() -> TransformToggles {
        TransformToggles {
            disable_all: env_flag(ENV_NO_TRANSFORM),
            disable_native_compiler: env_flag(ENV_NO_NATIVE_COMPILER),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var_os(name).is_some_and(|v| !v.is_empty() && v != "0")
}

/// How a single file gets turned into executable form. Closed set: every
/// supported (dialect, toolchain) combination maps to exactly one plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransformPlan {
    /// Source is already executable (or transformation is unavailable or
    /// disabled); use it unchanged.
    PassThrough,
    /// Compile with the native typed-dialect compiler, module emission
    /// forced to the interoperable form.
    NativeCompiler,
    /// Strip types with the general transformer's typed-dialect plugin.
    TransformerTypeStripping,
    /// Run the general transformer; optionally strip legacy annotations.
    Transformer { strip_legacy_types: bool },
}

/// The dispatch table of the pipeline.
pub fn plan_for(
    dialect: Dialect,
    in_dependency_dir: bool,
    caps: &ToolchainCapabilities,
    toggles: TransformToggles,
) -> TransformPlan {
    if toggles.disable_all || in_dependency_dir {
        return TransformPlan::PassThrough;
    }
    match dialect {
        Dialect::TypeScript => {
            if caps.native_compiler.is_some() && !toggles.disable_native_compiler {
                return TransformPlan::NativeCompiler;
            }
            match &caps.transformer {
                Some(babel) if babel.supports_typed_dialect() => {
                    TransformPlan::TransformerTypeStripping
                }
                _ => TransformPlan::PassThrough,
            }
        }
        Dialect::JavaScript => match &caps.transformer {
            Some(babel) => TransformPlan::Transformer {
                strip_legacy_types: babel.legacy_type_plugin,
            },
            None => TransformPlan::PassThrough,
        },
    }
}
