use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{json, Value as JsonValue};

const COMPILER_CONFIG_FILE: &str = "tsconfig.json";

/// Find the nearest compiler configuration for a file, walking upward from
/// `start_dir` toward `cwd` and never above it.
///
/// - `start_dir` containing a config short-circuits immediately.
/// - a config exactly at the `cwd` boundary is valid.
/// - when `start_dir` is not inside `cwd`'s tree, only `cwd` itself is
///   checked.
pub fn find_compiler_config(start_dir: &Utf8Path, cwd: &Utf8Path) -> Option<Utf8PathBuf> {
    if start_dir != cwd && start_dir.strip_prefix(cwd).is_err() {
        let candidate = cwd.join(COMPILER_CONFIG_FILE);
        return candidate.is_file().then_some(candidate);
    }

    let mut dir = start_dir;
    loop {
        let candidate = dir.join(COMPILER_CONFIG_FILE);
        if candidate.is_file() {
            return Some(candidate);
        }
        if dir == cwd {
            return None;
        }
        dir = dir.parent()?;
    }
}

/// Build the project configuration handed to the native compiler.
///
/// Any discovered configuration is honored through the `extends` chain,
/// except that module emission is force-overridden to the interoperable
/// form (CommonJS) — the output must be consumable by a loader expecting
/// `require`/`module.exports`. With no discovered configuration, compiler
/// defaults apply.
pub fn interoperable_project_config(
    found: Option<&Utf8Path>,
    input_file: &Utf8Path,
    out_dir: &Utf8Path,
) -> JsonValue {
    let mut config = json!({
        "compilerOptions": {
            "module": "commonjs",
            "noEmit": false,
            "outDir": out_dir.as_str(),
        },
        "files": [input_file.as_str()],
    });
    if let Some(found) = found {
        config["extends"] = JsonValue::String(found.to_string());
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mkdirs(root: &Utf8Path, rel: &str) -> Utf8PathBuf {
        let dir = root.join(rel);
        std::fs::create_dir_all(dir.as_std_path()).expect("create dirs");
        dir
    }

    fn touch_config(dir: &Utf8Path) -> Utf8PathBuf {
        let path = dir.join(COMPILER_CONFIG_FILE);
        std::fs::write(path.as_std_path(), "{}").expect("write config");
        path
    }

    #[test]
    fn own_directory_short_circuits() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let cwd = Utf8Path::from_path(tmp.path()).expect("utf8").to_owned();
        let nested = mkdirs(&cwd, "policies/deep");
        let root_cfg = touch_config(&cwd);
        let near_cfg = touch_config(&nested);

        assert_eq!(find_compiler_config(&nested, &cwd), Some(near_cfg));
        // And without the near config, the walk reaches the boundary.
        std::fs::remove_file(nested.join(COMPILER_CONFIG_FILE).as_std_path()).expect("rm");
        assert_eq!(find_compiler_config(&nested, &cwd), Some(root_cfg));
    }

    #[test]
    fn boundary_config_is_valid_and_walk_never_goes_above() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = Utf8Path::from_path(tmp.path()).expect("utf8").to_owned();
        // Config above the working directory must be invisible.
        touch_config(&root);
        let cwd = mkdirs(&root, "project");
        let nested = mkdirs(&root, "project/src");

        assert_eq!(find_compiler_config(&nested, &cwd), None);

        let boundary_cfg = touch_config(&cwd);
        assert_eq!(find_compiler_config(&nested, &cwd), Some(boundary_cfg));
    }

    #[test]
    fn outside_ancestry_checks_only_cwd() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let root = Utf8Path::from_path(tmp.path()).expect("utf8").to_owned();
        let cwd = mkdirs(&root, "project");
        let elsewhere = mkdirs(&root, "elsewhere/policies");
        touch_config(&elsewhere);

        assert_eq!(find_compiler_config(&elsewhere, &cwd), None);

        let cwd_cfg = touch_config(&cwd);
        assert_eq!(find_compiler_config(&elsewhere, &cwd), Some(cwd_cfg));
    }

    #[test]
    fn generated_config_forces_interoperable_module_emission() {
        let cfg = interoperable_project_config(
            Some(Utf8Path::new("/repo/tsconfig.json")),
            Utf8Path::new("/tmp/work/input.ts"),
            Utf8Path::new("/tmp/work/out"),
        );
        assert_eq!(cfg["extends"], "/repo/tsconfig.json");
        assert_eq!(cfg["compilerOptions"]["module"], "commonjs");
        assert_eq!(cfg["files"][0], "/tmp/work/input.ts");
    }

    #[test]
    fn generated_config_without_discovery_uses_defaults() {
        let cfg = interoperable_project_config(
            None,
            Utf8Path::new("/tmp/work/input.ts"),
            Utf8Path::new("/tmp/work/out"),
        );
        assert!(cfg.get("extends").is_none());
        assert_eq!(cfg["compilerOptions"]["module"], "commonjs");
    }
}
