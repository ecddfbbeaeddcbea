/// Source dialect of a policy file, keyed by extension.
///
/// The closed pair matters: remote import resolution tries both candidate
/// extensions, the referrer's own dialect first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Statically-typed superset dialect (`.ts`, `.tsx`).
    TypeScript,
    /// Dynamically-typed dialect, optionally carrying legacy type
    /// annotations stripped at transform time (`.js`, `.jsx`).
    JavaScript,
}

impl Dialect {
    /// Infer the dialect from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Option<Dialect> {
        match ext {
            "ts" | "tsx" => Some(Dialect::TypeScript),
            "js" | "jsx" => Some(Dialect::JavaScript),
            _ => None,
        }
    }

    /// Infer the dialect from a path, defaulting to JavaScript when the
    /// extension is missing or unknown.
    pub fn from_path_or_default(path: &str) -> Dialect {
        path.rsplit_once('.')
            .and_then(|(_, ext)| Dialect::from_extension(ext))
            .unwrap_or(Dialect::JavaScript)
    }

    /// Canonical extension for this dialect.
    pub fn extension(self) -> &'static str {
        match self {
            Dialect::TypeScript => "ts",
            Dialect::JavaScript => "js",
        }
    }

    /// Candidate extensions for resolving an extensionless import, in
    /// priority order: this dialect's own extension first.
    pub fn candidate_extensions(self) -> [&'static str; 2] {
        match self {
            Dialect::TypeScript => ["ts", "js"],
            Dialect::JavaScript => ["js", "ts"],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_mapping_is_exhaustive_over_known_pairs() {
        assert_eq!(Dialect::from_extension("ts"), Some(Dialect::TypeScript));
        assert_eq!(Dialect::from_extension("tsx"), Some(Dialect::TypeScript));
        assert_eq!(Dialect::from_extension("js"), Some(Dialect::JavaScript));
        assert_eq!(Dialect::from_extension("jsx"), Some(Dialect::JavaScript));
        assert_eq!(Dialect::from_extension("rs"), None);
    }

    #[test]
    fn candidates_prefer_own_extension() {
        assert_eq!(Dialect::TypeScript.candidate_extensions(), ["ts", "js"]);
        assert_eq!(Dialect::JavaScript.candidate_extensions(), ["js", "ts"]);
    }

    #[test]
    fn unknown_extension_defaults_to_javascript() {
        assert_eq!(
            Dialect::from_path_or_default("policy/revetfile"),
            Dialect::JavaScript
        );
        assert_eq!(
            Dialect::from_path_or_default("dir/a.ts"),
            Dialect::TypeScript
        );
    }
}
