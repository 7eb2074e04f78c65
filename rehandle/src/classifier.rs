/// Suffixes of text/source/config files worth scanning.
const TEXT_SUFFIXES: &[&str] = &[
    ".md",
    ".json",
    ".js",
    ".ts",
    ".jsx",
    ".tsx",
    ".yml",
    ".yaml",
    ".html",
    ".css",
    ".txt",
    ".env",
    ".gitignore",
    ".npmrc",
    ".sh",
];

/// Conventional document names that usually ship without an extension.
const EXTENSIONLESS_DOCS: &[&str] = &["README", "LICENSE", "CHANGELOG", "CONTRIBUTING"];

/// Check if a repository path should be fetched and scanned.
pub fn is_eligible(path: &str) -> bool {
    let basename = basename(path);

    if basename.is_empty() {
        return false;
    }

    if !basename.contains('.') {
        let upper = basename.to_uppercase();
        return EXTENSIONLESS_DOCS.iter().any(|name| upper.contains(name));
    }

    let lower = basename.to_lowercase();
    TEXT_SUFFIXES.iter().any(|suffix| lower.ends_with(suffix))
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
