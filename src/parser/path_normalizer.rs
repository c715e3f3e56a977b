use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR_STR};

/// Lexically normalizes a block path for the host filesystem.
///
/// Both `/` and `\` count as separators. Empty and `.` segments are dropped
/// and `..` cancels the preceding segment. Leading `..` segments survive on
/// relative paths and are discarded on rooted ones. A path that reduces to
/// nothing becomes `.`.
pub fn normalize_relative_path(raw: &str) -> PathBuf {
    let trimmed = raw.trim();
    let rooted = trimmed.starts_with(&['/', '\\'][..]);
    let mut segments: Vec<&str> = Vec::new();

    for segment in trimmed.split(&['/', '\\'][..]) {
        match segment {
            "" | "." => {}
            ".." => {
                if segments.last().is_some_and(|last| *last != "..") {
                    segments.pop();
                } else if !rooted {
                    segments.push("..");
                }
            }
            other => segments.push(other),
        }
    }

    let mut path = if rooted {
        PathBuf::from(MAIN_SEPARATOR_STR)
    } else {
        PathBuf::new()
    };
    path.extend(segments);

    if path.as_os_str().is_empty() {
        path.push(".");
    }

    path
}

/// True when joining `path` onto a directory could land outside it.
pub fn escapes_root(path: &Path) -> bool {
    path.has_root()
        || path.is_absolute()
        || path
            .components()
            .any(|c| matches!(c, Component::ParentDir | Component::Prefix(_)))
}

/// True when the path names the directory itself rather than a file in it.
pub fn is_current_dir(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalized(raw: &str) -> String {
        normalize_relative_path(raw)
            .to_string_lossy()
            .replace('\\', "/")
    }

    #[test]
    fn test_simple_paths() {
        assert_eq!(normalized("src/main.rs"), "src/main.rs");
        assert_eq!(normalized("  README.md \t"), "README.md");
        assert_eq!(normalized("src\\lib\\mod.rs"), "src/lib/mod.rs");
    }

    #[test]
    fn test_redundant_segments_collapse() {
        assert_eq!(normalized("./src//utils/./io.rs"), "src/utils/io.rs");
        assert_eq!(normalized("a/b/../c.txt"), "a/c.txt");
        assert_eq!(normalized("a/b/"), "a/b");
    }

    #[test]
    fn test_parent_segments() {
        assert_eq!(normalized("../outside.txt"), "../outside.txt");
        assert_eq!(normalized("a/../../x"), "../x");
        assert_eq!(normalized("/../etc/passwd"), "/etc/passwd");
    }

    #[test]
    fn test_empty_paths() {
        assert_eq!(normalized(""), ".");
        assert_eq!(normalized("   "), ".");
        assert_eq!(normalized("a/.."), ".");
        assert!(is_current_dir(&normalize_relative_path("./")));
        assert!(!is_current_dir(&normalize_relative_path("a")));
    }

    #[test]
    fn test_escape_detection() {
        assert!(!escapes_root(&normalize_relative_path("src/main.rs")));
        assert!(!escapes_root(&normalize_relative_path("a/../b")));
        assert!(escapes_root(&normalize_relative_path("../b")));
        assert!(escapes_root(&normalize_relative_path("/etc/passwd")));
    }
}
