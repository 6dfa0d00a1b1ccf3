//! Host path translation for the Linux-compatible subsystem.

/// Rewrite a host path into the subsystem's mount convention.
///
/// `C:\Users\dev\proj` becomes `/mnt/c/Users/dev/proj`. Paths without a
/// drive-letter prefix only get their separators normalized, so an
/// already-POSIX path is returned unchanged.
#[must_use]
pub fn to_subsystem_path(path: &str) -> String {
    if !has_drive_prefix(path) {
        return path.replace('\\', "/");
    }

    let bytes = path.as_bytes();
    let drive = char::from(bytes[0]).to_ascii_lowercase();
    let rest = path[2..].replace('\\', "/");
    if rest.is_empty() || rest.starts_with('/') {
        format!("/mnt/{drive}{rest}")
    } else {
        format!("/mnt/{drive}/{rest}")
    }
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// True for `C:\...` or `C:/...`, whatever the running host.
#[must_use]
pub fn is_drive_absolute(path: &str) -> bool {
    has_drive_prefix(path) && matches!(path.as_bytes().get(2), Some(b'\\' | b'/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drive_path_translated() {
        assert_eq!(
            to_subsystem_path(r"C:\Users\dev\proj"),
            "/mnt/c/Users/dev/proj"
        );
    }

    #[test]
    fn test_lowercase_drive_letter() {
        assert_eq!(to_subsystem_path(r"d:\work"), "/mnt/d/work");
    }

    #[test]
    fn test_bare_drive() {
        assert_eq!(to_subsystem_path("E:"), "/mnt/e");
        assert_eq!(to_subsystem_path(r"E:\"), "/mnt/e/");
    }

    #[test]
    fn test_drive_relative_gets_separator() {
        assert_eq!(to_subsystem_path(r"C:proj\src"), "/mnt/c/proj/src");
    }

    #[test]
    fn test_mixed_separators() {
        assert_eq!(to_subsystem_path(r"C:\a/b\c"), "/mnt/c/a/b/c");
    }

    #[test]
    fn test_posix_path_unchanged() {
        for path in ["/home/dev/proj", "/mnt/c/Users", "relative/dir", ""] {
            assert_eq!(to_subsystem_path(path), path);
        }
    }

    #[test]
    fn test_drive_absolute_detection() {
        assert!(is_drive_absolute(r"C:\proj\build"));
        assert!(is_drive_absolute("d:/work"));
        assert!(!is_drive_absolute(r"C:proj"));
        assert!(!is_drive_absolute("/mnt/c/proj"));
        assert!(!is_drive_absolute("scripts/build"));
    }

    #[test]
    fn test_translation_is_idempotent() {
        let once = to_subsystem_path(r"C:\Users\dev");
        assert_eq!(to_subsystem_path(&once), once);
    }
}
