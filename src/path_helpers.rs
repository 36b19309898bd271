use std::borrow::Cow;

/// Normalizes a path by replacing backslashes with forward slashes and
/// dropping "." segments. ".." and names merely ending in "." are kept. Uses
/// Cow to avoid allocation when path is already normalized.
pub fn normalize_path(path: &str) -> Cow<'_, str> {
    let has_dot_segment = || path.split(['/', '\\']).any(|s| s == ".");

    if !path.contains('\\') && !has_dot_segment() {
        return Cow::Borrowed(path);
    }

    let unified = path.replace('\\', "/");

    Cow::Owned(
        unified
            .split('/')
            .filter(|segment| *segment != ".")
            .collect::<Vec<_>>()
            .join("/"),
    )
}

/// Normalizes a configured package path for prefix comparison: separators are
/// unified and leading / trailing slashes removed. The repository root
/// normalizes to "."
pub fn normalize_package_path(path: &str) -> String {
    let normalized = normalize_path(path);
    let trimmed = normalized.trim_matches('/');

    if trimmed.is_empty() || trimmed == "." {
        ".".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Returns true when `path` is owned by `package_path`: either equal to it or
/// nested below it on a "/" boundary. Both arguments must be normalized.
pub fn is_under(path: &str, package_path: &str) -> bool {
    if package_path == "." {
        return true;
    }

    path == package_path
        || (path.starts_with(package_path)
            && path.as_bytes().get(package_path.len()) == Some(&b'/'))
}

/// Joins a repository relative file onto a package path, collapsing the root
/// package so that files never start with "./"
pub fn package_file(package_path: &str, file: &str) -> String {
    let package_path = normalize_package_path(package_path);
    let file = normalize_path(file);
    let file = file.trim_start_matches('/');

    if package_path == "." {
        file.to_string()
    } else {
        format!("{package_path}/{file}")
    }
}
