use crate::error::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// Turn a user-supplied path into an absolute one.
///
/// Quote characters are stripped (shells on Windows tend to leave them in
/// when a path ends with a backslash) and relative paths resolve against
/// `base`. Returns `None` for a blank argument.
pub fn normalize(base: &Path, raw: &str) -> Option<PathBuf> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '"' | '\'')).collect();
    if cleaned.trim().is_empty() {
        return None;
    }
    let p = Path::new(&cleaned);
    let joined = if p.is_absolute() { p.to_path_buf() } else { base.join(p) };
    Some(lexical_clean(&joined))
}

/// Drop `.` components and fold `..` into their parent without touching the
/// filesystem, so `MyFolder/.` still yields the basename `MyFolder`.
fn lexical_clean(p: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in p.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(comp);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// A manifest part entry must be a plain file name inside the manifest's folder.
pub fn validate_part_name(folder: &Path, name: &str) -> Result<PathBuf> {
    let rel = Path::new(name);
    let mut comps = rel.components();
    let single = matches!((comps.next(), comps.next()), (Some(Component::Normal(_)), None));
    if !single || name.contains(['/', '\\']) {
        return Err(Error::UnsafePartName(name.to_string()));
    }
    Ok(folder.join(rel))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_quotes_and_resolves_relative() {
        let base = Path::new("/work");
        assert_eq!(normalize(base, "\"My Folder\""), Some(PathBuf::from("/work/My Folder")));
        assert_eq!(normalize(base, "'backup'"), Some(PathBuf::from("/work/backup")));
        assert_eq!(normalize(base, "/abs/dir"), Some(PathBuf::from("/abs/dir")));
        assert_eq!(normalize(base, "a/./b/../c"), Some(PathBuf::from("/work/a/c")));
    }

    #[test]
    fn blank_arguments_normalize_to_none() {
        let base = Path::new("/work");
        assert_eq!(normalize(base, ""), None);
        assert_eq!(normalize(base, "\"\""), None);
        assert_eq!(normalize(base, "   "), None);
    }

    #[test]
    fn dot_keeps_a_usable_basename() {
        let p = normalize(Path::new("/work/MyFolder"), ".").unwrap();
        assert_eq!(p.file_name().unwrap(), "MyFolder");
    }

    #[test]
    fn part_names_must_stay_in_folder() {
        let folder = Path::new("/backup");
        assert_eq!(
            validate_part_name(folder, "MyFolder.7z.001").unwrap(),
            PathBuf::from("/backup/MyFolder.7z.001")
        );
        for bad in ["../escape.7z.001", "sub/x.7z.001", "/etc/passwd", "..", ".", "", "a\\b.7z.001"]
        {
            assert!(
                matches!(validate_part_name(folder, bad), Err(Error::UnsafePartName(_))),
                "{bad:?} accepted"
            );
        }
    }
}
