use crate::pipeline::types::{FrameEntry, FrameRange};
use std::path::Path;
use walkdir::WalkDir;

/// The frames selected for a run, out of everything that matched the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameListing {
    pub entries: Vec<FrameEntry>,
    /// Files matching the extension filter, before the range is applied
    pub matched: usize,
}

impl FrameListing {
    /// Matching files that fall outside the range.
    pub fn excluded(&self) -> usize {
        self.matched - self.entries.len()
    }
}

/// Lists the files directly inside `input_dir` whose name contains
/// `extension` (case-sensitive), sorted by name, then keeps the positions
/// selected by `range`. Symlinks to files count as files.
pub fn list_frames(
    input_dir: &Path,
    extension: &str,
    range: FrameRange,
) -> Result<FrameListing, walkdir::Error> {
    let mut names = Vec::new();
    for entry in WalkDir::new(input_dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        let is_file = entry.file_type().is_file()
            || (entry.path_is_symlink() && entry.path().is_file());
        if !is_file {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            tracing::warn!("Skipping non UTF-8 file name: {:?}", entry.file_name());
            continue;
        };
        if name.contains(extension) {
            names.push(name.to_string());
        }
    }
    names.sort();

    let matched = names.len();
    let entries = names
        .into_iter()
        .enumerate()
        .filter(|(index, _)| range.contains(*index))
        .map(|(index, name)| FrameEntry {
            index,
            path: input_dir.join(&name),
            name,
        })
        .collect();

    Ok(FrameListing { entries, matched })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            fs::write(dir.join(name), b"").unwrap();
        }
    }

    fn names(entries: &[FrameEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_lists_matching_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &["c.jpg", "a.jpg", "b.png", "B.JPG", "d.jpg.bak", "notes.txt"],
        );
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();
        touch(&dir.path().join("nested.jpg"), &["inner.jpg"]);

        let listing = list_frames(dir.path(), ".jpg", FrameRange::All).unwrap();

        // Substring match, case-sensitive, directories and their contents ignored
        assert_eq!(names(&listing.entries), vec!["a.jpg", "c.jpg", "d.jpg.bak"]);
        assert_eq!(listing.entries[1].index, 1);
        assert_eq!(listing.entries[1].path, dir.path().join("c.jpg"));
        assert_eq!(listing.matched, 3);
        assert_eq!(listing.excluded(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_frames_are_listed() {
        use std::os::unix::fs::symlink;

        let real = tempfile::tempdir().unwrap();
        let input = tempfile::tempdir().unwrap();
        touch(real.path(), &["a.jpg"]);
        fs::create_dir(real.path().join("dir.jpg")).unwrap();
        symlink(real.path().join("a.jpg"), input.path().join("a.jpg")).unwrap();
        symlink(real.path().join("dir.jpg"), input.path().join("dir.jpg")).unwrap();
        symlink(real.path().join("gone.jpg"), input.path().join("dangling.jpg")).unwrap();
        touch(input.path(), &["b.jpg"]);

        let listing = list_frames(input.path(), ".jpg", FrameRange::All).unwrap();

        // Links to directories and dangling links are not frames
        assert_eq!(names(&listing.entries), vec!["a.jpg", "b.jpg"]);
        assert_eq!(listing.entries[0].path, input.path().join("a.jpg"));
    }

    #[test]
    fn test_window_selects_sorted_positions() {
        let dir = tempfile::tempdir().unwrap();
        touch(
            dir.path(),
            &["f5.jpg", "f0.jpg", "f3.jpg", "f1.jpg", "f4.jpg", "f2.jpg"],
        );

        let window =
            list_frames(dir.path(), ".jpg", FrameRange::Window { first: 2, last: 4 }).unwrap();
        assert_eq!(names(&window.entries), vec!["f2.jpg", "f3.jpg", "f4.jpg"]);
        assert_eq!(
            window.entries.iter().map(|e| e.index).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
        assert_eq!(window.matched, 6);
        assert_eq!(window.excluded(), 3);

        // Bounds past the end are clamped
        let tail =
            list_frames(dir.path(), ".jpg", FrameRange::Window { first: 4, last: 120 }).unwrap();
        assert_eq!(names(&tail.entries), vec!["f4.jpg", "f5.jpg"]);
        assert_eq!(tail.excluded(), 4);

        let beyond =
            list_frames(dir.path(), ".jpg", FrameRange::Window { first: 10, last: 20 }).unwrap();
        assert!(beyond.entries.is_empty());
        assert_eq!(beyond.excluded(), 6);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = list_frames(&dir.path().join("absent"), ".jpg", FrameRange::All);
        assert!(result.is_err());
    }
}
