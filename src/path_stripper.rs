/// Removes a known workspace root from the front of absolute paths so that
/// diagnostics read relative to the workspace.
///
/// The comparison is case-insensitive, since the build machines this runs on
/// report paths with whatever casing the tool happened to use.
///
/// # Example
/// ```
/// use ue_buildlog::path_stripper::PathStripper;
///
/// let stripper = PathStripper::new(r"D:\Build\Project\");
/// assert_eq!(stripper.remove_root(r"d:\build\project\Source\Foo.cpp"), r"Source\Foo.cpp");
/// assert_eq!(stripper.remove_root(r"C:\Elsewhere\Foo.cpp"), r"C:\Elsewhere\Foo.cpp");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PathStripper {
    root_lower: String,
}

impl PathStripper {
    pub fn new(root: &str) -> Self {
        PathStripper {
            root_lower: root.to_lowercase(),
        }
    }

    /// A stripper that never changes anything.
    pub fn disabled() -> Self {
        PathStripper::default()
    }

    pub fn remove_root<'a>(&self, path: &'a str) -> &'a str {
        if self.root_lower.is_empty() {
            return path;
        }
        // Slice by the root's char count, not its byte length; lowercasing can
        // change the byte width of non-ascii characters.
        let root_chars = self.root_lower.chars().count();
        let mut head = path.char_indices();
        let split_at = match head.nth(root_chars) {
            Some((idx, _)) => idx,
            None if path.chars().count() == root_chars => path.len(),
            None => return path,
        };
        if path[..split_at].to_lowercase() == self.root_lower {
            &path[split_at..]
        } else {
            path
        }
    }
}
