use std::fmt;

const SEPARATOR: char = '\\';

/// Location of a file or directory on the share, using the share's `\`
/// separator. Always absolute relative to the share root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemotePath(String);

impl RemotePath {
    #[must_use]
    pub fn root() -> Self {
        Self(SEPARATOR.to_string())
    }

    /// Normalise a user supplied path. Accepts either separator, drops empty
    /// segments and `.`/`..` components.
    pub fn parse(raw: &str) -> Self {
        let mut path = Self::root();
        for segment in raw.split(['/', SEPARATOR]) {
            if segment.is_empty() || segment == "." || segment == ".." {
                continue;
            }
            path = path.join(segment);
        }
        path
    }

    #[must_use]
    pub fn join(&self, name: &str) -> Self {
        if self.is_root() {
            Self(format!("{SEPARATOR}{name}"))
        } else {
            Self(format!("{}{SEPARATOR}{name}", self.0))
        }
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == 1
    }

    /// Final component, `None` for the share root
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            return None;
        }
        self.0.rsplit(SEPARATOR).next()
    }

    /// Lower-cased extension of the final component
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name()?;
        std::path::Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalises_separators() {
        assert_eq!(RemotePath::parse("/photos/sub/").as_str(), r"\photos\sub");
        assert_eq!(RemotePath::parse(r"photos\\sub").as_str(), r"\photos\sub");
        assert_eq!(RemotePath::parse("/"), RemotePath::root());
        assert_eq!(RemotePath::parse(""), RemotePath::root());
    }

    #[test]
    fn test_parse_discards_dot_segments() {
        assert_eq!(RemotePath::parse("/a/../b/./c").as_str(), r"\a\b\c");
    }

    #[test]
    fn test_join_and_file_name() {
        let path = RemotePath::root().join("photos").join("x.JPG");

        assert_eq!(path.as_str(), r"\photos\x.JPG");
        assert_eq!(path.file_name(), Some("x.JPG"));
        assert_eq!(path.extension().as_deref(), Some("jpg"));
        assert_eq!(path.components().collect::<Vec<_>>(), vec!["photos", "x.JPG"]);
    }

    #[test]
    fn test_root_has_no_name() {
        assert!(RemotePath::root().is_root());
        assert_eq!(RemotePath::root().file_name(), None);
        assert_eq!(RemotePath::root().extension(), None);
    }

    #[test]
    fn test_dotfile_has_no_extension() {
        assert_eq!(RemotePath::parse("/a/.png").extension(), None);
        assert_eq!(RemotePath::parse("/a/README").extension(), None);
    }
}
