//! Package part names and POSIX-style reference resolution.
//!
//! A part name identifies an entry inside the package archive. Part names are
//! `/`-joined, carry no leading slash, and never contain `.` or `..` segments
//! once normalized. Relationship targets are resolved against the directory of
//! the referring part; a target with a leading slash is absolute within the
//! package.

/// A normalized part name within the package archive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackUri {
    uri: String,
}

impl PackUri {
    /// Create a part name from an archive-internal path.
    ///
    /// A leading slash is stripped; `.` and `..` segments are collapsed.
    pub fn new<S: AsRef<str>>(uri: S) -> Self {
        PackUri {
            uri: normalize(uri.as_ref()),
        }
    }

    /// Resolve a relationship target against a base directory.
    ///
    /// `base_dir` is the directory of the referring part (e.g. `ppt/slides`
    /// for `ppt/slides/slide1.xml`). A target starting with `/` is taken as
    /// absolute within the package.
    pub fn resolve(base_dir: &str, target: &str) -> Self {
        if let Some(absolute) = target.strip_prefix('/') {
            return PackUri::new(absolute);
        }
        if base_dir.is_empty() {
            return PackUri::new(target);
        }
        PackUri::new(format!("{base_dir}/{target}"))
    }

    /// The directory portion of this part name.
    ///
    /// `ppt/slides` for `ppt/slides/slide1.xml`; empty for a root-level part.
    pub fn base_dir(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[..pos],
            None => "",
        }
    }

    /// The filename portion of this part name.
    pub fn filename(&self) -> &str {
        match self.uri.rfind('/') {
            Some(pos) => &self.uri[pos + 1..],
            None => &self.uri,
        }
    }

    /// The part name of the `.rels` file describing this part's relationships.
    ///
    /// `ppt/_rels/presentation.xml.rels` for `ppt/presentation.xml`, and
    /// `_rels/.rels` for the package root (empty part name).
    pub fn rels_uri(&self) -> PackUri {
        let base = self.base_dir();
        let filename = self.filename();
        if base.is_empty() {
            PackUri::new(format!("_rels/{filename}.rels"))
        } else {
            PackUri::new(format!("{base}/_rels/{filename}.rels"))
        }
    }

    /// The full normalized path.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl std::fmt::Display for PackUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri)
    }
}

impl AsRef<str> for PackUri {
    fn as_ref(&self) -> &str {
        &self.uri
    }
}

impl From<&str> for PackUri {
    fn from(s: &str) -> Self {
        PackUri::new(s)
    }
}

/// Collapse `.` and `..` segments and strip any leading slash.
fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {},
            ".." => {
                parts.pop();
            },
            _ => parts.push(part),
        }
    }
    parts.join("/")
}
