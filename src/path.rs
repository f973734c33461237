/// Maps adapter-relative paths onto the configured remote root and back.
///
/// Paths are normalised on the way in: repeated separators, leading and
/// trailing separators and `.` segments are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixer {
    prefix: String,
}

impl PathPrefixer {
    pub fn new(prefix: &str) -> Self {
        let root = normalize(prefix);
        let prefix = if root.is_empty() {
            "/".to_owned()
        } else {
            format!("/{root}/")
        };

        Self { prefix }
    }

    /// The root every path is placed under, always ending with `/`
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// `dir/file.txt` -> `/root/dir/file.txt`. The empty path maps onto the root itself.
    pub fn prefix_path(&self, path: &str) -> String {
        let relative = normalize(path);
        if relative.is_empty() {
            self.root()
        } else {
            format!("{}{relative}", self.prefix)
        }
    }

    /// `/root/dir/file.txt` -> `dir/file.txt`. Paths outside the root are
    /// returned normalised but otherwise unchanged.
    pub fn strip_prefix(&self, path: &str) -> String {
        let absolute = format!("/{}", normalize(path));
        let root = self.root();

        if absolute == root {
            String::new()
        } else if let Some(relative) = absolute.strip_prefix(&self.prefix) {
            relative.to_owned()
        } else {
            normalize(path)
        }
    }

    /// The remote root without its trailing separator (`/` for the drive root)
    fn root(&self) -> String {
        match self.prefix.len() {
            1 => self.prefix.clone(),
            len => self.prefix[..len - 1].to_owned(),
        }
    }
}

impl Default for PathPrefixer {
    fn default() -> Self {
        Self::new("/")
    }
}

/// Joins the meaningful segments of a path with single separators
pub fn normalize(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Parent of a normalised relative path, empty for top-level entries
pub fn dirname(path: &str) -> String {
    let path = normalize(path);
    match path.rsplit_once('/') {
        Some((parent, _)) => parent.to_owned(),
        None => String::new(),
    }
}

/// Joins a relative directory and an entry name
pub fn join(dir: &str, name: &str) -> String {
    let dir = normalize(dir);
    if dir.is_empty() {
        name.to_owned()
    } else {
        format!("{dir}/{name}")
    }
}
