//! Path algebra.
//!
//! A [`VPath`] is a string with trailing separators stripped. Resolution to a
//! canonical absolute form needs the working directory and the home directory,
//! both of which are passed in explicitly.

use std::fmt;

/// The root path.
pub const ROOT: &str = "/";

/// Component separator.
pub const SEPARATOR: char = '/';

/// A path in the virtual file system.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VPath {
    path: String,
}

impl VPath {
    /// Create a path. Trailing separators are stripped; an empty result
    /// becomes the root.
    pub fn new(path: impl Into<String>) -> Self {
        let mut path = path.into();
        let trimmed = path.trim_end_matches(SEPARATOR).len();
        if trimmed == 0 {
            return Self::root();
        }
        path.truncate(trimmed);
        Self { path }
    }

    pub fn root() -> Self {
        Self {
            path: ROOT.to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.path
    }

    pub fn is_absolute(&self) -> bool {
        self.path.starts_with(SEPARATOR)
    }

    pub fn is_root(&self) -> bool {
        self.path == ROOT
    }

    /// Non-empty segments, preceded by a `/` marker when the path is absolute.
    pub fn components(&self) -> Vec<&str> {
        let mut comps = Vec::new();
        if self.is_absolute() {
            comps.push(ROOT);
        }
        comps.extend(self.names());
        comps
    }

    /// Non-empty segments without the root marker.
    pub fn names(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.path.split(SEPARATOR).filter(|s| !s.is_empty())
    }

    /// Append `other` to this path. An absolute `other` replaces the path.
    pub fn join(&self, other: impl AsRef<str>) -> VPath {
        let other = other.as_ref();
        if other.is_empty() {
            return self.clone();
        }
        if other.starts_with(SEPARATOR) {
            return VPath::new(other);
        }
        if self.is_root() {
            VPath::new(format!("{ROOT}{other}"))
        } else {
            VPath::new(format!("{}{SEPARATOR}{other}", self.path))
        }
    }

    /// Resolve to canonical absolute form.
    ///
    /// A leading `.` or `..` is taken relative to `cwd`, a leading `~` to
    /// `home`, and any other relative path to `cwd`. The remaining components
    /// are then folded left to right: `..` pops, `.` is skipped. `..` never
    /// climbs above the root.
    pub fn absolute(&self, cwd: &VPath, home: &str) -> VPath {
        let comps = self.components();
        let mut resolved: Vec<&str> = Vec::new();
        let rest = match comps.first().copied() {
            Some(".") => {
                resolved.extend(cwd.names());
                &comps[1..]
            },
            Some("..") => {
                resolved.extend(cwd.names());
                resolved.pop();
                &comps[1..]
            },
            Some("~") => {
                resolved.extend(home.split(SEPARATOR).filter(|s| !s.is_empty()));
                &comps[1..]
            },
            Some(ROOT) => &comps[1..],
            Some(_) => {
                resolved.extend(cwd.names());
                &comps[..]
            },
            None => &comps[..],
        };

        for comp in rest {
            match *comp {
                ".." => {
                    resolved.pop();
                },
                "." => {},
                name => resolved.push(name),
            }
        }

        if resolved.is_empty() {
            VPath::root()
        } else {
            VPath::new(format!("{ROOT}{}", resolved.join("/")))
        }
    }

    /// The path with its last component removed.
    ///
    /// The parent of the root is the root; the parent of a single relative
    /// component is `.`.
    pub fn parent(&self) -> VPath {
        let names: Vec<&str> = self.names().collect();
        let kept = &names[..names.len().saturating_sub(1)];
        if self.is_absolute() {
            VPath::new(format!("{ROOT}{}", kept.join("/")))
        } else if kept.is_empty() {
            VPath::new(".")
        } else {
            VPath::new(kept.join("/"))
        }
    }

    /// The last component, or `/` for the root.
    pub fn name(&self) -> &str {
        self.names().next_back().unwrap_or(ROOT)
    }

    /// Replace a leading `prefix` with `~`, for display.
    ///
    /// The prefix only matches at a component boundary, so `/home/userx` does
    /// not abbreviate against `/home/user`.
    pub fn skip_start(&self, prefix: &VPath) -> VPath {
        if self == prefix {
            return VPath::new("~");
        }
        let Some(rest) = self.path.strip_prefix(prefix.as_str()) else {
            return self.clone();
        };
        if prefix.is_root() {
            return VPath::new(format!("~{SEPARATOR}{rest}"));
        }
        if rest.starts_with(SEPARATOR) {
            VPath::new(format!("~{rest}"))
        } else {
            self.clone()
        }
    }
}

impl Default for VPath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for VPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

impl AsRef<str> for VPath {
    fn as_ref(&self) -> &str {
        &self.path
    }
}

impl From<&str> for VPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for VPath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn abs(path: &str, cwd: &str) -> String {
        VPath::new(path)
            .absolute(&VPath::new(cwd), "/home/user")
            .to_string()
    }

    #[test]
    fn new_strips_trailing_separators() {
        assert_eq!(VPath::new("/usr/bin/").as_str(), "/usr/bin");
        assert_eq!(VPath::new("///").as_str(), "/");
        assert_eq!(VPath::new("").as_str(), "/");
    }

    #[test]
    fn components_keep_root_marker() {
        assert_eq!(VPath::new("/usr//bin").components(), vec!["/", "usr", "bin"]);
        assert_eq!(VPath::new("a/b").components(), vec!["a", "b"]);
        assert_eq!(VPath::new("/").components(), vec!["/"]);
    }

    #[test]
    fn join_relative_concatenates() {
        assert_eq!(VPath::new("/usr").join("bin").as_str(), "/usr/bin");
        assert_eq!(VPath::root().join("etc").as_str(), "/etc");
        assert_eq!(VPath::new("a").join("b/c").as_str(), "a/b/c");
    }

    #[test]
    fn join_absolute_replaces() {
        assert_eq!(VPath::new("/usr").join("/etc").as_str(), "/etc");
        assert_eq!(VPath::root().join("/etc").as_str(), "/etc");
    }

    #[test]
    fn join_empty_is_identity() {
        assert_eq!(VPath::new("/usr").join("").as_str(), "/usr");
    }

    #[test]
    fn absolute_rules() {
        assert_eq!(abs("/", "/tmp"), "/");
        assert_eq!(abs(".", "/tmp"), "/tmp");
        assert_eq!(abs("./x", "/tmp"), "/tmp/x");
        assert_eq!(abs("..", "/a/b"), "/a");
        assert_eq!(abs("../c", "/a/b"), "/a/c");
        assert_eq!(abs("~", "/tmp"), "/home/user");
        assert_eq!(abs("~/notes", "/tmp"), "/home/user/notes");
        assert_eq!(abs("docs", "/home/user"), "/home/user/docs");
        assert_eq!(abs("/a/./b/../c", "/tmp"), "/a/c");
    }

    #[test]
    fn absolute_never_climbs_above_root() {
        assert_eq!(abs("..", "/"), "/");
        assert_eq!(abs("../a", "/"), "/a");
        assert_eq!(abs("/../../x", "/tmp"), "/x");
    }

    #[test]
    fn tilde_in_middle_is_literal() {
        assert_eq!(abs("a/~", "/"), "/a/~");
    }

    #[test]
    fn home_defaults_to_root_when_empty() {
        let p = VPath::new("~/x").absolute(&VPath::root(), "");
        assert_eq!(p.as_str(), "/x");
    }

    #[test]
    fn parent_and_name() {
        let p = VPath::new("/usr/bin/ls");
        assert_eq!(p.parent().as_str(), "/usr/bin");
        assert_eq!(p.name(), "ls");
        assert_eq!(VPath::new("/usr").parent().as_str(), "/");
        assert_eq!(VPath::root().parent().as_str(), "/");
        assert_eq!(VPath::root().name(), "/");
        assert_eq!(VPath::new("file").parent().as_str(), ".");
        assert_eq!(VPath::new("a/b").parent().as_str(), "a");
    }

    #[test]
    fn skip_start_abbreviates_home() {
        let home = VPath::new("/home/user");
        assert_eq!(VPath::new("/home/user").skip_start(&home).as_str(), "~");
        assert_eq!(
            VPath::new("/home/user/docs").skip_start(&home).as_str(),
            "~/docs"
        );
        assert_eq!(
            VPath::new("/home/userx").skip_start(&home).as_str(),
            "/home/userx"
        );
        assert_eq!(VPath::new("/etc").skip_start(&home).as_str(), "/etc");
    }

    #[test]
    fn skip_start_with_root_home() {
        let root = VPath::root();
        assert_eq!(VPath::new("/usr").skip_start(&root).as_str(), "~/usr");
        assert_eq!(VPath::root().skip_start(&root).as_str(), "~");
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn arb_segment() -> impl Strategy<Value = String> {
            prop_oneof![
                Just(".".to_string()),
                Just("..".to_string()),
                "[a-z]{1,4}",
            ]
        }

        fn arb_relative() -> impl Strategy<Value = String> {
            proptest::collection::vec(arb_segment(), 1..6).prop_map(|s| s.join("/"))
        }

        fn arb_path() -> impl Strategy<Value = String> {
            (any::<u8>(), arb_relative()).prop_map(|(lead, rel)| match lead % 3 {
                0 => format!("/{rel}"),
                1 => format!("~/{rel}"),
                _ => rel,
            })
        }

        fn arb_cwd() -> impl Strategy<Value = VPath> {
            proptest::collection::vec("[a-z]{1,4}", 0..4)
                .prop_map(|s| VPath::new(format!("/{}", s.join("/"))))
        }

        proptest! {
            #[test]
            fn absolute_is_idempotent(path in arb_path(), cwd in arb_cwd()) {
                let once = VPath::new(path).absolute(&cwd, "/home/user");
                let twice = once.absolute(&cwd, "/home/user");
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn absolute_has_no_dot_components(path in arb_path(), cwd in arb_cwd()) {
                let resolved = VPath::new(path).absolute(&cwd, "/home/user");
                prop_assert!(resolved.is_absolute());
                prop_assert!(resolved.names().all(|n| n != "." && n != ".."));
            }

            #[test]
            fn join_then_absolute_composes(
                a in arb_path(),
                b in arb_relative(),
                cwd in arb_cwd(),
            ) {
                let a = VPath::new(a);
                let lhs = a.join(&b).absolute(&cwd, "/home/user");
                let rhs = a.absolute(&cwd, "/home/user").join(&b).absolute(&cwd, "/home/user");
                prop_assert_eq!(lhs, rhs);
            }
        }
    }
}
