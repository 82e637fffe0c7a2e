//! In-memory VFS tree.
//!
//! The whole tree hangs off a single root [`Node`]. Every operation takes a
//! path, folds it to absolute form and walks down from the root one component
//! at a time. Link nodes met along the way are followed, bounded by
//! [`MAX_LINK_HOPS`].

use std::collections::VecDeque;

use jsh_types::error::{JshError, Result};

use crate::node::{Node, NodeKind};
use crate::path::{ROOT, VPath};

/// Maximum number of links followed while resolving one path.
pub const MAX_LINK_HOPS: usize = 16;

/// A fully in-memory virtual file system.
#[derive(Debug, Clone)]
pub struct MemoryVfs {
    root: Node,
}

impl MemoryVfs {
    /// Create a new in-memory VFS with only the root directory.
    pub fn new() -> Self {
        Self {
            root: Node::dir(VPath::root()),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Resolve `path` to the physical path of the node it names, following
    /// every link on the way including a final one.
    pub fn canonicalize(&self, path: &VPath) -> Result<VPath> {
        let abs = normalize(path);
        let walk = self.resolve(&abs)?;
        if !walk.pending.is_empty() {
            return Err(not_found(&abs));
        }
        Ok(walk.real_path())
    }

    /// Find the node at `path`.
    pub fn locate(&self, path: &VPath) -> Result<&Node> {
        let abs = normalize(path);
        let walk = self.resolve(&abs)?;
        if !walk.pending.is_empty() {
            return Err(not_found(path));
        }
        walk.node().ok_or_else(|| not_found(path))
    }

    pub fn locate_mut(&mut self, path: &VPath) -> Result<&mut Node> {
        let real = self.canonicalize(path)?;
        self.walk_mut(real.names()).ok_or_else(|| not_found(path))
    }

    pub fn kind_of(&self, path: &VPath) -> Option<NodeKind> {
        self.locate(path).ok().map(Node::kind)
    }

    pub fn exists(&self, path: &VPath) -> bool {
        self.locate(path).is_ok()
    }

    pub fn is_dir(&self, path: &VPath) -> bool {
        self.kind_of(path) == Some(NodeKind::Dir)
    }

    /// Create an empty directory `name` inside `dir`.
    pub fn create_dir(&mut self, dir: &VPath, name: &str) -> Result<&mut Node> {
        self.insert(dir, name, Node::dir)
    }

    /// Create an empty plain file `name` inside `dir`.
    pub fn create_file(&mut self, dir: &VPath, name: &str) -> Result<&mut Node> {
        self.insert(dir, name, Node::file)
    }

    /// Create an executable bound to the native program registered as
    /// `native`.
    pub fn create_exe(&mut self, dir: &VPath, name: &str, native: &str) -> Result<&mut Node> {
        self.insert(dir, name, |path| Node::exe(path, native))
    }

    /// Create a link whose target is resolved relative to `dir`.
    pub fn create_link(&mut self, dir: &VPath, name: &str, target: &str) -> Result<&mut Node> {
        self.insert(dir, name, |path| Node::link(path, target))
    }

    /// Create `path` and any missing parent directories. Existing directories
    /// are left alone.
    pub fn create_dir_all(&mut self, path: &VPath) -> Result<()> {
        let abs = normalize(path);
        let walk = self.resolve(&abs)?;
        if let Some(node) = walk.node().filter(|node| !node.is_dir()) {
            return Err(JshError::NotADirectory(node.path().to_string()));
        }

        let mut missing: Vec<String> = Vec::new();
        let mut existing = walk.resolved;
        for name in walk.pending {
            match name.as_str() {
                "." => {},
                ".." => {
                    if missing.pop().is_none() {
                        existing.pop();
                    }
                },
                _ => missing.push(name),
            }
        }

        let mut node = self
            .walk_mut(existing.iter().map(String::as_str))
            .ok_or_else(|| not_found(&abs))?;
        for name in &missing {
            if !is_valid_name(name) {
                return Err(JshError::InvalidName(name.clone()));
            }
            if !node.is_dir() {
                return Err(JshError::NotADirectory(node.path().to_string()));
            }
            if node.child(name).is_none() {
                let dir = Node::dir(node.path().join(name));
                node.insert_child(dir);
            }
            node = node.child_mut(name).ok_or_else(|| not_found(&abs))?;
        }
        Ok(())
    }

    /// Get the plain file at `path`, creating it if missing.
    pub fn open(&mut self, path: &VPath) -> Result<&mut Node> {
        match self.kind_of(path) {
            Some(NodeKind::File) => self.locate_mut(path),
            Some(NodeKind::Dir) => Err(JshError::IsADirectory(path.to_string())),
            Some(_) => Err(JshError::NotAFile(path.to_string())),
            None => {
                let abs = normalize(path);
                self.create_file(&abs.parent(), abs.name())
            },
        }
    }

    /// Create or replace a plain file with `text`.
    pub fn write_file(&mut self, path: &VPath, text: &str, executable: bool) -> Result<()> {
        let node = self.open(path)?;
        node.set_text(text);
        node.set_executable(executable);
        Ok(())
    }

    /// Detach the node at `path`. A final link is removed itself, not its
    /// target. Non-empty directories need `recursive`.
    pub fn remove(&mut self, path: &VPath, recursive: bool) -> Result<()> {
        let abs = normalize(path);
        if abs.is_root() {
            return Err(JshError::InvalidName(ROOT.to_string()));
        }
        let parent_real = self.canonicalize(&abs.parent())?;
        let parent = self
            .walk_mut(parent_real.names())
            .ok_or_else(|| not_found(&abs))?;
        if !parent.is_dir() {
            return Err(JshError::NotADirectory(abs.parent().to_string()));
        }

        let name = abs.name();
        let child = parent.child(name).ok_or_else(|| not_found(&abs))?;
        if child.is_dir() && child.has_children() && !recursive {
            return Err(JshError::NotEmpty(abs.to_string()));
        }
        parent.remove_child(name);
        Ok(())
    }

    /// Children of the directory at `path`, sorted by name.
    pub fn list(&self, path: &VPath) -> Result<Vec<&Node>> {
        let node = self.locate(path)?;
        if !node.is_dir() {
            return Err(JshError::NotADirectory(path.to_string()));
        }
        Ok(node.children().collect())
    }

    fn insert(
        &mut self,
        dir: &VPath,
        name: &str,
        make: impl FnOnce(VPath) -> Node,
    ) -> Result<&mut Node> {
        if !is_valid_name(name) {
            return Err(JshError::InvalidName(name.to_string()));
        }
        let real = self.canonicalize(dir)?;
        let parent = self.walk_mut(real.names()).ok_or_else(|| not_found(dir))?;
        if !parent.is_dir() {
            return Err(JshError::NotADirectory(dir.to_string()));
        }
        if parent.child(name).is_some() {
            return Err(JshError::AlreadyExists(dir.join(name).to_string()));
        }
        let node = make(parent.path().join(name));
        parent.insert_child(node);
        parent.child_mut(name).ok_or_else(|| not_found(dir))
    }

    /// Walk `abs` down from the root in one pass, following links.
    ///
    /// The cursor keeps the chain of directories entered so far, so `..` and
    /// link targets never restart the descent. The walk stops early at the
    /// first missing child or at a non-directory with components left over;
    /// those components stay in [`Walk::pending`].
    fn resolve(&self, abs: &VPath) -> Result<Walk<'_>> {
        let mut pending: VecDeque<String> = abs.names().map(str::to_string).collect();
        let mut resolved: Vec<String> = Vec::new();
        let mut chain: Vec<&Node> = vec![&self.root];
        let mut hops = 0;

        while let Some(name) = pending.pop_front() {
            match name.as_str() {
                "." => continue,
                ".." => {
                    if resolved.pop().is_some() {
                        chain.pop();
                    }
                    continue;
                },
                _ => {},
            }

            let Some(&dir) = chain.last() else {
                return Err(not_found(abs));
            };
            let child = match dir.child(&name).filter(|_| dir.is_dir()) {
                Some(child) => child,
                None => {
                    pending.push_front(name);
                    break;
                },
            };

            if child.kind() != NodeKind::Link {
                resolved.push(name);
                chain.push(child);
                continue;
            }

            hops += 1;
            if hops > MAX_LINK_HOPS {
                log::debug!("link hop limit reached resolving {abs}");
                return Err(not_found(abs));
            }
            let target = VPath::new(child.text().unwrap_or_default());
            if target.is_absolute() {
                resolved.clear();
                chain.truncate(1);
            }
            for segment in target.names().rev() {
                pending.push_front(segment.to_string());
            }
        }

        Ok(Walk {
            resolved,
            chain,
            pending,
        })
    }

    fn walk_mut<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> Option<&mut Node> {
        let mut node = &mut self.root;
        for name in names {
            node = node.child_mut(name)?;
        }
        Some(node)
    }
}

/// Outcome of [`MemoryVfs::resolve`].
struct Walk<'a> {
    /// Physical names of the nodes entered, root excluded.
    resolved: Vec<String>,
    /// The root followed by the node for each entry of `resolved`.
    chain: Vec<&'a Node>,
    /// Components not reached. Empty when the whole path resolved.
    pending: VecDeque<String>,
}

impl<'a> Walk<'a> {
    fn node(&self) -> Option<&'a Node> {
        self.chain.last().copied()
    }

    fn real_path(&self) -> VPath {
        if self.resolved.is_empty() {
            VPath::root()
        } else {
            VPath::new(format!("{ROOT}{}", self.resolved.join("/")))
        }
    }
}

impl Default for MemoryVfs {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold a path to absolute form. Relative input is taken relative to the root.
fn normalize(path: &VPath) -> VPath {
    path.absolute(&VPath::root(), ROOT)
}

fn not_found(path: &VPath) -> JshError {
    JshError::NotFound(path.to_string())
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(path: &str) -> VPath {
        VPath::new(path)
    }

    fn sample() -> MemoryVfs {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir(&p("/"), "usr").unwrap();
        vfs.create_dir(&p("/usr"), "bin").unwrap();
        vfs.create_exe(&p("/usr/bin"), "ls", "ls").unwrap();
        vfs.create_dir(&p("/"), "home").unwrap();
        vfs.create_dir(&p("/home"), "user").unwrap();
        vfs.write_file(&p("/home/user/notes"), "hello", false).unwrap();
        vfs
    }

    #[test]
    fn root_locates_with_no_components() {
        let vfs = MemoryVfs::new();
        let root = vfs.locate(&p("/")).unwrap();
        assert!(root.is_dir());
        assert_eq!(root.path().as_str(), "/");
    }

    #[test]
    fn create_dir_then_locate() {
        let mut vfs = MemoryVfs::new();
        vfs.create_dir(&p("/"), "x").unwrap();
        assert_eq!(vfs.kind_of(&p("/x")), Some(NodeKind::Dir));
    }

    #[test]
    fn second_create_fails_without_overwrite() {
        let mut vfs = MemoryVfs::new();
        vfs.create_file(&p("/"), "x").unwrap();
        vfs.write_file(&p("/x"), "keep", false).unwrap();
        let err = vfs.create_dir(&p("/"), "x").unwrap_err();
        assert!(matches!(err, JshError::AlreadyExists(_)));
        assert_eq!(vfs.locate(&p("/x")).unwrap().text(), Some("keep"));
    }

    #[test]
    fn create_under_file_fails() {
        let mut vfs = sample();
        let err = vfs.create_file(&p("/home/user/notes"), "x").unwrap_err();
        assert!(matches!(err, JshError::NotADirectory(_)));
    }

    #[test]
    fn create_under_missing_dir_fails() {
        let mut vfs = MemoryVfs::new();
        assert!(matches!(
            vfs.create_dir(&p("/nope"), "x"),
            Err(JshError::NotFound(_))
        ));
    }

    #[test]
    fn create_dir_all_builds_missing_parents() {
        let mut vfs = sample();
        vfs.create_dir_all(&p("/home/user/a/b/c")).unwrap();
        assert!(vfs.is_dir(&p("/home/user/a/b/c")));
        vfs.create_dir_all(&p("/home/user/a")).unwrap();
        assert!(matches!(
            vfs.create_dir_all(&p("/home/user/notes/x")),
            Err(JshError::NotADirectory(_))
        ));
    }

    #[test]
    fn invalid_names_rejected() {
        let mut vfs = MemoryVfs::new();
        for name in ["", ".", "..", "a/b"] {
            assert!(matches!(
                vfs.create_file(&p("/"), name),
                Err(JshError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn stored_path_matches_position() {
        let vfs = sample();
        let node = vfs.locate(&p("/usr/bin/ls")).unwrap();
        assert_eq!(node.path().as_str(), "/usr/bin/ls");
    }

    #[test]
    fn intermediate_file_is_not_found() {
        let vfs = sample();
        assert!(matches!(
            vfs.locate(&p("/home/user/notes/deeper")),
            Err(JshError::NotFound(_))
        ));
    }

    #[test]
    fn open_is_idempotent() {
        let mut vfs = sample();
        vfs.open(&p("/home/user/new")).unwrap().set_text("a");
        assert_eq!(vfs.open(&p("/home/user/new")).unwrap().text(), Some("a"));
    }

    #[test]
    fn open_rejects_dirs_and_executables() {
        let mut vfs = sample();
        assert!(matches!(
            vfs.open(&p("/usr")),
            Err(JshError::IsADirectory(_))
        ));
        assert!(matches!(
            vfs.open(&p("/usr/bin/ls")),
            Err(JshError::NotAFile(_))
        ));
    }

    #[test]
    fn open_with_missing_parent_fails() {
        let mut vfs = sample();
        assert!(vfs.open(&p("/nowhere/file")).is_err());
    }

    #[test]
    fn write_file_sets_flag() {
        let mut vfs = sample();
        vfs.write_file(&p("/home/user/run"), "#!jsh\necho hi", true)
            .unwrap();
        assert!(vfs.locate(&p("/home/user/run")).unwrap().is_executable());
    }

    #[test]
    fn relative_link_resolves_from_its_directory() {
        let mut vfs = sample();
        vfs.create_link(&p("/home/user"), "n", "notes").unwrap();
        assert_eq!(vfs.locate(&p("/home/user/n")).unwrap().text(), Some("hello"));
        assert_eq!(
            vfs.canonicalize(&p("/home/user/n")).unwrap().as_str(),
            "/home/user/notes"
        );
    }

    #[test]
    fn absolute_link_to_directory() {
        let mut vfs = sample();
        vfs.create_link(&p("/"), "bin", "/usr/bin").unwrap();
        assert!(vfs.locate(&p("/bin/ls")).unwrap().is_executable());
        assert!(vfs.is_dir(&p("/bin")));
    }

    #[test]
    fn dotdot_in_link_target() {
        let mut vfs = sample();
        vfs.create_link(&p("/usr/bin"), "up", "../..").unwrap();
        assert_eq!(vfs.canonicalize(&p("/usr/bin/up/home")).unwrap().as_str(), "/home");
    }

    #[test]
    fn link_cycle_is_not_found() {
        let mut vfs = MemoryVfs::new();
        vfs.create_link(&p("/"), "a", "b").unwrap();
        vfs.create_link(&p("/"), "b", "a").unwrap();
        assert!(matches!(vfs.locate(&p("/a")), Err(JshError::NotFound(_))));
    }

    #[test]
    fn link_chain_within_limit_resolves() {
        let mut vfs = MemoryVfs::new();
        vfs.create_file(&p("/"), "l0").unwrap();
        for i in 1..=MAX_LINK_HOPS {
            vfs.create_link(&p("/"), &format!("l{i}"), &format!("l{}", i - 1))
                .unwrap();
        }
        assert!(vfs.exists(&p(&format!("/l{MAX_LINK_HOPS}"))));
        vfs.create_link(&p("/"), "over", &format!("l{MAX_LINK_HOPS}"))
            .unwrap();
        assert!(!vfs.exists(&p("/over")));
    }

    #[test]
    fn remove_file_and_empty_dir() {
        let mut vfs = sample();
        vfs.remove(&p("/home/user/notes"), false).unwrap();
        assert!(!vfs.exists(&p("/home/user/notes")));
        vfs.remove(&p("/home/user"), false).unwrap();
        assert!(!vfs.exists(&p("/home/user")));
    }

    #[test]
    fn remove_non_empty_dir_needs_recursive() {
        let mut vfs = sample();
        assert!(matches!(
            vfs.remove(&p("/usr"), false),
            Err(JshError::NotEmpty(_))
        ));
        vfs.remove(&p("/usr"), true).unwrap();
        assert!(!vfs.exists(&p("/usr/bin/ls")));
    }

    #[test]
    fn remove_link_keeps_target() {
        let mut vfs = sample();
        vfs.create_link(&p("/"), "bin", "/usr/bin").unwrap();
        vfs.remove(&p("/bin"), false).unwrap();
        assert!(vfs.exists(&p("/usr/bin/ls")));
    }

    #[test]
    fn remove_root_fails() {
        let mut vfs = sample();
        assert!(matches!(
            vfs.remove(&p("/"), true),
            Err(JshError::InvalidName(_))
        ));
    }

    #[test]
    fn remove_missing_fails() {
        let mut vfs = sample();
        assert!(matches!(
            vfs.remove(&p("/ghost"), false),
            Err(JshError::NotFound(_))
        ));
    }

    #[test]
    fn list_is_sorted() {
        let mut vfs = MemoryVfs::new();
        for name in ["zeta", "alpha", "mid"] {
            vfs.create_file(&p("/"), name).unwrap();
        }
        let names: Vec<&str> = vfs
            .list(&p("/"))
            .unwrap()
            .into_iter()
            .map(Node::name)
            .collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn list_file_fails() {
        let vfs = sample();
        assert!(matches!(
            vfs.list(&p("/home/user/notes")),
            Err(JshError::NotADirectory(_))
        ));
    }

    #[test]
    fn deeply_nested_dirs() {
        let mut vfs = MemoryVfs::new();
        let mut dir = VPath::root();
        for i in 0..200 {
            let name = format!("d{i}");
            vfs.create_dir(&dir, &name).unwrap();
            dir = dir.join(&name);
        }
        assert!(vfs.is_dir(&dir));
    }

    #[test]
    fn very_deep_paths_resolve_in_one_pass() {
        let depth = 5000;
        let names: Vec<String> = (0..depth).map(|i| format!("d{i}")).collect();
        let deep = p(&format!("/{}", names.join("/")));

        let mut vfs = MemoryVfs::new();
        vfs.create_dir_all(&deep).unwrap();
        assert!(vfs.is_dir(&deep));
        vfs.write_file(&deep.join("f"), "bottom", false).unwrap();
        assert_eq!(vfs.locate(&deep.join("f")).unwrap().text(), Some("bottom"));
        assert_eq!(vfs.canonicalize(&deep.join("..")).unwrap(), deep.parent());

        // Absolute link target from the bottom of the tree.
        vfs.create_link(&deep, "top", "/d0").unwrap();
        assert_eq!(vfs.canonicalize(&deep.join("top")).unwrap().as_str(), "/d0");
        vfs.create_dir_all(&deep).unwrap();
    }

    #[test]
    fn create_dir_all_through_links() {
        let mut vfs = sample();
        vfs.create_link(&p("/"), "h", "/home/user").unwrap();
        vfs.create_link(&p("/home/user"), "up", "..").unwrap();
        vfs.create_dir_all(&p("/h/a/b")).unwrap();
        assert!(vfs.is_dir(&p("/home/user/a/b")));
        vfs.create_dir_all(&p("/h/up/shared")).unwrap();
        assert!(vfs.is_dir(&p("/home/shared")));
        assert!(matches!(
            vfs.create_dir_all(&p("/usr/bin/ls/x")),
            Err(JshError::NotADirectory(_))
        ));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn create_then_locate(segments in proptest::collection::vec("[a-z]{1,6}", 1..6)) {
                let mut vfs = MemoryVfs::new();
                let mut dir = VPath::root();
                for seg in &segments {
                    if !vfs.exists(&dir.join(seg)) {
                        vfs.create_dir(&dir, seg).unwrap();
                    }
                    dir = dir.join(seg);
                }
                let node = vfs.locate(&dir).unwrap();
                prop_assert!(node.is_dir());
                prop_assert_eq!(node.path(), &dir);
            }

            #[test]
            fn second_create_always_fails(name in "[a-z]{1,8}") {
                let mut vfs = MemoryVfs::new();
                vfs.create_dir(&VPath::root(), &name).unwrap();
                prop_assert!(vfs.create_file(&VPath::root(), &name).is_err());
                prop_assert!(vfs.is_dir(&VPath::root().join(&name)));
            }

            #[test]
            fn write_then_read(name in "[a-z]{1,8}", text in ".{0,64}") {
                let mut vfs = MemoryVfs::new();
                let path = VPath::root().join(&name);
                vfs.write_file(&path, &text, false).unwrap();
                prop_assert_eq!(vfs.locate(&path).unwrap().text(), Some(text.as_str()));
            }

            #[test]
            fn canonical_path_never_contains_links(
                names in proptest::collection::vec("[a-c]", 1..5),
            ) {
                let mut vfs = MemoryVfs::new();
                vfs.create_dir(&VPath::root(), "real").unwrap();
                vfs.create_link(&VPath::root(), "alias", "real").unwrap();
                let mut dir = VPath::new("/alias");
                for name in &names {
                    let _ = vfs.create_dir(&dir, name);
                    dir = dir.join(name);
                }
                let real = vfs.canonicalize(&dir).unwrap();
                prop_assert!(real.as_str().starts_with("/real"));
            }
        }
    }
}
