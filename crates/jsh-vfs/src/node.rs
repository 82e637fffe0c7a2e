//! Filesystem tree entries.

use std::collections::BTreeMap;

use crate::path::VPath;

/// What a node is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Dir,
    File,
    Link,
    Exe,
}

impl NodeKind {
    /// Single-character tag used by listings.
    pub fn tag(self) -> char {
        match self {
            Self::Dir => 'd',
            Self::File => '-',
            Self::Link => 'l',
            Self::Exe => 'x',
        }
    }
}

/// Payload carried by a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Plain text. File bodies, script source and link targets live here.
    Text(String),
    /// Key of a native program in the interpreter's command registry.
    Native(String),
}

impl Default for Content {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

/// One entry in the tree.
///
/// Directories own their children by name. Nodes never point back at their
/// parent; every lookup walks down from the root.
#[derive(Debug, Clone)]
pub struct Node {
    path: VPath,
    kind: NodeKind,
    content: Content,
    executable: bool,
    children: BTreeMap<String, Node>,
}

impl Node {
    pub(crate) fn dir(path: VPath) -> Self {
        Self::with(path, NodeKind::Dir, Content::default())
    }

    pub(crate) fn file(path: VPath) -> Self {
        Self::with(path, NodeKind::File, Content::default())
    }

    pub(crate) fn exe(path: VPath, native: impl Into<String>) -> Self {
        let mut node = Self::with(path, NodeKind::Exe, Content::Native(native.into()));
        node.executable = true;
        node
    }

    pub(crate) fn link(path: VPath, target: impl Into<String>) -> Self {
        Self::with(path, NodeKind::Link, Content::Text(target.into()))
    }

    fn with(path: VPath, kind: NodeKind, content: Content) -> Self {
        Self {
            path,
            kind,
            content,
            executable: false,
            children: BTreeMap::new(),
        }
    }

    /// Absolute path of this node, matching its position in the tree.
    pub fn path(&self) -> &VPath {
        &self.path
    }

    pub fn name(&self) -> &str {
        self.path.name()
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn content(&self) -> &Content {
        &self.content
    }

    /// Text content, or `None` for native executables.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text),
            Content::Native(_) => None,
        }
    }

    /// Registry key for native executables.
    pub fn native(&self) -> Option<&str> {
        match &self.content {
            Content::Native(key) => Some(key),
            Content::Text(_) => None,
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.content = Content::Text(text.into());
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    /// An `exe` node, or a plain file carrying the executable flag.
    pub fn is_executable(&self) -> bool {
        match self.kind {
            NodeKind::Exe => true,
            NodeKind::File => self.executable,
            NodeKind::Dir | NodeKind::Link => false,
        }
    }

    pub fn set_executable(&mut self, executable: bool) {
        self.executable = executable;
    }

    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.get(name)
    }

    pub(crate) fn child_mut(&mut self, name: &str) -> Option<&mut Node> {
        self.children.get_mut(name)
    }

    /// Children in name order. Empty for anything but a directory.
    pub fn children(&self) -> impl Iterator<Item = &Node> {
        self.children.values()
    }

    pub(crate) fn insert_child(&mut self, node: Node) {
        self.children.insert(node.name().to_string(), node);
    }

    pub(crate) fn remove_child(&mut self, name: &str) -> Option<Node> {
        self.children.remove(name)
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exe_is_always_executable() {
        let node = Node::exe(VPath::new("/usr/bin/ls"), "ls");
        assert!(node.is_executable());
        assert_eq!(node.native(), Some("ls"));
        assert_eq!(node.text(), None);
    }

    #[test]
    fn file_needs_flag() {
        let mut node = Node::file(VPath::new("/tmp/run"));
        assert!(!node.is_executable());
        node.set_executable(true);
        assert!(node.is_executable());
    }

    #[test]
    fn dir_and_link_never_executable() {
        let mut dir = Node::dir(VPath::new("/d"));
        dir.set_executable(true);
        assert!(!dir.is_executable());
        let link = Node::link(VPath::new("/l"), "/d");
        assert_eq!(link.text(), Some("/d"));
        assert!(!link.is_executable());
    }

    #[test]
    fn children_are_name_ordered() {
        let mut dir = Node::dir(VPath::root());
        dir.insert_child(Node::file(VPath::new("/b")));
        dir.insert_child(Node::file(VPath::new("/a")));
        let names: Vec<&str> = dir.children().map(Node::name).collect();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn kind_tags() {
        assert_eq!(NodeKind::Dir.tag(), 'd');
        assert_eq!(NodeKind::Link.tag(), 'l');
    }
}
