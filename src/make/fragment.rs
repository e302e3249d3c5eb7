//! Fragment expression model.
//!
//! A [`Fragment`] is an immutable piece of Makefile text whose final form
//! depends on the [`SyntaxContext`] it is rendered into. Literal text is
//! escaped for that context, pre-escaped text passes through verbatim, paths
//! are anchored on a symbolic [`Root`], and concatenations render each child
//! in order. Rendering is pure: the same fragment and context always yield
//! the same text.
//!
//! # Examples
//!
//! ```rust
//! use mkgen::make::fragment::{Fragment, PathRef, Root, concat};
//! use mkgen::make::syntax::SyntaxContext;
//!
//! let source = PathRef::new(Root::Source, "src/main file.c");
//! let flag = concat([Fragment::literal("-I"), Fragment::from(source)]);
//! assert_eq!(flag.render(SyntaxContext::Target), r"-I$(srcdir)/src/main\ file.c");
//! ```

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use super::syntax::{SyntaxContext, escape};

/// Anchor a [`PathRef`] is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Root {
    /// The build directory the Makefile runs in. Paths render bare.
    #[default]
    #[serde(rename = "builddir")]
    Build,
    /// The source directory, `$(srcdir)`.
    #[serde(rename = "srcdir")]
    Source,
    /// An absolute path, rendered verbatim.
    Absolute,
    /// Installation prefix, `$(prefix)`.
    Prefix,
    /// Architecture-dependent prefix, `$(exec_prefix)`.
    ExecPrefix,
    /// Executable install directory, `$(bindir)`.
    Bindir,
    /// Library install directory, `$(libdir)`.
    Libdir,
    /// Header install directory, `$(includedir)`.
    Includedir,
    /// Data install directory, `$(datadir)`.
    Datadir,
}

impl Root {
    /// Every root that resolves through a Makefile variable, in seeding order.
    pub const ANCHORED: [Self; 7] = [
        Self::Source,
        Self::Prefix,
        Self::ExecPrefix,
        Self::Bindir,
        Self::Libdir,
        Self::Includedir,
        Self::Datadir,
    ];

    /// Name of the Makefile variable holding this root, if any.
    #[must_use]
    pub const fn variable_name(self) -> Option<&'static str> {
        match self {
            Self::Build | Self::Absolute => None,
            Self::Source => Some("srcdir"),
            Self::Prefix => Some("prefix"),
            Self::ExecPrefix => Some("exec_prefix"),
            Self::Bindir => Some("bindir"),
            Self::Libdir => Some("libdir"),
            Self::Includedir => Some("includedir"),
            Self::Datadir => Some("datadir"),
        }
    }
}

/// A path relative to a symbolic [`Root`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "RawPath")]
pub struct PathRef {
    /// Anchor the path is relative to.
    pub root: Root,
    /// Path below the anchor. Empty means the anchor itself.
    pub path: Utf8PathBuf,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPath {
    Bare(Utf8PathBuf),
    Rooted {
        #[serde(default)]
        root: Root,
        path: Utf8PathBuf,
    },
}

impl From<RawPath> for PathRef {
    fn from(raw: RawPath) -> Self {
        match raw {
            RawPath::Bare(path) => Self::build(path),
            RawPath::Rooted { root, path } => Self::new(root, path),
        }
    }
}

impl PathRef {
    /// Create a path below `root`.
    pub fn new(root: Root, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            root,
            path: path.into(),
        }
    }

    /// Create a path relative to the build directory.
    pub fn build(path: impl Into<Utf8PathBuf>) -> Self {
        Self::new(Root::Build, path)
    }

    /// Return `true` when the path names the anchor itself.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.path.as_str().is_empty()
    }

    /// The containing directory, anchored on the same root.
    #[must_use]
    pub fn parent(&self) -> Self {
        let parent = self.path.parent().map(Utf8Path::to_path_buf).unwrap_or_default();
        Self::new(self.root, parent)
    }

    /// Append `component` below this path.
    #[must_use]
    pub fn join(&self, component: &str) -> Self {
        Self::new(self.root, self.path.join(component))
    }

    /// Append `ext` to the file name, keeping any existing extension.
    #[must_use]
    pub fn add_ext(&self, ext: &str) -> Self {
        Self::new(self.root, format!("{}{ext}", self.path))
    }

    /// Final path component, if any.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name()
    }

    /// Re-anchor the same relative path on another root.
    #[must_use]
    pub fn reroot(&self, root: Root) -> Self {
        Self::new(root, self.path.clone())
    }

    /// Path to `self` as seen from the directory `start`.
    ///
    /// Returns `None` when the two paths hang off different roots.
    #[must_use]
    pub fn relative_to(&self, start: &Self) -> Option<Utf8PathBuf> {
        if self.root != start.root {
            return None;
        }
        let ours: Vec<Utf8Component<'_>> = self.path.components().collect();
        let theirs: Vec<Utf8Component<'_>> = start.path.components().collect();
        let common = ours
            .iter()
            .zip(&theirs)
            .take_while(|(a, b)| a == b)
            .count();
        let mut rel = Utf8PathBuf::new();
        for _ in common..theirs.len() {
            rel.push("..");
        }
        for comp in ours.iter().skip(common) {
            rel.push(comp.as_str());
        }
        if rel.as_str().is_empty() {
            rel.push(".");
        }
        Some(rel)
    }

    fn render_into(&self, context: SyntaxContext, out: &mut String) {
        match self.root.variable_name() {
            Some(var) => {
                out.push_str(&variable_reference(var));
                if !self.is_root() {
                    out.push('/');
                    out.push_str(&escape(self.path.as_str(), context));
                }
            }
            None if self.root == Root::Build && self.is_root() => out.push('.'),
            None => out.push_str(&escape(self.path.as_str(), context)),
        }
    }
}

/// Text of a reference to the variable `name`: `$x` for one-character
/// names and `$(NAME)` otherwise.
pub(crate) fn variable_reference(name: &str) -> String {
    if name.chars().count() == 1 {
        format!("${name}")
    } else {
        format!("$({name})")
    }
}

/// A lazily rendered piece of Makefile text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Fragment {
    /// Text that still needs escaping for its context.
    Literal(String),
    /// Text that is already safe and is emitted verbatim.
    Escaped(String),
    /// A path anchored on a root.
    Path(PathRef),
    /// Children rendered in order against the same context.
    Concat(Vec<Fragment>),
}

impl Fragment {
    /// Literal text, escaped on rendering.
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal(text.into())
    }

    /// Pre-escaped text, emitted verbatim.
    pub fn escaped(text: impl Into<String>) -> Self {
        Self::Escaped(text.into())
    }

    /// Render the fragment for `context`.
    #[must_use]
    pub fn render(&self, context: SyntaxContext) -> String {
        let mut out = String::new();
        self.render_into(context, &mut out);
        out
    }

    /// Append the rendering of this fragment to `out`.
    pub fn render_into(&self, context: SyntaxContext, out: &mut String) {
        match self {
            Self::Literal(text) => out.push_str(&escape(text, context)),
            Self::Escaped(text) => out.push_str(text),
            Self::Path(path) => path.render_into(context, out),
            Self::Concat(parts) => {
                for part in parts {
                    part.render_into(context, out);
                }
            }
        }
    }
}

impl From<&str> for Fragment {
    fn from(text: &str) -> Self {
        Self::literal(text)
    }
}

impl From<String> for Fragment {
    fn from(text: String) -> Self {
        Self::Literal(text)
    }
}

impl From<PathRef> for Fragment {
    fn from(path: PathRef) -> Self {
        Self::Path(path)
    }
}

impl From<&PathRef> for Fragment {
    fn from(path: &PathRef) -> Self {
        Self::Path(path.clone())
    }
}

/// Conversion into a [`Fragment`]: the "use" operation of every symbol.
pub trait ToFragment {
    /// Produce the fragment that refers to `self`.
    fn to_fragment(&self) -> Fragment;
}

impl ToFragment for Fragment {
    fn to_fragment(&self) -> Fragment {
        self.clone()
    }
}

impl ToFragment for PathRef {
    fn to_fragment(&self) -> Fragment {
        Fragment::Path(self.clone())
    }
}

impl ToFragment for str {
    fn to_fragment(&self) -> Fragment {
        Fragment::literal(self)
    }
}

impl ToFragment for String {
    fn to_fragment(&self) -> Fragment {
        Fragment::literal(self.as_str())
    }
}

/// Concatenate fragments into one, flattening nested concatenations.
///
/// ```rust
/// use mkgen::make::fragment::{Fragment, concat};
/// use mkgen::make::syntax::SyntaxContext;
///
/// let deps = concat([Fragment::escaped("$@"), Fragment::literal(".d")]);
/// assert_eq!(deps.render(SyntaxContext::ShellLine), "$@.d");
/// ```
pub fn concat(parts: impl IntoIterator<Item = Fragment>) -> Fragment {
    let mut flat = Vec::new();
    for part in parts {
        match part {
            Fragment::Concat(children) => flat.extend(children),
            other => flat.push(other),
        }
    }
    Fragment::Concat(flat)
}
