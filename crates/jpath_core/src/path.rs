//! Normalized paths (RFC 9535 section 2.7) and located results

use serde_json::Value;
use smallvec::SmallVec;
use std::fmt::{self, Write};

/// One step of a normalized path
///
/// The variant order matters: derived `Ord` sorts indexes before names.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathElement {
    Index(usize),
    Name(String),
}

impl From<usize> for PathElement {
    fn from(i: usize) -> Self {
        PathElement::Index(i)
    }
}

impl From<&str> for PathElement {
    fn from(name: &str) -> Self {
        PathElement::Name(name.to_string())
    }
}

impl From<String> for PathElement {
    fn from(name: String) -> Self {
        PathElement::Name(name)
    }
}

/// Location of a single value relative to the document root
///
/// Paths compare element by element (indexes before names, then natural
/// order) and a path sorts before any longer path it is a prefix of.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NormalizedPath(SmallVec<[PathElement; 8]>);

impl NormalizedPath {
    /// The path of the root node, `$`
    pub fn root() -> Self {
        Self::default()
    }

    pub fn elements(&self) -> &[PathElement] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// This path extended by one step
    pub fn child(&self, element: impl Into<PathElement>) -> Self {
        let mut path = self.clone();
        path.0.push(element.into());
        path
    }

    /// RFC 6901 JSON Pointer form, e.g. `/store/book/0`
    pub fn to_pointer(&self) -> String {
        let mut pointer = String::new();
        for element in &self.0 {
            pointer.push('/');
            match element {
                PathElement::Index(i) => pointer.push_str(&i.to_string()),
                PathElement::Name(name) => {
                    pointer.push_str(&name.replace('~', "~0").replace('/', "~1"));
                }
            }
        }
        pointer
    }
}

impl FromIterator<PathElement> for NormalizedPath {
    fn from_iter<I: IntoIterator<Item = PathElement>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('$')?;
        for element in &self.0 {
            match element {
                PathElement::Index(i) => write!(f, "[{i}]")?,
                PathElement::Name(name) => {
                    f.write_char('[')?;
                    write_quoted(f, name)?;
                    f.write_char(']')?;
                }
            }
        }
        Ok(())
    }
}

/// Write `name` as a single-quoted string with normalized-path escaping
pub(crate) fn write_quoted<W: Write>(w: &mut W, name: &str) -> fmt::Result {
    w.write_char('\'')?;
    for ch in name.chars() {
        match ch {
            '\u{8}' => w.write_str("\\b")?,
            '\u{c}' => w.write_str("\\f")?,
            '\n' => w.write_str("\\n")?,
            '\r' => w.write_str("\\r")?,
            '\t' => w.write_str("\\t")?,
            '\'' => w.write_str("\\'")?,
            '\\' => w.write_str("\\\\")?,
            c if (c as u32) < 0x20 => write!(w, "\\u{:04x}", c as u32)?,
            c => w.write_char(c)?,
        }
    }
    w.write_char('\'')
}

/// A selected value together with its location
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedNode<'a> {
    pub value: &'a Value,
    pub path: NormalizedPath,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn path(elements: &[PathElement]) -> NormalizedPath {
        elements.iter().cloned().collect()
    }

    #[test]
    fn test_root_display() {
        assert_eq!(NormalizedPath::root().to_string(), "$");
        assert_eq!(NormalizedPath::root().to_pointer(), "");
    }

    #[test]
    fn test_display() {
        let p = NormalizedPath::root().child("store").child("book").child(0_usize);
        assert_eq!(p.to_string(), "$['store']['book'][0]");
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn test_display_escapes() {
        let p = NormalizedPath::root().child("it's").child("a\\b\n\u{1}");
        assert_eq!(p.to_string(), r"$['it\'s']['a\\b\n\u0001']");
    }

    #[test]
    fn test_pointer() {
        let p = NormalizedPath::root().child("a").child(0_usize).child("b");
        assert_eq!(p.to_pointer(), "/a/0/b");

        let p = NormalizedPath::root().child("m~n").child("x/y");
        assert_eq!(p.to_pointer(), "/m~0n/x~1y");
    }

    #[test]
    fn test_ordering() {
        let a = path(&[PathElement::Index(1)]);
        let b = path(&[PathElement::Name("a".into())]);
        assert!(a < b, "index sorts before name");

        let a = path(&[PathElement::Index(2)]);
        let b = path(&[PathElement::Index(10)]);
        assert!(a < b);

        let a = path(&[PathElement::Name("a".into())]);
        let b = path(&[PathElement::Name("a".into()), PathElement::Index(0)]);
        assert!(a < b, "shorter sorts first");

        let mut paths = vec![
            path(&["b".into(), 0_usize.into()]),
            path(&["a".into()]),
            path(&[3_usize.into()]),
            path(&["b".into()]),
        ];
        paths.sort();
        let shown: Vec<String> = paths.iter().map(ToString::to_string).collect();
        assert_eq!(shown, vec!["$[3]", "$['a']", "$['b']", "$['b'][0]"]);
    }
}
