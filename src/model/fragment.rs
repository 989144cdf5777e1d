use std::borrow::Cow;
use std::fmt;

/// An opaque XML fragment kept byte-for-byte as the server sent it
///
/// Used for element content whose schema the harvester does not know:
/// record metadata, `about` containers, repository and set descriptions, and
/// the raw body of a record. Entities are not resolved and namespace
/// declarations from enclosing elements are not copied in.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct XmlFragment(Vec<u8>);

impl XmlFragment {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns the fragment as text, replacing invalid UTF-8 sequences
    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for XmlFragment {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for XmlFragment {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl fmt::Debug for XmlFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("XmlFragment")
            .field(&self.to_string_lossy())
            .finish()
    }
}

impl fmt::Display for XmlFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}
