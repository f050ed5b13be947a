use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Lines captured from one directive occurrence, exactly as written.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fragment {
    lines: Vec<String>,
}

impl Fragment {
    pub fn new(lines: Vec<String>) -> Self {
        Fragment { lines }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Fragment {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Fragment::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Per-document fragment lists, in directive order within each document.
///
/// A missing document and a document without fragments look the same to
/// readers. Keys are kept sorted so the serialised form is stable.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnippetStore {
    documents: BTreeMap<String, Vec<Fragment>>,
}

impl SnippetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fragment list for `docname`, registered empty if absent. This is
    /// the only way to append.
    pub fn get_or_create_list(&mut self, docname: &str) -> &mut Vec<Fragment> {
        self.documents.entry(docname.to_string()).or_default()
    }

    /// The fragments of `docname`; empty when the document has none.
    pub fn get(&self, docname: &str) -> &[Fragment] {
        self.documents
            .get(docname)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Forget `docname`. Removing an unknown document is a no-op.
    pub fn remove(&mut self, docname: &str) -> Option<Vec<Fragment>> {
        self.documents.remove(docname)
    }

    /// Fold a store produced by an independent read into this one. Each
    /// incoming document's fragments are appended after any already held.
    pub fn merge(&mut self, other: SnippetStore) {
        for (docname, fragments) in other.documents {
            self.documents
                .entry(docname)
                .or_default()
                .extend(fragments);
        }
    }

    /// Documents holding an entry, in name order.
    pub fn documents(&self) -> impl Iterator<Item = (&str, &[Fragment])> {
        self.documents
            .iter()
            .map(|(docname, fragments)| (docname.as_str(), fragments.as_slice()))
    }

    pub fn contains(&self, docname: &str) -> bool {
        self.documents.contains_key(docname)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
