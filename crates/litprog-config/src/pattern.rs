use std::path::Path;

use globset::{Glob, GlobMatcher};

/// A glob as written in the config, with its compiled matcher.
#[derive(Clone, Debug)]
pub struct Pattern {
    original: String,
    matcher: GlobMatcher,
}

impl Pattern {
    pub fn new(original: impl Into<String>) -> Result<Self, globset::Error> {
        let original = original.into();
        let matcher = Glob::new(&original)?.compile_matcher();
        Ok(Pattern { original, matcher })
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn is_match(&self, path: &Path) -> bool {
        self.matcher.is_match(path)
    }
}

#[derive(Clone, Debug, Default)]
pub struct PatternList {
    patterns: Vec<Pattern>,
}

impl PatternList {
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    /// True when any pattern matches `path`.
    pub fn is_match(&self, path: &Path) -> bool {
        self.iter().any(|pattern| pattern.is_match(path))
    }
}

impl FromIterator<Pattern> for PatternList {
    fn from_iter<I: IntoIterator<Item = Pattern>>(iter: I) -> Self {
        PatternList {
            patterns: iter.into_iter().collect(),
        }
    }
}
