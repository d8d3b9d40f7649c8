use std::fs;
use std::path::Path;

use super::LoadError;

/// Class names, index-aligned with the classifier output.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelSet {
    labels: Vec<String>,
}

impl LabelSet {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let contents = fs::read_to_string(path).map_err(|source| LoadError::Labels {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// One label per line; a trailing newline does not add an entry.
    pub fn parse(contents: &str) -> Result<Self, LoadError> {
        let labels: Vec<String> = contents.lines().map(str::to_string).collect();
        if labels.is_empty() {
            return Err(LoadError::EmptyLabels);
        }
        Ok(Self { labels })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.labels.get(index).map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for LabelSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            labels: iter.into_iter().map(Into::into).collect(),
        }
    }
}
