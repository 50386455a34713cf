use veracity_common::Source;

pub const DEFAULT_MAX_SOURCES: usize = 10;

/// Orders sources by how strongly they moved the score.
#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    max_sources: usize,
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SOURCES)
    }
}

impl Ranker {
    pub fn new(max_sources: usize) -> Self {
        Self { max_sources }
    }

    /// Sort by descending `|impact|` (ties keep their input order) and keep
    /// at most `max_sources`.
    pub fn rank(&self, mut sources: Vec<Source>) -> Vec<Source> {
        sources.sort_by(|a, b| b.impact.abs().total_cmp(&a.impact.abs()));
        sources.truncate(self.max_sources);
        sources
    }
}
