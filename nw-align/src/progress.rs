/// Snapshot passed to the progress callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    /// DP cells filled so far.
    pub done: u64,
    /// `(len1 + 1) * (len2 + 1)`.
    pub total: u64,
}

impl Progress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.done as f64 / self.total as f64
        }
    }
}

/// Called before the fill and after every DP row. Returning `true` cancels the run.
pub type ProgressCallback<'a> = Box<dyn FnMut(Progress) -> bool + 'a>;
