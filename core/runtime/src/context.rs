use crate::error::SequenceError;

/// Per-task runtime state: the last raised error and the iteration counter.
///
/// Every primitive that reads or writes error state takes the context of the
/// task it runs on. Subroutines share their caller's context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskContext {
    name: String,
    last_error: Option<SequenceError>,
    iteration: u64,
}

impl TaskContext {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_error: None,
            iteration: 0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&SequenceError> {
        self.last_error.as_ref()
    }

    /// Code of the last error, `0` when none is pending.
    #[must_use]
    pub fn last_error_code(&self) -> i32 {
        self.last_error.as_ref().map_or(0, |error| error.code)
    }

    #[must_use]
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn set_last_error(&mut self, error: SequenceError) {
        self.last_error = Some(error);
    }

    pub fn clear_last_error(&mut self) {
        self.last_error = None;
    }

    /// Counts one completed scheduling round of this task.
    pub fn advance(&mut self) {
        self.iteration += 1;
    }

    /// Clears error state and the iteration counter at task start.
    pub fn reset(&mut self) {
        self.last_error = None;
        self.iteration = 0;
    }
}
