use tokio::task::JoinHandle;

/// Handle to the countdown task of one question.
///
/// The session owns it and cancels it whenever the question stops being
/// answerable. Dropping the handle cancels too, so a session that goes away
/// never leaves a countdown behind.
#[derive(Debug)]
pub struct QuestionTimer {
    question: usize,
    handle: Option<JoinHandle<()>>,
}

impl QuestionTimer {
    pub fn new(question: usize, handle: JoinHandle<()>) -> Self {
        Self {
            question,
            handle: Some(handle),
        }
    }

    /// Index of the question this countdown was started for.
    pub fn question(&self) -> usize {
        self.question
    }

    pub fn cancel(mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    /// Lets the task run to completion on its own.
    ///
    /// Used when the countdown task itself reports the expiry: aborting it
    /// there would cut off its final render.
    pub fn detach(mut self) {
        self.handle.take();
    }
}

impl Drop for QuestionTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
