use std::future::Future;
use tokio::task::JoinHandle;

/// Handle to the repeating status query of one session.
///
/// Dropping the handle cancels the task, so a session that goes away can never
/// leave a timer running against it.
#[derive(Debug)]
pub struct PollTask {
    handle: JoinHandle<()>,
}

impl PollTask {
    pub fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            handle: tokio::spawn(future),
        }
    }
}

impl Drop for PollTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
