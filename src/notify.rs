use std::any::Any;
use std::sync::Mutex;

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please check your connection.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Sink for user-visible toasts. The HTTP client emits at most one
/// notification per failed request; flows emit their own success messages.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn error(&self, message: &str);
    #[allow(dead_code)]
    fn as_any(&self) -> &dyn Any;
}

/// Default sink that forwards notifications to the tracing pipeline. Host
/// applications embedding the client swap in their own toast surface.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn success(&self, message: &str) {
        tracing::info!(target: "notify", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::warn!(target: "notify", "{}", message);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Records notifications for assertions in tests.
#[derive(Debug, Default)]
pub struct MockNotifier {
    pub successes: Mutex<Vec<String>>,
    pub errors: Mutex<Vec<String>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_count(&self) -> usize {
        self.errors.lock().unwrap().len()
    }

    pub fn last_error(&self) -> Option<String> {
        self.errors.lock().unwrap().last().cloned()
    }

    pub fn last_success(&self) -> Option<String> {
        self.successes.lock().unwrap().last().cloned()
    }
}

impl Notifier for MockNotifier {
    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }

    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{MockNotifier, Notifier};

    #[test]
    fn mock_records_in_order() {
        let mock = MockNotifier::new();
        mock.error("first");
        mock.error("second");
        mock.success("done");
        assert_eq!(mock.error_count(), 2);
        assert_eq!(mock.last_error().as_deref(), Some("second"));
        assert_eq!(mock.last_success().as_deref(), Some("done"));
    }
}
