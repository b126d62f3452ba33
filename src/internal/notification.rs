use std::time::{Duration, Instant};

/// Type of notification to display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    /// Status announcements such as a theme change.
    Status,
    Info,
    Error,
}

impl NotificationType {
    fn timeout(&self) -> Duration {
        match self {
            NotificationType::Status => Duration::from_secs(2),
            NotificationType::Info => Duration::from_secs(3),
            NotificationType::Error => Duration::from_secs(10),
        }
    }
}

/// A transient message shown over the status bar.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub notification_type: NotificationType,
    pub timestamp: Instant,
}

impl Notification {
    pub fn status(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Status)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Info)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, NotificationType::Error)
    }

    fn new(message: impl Into<String>, notification_type: NotificationType) -> Self {
        Self {
            message: message.into(),
            notification_type,
            timestamp: Instant::now(),
        }
    }

    pub fn should_dismiss(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.timestamp) > self.notification_type.timeout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dismisses_after_type_timeout() {
        let note = Notification::status("Tema alterado para escuro.");
        assert!(!note.should_dismiss(note.timestamp + Duration::from_secs(1)));
        assert!(note.should_dismiss(note.timestamp + Duration::from_secs(3)));

        let error = Notification::error("falhou");
        assert!(!error.should_dismiss(error.timestamp + Duration::from_secs(5)));
    }
}
