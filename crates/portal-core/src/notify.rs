//! User-facing notifications (toasts) emitted by the entity stores.

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Variant {
  #[default]
  Default,
  Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
  pub title:       String,
  pub description: String,
  pub variant:     Variant,
}

impl Notification {
  pub fn new(
    title: impl Into<String>,
    description: impl Into<String>,
    variant: Variant,
  ) -> Self {
    Self { title: title.into(), description: description.into(), variant }
  }

  /// A "Success" toast.
  pub fn success(description: impl Into<String>) -> Self {
    Self::new("Success", description, Variant::Default)
  }

  /// A destructive "Error" toast.
  pub fn error(description: impl Into<String>) -> Self {
    Self::new("Error", description, Variant::Destructive)
  }
}

/// Fire-and-forget sink for notifications.
pub trait Notifier: Send + Sync {
  fn notify(&self, notification: Notification);
}

/// Routes notifications into the log. Useful when there is no UI to show
/// them.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  fn notify(&self, n: Notification) {
    match n.variant {
      Variant::Destructive => {
        tracing::warn!(title = %n.title, description = %n.description, "notification")
      }
      Variant::Default => {
        tracing::info!(title = %n.title, description = %n.description, "notification")
      }
    }
  }
}
