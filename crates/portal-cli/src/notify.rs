//! Notifications printed to stderr, so they never mix with command output.

use portal_core::notify::{Notification, Notifier, Variant};

#[derive(Debug, Clone, Copy, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
  fn notify(&self, n: Notification) {
    let marker = match n.variant {
      Variant::Default => "ok",
      Variant::Destructive => "!!",
    };
    eprintln!("[{marker}] {}: {}", n.title, n.description);
  }
}
