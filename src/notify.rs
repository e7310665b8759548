//! In-process notification (toast) lifecycle management.
//!
//! A [`NotificationCenter`] owns the ordered set of active notifications and
//! the identity counter, both behind a single lock so the handle can be
//! cloned into any task or thread. Auto-expiry rides the tokio timer wheel:
//! each `show` with a finite duration arms one deferred `remove` for that
//! notification's id.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

use crate::types::Severity;

/// Grace window appended to every finite duration so presentation layers can
/// play an exit animation before the entry disappears from the set.
const EXIT_GRACE: Duration = Duration::from_millis(300);

/// Duration applied when the caller does not pick one.
const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

/// When a notification leaves the active set on its own.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Expiry {
    /// Stays until an explicit `remove`.
    Never,
    /// Auto-removed after the given duration plus the exit grace window.
    After(Duration),
}

impl Default for Expiry {
    fn default() -> Self {
        Self::After(DEFAULT_DURATION)
    }
}

impl Expiry {
    /// A zero duration means "persistent"; collapse it so the scheduling
    /// decision in `show` has a single case to check.
    fn normalized(self) -> Self {
        match self {
            Self::After(d) if d.is_zero() => Self::Never,
            other => other,
        }
    }
}

/// A single active toast. Immutable once created; it only ever leaves the
/// set through [`NotificationCenter::remove`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub severity: Severity,
    pub title: String,
    pub message: String,
    pub expiry: Expiry,
}

/// Parameters for [`NotificationCenter::show`]. The message is the only
/// required field; everything else defaults (`info`, empty title, 3s).
#[derive(Clone, Debug)]
pub struct ShowOptions {
    severity: Severity,
    title: String,
    message: String,
    expiry: Expiry,
}

impl ShowOptions {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::default(),
            title: String::new(),
            message: message.into(),
            expiry: Expiry::default(),
        }
    }

    #[must_use]
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = expiry;
        self
    }

    /// Shorthand for `expiry(Expiry::Never)`.
    #[must_use]
    pub fn persistent(self) -> Self {
        self.expiry(Expiry::Never)
    }
}

#[derive(Debug, Default)]
struct Inner {
    last_id: u64,
    active: Vec<Notification>,
}

/// Shared handle over the active notification set.
///
/// Cloning is cheap and every clone observes the same set. The id counter
/// starts at 1, only ever grows, and ids are never reused even after the
/// notification they belong to is removed.
#[derive(Clone, Debug, Default)]
pub struct NotificationCenter {
    inner: Arc<Mutex<Inner>>,
}

impl NotificationCenter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a notification and return its freshly allocated id.
    ///
    /// The append is synchronous: the entry is visible to every observer by
    /// the time this returns. With a finite expiry this must run inside a
    /// tokio runtime, since the deferred removal is a spawned timer task.
    pub fn show(&self, options: ShowOptions) -> u64 {
        let expiry = options.expiry.normalized();
        let severity = options.severity;
        let id = {
            let mut inner = self.lock();
            inner.last_id += 1;
            let id = inner.last_id;
            inner.active.push(Notification {
                id,
                severity,
                title: options.title,
                message: options.message,
                expiry,
            });
            id
        };

        debug!(id, severity = %severity, "notification shown");

        if let Expiry::After(duration) = expiry {
            let center = self.clone();
            tokio::spawn(async move {
                sleep(duration + EXIT_GRACE).await;
                center.remove(id);
            });
        }

        id
    }

    /// Remove the notification with the given id, keeping the relative order
    /// of the rest. Unknown or already-removed ids are a silent no-op, which
    /// also makes a late auto-expiry timer harmless after a manual remove.
    pub fn remove(&self, id: u64) {
        let mut inner = self.lock();
        if let Some(pos) = inner.active.iter().position(|n| n.id == id) {
            inner.active.remove(pos);
            debug!(id, "notification removed");
        }
    }

    pub fn success(&self, message: impl Into<String>, title: impl Into<String>) -> u64 {
        self.show(ShowOptions::new(message).severity(Severity::Success).title(title))
    }

    pub fn error(&self, message: impl Into<String>, title: impl Into<String>) -> u64 {
        self.show(ShowOptions::new(message).severity(Severity::Error).title(title))
    }

    pub fn warning(&self, message: impl Into<String>, title: impl Into<String>) -> u64 {
        self.show(ShowOptions::new(message).severity(Severity::Warning).title(title))
    }

    pub fn info(&self, message: impl Into<String>, title: impl Into<String>) -> u64 {
        self.show(ShowOptions::new(message).severity(Severity::Info).title(title))
    }

    /// Snapshot of the active set in insertion order.
    #[must_use]
    pub fn active(&self) -> Vec<Notification> {
        self.lock().active.clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().active.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().active.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panic while holding the lock leaves only consistent state behind
        // (push/remove never partially apply), so recover the guard.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::{Expiry, NotificationCenter, ShowOptions};
    use crate::types::Severity;
    use std::time::Duration;
    use tokio::time::sleep;

    fn persistent(message: &str) -> ShowOptions {
        ShowOptions::new(message).persistent()
    }

    #[test]
    fn ids_are_unique_and_strictly_increasing() {
        let center = NotificationCenter::new();
        let a = center.show(persistent("a"));
        let b = center.show(persistent("b"));
        center.remove(a);
        let c = center.show(persistent("c"));
        assert_eq!((a, b), (1, 2));
        assert!(b > a && c > b);
    }

    #[test]
    fn insertion_order_survives_removal() {
        let center = NotificationCenter::new();
        let _a = center.show(persistent("A"));
        let b = center.show(persistent("B"));
        let _c = center.show(persistent("C"));

        let messages: Vec<String> = center.active().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, ["A", "B", "C"]);

        center.remove(b);
        let messages: Vec<String> = center.active().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, ["A", "C"]);
    }

    #[test]
    fn removal_is_idempotent_and_forgiving() {
        let center = NotificationCenter::new();
        let id = center.show(persistent("x"));
        center.remove(id);
        center.remove(id);
        center.remove(9999);
        assert!(center.is_empty());
    }

    #[test]
    fn defaults_fill_unset_fields() {
        let center = NotificationCenter::new();
        center.show(ShowOptions::new("only message").persistent());
        let snapshot = center.active();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].severity, Severity::Info);
        assert_eq!(snapshot[0].title, "");
        assert_eq!(snapshot[0].message, "only message");

        assert_eq!(Expiry::default(), Expiry::After(Duration::from_millis(3000)));
    }

    #[tokio::test]
    async fn convenience_constructors_match_explicit_show() {
        let center = NotificationCenter::new();
        center.success("hi", "T");
        center.show(
            ShowOptions::new("hi")
                .severity(Severity::Success)
                .title("T"),
        );

        let snapshot = center.active();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].severity, snapshot[1].severity);
        assert_eq!(snapshot[0].title, snapshot[1].title);
        assert_eq!(snapshot[0].message, snapshot[1].message);
        assert_eq!(snapshot[0].expiry, snapshot[1].expiry);
        assert_ne!(snapshot[0].id, snapshot[1].id);
    }

    #[tokio::test(start_paused = true)]
    async fn auto_expiry_fires_after_duration_plus_grace() {
        let center = NotificationCenter::new();
        center.show(ShowOptions::new("x").expiry(Expiry::After(Duration::from_millis(1000))));

        sleep(Duration::from_millis(1299)).await;
        assert_eq!(center.len(), 1, "still visible inside the grace window");

        sleep(Duration::from_millis(2)).await;
        assert!(center.is_empty(), "gone once duration + grace elapsed");
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_means_persistent() {
        let center = NotificationCenter::new();
        center.show(ShowOptions::new("x").expiry(Expiry::After(Duration::ZERO)));

        sleep(Duration::from_secs(3600)).await;
        assert_eq!(center.len(), 1);

        let snapshot = center.active();
        center.remove(snapshot[0].id);
        assert!(center.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_remove_defuses_pending_timer() {
        let center = NotificationCenter::new();
        let id = center.show(ShowOptions::new("x").expiry(Expiry::After(Duration::from_millis(500))));
        let other = center.show(persistent("y"));

        center.remove(id);
        sleep(Duration::from_secs(2)).await;

        // The timer fired into an absent id; the unrelated entry is intact.
        let snapshot = center.active();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, other);
    }
}
