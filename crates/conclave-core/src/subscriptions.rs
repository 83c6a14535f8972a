use std::future::Future;

use tokio::task::JoinHandle;

use crate::errors::ConclaveError;

/// Scoped handle over a stream forwarding task.
///
/// Disposing (or dropping) the handle cancels the task, which drops the
/// underlying SDK stream and with it the registration.
pub struct Subscription {
    name: &'static str,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Spawn `future` on the current tokio runtime and own it.
    pub fn spawn<F>(name: &'static str, future: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            name,
            handle: Some(tokio::spawn(future)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_none()
    }

    /// Disposed, or the task ran to completion on its own.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    pub fn dispose(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::trace!(subscription = self.name, "subscription disposed");
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Subscriptions that are disposed together.
pub struct SubscriptionGroup {
    name: &'static str,
    subscriptions: Vec<Subscription>,
    disposed: bool,
}

impl SubscriptionGroup {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            subscriptions: Vec::new(),
            disposed: false,
        }
    }

    /// Add a subscription. A disposed group cancels it right away.
    ///
    /// Finished subscriptions (one-shot calls that already delivered their
    /// result, streams that ended) are pruned first.
    pub fn add(&mut self, mut subscription: Subscription) {
        if self.disposed {
            tracing::warn!(
                group = self.name,
                subscription = subscription.name(),
                "subscription added to a disposed group"
            );
            subscription.dispose();
            return;
        }
        self.subscriptions.retain(|s| !s.is_finished());
        self.subscriptions.push(subscription);
    }

    /// Dispose every held subscription. The group stays usable.
    pub fn clear(&mut self) -> usize {
        let count = self.subscriptions.len();
        for mut subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
        count
    }

    /// Dispose every held subscription and refuse new ones.
    pub fn dispose(&mut self) -> usize {
        self.disposed = true;
        self.clear()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }
}

/// Owns the session-scoped and meeting-scoped subscription groups of a
/// coordinator, plus the pending join request.
///
/// Every activation of the meeting group gets a new epoch. Values forwarded
/// under an older epoch belong to a torn-down group and must be dropped by
/// the receiver.
pub struct SubscriptionLifetime {
    session: SubscriptionGroup,
    meeting: SubscriptionGroup,
    pending_join: Option<Subscription>,
    meeting_active: bool,
    epoch: u64,
    activations: u64,
    teardowns: u64,
}

impl SubscriptionLifetime {
    pub fn new() -> Self {
        Self {
            session: SubscriptionGroup::new("session"),
            meeting: SubscriptionGroup::new("meeting"),
            pending_join: None,
            meeting_active: false,
            epoch: 0,
            activations: 0,
            teardowns: 0,
        }
    }

    pub fn add_session(&mut self, subscription: Subscription) {
        self.session.add(subscription);
    }

    /// Open a new meeting scope and return its epoch.
    ///
    /// Only valid once the previous scope has been torn down.
    pub fn activate(&mut self) -> Result<u64, ConclaveError> {
        if self.meeting_active || !self.meeting.is_empty() {
            return Err(ConclaveError::SubscriptionsActive(self.meeting.len()));
        }
        self.meeting_active = true;
        self.epoch += 1;
        self.activations += 1;
        tracing::debug!(epoch = self.epoch, "in-meeting subscriptions activated");
        Ok(self.epoch)
    }

    /// Add to the active meeting scope. Without one the subscription is
    /// cancelled immediately.
    pub fn add_meeting(&mut self, mut subscription: Subscription) {
        if !self.meeting_active {
            tracing::warn!(
                subscription = subscription.name(),
                "no active meeting scope, dropping subscription"
            );
            subscription.dispose();
            return;
        }
        self.meeting.add(subscription);
    }

    /// Close the meeting scope. Safe to call when nothing is active.
    pub fn teardown(&mut self) -> usize {
        if !self.meeting_active && self.meeting.is_empty() {
            return 0;
        }
        let disposed = self.meeting.clear();
        self.meeting_active = false;
        self.teardowns += 1;
        tracing::debug!(epoch = self.epoch, disposed, "in-meeting subscriptions torn down");
        disposed
    }

    /// Replace the pending join request, cancelling any previous one.
    pub fn set_pending_join(&mut self, subscription: Subscription) {
        self.pending_join = Some(subscription);
    }

    pub fn clear_pending_join(&mut self) {
        self.pending_join = None;
    }

    pub fn has_pending_join(&self) -> bool {
        self.pending_join.is_some()
    }

    /// Dispose everything. Used when the owner is destroyed.
    pub fn release_all(&mut self) {
        self.teardown();
        self.pending_join = None;
        let released = self.session.dispose();
        tracing::debug!(released, "session subscriptions released");
    }

    /// Epoch of the active meeting scope, if any.
    pub fn active_epoch(&self) -> Option<u64> {
        self.meeting_active.then_some(self.epoch)
    }

    pub fn is_meeting_active(&self) -> bool {
        self.meeting_active
    }

    pub fn session_len(&self) -> usize {
        self.session.len()
    }

    pub fn meeting_len(&self) -> usize {
        self.meeting.len()
    }

    pub fn activation_count(&self) -> u64 {
        self.activations
    }

    pub fn teardown_count(&self) -> u64 {
        self.teardowns
    }
}

impl Default for SubscriptionLifetime {
    fn default() -> Self {
        Self::new()
    }
}
