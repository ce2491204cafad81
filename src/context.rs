//! Cancellation, deadline, and value propagation
//!
//! A [`Context`] is the per-call handle the driver threads through every
//! blocking operation: it carries an explicit cancellation token, an optional
//! deadline, and an immutable chain of request-scoped values. Deriving a
//! child context never mutates the parent; cancelling a parent cancels all
//! contexts derived from it.
//!
//! Values are keyed by key *type*, not by value: `with_value::<K, V>`
//! attaches a value under the identity of `K`, and only code that can name
//! `K` can read it back. A private key type therefore gives its owning
//! module exclusive access to its slot in the chain.

use std::any::{Any, TypeId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::Error;

/// Cancellation/deadline/value context for a single driver operation.
///
/// Cheap to clone; clones share the same cancellation token and value chain.
#[derive(Clone)]
pub struct Context {
    cancel: CancellationToken,
    deadline: Option<Instant>,
    values: Option<Arc<ValueNode>>,
}

struct ValueNode {
    key: TypeId,
    value: Arc<dyn Any + Send + Sync>,
    parent: Option<Arc<ValueNode>>,
}

impl Context {
    /// A root context: never cancelled, no deadline, no values.
    pub fn background() -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: None,
            values: None,
        }
    }

    /// Derive a child context with its own cancellation handle.
    ///
    /// Cancelling the returned token cancels the child (and anything derived
    /// from it) without affecting this context. Cancelling this context still
    /// cancels the child.
    pub fn with_cancellation(&self) -> (Self, CancellationToken) {
        let token = self.cancel.child_token();
        let ctx = Self {
            cancel: token.clone(),
            deadline: self.deadline,
            values: self.values.clone(),
        };
        (ctx, token)
    }

    /// Derive a child context that is cancelled once `deadline` passes.
    ///
    /// If this context already has an earlier deadline, the earlier one is
    /// kept: a child's deadline is never looser than its parent's.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing <= deadline => existing,
            _ => deadline,
        };
        Self {
            cancel: self.cancel.clone(),
            deadline: Some(deadline),
            values: self.values.clone(),
        }
    }

    /// Derive a child context that is cancelled after `timeout` elapses.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Derive a child context carrying `value` under the key type `K`.
    ///
    /// The value is readable only via [`Context::value`] with the same `K`;
    /// a structurally similar but distinct key type will not match.
    pub fn with_value<K: 'static, V: Any + Send + Sync>(&self, value: V) -> Self {
        Self {
            cancel: self.cancel.clone(),
            deadline: self.deadline,
            values: Some(Arc::new(ValueNode {
                key: TypeId::of::<K>(),
                value: Arc::new(value),
                parent: self.values.clone(),
            })),
        }
    }

    /// Look up the value stored under key type `K`, newest first.
    pub fn value<K: 'static, V: Any + Send + Sync>(&self) -> Option<&V> {
        let mut node = self.values.as_deref();
        while let Some(n) = node {
            if n.key == TypeId::of::<K>() {
                return n.value.downcast_ref::<V>();
            }
            node = n.parent.as_deref();
        }
        None
    }

    /// The effective deadline, if any ancestor set one.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether this context's cancellation token has been triggered.
    ///
    /// Deadline expiry is reported separately, via [`Context::error`].
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The context's terminal error, if it can no longer be used.
    ///
    /// Explicit cancellation takes precedence over deadline expiry.
    pub fn error(&self) -> Option<Error> {
        if self.cancel.is_cancelled() {
            return Some(Error::Cancelled);
        }
        if let Some(deadline) = self.deadline {
            if deadline <= Instant::now() {
                return Some(Error::DeadlineExceeded);
            }
        }
        None
    }

    /// Wait until this context is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::background()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("cancelled", &self.cancel.is_cancelled())
            .field("deadline", &self.deadline)
            .field("has_values", &self.values.is_some())
            .finish()
    }
}
