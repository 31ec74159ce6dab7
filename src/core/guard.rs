//! Guard predicates and transition callbacks.
//!
//! Guards are pure boolean functions over the host record and the event
//! arguments. They decide whether a transition is eligible to fire and
//! never mutate anything.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Predicate that determines if a transition can fire.
///
/// # Example
///
/// ```rust
/// use statekeeper::core::Guard;
/// use serde_json::json;
///
/// struct Account {
///     balance: i64,
/// }
///
/// // Only allow a withdrawal that the balance covers
/// let covered = Guard::new(|account: &Account, args| {
///     let amount = args.first().and_then(|a| a.as_i64()).unwrap_or(0);
///     account.balance >= amount
/// });
///
/// let account = Account { balance: 50 };
/// assert!(covered.check(&account, &[json!(20)]));
/// assert!(!covered.check(&account, &[json!(80)]));
/// ```
pub struct Guard<H> {
    predicate: Arc<dyn Fn(&H, &[Value]) -> bool + Send + Sync>,
}

impl<H> Guard<H> {
    /// Create a guard from a pure predicate function.
    ///
    /// The predicate must be deterministic and thread-safe (Send + Sync),
    /// since a definition is shared by every instance of its model.
    pub fn new<F>(predicate: F) -> Self
    where
        F: Fn(&H, &[Value]) -> bool + Send + Sync + 'static,
    {
        Guard {
            predicate: Arc::new(predicate),
        }
    }

    /// Check if the guard allows the transition for this host and arguments.
    pub fn check(&self, host: &H, args: &[Value]) -> bool {
        (self.predicate)(host, args)
    }
}

impl<H> Clone for Guard<H> {
    fn clone(&self) -> Self {
        Self {
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<H> fmt::Debug for Guard<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Guard")
    }
}

/// Side-effecting hook run around a transition or on state entry/exit.
pub struct Callback<H> {
    action: Arc<dyn Fn(&mut H, &[Value]) + Send + Sync>,
}

impl<H> Callback<H> {
    pub fn new<F>(action: F) -> Self
    where
        F: Fn(&mut H, &[Value]) + Send + Sync + 'static,
    {
        Callback {
            action: Arc::new(action),
        }
    }

    pub fn run(&self, host: &mut H, args: &[Value]) {
        (self.action)(host, args)
    }
}

impl<H> Clone for Callback<H> {
    fn clone(&self) -> Self {
        Self {
            action: Arc::clone(&self.action),
        }
    }
}

impl<H> fmt::Debug for Callback<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}
