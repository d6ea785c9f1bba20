use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of the execution context (runtime) that owns a client.
///
/// A transport bound to one context must not be driven from another, so the
/// registry compares tokens before handing out a cached client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextToken(u64);

impl ContextToken {
    /// Allocate a token that no other call in this process will return.
    pub fn mint() -> Self {
        Self(NEXT_TOKEN.fetch_add(1, Ordering::Relaxed))
    }
}

/// Tells the registry which context the current caller runs on.
pub trait ContextSource: Send + Sync {
    fn current(&self) -> ContextToken;
}

/// A process with a single runtime: every caller shares one token.
#[derive(Clone, Copy, Debug)]
pub struct FixedContext(ContextToken);

impl FixedContext {
    pub fn new(token: ContextToken) -> Self {
        Self(token)
    }

    pub fn token(&self) -> ContextToken {
        self.0
    }
}

impl ContextSource for FixedContext {
    fn current(&self) -> ContextToken {
        self.0
    }
}
