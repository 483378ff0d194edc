use std::time::Duration;

use anyhow::{Result, bail};

use crate::memory::ConversationMemory;
use crate::trace::SessionTrace;

/// Cooldown applied before rotating to the next credential after a rate limit.
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(1);

/// Ordered, deduplicated set of API keys plus the cursor of the last key that
/// completed a turn successfully. The set is fixed for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPool {
    keys: Vec<String>,
    last_good: usize,
}

impl CredentialPool {
    pub fn new(keys: Vec<String>) -> Result<Self> {
        let mut usable: Vec<String> = Vec::with_capacity(keys.len());
        for key in keys {
            let trimmed = key.trim();
            if !trimmed.is_empty() && !usable.iter().any(|k| k == trimmed) {
                usable.push(trimmed.to_string());
            }
        }

        if usable.is_empty() {
            bail!(
                "No usable API keys configured. Provide at least one key via GEMINI_API_KEYS or the config file."
            );
        }

        Ok(Self {
            keys: usable,
            last_good: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn key(&self, index: usize) -> &str {
        &self.keys[index]
    }

    pub fn last_good_index(&self) -> usize {
        self.last_good
    }

    pub fn mark_good(&mut self, index: usize) {
        self.last_good = index;
    }

    pub fn reset_cursor(&mut self) {
        self.last_good = 0;
    }
}

/// Failure modes of a single agent invocation. Only rate limits are retryable
/// across credentials; everything else aborts the turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerError {
    RateLimited,
    Fatal(String),
}

/// One request-answering session bound to a single credential. Built fresh for
/// every attempt and discarded after the call returns.
pub trait TurnSession {
    fn answer(
        &self,
        user_input: &str,
    ) -> impl std::future::Future<Output = Result<String, AnswerError>> + Send;
}

/// Builds a session for one credential. `None` means the credential failed
/// local validation; the rotation loop skips it without issuing a request.
pub trait SessionFactory {
    type Session: TurnSession;

    fn build(&self, credential: &str, memory: &ConversationMemory) -> Option<Self::Session>;
}

/// Result of one user turn after rotation has run its course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Fatal(String),
    Exhausted,
}

/// The rotation state machine: tries credentials in circular order starting
/// from the last known-good index, at most once each per turn.
pub struct RotatingExecutor<F> {
    factory: F,
    pool: CredentialPool,
    memory: ConversationMemory,
    cooldown: Duration,
    trace: Option<SessionTrace>,
}

impl<F: SessionFactory> RotatingExecutor<F> {
    pub fn new(factory: F, pool: CredentialPool) -> Self {
        Self {
            factory,
            pool,
            memory: ConversationMemory::new(),
            cooldown: RATE_LIMIT_COOLDOWN,
            trace: None,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_trace(mut self, trace: SessionTrace) -> Self {
        self.trace = Some(trace);
        self
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    /// Starts a new chat session: clears the history and rewinds the cursor.
    pub fn reset(&mut self) {
        self.memory.clear();
        self.pool.reset_cursor();
    }

    pub async fn execute(&mut self, user_input: &str) -> Outcome {
        let n = self.pool.len();
        let start = self.pool.last_good_index();

        for offset in 0..n {
            let index = (start + offset) % n;
            let Some(session) = self.factory.build(self.pool.key(index), &self.memory) else {
                // Local validation failure: skip with no delay. Invalid keys are
                // re-validated on every turn rather than blacklisted.
                self.log_rotation(&format!("skipped invalid credential #{index}"));
                continue;
            };

            match session.answer(user_input).await {
                Ok(text) => {
                    self.pool.mark_good(index);
                    self.memory.record_exchange(user_input, &text);
                    self.log_rotation(&format!("credential #{index} answered the turn"));
                    return Outcome::Success(text);
                }
                Err(AnswerError::RateLimited) => {
                    self.log_rotation(&format!("credential #{index} rate limited, rotating"));
                    tokio::time::sleep(self.cooldown).await;
                }
                Err(AnswerError::Fatal(message)) => {
                    self.log_rotation(&format!("credential #{index} failed: {message}"));
                    return Outcome::Fatal(message);
                }
            }
        }

        self.log_rotation("all credentials invalid or rate limited");
        Outcome::Exhausted
    }

    fn log_rotation(&self, message: &str) {
        if let Some(trace) = &self.trace {
            trace.log_rotation(message);
        }
    }
}
