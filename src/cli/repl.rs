use anyhow::Result;
use rustyline::Editor;
use rustyline::error::ReadlineError;

use crate::agent::GeminiSessionFactory;
use crate::agent::capability::GREETING_TEXT;
use crate::cli::canned::{self, CannedReply};
use crate::memory::Role;
use crate::rotation::{Outcome, RotatingExecutor, SessionFactory};
use crate::trace::SessionTrace;

pub const PROMPT: &str = "you> ";

/// Shown when a turn aborts on a non-retryable provider failure. The detailed
/// error only goes to the session trace.
pub const FATAL_REPLY: &str = "I'm having some trouble processing that. Please try rephrasing.";

/// Shown when every credential was invalid or rate limited this turn.
pub const OVERLOADED_REPLY: &str = "I'm currently experiencing very high traffic and can't \
                                    process your request. Please try again in a minute.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub role: Role,
    pub content: String,
}

/// The chat session: visible transcript plus the rotating executor that owns
/// the agent-facing conversation memory. Transcript and memory are kept in
/// sync, but only successful turns reach the memory.
pub struct AppState<F: SessionFactory> {
    pub executor: RotatingExecutor<F>,
    pub transcript: Vec<TranscriptEntry>,
    pub trace: SessionTrace,
}

impl<F: SessionFactory> AppState<F> {
    pub fn new(executor: RotatingExecutor<F>, trace: SessionTrace) -> Self {
        Self {
            executor,
            transcript: Vec::new(),
            trace,
        }
    }

    fn record(&mut self, role: Role, content: &str) {
        self.transcript.push(TranscriptEntry {
            role,
            content: content.to_string(),
        });
    }

    /// Resets transcript, memory and the credential cursor.
    pub fn start_new_session(&mut self) {
        self.transcript.clear();
        self.executor.reset();
        self.trace.log_rotation("new session started");
    }

    /// Runs one user turn; returns the reply text and whether the session
    /// should end. Canned shortcuts never reach the executor.
    pub async fn run_turn(&mut self, line: &str) -> (String, bool) {
        self.trace.log_user_input(line);
        self.record(Role::User, line);

        let (reply, end_session) = match canned::match_canned(line) {
            Some(CannedReply::Goodbye) => (CannedReply::Goodbye.text().to_string(), true),
            Some(CannedReply::Help) => (CannedReply::Help.text().to_string(), false),
            None => match self.executor.execute(line).await {
                Outcome::Success(text) => (text, false),
                Outcome::Fatal(_) => (FATAL_REPLY.to_string(), false),
                Outcome::Exhausted => (OVERLOADED_REPLY.to_string(), false),
            },
        };

        self.record(Role::Assistant, &reply);
        self.trace.log_reply(&reply);
        (reply, end_session)
    }
}

pub async fn run_repl(state: &mut AppState<GeminiSessionFactory>) -> Result<()> {
    let mut rl = Editor::<(), rustyline::history::DefaultHistory>::new()?;

    println!("{GREETING_TEXT}\n");
    state.record(Role::Assistant, GREETING_TEXT);

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line.eq_ignore_ascii_case("/new") {
                    state.start_new_session();
                    println!("{GREETING_TEXT}\n");
                    state.record(Role::Assistant, GREETING_TEXT);
                    continue;
                }

                let (reply, end_session) = state.run_turn(line).await;
                println!("{reply}\n");
                if end_session {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tempfile::{TempDir, tempdir};

    use super::{AppState, FATAL_REPLY, OVERLOADED_REPLY};
    use crate::cli::canned::{GOODBYE_TEXT, HELP_TEXT};
    use crate::memory::{ConversationMemory, Role};
    use crate::rotation::{
        AnswerError, CredentialPool, RotatingExecutor, SessionFactory, TurnSession,
    };
    use crate::trace::SessionTrace;

    #[derive(Debug, Clone, Copy)]
    enum Behaviour {
        Answer(&'static str),
        RateLimited,
        Fatal,
    }

    struct FixedSession {
        behaviour: Behaviour,
    }

    impl TurnSession for FixedSession {
        async fn answer(&self, _user_input: &str) -> Result<String, AnswerError> {
            match self.behaviour {
                Behaviour::Answer(text) => Ok(text.to_string()),
                Behaviour::RateLimited => Err(AnswerError::RateLimited),
                Behaviour::Fatal => Err(AnswerError::Fatal("parse error".to_string())),
            }
        }
    }

    struct FixedFactory {
        behaviour: Behaviour,
        builds: Arc<Mutex<usize>>,
    }

    impl SessionFactory for FixedFactory {
        type Session = FixedSession;

        fn build(&self, _credential: &str, _memory: &ConversationMemory) -> Option<FixedSession> {
            *self.builds.lock().expect("builds lock") += 1;
            Some(FixedSession {
                behaviour: self.behaviour,
            })
        }
    }

    fn state_with(behaviour: Behaviour) -> (AppState<FixedFactory>, Arc<Mutex<usize>>, TempDir) {
        let builds = Arc::new(Mutex::new(0));
        let factory = FixedFactory {
            behaviour,
            builds: Arc::clone(&builds),
        };
        let pool = CredentialPool::new(vec!["key-a".to_string()]).expect("pool");
        let executor = RotatingExecutor::new(factory, pool).with_cooldown(Duration::ZERO);
        let dir = tempdir().expect("tempdir");
        let trace = SessionTrace::create_in_temp_dir("test", dir.path()).expect("trace");
        (AppState::new(executor, trace), builds, dir)
    }

    #[tokio::test]
    async fn successful_turn_syncs_transcript_and_memory() {
        let (mut state, _builds, _dir) = state_with(Behaviour::Answer("check the battery"));

        let (reply, end_session) = state.run_turn("my car won't start").await;

        assert_eq!(reply, "check the battery");
        assert!(!end_session);
        assert_eq!(state.transcript.len(), 2);
        assert_eq!(state.transcript[0].role, Role::User);
        assert_eq!(state.transcript[1].content, "check the battery");
        assert_eq!(state.executor.memory().len(), 2);
    }

    #[tokio::test]
    async fn exit_is_answered_without_building_a_session() {
        let (mut state, builds, _dir) = state_with(Behaviour::Answer("never used"));

        let (reply, end_session) = state.run_turn("EXIT").await;

        assert_eq!(reply, GOODBYE_TEXT);
        assert!(end_session);
        assert_eq!(*builds.lock().expect("builds"), 0);
        assert!(state.executor.memory().is_empty());
    }

    #[tokio::test]
    async fn help_is_answered_without_building_a_session() {
        let (mut state, builds, _dir) = state_with(Behaviour::Answer("never used"));

        let (reply, end_session) = state.run_turn("Help").await;

        assert_eq!(reply, HELP_TEXT);
        assert!(!end_session);
        assert_eq!(*builds.lock().expect("builds"), 0);
    }

    #[tokio::test]
    async fn fatal_outcome_maps_to_generic_apology() {
        let (mut state, _builds, _dir) = state_with(Behaviour::Fatal);

        let (reply, _) = state.run_turn("hello").await;

        assert_eq!(reply, FATAL_REPLY);
        assert!(state.executor.memory().is_empty());
        // The transcript still shows the failed exchange.
        assert_eq!(state.transcript.len(), 2);
    }

    #[tokio::test]
    async fn exhausted_outcome_maps_to_overloaded_reply() {
        let (mut state, _builds, _dir) = state_with(Behaviour::RateLimited);

        let (reply, _) = state.run_turn("hello").await;

        assert_eq!(reply, OVERLOADED_REPLY);
        assert!(state.executor.memory().is_empty());
    }

    #[tokio::test]
    async fn start_new_session_clears_transcript_memory_and_cursor() {
        let (mut state, _builds, _dir) = state_with(Behaviour::Answer("reply"));
        let _ = state.run_turn("first question").await;
        assert!(!state.transcript.is_empty());

        state.start_new_session();

        assert!(state.transcript.is_empty());
        assert!(state.executor.memory().is_empty());
        assert_eq!(state.executor.pool().last_good_index(), 0);
    }
}
