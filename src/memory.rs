use std::collections::VecDeque;

/// Maximum number of turns the agent sees as context. Older turns are evicted.
pub const MAX_TURNS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryTurn {
    pub role: Role,
    pub content: String,
}

/// Bounded conversation history shared across agent rebuilds, so rotating
/// credentials mid-session does not lose context. Appended to only after a
/// confirmed successful turn; cleared when a new chat session starts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationMemory {
    turns: VecDeque<MemoryTurn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, role: Role, content: impl Into<String>) {
        if self.turns.len() == MAX_TURNS {
            self.turns.pop_front();
        }
        self.turns.push_back(MemoryTurn {
            role,
            content: content.into(),
        });
    }

    /// Records one completed user/assistant exchange.
    pub fn record_exchange(&mut self, user: &str, assistant: &str) {
        self.push(Role::User, user);
        self.push(Role::Assistant, assistant);
    }

    pub fn turns(&self) -> impl Iterator<Item = &MemoryTurn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn clear(&mut self) {
        self.turns.clear();
    }
}
