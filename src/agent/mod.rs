pub mod capability;
pub mod prompt;
pub mod session;

pub use capability::Capability;
pub use session::{AgentSession, GeminiSessionFactory};
