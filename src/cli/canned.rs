//! Canned-response shortcuts handled before the agent is ever invoked. Exact
//! case-insensitive matches only; no credential is consumed by these.

pub const GOODBYE_TEXT: &str = "Goodbye! We look forward to helping you again.";

pub const HELP_TEXT: &str = "I can help with:\n\
• Analyzing engine complaints\n\
• Scheduling services or asking about maintenance\n\
• Assessing accident damage\n\
• Answering routine service questions\n\
• Providing our contact information\n\
How can I assist you?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedReply {
    Goodbye,
    Help,
}

impl CannedReply {
    pub fn text(self) -> &'static str {
        match self {
            Self::Goodbye => GOODBYE_TEXT,
            Self::Help => HELP_TEXT,
        }
    }
}

pub fn match_canned(line: &str) -> Option<CannedReply> {
    let trimmed = line.trim();
    if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
        Some(CannedReply::Goodbye)
    } else if trimmed.eq_ignore_ascii_case("help") {
        Some(CannedReply::Help)
    } else {
        None
    }
}
