use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of trailing messages rendered by [`Session::conversation_context`] by default.
pub const DEFAULT_CONTEXT_MESSAGES: usize = 10;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Retriever,
    Synthesizer,
    Critic,
}

impl Role {
    /// The three agent roles, in pipeline order.
    pub const AGENTS: [Role; 3] = [Role::Retriever, Role::Synthesizer, Role::Critic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Retriever => "retriever",
            Role::Synthesizer => "synthesizer",
            Role::Critic => "critic",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "retriever" => Ok(Role::Retriever),
            "synthesizer" | "synthesiser" => Ok(Role::Synthesizer),
            "critic" => Ok(Role::Critic),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// A critic quality rating, always within `1..=10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Score(u8);

impl Score {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 10;

    /// Returns `None` when `value` is outside `1..=10`.
    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Self(value))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Score {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Score::new(value).ok_or_else(|| format!("score {} is outside 1-10", value))
    }
}

impl From<Score> for u8 {
    fn from(score: Score) -> Self {
        score.0
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/10", self.0)
    }
}

/// A single unit of communication between pipeline stages.
///
/// Messages are immutable once built; sessions only ever append them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: Uuid,
    role: Role,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    score: Option<Score>,
    timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            score: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// A critic message carrying its extracted score
    pub fn critique(content: impl Into<String>, score: Score) -> Self {
        Self {
            score: Some(score),
            ..Self::new(Role::Critic, content)
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn score(&self) -> Option<Score> {
        self.score
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// One-line rendering used when a conversation is replayed into a prompt
    pub fn to_prompt_context(&self) -> String {
        format!("[{}]: {}", self.role, self.content)
    }
}

/// Ordered messages produced while answering one query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    id: Uuid,
    messages: Vec<Message>,
}

impl Session {
    /// Start a session seeded with the user's query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            messages: vec![Message::user(query)],
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// The original user query
    pub fn query(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// Most recent message from `role`
    pub fn latest(&self, role: Role) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == role)
    }

    pub fn count(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }

    /// Render the last `limit` messages as prompt context
    pub fn conversation_context(&self, limit: usize) -> String {
        if self.messages.is_empty() {
            return "No previous conversation.".to_string();
        }

        let start = self.messages.len().saturating_sub(limit);
        let mut context = String::from("Previous conversation:\n");
        for message in &self.messages[start..] {
            context.push_str(&message.to_prompt_context());
            context.push('\n');
        }
        context
    }
}
