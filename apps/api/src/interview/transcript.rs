//! Append-only conversation log for one interview session.

use serde::Serialize;

use crate::interview::models::{Role, Turn, TurnKind};

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// The only way turns enter the log. Nothing is ever removed or edited.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Turns the candidate may see, in order. The setup prompt is excluded.
    pub fn visible(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter().filter(|t| !t.is_hidden())
    }

    /// Number of questions the model has asked so far. The summary reply is
    /// not a question and is not counted.
    pub fn assistant_question_count(&self) -> usize {
        self.assistant_questions().count()
    }

    pub fn assistant_questions(&self) -> impl Iterator<Item = &str> {
        self.turns
            .iter()
            .filter(|t| t.role == Role::Assistant && t.kind != TurnKind::Summary)
            .map(|t| t.content.as_str())
    }

    pub fn has_summary(&self) -> bool {
        self.turns.iter().any(|t| t.kind == TurnKind::Summary)
    }
}
