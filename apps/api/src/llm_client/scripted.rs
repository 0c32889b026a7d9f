//! In-memory gateway for tests. Each call pops the next scripted reply and
//! records the turns it was given.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream;

use super::{CompletionGateway, FragmentStream, LlmError};
use crate::interview::models::Turn;

pub enum Scripted {
    /// Streams the fragments in order.
    Reply(Vec<&'static str>),
    /// Streams the fragments, then fails mid-stream.
    FailAfter(Vec<&'static str>),
    /// Fails before any fragment is produced.
    Refuse,
}

#[derive(Default)]
pub struct ScriptedGateway {
    script: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<Vec<Turn>>>,
}

impl ScriptedGateway {
    pub fn new(script: Vec<Scripted>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: Mutex::default(),
        }
    }

    /// Turns passed to each call, oldest first.
    pub fn calls(&self) -> Vec<Vec<Turn>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionGateway for ScriptedGateway {
    async fn stream(&self, turns: &[Turn]) -> Result<FragmentStream, LlmError> {
        self.calls.lock().unwrap().push(turns.to_vec());
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("scripted gateway ran out of replies");

        let items: Vec<Result<String, LlmError>> = match next {
            Scripted::Reply(parts) => parts.into_iter().map(|p| Ok(p.to_string())).collect(),
            Scripted::FailAfter(parts) => parts
                .into_iter()
                .map(|p| Ok(p.to_string()))
                .chain(std::iter::once(Err(LlmError::Stream(
                    "connection reset".to_string(),
                ))))
                .collect(),
            Scripted::Refuse => {
                return Err(LlmError::Api {
                    status: 503,
                    message: "overloaded".to_string(),
                })
            }
        };
        Ok(Box::pin(stream::iter(items)))
    }
}
