use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{MoveOracle, OracleRequest};

/// Canned oracle behaviour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptedReply {
    /// Reply with this text verbatim.
    Text(String),
    /// Fail as a broken service would.
    Fail(String),
    /// Never answer.
    Stall,
}

/// Oracle that plays back a fixed script and records every request it sees.
/// Once the script runs out every call fails.
pub struct ScriptedOracle {
    replies: VecDeque<ScriptedReply>,
    seen: Arc<Mutex<Vec<OracleRequest>>>,
}

impl ScriptedOracle {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = ScriptedReply>,
    {
        Self {
            replies: replies.into_iter().collect(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Script of plain text replies.
    pub fn texts<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(replies.into_iter().map(|s| ScriptedReply::Text(s.into())))
    }

    /// Shared handle on the requests received so far.
    pub fn requests(&self) -> Arc<Mutex<Vec<OracleRequest>>> {
        self.seen.clone()
    }
}

#[async_trait]
impl MoveOracle for ScriptedOracle {
    async fn suggest(&mut self, request: &OracleRequest) -> anyhow::Result<String> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }
        match self.replies.pop_front() {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Fail(reason)) => Err(anyhow::anyhow!(reason)),
            Some(ScriptedReply::Stall) => std::future::pending().await,
            None => Err(anyhow::anyhow!("Script exhausted")),
        }
    }
}
