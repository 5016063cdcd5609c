use std::future::Future;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::client::RagBackend;
use crate::error::Ignored;
use crate::session::Session;
use crate::state::{ChatRole, ConversationState, FALLBACK_ANSWER};

/// How an accepted question ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Answered,
    FellBack,
}

/// Issues questions to the backend, one at a time.
#[derive(Clone)]
pub struct RequestCoordinator {
    session: Session,
    backend: Arc<dyn RagBackend>,
}

impl RequestCoordinator {
    pub fn new(session: Session, backend: Arc<dyn RagBackend>) -> Self {
        Self { session, backend }
    }

    /// Record `text` as the user's turn and mark the session as awaiting an
    /// answer. Nothing is sent until the returned question is resolved.
    pub fn begin(&self, text: &str) -> Result<PendingQuestion, Ignored> {
        self.begin_with(|_| text.to_string())
    }

    /// Same as [`begin`](Self::begin) with the text currently being composed.
    pub fn begin_pending(&self) -> Result<PendingQuestion, Ignored> {
        self.begin_with(|c| c.pending_query.clone())
    }

    /// Begin, then resolve. The user's turn is recorded before this returns;
    /// the future only covers the network call and the reply.
    pub fn submit_question(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Resolution, Ignored>> + Send + 'static {
        let pending = self.begin(text);
        async move { Ok(pending?.resolve().await) }
    }

    fn begin_with(
        &self,
        pick: impl FnOnce(&ConversationState) -> String,
    ) -> Result<PendingQuestion, Ignored> {
        let accepted = self.session.try_mutate_conversation(|c| {
            let query = pick(c);
            if query.trim().is_empty() {
                return Err(Ignored::EmptyInput);
            }
            if c.awaiting_answer {
                return Err(Ignored::InFlight);
            }

            c.log.append(ChatRole::User, query.clone());
            c.pending_query.clear();
            c.awaiting_answer = true;
            Ok(query)
        });

        match accepted {
            Ok(query) => {
                debug!(chars = query.chars().count(), "question accepted");
                Ok(PendingQuestion {
                    query,
                    backend: self.backend.clone(),
                    guard: AwaitingGuard {
                        session: Some(self.session.clone()),
                    },
                })
            }
            Err(reason) => {
                debug!(%reason, "question ignored");
                Err(reason)
            }
        }
    }
}

/// A question whose user turn is in the log and whose answer is outstanding.
pub struct PendingQuestion {
    query: String,
    backend: Arc<dyn RagBackend>,
    guard: AwaitingGuard,
}

impl PendingQuestion {
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Send the question and append the reply, or the fallback apology when
    /// anything goes wrong.
    pub async fn resolve(self) -> Resolution {
        let (reply, resolution) = match self.backend.ask(&self.query).await {
            Ok(answer) => {
                info!(chars = answer.chars().count(), "answer received");
                (answer, Resolution::Answered)
            }
            Err(e) => {
                warn!(error = %e, "question failed");
                (FALLBACK_ANSWER.to_string(), Resolution::FellBack)
            }
        };

        self.guard.finish(|c| {
            c.log.append(ChatRole::Assistant, reply);
        });
        resolution
    }
}

/// Clears `awaiting_answer` when dropped, so a panicking or abandoned
/// question still frees the session for the next one.
struct AwaitingGuard {
    session: Option<Session>,
}

impl AwaitingGuard {
    /// Apply the closing transition and release in the same step.
    fn finish(mut self, f: impl FnOnce(&mut ConversationState)) {
        if let Some(session) = self.session.take() {
            session.mutate_conversation(|c| {
                f(c);
                c.awaiting_answer = false;
            });
        }
    }
}

impl Drop for AwaitingGuard {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            warn!("question dropped before it resolved");
            session.mutate_conversation(|c| c.awaiting_answer = false);
        }
    }
}
