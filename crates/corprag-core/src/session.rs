use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;

use crate::state::{ConversationState, UploadState};
use crate::view::{self, View};

/// Owned state of one chat session.
///
/// Cloning is cheap and every clone refers to the same state. Locks are
/// only taken for the duration of a single transition, never across an
/// `.await`.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Shared>,
}

struct Shared {
    conversation: Mutex<ConversationState>,
    upload: Mutex<UploadState>,
    revision: watch::Sender<u64>,
}

// A panic mid-transition leaves plain data behind; keep serving it.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Session {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Shared {
                conversation: Mutex::new(ConversationState::new()),
                upload: Mutex::new(UploadState::default()),
                revision,
            }),
        }
    }

    /// Receiver that observes a new revision after every state change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    pub fn revision(&self) -> u64 {
        *self.inner.revision.borrow()
    }

    /// Project the current state into something renderable.
    pub fn view(&self) -> View {
        let conversation = lock(&self.inner.conversation);
        let upload = lock(&self.inner.upload);
        view::project(&conversation, &upload)
    }

    pub fn conversation<R>(&self, f: impl FnOnce(&ConversationState) -> R) -> R {
        f(&lock(&self.inner.conversation))
    }

    pub fn upload<R>(&self, f: impl FnOnce(&UploadState) -> R) -> R {
        f(&lock(&self.inner.upload))
    }

    /// Edit the text being composed.
    pub fn edit_pending_query<R>(&self, f: impl FnOnce(&mut String) -> R) -> R {
        self.mutate_conversation(|c| f(&mut c.pending_query))
    }

    pub(crate) fn mutate_conversation<R>(&self, f: impl FnOnce(&mut ConversationState) -> R) -> R {
        let result = f(&mut lock(&self.inner.conversation));
        self.notify();
        result
    }

    /// Like `mutate_conversation`, but observers are only told about `Ok`.
    pub(crate) fn try_mutate_conversation<T, E>(
        &self,
        f: impl FnOnce(&mut ConversationState) -> Result<T, E>,
    ) -> Result<T, E> {
        let result = f(&mut lock(&self.inner.conversation));
        if result.is_ok() {
            self.notify();
        }
        result
    }

    pub(crate) fn mutate_upload<R>(&self, f: impl FnOnce(&mut UploadState) -> R) -> R {
        let result = f(&mut lock(&self.inner.upload));
        self.notify();
        result
    }

    pub(crate) fn try_mutate_upload<T, E>(
        &self,
        f: impl FnOnce(&mut UploadState) -> Result<T, E>,
    ) -> Result<T, E> {
        let result = f(&mut lock(&self.inner.upload));
        if result.is_ok() {
            self.notify();
        }
        result
    }

    fn notify(&self) {
        self.inner.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
