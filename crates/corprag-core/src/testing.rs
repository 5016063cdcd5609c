//! Fake backend for coordinator tests
//!
//! Calls either resolve immediately from a scripted reply or park on a
//! oneshot channel until the test releases them, which lets tests decide the
//! order in which concurrent calls finish.

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio::sync::{oneshot, Notify};

use crate::client::RagBackend;
use crate::error::ServiceError;
use crate::upload::UploadFile;

type AskReply = Result<String, ServiceError>;
type IngestReply = Result<(), ServiceError>;

#[derive(Clone)]
enum AskScript {
    Answer(String),
    Fail,
}

#[derive(Default)]
pub(crate) struct GatedBackend {
    ask_script: Mutex<Option<AskScript>>,
    accept_uploads: Mutex<Option<bool>>,
    parked_asks: Mutex<VecDeque<oneshot::Sender<AskReply>>>,
    parked_ingests: Mutex<VecDeque<oneshot::Sender<IngestReply>>>,
    arrived: Notify,
    ask_calls: AtomicUsize,
    ingest_calls: AtomicUsize,
    last_query: Mutex<Option<String>>,
    last_upload: Mutex<Option<UploadFile>>,
}

/// What the service looks like when a proxy in front of it is down.
fn gateway_failure() -> ServiceError {
    ServiceError::Rejected(StatusCode::BAD_GATEWAY)
}

impl GatedBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_answer(self, answer: &str) -> Self {
        *self.ask_script.lock().unwrap() = Some(AskScript::Answer(answer.to_string()));
        self
    }

    pub(crate) fn with_failure(self) -> Self {
        *self.ask_script.lock().unwrap() = Some(AskScript::Fail);
        self
    }

    pub(crate) fn accepting_uploads(self) -> Self {
        self.set_accept_uploads(true);
        self
    }

    pub(crate) fn rejecting_uploads(self) -> Self {
        self.set_accept_uploads(false);
        self
    }

    pub(crate) fn set_accept_uploads(&self, accept: bool) {
        *self.accept_uploads.lock().unwrap() = Some(accept);
    }

    pub(crate) fn ask_calls(&self) -> usize {
        self.ask_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn ingest_calls(&self) -> usize {
        self.ingest_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_query(&self) -> Option<String> {
        self.last_query.lock().unwrap().clone()
    }

    pub(crate) fn last_upload(&self) -> Option<UploadFile> {
        self.last_upload.lock().unwrap().clone()
    }

    pub(crate) async fn wait_for_ask(&self) {
        loop {
            let arrived = self.arrived.notified();
            if !self.parked_asks.lock().unwrap().is_empty() {
                return;
            }
            arrived.await;
        }
    }

    pub(crate) async fn wait_for_ingest(&self) {
        loop {
            let arrived = self.arrived.notified();
            if !self.parked_ingests.lock().unwrap().is_empty() {
                return;
            }
            arrived.await;
        }
    }

    pub(crate) fn answer(&self, answer: &str) {
        self.release_ask(Ok(answer.to_string()));
    }

    pub(crate) fn fail_ask(&self) {
        self.release_ask(Err(gateway_failure()));
    }

    pub(crate) fn accept_ingest(&self) {
        self.release_ingest(Ok(()));
    }

    pub(crate) fn reject_ingest(&self) {
        self.release_ingest(Err(ServiceError::Rejected(StatusCode::INTERNAL_SERVER_ERROR)));
    }

    fn release_ask(&self, reply: AskReply) {
        let parked = self.parked_asks.lock().unwrap().pop_front();
        let _ = parked.expect("no question is parked").send(reply);
    }

    fn release_ingest(&self, reply: IngestReply) {
        let parked = self.parked_ingests.lock().unwrap().pop_front();
        let _ = parked.expect("no upload is parked").send(reply);
    }
}

#[async_trait]
impl RagBackend for GatedBackend {
    async fn ask(&self, query: &str) -> Result<String, ServiceError> {
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.to_string());

        let script = self.ask_script.lock().unwrap().clone();
        match script {
            Some(AskScript::Answer(answer)) => return Ok(answer),
            Some(AskScript::Fail) => return Err(gateway_failure()),
            None => {}
        }

        let (tx, rx) = oneshot::channel();
        self.parked_asks.lock().unwrap().push_back(tx);
        self.arrived.notify_waiters();
        rx.await
            .unwrap_or_else(|_| Err(ServiceError::Malformed("reply dropped".to_string())))
    }

    async fn ingest(&self, file: &UploadFile) -> Result<(), ServiceError> {
        self.ingest_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_upload.lock().unwrap() = Some(file.clone());

        let accept = *self.accept_uploads.lock().unwrap();
        match accept {
            Some(true) => return Ok(()),
            Some(false) => {
                return Err(ServiceError::Rejected(StatusCode::INTERNAL_SERVER_ERROR));
            }
            None => {}
        }

        let (tx, rx) = oneshot::channel();
        self.parked_ingests.lock().unwrap().push_back(tx);
        self.arrived.notify_waiters();
        rx.await
            .unwrap_or_else(|_| Err(ServiceError::Malformed("reply dropped".to_string())))
    }
}
