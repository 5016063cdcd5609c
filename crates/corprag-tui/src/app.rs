use std::path::Path;
use std::sync::Arc;
use ratatui::layout::Rect;
use corprag_core::{
    is_supported_document, RagBackend, RequestCoordinator, Session, UploadCoordinator,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
    /// Typing the path of a document to upload
    Upload,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,

    // Composer cursor (the composed text itself lives in the session)
    pub query_cursor: usize,

    // Upload prompt
    pub upload_input: String,
    pub upload_cursor: usize,

    // Chat scrolling
    pub chat_scroll: u16,
    pub chat_height: u16, // Height of chat area for scroll calculations
    pub chat_width: u16,  // Width of chat area for wrap calculations
    pub follow_tail: bool,

    // One-line message shown above the footer
    pub notice: Option<String>,

    // Panel area for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,

    pub server_url: String,
    pub session: Session,
    pub questions: RequestCoordinator,
    pub uploads: UploadCoordinator,
}

impl App {
    pub fn new(server_url: String, backend: Arc<dyn RagBackend>) -> Self {
        let session = Session::new();
        let questions = RequestCoordinator::new(session.clone(), backend.clone());
        let uploads = UploadCoordinator::new(session.clone(), backend);

        Self {
            should_quit: false,
            input_mode: InputMode::Normal,

            query_cursor: 0,

            upload_input: String::new(),
            upload_cursor: 0,

            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            follow_tail: true,

            notice: None,
            chat_area: None,

            server_url,
            session,
            questions,
            uploads,
        }
    }

    /// Send the composed question. The user's turn shows up at once; the
    /// answer is applied by a background task.
    pub fn submit_question(&mut self) {
        match self.questions.begin_pending() {
            Ok(pending) => {
                self.query_cursor = 0;
                self.notice = None;
                self.follow_tail = true;
                tokio::spawn(pending.resolve());
            }
            Err(reason) => {
                tracing::debug!(%reason, "nothing submitted");
            }
        }
    }

    /// Upload the document named in the upload prompt and close the prompt.
    pub fn submit_upload(&mut self) {
        let raw = std::mem::take(&mut self.upload_input);
        self.upload_cursor = 0;
        self.input_mode = InputMode::Normal;

        let trimmed = raw.trim();
        let path = (!trimmed.is_empty()).then(|| Path::new(trimmed));

        if let Some(path) = path {
            if !is_supported_document(path) {
                self.notice = Some("Only .pdf, .docx and .txt documents can be uploaded".to_string());
                return;
            }
        }

        match self.uploads.begin_path(path) {
            Ok(pending) => {
                self.notice = None;
                tokio::spawn(pending.resolve());
            }
            Err(reason) => {
                tracing::debug!(%reason, "nothing uploaded");
            }
        }
    }

    /// Close the upload prompt without sending anything.
    pub fn dismiss_upload(&mut self) {
        self.upload_input.clear();
        self.upload_cursor = 0;
        self.input_mode = InputMode::Normal;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines);
        self.follow_tail = false;
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = false;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.follow_tail = true;
    }

    /// Clamp the scroll position to the rendered content, pinning it to the
    /// bottom while following the conversation.
    pub fn settle_scroll(&mut self, total_lines: u16) {
        let visible_height = if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        };
        let max_scroll = total_lines.saturating_sub(visible_height);

        if self.follow_tail || self.chat_scroll >= max_scroll {
            self.chat_scroll = max_scroll;
            self.follow_tail = true;
        }
    }
}
