//! Read-only projection of session state for rendering

use crate::state::{ChatMessage, ConversationState, UploadState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEntry {
    Message(ChatMessage),
    /// Placeholder turn shown while an answer is outstanding
    Loading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub entries: Vec<ViewEntry>,
    pub pending_query: String,
    pub awaiting_answer: bool,
    pub can_submit: bool,
    pub upload_status: String,
    pub knowledge_base: Vec<String>,
}

pub fn project(conversation: &ConversationState, upload: &UploadState) -> View {
    let mut entries: Vec<ViewEntry> = conversation
        .messages()
        .iter()
        .cloned()
        .map(ViewEntry::Message)
        .collect();

    let awaiting_answer = conversation.is_awaiting_answer();
    if awaiting_answer {
        entries.push(ViewEntry::Loading);
    }

    let pending_query = conversation.pending_query().to_string();
    let can_submit = !awaiting_answer && !pending_query.trim().is_empty();

    View {
        entries,
        pending_query,
        awaiting_answer,
        can_submit,
        upload_status: upload.status_text(),
        knowledge_base: upload.ingested().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{ChatRole, UploadStatus};

    #[test]
    fn test_loading_entry_trails_messages() {
        let mut conversation = ConversationState::new();
        conversation.log.append(ChatRole::User, "Where is the handbook?");
        conversation.awaiting_answer = true;

        let view = project(&conversation, &UploadState::default());

        assert_eq!(view.entries.len(), 3);
        assert_eq!(view.entries.last(), Some(&ViewEntry::Loading));
        assert!(!view.can_submit);
    }

    #[test]
    fn test_no_loading_entry_when_idle() {
        let conversation = ConversationState::new();
        let view = project(&conversation, &UploadState::default());

        assert!(view.entries.iter().all(|e| matches!(e, ViewEntry::Message(_))));
        assert_eq!(view.upload_status, "");
    }

    #[test]
    fn test_can_submit_needs_text() {
        let mut conversation = ConversationState::new();
        conversation.pending_query = "   ".to_string();
        assert!(!project(&conversation, &UploadState::default()).can_submit);

        conversation.pending_query = "PTO policy?".to_string();
        assert!(project(&conversation, &UploadState::default()).can_submit);
    }

    #[test]
    fn test_upload_fields_projected() {
        let upload = UploadState {
            status: UploadStatus::Ingested("b.docx".to_string()),
            ingested: vec!["a.pdf".to_string(), "b.docx".to_string()],
        };

        let view = project(&ConversationState::new(), &upload);

        assert_eq!(view.upload_status, "ingested: b.docx");
        assert_eq!(view.knowledge_base, vec!["a.pdf", "b.docx"]);
    }
}
