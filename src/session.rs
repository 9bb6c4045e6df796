//! In-memory chat session: the loaded table, the transcript, and the in-flight flag.

use crate::client::ClientError;
use crate::control::ControlPanel;
use crate::models::{QueryResponse, UploadResponse};
use chrono::{DateTime, Utc};

/// Transcript text recorded when a query fails.
pub const GENERIC_FAILURE: &str = "Sorry, there was an error processing your request.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Please upload a file first")]
    NoTable,
    #[error("A query is already being processed")]
    Busy,
}

/// The table queries run against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableContext {
    pub table_name: String,
    pub rows_loaded: u64,
}

impl From<UploadResponse> for TableContext {
    fn from(r: UploadResponse) -> Self {
        Self {
            table_name: r.table_name,
            rows_loaded: r.rows_loaded,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Human,
    Agent,
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub id: u64,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    /// Shown above the chart when upstream explains its choice.
    pub visualization_reason: Option<String>,
    /// Present on agent answers that carried chart data.
    pub visualization: Option<ControlPanel>,
}

#[derive(Debug, Default)]
pub struct Session {
    table: Option<TableContext>,
    messages: Vec<ChatMessage>,
    processing: bool,
    next_id: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_table(&mut self, table: TableContext) {
        log::info!(
            "table {} loaded ({} rows)",
            table.table_name,
            table.rows_loaded
        );
        self.table = Some(table);
    }

    pub fn table(&self) -> Option<&TableContext> {
        self.table.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn messages_mut(&mut self) -> &mut [ChatMessage] {
        &mut self.messages
    }

    pub fn is_processing(&self) -> bool {
        self.processing
    }

    /// Record the question and mark the session busy. Returns the table id to query.
    /// Without a table, or while busy, nothing changes.
    pub fn begin_query(&mut self, question: &str) -> Result<String, SessionError> {
        let table_id = self
            .table
            .as_ref()
            .map(|t| t.table_name.clone())
            .ok_or(SessionError::NoTable)?;
        if self.processing {
            return Err(SessionError::Busy);
        }
        self.push(Role::Human, question.to_string(), None, None);
        self.processing = true;
        Ok(table_id)
    }

    /// Record the answer (or the generic failure text) and clear the busy flag.
    pub fn finish_query(&mut self, result: Result<QueryResponse, ClientError>) -> &ChatMessage {
        self.processing = false;
        match result {
            Ok(resp) => {
                let panel = resp
                    .formatted_data_for_visualization
                    .map(|raw| ControlPanel::new(raw, resp.visualization.as_deref()));
                let reason = resp.visualization_reason.filter(|r| !r.trim().is_empty());
                self.push(Role::Agent, resp.answer, reason, panel)
            }
            Err(e) => {
                log::warn!("{e}");
                self.push(Role::Agent, GENERIC_FAILURE.to_string(), None, None)
            }
        }
    }

    fn push(
        &mut self,
        role: Role,
        content: String,
        visualization_reason: Option<String>,
        visualization: Option<ControlPanel>,
    ) -> &ChatMessage {
        self.next_id += 1;
        self.messages.push(ChatMessage {
            id: self.next_id,
            role,
            content,
            created_at: Utc::now(),
            visualization_reason,
            visualization,
        });
        &self.messages[self.messages.len() - 1]
    }
}
