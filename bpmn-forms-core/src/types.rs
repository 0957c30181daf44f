use crate::form_schema::FormSchema;
use crate::store::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ─── Scalar aliases ───────────────────────────────────────────

/// Record identifier (random v4).
pub type RecordId = Uuid;

/// UTC wall-clock timestamp, serialized as RFC 3339.
pub type Timestamp = DateTime<Utc>;

// ─── Record kinds ─────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Process,
    Form,
    Integration,
}

impl RecordKind {
    /// Logical key the collection is persisted under.
    pub fn storage_key(&self) -> &'static str {
        match self {
            RecordKind::Process => "bpmnProcesses",
            RecordKind::Form => "dynamicForms",
            RecordKind::Integration => "processFormIntegration",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Process => f.write_str("process"),
            RecordKind::Form => f.write_str("form"),
            RecordKind::Integration => f.write_str("integration"),
        }
    }
}

// ─── Process ──────────────────────────────────────────────────

/// A persisted BPMN diagram with its metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    /// Serialized BPMN 2.0 XML.
    pub xml: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessDraft {
    pub name: String,
    pub description: String,
    pub xml: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProcessPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub xml: Option<String>,
}

impl Record for Process {
    type Draft = ProcessDraft;
    type Patch = ProcessPatch;
    const KIND: RecordKind = RecordKind::Process;

    fn id(&self) -> RecordId {
        self.id
    }

    fn create(id: RecordId, draft: ProcessDraft, now: Timestamp) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            xml: draft.xml,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: ProcessPatch, now: Timestamp) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(xml) = patch.xml {
            self.xml = xml;
        }
        self.updated_at = now.max(self.updated_at);
    }
}

// ─── Form ─────────────────────────────────────────────────────

/// A persisted dynamic-form definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    pub schema: FormSchema,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FormDraft {
    pub name: String,
    pub description: String,
    pub schema: FormSchema,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FormPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub schema: Option<FormSchema>,
}

impl Record for Form {
    type Draft = FormDraft;
    type Patch = FormPatch;
    const KIND: RecordKind = RecordKind::Form;

    fn id(&self) -> RecordId {
        self.id
    }

    fn create(id: RecordId, draft: FormDraft, now: Timestamp) -> Self {
        Self {
            id,
            name: draft.name,
            description: draft.description,
            schema: draft.schema,
            created_at: now,
            updated_at: now,
        }
    }

    fn apply(&mut self, patch: FormPatch, now: Timestamp) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(schema) = patch.schema {
            self.schema = schema;
        }
        self.updated_at = now.max(self.updated_at);
    }
}

// ─── Integration ──────────────────────────────────────────────

/// Link between one process task and one form.
///
/// `task_id` is absent on records written before links were task-scoped;
/// such records still deserialize and are treated as process-wide.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Integration {
    pub id: RecordId,
    pub process_id: RecordId,
    pub form_id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Display name of the task at link time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    pub created_at: Timestamp,
}

impl Integration {
    pub fn references(&self, id: RecordId) -> bool {
        self.process_id == id || self.form_id == id
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct IntegrationDraft {
    pub process_id: RecordId,
    pub form_id: RecordId,
    pub task_id: Option<String>,
    pub task_name: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntegrationPatch {
    pub process_id: Option<RecordId>,
    pub form_id: Option<RecordId>,
    pub task_id: Option<String>,
    pub task_name: Option<String>,
}

impl Record for Integration {
    type Draft = IntegrationDraft;
    type Patch = IntegrationPatch;
    const KIND: RecordKind = RecordKind::Integration;

    fn id(&self) -> RecordId {
        self.id
    }

    fn create(id: RecordId, draft: IntegrationDraft, now: Timestamp) -> Self {
        Self {
            id,
            process_id: draft.process_id,
            form_id: draft.form_id,
            task_id: draft.task_id,
            task_name: draft.task_name,
            created_at: now,
        }
    }

    // Integrations carry no updated timestamp.
    fn apply(&mut self, patch: IntegrationPatch, _now: Timestamp) {
        if let Some(process_id) = patch.process_id {
            self.process_id = process_id;
        }
        if let Some(form_id) = patch.form_id {
            self.form_id = form_id;
        }
        if let Some(task_id) = patch.task_id {
            self.task_id = Some(task_id);
        }
        if let Some(task_name) = patch.task_name {
            self.task_name = Some(task_name);
        }
    }
}

// ─── Read models ──────────────────────────────────────────────

/// An integration joined with the names of what it references.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationView {
    pub integration: Integration,
    pub process_name: String,
    pub form_name: String,
    /// False when the process id no longer resolves.
    pub process_known: bool,
    pub form_known: bool,
}

/// Collection counts shown on the dashboard.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub processes: usize,
    pub forms: usize,
    pub integrations: usize,
}
