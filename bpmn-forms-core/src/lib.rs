//! BPMN Forms core
//!
//! Record stores for processes, forms and process-to-form integrations, a
//! user-task extractor over diagram documents, and the linker that ties a
//! process task to a form.
//!
//! # Architecture
//!
//! ```text
//! StudioConfig ──► Studio ──┬── RecordStore<Process>      (MemoryStore | JsonFileStore)
//!                           ├── RecordStore<Form>
//!                           └── RecordStore<Integration>
//!
//! LinkSession ──► DiagramCanvas ──► DiagramDocument::user_tasks()
//!      │
//!      └── submit ──► Studio::link / Studio::relink (LinkPolicy upsert)
//! ```

pub mod cascade;
pub mod config;
pub mod defaults;
pub mod diagram;
pub mod error;
pub mod form_schema;
pub mod linker;
pub mod store;
pub mod store_json;
pub mod store_memory;
pub mod studio;
pub mod types;
pub mod validation;
pub mod widget;

pub use cascade::CascadeReport;
pub use config::{Backend, LinkPolicy, StudioConfig};
pub use diagram::{extract_user_tasks, DiagramDocument, ProcessTask, TaskSelection};
pub use error::{Result, StudioError};
pub use form_schema::FormSchema;
pub use linker::{EditMode, LinkPhase, LinkSession, SubmitBlocker};
pub use store::{Latency, Record, RecordStore};
pub use store_json::JsonFileStore;
pub use store_memory::MemoryStore;
pub use studio::Studio;
pub use types::{
    DashboardSummary, Form, FormDraft, FormPatch, Integration, IntegrationDraft, IntegrationPatch,
    IntegrationView, Process, ProcessDraft, ProcessPatch, RecordId, RecordKind,
};
