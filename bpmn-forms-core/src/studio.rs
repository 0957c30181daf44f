//! The repository object every caller goes through.
//!
//! A `Studio` is built once (per process lifetime, or per test) and owns the
//! three collections. It validates input before any store call, normalizes
//! diagram documents, runs the cascade deletes and enforces the configured
//! [`LinkPolicy`] when integrations are written.

use crate::cascade::{delete_form_cascade, delete_process_cascade, CascadeReport};
use crate::config::{Backend, LinkPolicy, StudioConfig};
use crate::defaults::{default_form_draft, default_process_draft, DEFAULT_FORM_NAME, DEFAULT_PROCESS_NAME};
use crate::diagram::{extract_user_tasks, normalize_diagram_xml, ProcessTask};
use crate::error::{Result, StudioError};
use crate::form_schema::FormSchema;
use crate::store::{Latency, Record, RecordStore, SeedFn};
use crate::store_json::JsonFileStore;
use crate::store_memory::MemoryStore;
use crate::types::*;
use crate::validation::{ensure_valid, validate_link, validate_metadata};
use crate::widget::{with_widget, FormCanvas};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const UNKNOWN_PROCESS: &str = "Unknown Process";
pub const UNKNOWN_FORM: &str = "Unknown Form";

pub struct Studio {
    processes: Arc<dyn RecordStore<Process>>,
    forms: Arc<dyn RecordStore<Form>>,
    integrations: Arc<dyn RecordStore<Integration>>,
    link_policy: LinkPolicy,
    /// Cleared once the default link has been considered successfully.
    seed_link_pending: Mutex<bool>,
}

fn build_store<R: Record>(
    config: &StudioConfig,
    seed: Option<SeedFn<R>>,
) -> Arc<dyn RecordStore<R>> {
    let latency = Latency::from(config.latency);
    match &config.backend {
        Backend::Memory => {
            let mut store = MemoryStore::<R>::new().with_latency(latency);
            if let Some(seed) = seed {
                store = store.with_seed(seed);
            }
            Arc::new(store)
        }
        Backend::JsonFile { dir } => {
            let mut store = JsonFileStore::<R>::new(dir).with_latency(latency);
            if let Some(seed) = seed {
                store = store.with_seed(seed);
            }
            Arc::new(store)
        }
    }
}

impl Studio {
    /// Wire explicit stores. No default link is seeded.
    pub fn new(
        processes: Arc<dyn RecordStore<Process>>,
        forms: Arc<dyn RecordStore<Form>>,
        integrations: Arc<dyn RecordStore<Integration>>,
        link_policy: LinkPolicy,
    ) -> Self {
        Self {
            processes,
            forms,
            integrations,
            link_policy,
            seed_link_pending: Mutex::new(false),
        }
    }

    /// Build stores for the configured backend.
    pub fn open(config: &StudioConfig) -> Self {
        let mut process_seed: Option<SeedFn<Process>> = None;
        let mut form_seed: Option<SeedFn<Form>> = None;
        if config.seed_defaults {
            process_seed = Some(Arc::new(default_process_draft));
            form_seed = Some(Arc::new(default_form_draft));
        }

        tracing::info!(backend = ?config.backend, link_policy = ?config.link_policy, "opening studio");
        Self::new(
            build_store(config, process_seed),
            build_store(config, form_seed),
            build_store::<Integration>(config, None),
            config.link_policy,
        )
        .with_default_link(config.seed_defaults)
    }

    /// Link the default process to the default form on the first listing,
    /// provided the integration collection has never been written.
    pub fn with_default_link(self, enabled: bool) -> Self {
        Self {
            seed_link_pending: Mutex::new(enabled),
            ..self
        }
    }

    /// Fresh in-memory studio with default seeds and no latency.
    pub fn in_memory() -> Self {
        Self::open(&StudioConfig::default())
    }

    pub fn link_policy(&self) -> LinkPolicy {
        self.link_policy
    }

    // ── Processes ──

    pub async fn list_processes(&self) -> Result<Vec<Process>> {
        self.processes.list().await
    }

    pub async fn get_process(&self, id: RecordId) -> Result<Process> {
        self.processes.get(id).await
    }

    pub async fn create_process(&self, mut draft: ProcessDraft) -> Result<Process> {
        ensure_valid(validate_metadata(
            Some(&draft.name),
            Some(&draft.description),
        ))?;
        draft.xml = normalize_diagram_xml(&draft.xml);
        let process = self.processes.create(draft).await?;
        tracing::info!(id = %process.id, name = %process.name, "process created");
        Ok(process)
    }

    pub async fn update_process(&self, id: RecordId, mut patch: ProcessPatch) -> Result<Process> {
        ensure_valid(validate_metadata(
            patch.name.as_deref(),
            patch.description.as_deref(),
        ))?;
        if let Some(xml) = patch.xml.take() {
            patch.xml = Some(normalize_diagram_xml(&xml));
        }
        let process = self.processes.update(id, patch).await?;
        tracing::info!(id = %id, "process updated");
        Ok(process)
    }

    pub async fn delete_process(&self, id: RecordId) -> Result<CascadeReport> {
        delete_process_cascade(self.processes.as_ref(), self.integrations.as_ref(), id).await
    }

    /// User tasks of a stored process.
    pub async fn process_tasks(&self, id: RecordId) -> Result<Vec<ProcessTask>> {
        let process = self.processes.get(id).await?;
        Ok(extract_user_tasks(&process.xml))
    }

    // ── Forms ──

    pub async fn list_forms(&self) -> Result<Vec<Form>> {
        self.forms.list().await
    }

    pub async fn get_form(&self, id: RecordId) -> Result<Form> {
        self.forms.get(id).await
    }

    pub async fn create_form(&self, draft: FormDraft) -> Result<Form> {
        ensure_valid(validate_metadata(
            Some(&draft.name),
            Some(&draft.description),
        ))?;
        let form = self.forms.create(draft).await?;
        tracing::info!(id = %form.id, name = %form.name, "form created");
        Ok(form)
    }

    pub async fn update_form(&self, id: RecordId, patch: FormPatch) -> Result<Form> {
        ensure_valid(validate_metadata(
            patch.name.as_deref(),
            patch.description.as_deref(),
        ))?;
        let form = self.forms.update(id, patch).await?;
        tracing::info!(id = %id, "form updated");
        Ok(form)
    }

    /// Create a form from form-editor JSON. Text that is not JSON stores the
    /// default schema, as the editor would show it.
    pub async fn create_form_from_json(
        &self,
        name: &str,
        description: &str,
        schema_json: &str,
    ) -> Result<Form> {
        let schema = import_form_schema(schema_json)?;
        self.create_form(FormDraft {
            name: name.to_string(),
            description: description.to_string(),
            schema,
        })
        .await
    }

    /// Replace a form's schema with form-editor JSON.
    pub async fn update_form_schema_json(&self, id: RecordId, schema_json: &str) -> Result<Form> {
        let schema = import_form_schema(schema_json)?;
        self.update_form(
            id,
            FormPatch {
                schema: Some(schema),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete_form(&self, id: RecordId) -> Result<CascadeReport> {
        delete_form_cascade(self.forms.as_ref(), self.integrations.as_ref(), id).await
    }

    // ── Integrations ──

    pub async fn list_integrations(&self) -> Result<Vec<Integration>> {
        {
            let mut pending = self.seed_link_pending.lock().await;
            if *pending {
                self.seed_default_link().await?;
                *pending = false;
            }
        }
        self.integrations.list().await
    }

    pub async fn get_integration(&self, id: RecordId) -> Result<Integration> {
        self.integrations.get(id).await
    }

    /// Raw create. Prefer [`Studio::link`], which enforces the link policy.
    pub async fn create_integration(&self, draft: IntegrationDraft) -> Result<Integration> {
        let integration = self.integrations.create(draft).await?;
        tracing::info!(id = %integration.id, "integration created");
        Ok(integration)
    }

    pub async fn update_integration(
        &self,
        id: RecordId,
        patch: IntegrationPatch,
    ) -> Result<Integration> {
        let integration = self.integrations.update(id, patch).await?;
        tracing::info!(id = %id, "integration updated");
        Ok(integration)
    }

    pub async fn delete_integration(&self, id: RecordId) -> Result<()> {
        self.integrations.delete(id).await?;
        tracing::info!(id = %id, "integration deleted");
        Ok(())
    }

    pub async fn integrations_for_process(&self, process_id: RecordId) -> Result<Vec<Integration>> {
        Ok(self
            .list_integrations()
            .await?
            .into_iter()
            .filter(|i| i.process_id == process_id)
            .collect())
    }

    /// Link `task_id` of a process to a form, creating or replacing the
    /// integration that occupies the same slot under the link policy.
    pub async fn link(
        &self,
        process_id: RecordId,
        task_id: &str,
        form_id: RecordId,
    ) -> Result<Integration> {
        let task = self.resolve_link(process_id, task_id, form_id).await?;
        let existing = self.slot_occupants(process_id, &task.id, None).await?;

        let integration = match existing.split_first() {
            Some((keep, extra)) => {
                self.remove_all(extra).await?;
                self.integrations
                    .update(keep.id, link_patch(process_id, &task, form_id))
                    .await?
            }
            None => {
                self.integrations
                    .create(IntegrationDraft {
                        process_id,
                        form_id,
                        task_id: Some(task.id.clone()),
                        task_name: Some(task.label.clone()),
                    })
                    .await?
            }
        };
        tracing::info!(
            id = %integration.id,
            process_id = %process_id,
            task_id = %task.id,
            form_id = %form_id,
            "process task linked to form"
        );
        Ok(integration)
    }

    /// Rewrite an existing integration, evicting any other integration that
    /// would then occupy the same slot.
    pub async fn relink(
        &self,
        id: RecordId,
        process_id: RecordId,
        task_id: &str,
        form_id: RecordId,
    ) -> Result<Integration> {
        self.integrations.get(id).await?;
        let task = self.resolve_link(process_id, task_id, form_id).await?;
        let others = self.slot_occupants(process_id, &task.id, Some(id)).await?;
        self.remove_all(&others).await?;
        let integration = self
            .integrations
            .update(id, link_patch(process_id, &task, form_id))
            .await?;
        tracing::info!(id = %id, process_id = %process_id, task_id = %task.id, "integration relinked");
        Ok(integration)
    }

    async fn resolve_link(
        &self,
        process_id: RecordId,
        task_id: &str,
        form_id: RecordId,
    ) -> Result<ProcessTask> {
        ensure_valid(validate_link(Some(process_id), Some(task_id), Some(form_id)))?;
        let process = self.processes.get(process_id).await?;
        self.forms.get(form_id).await?;
        extract_user_tasks(&process.xml)
            .into_iter()
            .find(|t| t.id == task_id)
            .ok_or_else(|| StudioError::UnknownTask {
                process_id,
                task_id: task_id.to_string(),
            })
    }

    async fn slot_occupants(
        &self,
        process_id: RecordId,
        task_id: &str,
        except: Option<RecordId>,
    ) -> Result<Vec<Integration>> {
        let policy = self.link_policy;
        Ok(self
            .integrations
            .list()
            .await?
            .into_iter()
            .filter(|i| Some(i.id) != except && i.process_id == process_id)
            .filter(|i| match policy {
                LinkPolicy::PerProcess => true,
                LinkPolicy::PerTask => i.task_id.as_deref() == Some(task_id),
            })
            .collect())
    }

    async fn remove_all(&self, integrations: &[Integration]) -> Result<()> {
        for i in integrations {
            tracing::info!(id = %i.id, process_id = %i.process_id, "replacing integration for the same slot");
            self.integrations.delete(i.id).await?;
        }
        Ok(())
    }

    async fn seed_default_link(&self) -> Result<()> {
        if !self.integrations.is_pristine().await? {
            return Ok(());
        }
        let process = self
            .processes
            .list()
            .await?
            .into_iter()
            .find(|p| p.name == DEFAULT_PROCESS_NAME);
        let form = self
            .forms
            .list()
            .await?
            .into_iter()
            .find(|f| f.name == DEFAULT_FORM_NAME);
        let (Some(process), Some(form)) = (process, form) else {
            return Ok(());
        };
        let Some(task) = extract_user_tasks(&process.xml).into_iter().next() else {
            return Ok(());
        };
        tracing::warn!(process_id = %process.id, form_id = %form.id, "integration collection never written, seeding default link");
        self.integrations
            .create(IntegrationDraft {
                process_id: process.id,
                form_id: form.id,
                task_id: Some(task.id),
                task_name: Some(task.label),
            })
            .await?;
        Ok(())
    }

    // ── Read models ──

    /// Integrations joined with process and form names. References that no
    /// longer resolve show as "Unknown Process" / "Unknown Form".
    pub async fn resolved_integrations(&self) -> Result<Vec<IntegrationView>> {
        let integrations = self.list_integrations().await?;
        let process_names: HashMap<RecordId, String> = self
            .list_processes()
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();
        let form_names: HashMap<RecordId, String> = self
            .list_forms()
            .await?
            .into_iter()
            .map(|f| (f.id, f.name))
            .collect();

        Ok(integrations
            .into_iter()
            .map(|integration| {
                let process_name = process_names.get(&integration.process_id).cloned();
                let form_name = form_names.get(&integration.form_id).cloned();
                IntegrationView {
                    process_known: process_name.is_some(),
                    form_known: form_name.is_some(),
                    process_name: process_name.unwrap_or_else(|| UNKNOWN_PROCESS.to_string()),
                    form_name: form_name.unwrap_or_else(|| UNKNOWN_FORM.to_string()),
                    integration,
                }
            })
            .collect())
    }

    pub async fn dashboard(&self) -> Result<DashboardSummary> {
        Ok(DashboardSummary {
            processes: self.list_processes().await?.len(),
            forms: self.list_forms().await?.len(),
            integrations: self.list_integrations().await?.len(),
        })
    }
}

fn import_form_schema(schema_json: &str) -> Result<FormSchema> {
    with_widget::<FormCanvas, _>(schema_json.to_string(), |canvas| {
        if let Some(error) = canvas.import_error() {
            tracing::warn!(error = %error, "form schema import failed, storing default schema");
        }
        canvas.schema().clone()
    })
}

fn link_patch(process_id: RecordId, task: &ProcessTask, form_id: RecordId) -> IntegrationPatch {
    IntegrationPatch {
        process_id: Some(process_id),
        form_id: Some(form_id),
        task_id: Some(task.id.clone()),
        task_name: Some(task.label.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{DEFAULT_DIAGRAM_XML, ORDER_REQUEST_XML};

    const TWO_TASKS: &str = r#"<definitions id="D">
  <process id="P">
    <userTask id="Fill" name="Fill Request" />
    <userTask id="Approve" name="Approve Request" />
  </process>
</definitions>"#;

    fn blank(policy: LinkPolicy) -> Studio {
        Studio::new(
            Arc::new(MemoryStore::<Process>::new()),
            Arc::new(MemoryStore::<Form>::new()),
            Arc::new(MemoryStore::<Integration>::new()),
            policy,
        )
    }

    async fn add_process(studio: &Studio, name: &str, xml: &str) -> Process {
        studio
            .create_process(ProcessDraft {
                name: name.to_string(),
                description: "Process under test".to_string(),
                xml: xml.to_string(),
            })
            .await
            .unwrap()
    }

    async fn add_form(studio: &Studio, name: &str) -> Form {
        studio
            .create_form(FormDraft {
                name: name.to_string(),
                description: "Form under test".to_string(),
                schema: FormSchema::default(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_validation_blocks_store_call() {
        let studio = blank(LinkPolicy::PerTask);
        let err = studio
            .create_process(ProcessDraft {
                name: "X".to_string(),
                description: "tiny".to_string(),
                xml: DEFAULT_DIAGRAM_XML.to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Validation(ref v) if v.len() == 2));
        assert!(studio.list_processes().await.unwrap().is_empty());

        let p = add_process(&studio, "Valid", DEFAULT_DIAGRAM_XML).await;
        let err = studio
            .update_process(
                p.id,
                ProcessPatch {
                    name: Some("Y".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Validation(_)));
        assert_eq!(studio.get_process(p.id).await.unwrap().name, "Valid");
    }

    #[tokio::test]
    async fn test_malformed_diagram_falls_back_to_default() {
        let studio = blank(LinkPolicy::PerTask);
        let p = add_process(&studio, "Broken", "<bpmn:definitions><oops").await;
        assert_eq!(p.xml, DEFAULT_DIAGRAM_XML);

        let p = studio
            .update_process(
                p.id,
                ProcessPatch {
                    xml: Some(ORDER_REQUEST_XML.to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(p.xml, ORDER_REQUEST_XML);
        assert_eq!(studio.process_tasks(p.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_link_per_task_keeps_distinct_tasks() {
        let studio = blank(LinkPolicy::PerTask);
        let p = add_process(&studio, "Two step", TWO_TASKS).await;
        let f1 = add_form(&studio, "Form one").await;
        let f2 = add_form(&studio, "Form two").await;

        let a = studio.link(p.id, "Fill", f1.id).await.unwrap();
        let b = studio.link(p.id, "Approve", f2.id).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(studio.integrations_for_process(p.id).await.unwrap().len(), 2);

        // Same (process, task) again replaces rather than duplicates.
        let again = studio.link(p.id, "Fill", f2.id).await.unwrap();
        assert_eq!(again.id, a.id);
        assert_eq!(again.form_id, f2.id);
        assert_eq!(again.created_at, a.created_at);
        assert_eq!(studio.integrations_for_process(p.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_link_per_process_overwrites() {
        let studio = blank(LinkPolicy::PerProcess);
        let p = add_process(&studio, "Two step", TWO_TASKS).await;
        let f1 = add_form(&studio, "Form one").await;
        let f2 = add_form(&studio, "Form two").await;

        let first = studio.link(p.id, "Fill", f1.id).await.unwrap();
        let second = studio.link(p.id, "Approve", f2.id).await.unwrap();
        assert_eq!(second.id, first.id);

        let all = studio.integrations_for_process(p.id).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].form_id, f2.id);
        assert_eq!(all[0].task_id.as_deref(), Some("Approve"));
        assert_eq!(all[0].task_name.as_deref(), Some("Approve Request"));
    }

    #[tokio::test]
    async fn test_per_process_collapses_legacy_duplicates() {
        let studio = blank(LinkPolicy::PerProcess);
        let p = add_process(&studio, "Two step", TWO_TASKS).await;
        let f = add_form(&studio, "Form one").await;
        for _ in 0..2 {
            studio
                .create_integration(IntegrationDraft {
                    process_id: p.id,
                    form_id: f.id,
                    task_id: None,
                    task_name: None,
                })
                .await
                .unwrap();
        }

        studio.link(p.id, "Fill", f.id).await.unwrap();
        assert_eq!(studio.integrations_for_process(p.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_link_rejects_unknown_task_and_missing_records() {
        let studio = blank(LinkPolicy::PerTask);
        let p = add_process(&studio, "Two step", TWO_TASKS).await;
        let f = add_form(&studio, "Form one").await;

        let err = studio.link(p.id, "Nope", f.id).await.unwrap_err();
        assert!(matches!(err, StudioError::UnknownTask { ref task_id, .. } if task_id == "Nope"));

        let err = studio.link(p.id, "", f.id).await.unwrap_err();
        assert!(matches!(err, StudioError::Validation(_)));

        let err = studio
            .link(uuid::Uuid::new_v4(), "Fill", f.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::NotFound { kind: RecordKind::Process, .. }));

        let err = studio
            .link(p.id, "Fill", uuid::Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::NotFound { kind: RecordKind::Form, .. }));
        assert!(studio.list_integrations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_relink_evicts_slot_holder() {
        let studio = blank(LinkPolicy::PerTask);
        let p = add_process(&studio, "Two step", TWO_TASKS).await;
        let f = add_form(&studio, "Form one").await;
        let fill = studio.link(p.id, "Fill", f.id).await.unwrap();
        let approve = studio.link(p.id, "Approve", f.id).await.unwrap();

        let moved = studio.relink(approve.id, p.id, "Fill", f.id).await.unwrap();
        assert_eq!(moved.id, approve.id);
        assert_eq!(moved.task_id.as_deref(), Some("Fill"));

        let all = studio.list_integrations().await.unwrap();
        assert_eq!(all.len(), 1);
        assert!(studio.get_integration(fill.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_relink_missing_integration_is_not_found() {
        let studio = blank(LinkPolicy::PerTask);
        let p = add_process(&studio, "Two step", TWO_TASKS).await;
        let f = add_form(&studio, "Form one").await;
        let err = studio
            .relink(uuid::Uuid::new_v4(), p.id, "Fill", f.id)
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::NotFound { kind: RecordKind::Integration, .. }));
    }

    #[tokio::test]
    async fn test_delete_cascades_through_studio() {
        let studio = blank(LinkPolicy::PerTask);
        let p = add_process(&studio, "Two step", TWO_TASKS).await;
        let f = add_form(&studio, "Form one").await;
        studio.link(p.id, "Fill", f.id).await.unwrap();
        studio.link(p.id, "Approve", f.id).await.unwrap();

        let report = studio.delete_form(f.id).await.unwrap();
        assert_eq!(report.removed_integrations, 2);
        assert!(studio.list_integrations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolved_integrations_mark_gaps() {
        let studio = blank(LinkPolicy::PerTask);
        let p = add_process(&studio, "Two step", TWO_TASKS).await;
        let f = add_form(&studio, "Form one").await;
        studio.link(p.id, "Fill", f.id).await.unwrap();
        studio
            .create_integration(IntegrationDraft {
                process_id: uuid::Uuid::new_v4(),
                form_id: uuid::Uuid::new_v4(),
                task_id: Some("Gone".to_string()),
                task_name: None,
            })
            .await
            .unwrap();

        let views = studio.resolved_integrations().await.unwrap();
        assert_eq!(views.len(), 2);
        let known = views.iter().find(|v| v.process_known).unwrap();
        assert_eq!(known.process_name, "Two step");
        assert_eq!(known.form_name, "Form one");
        let gap = views.iter().find(|v| !v.process_known).unwrap();
        assert_eq!(gap.process_name, UNKNOWN_PROCESS);
        assert_eq!(gap.form_name, UNKNOWN_FORM);
        assert!(!gap.form_known);
    }

    #[tokio::test]
    async fn test_in_memory_seeds_defaults_and_link() {
        let studio = Studio::in_memory();
        let summary = studio.dashboard().await.unwrap();
        assert_eq!(
            summary,
            DashboardSummary {
                processes: 1,
                forms: 1,
                integrations: 1,
            }
        );

        let views = studio.resolved_integrations().await.unwrap();
        assert_eq!(views[0].process_name, DEFAULT_PROCESS_NAME);
        assert_eq!(views[0].form_name, DEFAULT_FORM_NAME);
        assert_eq!(views[0].integration.task_name.as_deref(), Some("Review Data"));

        // Deleting the seeded link does not bring it back.
        studio
            .delete_integration(views[0].integration.id)
            .await
            .unwrap();
        assert!(studio.list_integrations().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_without_seeds() {
        let studio = Studio::open(&StudioConfig {
            seed_defaults: false,
            ..StudioConfig::default()
        });
        assert_eq!(studio.dashboard().await.unwrap(), DashboardSummary::default());
    }

    #[tokio::test]
    async fn test_open_json_file_backend() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StudioConfig {
            backend: Backend::JsonFile {
                dir: dir.path().to_path_buf(),
            },
            ..StudioConfig::default()
        };

        let created = {
            let studio = Studio::open(&config);
            add_process(&studio, "On disk", TWO_TASKS).await
        };

        let reopened = Studio::open(&config);
        let names: Vec<_> = reopened
            .list_processes()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["On disk".to_string()]);
        assert_eq!(reopened.get_process(created.id).await.unwrap().xml, TWO_TASKS);
    }

    #[tokio::test]
    async fn test_form_json_goes_through_form_canvas() {
        let studio = blank(LinkPolicy::PerTask);
        let form = studio
            .create_form_from_json(
                "Intake",
                "Customer intake",
                r#"{"components":[{"type":"textfield","key":"customer"}]}"#,
            )
            .await
            .unwrap();
        assert_eq!(form.schema.field_keys(), vec!["customer"]);
        assert_eq!(form.schema.schema_version, 5);

        let form = studio
            .update_form_schema_json(form.id, "{ not json")
            .await
            .unwrap();
        assert_eq!(form.schema, FormSchema::default());
        assert_eq!(form.name, "Intake");

        let err = studio
            .create_form_from_json("I", "tiny", "{}")
            .await
            .unwrap_err();
        assert!(matches!(err, StudioError::Validation(_)));
    }

    #[tokio::test]
    async fn test_deleted_default_link_stays_deleted_after_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = StudioConfig {
            backend: Backend::JsonFile {
                dir: dir.path().to_path_buf(),
            },
            ..StudioConfig::default()
        };

        {
            let studio = Studio::open(&config);
            let links = studio.list_integrations().await.unwrap();
            assert_eq!(links.len(), 1);
            studio.delete_integration(links[0].id).await.unwrap();
            assert!(studio.list_integrations().await.unwrap().is_empty());
        }

        let reopened = Studio::open(&config);
        assert!(reopened.list_integrations().await.unwrap().is_empty());
        assert_eq!(reopened.list_processes().await.unwrap().len(), 1);
    }

    /// Integration store whose pristine check fails a set number of times.
    struct FlakyLinks {
        inner: MemoryStore<Integration>,
        failures: std::sync::atomic::AtomicUsize,
    }

    #[async_trait::async_trait]
    impl RecordStore<Integration> for FlakyLinks {
        async fn list(&self) -> Result<Vec<Integration>> {
            self.inner.list().await
        }

        async fn get(&self, id: RecordId) -> Result<Integration> {
            self.inner.get(id).await
        }

        async fn create(&self, draft: IntegrationDraft) -> Result<Integration> {
            self.inner.create(draft).await
        }

        async fn update(&self, id: RecordId, patch: IntegrationPatch) -> Result<Integration> {
            self.inner.update(id, patch).await
        }

        async fn delete(&self, id: RecordId) -> Result<()> {
            self.inner.delete(id).await
        }

        async fn retain(
            &self,
            keep: &(dyn for<'k> Fn(&'k Integration) -> bool + Send + Sync),
        ) -> Result<usize> {
            self.inner.retain(keep).await
        }

        async fn is_pristine(&self) -> Result<bool> {
            use std::sync::atomic::Ordering;
            let left = self.failures.load(Ordering::SeqCst);
            if left > 0 {
                self.failures.store(left - 1, Ordering::SeqCst);
                return Err(StudioError::Storage("connection reset".to_string()));
            }
            self.inner.is_pristine().await
        }
    }

    #[tokio::test]
    async fn test_failed_link_seed_is_retried() {
        let studio = Studio::new(
            Arc::new(MemoryStore::<Process>::new().with_seed(Arc::new(default_process_draft))),
            Arc::new(MemoryStore::<Form>::new().with_seed(Arc::new(default_form_draft))),
            Arc::new(FlakyLinks {
                inner: MemoryStore::new(),
                failures: std::sync::atomic::AtomicUsize::new(1),
            }),
            LinkPolicy::PerTask,
        )
        .with_default_link(true);

        let err = studio.list_integrations().await.unwrap_err();
        assert!(matches!(err, StudioError::Storage(_)));

        let links = studio.list_integrations().await.unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].task_name.as_deref(), Some("Review Data"));
    }
}
