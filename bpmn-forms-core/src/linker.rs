//! Integration linker session.
//!
//! Drives the "link a process task to a form" flow: pick a process, pick
//! one of its extracted user tasks, pick a form, submit. The session never
//! writes until [`LinkSession::submit`] and refuses to submit while any
//! choice is missing or a previous submission is still running.

use crate::diagram::{ProcessTask, TaskSelection};
use crate::error::{Result, StudioError};
use crate::studio::Studio;
use crate::types::{Integration, RecordId};
use crate::widget::{with_widget, DiagramCanvas};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditMode {
    Create,
    Edit(RecordId),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkPhase {
    UnselectedProcess,
    ProcessSelectedNoTasks,
    ProcessSelectedWithTasks,
    TaskSelected,
    Submitted,
}

/// Why the submit control is disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitBlocker {
    NoProcesses,
    NoForms,
    NoTasks,
    InFlight,
    ProcessUnselected,
    TaskUnselected,
    FormUnselected,
}

impl fmt::Display for SubmitBlocker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SubmitBlocker::NoProcesses => "no processes available",
            SubmitBlocker::NoForms => "no forms available",
            SubmitBlocker::NoTasks => "selected process has no user tasks",
            SubmitBlocker::InFlight => "a submission is in progress",
            SubmitBlocker::ProcessUnselected => "select a process",
            SubmitBlocker::TaskUnselected => "select a task",
            SubmitBlocker::FormUnselected => "select a form",
        };
        f.write_str(text)
    }
}

/// An entry of a selection list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub id: RecordId,
    pub name: String,
}

/// Raises the in-flight flag and lowers it when dropped, including when the
/// submit future is abandoned mid-await.
struct InFlight<'a>(&'a mut bool);

impl<'a> InFlight<'a> {
    fn start(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

#[derive(Debug)]
pub struct LinkSession {
    mode: EditMode,
    processes: Vec<Choice>,
    forms: Vec<Choice>,
    process_id: Option<RecordId>,
    tasks: TaskSelection,
    form_id: Option<RecordId>,
    in_flight: bool,
    process_locked: bool,
    submitted: Option<Integration>,
}

impl LinkSession {
    /// Load the selection lists. In edit mode the stored integration's
    /// choices are restored; a `preselected` process is selected and locked.
    pub async fn open(
        studio: &Studio,
        mode: EditMode,
        preselected: Option<RecordId>,
    ) -> Result<Self> {
        let processes = studio
            .list_processes()
            .await?
            .into_iter()
            .map(|p| Choice { id: p.id, name: p.name })
            .collect();
        let forms = studio
            .list_forms()
            .await?
            .into_iter()
            .map(|f| Choice { id: f.id, name: f.name })
            .collect();

        let mut session = Self {
            mode,
            processes,
            forms,
            process_id: None,
            tasks: TaskSelection::default(),
            form_id: None,
            in_flight: false,
            process_locked: false,
            submitted: None,
        };

        if let EditMode::Edit(id) = mode {
            let existing = studio.get_integration(id).await?;
            session.restore(studio, &existing).await?;
        }

        if let Some(process_id) = preselected {
            session.select_process(studio, process_id).await?;
            session.process_locked = true;
        }

        tracing::debug!(mode = ?session.mode, phase = ?session.phase(), "link session opened");
        Ok(session)
    }

    async fn restore(&mut self, studio: &Studio, existing: &Integration) -> Result<()> {
        match self.select_process(studio, existing.process_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::warn!(id = %existing.id, process_id = %existing.process_id, "linked process no longer exists");
            }
            Err(e) => return Err(e),
        }
        if let Some(task_id) = existing.task_id.as_deref() {
            self.tasks.select(task_id);
        }
        if self.forms.iter().any(|f| f.id == existing.form_id) {
            self.form_id = Some(existing.form_id);
        }
        Ok(())
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn processes(&self) -> &[Choice] {
        &self.processes
    }

    pub fn forms(&self) -> &[Choice] {
        &self.forms
    }

    pub fn process_id(&self) -> Option<RecordId> {
        self.process_id
    }

    pub fn tasks(&self) -> &[ProcessTask] {
        self.tasks.tasks()
    }

    pub fn selected_task(&self) -> Option<&ProcessTask> {
        self.tasks.selected()
    }

    pub fn form_id(&self) -> Option<RecordId> {
        self.form_id
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn submitted(&self) -> Option<&Integration> {
        self.submitted.as_ref()
    }

    /// Select a process and re-extract its user tasks. Switching to a
    /// different process always drops the task choice.
    pub async fn select_process(&mut self, studio: &Studio, process_id: RecordId) -> Result<()> {
        if self.process_locked && self.process_id != Some(process_id) {
            return Err(StudioError::NotReady(
                "process is fixed for this session".to_string(),
            ));
        }
        if self.process_id != Some(process_id) {
            self.tasks.clear();
        }
        self.submitted = None;

        let process = match studio.get_process(process_id).await {
            Ok(process) => process,
            Err(e) => {
                self.process_id = None;
                self.tasks.clear();
                return Err(e);
            }
        };

        let tasks = with_widget::<DiagramCanvas, _>(process.xml, |canvas| canvas.user_tasks())?;
        tracing::debug!(process_id = %process_id, tasks = tasks.len(), "tasks extracted");
        self.process_id = Some(process_id);
        self.tasks.refresh(tasks);
        Ok(())
    }

    pub fn select_task(&mut self, task_id: &str) -> Result<()> {
        let process_id = self
            .process_id
            .ok_or_else(|| StudioError::NotReady("select a process first".to_string()))?;
        if !self.tasks.select(task_id) {
            return Err(StudioError::UnknownTask {
                process_id,
                task_id: task_id.to_string(),
            });
        }
        self.submitted = None;
        Ok(())
    }

    pub fn select_form(&mut self, form_id: RecordId) -> Result<()> {
        if !self.forms.iter().any(|f| f.id == form_id) {
            return Err(StudioError::not_found(crate::types::RecordKind::Form, form_id));
        }
        self.form_id = Some(form_id);
        self.submitted = None;
        Ok(())
    }

    pub fn phase(&self) -> LinkPhase {
        if self.submitted.is_some() {
            return LinkPhase::Submitted;
        }
        match (self.process_id, self.tasks.selected_id()) {
            (None, _) => LinkPhase::UnselectedProcess,
            (Some(_), Some(_)) => LinkPhase::TaskSelected,
            (Some(_), None) if self.tasks.tasks().is_empty() => LinkPhase::ProcessSelectedNoTasks,
            (Some(_), None) => LinkPhase::ProcessSelectedWithTasks,
        }
    }

    pub fn blockers(&self) -> Vec<SubmitBlocker> {
        let mut blockers = Vec::new();
        if self.processes.is_empty() {
            blockers.push(SubmitBlocker::NoProcesses);
        }
        if self.forms.is_empty() {
            blockers.push(SubmitBlocker::NoForms);
        }
        if self.in_flight {
            blockers.push(SubmitBlocker::InFlight);
        }
        if self.process_id.is_none() {
            blockers.push(SubmitBlocker::ProcessUnselected);
        } else if self.tasks.tasks().is_empty() {
            blockers.push(SubmitBlocker::NoTasks);
        } else if self.tasks.selected_id().is_none() {
            blockers.push(SubmitBlocker::TaskUnselected);
        }
        if self.form_id.is_none() {
            blockers.push(SubmitBlocker::FormUnselected);
        }
        blockers
    }

    pub fn can_submit(&self) -> bool {
        self.blockers().is_empty()
    }

    /// Write the selection. Create mode upserts through the link policy,
    /// edit mode rewrites the integration the session was opened for.
    /// Store failures (including NotFound) are returned as is.
    pub async fn submit(&mut self, studio: &Studio) -> Result<Integration> {
        let blockers = self.blockers();
        if !blockers.is_empty() {
            let reasons: Vec<String> = blockers.iter().map(ToString::to_string).collect();
            return Err(StudioError::NotReady(reasons.join("; ")));
        }
        let (Some(process_id), Some(task_id), Some(form_id)) = (
            self.process_id,
            self.tasks.selected_id().map(str::to_string),
            self.form_id,
        ) else {
            return Err(StudioError::NotReady("selection incomplete".to_string()));
        };

        let mode = self.mode;
        let result = {
            let _flight = InFlight::start(&mut self.in_flight);
            match mode {
                EditMode::Create => studio.link(process_id, &task_id, form_id).await,
                EditMode::Edit(id) => studio.relink(id, process_id, &task_id, form_id).await,
            }
        };

        match result {
            Ok(integration) => {
                self.submitted = Some(integration.clone());
                Ok(integration)
            }
            Err(e) => {
                tracing::error!(error = %e, mode = ?self.mode, "integration submit failed");
                Err(e)
            }
        }
    }
}
