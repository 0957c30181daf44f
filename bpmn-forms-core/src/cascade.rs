//! Cross-store deletes.
//!
//! Removing a process or a form also removes every integration that points
//! at it. The owning record is deleted first, so a missing id aborts before
//! the integration collection is touched.

use crate::error::Result;
use crate::store::RecordStore;
use crate::types::{Form, Integration, Process, RecordId};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct CascadeReport {
    pub deleted: RecordId,
    pub removed_integrations: usize,
}

pub async fn delete_process_cascade(
    processes: &dyn RecordStore<Process>,
    integrations: &dyn RecordStore<Integration>,
    process_id: RecordId,
) -> Result<CascadeReport> {
    processes.delete(process_id).await?;
    let removed = integrations
        .retain(&|i: &Integration| i.process_id != process_id)
        .await?;
    tracing::info!(process_id = %process_id, removed_integrations = removed, "process deleted");
    Ok(CascadeReport {
        deleted: process_id,
        removed_integrations: removed,
    })
}

pub async fn delete_form_cascade(
    forms: &dyn RecordStore<Form>,
    integrations: &dyn RecordStore<Integration>,
    form_id: RecordId,
) -> Result<CascadeReport> {
    forms.delete(form_id).await?;
    let removed = integrations
        .retain(&|i: &Integration| i.form_id != form_id)
        .await?;
    tracing::info!(form_id = %form_id, removed_integrations = removed, "form deleted");
    Ok(CascadeReport {
        deleted: form_id,
        removed_integrations: removed,
    })
}
