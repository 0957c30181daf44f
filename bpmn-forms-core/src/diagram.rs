//! BPMN document reading and user-task extraction.
//!
//! Only the semantic layer is interpreted: element kind, id and name of every
//! flow element inside a `process` or a nested sub-process container
//! (`subProcess`, `adHocSubProcess`, `transaction`). The DI layer
//! (shapes, edges, bounds) is skipped. Namespace prefixes are ignored, so
//! `bpmn:userTask`, `bpmn2:userTask` and `userTask` are the same kind.

use crate::defaults::DEFAULT_DIAGRAM_XML;
use crate::error::{DocumentFormat, Result, StudioError};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Flow element kinds the editor distinguishes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    StartEvent,
    EndEvent,
    UserTask,
    ServiceTask,
    Task,
    ExclusiveGateway,
    ParallelGateway,
    SequenceFlow,
    SubProcess,
    AdHocSubProcess,
    Transaction,
    Other(String),
}

impl ElementKind {
    fn from_local_name(name: &str) -> Self {
        match name {
            "startEvent" => ElementKind::StartEvent,
            "endEvent" => ElementKind::EndEvent,
            "userTask" => ElementKind::UserTask,
            "serviceTask" => ElementKind::ServiceTask,
            "task" => ElementKind::Task,
            "exclusiveGateway" => ElementKind::ExclusiveGateway,
            "parallelGateway" => ElementKind::ParallelGateway,
            "sequenceFlow" => ElementKind::SequenceFlow,
            "subProcess" => ElementKind::SubProcess,
            "adHocSubProcess" => ElementKind::AdHocSubProcess,
            "transaction" => ElementKind::Transaction,
            other => ElementKind::Other(other.to_string()),
        }
    }
}

/// One semantic element of a process.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowElement {
    pub kind: ElementKind,
    pub id: String,
    pub name: Option<String>,
    /// Id of the enclosing process or sub-process container.
    pub parent_id: Option<String>,
}

/// A user task that a form can be linked to. Derived, never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProcessTask {
    pub id: String,
    pub label: String,
}

impl ProcessTask {
    fn from_element(element: &FlowElement) -> Self {
        let label = match element.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("Task {}", element.id),
        };
        Self {
            id: element.id.clone(),
            label,
        }
    }
}

/// Parsed semantic view of a BPMN document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagramDocument {
    pub definitions_id: Option<String>,
    pub process_ids: Vec<String>,
    /// Flow elements in document order.
    pub elements: Vec<FlowElement>,
    /// `BPMNShape` count in the DI layer.
    pub shape_count: usize,
}

/// Children of a container that are metadata, not flow elements.
const NON_FLOW_CHILDREN: &[&str] = &[
    "documentation",
    "extensionElements",
    "laneSet",
    "ioSpecification",
    "property",
];

fn is_container(local_name: &str) -> bool {
    matches!(
        local_name,
        "process" | "subProcess" | "adHocSubProcess" | "transaction"
    )
}

struct Frame {
    local_name: String,
    id: Option<String>,
}

impl DiagramDocument {
    /// Parse a BPMN document. Fails with `Import` when the XML is not
    /// well-formed or its root is not `definitions`.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut doc = DiagramDocument::default();
        let mut stack: Vec<Frame> = Vec::new();
        let mut root_seen = false;
        let mut root_closed = false;

        loop {
            let event = reader.read_event().map_err(|e| {
                import_error(format!(
                    "malformed XML at byte {}: {}",
                    reader.buffer_position(),
                    e
                ))
            })?;

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    let is_empty = matches!(event, Event::Empty(_));
                    if root_closed {
                        return Err(import_error("content after root element"));
                    }
                    let local_name = local_name_of(e);
                    let id = attribute(e, "id")?;
                    if local_name == "BPMNShape" {
                        doc.shape_count += 1;
                    }

                    if !root_seen {
                        if local_name != "definitions" {
                            return Err(import_error(format!(
                                "root element is <{}>, expected <definitions>",
                                local_name
                            )));
                        }
                        root_seen = true;
                        doc.definitions_id = id.clone();
                    } else {
                        doc.visit(&stack, e, &local_name, id.clone())?;
                    }

                    if is_empty {
                        if stack.is_empty() {
                            root_closed = true;
                        }
                    } else {
                        stack.push(Frame { local_name, id });
                    }
                }
                Event::End(_) => {
                    stack.pop();
                    if stack.is_empty() {
                        root_closed = true;
                    }
                }
                Event::Text(_) | Event::CData(_) if stack.is_empty() => {
                    return Err(import_error("text outside the root element"));
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !root_seen {
            return Err(import_error("document has no root element"));
        }
        if !stack.is_empty() {
            return Err(import_error(format!(
                "unexpected end of document inside <{}>",
                stack.last().map(|f| f.local_name.as_str()).unwrap_or_default()
            )));
        }
        Ok(doc)
    }

    fn visit(
        &mut self,
        stack: &[Frame],
        e: &BytesStart<'_>,
        local_name: &str,
        id: Option<String>,
    ) -> Result<()> {
        let Some(parent) = stack.last() else {
            return Ok(());
        };

        if local_name == "process" && parent.local_name == "definitions" {
            if let Some(id) = &id {
                self.process_ids.push(id.clone());
            }
            return Ok(());
        }

        if !is_container(&parent.local_name) || NON_FLOW_CHILDREN.contains(&local_name) {
            return Ok(());
        }

        // Elements without an id have no semantic object behind them.
        let Some(id) = id.filter(|id| !id.is_empty()) else {
            return Ok(());
        };

        self.elements.push(FlowElement {
            kind: ElementKind::from_local_name(local_name),
            id,
            name: attribute(e, "name")?,
            parent_id: parent.id.clone(),
        });
        Ok(())
    }

    pub fn element(&self, id: &str) -> Option<&FlowElement> {
        self.elements.iter().find(|el| el.id == id)
    }

    pub fn elements_of<'a>(&'a self, kind: &'a ElementKind) -> impl Iterator<Item = &'a FlowElement> {
        self.elements.iter().filter(move |el| &el.kind == kind)
    }

    /// User tasks in document order, labelled by name or `"Task <id>"`.
    pub fn user_tasks(&self) -> Vec<ProcessTask> {
        self.elements_of(&ElementKind::UserTask)
            .map(ProcessTask::from_element)
            .collect()
    }
}

fn import_error(reason: impl Into<String>) -> StudioError {
    StudioError::import(DocumentFormat::Diagram, reason)
}

fn local_name_of(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

/// Value of the attribute whose local name is `name`, unescaped.
fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| import_error(format!("bad attribute: {}", err)))?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            let value: Cow<'_, str> = attr
                .unescape_value()
                .map_err(|err| import_error(format!("bad attribute value: {}", err)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Extract the user tasks of a diagram. Empty or malformed documents yield
/// no tasks.
pub fn extract_user_tasks(xml: &str) -> Vec<ProcessTask> {
    match DiagramDocument::parse(xml) {
        Ok(doc) => doc.user_tasks(),
        Err(e) => {
            tracing::debug!(error = %e, "diagram did not parse, no tasks extracted");
            Vec::new()
        }
    }
}

/// Return `xml` when it parses, else the default empty diagram.
pub fn normalize_diagram_xml(xml: &str) -> String {
    match DiagramDocument::parse(xml) {
        Ok(_) => xml.to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "diagram import failed, falling back to default diagram");
            DEFAULT_DIAGRAM_XML.to_string()
        }
    }
}

/// The extracted task list together with the user's current choice.
///
/// Refreshing with a new list clears a choice that is no longer present,
/// clears everything on an empty list, and auto-selects a lone task.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskSelection {
    tasks: Vec<ProcessTask>,
    selected: Option<String>,
}

impl TaskSelection {
    pub fn refresh(&mut self, tasks: Vec<ProcessTask>) {
        self.selected = match tasks.as_slice() {
            [] => None,
            [only] => Some(only.id.clone()),
            _ => self
                .selected
                .take()
                .filter(|id| tasks.iter().any(|t| &t.id == id)),
        };
        self.tasks = tasks;
    }

    /// Select `task_id` if it is one of the extracted tasks.
    pub fn select(&mut self, task_id: &str) -> bool {
        if self.tasks.iter().any(|t| t.id == task_id) {
            self.selected = Some(task_id.to_string());
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
        self.selected = None;
    }

    pub fn tasks(&self) -> &[ProcessTask] {
        &self.tasks
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn selected(&self) -> Option<&ProcessTask> {
        let id = self.selected.as_deref()?;
        self.tasks.iter().find(|t| t.id == id)
    }
}
