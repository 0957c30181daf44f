//! Editor widget lifecycle.
//!
//! A widget is acquired with its input, used, and released on every exit
//! path by the [`Mounted`] guard. New input never mutates a live widget:
//! [`Mounted::remount`] releases the old instance before mounting the next.

use crate::defaults::DEFAULT_DIAGRAM_XML;
use crate::diagram::{DiagramDocument, ProcessTask};
use crate::error::Result;
use crate::form_schema::FormSchema;
use std::ops::{Deref, DerefMut};

pub trait EditorWidget: Sized {
    type Input;

    fn mount(input: Self::Input) -> Result<Self>;

    /// Free whatever the widget holds. Called exactly once, by the guard.
    fn release(&mut self);
}

/// Owns a mounted widget and releases it on drop.
pub struct Mounted<W: EditorWidget> {
    widget: W,
}

impl<W: EditorWidget> Mounted<W> {
    pub fn acquire(input: W::Input) -> Result<Self> {
        Ok(Self {
            widget: W::mount(input)?,
        })
    }

    /// Release this instance, then mount a fresh one with `input`.
    pub fn remount(self, input: W::Input) -> Result<Self> {
        drop(self);
        Self::acquire(input)
    }
}

impl<W: EditorWidget> Deref for Mounted<W> {
    type Target = W;

    fn deref(&self) -> &W {
        &self.widget
    }
}

impl<W: EditorWidget> DerefMut for Mounted<W> {
    fn deref_mut(&mut self) -> &mut W {
        &mut self.widget
    }
}

impl<W: EditorWidget> Drop for Mounted<W> {
    fn drop(&mut self) {
        self.widget.release();
    }
}

/// Mount a widget for the duration of `f`.
pub fn with_widget<W, T>(input: W::Input, f: impl FnOnce(&mut W) -> T) -> Result<T>
where
    W: EditorWidget,
{
    let mut mounted = Mounted::<W>::acquire(input)?;
    Ok(f(&mut *mounted))
}

// ─── Diagram canvas ───────────────────────────────────────────

/// Diagram editor surface. Imports XML on mount; an import failure shows
/// the default diagram and keeps the error for display.
#[derive(Debug)]
pub struct DiagramCanvas {
    xml: String,
    document: DiagramDocument,
    import_error: Option<String>,
}

impl DiagramCanvas {
    pub fn save_xml(&self) -> &str {
        &self.xml
    }

    pub fn document(&self) -> &DiagramDocument {
        &self.document
    }

    pub fn user_tasks(&self) -> Vec<ProcessTask> {
        self.document.user_tasks()
    }

    pub fn import_error(&self) -> Option<&str> {
        self.import_error.as_deref()
    }
}

impl EditorWidget for DiagramCanvas {
    type Input = String;

    fn mount(xml: String) -> Result<Self> {
        match DiagramDocument::parse(&xml) {
            Ok(document) => Ok(Self {
                xml,
                document,
                import_error: None,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load BPMN diagram, showing default");
                Ok(Self {
                    xml: DEFAULT_DIAGRAM_XML.to_string(),
                    document: DiagramDocument::parse(DEFAULT_DIAGRAM_XML)?,
                    import_error: Some(e.to_string()),
                })
            }
        }
    }

    fn release(&mut self) {
        tracing::trace!(elements = self.document.elements.len(), "diagram canvas released");
        self.document = DiagramDocument::default();
    }
}

// ─── Form canvas ──────────────────────────────────────────────

/// Form editor surface. Imports schema JSON on mount with normalization;
/// unparseable JSON falls back to the default schema.
#[derive(Debug)]
pub struct FormCanvas {
    schema: FormSchema,
    import_error: Option<String>,
}

impl FormCanvas {
    pub fn schema(&self) -> &FormSchema {
        &self.schema
    }

    pub fn import_error(&self) -> Option<&str> {
        self.import_error.as_deref()
    }
}

impl EditorWidget for FormCanvas {
    type Input = String;

    fn mount(json: String) -> Result<Self> {
        match FormSchema::parse_json(&json) {
            Ok(schema) => Ok(Self {
                schema,
                import_error: None,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "failed to import form schema, showing default");
                Ok(Self {
                    schema: FormSchema::default(),
                    import_error: Some(e.to_string()),
                })
            }
        }
    }

    fn release(&mut self) {
        tracing::trace!(components = self.schema.components.len(), "form canvas released");
    }
}
