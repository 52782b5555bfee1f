use serde_json::Value;

use crate::document::Document;
use crate::error::CommandError;
use crate::selection::Selection;
use crate::serde_value::RichfieldValue;

/// A document state stored in the JSON tree format.
#[derive(Debug, Clone)]
struct Snapshot {
    value: Value,
    selection: Selection,
}

impl Snapshot {
    fn capture(doc: &Document, selection: &Selection) -> Result<Self, serde_json::Error> {
        Ok(Self {
            value: serde_json::to_value(RichfieldValue::from_document(doc))?,
            selection: selection.clone(),
        })
    }

    fn restore(self) -> Result<(Document, Selection), CommandError> {
        let value: RichfieldValue = serde_json::from_value(self.value)
            .map_err(|err| CommandError::Snapshot(err.to_string()))?;
        let doc = value
            .into_document()
            .map_err(|err| CommandError::Snapshot(err.to_string()))?;
        Ok((doc, self.selection))
    }
}

#[derive(Debug, Default)]
pub(crate) struct History {
    undo: Vec<Snapshot>,
    redo: Vec<Snapshot>,
    max: usize,
}

impl History {
    pub(crate) fn new(max: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max,
        }
    }

    pub(crate) fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub(crate) fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Records the state before a committed change.
    pub(crate) fn record(&mut self, doc: &Document, selection: &Selection) {
        match Snapshot::capture(doc, selection) {
            Ok(snapshot) => {
                self.undo.push(snapshot);
                self.redo.clear();
                if self.undo.len() > self.max {
                    self.undo.remove(0);
                }
            }
            Err(err) => tracing::warn!(%err, "failed to record undo snapshot"),
        }
    }

    pub(crate) fn undo(
        &mut self,
        doc: &Document,
        selection: &Selection,
    ) -> Result<Option<(Document, Selection)>, CommandError> {
        let Some(snapshot) = self.undo.pop() else {
            return Ok(None);
        };
        let current = Snapshot::capture(doc, selection)
            .map_err(|err| CommandError::Snapshot(err.to_string()))?;
        self.redo.push(current);
        snapshot.restore().map(Some)
    }

    pub(crate) fn redo(
        &mut self,
        doc: &Document,
        selection: &Selection,
    ) -> Result<Option<(Document, Selection)>, CommandError> {
        let Some(snapshot) = self.redo.pop() else {
            return Ok(None);
        };
        let current = Snapshot::capture(doc, selection)
            .map_err(|err| CommandError::Snapshot(err.to_string()))?;
        self.undo.push(current);
        snapshot.restore().map(Some)
    }
}
