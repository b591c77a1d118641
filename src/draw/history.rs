use crate::draw::model::Stroke;

/// Undo/redo stacks of committed strokes. The undo stack is chronological;
/// the redo stack holds undone strokes, most recently undone last.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawHistory {
    undo_stack: Vec<Stroke>,
    redo_stack: Vec<Stroke>,
}

impl DrawHistory {
    pub fn commit(&mut self, stroke: Stroke) {
        self.undo_stack.push(stroke);
    }

    /// New divergent work: nothing undone so far can be redone any more.
    pub fn discard_redo(&mut self) {
        if !self.redo_stack.is_empty() {
            tracing::debug!(dropped = self.redo_stack.len(), "discarding redo history");
        }
        self.redo_stack.clear();
    }

    pub fn undo(&mut self) -> Option<&Stroke> {
        let stroke = self.undo_stack.pop()?;
        self.redo_stack.push(stroke);
        self.redo_stack.last()
    }

    pub fn redo(&mut self) -> Option<&Stroke> {
        let stroke = self.redo_stack.pop()?;
        self.undo_stack.push(stroke);
        self.undo_stack.last()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Committed strokes, oldest first: exactly what a replay redraws.
    pub fn strokes(&self) -> &[Stroke] {
        &self.undo_stack
    }

    pub fn last(&self) -> Option<&Stroke> {
        self.undo_stack.last()
    }
}
