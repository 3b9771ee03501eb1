use tracing::debug;

use crate::handle::MessagePtr;
use crate::kind::MessageType;

#[derive(Debug, Clone)]
struct Entry {
    message: MessagePtr,
    undone: bool,
}

/// Command-stream history of a session.
///
/// Messages are shared, so the undo state lives beside each entry rather
/// than in the message. An undo step runs from one of a user's `UndoPoint`s
/// to just before their next one.
#[derive(Debug, Clone, Default)]
pub struct MessageHistory {
    entries: Vec<Entry>,
}

impl MessageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its index.
    pub fn push(&mut self, message: MessagePtr) -> usize {
        self.entries.push(Entry {
            message,
            undone: false,
        });
        self.entries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MessagePtr> {
        self.entries.get(index).map(|entry| &entry.message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MessagePtr> + '_ {
        self.entries.iter().map(|entry| &entry.message)
    }

    /// Set the undo flag of one entry.
    ///
    /// Returns `false` (and changes nothing) if the index is out of range or
    /// the message is not undoable.
    pub fn set_undone(&mut self, index: usize, undone: bool) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) if entry.message.is_undoable() => {
                entry.undone = undone;
                true
            }
            _ => false,
        }
    }

    pub fn is_undone(&self, index: usize) -> bool {
        self.entries.get(index).is_some_and(|entry| entry.undone)
    }

    /// Undo (`points > 0`) or redo (`points < 0`) steps of user `ctx`.
    ///
    /// Returns how many steps actually changed state.
    pub fn undo(&mut self, ctx: u8, points: i8) -> usize {
        let steps = usize::from(points.unsigned_abs());
        let changed = if points >= 0 {
            (0..steps).take_while(|_| self.undo_step(ctx)).count()
        } else {
            (0..steps).take_while(|_| self.redo_step(ctx)).count()
        };
        debug!(ctx, points, changed, "history: undo");
        changed
    }

    /// Messages that rebuild the current canvas, oldest first.
    ///
    /// Undone entries and undo bookkeeping (`UndoPoint`, `Undo`) are left out.
    pub fn replay(&self) -> impl Iterator<Item = &MessagePtr> + '_ {
        self.entries
            .iter()
            .filter(|entry| {
                !entry.undone
                    && entry.message.is_command()
                    && !matches!(
                        entry.message.message_type(),
                        MessageType::UndoPoint | MessageType::Undo
                    )
            })
            .map(|entry| &entry.message)
    }

    fn is_point_of(entry: &Entry, ctx: u8) -> bool {
        entry.message.context_id() == ctx && entry.message.message_type() == MessageType::UndoPoint
    }

    fn undo_step(&mut self, ctx: u8) -> bool {
        let Some(start) = self
            .entries
            .iter()
            .rposition(|entry| !entry.undone && Self::is_point_of(entry, ctx))
        else {
            return false;
        };
        for entry in &mut self.entries[start..] {
            if entry.message.context_id() == ctx && entry.message.is_undoable() {
                entry.undone = true;
            }
        }
        true
    }

    fn redo_step(&mut self, ctx: u8) -> bool {
        // The oldest point of the trailing run of undone points is the next
        // step to restore. A live point after it means nothing can be redone.
        let mut start = None;
        for (index, entry) in self.entries.iter().enumerate().rev() {
            if !Self::is_point_of(entry, ctx) {
                continue;
            }
            if !entry.undone {
                break;
            }
            start = Some(index);
        }
        let Some(start) = start else {
            return false;
        };

        let end = self.entries[start + 1..]
            .iter()
            .position(|entry| Self::is_point_of(entry, ctx))
            .map_or(self.entries.len(), |offset| start + 1 + offset);

        for entry in &mut self.entries[start..end] {
            if entry.message.context_id() == ctx {
                entry.undone = false;
            }
        }
        true
    }
}
