/// Number of message slots per row (`message1`..`message5`).
pub const SLOT_COUNT: usize = 5;

/// One `(name, action)` row of reply content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyEntry {
    pub name: String,
    pub action: String,
    /// Serialized payloads for slots 1..=5. Blank cells are `None`.
    pub messages: [Option<String>; SLOT_COUNT],
    /// 1-based row in the source file, header included. Zero when built in
    /// memory.
    pub row: usize,
}

impl ReplyEntry {
    pub fn new(name: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            action: action.into(),
            messages: Default::default(),
            row: 0,
        }
    }

    /// Set slot `slot` (1-based). Blank values clear the slot; out of range
    /// slots are ignored.
    #[must_use]
    pub fn with_slot(mut self, slot: usize, raw: impl Into<String>) -> Self {
        if let Some(cell) = slot.checked_sub(1).and_then(|i| self.messages.get_mut(i)) {
            *cell = normalize_cell(Some(raw.into()));
        }
        self
    }

    /// Slots in fixed order as `(slot number, raw value)`.
    pub fn slots(&self) -> impl Iterator<Item = (usize, Option<&str>)> {
        self.messages
            .iter()
            .enumerate()
            .map(|(i, raw)| (i + 1, raw.as_deref()))
    }

    pub fn filled_slots(&self) -> usize {
        self.messages.iter().flatten().count()
    }
}

/// Blank and whitespace-only cells are the empty sentinel.
pub(crate) fn normalize_cell(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}
