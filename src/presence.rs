// src/presence.rs

use crate::card_types::Uid;

/// What a poll cycle saw, relative to the previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// A card not seen in the previous cycle.
    Arrived(Uid),
    /// The same card is still in the field.
    Still,
    /// The previous card is gone.
    Removed,
    /// Nothing before, nothing now.
    Empty,
}

/// Remembers the last UID so a card resting on the reader is handled once.
#[derive(Debug, Default, Clone, Copy)]
pub struct PresenceTracker {
    last: Option<Uid>,
}

impl PresenceTracker {
    pub const fn new() -> Self {
        PresenceTracker { last: None }
    }

    pub fn last(&self) -> Option<&Uid> {
        self.last.as_ref()
    }

    pub fn observe(&mut self, seen: Option<Uid>) -> Presence {
        let presence = match (self.last, seen) {
            (Some(last), Some(uid)) if last == uid => Presence::Still,
            (_, Some(uid)) => Presence::Arrived(uid),
            (Some(_), None) => Presence::Removed,
            (None, None) => Presence::Empty,
        };
        self.last = seen;
        presence
    }

    /// Forgets the last card; it will be reported as arrived again.
    pub fn clear(&mut self) {
        self.last = None;
    }
}
