// src/session.rs
//
// Capability handles over the raw driver. A `Selected` exists only after
// request, anticollision and select succeeded; an `Authenticated` only after
// MFAuthent succeeded for its sector. Any failed step consumes the handle,
// which puts the caller back at idle.

use crate::card_types::{is_data_block, sector_of, AuthKey, Block, CardType, Uid, BLOCK_SIZE};
use crate::commands::{KeyType, RequestMode};
use crate::errors::{Outcome, SessionError};
use crate::record::{self, RECORD_BLOCKS, RECORD_CAPACITY};
use crate::register_port::RegisterAccess;
use crate::rfid_rc522::{Frame, RfidRc522};

type Result<T, E> = core::result::Result<T, SessionError<E>>;

fn check<E>(outcome: Outcome) -> Result<(), E> {
    match outcome {
        Outcome::Ok => Ok(()),
        outcome => Err(SessionError::from_outcome(outcome)),
    }
}

impl<P: RegisterAccess> RfidRc522<P> {
    /// Request, anticollision and select in one go.
    pub fn activate(&mut self, mode: RequestMode) -> Result<Selected<'_, P>, P::Error> {
        let (outcome, _) = self.request(mode).map_err(SessionError::Transport)?;
        check::<P::Error>(outcome)?;

        let uid = match self.anticollision().map_err(SessionError::Transport)? {
            (Outcome::Ok, Some(uid)) => uid,
            (outcome, _) => return Err(SessionError::from_outcome(outcome)),
        };

        let card_type = match self.select(&uid).map_err(SessionError::Transport)? {
            (Outcome::Ok, Some(card_type)) => card_type,
            (outcome, _) => return Err(SessionError::from_outcome(outcome)),
        };

        Ok(Selected {
            reader: self,
            uid,
            card_type,
        })
    }
}

/// A selected card.
pub struct Selected<'r, P: RegisterAccess> {
    reader: &'r mut RfidRc522<P>,
    uid: Uid,
    card_type: CardType,
}

impl<'r, P: RegisterAccess> Selected<'r, P> {
    pub fn uid(&self) -> &Uid {
        &self.uid
    }

    pub fn card_type(&self) -> CardType {
        self.card_type
    }

    /// Authenticates the sector holding `block`.
    pub fn authenticate(
        mut self,
        key_type: KeyType,
        block: u8,
        key: &AuthKey,
    ) -> Result<Authenticated<'r, P>, P::Error> {
        let outcome = self
            .reader
            .authenticate(key_type, block, key, &self.uid)
            .map_err(SessionError::Transport)?;
        if outcome != Outcome::Ok {
            self.reader.stop_crypto1().map_err(SessionError::Transport)?;
            return Err(SessionError::from_outcome(outcome));
        }
        Ok(Authenticated {
            sector: sector_of(block),
            selected: self,
        })
    }

    /// Sends HLTA. The card ignores REQA until the field is cycled or a WUPA
    /// wakes it.
    pub fn halt(mut self) -> Result<(), P::Error> {
        let outcome = self.reader.halt().map_err(SessionError::Transport)?;
        check(outcome)
    }
}

/// A card with one authenticated sector.
pub struct Authenticated<'r, P: RegisterAccess> {
    selected: Selected<'r, P>,
    sector: u8,
}

impl<'r, P: RegisterAccess> Authenticated<'r, P> {
    pub fn uid(&self) -> &Uid {
        &self.selected.uid
    }

    pub fn sector(&self) -> u8 {
        self.sector
    }

    pub fn read_block(mut self, block: u8) -> Result<(Self, Frame), P::Error> {
        if sector_of(block) != self.sector {
            return Err(self.abort(SessionError::OutsideSector(block)));
        }
        match self.selected.reader.read_block(block) {
            Ok(Some(frame)) => Ok((self, frame)),
            Ok(None) => Err(self.abort(SessionError::Protocol)),
            Err(e) => Err(SessionError::Transport(e)),
        }
    }

    pub fn write_block(mut self, block: u8, data: &Block) -> Result<Self, P::Error> {
        if !is_data_block(block) {
            return Err(self.abort(SessionError::BlockNotWritable(block)));
        }
        if sector_of(block) != self.sector {
            return Err(self.abort(SessionError::OutsideSector(block)));
        }
        match self.selected.reader.write_block(block, data) {
            Ok(Outcome::Ok) => Ok(self),
            Ok(outcome) => Err(self.abort(SessionError::from_outcome(outcome))),
            Err(e) => Err(SessionError::Transport(e)),
        }
    }

    /// Stores `payload` in the record blocks. Block 2 is left untouched for
    /// payloads shorter than 16 bytes; otherwise it is rewritten, zero padded.
    pub fn write_record(self, payload: &[u8]) -> Result<Self, P::Error> {
        let blocks = match record::encode(payload) {
            Ok(blocks) => blocks,
            Err(len) => return Err(self.abort(SessionError::PayloadTooLarge(len))),
        };
        let mut session = self;
        for (&block, data) in RECORD_BLOCKS
            .iter()
            .zip(blocks.iter())
            .take(record::blocks_needed(payload))
        {
            session = session.write_block(block, data)?;
        }
        Ok(session)
    }

    /// Raw record bytes; pass them to `record::decode`.
    pub fn read_record(self) -> Result<(Self, [u8; RECORD_CAPACITY]), P::Error> {
        let mut raw = [0u8; RECORD_CAPACITY];
        let mut session = self;
        for (&block, chunk) in RECORD_BLOCKS.iter().zip(raw.chunks_mut(BLOCK_SIZE)) {
            let (next, frame) = session.read_block(block)?;
            let data = frame.as_slice();
            let len = data.len().min(BLOCK_SIZE);
            chunk[..len].copy_from_slice(&data[..len]);
            session = next;
        }
        Ok((session, raw))
    }

    /// Ends the Crypto1 session; the card stays selected.
    pub fn finish(self) -> Result<Selected<'r, P>, P::Error> {
        let Authenticated { mut selected, .. } = self;
        selected
            .reader
            .stop_crypto1()
            .map_err(SessionError::Transport)?;
        Ok(selected)
    }

    /// Drops the Crypto1 session before handing back `error`.
    fn abort(mut self, error: SessionError<P::Error>) -> SessionError<P::Error> {
        match self.selected.reader.stop_crypto1() {
            Ok(()) => error,
            Err(e) => SessionError::Transport(e),
        }
    }
}
