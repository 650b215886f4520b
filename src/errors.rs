use core::fmt::{Debug, Formatter, Result};
use ufmt::{uDebug, uWrite};

/// Result of a protocol-level operation.
///
/// This is not an error type: `NoTag` is the normal answer when nothing is in
/// range, and callers are expected to branch on every variant.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    /// Timer expired or the card stopped answering.
    NoTag,
    /// Hardware-reported framing/parity/collision fault, or a response that
    /// broke a protocol expectation (bit count, checksum, acknowledge).
    Error,
}

impl Outcome {
    pub fn is_ok(self) -> bool {
        self == Outcome::Ok
    }

    fn name(self) -> &'static str {
        match self {
            Outcome::Ok => "Ok",
            Outcome::NoTag => "NoTag",
            Outcome::Error => "Error",
        }
    }
}

impl Debug for Outcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.name())
    }
}

impl uDebug for Outcome {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(self.name())
    }
}

/// Bus-level failure. Fatal: the chip has to be reinitialised.
#[derive(PartialEq)]
pub enum TransportError<S, P> {
    Spi(S),
    ChipSelect(P),
}

impl<S, P> Debug for TransportError<S, P>
where
    S: Debug,
    P: Debug,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            TransportError::Spi(e) => write!(f, "Spi({:?})", e),
            TransportError::ChipSelect(e) => write!(f, "ChipSelect({:?})", e),
        }
    }
}

// Bus error types rarely implement uDebug, so only the kind is printed.
impl<S, P> uDebug for TransportError<S, P> {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            TransportError::Spi(_) => f.write_str("Spi"),
            TransportError::ChipSelect(_) => f.write_str("ChipSelect"),
        }
    }
}

/// Failure of a step in the typed session API (`Selected`, `Authenticated`).
#[derive(PartialEq)]
pub enum SessionError<E> {
    /// Nothing answered.
    NoTag,
    /// The card or the chip reported an error.
    Protocol,
    /// Block 0 and sector trailers are never written.
    BlockNotWritable(u8),
    /// Block lies outside the authenticated sector.
    OutsideSector(u8),
    /// Record longer than the two data blocks it is stored in.
    PayloadTooLarge(usize),
    Transport(E),
}

impl<E> SessionError<E> {
    /// Maps a non-OK outcome. `Outcome::Ok` is not a failure and maps to `Protocol`.
    pub fn from_outcome(outcome: Outcome) -> Self {
        match outcome {
            Outcome::NoTag => SessionError::NoTag,
            _ => SessionError::Protocol,
        }
    }
}

impl<E: Debug> Debug for SessionError<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            SessionError::NoTag => write!(f, "NoTag"),
            SessionError::Protocol => write!(f, "Protocol"),
            SessionError::BlockNotWritable(block) => write!(f, "BlockNotWritable({})", block),
            SessionError::OutsideSector(block) => write!(f, "OutsideSector({})", block),
            SessionError::PayloadTooLarge(len) => write!(f, "PayloadTooLarge({})", len),
            SessionError::Transport(e) => write!(f, "Transport({:?})", e),
        }
    }
}

impl<E: uDebug> uDebug for SessionError<E> {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            SessionError::NoTag => f.write_str("NoTag"),
            SessionError::Protocol => f.write_str("Protocol"),
            SessionError::BlockNotWritable(block) => ufmt::uwrite!(f, "BlockNotWritable({})", block),
            SessionError::OutsideSector(block) => ufmt::uwrite!(f, "OutsideSector({})", block),
            SessionError::PayloadTooLarge(len) => ufmt::uwrite!(f, "PayloadTooLarge({})", len),
            SessionError::Transport(e) => ufmt::uwrite!(f, "Transport({:?})", e),
        }
    }
}
