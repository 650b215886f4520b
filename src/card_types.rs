use core::fmt::{Debug, Display, Formatter, Result};
use ufmt::{uDebug, uDisplay, uWrite};

/// Bytes in a MIFARE Classic block.
pub const BLOCK_SIZE: usize = 16;

pub type Block = [u8; BLOCK_SIZE];

/// Card family, from the select acknowledge (SAK).
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    MifareMini,
    Mifare1K,
    Mifare4K,
    MifareUltralight,
    Iso14443_4,
    Unknown,
}

impl CardType {
    pub fn from_sak(sak: u8) -> Self {
        // Bit 8 is ignored, some vendors set it.
        match sak & 0x7F {
            0x09 => CardType::MifareMini,
            0x08 => CardType::Mifare1K,
            0x18 => CardType::Mifare4K,
            0x00 => CardType::MifareUltralight,
            0x20 => CardType::Iso14443_4,
            _ => CardType::Unknown,
        }
    }

    fn name(self) -> &'static str {
        match self {
            CardType::MifareMini => "MifareMini",
            CardType::Mifare1K => "Mifare1K",
            CardType::Mifare4K => "Mifare4K",
            CardType::MifareUltralight => "MifareUltralight",
            CardType::Iso14443_4 => "Iso14443_4",
            CardType::Unknown => "Unknown",
        }
    }
}

impl Debug for CardType {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.name())
    }
}

impl uDebug for CardType {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(self.name())
    }
}

/// Single-size (4 byte) UID.
///
/// Only built from an anticollision answer whose BCC matched, so holding a
/// `Uid` means the checksum was verified.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Uid {
    bytes: [u8; 4],
}

impl Uid {
    /// Parses the 5-byte anticollision answer: four UID bytes and their XOR.
    pub fn from_anticollision(answer: &[u8]) -> Option<Self> {
        match *answer {
            [b0, b1, b2, b3, bcc] if b0 ^ b1 ^ b2 ^ b3 == bcc => Some(Uid {
                bytes: [b0, b1, b2, b3],
            }),
            _ => None,
        }
    }

    pub fn bytes(&self) -> &[u8; 4] {
        &self.bytes
    }

    /// Block check character sent after the UID in a SELECT.
    pub fn bcc(&self) -> u8 {
        self.bytes.iter().fold(0, |acc, b| acc ^ b)
    }

    fn hex(&self) -> [u8; 10] {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";
        let mut out = *b"0x00000000";
        for (i, byte) in self.bytes.iter().enumerate() {
            out[2 + 2 * i] = DIGITS[(byte >> 4) as usize];
            out[3 + 2 * i] = DIGITS[(byte & 0x0F) as usize];
        }
        out
    }
}

impl Display for Uid {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let hex = self.hex();
        f.write_str(core::str::from_utf8(&hex).unwrap_or("0x????????"))
    }
}

impl Debug for Uid {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "Uid({})", self)
    }
}

impl uDisplay for Uid {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        let hex = self.hex();
        f.write_str(core::str::from_utf8(&hex).unwrap_or("0x????????"))
    }
}

impl uDebug for Uid {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<W>) -> core::result::Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str("Uid(")?;
        uDisplay::fmt(self, f)?;
        f.write_str(")")
    }
}

/// Six-byte MIFARE Classic sector key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AuthKey(pub [u8; 6]);

impl AuthKey {
    /// Transport key shipped on blank cards. Not a credential.
    pub const DEFAULT: AuthKey = AuthKey([0xFF; 6]);

    pub fn bytes(&self) -> &[u8; 6] {
        &self.0
    }
}

// Keys never end up in logs.
impl Debug for AuthKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str("AuthKey(..)")
    }
}

/// Manufacturer block, read-only on genuine cards.
pub const MANUFACTURER_BLOCK: u8 = 0;

// Mifare 4K: 32 sectors of 4 blocks, then 8 sectors of 16 blocks.
const SMALL_SECTOR_BLOCKS: u8 = 128;

pub fn sector_of(block: u8) -> u8 {
    if block < SMALL_SECTOR_BLOCKS {
        block / 4
    } else {
        32 + (block - SMALL_SECTOR_BLOCKS) / 16
    }
}

pub fn trailer_of(block: u8) -> u8 {
    if block < SMALL_SECTOR_BLOCKS {
        block | 0x03
    } else {
        block | 0x0F
    }
}

pub fn is_trailer(block: u8) -> bool {
    trailer_of(block) == block
}

/// Block 0 and sector trailers hold manufacturer data, keys and access bits.
pub fn is_data_block(block: u8) -> bool {
    block != MANUFACTURER_BLOCK && !is_trailer(block)
}
