// src/commands.rs

use crate::registers::com_irq;

/// Commands for the MFRC522 (CommandReg).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Idle = 0x00,
    CalcCrc = 0x03,
    Transceive = 0x0C,
    MfAuthent = 0x0E,
    SoftReset = 0x0F,
}

impl Command {
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Interrupt-enable mask armed while the command runs.
    pub const fn irq_enable(self) -> u8 {
        match self {
            Command::MfAuthent => com_irq::IDLE | com_irq::ERR,
            Command::Transceive => {
                com_irq::TX
                    | com_irq::RX
                    | com_irq::IDLE
                    | com_irq::LO_ALERT
                    | com_irq::ERR
                    | com_irq::TIMER
            }
            _ => 0x00,
        }
    }

    /// ComIrqReg bits that mean the command has finished.
    pub const fn wait_irq(self) -> u8 {
        match self {
            Command::MfAuthent => com_irq::IDLE,
            Command::Transceive => com_irq::RX | com_irq::IDLE,
            _ => 0x00,
        }
    }

    /// Commands that drive the RF field and need StartSend.
    pub const fn transmits(self) -> bool {
        matches!(self, Command::Transceive)
    }
}

// PICC commands (ISO/IEC 14443-3 and MIFARE Classic)
pub const PICC_REQIDL: u8 = 0x26; // REQA, 7 bit frame
pub const PICC_REQALL: u8 = 0x52; // WUPA, 7 bit frame
pub const PICC_SEL_CL1: u8 = 0x93; // Anticollision / select, cascade level 1
pub const PICC_CT: u8 = 0x88; // Cascade tag
pub const PICC_HLTA: u8 = 0x50;
pub const PICC_AUTH_KEY_A: u8 = 0x60;
pub const PICC_AUTH_KEY_B: u8 = 0x61;
pub const PICC_MF_READ: u8 = 0x30;
pub const PICC_MF_WRITE: u8 = 0xA0;

/// NVB for an anticollision frame: SEL + NVB only.
pub const NVB_ANTICOLLISION: u8 = 0x20;
/// NVB for a select frame: seven whole bytes.
pub const NVB_SELECT: u8 = 0x70;

/// Low nibble of the 4-bit MIFARE acknowledge.
pub const MF_ACK: u8 = 0x0A;

/// REQA or WUPA.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMode {
    /// Wakes cards in IDLE only.
    Idle = PICC_REQIDL as isize,
    /// Wakes cards in IDLE and HALT.
    All = PICC_REQALL as isize,
}

impl RequestMode {
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// MIFARE Classic key slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    A = PICC_AUTH_KEY_A as isize,
    B = PICC_AUTH_KEY_B as isize,
}

impl KeyType {
    pub const fn code(self) -> u8 {
        self as u8
    }
}
