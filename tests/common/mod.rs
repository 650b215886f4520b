// Simulated MFRC522 with a MIFARE Classic 1K card in its field.
#![allow(dead_code)]

use std::convert::Infallible;

use embedded_hal::delay::DelayNs;
use rfid_rc522_mifare::card_types::sector_of;
use rfid_rc522_mifare::registers::*;
use rfid_rc522_mifare::{Config, RegisterAccess, RfidRc522};

pub const UID: [u8; 4] = [0x12, 0x34, 0x56, 0x78];
pub const UID_BCC: u8 = 0x12 ^ 0x34 ^ 0x56 ^ 0x78;

/// The bus went away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Disconnected;

/// ISO/IEC 14443-3 CRC_A, low byte first.
pub fn crc_a(data: &[u8]) -> [u8; 2] {
    let mut crc: u16 = 0x6363;
    for &byte in data {
        let mut ch = byte ^ (crc & 0xFF) as u8;
        ch ^= ch << 4;
        let ch = u16::from(ch);
        crc = (crc >> 8) ^ (ch << 8) ^ (ch << 3) ^ (ch >> 4);
    }
    [(crc & 0xFF) as u8, (crc >> 8) as u8]
}

fn with_crc(data: &[u8]) -> Vec<u8> {
    let mut out = data.to_vec();
    out.extend_from_slice(&crc_a(data));
    out
}

fn crc_ok(frame: &[u8]) -> bool {
    frame.len() >= 2 && crc_a(&frame[..frame.len() - 2]) == frame[frame.len() - 2..]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardState {
    Idle,
    Ready,
    Active,
    Authenticated(u8),
    WriteArmed(u8),
    Halted,
}

/// A card answer: bytes plus valid bits in the last byte (0 = all 8).
pub type Answer = (Vec<u8>, u8);

pub struct Card {
    pub uid: [u8; 4],
    pub sak: u8,
    pub state: CardState,
    pub blocks: [[u8; 16]; 64],
    pub key_a: [u8; 6],
    pub key_b: [u8; 6],
    pub atqa: Answer,
    /// Replaces the computed anticollision answer.
    pub anticollision_answer: Option<Answer>,
    /// Replaces the computed select answer.
    pub select_answer: Option<Answer>,
    /// Answers to the two write phases.
    pub write_acks: [Answer; 2],
}

impl Card {
    pub fn new(uid: [u8; 4]) -> Self {
        let mut blocks = [[0u8; 16]; 64];
        blocks[0][..4].copy_from_slice(&uid);
        for trailer in (3..64).step_by(4) {
            blocks[trailer] = [
                0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x07, 0x80, 0x69, 0xFF, 0xFF, 0xFF, 0xFF,
                0xFF, 0xFF,
            ];
        }
        Card {
            uid,
            sak: 0x08,
            state: CardState::Idle,
            blocks,
            key_a: [0xFF; 6],
            key_b: [0xFF; 6],
            atqa: (vec![0x04, 0x00], 0),
            anticollision_answer: None,
            select_answer: None,
            write_acks: [(vec![0x0A], 4), (vec![0x0A], 4)],
        }
    }

    fn respond(&mut self, frame: &[u8], tx_last_bits: u8) -> Option<Answer> {
        // Only REQA / WUPA are short frames; a truncated last byte garbles anything longer.
        if frame.len() > 1 && tx_last_bits != 0 {
            return None;
        }
        match (self.state, frame) {
            (CardState::Idle, [0x26]) | (CardState::Idle | CardState::Halted, [0x52])
                if tx_last_bits == 7 =>
            {
                self.state = CardState::Ready;
                Some(self.atqa.clone())
            }
            (CardState::Ready, [0x93, 0x20]) => Some(self.anticollision_answer.clone().unwrap_or_else(|| {
                let mut answer = self.uid.to_vec();
                answer.push(self.uid.iter().fold(0, |acc, b| acc ^ b));
                (answer, 0)
            })),
            (CardState::Ready, [0x93, 0x70, rest @ ..]) if rest.len() == 7 && crc_ok(frame) => {
                if rest[..4] != self.uid {
                    self.state = CardState::Idle;
                    return None;
                }
                self.state = CardState::Active;
                Some(self.select_answer.clone().unwrap_or_else(|| (with_crc(&[self.sak]), 0)))
            }
            (CardState::Active | CardState::Authenticated(_), [0x50, 0x00, _, _]) if crc_ok(frame) => {
                self.state = CardState::Halted;
                None
            }
            (CardState::Authenticated(sector), [0x30, block, _, _]) if crc_ok(frame) => {
                if sector_of(*block) != sector || *block as usize >= self.blocks.len() {
                    return Some((vec![0x04], 4));
                }
                Some((with_crc(&self.blocks[*block as usize]), 0))
            }
            (CardState::Authenticated(sector), [0xA0, block, _, _]) if crc_ok(frame) => {
                if sector_of(*block) != sector || *block as usize >= self.blocks.len() {
                    return Some((vec![0x04], 4));
                }
                let ack = self.write_acks[0].clone();
                if ack.0 == [0x0A] {
                    self.state = CardState::WriteArmed(*block);
                }
                Some(ack)
            }
            (CardState::WriteArmed(block), data) if data.len() == 18 && crc_ok(data) => {
                let ack = self.write_acks[1].clone();
                if ack.0 == [0x0A] {
                    self.blocks[block as usize].copy_from_slice(&data[..16]);
                }
                self.state = CardState::Authenticated(sector_of(block));
                Some(ack)
            }
            (CardState::Active | CardState::Authenticated(_), _) => {
                // Unknown or corrupt frame: the card drops back to idle.
                self.state = CardState::Idle;
                None
            }
            _ => None,
        }
    }

    fn authenticate(&mut self, payload: &[u8]) -> bool {
        let (key_type, block, rest) = match payload {
            [key_type, block, rest @ ..] => (*key_type, *block, rest),
            _ => return false,
        };
        if rest.len() != 10 || rest[6..] != self.uid {
            return false;
        }
        let key = match key_type {
            0x60 => self.key_a,
            0x61 => self.key_b,
            _ => return false,
        };
        match self.state {
            CardState::Active | CardState::Authenticated(_) if rest[..6] == key => {
                self.state = CardState::Authenticated(sector_of(block));
                true
            }
            _ => {
                self.state = CardState::Idle;
                false
            }
        }
    }
}

pub struct FakeChip {
    pub regs: [u8; 64],
    pub fifo: Vec<u8>,
    pub card: Option<Card>,
    /// Frames handed to the RF side by Transceive.
    pub transmitted: Vec<Vec<u8>>,
    /// MFAuthent payloads.
    pub auth_payloads: Vec<Vec<u8>>,
    pub irq_polls: usize,
    pub crc_polls: usize,
    /// Commands never complete.
    pub stuck: bool,
    /// CalcCRC never signals completion.
    pub crc_stuck: bool,
    /// ErrorReg bits raised by the next transceive.
    pub inject_error: u8,
    /// Register accesses left before the bus fails.
    pub fail_after: Option<usize>,
    pub ops: usize,
    transceive_armed: bool,
}

impl FakeChip {
    pub fn new(card: Option<Card>) -> Self {
        FakeChip {
            regs: [0; 64],
            fifo: Vec::new(),
            card,
            transmitted: Vec::new(),
            auth_payloads: Vec::new(),
            irq_polls: 0,
            crc_polls: 0,
            stuck: false,
            crc_stuck: false,
            inject_error: 0,
            fail_after: None,
            ops: 0,
            transceive_armed: false,
        }
    }

    pub fn with_card() -> Self {
        FakeChip::new(Some(Card::new(UID)))
    }

    pub fn card(&self) -> &Card {
        self.card.as_ref().expect("card in field")
    }

    pub fn card_mut(&mut self) -> &mut Card {
        self.card.as_mut().expect("card in field")
    }

    pub fn crypto1_on(&self) -> bool {
        self.regs[STATUS2_REG as usize] & status2::MF_CRYPTO1_ON != 0
    }

    pub fn antenna_on(&self) -> bool {
        self.regs[TX_CONTROL_REG as usize] & tx_control::ANTENNA == tx_control::ANTENNA
    }

    fn tick(&mut self) -> Result<(), Disconnected> {
        if let Some(left) = self.fail_after {
            if left == 0 {
                return Err(Disconnected);
            }
            self.fail_after = Some(left - 1);
        }
        self.ops += 1;
        Ok(())
    }

    fn raise(&mut self, reg: u8, bits: u8) {
        self.regs[reg as usize] |= bits;
    }

    fn run_command(&mut self, command: u8) {
        match command {
            0x00 => self.transceive_armed = false,
            0x03 => {
                if !self.crc_stuck {
                    let crc = crc_a(&self.fifo);
                    self.fifo.clear();
                    self.regs[CRC_RESULT_REG_L as usize] = crc[0];
                    self.regs[CRC_RESULT_REG_H as usize] = crc[1];
                    self.raise(DIV_IRQ_REG, div_irq::CRC);
                }
            }
            0x0C => {
                self.regs[ERROR_REG as usize] = 0;
                self.transceive_armed = true;
            }
            0x0E => {
                self.regs[ERROR_REG as usize] = 0;
                let payload: Vec<u8> = self.fifo.drain(..).collect();
                self.auth_payloads.push(payload.clone());
                if self.stuck {
                    return;
                }
                let ok = self.card.as_mut().map_or(false, |card| card.authenticate(&payload));
                if ok {
                    self.raise(STATUS2_REG, status2::MF_CRYPTO1_ON);
                    self.raise(COMM_IRQ_REG, com_irq::IDLE);
                } else {
                    // Wrong key: the card never answers and the timer runs out.
                    self.raise(COMM_IRQ_REG, com_irq::TIMER);
                }
            }
            0x0F => {
                self.regs = [0; 64];
                self.fifo.clear();
                self.transceive_armed = false;
            }
            _ => {}
        }
    }

    fn start_send(&mut self) {
        self.transceive_armed = false;
        let frame: Vec<u8> = self.fifo.drain(..).collect();
        let tx_last_bits = self.regs[BIT_FRAMING_REG as usize] & 0x07;
        self.transmitted.push(frame.clone());
        if self.stuck {
            return;
        }
        if self.inject_error != 0 {
            self.raise(ERROR_REG, self.inject_error);
        }

        let field_on = self.antenna_on();
        let answer = match self.card.as_mut() {
            Some(card) if field_on => card.respond(&frame, tx_last_bits),
            _ => None,
        };
        match answer {
            Some((bytes, last_bits)) => {
                self.fifo.extend_from_slice(&bytes);
                let control = self.regs[CONTROL_REG as usize] & !control::RX_LAST_BITS;
                self.regs[CONTROL_REG as usize] = control | last_bits;
                self.raise(COMM_IRQ_REG, com_irq::RX | com_irq::IDLE);
            }
            None => self.raise(COMM_IRQ_REG, com_irq::TIMER),
        }
    }
}

impl RegisterAccess for FakeChip {
    type Error = Disconnected;

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), Disconnected> {
        self.tick()?;
        assert!(reg <= MAX_REGISTER);
        match reg {
            COMMAND_REG => {
                self.regs[reg as usize] = value & 0x0F;
                self.run_command(value & 0x0F);
            }
            COMM_IRQ_REG | DIV_IRQ_REG => {
                if value & 0x80 != 0 {
                    self.regs[reg as usize] |= value & 0x7F;
                } else {
                    self.regs[reg as usize] &= !(value & 0x7F);
                }
            }
            FIFO_DATA_REG => self.fifo.push(value),
            FIFO_LEVEL_REG => {
                if value & fifo_level::FLUSH_BUFFER != 0 {
                    self.fifo.clear();
                }
            }
            ERROR_REG | VERSION_REG => {}
            BIT_FRAMING_REG => {
                self.regs[reg as usize] = value;
                if value & bit_framing::START_SEND != 0 && self.transceive_armed {
                    self.start_send();
                }
            }
            _ => self.regs[reg as usize] = value,
        }
        Ok(())
    }

    fn read_register(&mut self, reg: u8) -> Result<u8, Disconnected> {
        self.tick()?;
        assert!(reg <= MAX_REGISTER);
        Ok(match reg {
            COMM_IRQ_REG => {
                self.irq_polls += 1;
                self.regs[reg as usize]
            }
            DIV_IRQ_REG => {
                self.crc_polls += 1;
                self.regs[reg as usize]
            }
            FIFO_LEVEL_REG => self.fifo.len() as u8,
            FIFO_DATA_REG => {
                if self.fifo.is_empty() {
                    0
                } else {
                    self.fifo.remove(0)
                }
            }
            VERSION_REG => 0x92,
            _ => self.regs[reg as usize],
        })
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

#[derive(Default)]
pub struct Serial(pub String);

impl ufmt::uWrite for Serial {
    type Error = Infallible;

    fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
        self.0.push_str(s);
        Ok(())
    }
}

/// Driver on a chip that has been through `init`.
pub fn reader(chip: FakeChip) -> RfidRc522<FakeChip> {
    reader_with(chip, Config::default())
}

pub fn reader_with(chip: FakeChip, config: Config) -> RfidRc522<FakeChip> {
    let mut rc522 = RfidRc522::with_port(chip, config);
    rc522.init(&mut NoDelay, &mut Serial::default()).expect("init");
    rc522
}
