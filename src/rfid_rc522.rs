use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use ufmt::uWrite;

use crate::card_types::{AuthKey, Block, CardType, Uid, BLOCK_SIZE};
use crate::commands::*;
use crate::config::{Config, RxGain};
use crate::errors::{Outcome, TransportError};
use crate::poll::PollBudget;
use crate::register_port::{RegisterAccess, RegisterPort};
use crate::registers::*;

/// Longest frame drained from the FIFO after a transceive.
pub const FIFO_FRAME_LIMIT: usize = 16;

/// Bytes drained from the FIFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    data: [u8; FIFO_FRAME_LIMIT],
    len: usize,
}

impl Frame {
    pub const EMPTY: Frame = Frame {
        data: [0; FIFO_FRAME_LIMIT],
        len: 0,
    };

    pub fn as_slice(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push(&mut self, byte: u8) {
        if self.len < FIFO_FRAME_LIMIT {
            self.data[self.len] = byte;
            self.len += 1;
        }
    }
}

/// What `execute` got back from the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Response {
    pub outcome: Outcome,
    pub frame: Frame,
    /// Valid bits received, counting a partial last byte.
    pub bits: u16,
}

impl Response {
    fn failed(outcome: Outcome) -> Self {
        Response {
            outcome,
            frame: Frame::EMPTY,
            bits: 0,
        }
    }

    /// A MIFARE 4-bit answer carrying the ACK nibble.
    fn is_mifare_ack(&self) -> bool {
        self.outcome == Outcome::Ok
            && self.bits == 4
            && self.frame.as_slice().first().map(|b| b & 0x0F) == Some(MF_ACK)
    }
}

/// MFRC522 driver.
///
/// Holds no card state between calls; sequencing (request, anticollision,
/// select, authenticate) is up to the caller or to the `session` handles.
pub struct RfidRc522<P> {
    port: P,
    config: Config,
}

impl<SPI, CS> RfidRc522<RegisterPort<SPI, CS>>
where
    SPI: SpiBus<u8>,
    CS: OutputPin,
{
    pub fn new(spi: SPI, cs: CS) -> Result<Self, TransportError<SPI::Error, CS::Error>> {
        let mut port = RegisterPort::new(spi, cs);
        port.deselect()?;
        Ok(RfidRc522::with_port(port, Config::default()))
    }
}

impl<P: RegisterAccess> RfidRc522<P> {
    pub fn with_port(port: P, config: Config) -> Self {
        RfidRc522 { port, config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn release(self) -> P {
        self.port
    }

    /// Soft-resets and configures the chip, then switches the antenna on.
    /// Returns the VersionReg value.
    pub fn init<D, W>(&mut self, delay: &mut D, serial: &mut W) -> Result<u8, P::Error>
    where
        D: DelayNs,
        W: uWrite,
    {
        self.reset(delay)?;

        let timer = self.config.timer;
        self.port.write_register(T_MODE_REG, timer.mode)?;
        self.port.write_register(T_PRESCALER_REG, timer.prescaler)?;
        self.port.write_register(T_RELOAD_REG_L, (timer.reload & 0xFF) as u8)?;
        self.port.write_register(T_RELOAD_REG_H, (timer.reload >> 8) as u8)?;
        self.port.write_register(TX_ASK_REG, 0x40)?; // 100% ASK
        self.port.write_register(MODE_REG, 0x3D)?; // CRC preset to 0x6363
        if let Some(gain) = self.config.rx_gain {
            self.set_antenna_gain(gain)?;
        }
        self.antenna_on()?;

        let version = self.version()?;
        match version {
            0x91 | 0x92 => ufmt::uwriteln!(serial, "RC522 version 0x{:X} ready", version).ok(),
            _ => ufmt::uwriteln!(serial, "RC522 unknown version 0x{:X}", version).ok(),
        };
        Ok(version)
    }

    pub fn reset<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), P::Error> {
        self.port.write_register(COMMAND_REG, Command::SoftReset.code())?;
        // PowerDown (bit 4) stays set until the oscillator is back.
        for _ in 0..3 {
            delay.delay_ms(50);
            if self.port.read_register(COMMAND_REG)? & (1 << 4) == 0 {
                break;
            }
        }
        Ok(())
    }

    pub fn version(&mut self) -> Result<u8, P::Error> {
        self.port.read_register(VERSION_REG)
    }

    pub fn antenna_on(&mut self) -> Result<(), P::Error> {
        let current = self.port.read_register(TX_CONTROL_REG)?;
        if current & tx_control::ANTENNA != tx_control::ANTENNA {
            self.port.write_register(TX_CONTROL_REG, current | tx_control::ANTENNA)?;
        }
        Ok(())
    }

    pub fn antenna_off(&mut self) -> Result<(), P::Error> {
        self.port.clear_bits(TX_CONTROL_REG, tx_control::ANTENNA)
    }

    pub fn set_antenna_gain(&mut self, gain: RxGain) -> Result<(), P::Error> {
        self.port.clear_bits(RF_CFG_REG, rf_cfg::RX_GAIN_MASK)?;
        self.port.set_bits(RF_CFG_REG, gain.bits())
    }

    /// Drops any Crypto1 session and power-cycles the RF field so cards
    /// restart from IDLE. No chip reinitialisation needed.
    pub fn recover<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), P::Error> {
        self.stop_crypto1()?;
        self.antenna_off()?;
        delay.delay_ms(100);
        self.antenna_on()?;
        delay.delay_ms(100);
        Ok(())
    }

    /// CRC_A over `data` from the coprocessor, low byte first.
    ///
    /// If the coprocessor does not finish within the CRC poll budget the
    /// result registers are returned as they are; the command using the
    /// CRC will then fail on the card side.
    pub fn calculate_crc(&mut self, data: &[u8]) -> Result<[u8; 2], P::Error> {
        self.port.write_register(COMMAND_REG, Command::Idle.code())?;
        self.port.write_register(DIV_IRQ_REG, div_irq::CRC)?; // Set2 clear: clears CRCIRq
        self.port.set_bits(FIFO_LEVEL_REG, fifo_level::FLUSH_BUFFER)?;
        for &byte in data {
            self.port.write_register(FIFO_DATA_REG, byte)?;
        }
        self.port.write_register(COMMAND_REG, Command::CalcCrc.code())?;

        let port = &mut self.port;
        PollBudget::new(self.config.crc_poll_budget).poll(|| -> Result<_, P::Error> {
            let irq = port.read_register(DIV_IRQ_REG)?;
            Ok((irq & div_irq::CRC != 0).then_some(()))
        })?;
        self.port.write_register(COMMAND_REG, Command::Idle.code())?;

        Ok([
            self.port.read_register(CRC_RESULT_REG_L)?,
            self.port.read_register(CRC_RESULT_REG_H)?,
        ])
    }

    /// Runs `command` with `payload` in the FIFO and waits for it to finish.
    pub fn execute(&mut self, command: Command, payload: &[u8]) -> Result<Response, P::Error> {
        let irq_enable = command.irq_enable();
        let wait_irq = command.wait_irq();

        self.port.write_register(COM_IEN_REG, irq_enable | com_irq::IRQ_INV)?;
        self.port.clear_bits(COMM_IRQ_REG, com_irq::SET1)?; // writes back pending bits with Set1 clear
        self.port.set_bits(FIFO_LEVEL_REG, fifo_level::FLUSH_BUFFER)?;
        self.port.write_register(COMMAND_REG, Command::Idle.code())?;

        for &byte in payload {
            self.port.write_register(FIFO_DATA_REG, byte)?;
        }
        self.port.write_register(COMMAND_REG, command.code())?;
        if command.transmits() {
            self.port.set_bits(BIT_FRAMING_REG, bit_framing::START_SEND)?;
        }

        let port = &mut self.port;
        let irq = PollBudget::new(self.config.command_poll_budget).poll(|| -> Result<_, P::Error> {
            let irq = port.read_register(COMM_IRQ_REG)?;
            Ok((irq & (com_irq::TIMER | wait_irq) != 0).then_some(irq))
        })?;

        self.port.clear_bits(BIT_FRAMING_REG, bit_framing::START_SEND)?;

        let errors = self.port.read_register(ERROR_REG)? & error::FATAL;
        let outcome = match irq {
            _ if errors != 0 => Outcome::Error,
            None => Outcome::Error,
            Some(irq) if irq & irq_enable & com_irq::TIMER != 0 => Outcome::NoTag,
            Some(_) => Outcome::Ok,
        };

        if outcome != Outcome::Ok || !command.transmits() {
            return Ok(Response::failed(outcome));
        }

        let level = self.port.read_register(FIFO_LEVEL_REG)? & fifo_level::LEVEL_MASK;
        let last_bits = self.port.read_register(CONTROL_REG)? & control::RX_LAST_BITS;
        let bits = if last_bits != 0 {
            u16::from(level.saturating_sub(1)) * 8 + u16::from(last_bits)
        } else {
            u16::from(level) * 8
        };

        let mut frame = Frame::EMPTY;
        let count = usize::from(level).clamp(1, FIFO_FRAME_LIMIT);
        for _ in 0..count {
            frame.push(self.port.read_register(FIFO_DATA_REG)?);
        }

        Ok(Response {
            outcome,
            frame,
            bits,
        })
    }

    fn transceive(&mut self, payload: &[u8]) -> Result<Response, P::Error> {
        self.execute(Command::Transceive, payload)
    }

    /// Transceives `head` with its CRC_A appended.
    fn transceive_with_crc(&mut self, head: &[u8]) -> Result<Response, P::Error> {
        // CRC-framed commands are always whole bytes, whatever `request` left behind.
        self.port.write_register(BIT_FRAMING_REG, bit_framing::FULL_BYTES)?;
        let mut buffer = [0u8; BLOCK_SIZE + 2];
        let len = head.len().min(BLOCK_SIZE);
        buffer[..len].copy_from_slice(&head[..len]);
        let crc = self.calculate_crc(&buffer[..len])?;
        buffer[len..len + 2].copy_from_slice(&crc);
        self.transceive(&buffer[..len + 2])
    }

    /// REQA / WUPA. OK only with a 16-bit ATQA; returns the bit count seen.
    pub fn request(&mut self, mode: RequestMode) -> Result<(Outcome, u16), P::Error> {
        self.port.write_register(BIT_FRAMING_REG, bit_framing::SHORT_FRAME)?;
        let response = self.transceive(&[mode.code()])?;

        let outcome = match response.outcome {
            Outcome::Ok if response.bits != 16 => Outcome::Error,
            outcome => outcome,
        };
        Ok((outcome, response.bits))
    }

    /// Cascade level 1 anticollision. The UID is returned only with
    /// `Outcome::Ok`, after its BCC checked out.
    ///
    /// A cascade tag in the first byte means a 7 or 10 byte UID, which is
    /// not supported and reported as `Outcome::Error`.
    pub fn anticollision(&mut self) -> Result<(Outcome, Option<Uid>), P::Error> {
        self.port.write_register(BIT_FRAMING_REG, bit_framing::FULL_BYTES)?;
        let response = self.transceive(&[PICC_SEL_CL1, NVB_ANTICOLLISION])?;
        if response.outcome != Outcome::Ok {
            return Ok((response.outcome, None));
        }

        let answer = response.frame.as_slice();
        match Uid::from_anticollision(answer) {
            Some(uid) if uid.bytes()[0] != PICC_CT => Ok((Outcome::Ok, Some(uid))),
            _ => Ok((Outcome::Error, None)),
        }
    }

    /// SELECT at cascade level 1. OK only with a 24-bit SAK + CRC_A answer.
    pub fn select_tag(&mut self, uid: &Uid) -> Result<Outcome, P::Error> {
        self.select(uid).map(|(outcome, _)| outcome)
    }

    pub(crate) fn select(&mut self, uid: &Uid) -> Result<(Outcome, Option<CardType>), P::Error> {
        let b = uid.bytes();
        let frame = [PICC_SEL_CL1, NVB_SELECT, b[0], b[1], b[2], b[3], uid.bcc()];
        let response = self.transceive_with_crc(&frame)?;

        match response.outcome {
            Outcome::Ok if response.bits != 24 => Ok((Outcome::Error, None)),
            Outcome::Ok => {
                let sak = response.frame.as_slice()[0];
                // Cascade bit: the UID continues at level 2.
                if sak & 0x04 != 0 {
                    Ok((Outcome::Error, None))
                } else {
                    Ok((Outcome::Ok, Some(CardType::from_sak(sak))))
                }
            }
            outcome => Ok((outcome, None)),
        }
    }

    /// MFAuthent for the sector holding `block`. The chip runs the Crypto1
    /// handshake; success leaves MFCrypto1On set in Status2Reg.
    pub fn authenticate(
        &mut self,
        key_type: KeyType,
        block: u8,
        key: &AuthKey,
        uid: &Uid,
    ) -> Result<Outcome, P::Error> {
        let mut payload = [0u8; 12];
        payload[0] = key_type.code();
        payload[1] = block;
        payload[2..8].copy_from_slice(key.bytes());
        payload[8..].copy_from_slice(uid.bytes());

        let response = self.execute(Command::MfAuthent, &payload)?;
        if response.outcome != Outcome::Ok {
            return Ok(response.outcome);
        }
        let status = self.port.read_register(STATUS2_REG)?;
        if status & status2::MF_CRYPTO1_ON == 0 {
            return Ok(Outcome::Error);
        }
        Ok(Outcome::Ok)
    }

    /// Leaves the authenticated state. Required before authenticating
    /// another sector.
    pub fn stop_crypto1(&mut self) -> Result<(), P::Error> {
        self.port.clear_bits(STATUS2_REG, status2::MF_CRYPTO1_ON)
    }

    /// Reads one block. `None` unless the card answered with data; the
    /// length is whatever the card sent, up to 16 bytes.
    pub fn read_block(&mut self, block: u8) -> Result<Option<Frame>, P::Error> {
        let response = self.transceive_with_crc(&[PICC_MF_READ, block])?;
        // A 4-bit answer is a NAK, not data.
        if response.outcome != Outcome::Ok || response.bits == 4 {
            return Ok(None);
        }
        Ok(Some(response.frame))
    }

    /// Two-phase MIFARE write. Phase 2 is only sent after phase 1 was
    /// acknowledged; both must be acknowledged for `Outcome::Ok`.
    pub fn write_block(&mut self, block: u8, data: &Block) -> Result<Outcome, P::Error> {
        let response = self.transceive_with_crc(&[PICC_MF_WRITE, block])?;
        if !response.is_mifare_ack() {
            return Ok(Outcome::Error);
        }

        let response = self.transceive_with_crc(data)?;
        if !response.is_mifare_ack() {
            return Ok(Outcome::Error);
        }
        Ok(Outcome::Ok)
    }

    /// HLTA. The card must stay silent, so `NoTag` is success here.
    pub fn halt(&mut self) -> Result<Outcome, P::Error> {
        let response = self.transceive_with_crc(&[PICC_HLTA, 0x00])?;
        Ok(match response.outcome {
            Outcome::NoTag => Outcome::Ok,
            _ => Outcome::Error,
        })
    }
}
