// src/registers.rs
//
// Register addresses are the raw 6-bit values from the datasheet (0x00..=0x3F).
// The SPI address byte is built by `read_address` / `write_address`.

// Basic Configuration and Command Registers
pub const COMMAND_REG: u8 = 0x01;
pub const COM_IEN_REG: u8 = 0x02;         // Communication Interrupt Enable Register
pub const COMM_IRQ_REG: u8 = 0x04;        // Interrupt request bits
pub const DIV_IRQ_REG: u8 = 0x05;         // Set bits to signal internal events
pub const ERROR_REG: u8 = 0x06;           // Error bits showing the error status of the last command
pub const STATUS2_REG: u8 = 0x08;         // Receiver and transmitter status bits
pub const FIFO_DATA_REG: u8 = 0x09;       // FIFO data input/output
pub const FIFO_LEVEL_REG: u8 = 0x0A;      // Number of bytes in the FIFO buffer
pub const CONTROL_REG: u8 = 0x0C;         // Miscellaneous control bits
pub const BIT_FRAMING_REG: u8 = 0x0D;     // Adjustments for bit-oriented frames

// Timer and Timeout Configuration
pub const MODE_REG: u8 = 0x11;            // Defines general modes for transmitting and receiving
pub const T_MODE_REG: u8 = 0x2A;          // TModeReg - Timer settings
pub const T_PRESCALER_REG: u8 = 0x2B;     // TPrescalerReg - Timer prescaler value
pub const T_RELOAD_REG_H: u8 = 0x2C;      // TReloadReg (High) - 16-bit timer reload value (high byte)
pub const T_RELOAD_REG_L: u8 = 0x2D;      // TReloadReg (Low) - 16-bit timer reload value (low byte)

// RF Configuration
pub const TX_CONTROL_REG: u8 = 0x14;      // Controls the logical behavior of the antenna driver pins TX1 and TX2
pub const TX_ASK_REG: u8 = 0x15;          // Controls the setting of the transmission modulation
pub const RF_CFG_REG: u8 = 0x26;          // Configures the receiver gain

// CRC and version
pub const CRC_RESULT_REG_H: u8 = 0x21;    // CRC calculation result, MSB
pub const CRC_RESULT_REG_L: u8 = 0x22;    // CRC calculation result, LSB
pub const VERSION_REG: u8 = 0x37;         // Shows the software version

/// Highest addressable register.
pub const MAX_REGISTER: u8 = 0x3F;

/// Address byte for a register write: address in bits 6..1, bit 7 clear.
pub const fn write_address(reg: u8) -> u8 {
    (reg << 1) & 0x7E
}

/// Address byte for a register read: address in bits 6..1, bit 7 set.
pub const fn read_address(reg: u8) -> u8 {
    ((reg << 1) & 0x7E) | 0x80
}

/// ComIrqReg / ComIEnReg bits.
pub mod com_irq {
    /// Writing to ComIrqReg with this bit set sets the marked bits, clear clears them.
    pub const SET1: u8 = 1 << 7;
    /// Inverts the IRQ pin (ComIEnReg only).
    pub const IRQ_INV: u8 = 1 << 7;
    pub const TX: u8 = 1 << 6;
    pub const RX: u8 = 1 << 5;
    pub const IDLE: u8 = 1 << 4;
    pub const LO_ALERT: u8 = 1 << 2;
    pub const ERR: u8 = 1 << 1;
    /// Timer reached zero: nothing answered in time.
    pub const TIMER: u8 = 1 << 0;
}

/// DivIrqReg bits.
pub mod div_irq {
    pub const CRC: u8 = 1 << 2;
}

/// ErrorReg bits.
pub mod error {
    pub const BUFFER_OVFL: u8 = 1 << 4;
    pub const COLL_ERR: u8 = 1 << 3;
    pub const CRC_ERR: u8 = 1 << 2;
    pub const PARITY_ERR: u8 = 1 << 1;
    pub const PROTOCOL_ERR: u8 = 1 << 0;

    /// Errors that fail a command. CRCErr is left out: MFAuthent and the
    /// MIFARE acknowledge frames carry no CRC_A.
    pub const FATAL: u8 = BUFFER_OVFL | COLL_ERR | PARITY_ERR | PROTOCOL_ERR;
}

/// Status2Reg bits.
pub mod status2 {
    /// Crypto1 unit is switched on; only a successful MFAuthent sets it.
    pub const MF_CRYPTO1_ON: u8 = 1 << 3;
}

/// FIFOLevelReg bits.
pub mod fifo_level {
    pub const FLUSH_BUFFER: u8 = 1 << 7;
    pub const LEVEL_MASK: u8 = 0x7F;
}

/// ControlReg bits.
pub mod control {
    /// Number of valid bits in the last received byte, 0 meaning all 8.
    pub const RX_LAST_BITS: u8 = 0x07;
}

/// BitFramingReg bits.
pub mod bit_framing {
    pub const START_SEND: u8 = 1 << 7;
    /// REQA / WUPA are 7-bit short frames.
    pub const SHORT_FRAME: u8 = 0x07;
    pub const FULL_BYTES: u8 = 0x00;
}

/// TxControlReg bits.
pub mod tx_control {
    /// Tx1RFEn | Tx2RFEn
    pub const ANTENNA: u8 = 0x03;
}

/// RFCfgReg bits.
pub mod rf_cfg {
    pub const RX_GAIN_MASK: u8 = 0x70;
}
