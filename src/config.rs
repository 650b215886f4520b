// src/config.rs

/// Receiver gain written to RFCfgReg[6:4].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxGain {
    Db18 = 0x00,
    Db23 = 0x10,
    Db33 = 0x40,
    Db38 = 0x50,
    Db43 = 0x60,
    Db48 = 0x70,
}

impl RxGain {
    pub const MAX: RxGain = RxGain::Db48;

    pub const fn bits(self) -> u8 {
        self as u8
    }
}

/// Internal timer setup. The timer bounds how long the chip waits for a
/// card to answer and raises the timer IRQ that maps to `Outcome::NoTag`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerConfig {
    /// TModeReg; bit 7 (TAuto) starts the timer at the end of each transmission.
    pub mode: u8,
    pub prescaler: u8,
    pub reload: u16,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            mode: 0x8D,
            prescaler: 0x3E,
            reload: 30,
        }
    }
}

/// Driver configuration.
///
/// Both poll budgets count register reads, not time: how long a budget lasts
/// depends on the SPI clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// ComIrqReg reads before a command is abandoned as timed out.
    pub command_poll_budget: u16,
    /// DivIrqReg reads before the CRC result is taken as-is.
    pub crc_poll_budget: u16,
    pub timer: TimerConfig,
    /// `None` keeps the chip's reset value.
    pub rx_gain: Option<RxGain>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            command_poll_budget: 2000,
            crc_poll_budget: 0xFF,
            timer: TimerConfig::default(),
            rx_gain: None,
        }
    }
}

impl Config {
    pub fn with_command_poll_budget(mut self, polls: u16) -> Self {
        self.command_poll_budget = polls;
        self
    }

    pub fn with_crc_poll_budget(mut self, polls: u16) -> Self {
        self.crc_poll_budget = polls;
        self
    }

    pub fn with_timer(mut self, timer: TimerConfig) -> Self {
        self.timer = timer;
        self
    }

    pub fn with_rx_gain(mut self, gain: RxGain) -> Self {
        self.rx_gain = Some(gain);
        self
    }
}
