#![cfg_attr(not(test), no_std)]
// src/lib.rs
//
// MFRC522 driver: ISO/IEC 14443-A activation and MIFARE Classic block access.

pub mod card_types;
pub mod commands;
pub mod config;
pub mod errors;
pub mod poll;
pub mod presence;
pub mod record;
pub mod register_port;
pub mod registers;
pub mod rfid_rc522;
pub mod session;

pub use card_types::{AuthKey, Block, CardType, Uid};
pub use commands::{Command, KeyType, RequestMode};
pub use config::{Config, RxGain, TimerConfig};
pub use errors::{Outcome, SessionError, TransportError};
pub use register_port::{RegisterAccess, RegisterPort};
pub use rfid_rc522::{Frame, Response, RfidRc522};
pub use session::{Authenticated, Selected};
