#![no_std]
#![no_main]

use arduino_hal::default_serial;
use arduino_hal::spi;
use embedded_hal::spi::{Mode, Phase, Polarity};
use panic_halt as _;
use rfid_rc522_mifare::presence::{Presence, PresenceTracker};
use rfid_rc522_mifare::record::{self, RECORD_AUTH_BLOCK};
use rfid_rc522_mifare::{AuthKey, KeyType, RequestMode, RfidRc522, SessionError};
use ufmt::uwriteln;

const RECORD: &[u8] = br#"{"name":"Garrafa"}"#;

#[arduino_hal::entry]
fn main() -> ! {
    let dp = arduino_hal::Peripherals::take().unwrap();
    let pins = arduino_hal::pins!(dp);

    let mut serial = default_serial!(dp, pins, 9600);
    let mut delay = arduino_hal::Delay::new();

    let settings = spi::Settings {
        data_order: spi::DataOrder::MostSignificantFirst,
        mode: Mode {
            polarity: Polarity::IdleLow,
            phase: Phase::CaptureOnFirstTransition,
        },
        clock: spi::SerialClockRate::OscfOver64,
    };

    let sclk = pins.d13.into_output();
    let mosi = pins.d11.into_output();
    let miso = pins.d12.into_pull_up_input();
    let cs = pins.d10.into_output();
    let (spi, cs_pin) = spi::Spi::new(dp.SPI, sclk, mosi, miso, cs, settings);

    let mut rfid = match RfidRc522::new(spi, cs_pin) {
        Ok(rfid) => rfid,
        Err(e) => {
            uwriteln!(&mut serial, "Reader setup failed: {:?}", e).ok();
            loop {}
        }
    };
    if let Err(e) = rfid.init(&mut delay, &mut serial) {
        uwriteln!(&mut serial, "Reader init failed: {:?}", e).ok();
        loop {}
    }
    uwriteln!(&mut serial, "Waiting for a card...").ok();

    let mut tracker = PresenceTracker::new();

    loop {
        let selected = match rfid.activate(RequestMode::Idle) {
            Ok(selected) => selected,
            Err(SessionError::NoTag) => {
                if tracker.observe(None) == Presence::Removed {
                    uwriteln!(&mut serial, "Card removed").ok();
                }
                arduino_hal::delay_ms(200);
                continue;
            }
            Err(e) => {
                uwriteln!(&mut serial, "Activation failed: {:?}", e).ok();
                rfid.recover(&mut delay).ok();
                continue;
            }
        };

        let uid = *selected.uid();
        if tracker.observe(Some(uid)) == Presence::Still {
            selected.halt().ok();
            rfid.recover(&mut delay).ok();
            arduino_hal::delay_ms(300);
            continue;
        }
        uwriteln!(&mut serial, "Card {} ({:?})", uid, selected.card_type()).ok();

        let written = selected
            .authenticate(KeyType::A, RECORD_AUTH_BLOCK, &AuthKey::DEFAULT)
            .and_then(|session| session.write_record(RECORD))
            .and_then(|session| session.read_record())
            .and_then(|(session, raw)| {
                match record::decode(&raw) {
                    Ok(text) if text.as_bytes() == RECORD => {
                        uwriteln!(&mut serial, "Wrote {}", text).ok();
                    }
                    _ => {
                        uwriteln!(&mut serial, "Read back does not match").ok();
                    }
                }
                session.finish()
            });

        match written {
            Ok(selected) => {
                selected.halt().ok();
            }
            Err(e) => {
                uwriteln!(&mut serial, "Write failed: {:?}", e).ok();
                // Try again when the card is presented next time.
                tracker.clear();
            }
        }

        rfid.recover(&mut delay).ok();
        arduino_hal::delay_ms(2000);
    }
}
