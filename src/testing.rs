//! Pin transaction scripts shared by the unit tests.

use embedded_hal_mock::eh1::delay::Transaction as DelayTx;
use embedded_hal_mock::eh1::digital::{State as MockState, Transaction as PinTx};

use crate::frame::Frame;
use crate::timing::Timing;

/// LOW phase preceding every bit.
pub const PULSE_LOW: u32 = 50;
/// HIGH phase of a 0 bit.
pub const ZERO_HIGH: u32 = 27;
/// HIGH phase of a 1 bit.
pub const ONE_HIGH: u32 = 70;
/// Each half of the sensor's acknowledgement.
pub const ACK: u32 = 80;
/// Delay before the sensor pulls the line low after release.
pub const LATENCY: u32 = 3;

/// Timing a successful calibration derives from the pulses above.
pub fn calibrated_timing() -> Timing {
    Timing {
        threshold: PULSE_LOW,
        timeout_ceiling: ONE_HIGH + ONE_HIGH / 4,
    }
}

fn opposite(state: MockState) -> MockState {
    match state {
        MockState::Low => MockState::High,
        MockState::High => MockState::Low,
    }
}

/// `count` polls at `level`, then the poll that ends the phase.
pub fn pulse(level: MockState, count: u32) -> Vec<PinTx> {
    let mut tx: Vec<PinTx> = (0..count).map(|_| PinTx::get(level)).collect();
    tx.push(PinTx::get(opposite(level)));
    tx
}

/// A phase that never ends: `ceiling` polls at `level`.
pub fn timeout(level: MockState, ceiling: u32) -> Vec<PinTx> {
    (0..ceiling).map(|_| PinTx::get(level)).collect()
}

/// Start signal followed by the sensor's acknowledgement.
pub fn start_sequence() -> Vec<PinTx> {
    let mut tx = vec![
        // MCU pulls the line low, then releases it
        PinTx::set(MockState::Low),
        PinTx::set(MockState::High),
    ];
    tx.extend(pulse(MockState::High, LATENCY));
    tx.extend(pulse(MockState::Low, ACK));
    tx.extend(pulse(MockState::High, ACK));
    tx
}

/// Encodes one bit (LOW phase, then a short or long HIGH phase).
fn encode_bit(bit: bool) -> Vec<PinTx> {
    let mut tx = pulse(MockState::Low, PULSE_LOW);
    tx.extend(pulse(
        MockState::High,
        if bit { ONE_HIGH } else { ZERO_HIGH },
    ));
    tx
}

fn bits(bytes: [u8; 5]) -> impl Iterator<Item = bool> {
    (0..40).map(move |i| (bytes[i / 8] >> (7 - (i % 8))) & 1 == 1)
}

/// A full transmission of `bytes`, MSB first.
pub fn transmission(bytes: [u8; 5]) -> Vec<PinTx> {
    let mut tx = start_sequence();
    for bit in bits(bytes) {
        tx.extend(encode_bit(bit));
    }
    tx
}

/// Delay calls made while receiving [`transmission`]`(bytes)`: the start
/// signal, then one 1us delay per polling iteration.
pub fn transmission_delays(bytes: [u8; 5]) -> Vec<DelayTx> {
    let highs: u32 = bits(bytes)
        .map(|bit| if bit { ONE_HIGH } else { ZERO_HIGH })
        .sum();
    let polls = LATENCY + 2 * ACK + 40 * PULSE_LOW + highs;

    let mut tx = vec![DelayTx::delay_ms(18), DelayTx::delay_us(20)];
    tx.extend((0..polls).map(|_| DelayTx::delay_us(1)));
    tx
}

/// A transmission of `payload` with a correct checksum.
pub fn valid_transmission(payload: [u8; 4]) -> Vec<PinTx> {
    transmission(*Frame::with_checksum(payload).bytes())
}

/// `payload` followed by a checksum that is off by one.
pub fn corrupt_bytes(payload: [u8; 4]) -> [u8; 5] {
    let mut bytes = *Frame::with_checksum(payload).bytes();
    bytes[4] = bytes[4].wrapping_add(1);
    bytes
}

/// A transmission of `payload` whose checksum is off by one.
pub fn corrupt_transmission(payload: [u8; 4]) -> Vec<PinTx> {
    transmission(corrupt_bytes(payload))
}
