//! Receiver pulse capture on GPIO edges.

use drive_core::PulseChannel;
use embassy_time::Instant;
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;

/// Measure pulses on `pin` forever, publishing each width to `channel`.
///
/// Run this from a high-priority executor so the timestamp is taken as
/// close to the edge as possible. The level is sampled after the edge
/// fires; a pulse shorter than the wake-up latency may be missed, which
/// only costs one refresh.
pub async fn capture_pulses<P>(mut pin: P, channel: &PulseChannel) -> !
where
    P: Wait + InputPin,
{
    loop {
        if pin.wait_for_any_edge().await.is_err() {
            continue;
        }
        let now_us = Instant::now().as_micros() as u32;
        match pin.is_high() {
            Ok(level_high) => channel.on_edge(level_high, now_us),
            Err(_) => defmt::trace!("pin level read failed"),
        }
    }
}
