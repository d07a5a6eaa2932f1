//! UART link to the autonomous driver.
//!
//! Bytes are handed to the control task one at a time through a queue so
//! line assembly happens in the controller, next to mode arbitration.
//! Outbound status lines go the other way through a second queue; the
//! control cycle never waits on the UART.
//!
//! # Pins
//!
//! Uses UART1:
//! - GPIO 8: TX
//! - GPIO 9: RX

use drive_core::StatusSink;
use drive_proto::{Serialize, StatusLine, MAX_STATUS_LINE_SIZE};
use embassy_rp::uart::{Async, UartRx, UartTx};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

/// Received bytes waiting for the control task.
///
/// At 115200 baud a byte arrives every ~87 us, so a 1 ms cycle drains
/// about a dozen per tick.
pub type ByteQueue = Channel<CriticalSectionRawMutex, u8, 64>;

/// Status lines waiting for the UART writer.
pub type StatusQueue = Channel<CriticalSectionRawMutex, StatusLine, 8>;

/// Read bytes from `rx` forever.
///
/// UART errors are logged and reading continues; the line decoder
/// resynchronizes on the next terminator. When the queue is full the byte
/// is dropped.
pub async fn read_bytes(mut rx: UartRx<'_, Async>, queue: &ByteQueue) -> ! {
    let mut byte = [0u8; 1];
    loop {
        match rx.read(&mut byte).await {
            Ok(()) => {
                if queue.try_send(byte[0]).is_err() {
                    defmt::warn!("rx queue full, byte dropped");
                }
            }
            Err(e) => defmt::error!("UART read error: {:?}", e),
        }
    }
}

/// Serialize and transmit queued status lines forever.
pub async fn write_status_lines(mut tx: UartTx<'_, Async>, queue: &StatusQueue) -> ! {
    let mut buf = [0u8; MAX_STATUS_LINE_SIZE];
    loop {
        let line = queue.receive().await;
        match line.serialize(&mut buf) {
            Ok(len) => {
                if let Err(e) = tx.write(&buf[..len]).await {
                    defmt::error!("UART write error: {:?}", e);
                }
            }
            Err(e) => defmt::error!("status line serialize error: {:?}", e),
        }
    }
}

/// [`StatusSink`] that enqueues lines for [`write_status_lines`].
///
/// Lines are dropped, not awaited, when the queue is full.
pub struct QueueStatusSink {
    queue: &'static StatusQueue,
}

impl QueueStatusSink {
    #[must_use]
    pub const fn new(queue: &'static StatusQueue) -> Self {
        Self { queue }
    }
}

impl StatusSink for QueueStatusSink {
    fn emit(&mut self, line: &StatusLine) {
        if self.queue.try_send(*line).is_err() {
            defmt::warn!("status queue full, dropped {}", line);
        }
    }
}
