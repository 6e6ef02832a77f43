use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal_async::delay::DelayNs;
use portable_atomic::{AtomicBool, Ordering};
use twi_bus::{TwiBus, TwiError};

use crate::config::Config;
use crate::line::Line;

/// Protocol position within a held transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// A start condition was just issued; the next addressing step needs
    /// no preceding signaling.
    Start,
    /// Mid-transaction; the last completed operation was a read.
    Idle,
    /// Mid-transaction; the last completed operation was a write and no
    /// stop condition has been emitted yet.
    WriteOpen,
}

/// Software bus manager bit-banging the protocol over two [`Line`]s.
///
/// One instance owns one physical bus: the busy flag and the protocol
/// phase are scoped to the instance, so independent buses use independent
/// instances. Operations take `&self`; the busy flag serializes
/// transactions between cooperative tasks while the mutex keeps the line
/// state sound across calls.
pub struct BitbangTwi<M: RawMutex, SDA, SCL, D> {
    busy: AtomicBool,
    inner: Mutex<M, Inner<SDA, SCL, D>>,
}

struct Inner<SDA, SCL, D> {
    sda: SDA,
    scl: SCL,
    delay: D,
    config: Config,
    phase: Phase,
}

impl<M: RawMutex, SDA: Line, SCL: Line, D: DelayNs> BitbangTwi<M, SDA, SCL, D> {
    /// Create a bus manager with default timing. See
    /// [`with_config`](Self::with_config).
    pub fn new(sda: SDA, scl: SCL, delay: D) -> Self {
        Self::with_config(sda, scl, delay, Config::default())
    }

    /// Create a bus manager with the given timing parameters.
    ///
    /// Both lines are released so the bus idles high through its external
    /// pull-ups.
    pub fn with_config(
        mut sda: SDA,
        mut scl: SCL,
        delay: D,
        config: Config,
    ) -> Self {
        sda.release();
        scl.release();
        Self {
            busy: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                sda,
                scl,
                delay,
                config,
                phase: Phase::Idle,
            }),
        }
    }
}

impl<M: RawMutex, SDA, SCL, D> BitbangTwi<M, SDA, SCL, D> {
    /// Consume the bus manager and recover the lines and delay.
    pub fn into_parts(self) -> (SDA, SCL, D) {
        let inner = self.inner.into_inner();
        (inner.sda, inner.scl, inner.delay)
    }
}

impl<M: RawMutex, SDA: Line, SCL: Line, D: DelayNs> TwiBus
    for BitbangTwi<M, SDA, SCL, D>
{
    async fn acquire(&self) -> Result<(), TwiError> {
        while self.busy.swap(true, Ordering::Acquire) {
            yield_now().await;
        }
        // On failure the busy flag stays set: the caller owns the matching
        // release() on every exit path.
        let mut bus = self.inner.lock().await;
        bus.start_condition().await
    }

    async fn release(&self) -> Result<(), TwiError> {
        let mut bus = self.inner.lock().await;
        let res = if bus.phase == Phase::WriteOpen {
            bus.stop_condition().await
        } else {
            Ok(())
        };
        bus.phase = Phase::Idle;
        drop(bus);
        self.busy.store(false, Ordering::Release);
        res
    }

    async fn read(&self, addr: u8, buf: &mut [u8]) -> Result<usize, TwiError> {
        if buf.is_empty() {
            return Ok(0);
        }
        let mut bus = self.inner.lock().await;
        bus.restart_if_needed().await?;
        bus.phase = Phase::Idle;
        bus.address(addr, true).await?;
        let count = buf.len();
        for (i, slot) in buf.iter_mut().enumerate() {
            // ACK all but the final byte; the NACK tells the device no
            // more bytes are wanted.
            let ack = i + 1 != count;
            *slot = bus.read_byte(ack).await?;
        }
        Ok(count)
    }

    async fn write_vectored(
        &self,
        addr: u8,
        bufs: &[&[u8]],
    ) -> Result<usize, TwiError> {
        let mut bus = self.inner.lock().await;
        bus.restart_if_needed().await?;
        // The write is open from its addressing step on: even a NACK'd
        // probe ends with the closing stop condition at release().
        bus.phase = Phase::WriteOpen;
        bus.address(addr, false).await?;
        let mut count = 0;
        for buf in bufs {
            for &byte in *buf {
                if bus.write_byte(byte).await? {
                    return Err(TwiError::ShortTransfer { done: count });
                }
                count += 1;
            }
        }
        Ok(count)
    }
}

impl<SDA: Line, SCL: Line, D: DelayNs> Inner<SDA, SCL, D> {
    /// Issue a start condition and reset the protocol phase.
    async fn start_condition(&mut self) -> Result<(), TwiError> {
        self.sda.release();
        if !self.sda.is_high() {
            return Err(TwiError::BusUnavailable);
        }
        self.sda.drive_low();
        self.delay.delay_us(self.config.t_start_us).await;
        self.scl.drive_low();
        self.phase = Phase::Start;
        Ok(())
    }

    /// Issue a repeated start without an intervening stop, preserving bus
    /// ownership across combined operations.
    async fn repeated_start_condition(&mut self) -> Result<(), TwiError> {
        self.scl.release();
        self.delay.delay_us(self.config.t_clock_us).await;
        self.sda.release();
        if !self.sda.is_high() {
            return Err(TwiError::BusUnavailable);
        }
        self.sda.drive_low();
        self.delay.delay_us(self.config.t_start_us).await;
        self.scl.drive_low();
        self.phase = Phase::Start;
        Ok(())
    }

    /// Issue a stop condition, closing the transaction on the wire.
    async fn stop_condition(&mut self) -> Result<(), TwiError> {
        self.sda.drive_low();
        self.delay.delay_us(self.config.t_clock_us).await;
        self.scl.release();
        self.clock_stretching().await?;
        self.delay.delay_us(self.config.t_clock_us).await;
        self.sda.release();
        self.delay.delay_us(self.config.t_clock_us).await;
        if !self.sda.is_high() {
            return Err(TwiError::BusUnavailable);
        }
        self.delay.delay_us(self.config.t_clock_us).await;
        Ok(())
    }

    /// Wait for the released clock line to read high, tolerating a device
    /// stretching it low up to the retry ceiling.
    async fn clock_stretching(&mut self) -> Result<(), TwiError> {
        for _ in 0..self.config.stretch_retries {
            if self.scl.is_high() {
                return Ok(());
            }
            self.delay.delay_us(self.config.t_clock_us).await;
        }
        #[cfg(feature = "defmt")]
        defmt::warn!(
            "clock stretched beyond {} polls",
            self.config.stretch_retries
        );
        Err(TwiError::ClockStretchTimeout)
    }

    /// Clock one bit out: drive low for 0, release for 1.
    async fn write_bit(&mut self, value: bool) -> Result<(), TwiError> {
        if value {
            self.sda.release();
        } else {
            self.sda.drive_low();
        }
        self.delay.delay_us(self.config.t_clock_us).await;
        self.scl.release();
        self.delay.delay_us(self.config.t_clock_us).await;
        self.clock_stretching().await?;
        self.scl.drive_low();
        Ok(())
    }

    /// Clock one bit in from the released data line.
    async fn read_bit(&mut self) -> Result<bool, TwiError> {
        self.sda.release();
        self.delay.delay_us(self.config.t_clock_us).await;
        self.scl.release();
        self.clock_stretching().await?;
        self.delay.delay_us(self.config.t_clock_us).await;
        let value = self.sda.is_high();
        self.scl.drive_low();
        Ok(value)
    }

    /// Transmit one byte, MSB first, and sample the acknowledgement bit
    /// driven by the device. Returns `true` on NACK.
    async fn write_byte(&mut self, byte: u8) -> Result<bool, TwiError> {
        let mut data = byte;
        for _ in 0..8 {
            self.write_bit(data & 0x80 != 0).await?;
            data <<= 1;
        }
        self.read_bit().await
    }

    /// Receive one byte, MSB first, then drive the acknowledgement bit:
    /// ACK when more bytes will follow, NACK otherwise.
    async fn read_byte(&mut self, ack: bool) -> Result<u8, TwiError> {
        let mut byte = 0;
        for _ in 0..8 {
            byte = (byte << 1) | self.read_bit().await? as u8;
        }
        self.write_bit(!ack).await?;
        Ok(byte)
    }

    /// Emit a repeated start unless a start condition was just issued.
    async fn restart_if_needed(&mut self) -> Result<(), TwiError> {
        if self.phase != Phase::Start {
            self.repeated_start_condition().await?;
        }
        Ok(())
    }

    /// Transmit the address byte with the direction bit appended.
    async fn address(&mut self, addr: u8, read: bool) -> Result<(), TwiError> {
        if self.write_byte((addr << 1) | read as u8).await? {
            return Err(TwiError::NoAcknowledge);
        }
        Ok(())
    }
}
