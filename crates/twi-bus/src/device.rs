use crate::bus::{Operation, TwiBus};
use crate::error::TwiError;

/// Binds a bus manager and a fixed 7-bit device address.
///
/// Forwards read/write calls to the underlying bus with the address
/// applied. Holds no protocol state of its own; the handle is a cheap
/// value and may be copied freely. The bus manager must outlive every
/// handle bound to it, which the borrow enforces.
pub struct TwiDevice<'a, B: TwiBus> {
    bus: &'a B,
    addr: u8,
}

impl<B: TwiBus> Copy for TwiDevice<'_, B> {}

impl<B: TwiBus> Clone for TwiDevice<'_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, B: TwiBus> TwiDevice<'a, B> {
    /// Create a handle for the device at `addr`.
    ///
    /// `addr` is the bare 7-bit address; the read/write direction bit is
    /// applied on the wire, never stored here.
    pub const fn new(bus: &'a B, addr: u8) -> Self {
        Self { bus, addr }
    }

    /// The 7-bit device address.
    pub const fn address(&self) -> u8 {
        self.addr
    }

    /// Start a transaction on the underlying bus.
    pub async fn acquire(&self) -> Result<(), TwiError> {
        self.bus.acquire().await
    }

    /// End the transaction on the underlying bus.
    pub async fn release(&self) -> Result<(), TwiError> {
        self.bus.release().await
    }

    /// Read `buf.len()` bytes from the device.
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize, TwiError> {
        self.bus.read(self.addr, buf).await
    }

    /// Write `buf` to the device.
    pub async fn write(&self, buf: &[u8]) -> Result<usize, TwiError> {
        self.bus.write(self.addr, buf).await
    }

    /// Write the concatenation of `bufs` to the device as one stream.
    pub async fn write_vectored(
        &self,
        bufs: &[&[u8]],
    ) -> Result<usize, TwiError> {
        self.bus.write_vectored(self.addr, bufs).await
    }

    /// Run a sequence of operations against the device as one
    /// bus-ownership window. See [`TwiBus::transaction`].
    pub async fn transaction(
        &self,
        ops: &mut [Operation<'_>],
    ) -> Result<usize, TwiError> {
        self.bus.transaction(self.addr, ops).await
    }

    /// Scoped presence probe: a zero-payload write in its own transaction.
    ///
    /// Returns `Ok(true)` if the device acknowledged its address and
    /// `Ok(false)` if it did not, the expected outcome while scanning the
    /// bus or polling for write-cycle completion. The bus is released on
    /// every path.
    pub async fn probe(&self) -> Result<bool, TwiError> {
        let res = match self.bus.acquire().await {
            Ok(()) => self.bus.write_vectored(self.addr, &[]).await,
            Err(e) => Err(e),
        };
        let released = self.bus.release().await;
        match res {
            Ok(_) => {
                released?;
                Ok(true)
            }
            Err(TwiError::NoAcknowledge) => {
                released?;
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Write `wbuf`, then read into `rbuf`, in one transaction.
    ///
    /// The read phase follows the write phase through a repeated start, so
    /// the combined operation cannot be interrupted by another bus agent.
    /// Returns the total number of bytes moved in both phases. The bus is
    /// released on every path.
    pub async fn write_read(
        &self,
        wbuf: &[u8],
        rbuf: &mut [u8],
    ) -> Result<usize, TwiError> {
        self.transaction(&mut [Operation::Write(wbuf), Operation::Read(rbuf)])
            .await
    }
}
