use crate::error::TwiError;

/// One step of a scoped [`transaction`](TwiBus::transaction).
#[derive(Debug)]
pub enum Operation<'a> {
    /// Write the buffer to the device.
    Write(&'a [u8]),
    /// Read from the device into the buffer.
    Read(&'a mut [u8]),
}

/// Bus manager capability set shared by all two-wire bus implementations.
///
/// All read/write calls between one `acquire()` and its `release()` form a
/// single bus-ownership window; no other transaction may interleave within
/// that window. Addresses are bare 7-bit values; the direction bit is
/// applied by the implementation when the address byte is put on the wire.
pub trait TwiBus {
    /// Start a bus transaction.
    ///
    /// Blocks cooperatively until the bus is free, then marks it held by
    /// the caller and issues a start condition. Fails with
    /// [`TwiError::BusUnavailable`] if another agent is driving the bus;
    /// the bus stays marked held even then, so the caller owns the matching
    /// [`release`](Self::release) on every exit path.
    async fn acquire(&self) -> Result<(), TwiError>;

    /// End a bus transaction and mark the bus free.
    ///
    /// Closes a pending write with a stop condition. The bus is marked free
    /// unconditionally, even when the stop condition fails. Must be called
    /// exactly once per `acquire()`, on success and failure paths alike.
    async fn release(&self) -> Result<(), TwiError>;

    /// Read `buf.len()` bytes from the addressed device.
    ///
    /// A pending write from the same transaction is closed with a repeated
    /// start, never a stop, so a register-pointer write followed by a data
    /// read cannot be interrupted by another bus agent. A zero-length read
    /// returns `Ok(0)` without any line-level signaling.
    async fn read(&self, addr: u8, buf: &mut [u8]) -> Result<usize, TwiError>;

    /// Write the concatenation of `bufs` to the addressed device.
    ///
    /// A single address phase is followed by every segment in order, with
    /// no signaling between segments. An empty `bufs` is a zero-payload
    /// presence probe: the address phase alone decides the outcome. The
    /// write is left open; a following read continues with a repeated
    /// start and `release()` emits the closing stop condition.
    async fn write_vectored(
        &self,
        addr: u8,
        bufs: &[&[u8]],
    ) -> Result<usize, TwiError>;

    /// Write `buf` to the addressed device.
    async fn write(&self, addr: u8, buf: &[u8]) -> Result<usize, TwiError> {
        self.write_vectored(addr, &[buf]).await
    }

    /// Run a sequence of operations as one bus-ownership window.
    ///
    /// Acquires the bus, applies each operation in order, and releases the
    /// bus on every exit path, including after a failed acquire (whose
    /// contract still leaves the bus marked held). Returns the total
    /// number of bytes moved.
    async fn transaction(
        &self,
        addr: u8,
        ops: &mut [Operation<'_>],
    ) -> Result<usize, TwiError> {
        let mut total = 0;
        let mut res = self.acquire().await;
        if res.is_ok() {
            for op in ops.iter_mut() {
                let step = match op {
                    Operation::Write(buf) => self.write(addr, buf).await,
                    Operation::Read(buf) => self.read(addr, buf).await,
                };
                match step {
                    Ok(n) => total += n,
                    Err(e) => {
                        res = Err(e);
                        break;
                    }
                }
            }
        }
        let released = self.release().await;
        res?;
        released?;
        Ok(total)
    }
}
