use std::cell::{Cell, RefCell};

use twi_bus::{Operation, TwiBus, TwiDevice, TwiError};

// ---------------------------------------------------------------------------
// Mock bus
// ---------------------------------------------------------------------------

/// One recorded call against the mock bus.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Acquire,
    Release,
    Read { addr: u8, len: usize },
    WriteVectored { addr: u8, segments: Vec<Vec<u8>> },
}

/// Scripted mock implementing the bus contract and recording every call.
struct MockBus {
    calls: RefCell<Vec<Call>>,
    acquire_err: Cell<Option<TwiError>>,
    write_err: Cell<Option<TwiError>>,
    read_err: Cell<Option<TwiError>>,
    read_fill: u8,
}

impl MockBus {
    fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            acquire_err: Cell::new(None),
            write_err: Cell::new(None),
            read_err: Cell::new(None),
            read_fill: 0xA5,
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl TwiBus for MockBus {
    async fn acquire(&self) -> Result<(), TwiError> {
        self.calls.borrow_mut().push(Call::Acquire);
        match self.acquire_err.get() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    async fn release(&self) -> Result<(), TwiError> {
        self.calls.borrow_mut().push(Call::Release);
        Ok(())
    }

    async fn read(&self, addr: u8, buf: &mut [u8]) -> Result<usize, TwiError> {
        self.calls.borrow_mut().push(Call::Read { addr, len: buf.len() });
        match self.read_err.get() {
            Some(e) => Err(e),
            None => {
                buf.fill(self.read_fill);
                Ok(buf.len())
            }
        }
    }

    async fn write_vectored(
        &self,
        addr: u8,
        bufs: &[&[u8]],
    ) -> Result<usize, TwiError> {
        self.calls.borrow_mut().push(Call::WriteVectored {
            addr,
            segments: bufs.iter().map(|s| s.to_vec()).collect(),
        });
        match self.write_err.get() {
            Some(e) => Err(e),
            None => Ok(bufs.iter().map(|s| s.len()).sum()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[futures_test::test]
async fn device_forwards_bound_address() {
    let bus = MockBus::new();
    let dev = TwiDevice::new(&bus, 0x42);

    assert_eq!(dev.address(), 0x42);

    let mut buf = [0u8; 3];
    assert_eq!(dev.write(&[1, 2]).await, Ok(2));
    assert_eq!(dev.read(&mut buf).await, Ok(3));
    assert_eq!(buf, [0xA5; 3]);

    assert_eq!(
        bus.calls(),
        vec![
            // The provided write() delegates through a one-segment vector.
            Call::WriteVectored { addr: 0x42, segments: vec![vec![1, 2]] },
            Call::Read { addr: 0x42, len: 3 },
        ]
    );
}

#[futures_test::test]
async fn write_vectored_keeps_segment_order() {
    let bus = MockBus::new();
    let dev = TwiDevice::new(&bus, 0x50);

    assert_eq!(dev.write_vectored(&[&[0x12, 0x34], &[9, 8, 7]]).await, Ok(5));
    assert_eq!(
        bus.calls(),
        vec![Call::WriteVectored {
            addr: 0x50,
            segments: vec![vec![0x12, 0x34], vec![9, 8, 7]],
        }]
    );
}

#[futures_test::test]
async fn transaction_runs_ops_then_releases() {
    let bus = MockBus::new();
    let dev = TwiDevice::new(&bus, 0x21);

    let mut buf = [0u8; 4];
    let moved = dev
        .transaction(&mut [
            Operation::Write(&[0x10]),
            Operation::Read(&mut buf),
        ])
        .await;

    assert_eq!(moved, Ok(5));
    assert_eq!(
        bus.calls(),
        vec![
            Call::Acquire,
            Call::WriteVectored { addr: 0x21, segments: vec![vec![0x10]] },
            Call::Read { addr: 0x21, len: 4 },
            Call::Release,
        ]
    );
}

#[futures_test::test]
async fn transaction_releases_after_failed_op() {
    let bus = MockBus::new();
    bus.write_err.set(Some(TwiError::ShortTransfer { done: 1 }));
    let dev = TwiDevice::new(&bus, 0x21);

    let mut buf = [0u8; 4];
    let res = dev
        .transaction(&mut [
            Operation::Write(&[0x10, 0x11]),
            Operation::Read(&mut buf),
        ])
        .await;

    assert_eq!(res, Err(TwiError::ShortTransfer { done: 1 }));
    // The read is skipped, the release is not.
    assert_eq!(
        bus.calls(),
        vec![
            Call::Acquire,
            Call::WriteVectored {
                addr: 0x21,
                segments: vec![vec![0x10, 0x11]],
            },
            Call::Release,
        ]
    );
}

#[futures_test::test]
async fn transaction_releases_after_failed_acquire() {
    let bus = MockBus::new();
    bus.acquire_err.set(Some(TwiError::BusUnavailable));
    let dev = TwiDevice::new(&bus, 0x21);

    let res = dev.transaction(&mut [Operation::Write(&[0])]).await;

    assert_eq!(res, Err(TwiError::BusUnavailable));
    // A failed acquire leaves the bus marked held; the helper still owes
    // the release.
    assert_eq!(bus.calls(), vec![Call::Acquire, Call::Release]);
}

#[futures_test::test]
async fn probe_reports_presence() {
    let bus = MockBus::new();
    let dev = TwiDevice::new(&bus, 0x68);

    assert_eq!(dev.probe().await, Ok(true));
    assert_eq!(
        bus.calls(),
        vec![
            Call::Acquire,
            Call::WriteVectored { addr: 0x68, segments: vec![] },
            Call::Release,
        ]
    );
}

#[futures_test::test]
async fn probe_maps_no_acknowledge_to_absent() {
    let bus = MockBus::new();
    bus.write_err.set(Some(TwiError::NoAcknowledge));
    let dev = TwiDevice::new(&bus, 0x68);

    assert_eq!(dev.probe().await, Ok(false));
    assert_eq!(
        bus.calls(),
        vec![
            Call::Acquire,
            Call::WriteVectored { addr: 0x68, segments: vec![] },
            Call::Release,
        ]
    );
}

#[futures_test::test]
async fn probe_propagates_other_errors() {
    let bus = MockBus::new();
    bus.write_err.set(Some(TwiError::ClockStretchTimeout));
    let dev = TwiDevice::new(&bus, 0x68);

    assert_eq!(dev.probe().await, Err(TwiError::ClockStretchTimeout));
    // Still released on the failure path.
    assert_eq!(bus.calls().last(), Some(&Call::Release));
}

#[futures_test::test]
async fn write_read_is_one_window() {
    let bus = MockBus::new();
    let dev = TwiDevice::new(&bus, 0x77);

    let mut buf = [0u8; 2];
    assert_eq!(dev.write_read(&[0xF4], &mut buf).await, Ok(3));
    assert_eq!(
        bus.calls(),
        vec![
            Call::Acquire,
            Call::WriteVectored { addr: 0x77, segments: vec![vec![0xF4]] },
            Call::Read { addr: 0x77, len: 2 },
            Call::Release,
        ]
    );
}

#[futures_test::test]
async fn handles_are_cheap_copies() {
    let bus = MockBus::new();
    let dev = TwiDevice::new(&bus, 0x29);
    let copy = dev;

    assert_eq!(copy.address(), dev.address());
    assert_eq!(copy.write(&[1]).await, Ok(1));
    assert_eq!(dev.write(&[2]).await, Ok(1));
    assert_eq!(bus.calls().len(), 2);
}
