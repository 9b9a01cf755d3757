use modbus_rtu_slave::prelude::*;

pub const TEST_DATA: [u8; 2] = [0x55, 0x66];

pub const READ_HOLDING_REGISTERS: [u8; 8] = [0x01, 0x03, 0x12, 0x34, 0x00, 0x05, 0xC1, 0x7F];
pub const READ_HOLDING_REGISTERS_ERROR: [u8; 8] = [0x01, 0x03, 0x12, 0x38, 0x00, 0x05, 0x01, 0x7C];
pub const DIAGNOSTIC_01_05: [u8; 8] = [0x01, 0x08, 0x00, 0x01, 0x00, 0x05, 0x71, 0xC8];
pub const DIAGNOSTIC_STAT: [u8; 8] = [0x01, 0x08, 0xAA, 0x00, 0x00, 0x00, 0xC1, 0xD3];
pub const DIAGNOSTIC_ECHO: [u8; 8] = [0x01, 0x08, 0x00, 0x00, 0x12, 0x34, 0xED, 0x7C];
pub const WRITE_REGISTERS: [u8; 13] =
    [0x01, 0x10, 0x12, 0x34, 0x00, 0x02, 0x04, 0x45, 0x67, 0x78, 0x9A, 0x23, 0x50];
pub const BROADCAST_WRITE_REGISTERS: [u8; 13] =
    [0x00, 0x10, 0x12, 0x34, 0x00, 0x02, 0x04, 0x45, 0x67, 0x78, 0x9A, 0x27, 0xAC];
pub const READ_HOLDING_REGISTER_0: [u8; 8] = [0x01, 0x03, 0x00, 0x00, 0x00, 0x01, 0x84, 0x0A];
pub const READ_COILS: [u8; 8] = [0x01, 0x01, 0x00, 0x13, 0x00, 0x0A, 0x4D, 0xC8];
pub const READ_DISCRETE_INPUTS: [u8; 8] = [0x01, 0x02, 0x00, 0xC4, 0x00, 0x16, 0xB8, 0x39];
pub const WRITE_SINGLE_REGISTER: [u8; 8] = [0x01, 0x06, 0x00, 0x01, 0x00, 0x03, 0x98, 0x0B];
pub const WRITE_COILS: [u8; 11] =
    [0x01, 0x0F, 0x00, 0x13, 0x00, 0x0A, 0x02, 0xCD, 0x01, 0x72, 0xCB];

/// Device answering a single register block at `0x1234`. Writes and
/// diagnostics report themselves as not implemented until enabled.
#[derive(Debug, Default)]
pub struct TestDevice {
    pub registers: [u8; 4],
    pub writes_enabled: bool,
    pub diagnostics_enabled: bool,
}

impl Handler for TestDevice {
    fn read_holding_registers(&mut self, range: Range) -> Result<Vec<u8>, HandlerError> {
        if range != Range::new(0x1234, 5) {
            return Err(Exception::IllegalDataAddress.into());
        }
        Ok(TEST_DATA.to_vec())
    }

    fn write_multiple_registers(&mut self, range: Range, data: &[u8]) -> Result<(), HandlerError> {
        if !self.writes_enabled {
            return Err(HandlerError::NotImplemented);
        }
        if range != Range::new(0x1234, 2) || data.len() != self.registers.len() {
            return Err(Exception::IllegalDataAddress.into());
        }
        self.registers.copy_from_slice(data);
        Ok(())
    }

    fn diagnostic(&mut self, subfunction: u16, data: u16) -> Result<u16, HandlerError> {
        if !self.diagnostics_enabled {
            return Err(HandlerError::NotImplemented);
        }
        if subfunction != 1 || data != 5 {
            return Err(Exception::IllegalDataAddress.into());
        }
        Ok(0x1234)
    }
}

/// Device answering every read with `answer` and recording writes.
///
/// Diagnostics are implemented but reject every subfunction.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    pub answer: Vec<u8>,
    pub single_register: Option<(u16, u16)>,
    pub coils: Option<(Range, Vec<u8>)>,
}

impl Handler for RecordingDevice {
    fn read_coils(&mut self, _range: Range) -> Result<Vec<u8>, HandlerError> {
        Ok(self.answer.clone())
    }

    fn read_discrete_inputs(&mut self, _range: Range) -> Result<Vec<u8>, HandlerError> {
        Ok(self.answer.clone())
    }

    fn read_holding_registers(&mut self, _range: Range) -> Result<Vec<u8>, HandlerError> {
        Ok(self.answer.clone())
    }

    fn write_single_register(&mut self, address: u16, value: u16) -> Result<(), HandlerError> {
        self.single_register = Some((address, value));
        Ok(())
    }

    fn write_multiple_coils(&mut self, range: Range, data: &[u8]) -> Result<(), HandlerError> {
        self.coils = Some((range, data.to_vec()));
        Ok(())
    }

    fn diagnostic(&mut self, _subfunction: u16, _data: u16) -> Result<u16, HandlerError> {
        Err(Exception::IllegalFunction.into())
    }
}

/// Builds the slave used by the protocol tests.
/// # Panics
/// * If the slave configuration is rejected.
#[must_use]
pub fn setup_slave() -> Slave<TestDevice> {
    Slave::builder()
        .address(1)
        .handler(TestDevice::default())
        .tx_capacity(50)
        .build()
        .expect("Slave setup failed")
}

/// Feeds `frame` and processes it.
/// # Errors
/// * Whatever [`Slave::process`] reports for the frame.
pub fn exchange<H: Handler>(slave: &mut Slave<H>, frame: &[u8]) -> Result<Reply, SlaveError> {
    slave.input(frame)?;
    slave.process()
}

/// Builds a slave over a [`RecordingDevice`] answering reads with `answer`.
/// # Panics
/// * If the slave configuration is rejected.
#[must_use]
pub fn setup_recording(answer: Vec<u8>, tx_capacity: usize) -> Slave<RecordingDevice> {
    Slave::builder()
        .address(1)
        .handler(RecordingDevice { answer, ..RecordingDevice::default() })
        .tx_capacity(tx_capacity)
        .build()
        .expect("Slave setup failed")
}

/// Counters in [`Counter`] order.
#[must_use]
pub const fn counters(any: u16, mine: u16, ok: u16, error: u16, invalid: u16) -> Statistics {
    Statistics {
        any_received: any,
        my_packets_received: mine,
        ok_sent: ok,
        error_sent: error,
        invalid_packets_received: invalid,
    }
}

/// Checks the counters; without the `statistics` feature they stay at zero.
/// # Panics
/// * If the counters differ.
#[track_caller]
pub fn assert_stats<H>(slave: &Slave<H>, expected: Statistics) {
    if cfg!(feature = "statistics") {
        assert_eq!(*slave.stats(), expected);
    } else {
        assert_eq!(*slave.stats(), Statistics::default());
    }
}
