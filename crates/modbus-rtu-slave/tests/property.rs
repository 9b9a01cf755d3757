use modbus_rtu_slave::crc::Crc16;
use modbus_rtu_slave::prelude::*;
use proptest::prelude::*;

fn reference_crc(data: &[u8]) -> u16 {
    let mut crc = 0xFFFF_u16;
    for &byte in data {
        crc ^= u16::from(byte);
        for _ in 0..8 {
            crc = if crc & 1 == 1 { (crc >> 1) ^ 0xA001 } else { crc >> 1 };
        }
    }
    crc
}

proptest! {
    #[test]
    fn crc_matches_bitwise_reference(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        prop_assert_eq!(crc16(&data), reference_crc(&data));

        let mut running = Crc16::new();
        running.extend(&data);
        prop_assert_eq!(running.value(), reference_crc(&data));
    }

    #[test]
    fn appended_crc_always_validates(data in proptest::collection::vec(any::<u8>(), 1..256)) {
        let mut frame = data;
        append_crc(&mut frame);

        prop_assert_eq!(crc16(&frame), 0);

        let mut running = Crc16::new();
        running.extend(&frame);
        prop_assert!(running.is_valid());
    }

    #[test]
    fn arbitrary_input_never_panics(frames in proptest::collection::vec(
        proptest::collection::vec(any::<u8>(), 0..300), 1..8,
    )) {
        let mut slave = Slave::builder().address(1).build().unwrap();

        for frame in &frames {
            let _ = slave.input(frame);
            if let Ok(Reply::Normal | Reply::Exception(_)) = slave.process() {
                let response = slave.take_response();
                prop_assert_eq!(response[0], 1);
                prop_assert_eq!(crc16(&response), 0);
            }
            prop_assert_eq!(slave.received(), 0);
        }
    }

    #[test]
    fn valid_frames_for_other_slaves_are_ignored(
        address in 2u8..=247,
        body in proptest::collection::vec(any::<u8>(), 5..64),
    ) {
        let mut slave = Slave::builder().address(1).build().unwrap();
        let mut frame = vec![address];
        frame.extend_from_slice(&body);
        append_crc(&mut frame);

        slave.input(&frame).unwrap();
        let is_mismatch = matches!(slave.process(), Err(SlaveError::AddressMismatch { .. }));
        prop_assert!(is_mismatch);
        prop_assert!(slave.response().is_empty());
    }
}
