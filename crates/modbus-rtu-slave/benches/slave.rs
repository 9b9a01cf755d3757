use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use modbus_rtu_slave::prelude::*;
use std::hint::black_box;

struct Registers(Vec<u8>);

impl Handler for Registers {
    fn read_holding_registers(&mut self, range: Range) -> Result<Vec<u8>, HandlerError> {
        let start = usize::from(range.address) * 2;
        let end = range.end().ok_or(Exception::IllegalDataAddress)? * 2;
        Ok(self.0.get(start..end).map(<[u8]>::to_vec).ok_or(Exception::IllegalDataAddress)?)
    }
}

fn bench_crc(c: &mut Criterion) {
    let mut group = c.benchmark_group("crc16");

    for size in [8usize, 64, 256] {
        let data: Vec<u8> = (0..size).map(|i| (i * 31) as u8).collect();

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, d| {
            b.iter(|| crc16(black_box(d)));
        });
    }

    group.finish();
}

fn bench_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("process");

    let mut slave = Slave::builder()
        .address(1)
        .handler(Registers(vec![0xA5; 512]))
        .build()
        .unwrap();

    for count in [1u16, 32, 125] {
        let mut request = vec![0x01, 0x03, 0x00, 0x00];
        request.extend_from_slice(&count.to_be_bytes());
        append_crc(&mut request);

        group.bench_with_input(BenchmarkId::new("read_holding", count), &request, |b, r| {
            b.iter(|| {
                slave.input(black_box(r)).unwrap();
                let reply = slave.process().unwrap();
                black_box(slave.take_response());
                reply
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_crc, bench_process);
criterion_main!(benches);
