use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use zhonghong_core::{scanner, FrameBuffer, Header, Message, Record, StatusKind, StatusRecord};
use zhonghong_types::{Address, FanMode, Operation, Switch};

fn all_status_reply(units: u8) -> Vec<u8> {
    let records = (0..units)
        .map(|indoor| {
            Record::Status(StatusRecord {
                address: Address::new(1, indoor),
                switch: Switch::On,
                target_temperature: 24,
                operation: Operation::Cool,
                fan_mode: FanMode::Mid,
                room_temperature: 26,
                error_code: 0,
                reserved: [0, 0],
            })
        })
        .collect();

    Message::response(Header::status(1, StatusKind::All, units), records)
        .encode()
        .to_vec()
}

fn bench_scan(c: &mut Criterion) {
    let mut data = vec![0x00, 0x13, 0x37];
    for _ in 0..8 {
        data.extend_from_slice(&all_status_reply(12));
    }

    let mut group = c.benchmark_group("scanner");
    group.throughput(Throughput::Bytes(data.len() as u64));

    group.bench_function("scan", |b| {
        b.iter(|| scanner::scan(black_box(&data)).count())
    });

    group.bench_function("frame_buffer_64b_reads", |b| {
        b.iter(|| {
            let mut buffer = FrameBuffer::new();
            data.chunks(64).map(|chunk| buffer.push(black_box(chunk)).len()).sum::<usize>()
        })
    });

    group.bench_function("scan_and_decode", |b| {
        b.iter(|| {
            scanner::scan(black_box(&data))
                .filter_map(|frame| Message::decode(frame).ok())
                .count()
        })
    });

    group.finish();
}

criterion_group!(benches, bench_scan);
criterion_main!(benches);
