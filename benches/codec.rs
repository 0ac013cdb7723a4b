use {
    criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput},
    fieldwire::{
        containers::{self, Pod},
        describe, deserialize,
        frame::{Checksum, FrameConfig, Packager, Unpacked},
        len::U32Len,
        serialize, serialize_into,
    },
};

#[derive(Debug, Clone, PartialEq)]
struct Reading {
    sensor: u16,
    sequence: u64,
    value: f64,
    healthy: bool,
}

describe! {
    Reading {
        sensor: u16,
        sequence: u64,
        value: f64,
        healthy: bool,
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Batch {
    source: u32,
    readings: Vec<Reading>,
    blob: Vec<u8>,
}

describe! {
    Batch {
        source: u32,
        readings: Vec<Reading>,
        blob: containers::Vec<Pod<u8>>,
    }
}

struct SumCrc;

impl Checksum for SumCrc {
    type Value = u32;

    fn calc(data: &[u8]) -> u32 {
        data.iter().fold(0u32, |acc, &b| acc.wrapping_add(b as u32))
    }
}

struct Wire;

impl FrameConfig for Wire {
    type Len = U32Len;
    type Crc = SumCrc;
    const HEADER_CRC: bool = true;
    const PACKAGE_START: &'static [u8] = &[0xCD, 0xAB];
    const MAX_SIZE: usize = 1 << 16;
}

fn sample_batch() -> Batch {
    Batch {
        source: 7,
        readings: (0..64)
            .map(|i| Reading {
                sensor: i as u16,
                sequence: i as u64 * 10,
                value: i as f64 * 0.5,
                healthy: i % 7 != 0,
            })
            .collect(),
        blob: (0..=255u8).cycle().take(1024).collect(),
    }
}

fn bench_codec(c: &mut Criterion) {
    let batch = sample_batch();
    let bytes = serialize::<Batch>(&batch).unwrap();

    let mut group = c.benchmark_group("codec");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("serialize", |b| {
        b.iter(|| serialize::<Batch>(black_box(&batch)).unwrap())
    });

    group.bench_function("serialize_into", |b| {
        let mut buffer = Vec::with_capacity(bytes.len());
        b.iter(|| {
            buffer.clear();
            serialize_into::<Batch>(&mut buffer, black_box(&batch)).unwrap()
        })
    });

    group.bench_function("deserialize", |b| {
        b.iter(|| deserialize::<Batch>(black_box(&bytes)).unwrap())
    });

    group.finish();
}

fn bench_frame(c: &mut Criterion) {
    let batch = sample_batch();
    let mut framed = Vec::new();
    Packager::<Wire>::pack::<Batch>(&mut framed, &batch).unwrap();

    // A dirty stream: noise, a corrupted frame, then the real one.
    let mut dirty = vec![0x00, 0x13, 0x37];
    dirty.extend_from_slice(&framed);
    let corrupt_at = 3 + Packager::<Wire>::HEADER_SIZE + 5;
    dirty[corrupt_at] ^= 0xFF;
    dirty.extend_from_slice(&framed);

    let mut group = c.benchmark_group("frame");
    group.throughput(Throughput::Bytes(framed.len() as u64));

    group.bench_function("pack", |b| {
        let mut buffer = Vec::with_capacity(framed.len());
        b.iter(|| {
            buffer.clear();
            Packager::<Wire>::pack::<Batch>(&mut buffer, black_box(&batch)).unwrap()
        })
    });

    group.bench_function("unpack", |b| {
        b.iter(|| match Packager::<Wire>::unpack::<Batch>(black_box(&framed)) {
            Unpacked::Frame { value, .. } => value,
            Unpacked::NeedMore => unreachable!(),
        })
    });

    group.bench_function("unpack_resync", |b| {
        b.iter(|| match Packager::<Wire>::unpack::<Batch>(black_box(&dirty)) {
            Unpacked::Frame { value, .. } => value,
            Unpacked::NeedMore => unreachable!(),
        })
    });

    group.finish();
}

criterion_group!(benches, bench_codec, bench_frame);
criterion_main!(benches);
