use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use polling_sockets::protocol::{self, Messages};
use polling_sockets::{Message, MessageFormat};

const SIZES: [usize; 3] = [64, 1024, 64 * 1024];
const FORMATS: [MessageFormat; 2] = [MessageFormat::Text, MessageFormat::Binary];

fn payload(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");

    for format in FORMATS {
        for size in SIZES {
            let message = Message::binary(payload(size));
            group.throughput(Throughput::Bytes(size as u64));
            group.bench_with_input(
                BenchmarkId::new(format.to_string(), size),
                &message,
                |b, message| {
                    b.iter(|| black_box(protocol::encode(message, format).unwrap()));
                },
            );
        }
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");

    for format in FORMATS {
        for size in SIZES {
            let encoded = protocol::encode(&Message::binary(payload(size)), format).unwrap();
            group.throughput(Throughput::Bytes(encoded.len() as u64));
            group.bench_with_input(
                BenchmarkId::new(format.to_string(), size),
                &encoded,
                |b, encoded| {
                    b.iter(|| black_box(protocol::parse_message(encoded, format).unwrap()));
                },
            );
        }
    }

    group.finish();
}

fn bench_poll_body(c: &mut Criterion) {
    let mut group = c.benchmark_group("poll_body");

    // 100 small text messages behind a format indicator, as a poll response carries them
    for format in FORMATS {
        let mut body = vec![format.indicator()];
        for i in 0..100 {
            let message = Message::text(format!("message number {i}"));
            body.extend_from_slice(&protocol::encode(&message, format).unwrap());
        }
        let body = Bytes::from(body);

        group.throughput(Throughput::Elements(100));
        group.bench_function(format.to_string(), |b| {
            b.iter(|| {
                let messages = Messages::from_body(body.clone()).unwrap().unwrap();
                for message in messages {
                    black_box(message.unwrap());
                }
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode, bench_decode, bench_poll_body);
criterion_main!(benches);
