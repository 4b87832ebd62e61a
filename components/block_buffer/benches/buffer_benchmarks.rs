use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mediacore_buffer::BlockBuffer;
use mediacore_types::{BlockPayload, DecodeError, FrameExtra, FrameMaterializer, MediaFrame, MediaType, Ticks};

struct PassthroughMaterializer;

impl FrameMaterializer for PassthroughMaterializer {
    fn materialize(&self, frame: &MediaFrame, out: &mut BlockPayload) -> Result<(), DecodeError> {
        *out = BlockPayload::Data { bytes: vec![0u8; frame.compressed_size] };
        Ok(())
    }
}

fn frame_at(index: usize, size: usize) -> MediaFrame {
    MediaFrame {
        stream_index: 0,
        media_type: MediaType::Video,
        start_time: Ticks::from_secs_f64(index as f64 * 0.04),
        duration: Ticks::from_secs_f64(0.04),
        has_valid_start_time: true,
        compressed_size: size,
        extra: FrameExtra::Data,
    }
}

fn add_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("block_buffer_add");
    let materializer = PassthroughMaterializer;

    for capacity in [16, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(capacity), &capacity, |b, &capacity| {
            b.iter(|| {
                let mut buffer = BlockBuffer::new(MediaType::Video, capacity).unwrap();
                for i in 0..capacity * 2 {
                    let frame = frame_at(i, 4096);
                    buffer.add(black_box(&frame), &materializer).unwrap();
                }
            });
        });
    }

    group.finish();
}

fn block_at_benchmark(c: &mut Criterion) {
    let materializer = PassthroughMaterializer;
    let mut buffer = BlockBuffer::new(MediaType::Video, 256).unwrap();
    for i in 0..256 {
        buffer.add(&frame_at(i, 4096), &materializer).unwrap();
    }
    let midpoint = Ticks::from_secs_f64(5.0);

    c.bench_function("block_buffer_block_at", |b| {
        b.iter(|| buffer.block_at(black_box(midpoint)));
    });
}

criterion_group!(benches, add_benchmark, block_at_benchmark);
criterion_main!(benches);
