// End-to-end pipeline runs: in-memory and file-based.

#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Cursor;
    use std::thread;
    use std::time::Duration;

    use chunkzip_core::{
        compression::{Codec, CodecError, GzipCodec},
        stream::{
            compress_file, decompress_file, framing::walk_frames, process_file_with_codec,
            run_pipeline, Direction, InterruptHandle, OrderingMode, ParallelismProfile,
            PipelineConfig,
        },
        telemetry::TelemetrySnapshot,
        types::StreamError,
    };
    use proptest::prelude::*;

    const MIB: usize = 1024 * 1024;

    /// gzip, but stalls on any chunk whose first byte is `marker`.
    struct DelayCodec {
        inner: GzipCodec,
        marker: u8,
        delay: Duration,
    }

    impl Codec for DelayCodec {
        fn name(&self) -> &'static str {
            "delay-gzip"
        }

        fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
            if input.first() == Some(&self.marker) {
                thread::sleep(self.delay);
            }
            self.inner.compress(input)
        }

        fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, CodecError> {
            self.inner.decompress(input)
        }
    }

    fn config(workers: usize, queue_limit: usize, chunk_size: usize) -> PipelineConfig {
        PipelineConfig {
            chunk_size,
            level: 1,
            ..PipelineConfig::from_profile(ParallelismProfile::new(workers, queue_limit))
        }
    }

    fn run(
        data: &[u8],
        direction: Direction,
        codec: &dyn Codec,
        config: &PipelineConfig,
    ) -> (Vec<u8>, TelemetrySnapshot) {
        let mut out = Vec::new();
        let snapshot = run_pipeline(
            Cursor::new(data),
            &mut out,
            direction,
            codec,
            config,
            &InterruptHandle::new(),
        )
        .expect("pipeline run");
        (out, snapshot)
    }

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| ((i * 31) % 251) as u8 ^ (i >> 13) as u8).collect()
    }

    #[test]
    fn twelve_mib_file_becomes_three_frames() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("big.bin");
        let archive = dir.path().join("big.bin.gz");
        let restored = dir.path().join("big.out");

        let data = sample(12 * MIB);
        fs::write(&input, &data).expect("write input");

        let cfg = PipelineConfig { level: 1, ..PipelineConfig::default() };
        let snap = compress_file(&input, &archive, &cfg, &InterruptHandle::new()).expect("compress");
        assert_eq!(snap.frames(), 3);
        assert_eq!(snap.counters.bytes_read, data.len() as u64);

        let frames = walk_frames(&fs::read(&archive).expect("read archive")).expect("walk");
        assert_eq!(frames.len(), 3);

        let snap = decompress_file(&archive, &restored, &cfg, &InterruptHandle::new()).expect("decompress");
        assert_eq!(snap.frames(), 3);
        assert_eq!(fs::read(&restored).expect("read restored"), data);
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("empty.txt");
        let archive = dir.path().join("empty.txt.gz");
        fs::write(&input, b"").expect("write input");

        let snap = compress_file(&input, &archive, &config(2, 2, MIB), &InterruptHandle::new())
            .expect("compress");
        assert_eq!(snap.frames(), 0);
        assert_eq!(snap.compression_ratio, 0.0);
        assert_eq!(fs::metadata(&archive).expect("archive exists").len(), 0);

        let restored = dir.path().join("empty.out");
        let snap = decompress_file(&archive, &restored, &config(2, 2, MIB), &InterruptHandle::new())
            .expect("decompress");
        assert_eq!(snap.frames(), 0);
        assert_eq!(fs::metadata(&restored).expect("restored exists").len(), 0);
    }

    #[test]
    fn slow_first_chunk_does_not_reorder_output() {
        // Chunk k starts with byte k, so the marker picks exactly one chunk.
        let chunk = 4096;
        let data: Vec<u8> = (0..24u8)
            .flat_map(|k| {
                let mut c = sample(chunk);
                c[0] = k;
                c
            })
            .collect();

        for ordering in [OrderingMode::Turnstile, OrderingMode::ReorderBuffer] {
            let codec = DelayCodec {
                inner: GzipCodec::new(1).expect("level"),
                marker: 0,
                delay: Duration::from_millis(150),
            };
            let cfg = PipelineConfig { ordering, ..config(4, 3, chunk) };

            let (archive, snap) = run(&data, Direction::Compress, &codec, &cfg);
            assert_eq!(snap.frames(), 24);
            assert!(snap.read_queue_peak <= 3, "{ordering:?}: read peak {}", snap.read_queue_peak);
            assert!(snap.write_queue_peak <= 3, "{ordering:?}: write peak {}", snap.write_queue_peak);

            let (restored, _) = run(&archive, Direction::Decompress, &codec, &cfg);
            assert_eq!(restored, data, "{ordering:?}");
        }
    }

    #[test]
    fn telemetry_counts_match_stream() {
        let data = sample(10 * 1000 + 1);
        let codec = GzipCodec::new(1).expect("level");
        let (archive, snap) = run(&data, Direction::Compress, &codec, &config(2, 2, 1000));

        assert_eq!(snap.direction, Direction::Compress);
        assert_eq!(snap.workers, 2);
        assert_eq!(snap.counters.chunks_read, 11);
        assert_eq!(snap.counters.chunks_transformed, 11);
        assert_eq!(snap.counters.chunks_written, 11);
        assert_eq!(snap.counters.bytes_written, archive.len() as u64);
        assert!(snap.compression_ratio > 0.0);

        let json = snap.to_json().expect("json");
        assert!(json.contains("\"direction\": \"compress\""));
    }

    #[test]
    fn corrupted_length_in_second_frame_fails_without_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let archive = dir.path().join("bad.gz");
        let restored = dir.path().join("bad.out");

        let codec = GzipCodec::new(1).expect("level");
        let (mut bytes, _) = run(&sample(3 * 2048), Direction::Compress, &codec, &config(2, 2, 2048));
        let frames = walk_frames(&bytes).expect("walk");
        assert_eq!(frames.len(), 3);

        let (second, _) = frames[1];
        bytes[second + 4..second + 8].copy_from_slice(&u32::MAX.to_le_bytes());
        fs::write(&archive, &bytes).expect("write archive");

        let err = decompress_file(&archive, &restored, &config(2, 2, 2048), &InterruptHandle::new())
            .expect_err("corrupt archive must fail");
        assert!(matches!(err, StreamError::Frame(_)), "got {err}");
        assert!(!restored.exists());
    }

    #[test]
    fn off_by_one_length_is_caught_by_codec_or_framing() {
        let codec = GzipCodec::new(1).expect("level");
        let (mut bytes, _) = run(&sample(3 * 2048), Direction::Compress, &codec, &config(2, 2, 2048));
        let (second, len) = walk_frames(&bytes).expect("walk")[1];
        bytes[second + 4..second + 8].copy_from_slice(&(len as u32 + 1).to_le_bytes());

        let mut out = Vec::new();
        let err = run_pipeline(
            Cursor::new(&bytes),
            &mut out,
            Direction::Decompress,
            &codec,
            &config(2, 2, 2048),
            &InterruptHandle::new(),
        )
        .expect_err("misaligned chain must fail");
        assert!(matches!(err, StreamError::Frame(_) | StreamError::Codec(_)), "got {err}");
    }

    #[test]
    fn invalid_config_is_rejected_before_touching_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = dir.path().join("in.txt");
        let output = dir.path().join("in.txt.gz");
        fs::write(&input, b"abc").expect("write input");

        let cfg = PipelineConfig { workers: 0, ..config(1, 1, 16) };
        let err = process_file_with_codec(
            Direction::Compress,
            &input,
            &output,
            &GzipCodec::default(),
            &cfg,
            &InterruptHandle::new(),
        )
        .expect_err("zero workers");
        assert!(matches!(err, StreamError::Config(_)));
        assert!(!output.exists());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn roundtrip_any_bytes(
            data in proptest::collection::vec(any::<u8>(), 0..16_384),
            chunk in 1usize..3_000,
            workers in 1usize..5,
            limit in 1usize..4,
            reorder in any::<bool>(),
        ) {
            let codec = GzipCodec::new(1).expect("level");
            let cfg = PipelineConfig {
                ordering: if reorder { OrderingMode::ReorderBuffer } else { OrderingMode::Turnstile },
                ..config(workers, limit, chunk)
            };
            let (archive, snap) = run(&data, Direction::Compress, &codec, &cfg);
            prop_assert_eq!(snap.frames() as usize, data.len().div_ceil(chunk));

            let (restored, _) = run(&archive, Direction::Decompress, &codec, &cfg);
            prop_assert_eq!(restored, data);
        }
    }
}
