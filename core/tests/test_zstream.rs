#[cfg(test)]
mod tests {
    use std::fs;
    use std::io::Read;
    use std::path::{Path, PathBuf};

    use flate2::read::MultiGzDecoder;
    use tempfile::TempDir;

    use zstream_core::{Capabilities, OpenMode, StreamError, StreamState, ZStream, ZStreamConfig};

    fn scratch(name: &str) -> (TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        (dir, path)
    }

    /// Decode with flate2's reader, independent of our codec.
    fn gunzip_file(path: &Path) -> std::io::Result<Vec<u8>> {
        let mut out = Vec::new();
        MultiGzDecoder::new(fs::File::open(path)?).read_to_end(&mut out)?;
        Ok(out)
    }

    fn write_file(path: &Path, data: &[u8]) {
        let mut zs = ZStream::open_path(path, OpenMode::OUTPUT | OpenMode::BINARY).unwrap();
        zs.write(data).unwrap();
        zs.close().unwrap();
    }

    /// Deterministic, poorly compressible bytes.
    fn noise(len: usize) -> Vec<u8> {
        let mut x: u32 = 0x1234_5678;
        (0..len)
            .map(|_| {
                x = x.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (x >> 24) as u8
            })
            .collect()
    }

    // ============================================================
    // # ✅ 1. Scenarios
    // ============================================================

    #[test]
    fn scenario_a_hello_world_is_standard_gzip() {
        let (_dir, path) = scratch("hello.gz");
        let mut zs = ZStream::open_path(&path, OpenMode::OUTPUT).unwrap();
        assert_eq!(zs.write(b"hello, world!\n").unwrap(), 14);
        assert_eq!(zs.tellp(), 14);
        zs.close().unwrap();

        assert_eq!(gunzip_file(&path).unwrap(), b"hello, world!\n");
    }

    #[test]
    fn scenario_b_empty_stream_is_valid() {
        let (_dir, path) = scratch("empty.gz");
        let mut zs = ZStream::open_path(&path, OpenMode::OUTPUT).unwrap();
        zs.close().unwrap();

        assert!(fs::metadata(&path).unwrap().len() > 0);
        assert_eq!(gunzip_file(&path).unwrap(), b"");

        let mut input = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        assert_eq!(input.read(None).unwrap(), b"");
        assert!(input.eof());
        assert!(!input.fail());
    }

    #[test]
    fn scenario_c_write_lines_tracks_tellp() {
        let (_dir, path) = scratch("lines.gz");
        let lines: Vec<String> = (0..100).map(|i| format!("line number {i}\n")).collect();
        let expected: String = lines.concat();

        let mut zs = ZStream::open_path(&path, OpenMode::OUTPUT).unwrap();
        let written = zs.write_lines(&lines).unwrap();
        assert_eq!(written, expected.len());
        assert_eq!(zs.tellp(), expected.len() as i64);
        assert_eq!(zs.tellg(), 0);
        zs.close().unwrap();

        assert_eq!(gunzip_file(&path).unwrap(), expected.as_bytes());
    }

    #[test]
    fn scenario_d_strict_read_past_end_sets_eof_and_fail() {
        let (_dir, path) = scratch("short.gz");
        write_file(&path, b"short");

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        let got = zs.read(Some(100)).unwrap();
        assert_eq!(got, b"short");
        assert_eq!(zs.gcount(), 5);
        assert!(zs.eof());
        assert!(zs.fail());
        assert_eq!(zs.tellg(), -1);
        assert_eq!(zs.tellp(), -1);
        assert_eq!(zs.state(), StreamState::Failed);
    }

    // ============================================================
    // # ✅ 2. Lifecycle and cursors
    // ============================================================

    #[test]
    fn default_stream_is_closed() {
        let zs = ZStream::new();
        assert!(zs.is_closed());
        assert!(!zs.is_open());
        assert_eq!(zs.native_handle(), -1);
        assert_eq!(zs.tellg(), 0);
        assert_eq!(zs.tellp(), 0);
        assert!(!zs.eof());
        assert!(!zs.fail());
        assert_eq!(zs.openmode(), OpenMode::INPUT);
        assert_eq!(zs.state(), StreamState::Closed);
        assert!(zs.capabilities().is_empty());
        assert!(zs.path().is_none());
    }

    #[test]
    fn close_is_idempotent_and_resets() {
        let (_dir, path) = scratch("close.gz");
        let mut zs = ZStream::open_path(&path, OpenMode::OUTPUT).unwrap();
        assert!(zs.native_handle() >= 0);
        zs.write(b"abc").unwrap();

        zs.close().unwrap();
        zs.close().unwrap();

        assert_eq!(zs.native_handle(), -1);
        assert_eq!(zs.tellp(), 0);
        assert_eq!(zs.tellg(), 0);
        assert!(!zs.eof());
        assert!(!zs.fail());
        // mode survives close
        assert_eq!(zs.openmode(), OpenMode::OUTPUT);
        assert_eq!(gunzip_file(&path).unwrap(), b"abc");
    }

    #[test]
    fn close_after_eof_resets_cursors() {
        let (_dir, path) = scratch("eof.gz");
        write_file(&path, b"data");

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        zs.read(None).unwrap();
        assert_eq!(zs.tellg(), -1);
        zs.close().unwrap();
        assert_eq!(zs.tellg(), 0);
        assert!(!zs.eof());
    }

    #[test]
    fn reopen_same_instance() {
        let (_dir, path) = scratch("reopen.gz");
        let mut zs = ZStream::new();
        zs.open(&path, OpenMode::OUTPUT).unwrap();
        zs.write(b"round trip\n").unwrap();
        zs.close().unwrap();

        zs.open(&path, OpenMode::INPUT).unwrap();
        assert_eq!(zs.read_line(None).unwrap(), b"round trip\n");
        assert_eq!(zs.tellg(), 11);
        assert_eq!(zs.tellp(), 0);
    }

    #[test]
    fn drop_finishes_the_member() {
        let (_dir, path) = scratch("drop.gz");
        {
            let mut zs = ZStream::open_path(&path, OpenMode::OUTPUT).unwrap();
            zs.write(b"dropped without close").unwrap();
        }
        assert_eq!(gunzip_file(&path).unwrap(), b"dropped without close");
    }

    // ============================================================
    // # ✅ 3. Open validation
    // ============================================================

    #[test]
    fn open_rejects_bad_modes() {
        let (_dir, path) = scratch("mode.gz");
        let mut zs = ZStream::new();
        assert!(matches!(zs.open(&path, OpenMode::NONE), Err(StreamError::InvalidMode(_))));
        assert!(matches!(
            zs.open(&path, OpenMode::INPUT | OpenMode::OUTPUT),
            Err(StreamError::InvalidMode(_))
        ));
        assert!(matches!(zs.open(&path, OpenMode::BINARY), Err(StreamError::InvalidMode(_))));
        assert!(zs.is_closed());
    }

    #[test]
    fn open_rejects_bad_buffer_size() {
        let (_dir, path) = scratch("buf.gz");
        let err = ZStream::open_path_with(&path, OpenMode::OUTPUT, ZStreamConfig::with_buffer_size(0)).unwrap_err();
        assert!(matches!(err, StreamError::InvalidBufferSize { size: 0, .. }));
    }

    #[test]
    fn open_twice_is_an_error() {
        let (_dir, path) = scratch("twice.gz");
        let mut zs = ZStream::open_path(&path, OpenMode::OUTPUT).unwrap();
        assert!(matches!(zs.open(&path, OpenMode::OUTPUT), Err(StreamError::AlreadyOpen)));
        assert!(zs.is_open());
    }

    #[test]
    fn open_missing_file_sets_fail() {
        let (_dir, path) = scratch("missing.gz");
        let mut zs = ZStream::new();
        let err = zs.open(&path, OpenMode::INPUT).unwrap_err();
        assert!(matches!(err, StreamError::Io(_)));
        assert!(zs.fail());
        assert!(zs.is_closed());
    }

    // ============================================================
    // # ✅ 4. Reads
    // ============================================================

    #[test]
    fn read_to_end_sets_eof_only() {
        let (_dir, path) = scratch("all.gz");
        let data = b"one\ntwo\nthree\n".repeat(50);
        write_file(&path, &data);

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        assert_eq!(zs.read(Some(4)).unwrap(), b"one\n");
        assert_eq!(zs.tellg(), 4);
        let rest = zs.read(None).unwrap();
        assert_eq!(rest, &data[4..]);
        assert_eq!(zs.gcount(), data.len() - 4);
        assert!(zs.eof());
        assert!(!zs.fail());
        assert_eq!(zs.state(), StreamState::Eof);
    }

    #[test]
    fn exact_read_does_not_set_eof() {
        let (_dir, path) = scratch("exact.gz");
        write_file(&path, b"12345");

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        assert_eq!(zs.read(Some(5)).unwrap(), b"12345");
        assert!(!zs.eof());
        assert_eq!(zs.tellg(), 5);

        assert_eq!(zs.read(Some(1)).unwrap(), b"");
        assert!(zs.eof());
        assert!(zs.fail());
    }

    #[test]
    fn zero_length_read_changes_nothing() {
        let (_dir, path) = scratch("zero.gz");
        write_file(&path, b"xyz");

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        assert_eq!(zs.read(Some(0)).unwrap(), b"");
        assert!(zs.good());
        assert_eq!(zs.tellg(), 0);
    }

    #[test]
    fn get_stops_before_delimiter() {
        let (_dir, path) = scratch("get.gz");
        write_file(&path, b"key=value\n");

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        assert_eq!(zs.get(100, b'=').unwrap(), b"key");
        assert_eq!(zs.tellg(), 3);
        // delimiter is left unread
        assert_eq!(zs.get(100, b'=').unwrap(), b"");
        assert!(zs.good());
        assert_eq!(zs.read(Some(1)).unwrap(), b"=");
        assert_eq!(zs.get(3, b'\n').unwrap(), b"val");
        assert_eq!(zs.get(100, b'\n').unwrap(), b"ue");
        assert!(!zs.eof());
        assert_eq!(zs.read(None).unwrap(), b"\n");
    }

    #[test]
    fn get_short_result_sets_eof_not_fail() {
        let (_dir, path) = scratch("get_short.gz");
        write_file(&path, b"abc");

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        assert_eq!(zs.get(10, b'\n').unwrap(), b"abc");
        assert_eq!(zs.gcount(), 3);
        assert!(zs.eof());
        assert!(!zs.fail());
    }

    #[test]
    fn read_line_eof_is_lazy() {
        let (_dir, path) = scratch("lazy.gz");
        write_file(&path, b"a\nb\n");

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        assert_eq!(zs.read_line(None).unwrap(), b"a\n");
        assert_eq!(zs.read_line(None).unwrap(), b"b\n");
        // last line consumed, flag not yet set
        assert!(!zs.eof());
        assert_eq!(zs.tellg(), 4);

        assert_eq!(zs.read_line(None).unwrap(), b"");
        assert!(zs.eof());
        assert!(!zs.fail());
        assert_eq!(zs.tellg(), -1);
    }

    #[test]
    fn read_line_without_trailing_newline() {
        let (_dir, path) = scratch("tail.gz");
        write_file(&path, b"first\nlast");

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        assert_eq!(zs.read_line(None).unwrap(), b"first\n");
        assert_eq!(zs.read_line(None).unwrap(), b"last");
        assert!(!zs.eof());
        assert_eq!(zs.read_line(None).unwrap(), b"");
        assert!(zs.eof());
    }

    #[test]
    fn read_line_honours_max() {
        let (_dir, path) = scratch("max.gz");
        write_file(&path, b"abcdefgh\n");

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        assert_eq!(zs.read_line(Some(3)).unwrap(), b"abc");
        assert_eq!(zs.read_line(Some(100)).unwrap(), b"defgh\n");
        assert_eq!(zs.read_line(Some(0)).unwrap(), b"");
        assert!(!zs.eof());
    }

    #[test]
    fn read_lines_with_and_without_hint() {
        let (_dir, path) = scratch("hint.gz");
        write_file(&path, b"aa\nbb\ncc\ndd\n");

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        let first = zs.read_lines(Some(4)).unwrap();
        assert_eq!(first, vec![b"aa\n".to_vec(), b"bb\n".to_vec()]);
        assert_eq!(zs.gcount(), 6);

        let rest = zs.read_lines(None).unwrap();
        assert_eq!(rest, vec![b"cc\n".to_vec(), b"dd\n".to_vec()]);
        assert!(zs.eof());
        assert!(!zs.fail());
    }

    #[test]
    fn reads_across_many_small_refills() {
        let (_dir, path) = scratch("small_buf.gz");
        let data: Vec<u8> = (0..5000).map(|i| format!("{i}\n")).collect::<String>().into_bytes();
        write_file(&path, &data);

        let config = ZStreamConfig::with_buffer_size(7);
        let mut zs = ZStream::open_path_with(&path, OpenMode::INPUT, config).unwrap();
        let mut got = Vec::new();
        loop {
            let line = zs.read_line(None).unwrap();
            if line.is_empty() {
                break;
            }
            got.extend_from_slice(&line);
        }
        assert_eq!(got, data);
        assert!(zs.counters().physical_reads > 1);
    }

    #[test]
    fn io_read_trait_streams_everything() {
        let (_dir, path) = scratch("io_read.gz");
        let data = noise(100_000);
        write_file(&path, &data);

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT | OpenMode::BINARY).unwrap();
        let mut got = Vec::new();
        Read::read_to_end(&mut zs, &mut got).unwrap();
        assert_eq!(got, data);
        assert!(zs.eof());
    }

    #[test]
    fn decoded_buffer_stays_within_budget() {
        let (_dir, path) = scratch("zeros.gz");
        let data = vec![0u8; 16 << 20];
        write_file(&path, &data);
        assert!(fs::metadata(&path).unwrap().len() < 64 * 1024);

        let config = ZStreamConfig::with_buffer_size(4096);
        let budget = config.decode_budget();
        assert_eq!(budget, 4 * 4096);
        let mut zs = ZStream::open_path_with(&path, OpenMode::INPUT | OpenMode::BINARY, config).unwrap();

        assert_eq!(zs.read(Some(1)).unwrap(), b"\0");
        assert!(zs.available() < budget, "buffered {} bytes", zs.available());

        let mut total = 1;
        loop {
            let chunk = zs.read_some(usize::MAX).unwrap();
            if chunk.is_empty() {
                break;
            }
            assert!(chunk.len() <= budget);
            assert!(chunk.iter().all(|&b| b == 0));
            total += chunk.len();
        }
        assert_eq!(total, data.len());
        assert!(zs.eof());
        assert!(!zs.fail());
    }

    // ============================================================
    // # ✅ 5. Direction and unsupported operations
    // ============================================================

    #[test]
    fn wrong_direction_sets_fail() {
        let (_dir, path) = scratch("dir.gz");
        write_file(&path, b"xyz");

        let mut input = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        assert!(matches!(input.write(b"nope"), Err(StreamError::NotWritable)));
        assert!(input.fail());
        // reads on a failed stream return empty
        assert_eq!(input.read(None).unwrap(), b"");
    }

    #[test]
    fn failed_writer_still_closes_cleanly() {
        let (_dir, path) = scratch("failed_writer.gz");
        let mut out = ZStream::open_path(&path, OpenMode::OUTPUT).unwrap();
        out.write(b"kept").unwrap();
        assert!(matches!(out.read(Some(1)), Err(StreamError::NotReadable)));
        assert!(out.fail());
        assert!(matches!(out.write(b"lost"), Err(StreamError::Failed)));
        out.close().unwrap();

        assert_eq!(gunzip_file(&path).unwrap(), b"kept");
    }

    #[test]
    fn seek_and_truncate_always_fail() {
        let (_dir, path) = scratch("seek.gz");
        write_file(&path, b"0123456789");

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        zs.read(Some(3)).unwrap();
        for _ in 0..2 {
            assert!(matches!(zs.seek(0), Err(StreamError::Unsupported { op: "seek" })));
            assert!(matches!(zs.truncate(None), Err(StreamError::Unsupported { op: "truncate" })));
        }
        assert!(zs.good());
        assert_eq!(zs.tellg(), 3);
        assert_eq!(zs.read(Some(2)).unwrap(), b"34");

        let mut closed = ZStream::new();
        assert!(closed.seek(10).is_err());
        assert!(closed.truncate(Some(0)).is_err());
        assert_eq!(closed.state(), StreamState::Closed);
    }

    #[test]
    fn capabilities_follow_open_mode() {
        let (_dir, path) = scratch("caps.gz");
        let out = ZStream::open_path(&path, OpenMode::OUTPUT).unwrap();
        assert_eq!(out.capabilities(), Capabilities::WRITABLE);
        assert_eq!(out.state(), StreamState::OpenWritable);
        assert!(out.is_writable());
        assert!(!out.is_readable());
        drop(out);

        let text = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        assert_eq!(text.capabilities(), Capabilities::READABLE | Capabilities::LINE_ORIENTED);
        assert_eq!(text.state(), StreamState::OpenReadable);
        assert!(!text.is_binary());

        let bin = ZStream::open_path(&path, OpenMode::INPUT | OpenMode::BINARY).unwrap();
        assert_eq!(bin.capabilities(), Capabilities::READABLE);
        assert!(bin.is_binary());
    }

    // ============================================================
    // # ✅ 6. Buffering, sync, final_sync
    // ============================================================

    #[test]
    fn large_buffer_holds_output_until_sync() {
        let (_dir, path) = scratch("sync.gz");
        let config = ZStreamConfig::with_buffer_size(1 << 20);
        let mut zs = ZStream::open_path_with(&path, OpenMode::OUTPUT, config).unwrap();
        zs.write(&b"buffered text\n".repeat(100)).unwrap();

        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
        assert_eq!(zs.counters().physical_writes, 0);

        zs.sync().unwrap();
        let after_sync = fs::metadata(&path).unwrap().len();
        assert!(after_sync > 0);
        // partial: no trailer yet, so the file does not decode to the end
        assert!(gunzip_file(&path).is_err());

        zs.close().unwrap();
        assert!(fs::metadata(&path).unwrap().len() > after_sync);
        assert_eq!(gunzip_file(&path).unwrap(), b"buffered text\n".repeat(100));
    }

    #[test]
    fn small_buffer_writes_through() {
        let (_dir, path) = scratch("through.gz");
        let data = noise(256 * 1024);
        let config = ZStreamConfig::with_buffer_size(16);
        let mut zs = ZStream::open_path_with(&path, OpenMode::OUTPUT | OpenMode::BINARY, config).unwrap();
        for block in data.chunks(1000) {
            zs.write(block).unwrap();
        }
        assert!(zs.counters().physical_writes > 0);
        assert!(fs::metadata(&path).unwrap().len() > 0);
        zs.close().unwrap();
        assert_eq!(gunzip_file(&path).unwrap(), data);
    }

    #[test]
    fn sync_is_a_no_op_for_readers_and_closed_streams() {
        let (_dir, path) = scratch("noop.gz");
        write_file(&path, b"r");
        let mut input = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        input.sync().unwrap();
        input.final_sync().unwrap();
        assert!(input.good());

        let mut closed = ZStream::new();
        closed.sync().unwrap();
        closed.close().unwrap();
    }

    #[test]
    fn final_sync_keeps_counters_and_blocks_writes() {
        let (_dir, path) = scratch("final.gz");
        let data = b"finalized payload\n".repeat(20);
        let mut zs = ZStream::open_path(&path, OpenMode::OUTPUT).unwrap();
        zs.write(&data).unwrap();
        zs.final_sync().unwrap();

        let counters = zs.counters();
        assert_eq!(counters.bytes_uncompressed_in, data.len() as u64);
        assert_eq!(counters.bytes_compressed_out, fs::metadata(&path).unwrap().len());
        assert!(counters.compression_ratio() < 1.0);
        // complete member while still open
        assert_eq!(gunzip_file(&path).unwrap(), data);
        assert!(zs.is_open());

        assert!(matches!(zs.write(b"more"), Err(StreamError::Finalized)));
        zs.final_sync().unwrap();
        zs.close().unwrap();
        assert_eq!(gunzip_file(&path).unwrap(), data);
    }

    #[test]
    fn counters_serialize_and_reset_on_close() {
        let (_dir, path) = scratch("counters.gz");
        write_file(&path, b"count me");

        let mut zs = ZStream::open_path(&path, OpenMode::INPUT).unwrap();
        zs.read(None).unwrap();
        let c = zs.counters();
        assert_eq!(c.bytes_uncompressed_out, 8);
        assert_eq!(c.bytes_compressed_in, fs::metadata(&path).unwrap().len());

        let json = serde_json::to_string(&c).unwrap();
        assert!(json.contains("\"bytes_uncompressed_out\":8"));

        zs.close().unwrap();
        assert_eq!(zs.counters(), Default::default());
    }
}
