use std::fs;
use tempfile::tempdir;

use spacelink_cli::{
    commands::{crc, decode, encode},
    LinkKind,
};
use spacelink_core::{ewc::EwcMessage, ms200, PacketMeta, SequenceWord};

fn write_file<P: AsRef<std::path::Path>>(p: P, s: &str) {
    fs::write(p, s.as_bytes()).unwrap();
}

/// Helper: MS200 frames with the given payloads, separated by noise
fn create_noisy_stream(payloads: &[&[u8]]) -> Vec<u8> {
    let mut result = vec![0xFF, 0x1A, 0x00];
    for (i, payload) in payloads.iter().enumerate() {
        let meta = PacketMeta {
            src: 2,
            dst: 7,
            apid: 9,
            ..PacketMeta::default()
        };
        let frame = ms200::encode_frame(&meta, payload, SequenceWord::complete(i as u16)).unwrap();
        result.extend_from_slice(&frame);
        result.extend_from_slice(&[0x1A, 0xCF, 0x00]);
    }
    result
}

#[test]
fn decode_ms200_stream() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("in.bin");
    let out_path = td.path().join("out.json");
    fs::write(&in_path, create_noisy_stream(&[b"one", b"two", b""])).unwrap();

    let report = decode::execute(
        in_path.to_str().unwrap(),
        Some(out_path.to_str().unwrap()),
        LinkKind::Ms200,
        /*chunk*/ 5,
        None,
    )
    .unwrap();

    assert_eq!(report.stats.rx, 3);
    assert_eq!(report.packets.len(), 3);
    assert_eq!(report.packets[0].payload, hex::encode("one"));
    assert_eq!(report.packets[2].sequence, 2);
    assert!(report.packets.iter().all(|p| p.src == 2 && p.dst == 7 && p.apid == 9));

    let json = fs::read_to_string(&out_path).unwrap();
    let written: Vec<decode::DecodedPacket> = serde_json::from_str(&json).unwrap();
    assert_eq!(written, report.packets);
}

#[test]
fn decode_chunk_size_does_not_matter() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("in.bin");
    fs::write(&in_path, create_noisy_stream(&[b"alpha", b"beta", b"gamma"])).unwrap();

    let reference = decode::execute(in_path.to_str().unwrap(), None, LinkKind::Ms200, 4096, None)
        .unwrap();
    for chunk in [1, 2, 3, 7, 19] {
        let report =
            decode::execute(in_path.to_str().unwrap(), None, LinkKind::Ms200, chunk, None)
                .unwrap();
        assert_eq!(report.packets, reference.packets);
    }
}

#[test]
fn encode_then_decode_ewc() {
    let td = tempdir().unwrap();
    let json_path = td.path().join("in.json");
    let bin_path = td.path().join("frames.bin");
    write_file(
        &json_path,
        r#"[{"status": 4, "data": [1, 2, 3]}, {"status": 0, "data": [4294967295]}]"#,
    );

    encode::execute(
        json_path.to_str().unwrap(),
        bin_path.to_str().unwrap(),
        LinkKind::Ewc,
        0x10,
        None,
    )
    .unwrap();
    let report =
        decode::execute(bin_path.to_str().unwrap(), None, LinkKind::Ewc, 3, None).unwrap();

    assert_eq!(report.packets.len(), 2);
    assert_eq!(
        report.packets[0].message,
        Some(EwcMessage::new(4, &[1, 2, 3]).unwrap())
    );
    assert_eq!(
        report.packets[1].message,
        Some(EwcMessage::new(0, &[u32::MAX]).unwrap())
    );
    assert_eq!(report.packets[1].apid, 0x10);
    assert_eq!(report.stats.frame, 0);
}

#[test]
fn decode_counts_corrupted_ewc_frame() {
    let td = tempdir().unwrap();
    let json_path = td.path().join("in.json");
    let bin_path = td.path().join("frames.bin");
    write_file(&json_path, r#"[{"status": 1, "data": [5]}]"#);

    encode::execute(
        json_path.to_str().unwrap(),
        bin_path.to_str().unwrap(),
        LinkKind::Ewc,
        0,
        None,
    )
    .unwrap();
    let mut bytes = fs::read(&bin_path).unwrap();
    let mid = bytes.len() - 4;
    bytes[mid] ^= 0x10;
    fs::write(&bin_path, &bytes).unwrap();

    let report =
        decode::execute(bin_path.to_str().unwrap(), None, LinkKind::Ewc, 64, None).unwrap();
    assert!(report.packets.is_empty());
    assert_eq!(report.stats.frame, 1);
}

#[test]
fn decode_with_node_filter() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("in.bin");
    let cfg_path = td.path().join("cfg.json");
    fs::write(&in_path, create_noisy_stream(&[b"x", b"y"])).unwrap();
    write_file(&cfg_path, r#"{"link": {"node": 3}}"#);

    let report = decode::execute(
        in_path.to_str().unwrap(),
        None,
        LinkKind::Ms200,
        64,
        Some(cfg_path.to_str().unwrap()),
    )
    .unwrap();
    assert!(report.packets.is_empty());
    assert_eq!(report.stats.drop, 2);
}

#[test]
fn decode_rejects_zero_chunk() {
    let td = tempdir().unwrap();
    let in_path = td.path().join("in.bin");
    fs::write(&in_path, b"").unwrap();
    assert!(decode::execute(in_path.to_str().unwrap(), None, LinkKind::Ms200, 0, None).is_err());
}

#[test]
fn crc_of_check_string() {
    assert_eq!(crc::execute(&hex::encode("123456789")).unwrap(), 0x29B1);
    assert_eq!(crc::execute("31 32 33 34 35 36 37 38 39").unwrap(), 0x29B1);
    assert!(crc::execute("xyz").is_err());
}
