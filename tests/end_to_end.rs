use std::io::Write;
use std::time::Duration;

use openssl::rsa::Rsa;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::NamedTempFile;
use time::macros::datetime;
use tokio::io::AsyncReadExt;
use tokio::net::TcpListener;
use tokio::sync::watch;

use telemetry_emitter::protocol::{split_packet, Framing};
use telemetry_emitter::sensor::{FixedClock, MeasurementRanges, ReadingGenerator};
use telemetry_emitter::signing::{load_public_key, verify};
use telemetry_emitter::{Emitter, EmitterConfig, Reading, READING_LEN};

struct Sensor {
    key: NamedTempFile,
    public: NamedTempFile,
}

fn sensor_keys() -> Sensor {
    let rsa = Rsa::generate(2048).unwrap();
    let mut key = NamedTempFile::new().unwrap();
    key.write_all(&rsa.private_key_to_pem().unwrap()).unwrap();
    let mut public = NamedTempFile::new().unwrap();
    public.write_all(&rsa.public_key_to_pem().unwrap()).unwrap();
    Sensor { key, public }
}

fn emitter_config(sensor: &Sensor, port: u16, framing: &str) -> EmitterConfig {
    let port = port.to_string();
    let key = sensor.key.path().to_string_lossy().to_string();
    EmitterConfig::from_pairs([
        ("sensor_id", "101"),
        ("server_ip", "127.0.0.1"),
        ("server_port", port.as_str()),
        ("private_key_path", key.as_str()),
        ("send_interval_secs", "1"),
        ("packet_framing", framing),
    ])
    .unwrap()
}

/// Accept `count` connections and return everything each one sent
async fn capture(listener: TcpListener, count: usize, stop: watch::Sender<bool>) -> Vec<Vec<u8>> {
    let mut packets = Vec::new();
    for _ in 0..count {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        socket.read_to_end(&mut buf).await.unwrap();
        packets.push(buf);
    }
    stop.send(true).unwrap();
    packets
}

#[tokio::test]
async fn emitted_packet_verifies_against_sensor_key() {
    let sensor = sensor_keys();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = emitter_config(&sensor, port, "raw");

    let generator = ReadingGenerator::new(
        config.sensor_id,
        StdRng::seed_from_u64(2024),
        FixedClock(datetime!(2024-03-05 14:07:09)),
    );
    let mut emitter = Emitter::new(&config, generator);

    let (stop_tx, stop_rx) = watch::channel(false);
    let server = tokio::spawn(capture(listener, 1, stop_tx));

    tokio::time::timeout(Duration::from_secs(10), emitter.run(stop_rx))
        .await
        .unwrap()
        .unwrap();
    let packets = server.await.unwrap();
    let packet = &packets[0];

    // RSA-2048 signature right after the 22-byte reading
    assert_eq!(packet.len(), READING_LEN + 256);

    let reading = Reading::decode(&packet[..READING_LEN]).unwrap();
    let ranges = MeasurementRanges::default();
    assert_eq!(reading.sensor_id, 101);
    assert_eq!(reading.timestamp, 20240305140709);
    assert!(ranges.temperature.contains(&reading.temperature));
    assert!(ranges.pressure.contains(&reading.pressure));
    assert!(ranges.humidity.contains(&reading.humidity));

    let public = load_public_key(sensor.public.path()).unwrap();
    assert!(verify(&public, &packet[..READING_LEN], &packet[READING_LEN..]).unwrap());

    let mut tampered = packet[..READING_LEN].to_vec();
    tampered[12] ^= 0x80;
    assert!(!verify(&public, &tampered, &packet[READING_LEN..]).unwrap());
}

#[tokio::test]
async fn length_prefixed_packets_carry_signature_size() {
    let sensor = sensor_keys();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = emitter_config(&sensor, port, "length-prefixed");

    let generator = ReadingGenerator::new(
        config.sensor_id,
        StdRng::seed_from_u64(9),
        FixedClock(datetime!(2025-12-31 23:59:59)),
    );
    let mut emitter = Emitter::new(&config, generator);

    let (stop_tx, stop_rx) = watch::channel(false);
    let server = tokio::spawn(capture(listener, 2, stop_tx));

    tokio::time::timeout(Duration::from_secs(10), emitter.run(stop_rx))
        .await
        .unwrap()
        .unwrap();
    let packets = server.await.unwrap();
    let public = load_public_key(sensor.public.path()).unwrap();

    for packet in &packets {
        assert_eq!(packet.len(), READING_LEN + 2 + 256);
        assert_eq!(&packet[22..24], &256u16.to_le_bytes());

        let parts = split_packet(packet, Framing::LengthPrefixed).unwrap();
        assert_eq!(parts.reading.timestamp, 20251231235959);
        assert!(verify(&public, parts.signed_bytes, parts.signature).unwrap());
    }

    // Each cycle samples fresh values
    assert_ne!(
        Reading::decode(&packets[0]).unwrap(),
        Reading::decode(&packets[1]).unwrap()
    );
}
