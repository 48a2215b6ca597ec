//! Add → Save → Open → Extract round-trips across every codec and a mixed
//! corpus of payload shapes.

use lark_archive::Archive;
use lark_core::{filetime, Level, Method};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill(&mut data[..]);
    data
}

fn roundtrip_through_archive(method: Method, level: Level, bodies: &[(&str, Vec<u8>)]) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("roundtrip.ark");

    let mut archive = Archive::create(&path);
    for (name, body) in bodies {
        archive
            .add(name, body, method, level, filetime::now())
            .unwrap_or_else(|e| panic!("{}: add {} failed: {}", method, name, e));
    }
    archive.save().unwrap();

    let mut archive = Archive::open(&path).unwrap();
    for (name, body) in bodies {
        let mut sink = Vec::new();
        archive
            .extract(name, &mut sink)
            .unwrap_or_else(|e| panic!("{}: extract {} failed: {}", method, name, e));
        assert_eq!(&sink, body, "{}: {} bytes differ", method, name);
    }
    assert!(archive.test_integrity().all_ok());
}

#[test]
fn small_bodies_every_codec_and_level() {
    let bodies = [
        ("empty", Vec::new()),
        ("one", vec![0x42]),
        ("kilobyte", random_bytes(1024, 17)),
        ("text", b"pack my box with five dozen liquor jugs ".repeat(40).to_vec()),
    ];
    for method in Method::ALL {
        for level in [Level::NONE, Level::FAST, Level::DEFAULT, Level::BEST] {
            roundtrip_through_archive(method, level, &bodies);
        }
    }
}

#[test]
fn megabyte_zeros_except_deflate() {
    // DEFLATE shrinks a zero megabyte beyond the 1000:1 add guard and is
    // covered by the rejection test in engine.rs
    let bodies = [("zeros", vec![0u8; 1 << 20])];
    for method in [Method::Store, Method::Lzss, Method::Lzhuf, Method::Lzw, Method::Lz77] {
        roundtrip_through_archive(method, Level::DEFAULT, &bodies);
    }
}

#[test]
fn megabyte_alternating_except_deflate() {
    // Like the zero megabyte, a pure two-byte alternation lands DEFLATE
    // right past the 1000:1 add guard; the raw codec round-trip is covered
    // in lark-codecs
    let body: Vec<u8> = [b'A', b'B'].iter().copied().cycle().take(1 << 20).collect();
    let bodies = [("alternating", body)];
    for method in [Method::Store, Method::Lzss, Method::Lzhuf, Method::Lzw, Method::Lz77] {
        roundtrip_through_archive(method, Level::DEFAULT, &bodies);
    }
}

#[test]
fn quarter_megabyte_random_every_codec() {
    let bodies = [("random", random_bytes(256 << 10, 23))];
    for method in Method::ALL {
        roundtrip_through_archive(method, Level::DEFAULT, &bodies);
    }
}

#[test]
#[ignore = "slow: full megabyte of random data through the LZHUF brute-force search"]
fn megabyte_random_every_codec() {
    let bodies = [("random", random_bytes(1 << 20, 23))];
    for method in Method::ALL {
        roundtrip_through_archive(method, Level::DEFAULT, &bodies);
    }
}

#[test]
fn mixed_methods_in_one_archive() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("mixed.ark");

    let corpus: Vec<(String, Vec<u8>, Method)> = Method::ALL
        .iter()
        .enumerate()
        .map(|(i, &method)| {
            (
                format!("entry-{}", method),
                random_bytes(4096 + i * 911, i as u64),
                method,
            )
        })
        .collect();

    let mut archive = Archive::create(&path);
    for (name, body, method) in &corpus {
        archive
            .add(name, body, *method, Level::DEFAULT, filetime::now())
            .unwrap();
    }
    archive.save().unwrap();

    let mut archive = Archive::open(&path).unwrap();
    assert!(archive.test_integrity().all_ok());
    let listing = archive.list();
    assert_eq!(listing.totals.len(), Method::ALL.len());

    for (name, body, method) in &corpus {
        let entry = archive.find(name).unwrap();
        assert_eq!(entry.method, *method);
        let mut sink = Vec::new();
        archive.extract(name, &mut sink).unwrap();
        assert_eq!(&sink, body);
    }
}

#[test]
fn rebuild_preserves_every_entry() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rebuild.ark");

    let corpus: Vec<(String, Vec<u8>)> = (0..12)
        .map(|i| (format!("f{:02}", i), random_bytes(500 + i * 333, 40 + i as u64)))
        .collect();

    let mut archive = Archive::create(&path);
    for (i, (name, body)) in corpus.iter().enumerate() {
        let method = Method::ALL[i % Method::ALL.len()];
        archive.add(name, body, method, Level::DEFAULT, filetime::now()).unwrap();
    }
    archive.save().unwrap();

    // Reopen and rewrite without touching any entry: a pure rebuild
    let mut archive = Archive::open(&path).unwrap();
    archive.save().unwrap();

    let mut archive = Archive::open(&path).unwrap();
    for (name, body) in &corpus {
        let mut sink = Vec::new();
        archive.extract(name, &mut sink).unwrap();
        assert_eq!(&sink, body);
    }
}
