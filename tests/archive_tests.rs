//! Integration tests for the build phase: raw store → conversation documents,
//! summary index, and landing page.

use std::path::Path;

use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;
use serde_json::Value;

use threadarchive::archive::writer::ArchiveWriter;
use threadarchive::config::ArchiveConfig;
use threadarchive::conversation::conversation_id;
use threadarchive::model::message::{RawMessage, Uid};
use threadarchive::normalize::{Normalizer, PRUNED_HEADERS};
use threadarchive::pipeline;
use threadarchive::store::raw::RawStore;
use threadarchive::thread::{flatten_threads, parse_thread_response};

const THREAD_RESPONSE: &[u8] = b"* THREAD (101 (102)(103))(200)\r\n";

fn fixture(name: &str) -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn fixture_bytes(uid: Uid) -> Vec<u8> {
    std::fs::read(fixture(&format!("{uid}.eml"))).unwrap()
}

fn archive_config(root: &Path) -> ArchiveConfig {
    ArchiveConfig {
        output_dir: root.to_path_buf(),
        ..ArchiveConfig::default()
    }
}

/// Store the given fixtures and run the build phase over the fixture threads.
fn build_archive(root: &Path, uids: &[Uid]) -> Vec<Vec<Uid>> {
    let config = archive_config(root);
    let store = RawStore::open(config.raw_path()).unwrap();
    let fetched = uids.iter().map(|&uid| {
        Ok(RawMessage {
            uid,
            content: fixture_bytes(uid),
        })
    });
    pipeline::store_fetched(&store, fetched, None).unwrap();

    let threads = flatten_threads(&parse_thread_response(THREAD_RESPONSE).unwrap());
    let writer = ArchiveWriter::new(&config).unwrap();
    let normalizer = Normalizer::default();
    let conversations = pipeline::build_conversations(&store, &normalizer, &threads);
    pipeline::write_archive(&writer, conversations).unwrap();
    writer.ensure_landing_page().unwrap();
    threads
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

// ─── Thread grouping ────────────────────────────────────────────────

#[test]
fn test_threads_become_conversations() {
    let tmp = TempDir::new().unwrap();
    let threads = build_archive(tmp.path(), &[101, 102, 103, 200]);
    assert_eq!(threads, vec![vec![101, 102, 103], vec![200]]);

    let first_id = conversation_id(&fixture_bytes(101));
    let second_id = conversation_id(&fixture_bytes(200));

    let first = read_json(tmp.child(format!("c/{first_id}.json")).path());
    assert_eq!(first["Id"], first_id.as_str());
    assert_eq!(first["Count"], 3);
    let uids: Vec<u64> = first["Msgs"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["UID"].as_u64().unwrap())
        .collect();
    assert_eq!(uids, vec![101, 102, 103]);

    let second = read_json(tmp.child(format!("c/{second_id}.json")).path());
    assert_eq!(second["Count"], 1);
    assert_eq!(second["Msgs"][0]["UID"], 200);
}

#[test]
fn test_summary_lists_first_messages_without_bodies() {
    let tmp = TempDir::new().unwrap();
    build_archive(tmp.path(), &[101, 102, 103, 200]);

    let summary = read_json(tmp.child("mail.json").path());
    let entries = summary.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["Count"], 3);
    assert_eq!(entries[1]["Count"], 1);
    for entry in entries {
        let msgs = entry["Msgs"].as_array().unwrap();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0]["Body"], "");
    }
    assert_eq!(entries[0]["Msgs"][0]["Header"]["Subject"], "Release planning");
}

// ─── Missing messages ───────────────────────────────────────────────

#[test]
fn test_missing_message_becomes_placeholder() {
    let tmp = TempDir::new().unwrap();
    build_archive(tmp.path(), &[101, 103, 200]);

    let id = conversation_id(&fixture_bytes(101));
    let doc = read_json(tmp.child(format!("c/{id}.json")).path());
    assert_eq!(doc["Count"], 3);
    let missing = &doc["Msgs"][1];
    assert_eq!(missing["UID"], 102);
    assert_eq!(missing["Body"], "Missing 102");
    assert!(missing["Header"].is_null());
}

#[test]
fn test_missing_primary_uses_placeholder_identifier() {
    let tmp = TempDir::new().unwrap();
    build_archive(tmp.path(), &[101, 102, 103]);

    let id = conversation_id(b"Missing 200");
    let doc = read_json(tmp.child(format!("c/{id}.json")).path());
    assert_eq!(doc["Id"], id.as_str());
    assert_eq!(doc["Msgs"][0]["Body"], "Missing 200");
}

// ─── Normalization ──────────────────────────────────────────────────

#[test]
fn test_dates_are_canonical_or_verbatim() {
    let tmp = TempDir::new().unwrap();
    build_archive(tmp.path(), &[101, 102, 103, 200]);

    let id = conversation_id(&fixture_bytes(101));
    let doc = read_json(tmp.child(format!("c/{id}.json")).path());
    assert_eq!(doc["Msgs"][0]["Date"], "2006-01-02T15:04:05-07:00");
    assert_eq!(doc["Msgs"][1]["Date"], "garbage");
    assert_eq!(doc["Msgs"][2]["Date"], "2006-01-03T09:00:00Z");
}

#[test]
fn test_addresses_are_structured() {
    let tmp = TempDir::new().unwrap();
    build_archive(tmp.path(), &[101, 102, 103, 200]);

    let id = conversation_id(&fixture_bytes(101));
    let doc = read_json(tmp.child(format!("c/{id}.json")).path());

    let from = &doc["Msgs"][0]["Header"]["From"];
    assert_eq!(from[0]["Name"], "Alice Example");
    assert_eq!(from[0]["Address"], "alice@example.com");

    let reply = &doc["Msgs"][1]["Header"];
    assert_eq!(reply["From"][0]["Name"], "Bob, the Builder");
    let cc: Vec<&str> = reply["Cc"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["Address"].as_str().unwrap())
        .collect();
    assert_eq!(cc, vec!["alice@example.com", "carol@example.com"]);

    let encoded = &doc["Msgs"][2]["Header"]["From"][0];
    assert_eq!(encoded["Name"], "Carol Müller");
}

#[test]
fn test_pruned_headers_never_reach_documents() {
    let tmp = TempDir::new().unwrap();
    build_archive(tmp.path(), &[101, 102, 103, 200]);

    for entry in std::fs::read_dir(tmp.child("c").path()).unwrap() {
        let doc = read_json(&entry.unwrap().path());
        for msg in doc["Msgs"].as_array().unwrap() {
            let Some(header) = msg["Header"].as_object() else {
                continue;
            };
            for name in header.keys() {
                assert!(!name.starts_with("X-"), "kept {name}");
                assert!(!PRUNED_HEADERS.contains(&name.as_str()), "kept {name}");
                assert_ne!(name, "Date");
            }
        }
    }
}

#[test]
fn test_multipart_body_and_subject_are_decoded() {
    let tmp = TempDir::new().unwrap();
    build_archive(tmp.path(), &[101, 102, 103, 200]);

    let id = conversation_id(&fixture_bytes(101));
    let doc = read_json(tmp.child(format!("c/{id}.json")).path());
    let msg = &doc["Msgs"][2];
    assert!(msg["Body"].as_str().unwrap().contains("Tuesday it is. Café after?"));
    assert_eq!(msg["Header"]["Subject"], "Re: Release planning ✓");
}

#[test]
fn test_broken_multipart_keeps_error_as_body() {
    let tmp = TempDir::new().unwrap();
    build_archive(tmp.path(), &[101, 102, 103, 200]);

    let id = conversation_id(&fixture_bytes(200));
    let doc = read_json(tmp.child(format!("c/{id}.json")).path());
    let msg = &doc["Msgs"][0];
    assert_eq!(
        msg["Body"],
        "MIME decoding error: multipart content without boundary parameter"
    );
    // The unparsable To header is dropped, the rest survives
    assert!(msg["Header"].get("To").is_none());
    assert_eq!(msg["Header"]["Subject"], "Broken attachment");
}

// ─── Output files ───────────────────────────────────────────────────

#[test]
fn test_layout_and_landing_page() {
    let tmp = TempDir::new().unwrap();
    build_archive(tmp.path(), &[101, 102, 103, 200]);

    tmp.child("raw/101.txt").assert(predicate::path::is_file());
    tmp.child("raw/200.txt").assert(predicate::path::is_file());
    tmp.child("mail.json").assert(predicate::str::starts_with("[\n {\n  \"Id\": "));
    tmp.child("index.html")
        .assert(predicate::str::contains("mail.json"))
        .assert(predicate::str::contains(env!("CARGO_PKG_VERSION")));

    let raw = std::fs::read(tmp.child("raw/101.txt").path()).unwrap();
    assert_eq!(raw, fixture_bytes(101));
}

#[test]
fn test_landing_page_is_not_overwritten() {
    let tmp = TempDir::new().unwrap();
    tmp.child("index.html").write_str("<p>custom</p>").unwrap();
    build_archive(tmp.path(), &[101, 102, 103, 200]);
    tmp.child("index.html").assert("<p>custom</p>");
}

#[test]
fn test_rerun_is_byte_identical() {
    let tmp = TempDir::new().unwrap();
    build_archive(tmp.path(), &[101, 102, 103, 200]);
    let id = conversation_id(&fixture_bytes(101));
    let first_doc = std::fs::read(tmp.child(format!("c/{id}.json")).path()).unwrap();
    let first_summary = std::fs::read(tmp.child("mail.json").path()).unwrap();

    build_archive(tmp.path(), &[101, 102, 103, 200]);
    assert_eq!(std::fs::read(tmp.child(format!("c/{id}.json")).path()).unwrap(), first_doc);
    assert_eq!(std::fs::read(tmp.child("mail.json").path()).unwrap(), first_summary);
}
