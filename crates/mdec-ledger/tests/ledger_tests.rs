use std::fs;

use mdec_ledger::{
    Binding, Certification, Faktory, FaktoryConfig, INGEST_PROVENANCE, Ledger, LedgerError,
    LedgerRecord, SignetComponents, StampRequest, ingest_manifest,
};
use serde_json::Value;
use tempfile::TempDir;

fn components() -> SignetComponents {
    SignetComponents {
        name: "Chris Olds".into(),
        dob: "1962-07-14".into(),
        epoch: "20xx".into(),
        vocation: "engineer,musician,author,poet".into(),
        origin: "USA".into(),
    }
}

#[test]
fn test_mint_bind_and_persist() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.json");

    let signet = components().mint().unwrap();
    assert_eq!(
        signet.as_str(),
        "Chris-Olds-07-14-1962-20xx-Engineer-Musician-Author-Poet-USA"
    );
    let mid = signet.mid().to_string();

    let mut ledger = Ledger::open(&path).unwrap();
    assert_eq!(
        ledger.bind(&mid, LedgerRecord::minted(&signet, components())),
        Binding::Bound
    );
    ledger.save().unwrap();

    let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let entry = &saved["entries"][&mid];
    assert_eq!(entry["signet"], signet.as_str());
    assert_eq!(entry["components"]["dob"], "1962-07-14");

    // Minting the same identity again never overwrites the binding.
    let mut reopened = Ledger::open(&path).unwrap();
    let again = components().mint().unwrap();
    assert_eq!(again.mid().to_string(), mid);
    assert!(matches!(
        reopened.bind(&mid, LedgerRecord::minted(&again, components())),
        Binding::AlreadyBound { .. }
    ));
}

#[test]
fn test_ingest_manifest_into_existing_ledger() {
    let temp = TempDir::new().unwrap();
    let ledger_path = temp.path().join("ledger.json");
    let manifest_path = temp.path().join("manifest.json");

    let mut ledger = Ledger::open(&ledger_path).unwrap();
    let signet = components().mint().unwrap();
    ledger.bind(signet.mid().to_string(), LedgerRecord::minted(&signet, components()));
    ledger.save().unwrap();

    fs::write(
        &manifest_path,
        format!(
            r#"[
                {{"m-id": "{}", "file_name": "dup.txt"}},
                {{"m-id": "asset-1", "signet_creator": "Olds", "generated_at": "2024-01-01T00:00:00", "relative_path": "a/one.txt", "file_name": "one.txt"}},
                {{"file_name": "no-id.txt"}}
            ]"#,
            signet.mid()
        ),
    )
    .unwrap();

    let mut ledger = Ledger::open(&ledger_path).unwrap();
    let committed = ingest_manifest(&manifest_path, &mut ledger).unwrap();
    assert_eq!(committed.len(), 1);
    assert_eq!(committed[0].file_name.as_deref(), Some("one.txt"));

    let reopened = Ledger::open(&ledger_path).unwrap();
    assert_eq!(reopened.len(), 2);
    let record = reopened.get("asset-1").unwrap();
    assert_eq!(record.provenance.as_deref(), Some(INGEST_PROVENANCE));
    assert_eq!(record.signet.as_deref(), Some("Olds"));
}

#[test]
fn test_ingest_leaves_corrupt_ledger_alone() {
    let temp = TempDir::new().unwrap();
    let ledger_path = temp.path().join("ledger.json");
    fs::write(&ledger_path, "[1, 2").unwrap();

    assert!(matches!(
        Ledger::open(&ledger_path),
        Err(LedgerError::CorruptLedger { .. })
    ));
    assert_eq!(fs::read_to_string(&ledger_path).unwrap(), "[1, 2");
}

#[test]
fn test_stamp_with_config() {
    let temp = TempDir::new().unwrap();
    let asset = temp.path().join("deploy.sh");
    fs::write(&asset, "#!/bin/sh\necho ready\n").unwrap();

    let config = FaktoryConfig::builder()
        .origin_vault("E:/MDEC_VAULT")
        .org_name("Olympus Works")
        .build()
        .unwrap();
    let request = StampRequest {
        category: Some("Deployments".into()),
        context: Some("Ops execution: manual trigger".into()),
        tags: vec!["ops".into()],
        neural_links: Vec::new(),
    };
    let (engram, sidecar) = Faktory::with_config(config).stamp(&asset, &request).unwrap();

    assert_eq!(engram.origin_vault, "E:/MDEC_VAULT");
    assert_eq!(engram.mdec_category, "04");
    assert_eq!(engram.certification, Certification::Gold);
    let layer = engram.sentient_layer.as_ref().unwrap();
    assert_eq!(layer.context, "Ops execution: manual trigger");
    assert!(layer.os_authority.contains("Olympus Works"));

    let saved: Value = serde_json::from_str(&fs::read_to_string(&sidecar).unwrap()).unwrap();
    assert_eq!(saved["checksum"], engram.checksum.as_str());
    assert_eq!(saved["sentient_layer"]["cognitive_flags"][0], "faktory_processed");
    assert!(saved["sentient_layer"]["sentiment_vector"].is_null());
}
