//! Security-specific tests for the vault and password paths.
//!
//! These tests verify:
//! 1. Tampered vault entries never decrypt
//! 2. A wrong seed is indistinguishable from a missing entry by default
//! 3. Malformed inputs don't panic
//! 4. Secrets are zeroed after use (flow-level verification)
//! 5. Derived passwords stay stable

use base64::{engine::general_purpose::STANDARD, Engine as _};
use seedpass_core::vault::{parse_document, DEFAULT_SLOT};
use seedpass_core::{
    decrypt_secret, derive_key, derive_password, encrypt_secret, normalize_seed, parse_mnemonic,
    validate_seed, EncryptedSecret, Lookup, MemoryStore, SecretStore, VaultEntry, VaultStore,
};
use zeroize::Zeroize;

const SEED: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";
const OTHER_SEED: &str = "zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo zoo wrong";

/// Rewrite the first stored entry in place
async fn tamper_first_entry(vault: &VaultStore<MemoryStore>, f: impl FnOnce(&mut VaultEntry)) {
    let raw = vault.store().get(DEFAULT_SLOT).await.unwrap().unwrap();
    let mut entries = parse_document(&raw).unwrap();
    f(&mut entries[0]);
    vault
        .store()
        .set(DEFAULT_SLOT, &serde_json::to_string(&entries).unwrap())
        .await
        .unwrap();
}

fn flip_first_byte(encoded: &str) -> String {
    let mut bytes = STANDARD.decode(encoded).unwrap();
    bytes[0] ^= 0xFF;
    STANDARD.encode(bytes)
}

// ============================================================================
// 1. Tampered Entry Tests
// ============================================================================

#[tokio::test]
async fn test_tampered_ciphertext_fails_decryption() {
    let vault = VaultStore::new(MemoryStore::new());
    vault
        .save_entry(SEED, "example.com", "", "hunter2")
        .await
        .unwrap();

    tamper_first_entry(&vault, |e| e.ciphertext = flip_first_byte(&e.ciphertext)).await;

    assert_eq!(
        vault.lookup(SEED, "example.com").await.unwrap(),
        Lookup::DecryptionFailed
    );
}

#[tokio::test]
async fn test_tampered_nonce_fails_decryption() {
    let vault = VaultStore::new(MemoryStore::new());
    vault
        .save_entry(SEED, "example.com", "", "hunter2")
        .await
        .unwrap();

    tamper_first_entry(&vault, |e| e.iv = flip_first_byte(&e.iv)).await;

    assert_eq!(
        vault.lookup(SEED, "example.com").await.unwrap(),
        Lookup::DecryptionFailed
    );
}

#[tokio::test]
async fn test_swapped_ciphertexts_do_not_cross_decrypt() {
    // Each ciphertext only authenticates under its own nonce
    let vault = VaultStore::new(MemoryStore::new());
    vault.save_entry(SEED, "a.example", "", "alpha").await.unwrap();
    vault.save_entry(SEED, "b.example", "", "bravo").await.unwrap();

    let raw = vault.store().get(DEFAULT_SLOT).await.unwrap().unwrap();
    let mut entries = parse_document(&raw).unwrap();
    let (first, second) = entries.split_at_mut(1);
    std::mem::swap(&mut first[0].ciphertext, &mut second[0].ciphertext);
    vault
        .store()
        .set(DEFAULT_SLOT, &serde_json::to_string(&entries).unwrap())
        .await
        .unwrap();

    assert_eq!(
        vault.lookup(SEED, "a.example").await.unwrap(),
        Lookup::DecryptionFailed
    );
}

#[test]
fn test_truncated_ciphertext_fails() {
    let key = derive_key(SEED).unwrap();
    let encrypted = encrypt_secret(&key, "hunter2").unwrap();

    for len in [0, 1, 15, 16, encrypted.ciphertext().len() - 1] {
        let truncated =
            EncryptedSecret::from_parts(encrypted.nonce(), encrypted.ciphertext()[..len].to_vec())
                .unwrap();
        assert!(decrypt_secret(&key, &truncated).is_err(), "len {}", len);
    }
}

// ============================================================================
// 2. Wrong Seed Ambiguity
// ============================================================================

#[tokio::test]
async fn test_wrong_seed_looks_like_missing_entry() {
    let vault = VaultStore::new(MemoryStore::new());
    vault
        .save_entry(SEED, "example.com", "alice", "hunter2")
        .await
        .unwrap();

    let wrong = vault
        .get_decrypted_password(OTHER_SEED, "example.com")
        .await
        .unwrap();
    let missing = vault
        .get_decrypted_password(SEED, "missing.example")
        .await
        .unwrap();
    assert!(wrong.is_none());
    assert!(missing.is_none());

    // The tagged lookup keeps them apart
    assert_eq!(
        vault.lookup(OTHER_SEED, "example.com").await.unwrap(),
        Lookup::DecryptionFailed
    );
    assert_eq!(
        vault.lookup(SEED, "missing.example").await.unwrap(),
        Lookup::NotFound
    );
}

#[test]
fn test_wrong_seeds_all_fail() {
    let key = derive_key(SEED).unwrap();
    let encrypted = encrypt_secret(&key, "hunter2").unwrap();

    let wrong_seeds = [
        OTHER_SEED,
        "",
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abou",
        // Trailing space changes the key
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about ",
    ];

    for seed in &wrong_seeds {
        let wrong_key = derive_key(seed).unwrap();
        assert!(
            decrypt_secret(&wrong_key, &encrypted).is_err(),
            "Wrong seed {:?} should fail",
            seed
        );
    }
}

// ============================================================================
// 3. Malformed Input Panic Tests (should NOT panic)
// ============================================================================

#[test]
fn test_parse_mnemonic_garbage_does_not_panic() {
    let inputs = [
        "",
        "a",
        "hello world",
        "abandon abandon abandon", // Too few words
        &"abandon ".repeat(100),   // Too many words
        "🎉 🎊 🎈 🎃 🎄 🎅 🎆 🎇 🎁 🎂 🎀 🎍", // Unicode
        "\0\0\0\0\0\0\0\0\0\0\0\0", // Null bytes
        &"a".repeat(10000),          // Very long
    ];

    for input in &inputs {
        assert!(parse_mnemonic(input).is_err());
        assert!(!validate_seed(&normalize_seed(input)));
    }
}

#[test]
fn test_parse_document_garbage_does_not_panic() {
    let inputs = [
        "{",
        "null",
        "42",
        "\"seedpass\"",
        "{}",
        "[1, 2, 3]",
        "[{\"site\": 1}]",
        "[{\"site\":\"a\",\"username\":\"\",\"ciphertext\":\"\"}]",
        &"[".repeat(10000),
        "\0\0\0",
    ];

    for input in &inputs {
        assert!(parse_document(input).is_err(), "{:?} should be rejected", input);
    }
}

#[test]
fn test_damaged_entry_fields_do_not_panic() {
    let fields = ["", "!!!!", "AAAA", "AAAAAAAAAAAAAAAA", &"A".repeat(4096), "====="];

    for ciphertext in &fields {
        for iv in &fields {
            let entry = VaultEntry {
                site: "example.com".into(),
                username: String::new(),
                ciphertext: ciphertext.to_string(),
                iv: iv.to_string(),
            };
            // Decoding may fail; it must not panic
            let _ = entry.encrypted();
        }
    }
}

#[test]
fn test_random_documents_do_not_panic() {
    use rand::Rng;
    let mut rng = rand::thread_rng();

    for _ in 0..1000 {
        let len = rng.gen_range(0..200);
        let bytes: Vec<u8> = (0..len).map(|_| rng.gen_range(0x20..0x7f)).collect();
        let input = String::from_utf8(bytes).unwrap();
        let _ = parse_document(&input);
        let _ = parse_document(&format!("[{}]", input));
    }
}

#[tokio::test]
async fn test_corrupted_slot_reads_as_empty() {
    let vault = VaultStore::new(MemoryStore::new());
    vault
        .store()
        .set(DEFAULT_SLOT, "definitely not json")
        .await
        .unwrap();

    assert!(vault.load_entries().await.unwrap().is_empty());
    assert!(vault.try_load_entries().await.is_err());
    assert_eq!(
        vault.get_decrypted_password(SEED, "example.com").await.unwrap(),
        None
    );
}

// ============================================================================
// 4. Secret Zeroing Flow Test
// ============================================================================

#[test]
fn test_zeroize_works_on_string() {
    let mut secret = String::from("hunter2");
    secret.zeroize();
    assert!(secret.is_empty());
}

#[test]
fn test_decrypted_secret_is_zeroizing() {
    let key = derive_key(SEED).unwrap();
    let encrypted = encrypt_secret(&key, "hunter2").unwrap();

    let mut decrypted = decrypt_secret(&key, &encrypted).unwrap();
    assert_eq!(decrypted.as_str(), "hunter2");

    decrypted.zeroize();
    assert!(decrypted.is_empty());
}

#[test]
fn test_debug_output_is_redacted() {
    let key = derive_key(SEED).unwrap();
    assert!(!format!("{:?}", key).contains("b5b599"));

    let found = Lookup::Found(zeroize::Zeroizing::new("hunter2".to_string()));
    assert!(!format!("{:?}", found).contains("hunter2"));
}

// ============================================================================
// 5. Password Stability
// ============================================================================

#[test]
fn test_password_regression_vectors() {
    let cases = [
        ("example.com", "", 16, "Zw9JG1JKbhaA?n;$"),
        ("example.com", "alice@example.com", 16, "eOfpzW5bed^MVy0p"),
        ("github.com", "", 8, "fac;ox$N"),
        (
            "example.com",
            "",
            64,
            "Zw9JG1JKbhaA?n;$+5A6gqUnVbGgW+EhC8O:nSd2ea5E9pu3pNhfoH3tHxyuU&n7",
        ),
    ];

    for (site, username, length, expected) in cases {
        assert_eq!(
            derive_password(SEED, site, username, length).unwrap(),
            expected,
            "{} / {:?} / {}",
            site,
            username,
            length
        );
    }
}

#[test]
fn test_password_does_not_depend_on_vault() {
    // Derivation is pure; no storage is involved
    let first = derive_password(SEED, "example.com", "", 16).unwrap();
    let second = derive_password(&normalize_seed(&SEED.to_uppercase()), "example.com", "", 16)
        .unwrap();
    assert_eq!(first, second);
}
