use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

const ENC: &str = "5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c5c";
const AUTH: &str = "3636363636363636363636363636363636363636363636363636363636363636";

fn cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("envelope-crypto").unwrap();
    cmd.env("ENVELOPE_CRYPTO_DIR", dir.path())
        .env_remove("ENVELOPE_AUTH_KEY")
        .env_remove("ENVELOPE_ENCRYPTION_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_of(assert: assert_cmd::assert::Assert) -> String {
    String::from_utf8(assert.get_output().stdout.clone()).unwrap()
}

#[test]
fn key_is_reproducible() {
    let dir = TempDir::new().unwrap();
    let run = || {
        let assert = cmd(&dir)
            .args(["key", "--salt", "saltsalt", "--cost", "1000", "--password-stdin"])
            .write_stdin("correct horse\n")
            .assert()
            .success();
        stdout_of(assert).trim().to_string()
    };

    let first = run();
    assert_eq!(first.len(), 192);
    assert_eq!(first, run());
}

#[test]
fn key_split_prints_three_parts() {
    let dir = TempDir::new().unwrap();
    let assert = cmd(&dir)
        .args(["key", "--salt", "s", "--cost", "10", "--password-stdin", "--split"])
        .write_stdin("pw\n")
        .assert()
        .success();

    let parts: Value = serde_json::from_str(&stdout_of(assert)).unwrap();
    for field in ["serverPassword", "encryptionKey", "authKey"] {
        assert_eq!(parts[field].as_str().unwrap().len(), 64);
    }
}

#[test]
fn key_rejects_zero_cost() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .args(["key", "--salt", "s", "--cost", "0", "--password-stdin"])
        .write_stdin("pw\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Format error"));
}

#[test]
fn item_encrypt_then_decrypt() {
    let dir = TempDir::new().unwrap();
    let assert = cmd(&dir)
        .args(["item", "encrypt", "--uuid", "note-1"])
        .args(["--auth-key", AUTH, "--encryption-key", ENC])
        .write_stdin(r#"{"note":"hello"}"#)
        .assert()
        .success();
    let wrapped = stdout_of(assert);
    assert!(wrapped.contains("encryptedContent"));
    assert!(wrapped.contains("encItemKey"));

    cmd(&dir)
        .args(["item", "decrypt"])
        .env("ENVELOPE_AUTH_KEY", AUTH)
        .env("ENVELOPE_ENCRYPTION_KEY", ENC)
        .write_stdin(wrapped)
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"{"note":"hello"}"#));
}

#[test]
fn item_decrypt_with_wrong_key_fails() {
    let dir = TempDir::new().unwrap();
    let assert = cmd(&dir)
        .args(["item", "encrypt"])
        .args(["--auth-key", AUTH, "--encryption-key", ENC])
        .write_stdin("42")
        .assert()
        .success();
    let wrapped = stdout_of(assert);

    cmd(&dir)
        .args(["item", "decrypt"])
        .args(["--auth-key", ENC, "--encryption-key", ENC])
        .write_stdin(wrapped)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"));
}

#[test]
fn serve_answers_each_line() {
    let dir = TempDir::new().unwrap();
    let input = concat!(
        r#"{"id": 1, "route": "/crypto/check"}"#,
        "\n",
        r#"{"id": 2, "route": "/bogus", "body": {}}"#,
        "\n",
    );

    let assert = cmd(&dir).arg("serve").write_stdin(input).assert().success();
    let mut replies: Vec<Value> = stdout_of(assert)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    replies.sort_by_key(|r| r["id"].as_i64());

    assert_eq!(replies.len(), 2);
    assert_eq!(replies[0]["status"], 200);
    assert_eq!(replies[0]["body"], "OK");
    assert_eq!(replies[1]["status"], 400);
}

#[test]
fn config_shows_paths() {
    let dir = TempDir::new().unwrap();
    cmd(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("Settings file"))
        .stdout(predicate::str::contains("100000"));
}

#[test]
fn item_rewrap_moves_to_new_keys() {
    let dir = TempDir::new().unwrap();
    let new_enc = "a1".repeat(32);
    let new_auth = "b2".repeat(32);

    let assert = cmd(&dir)
        .args(["item", "encrypt", "--uuid", "r-1"])
        .args(["--auth-key", AUTH, "--encryption-key", ENC])
        .write_stdin(r#"["kept"]"#)
        .assert()
        .success();
    let wrapped = stdout_of(assert);

    let assert = cmd(&dir)
        .args(["item", "rewrap", "--auth-key", AUTH, "--encryption-key", ENC])
        .args(["--new-auth-key", &new_auth, "--new-encryption-key", &new_enc])
        .write_stdin(wrapped.clone())
        .assert()
        .success();
    let rewrapped = stdout_of(assert);

    let before: Value = serde_json::from_str(&wrapped).unwrap();
    let after: Value = serde_json::from_str(&rewrapped).unwrap();
    assert_eq!(before["encryptedContent"], after["encryptedContent"]);
    assert_ne!(before["encItemKey"], after["encItemKey"]);

    cmd(&dir)
        .args(["item", "decrypt"])
        .args(["--auth-key", &new_auth, "--encryption-key", &new_enc])
        .write_stdin(rewrapped.clone())
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"["kept"]"#));

    cmd(&dir)
        .args(["item", "decrypt", "--auth-key", AUTH, "--encryption-key", ENC])
        .write_stdin(rewrapped)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Authentication failed"));
}
