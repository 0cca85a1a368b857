//! End-to-end tests for the `recibo` binary.

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const BOLETA: &str = "FERRETERIA EL MARTILLO\n\
Boleta Electrónica N° 4521\n\
Fecha: 12/04/2024\n\
Total: $15.990\n";

/// Command isolated from the user's real config and data directories.
fn recibo(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("recibo").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.join("config"))
        .env("XDG_DATA_HOME", home.join("data"))
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn extract_reads_file() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("boleta.txt");
    std::fs::write(&input, BOLETA).unwrap();

    let output = recibo(home.path()).arg("extract").arg(&input).output().unwrap();
    let json = stdout_json(&output);

    assert_eq!(json["amount"], serde_json::json!(15990.0));
    assert_eq!(json["date"], "12/04/2024");
    assert_eq!(json["vendor"], "FERRETERIA EL MARTILLO");
    assert_eq!(json["currency"], "CLP");
    assert_eq!(json["due_date"], serde_json::Value::Null);
    assert_eq!(json["description"], "Pago a FERRETERIA EL MARTILLO por $15.990");
}

#[test]
fn extract_reads_stdin() {
    let home = TempDir::new().unwrap();

    let output = recibo(home.path())
        .args(["extract", "--compact"])
        .write_stdin("Movistar\nVencimiento: 20/05/2024\nMonto: $25.990")
        .output()
        .unwrap();
    let json = stdout_json(&output);

    assert_eq!(json["category"], "telecomunicaciones");
    assert_eq!(json["due_date"], "20/05/2024");
    assert_eq!(json["amount"], serde_json::json!(25990.0));
}

#[test]
fn extract_empty_input_has_no_fields() {
    let home = TempDir::new().unwrap();

    let output = recibo(home.path()).arg("extract").write_stdin("").output().unwrap();
    let json = stdout_json(&output);

    assert_eq!(json["amount"], serde_json::Value::Null);
    assert_eq!(json["vendor"], serde_json::Value::Null);
    assert_eq!(json["currency"], "CLP");
}

#[test]
fn process_text_dump_as_json() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("boleta.txt");
    std::fs::write(&input, BOLETA).unwrap();

    let output = recibo(home.path()).arg("process").arg(&input).output().unwrap();
    let json = stdout_json(&output);

    assert_eq!(json["confidence"], serde_json::json!(0.85));
    assert_eq!(json["text"], BOLETA);
    assert_eq!(json["extracted_data"]["amount"], serde_json::json!(15990.0));
}

#[test]
fn process_text_dump_as_csv() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("boleta.txt");
    std::fs::write(&input, BOLETA).unwrap();

    recibo(home.path())
        .arg("process")
        .arg(&input)
        .args(["--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("file,amount,currency,date,date_iso"))
        .stdout(predicate::str::contains("boleta.txt,15990,CLP,12/04/2024,2024-04-12"));
}

#[test]
fn process_missing_file_fails() {
    let home = TempDir::new().unwrap();

    recibo(home.path())
        .args(["process", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn process_image_without_models_fails() {
    let home = TempDir::new().unwrap();
    let input = home.path().join("foto.png");
    std::fs::write(&input, b"png bytes").unwrap();

    recibo(home.path())
        .arg("process")
        .arg(&input)
        .arg("--model-dir")
        .arg(home.path().join("no-models"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("OCR models not found"));
}

#[test]
fn batch_writes_outputs_and_summary() {
    let home = TempDir::new().unwrap();
    let inbox = home.path().join("inbox");
    let out = home.path().join("out");
    std::fs::create_dir_all(&inbox).unwrap();
    std::fs::write(inbox.join("a.txt"), BOLETA).unwrap();
    std::fs::write(inbox.join("b.txt"), "Jumbo\nTotal: $8.500").unwrap();
    std::fs::write(inbox.join("notes.md"), "ignored").unwrap();

    let pattern = format!("{}/*", inbox.display());
    recibo(home.path())
        .args(["batch", &pattern, "--summary", "--output-dir"])
        .arg(&out)
        .assert()
        .success();

    assert!(out.join("a.json").exists());
    assert!(out.join("b.json").exists());
    assert!(!out.join("notes.json").exists());

    let summary = std::fs::read_to_string(out.join("summary.csv")).unwrap();
    assert_eq!(summary.lines().count(), 3);
    assert!(summary.contains("b.txt,8500,CLP"));
}

#[test]
fn config_init_get_set() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("recibo.json");
    let config_arg = config.to_str().unwrap();

    recibo(home.path())
        .args(["-c", config_arg, "config", "init"])
        .assert()
        .success();
    assert!(config.exists());

    recibo(home.path())
        .args(["-c", config_arg, "config", "get", "server.port"])
        .assert()
        .success()
        .stdout("8000\n");

    recibo(home.path())
        .args(["-c", config_arg, "config", "set", "server.port", "9100"])
        .assert()
        .success();

    recibo(home.path())
        .args(["-c", config_arg, "config", "get", "server.port"])
        .assert()
        .success()
        .stdout("9100\n");

    recibo(home.path())
        .args(["-c", config_arg, "config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn config_set_rejects_wrong_type() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("recibo.json");

    recibo(home.path())
        .arg("-c")
        .arg(&config)
        .args(["config", "set", "server.port", "\"eighty\""])
        .assert()
        .failure();
}

#[test]
fn models_status_reports_missing_files() {
    let home = TempDir::new().unwrap();

    recibo(home.path())
        .args(["models", "status", "--model-dir"])
        .arg(home.path().join("models"))
        .assert()
        .success()
        .stdout(predicate::str::contains("det.onnx"))
        .stdout(predicate::str::contains("missing"));
}
