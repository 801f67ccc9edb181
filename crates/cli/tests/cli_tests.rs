// Black-box tests for the `reprice` binary.
// Run with: cargo test -p reprice-cli --test cli_tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../recon/tests/fixtures").join(name)
}

/// Runs in `dir` with stdin closed, so the correction prompt never starts.
fn reprice(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_reprice"))
        .current_dir(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("REPRICE_MAPPING")
        .stdin(Stdio::null())
        .output()
        .expect("failed to run reprice")
}

fn workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::copy(fixture("measurement_mappings.json"), dir.path().join("measurement_mappings.json")).unwrap();
    dir
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

fn run_default(dir: &Path, extra: &[&str]) -> Output {
    let old = fixture("old-export.csv");
    let new = fixture("new-prices.csv");
    let mut args = vec![old.to_str().unwrap(), new.to_str().unwrap(), "new-export.csv"];
    args.extend_from_slice(extra);
    reprice(dir, &args)
}

// ============================================================================
// reprice
// ============================================================================

#[test]
fn reprice_writes_export_and_error_log() {
    let dir = workspace();
    let out = run_default(dir.path(), &[]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let export = fs::read_to_string(dir.path().join("new-export.csv")).unwrap();
    let lines: Vec<&str> = export.lines().collect();
    assert_eq!(lines[0], "Info;Version=1.0;SiteID=77;Country=DE");
    assert_eq!(lines[2], "Revise;110000000001;Kartons 10x20;KBS-200-NAT-10-20;99.85;50");
    assert_eq!(lines[3], "Revise;;;KBS-300-NAT-10-20;149.85;50");
    assert_eq!(lines[6], "Revise;110000000002;\"Kartons; farbig\";KBS-200-ROT-300-50;9.35;20");
    assert_eq!(lines[8], "Revise;110000000003;Polster;POL-100-1;2.00;5");

    let log = fs::read_to_string(dir.path().join("error_log.txt")).unwrap();
    assert_eq!(
        log,
        "SKUs not found in new prices file:\nKBS-50-SCH-10-20\nKBS-200-SCH-920-90\nKBS-200-SCH-7-7\n"
    );

    assert!(stderr(&out).contains("maka: repriced 4 of 7 row(s), 3 unresolved"));
}

#[test]
fn mapping_untouched_without_corrections() {
    let dir = workspace();
    let mapping = dir.path().join("measurement_mappings.json");
    let before = fs::read_to_string(&mapping).unwrap();

    let out = run_default(dir.path(), &["--non-interactive"]);
    assert!(out.status.success());
    assert_eq!(fs::read_to_string(&mapping).unwrap(), before);
}

#[test]
fn missing_mapping_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let out = run_default(dir.path(), &["--error-log", "logs/errors.txt"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    // Without the 300-50 alias the ROT row needs a correction.
    let log = fs::read_to_string(dir.path().join("logs/errors.txt")).unwrap();
    assert!(log.contains("KBS-200-ROT-300-50\n"));
    assert!(!dir.path().join("measurement_mappings.json").exists());
}

#[test]
fn mapping_path_from_environment() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("shop")).unwrap();
    fs::copy(fixture("measurement_mappings.json"), dir.path().join("shop/aliases.json")).unwrap();

    let old = fixture("old-export.csv");
    let new = fixture("new-prices.csv");
    let out = Command::new(env!("CARGO_BIN_EXE_reprice"))
        .current_dir(dir.path())
        .args([old.to_str().unwrap(), new.to_str().unwrap(), "new-export.csv"])
        .env_remove("RUST_LOG")
        .env("REPRICE_MAPPING", "shop/aliases.json")
        .stdin(Stdio::null())
        .output()
        .unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    // The 300-50 alias comes from shop/aliases.json.
    let export = fs::read_to_string(dir.path().join("new-export.csv")).unwrap();
    assert!(export.contains("KBS-200-ROT-300-50;9.35;20"));
    assert!(!dir.path().join("measurement_mappings.json").exists());
}

#[test]
fn catalog_profile() {
    let dir = workspace();
    let out = run_default(dir.path(), &["--profile", "catalog"]);
    assert!(out.status.success());

    let export = fs::read_to_string(dir.path().join("new-export.csv")).unwrap();
    assert!(export.contains("Revise;110000000001;Kartons 10x20;KBS-200-NAT-10-20;100.00;50"));
    assert!(export.contains("Revise;;;KBS-300-NAT-10-20;16.90;50"));
}

#[test]
fn json_report_on_stdout() {
    let dir = workspace();
    let out = run_default(dir.path(), &["--json"]);
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["meta"]["config_name"], "maka");
    assert_eq!(report["summary"]["priced_rows"], 4);
    assert_eq!(report["summary"]["unresolved_skus"], 3);
    assert_eq!(report["unresolved"][2]["sku"], "KBS-200-SCH-7-7");
    assert_eq!(report["unresolved"][2]["reason"], "needs_manual_input");
}

#[test]
fn strict_fails_on_unresolved() {
    let dir = workspace();
    let out = run_default(dir.path(), &["--strict"]);
    assert_eq!(out.status.code(), Some(61));
    assert!(stderr(&out).contains("3 SKU(s) unresolved"));
    // Files are still written.
    assert!(dir.path().join("new-export.csv").exists());
    assert!(dir.path().join("error_log.txt").exists());
}

#[test]
fn missing_positionals_is_usage_error() {
    let dir = workspace();

    let out = reprice(dir.path(), &[]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("missing <input>"));

    let out = reprice(dir.path(), &["old-export.csv", "new-prices.csv"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("usage: reprice <input> <new_prices> <output>"));
}

#[test]
fn missing_input_file_is_io_error() {
    let dir = workspace();
    let new = fixture("new-prices.csv");
    let out = reprice(dir.path(), &["nope.csv", new.to_str().unwrap(), "out.csv"]);
    assert_eq!(out.status.code(), Some(3));
    assert!(stderr(&out).contains("nope.csv"));
}

#[test]
fn corrupt_mapping_is_parse_error() {
    let dir = workspace();
    fs::write(dir.path().join("measurement_mappings.json"), "[1, 2").unwrap();
    let out = run_default(dir.path(), &[]);
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("hint:"));
    assert!(!dir.path().join("new-export.csv").exists());
}

#[test]
fn missing_column_is_parse_error() {
    let dir = workspace();
    fs::write(dir.path().join("old.csv"), "meta\nAction;Custom label (SKU)\nRevise;KBS-200-SCH-10-20\n").unwrap();
    let new = fixture("new-prices.csv");
    let out = reprice(dir.path(), &["old.csv", new.to_str().unwrap(), "out.csv"]);
    assert_eq!(out.status.code(), Some(4));
    assert!(stderr(&out).contains("Start price"));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn invalid_config_exit_code() {
    let dir = workspace();
    fs::write(
        dir.path().join("bad.reprice.toml"),
        "name = \"bad\"\n[colors]\ncanonical = \"SCH\"\ngeneric = \"SCH\"\n",
    )
    .unwrap();

    let out = run_default(dir.path(), &["--config", "bad.reprice.toml"]);
    assert_eq!(out.status.code(), Some(60));

    let out = reprice(dir.path(), &["validate", "bad.reprice.toml"]);
    assert_eq!(out.status.code(), Some(60));
    assert!(stderr(&out).contains("collides"));
}

#[test]
fn validate_reports_profile() {
    let dir = workspace();
    let config = fixture("catalog.reprice.toml");
    let out = reprice(dir.path(), &["validate", config.to_str().unwrap(), "--json"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stderr(&out).contains("valid: profile 'catalog'"));

    let resolved: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(resolved["prefix"], "KBS");
    assert_eq!(resolved["minimum_pack_size"], 100);
}

#[test]
fn config_and_profile_conflict() {
    let dir = workspace();
    let config = fixture("catalog.reprice.toml");
    let out = run_default(dir.path(), &["--profile", "catalog", "--config", config.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(2));
}

// ============================================================================
// reports
// ============================================================================

#[test]
fn unique_report() {
    let dir = workspace();
    let history = fixture("history.csv");
    let out = reprice(dir.path(), &["unique", history.to_str().unwrap(), "unique.csv"]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let report = fs::read_to_string(dir.path().join("unique.csv")).unwrap();
    assert_eq!(
        report,
        "SKU;Price 1;Price 2\nKBS-200-SCH-10-20;11.90;12.40\nKBS-500-SCH-10-20;24.90\nKBS-200-BRA-300-48;8.50;8.90\n"
    );
    assert!(stderr(&out).contains("skipped 1 item(s) with malformed SKUs: 200000000003"));
}

#[test]
fn compare_report() {
    let dir = workspace();
    let history = fixture("history.csv");
    let future = fixture("future-prices.csv");
    let out = reprice(
        dir.path(),
        &["compare", history.to_str().unwrap(), future.to_str().unwrap(), "compare.csv"],
    );
    assert!(out.status.success(), "stderr: {}", stderr(&out));

    let report = fs::read_to_string(dir.path().join("compare.csv")).unwrap();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "SKU;COLOR;SIZE;PIECES;New Price;Price;;EK;;-Versand");
    assert_eq!(lines[1], "KBS-200-SCH-10-20;SCH;10x20;200;12.90;11.90;;6.10;;4.90");
    assert!(stderr(&out).contains("2 of 3 SKU(s) have a future price"));
}
