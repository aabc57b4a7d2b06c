use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::io::Write;
use std::path::PathBuf;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn inspect_defaults_to_treeviz() {
    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("inspect").arg(fixture_path("phoenix.xprot"));

    let output_pred = predicate::str::starts_with("⧉ XProtocol: PhoenixMetaProtocol")
        .and(predicate::str::contains("§ ParamMap: sKSpace"))
        .and(predicate::str::contains("⊕ ProtocolComposer: Inline_Composing"));

    cmd.assert().success().stdout(output_pred);
}

#[test]
fn inspect_as_json() {
    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("inspect")
        .arg(fixture_path("phoenix.xprot"))
        .arg("--format")
        .arg("ast-json");

    let output = cmd.assert().success().get_output().stdout.clone();
    let value: serde_json::Value = serde_json::from_slice(&output).expect("valid JSON");
    assert_eq!(value["name"], "PhoenixMetaProtocol");
    assert_eq!(value["id"], 1000002);
}

#[test]
fn inspect_tokens() {
    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("inspect")
        .arg(fixture_path("minimal.xprot"))
        .arg("-f")
        .arg("token-simple");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("    2 QUOTED_STRING \"Minimal\""));
}

#[test]
fn inspect_uses_config_file_format() {
    let mut config = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("temp file");
    writeln!(config, "[output]\nformat = \"ast-yaml\"").expect("write config");

    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("inspect")
        .arg(fixture_path("minimal.xprot"))
        .arg("--config")
        .arg(config.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("name: Minimal"));
}

#[test]
fn inspect_rejects_unknown_format() {
    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("inspect")
        .arg(fixture_path("minimal.xprot"))
        .arg("--format")
        .arg("ast-xml");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("invalid format type"));
}

#[test]
fn inspect_reports_parse_errors_with_line() {
    let mut file = tempfile::Builder::new()
        .suffix(".xprot")
        .tempfile()
        .expect("temp file");
    write!(file, "<XProtocol> {{\n  <Name> \"Broken\"\n  <ID> x").expect("write source");

    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("inspect").arg(file.path());

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("line 3:"));
}

#[test]
fn inspect_missing_file() {
    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("inspect").arg("/nonexistent/protocol.xprot");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("failed to read"));
}

#[test]
fn find_first_and_all() {
    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("find")
        .arg(fixture_path("phoenix.xprot"))
        .arg("lBaseResolution");
    cmd.assert()
        .success()
        .stdout("20:ParamLong lBaseResolution = 256\n");

    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("find")
        .arg(fixture_path("phoenix.xprot"))
        .arg("NoOfInputs")
        .arg("--all");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("41:ParamLong NoOfInputs = 2"));
}

#[test]
fn find_unknown_name_fails() {
    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("find")
        .arg(fixture_path("phoenix.xprot"))
        .arg("lNoSuchParam");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("no param named 'lNoSuchParam'"));
}

#[test]
fn get_values_and_attribute() {
    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("get")
        .arg(fixture_path("phoenix.xprot"))
        .arg("sKSpace.lBaseResolution");
    cmd.assert().success().stdout("256\n");

    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("get")
        .arg(fixture_path("phoenix.xprot"))
        .arg("MEAS.sKSpace.lBaseResolution")
        .arg("--tag")
        .arg("Unit");
    cmd.assert().success().stdout("\"px\"\n");
}

#[test]
fn get_unknown_tag_fails() {
    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("get")
        .arg(fixture_path("phoenix.xprot"))
        .arg("lBaseResolution")
        .arg("--tag")
        .arg("Colour");

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("unknown tag 'Colour'"));
}

#[test]
fn list_formats() {
    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("list-formats");

    let output_pred = predicate::str::contains("token-simple")
        .and(predicate::str::contains("token-json"))
        .and(predicate::str::contains("ast-json"))
        .and(predicate::str::contains("ast-yaml"))
        .and(predicate::str::contains("ast-treeviz (default)"));

    cmd.assert().success().stdout(output_pred);
}

fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("temp file");
    write!(file, "{}", contents).expect("write temp file");
    file
}

const TWO_DEPENDENCY_ATTRIBUTES: &str = r#"<XProtocol> {
  <Name> "Deps"
  <ID> 1
  <Userversion> 1.0
  <EVAStringTable> { }
  <ParamLong."lBase"> { 64 }
  <ParamCardLayout."x"> { }
  <Dependency."d"> { "a" <Visible> "true" <Context> "ONLINE" }
}"#;

#[test]
fn find_and_get_honour_parser_config() {
    let source = write_temp(".xprot", TWO_DEPENDENCY_ATTRIBUTES);
    let config = write_temp(".toml", "[parser]\ndependency_attributes = \"keep-first\"\n");

    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("get").arg(source.path()).arg("lBase");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("more than one trailing attribute"));

    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("get")
        .arg(source.path())
        .arg("lBase")
        .arg("--config")
        .arg(config.path());
    cmd.assert().success().stdout("64\n");

    let mut cmd = cargo_bin_cmd!("xprot");
    cmd.arg("find")
        .arg(source.path())
        .arg("lBase")
        .arg("--config")
        .arg(config.path());
    cmd.assert()
        .success()
        .stdout("6:ParamLong lBase = 64\n");
}
