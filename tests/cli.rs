use assert_cmd::Command;
use predicates::str::contains;
use tablepdf::layout_config::LayoutConfig;

const ASSETS: &str = "<table><tr><th>Asset</th><th>Value</th></tr>\
                      <tr><td>Laptop</td><td>1200.00</td></tr></table>";

#[test]
fn render_defaults_output_next_to_input_and_writes_layout() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let input = dir.path().join("assets.html");
    std::fs::write(&input, ASSETS).expect("write input");
    let layout_path = dir.path().join("out").join("layout.json");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tablepdf"));
    cmd.arg("render")
        .arg(&input)
        .arg("--layout-json")
        .arg(&layout_path)
        .arg("--title")
        .arg("Inventory")
        .assert()
        .success()
        .stderr(contains("assets.pdf"))
        .stderr(contains("1 page)"));

    let pdf = std::fs::read(dir.path().join("assets.pdf")).expect("pdf written");
    assert!(pdf.starts_with(b"%PDF-"));

    let json = std::fs::read_to_string(&layout_path).expect("layout written");
    let layout = LayoutConfig::from_json(&json).expect("layout JSON");
    assert_eq!(layout.title, "Inventory");
    assert_eq!(layout.rows().count(), 2);
}

#[test]
fn render_honours_explicit_output_path() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let input = dir.path().join("assets.html");
    std::fs::write(&input, ASSETS).expect("write input");
    let output = dir.path().join("report.pdf");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tablepdf"));
    cmd.arg("render").arg(&input).arg(&output).assert().success();

    assert!(output.exists());
    assert!(!dir.path().join("assets.pdf").exists());
}

#[test]
fn render_without_table_fails_with_parse_error() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let input = dir.path().join("notes.html");
    std::fs::write(&input, "<p>no table</p>").expect("write input");

    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tablepdf"));
    cmd.arg("render")
        .arg(&input)
        .assert()
        .failure()
        .stderr(contains("ParseError"));
    assert!(!dir.path().join("notes.pdf").exists());
}
