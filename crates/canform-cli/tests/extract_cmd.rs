use assert_cmd::Command;
use lopdf::{Document, Object, Stream, dictionary};
use predicates::prelude::*;

fn cmd() -> Command {
    Command::cargo_bin("canform").unwrap()
}

const FAMILY_DATASETS: &[u8] = br#"<xfa:datasets xmlns:xfa="http://www.xfa.org/schema/xfa-data/1.0/">
<xfa:data>
<form1>
  <p1>
    <SecA>
      <App><AppName>NIKAN DOOSTI</AppName><AppDOB>1995-03-21</AppDOB><AppCOB>IRAN</AppCOB><AppOcc>Engineer</AppOcc><AppMS>Married</AppMS></App>
      <Sps><SpsName>SARA AHMADI</SpsName><SpsDOB>1996-08-02</SpsDOB><SpsCOB>IRAN</SpsCOB><SpsOcc>Teacher</SpsOcc><SpsAccomp>Y</SpsAccomp></Sps>
    </SecA>
    <SecB>
      <Chd><ChdRel>Daughter</ChdRel><ChdName>A DOOSTI</ChdName><ChdDOB>2018-07-15</ChdDOB><ChdCOB>IRAN</ChdCOB><ChdOcc></ChdOcc><ChdAccomp>Y</ChdAccomp></Chd>
      <Chd><ChdRel></ChdRel><ChdName></ChdName><ChdDOB></ChdDOB><ChdCOB></ChdCOB><ChdOcc></ChdOcc><ChdAccomp></ChdAccomp></Chd>
    </SecB>
    <SecC>
      <SecCdate>2023-11-02</SecCdate>
    </SecC>
  </p1>
</form1>
</xfa:data>
</xfa:datasets>"#;

fn write_xfa_pdf(dir: &std::path::Path) -> std::path::PathBuf {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let stream_id = doc.add_object(Object::Stream(Stream::new(
        dictionary! {},
        FAMILY_DATASETS.to_vec(),
    )));
    let acroform_id = doc.add_object(dictionary! {
        "Fields" => Vec::<Object>::new(),
        "XFA" => vec![
            Object::string_literal("datasets"),
            Object::Reference(stream_id),
        ],
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "AcroForm" => Object::Reference(acroform_id),
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join("imm5645e.pdf");
    doc.save(&path).unwrap();
    path
}

#[test]
fn extract_prints_record_json() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_xfa_pdf(dir.path());

    let output = cmd().args(["extract"]).arg(&pdf).output().unwrap();
    assert!(output.status.success());

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["form"], "imm5645e");
    assert_eq!(record["revision"], "09-2022");
    assert_eq!(record["fields"]["applicant_name"], "NIKAN DOOSTI");
    assert_eq!(record["fields"]["spouse_accompanying"], true);
    assert_eq!(record["errors"].as_array().unwrap().len(), 0);

    let children = record["groups"]["children"].as_array().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0]["fields"]["child_dob"], "2018-07-15");
    // Blank serialized row comes through as explicit nulls.
    assert_eq!(children[1]["fields"]["child_name"], serde_json::Value::Null);
}

#[test]
fn extract_pretty_format_is_multiline() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_xfa_pdf(dir.path());

    cmd()
        .args(["extract", "--format", "pretty"])
        .arg(&pdf)
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"form\": \"imm5645e\""));
}

#[test]
fn strict_mode_fails_on_field_errors() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_xfa_pdf(dir.path());

    // Forcing the visa-application tables leaves everything unresolved.
    cmd()
        .args(["extract", "--form", "imm5257e", "--strict"])
        .arg(&pdf)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("field error"));

    // Same document without --strict still succeeds.
    cmd()
        .args(["extract", "--form", "imm5257e"])
        .arg(&pdf)
        .assert()
        .success();
}

#[test]
fn extract_garbage_file_reports_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("junk.pdf");
    std::fs::write(&path, b"not a pdf").unwrap();

    cmd()
        .arg("extract")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error"));
}

#[test]
fn fields_dumps_raw_paths() {
    let dir = tempfile::tempdir().unwrap();
    let pdf = write_xfa_pdf(dir.path());

    let output = cmd().args(["fields"]).arg(&pdf).output().unwrap();
    assert!(output.status.success());

    let map: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(map["form1.p1.SecA.App.AppName"], "NIKAN DOOSTI");
    assert_eq!(map["form1.p1.SecB.Chd.[0].ChdRel"], "Daughter");
}

#[test]
fn tables_dir_overrides_builtin() {
    let dir = tempfile::tempdir().unwrap();
    let table = r#"{
        "form": "imm5645e",
        "revision": "99-custom",
        "markers": ["SecA"],
        "strip_prefixes": ["form1"],
        "rules": [
            { "pattern": "p1.SecA.App.AppName", "canonical": "applicant_name", "kind": "text" }
        ]
    }"#;
    std::fs::write(dir.path().join("custom.json"), table).unwrap();

    cmd()
        .args(["tables", "--tables"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("imm5645e 99-custom (1 rules, 0 groups)"));
}
