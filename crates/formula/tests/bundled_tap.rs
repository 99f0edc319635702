//! The tap shipped in `formulae/` must load and resolve cleanly

use std::path::PathBuf;
use vial_formula::Tap;

fn bundled_tap() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("formulae")
}

#[tokio::test]
async fn bundled_records_are_valid() {
    let (tap, findings) = Tap::audit(&bundled_tap()).await.unwrap();
    assert!(findings.is_empty(), "{findings:?}");
    assert_eq!(tap.records().len(), 2);
}

#[tokio::test]
async fn bundled_records_resolve() {
    let tap = Tap::load(&bundled_tap()).await.unwrap();

    let macro_cli = tap.resolve("macro-cli").unwrap();
    assert_eq!(macro_cli.version.to_string(), "1.0.1");
    assert_eq!(macro_cli.test.executable, "mrec");
    assert_eq!(macro_cli.resources[0].name, "click");

    let termo = tap.resolve("termo").unwrap();
    assert_eq!(termo.test.executable, "tm");
    assert_eq!(termo.runtime.name, "python");
}
