//! End-to-end pipeline tests using a stub interpreter
//!
//! The stub answers `--version` and materializes a minimal venv with a `pip`
//! and a `tm` executable, so the whole fetch -> verify -> provision ->
//! install -> link -> smoke-test sequence runs without a real Python.

use httpmock::prelude::*;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use vial_config::Layout;
use vial_errors::{Error, InstallError};
use vial_formula::Formula;
use vial_hash::Checksum;
use vial_install::Installer;
use vial_net::NetClient;

const ARCHIVE: &[u8] = b"termo-1.1.1 sdist bytes";
const RESOURCE: &[u8] = b"click-8.1.7 sdist bytes";

/// Write a stub interpreter; `exit_code` is what the fake `tm` binary exits with
fn stub_interpreter(dir: &Path, exit_code: i32) -> String {
    let script = format!(
        r#"#!/bin/sh
if [ "$1" = "--version" ]; then
    echo "Python 3.12.5"
    exit 0
fi
if [ "$1" = "-m" ] && [ "$2" = "venv" ]; then
    mkdir -p "$3/bin"
    printf '#!/bin/sh\nexit 0\n' > "$3/bin/pip"
    chmod 755 "$3/bin/pip"
    printf '#!/bin/sh\nexit {exit_code}\n' > "$3/bin/tm"
    chmod 755 "$3/bin/tm"
    exit 0
fi
exit 1
"#
    );
    let path = dir.join("stub-python3.12");
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.display().to_string()
}

fn formula(server: &MockServer, interpreter: &str, source_sha: &Checksum) -> Formula {
    let resource_sha = Checksum::from_data(RESOURCE).to_hex();
    let toml = format!(
        r#"
name = "termo"
version = "1.1.1"
license = "MIT"

[source]
url = "{}"
sha256 = "{source_sha}"

[runtime]
name = "{interpreter}"
version = "==3.12"

[[resource]]
name = "click"
url = "{}"
sha256 = "{resource_sha}"

[test]
executable = "tm"
"#,
        server.url("/termo-1.1.1.tar.gz"),
        server.url("/click-8.1.7.tar.gz"),
    );
    Formula::from_toml("termo.toml", &toml).unwrap()
}

fn mock_archives(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/termo-1.1.1.tar.gz");
        then.status(200).body(ARCHIVE);
    });
    server.mock(|when, then| {
        when.method(GET).path("/click-8.1.7.tar.gz");
        then.status(200).body(RESOURCE);
    });
}

fn installer(root: &Path) -> Installer {
    Installer::new(
        Layout::new(root.to_path_buf()),
        NetClient::with_defaults().unwrap(),
    )
}

#[tokio::test]
async fn install_happy_path() {
    let server = MockServer::start();
    mock_archives(&server);
    let dir = tempfile::tempdir().unwrap();
    let interpreter = stub_interpreter(dir.path(), 0);
    let formula = formula(&server, &interpreter, &Checksum::from_data(ARCHIVE));

    let root = dir.path().join("root");
    let report = installer(&root).install(&formula).await.unwrap();

    assert_eq!(report.package_id.to_string(), "termo-1.1.1");
    assert_eq!(report.runtime_version.to_string(), "3.12.5");
    assert!(report.venv_path.is_dir());
    let link = root.join("bin").join("tm");
    assert_eq!(report.executable_path, link);
    assert!(std::fs::read_link(&link).is_ok());
}

#[tokio::test]
async fn install_is_reproducible_across_environments() {
    let server = MockServer::start();
    mock_archives(&server);
    let dir = tempfile::tempdir().unwrap();
    let interpreter = stub_interpreter(dir.path(), 0);
    let formula = formula(&server, &interpreter, &Checksum::from_data(ARCHIVE));

    for root_name in ["root-a", "root-b"] {
        let root = dir.path().join(root_name);
        let report = installer(&root).install(&formula).await.unwrap();
        assert!(report.executable_path.exists(), "{root_name}");
    }
}

#[tokio::test]
async fn unsatisfiable_runtime_aborts_before_any_fetch() {
    let server = MockServer::start();
    let source = server.mock(|when, then| {
        when.method(GET).path("/termo-1.1.1.tar.gz");
        then.status(200).body(ARCHIVE);
    });
    let resource = server.mock(|when, then| {
        when.method(GET).path("/click-8.1.7.tar.gz");
        then.status(200).body(RESOURCE);
    });

    let dir = tempfile::tempdir().unwrap();
    let formula = formula(
        &server,
        "/nonexistent/interpreter",
        &Checksum::from_data(ARCHIVE),
    );

    let root = dir.path().join("root");
    let err = installer(&root).install(&formula).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Install(InstallError::RuntimeUnavailable { .. })
    ));
    source.assert_hits(0);
    resource.assert_hits(0);
    assert!(!root.join("venvs").join("termo-1.1.1").exists());
}

#[tokio::test]
async fn corrupted_source_checksum_leaves_nothing_reachable() {
    let server = MockServer::start();
    mock_archives(&server);
    let dir = tempfile::tempdir().unwrap();
    let interpreter = stub_interpreter(dir.path(), 0);
    // Pin a digest that cannot match the served bytes
    let formula = formula(&server, &interpreter, &Checksum::from_data(b"wrong pin"));

    let root = dir.path().join("root");
    let err = installer(&root).install(&formula).await.unwrap_err();

    assert!(matches!(
        err,
        Error::Install(InstallError::IntegrityMismatch { .. })
    ));
    assert!(!root.join("venvs").join("termo-1.1.1").exists());
    assert!(!root.join("bin").join("tm").exists());
}

#[tokio::test]
async fn corrupted_resource_is_verified_independently() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/termo-1.1.1.tar.gz");
        then.status(200).body(ARCHIVE);
    });
    server.mock(|when, then| {
        when.method(GET).path("/click-8.1.7.tar.gz");
        then.status(200).body(b"not the pinned click sdist");
    });

    let dir = tempfile::tempdir().unwrap();
    let interpreter = stub_interpreter(dir.path(), 0);
    let formula = formula(&server, &interpreter, &Checksum::from_data(ARCHIVE));

    let root = dir.path().join("root");
    let err = installer(&root).install(&formula).await.unwrap_err();

    match err {
        Error::Install(InstallError::IntegrityMismatch { artifact, .. }) => {
            assert_eq!(artifact, "click");
        }
        other => panic!("expected integrity mismatch, got {other}"),
    }
    assert!(!root.join("venvs").join("termo-1.1.1").exists());
    assert!(!root.join("bin").join("tm").exists());
}

#[tokio::test]
async fn smoke_test_failure_does_not_roll_back() {
    let server = MockServer::start();
    mock_archives(&server);
    let dir = tempfile::tempdir().unwrap();
    // The installed executable exits 2 when invoked
    let interpreter = stub_interpreter(dir.path(), 2);
    let formula = formula(&server, &interpreter, &Checksum::from_data(ARCHIVE));

    let root = dir.path().join("root");
    let err = installer(&root).install(&formula).await.unwrap_err();

    match &err {
        Error::Install(inner @ InstallError::SmokeTestFailed { executable, .. }) => {
            assert_eq!(executable, "tm");
            assert!(inner.install_committed());
        }
        other => panic!("expected smoke test failure, got {other}"),
    }
    // Distinct failure class: the environment and link stay on disk
    assert!(root.join("venvs").join("termo-1.1.1").is_dir());
    assert!(root.join("bin").join("tm").exists());
}

#[tokio::test]
async fn uninstall_removes_link_and_environment() {
    let server = MockServer::start();
    mock_archives(&server);
    let dir = tempfile::tempdir().unwrap();
    let interpreter = stub_interpreter(dir.path(), 0);
    let formula = formula(&server, &interpreter, &Checksum::from_data(ARCHIVE));

    let root = dir.path().join("root");
    let installer = installer(&root);
    installer.install(&formula).await.unwrap();

    installer.uninstall(&formula).await.unwrap();
    assert!(!root.join("venvs").join("termo-1.1.1").exists());
    assert!(!root.join("bin").join("tm").exists());

    let err = installer.uninstall(&formula).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Install(InstallError::NotInstalled { .. })
    ));
}
