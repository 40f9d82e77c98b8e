#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use p12_keystore::{KeyStore, KeyStoreEntry, PrivateKeyChain};
use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair, date_time_ymd};

pub const PASSWORD: &str = "PASSW";
pub const USER: &str = "builder";

/// Run certstore with both data roots inside `root`.
pub fn certstore(root: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("certstore");
    cmd.env("CERTSTORE_MACHINE_DATA_DIR", root.join("machine"))
        .env("CERTSTORE_USER_DATA_DIR", root.join("user"))
        .env("USERNAME", USER)
        .env_remove("CERTSTORE_CONFIG")
        .env_remove("CERTSTORE_PFX_PASSWORD");
    cmd
}

/// Provision the user stores (and the machine stores when `machine`).
pub fn init(root: &Path, machine: bool) {
    certstore(root).arg("init").assert().success();
    if machine {
        certstore(root).args(["init", "--machine"]).assert().success();
    }
}

pub fn subject(cn: &str) -> String {
    format!("CN={cn}, O=Acme Builds, C=US")
}

/// Write a password-protected PKCS#12 bundle for a fresh certificate.
pub fn write_pfx(dir: &Path, file_name: &str, cn: &str) -> PathBuf {
    let mut params = CertificateParams::default();
    let mut dn = DistinguishedName::new();
    dn.push(DnType::CountryName, "US");
    dn.push(DnType::OrganizationName, "Acme Builds");
    dn.push(DnType::CommonName, cn);
    params.distinguished_name = dn;
    params.not_before = date_time_ymd(2024, 1, 1);
    params.not_after = date_time_ymd(2034, 1, 1);

    let key = KeyPair::generate().unwrap();
    let cert = params.self_signed(&key).unwrap();

    let p12_cert = p12_keystore::Certificate::from_der(cert.der()).unwrap();
    let chain = PrivateKeyChain::new(key.serialize_der(), [0x01, 0x02, 0x03, 0x04], [p12_cert]);
    let mut keystore = KeyStore::new();
    keystore.add_entry(cn, KeyStoreEntry::PrivateKeyChain(chain));

    let path = dir.join(file_name);
    std::fs::write(&path, keystore.writer(PASSWORD).write().unwrap()).unwrap();
    path
}

/// Value of the first `Key: value` line for `key` in `stdout`.
pub fn field(stdout: &[u8], key: &str) -> Option<String> {
    let prefix = format!("{key}: ");
    String::from_utf8_lossy(stdout)
        .lines()
        .find_map(|line| line.strip_prefix(&prefix).map(str::to_string))
}

/// Add `pfx` to the user `MY` store and return its thumbprint.
pub fn add(root: &Path, pfx: &Path, extra: &[&str]) -> String {
    let output = certstore(root)
        .arg("add")
        .arg(pfx)
        .args(["--password", PASSWORD])
        .args(extra)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "add failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    field(&output.stdout, "Thumbprint").expect("add prints a thumbprint")
}
