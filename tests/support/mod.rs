#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use taskbuddy::config::{AuthConfig, Config, CONFIG_FILENAME};
use tempfile::TempDir;

pub const DEMO_EMAIL: &str = "demo@taskbuddy.com";
pub const DEMO_PASSWORD: &str = "demo123";

/// A throwaway data directory with a cheap hashing config so CLI tests stay
/// fast in debug builds.
pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_demo(true)
    }

    pub fn with_demo(seed: bool) -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let mut config = Config::default();
        config.auth = cheap_auth();
        config.demo.seed = seed;
        config
            .save(&dir.path().join(CONFIG_FILENAME))
            .expect("write config");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.dir.path().join(format!("{key}.json"))
    }

    pub fn read_blob(&self, key: &str) -> Value {
        let contents = fs::read_to_string(self.blob_path(key)).expect("read blob");
        serde_json::from_str(&contents).expect("blob json")
    }

    /// `tb` pointed at this data directory
    pub fn tb(&self) -> Command {
        let mut cmd = tb_cmd();
        cmd.arg("--data-dir").arg(self.path());
        cmd.current_dir(self.path());
        cmd
    }

    /// Run with `--json` and return the parsed success envelope.
    pub fn json(&self, args: &[&str]) -> Value {
        let output = self
            .tb()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&output).expect("json envelope")
    }

    pub fn login_demo(&self) {
        self.tb()
            .args(["login", DEMO_EMAIL, "--password", DEMO_PASSWORD])
            .assert()
            .success();
    }

    pub fn register_and_login(&self, email: &str, name: &str, password: &str) {
        self.tb()
            .args(["register", email, "--name", name, "--password", password])
            .assert()
            .success();
        self.tb()
            .args(["login", email, "--password", password])
            .assert()
            .success();
    }

    pub fn new_task(&self, args: &[&str]) -> String {
        let mut full = vec!["task", "new"];
        full.extend_from_slice(args);
        let value = self.json(&full);
        value["data"]["id"].as_str().expect("task id").to_string()
    }
}

pub fn cheap_auth() -> AuthConfig {
    AuthConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    }
}

pub fn tb_cmd() -> Command {
    let mut cmd = Command::cargo_bin("tb").expect("binary");
    cmd.env_remove("TB_DATA_DIR");
    cmd.env_remove("TB_PASSWORD");
    cmd.env_remove("RUST_LOG");
    cmd
}
