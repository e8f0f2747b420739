use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const ISOLATED_VARS: [&str; 9] = [
    "AWS_S3_BUCKET_NAME",
    "AWS_REGION",
    "FLIPDB_CONFIG_PATH",
    "FLIPDB_POLL_INTERVAL_SECS",
    "FLIPDB_PROVISION_TIMEOUT_SECS",
    "FLIPDB_DB_MASTER_USER_PASSWORD",
    "DNSIMPLE_AUTH_TOKEN",
    "DNSIMPLE_ACCOUNT_ID",
    "XDG_CONFIG_HOME",
];

/// Scratch working directory and home, so no real config leaks into a run
pub struct TestEnv {
    pub root: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        Self { root }
    }

    #[allow(dead_code)]
    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.root.path().join("settings.yaml");
        fs::write(&path, content).unwrap();
        path
    }

    #[allow(deprecated)]
    pub fn flipdb(&self) -> Command {
        let mut cmd = Command::cargo_bin("flipdb").unwrap();
        cmd.current_dir(self.root.path())
            .env("HOME", self.root.path());
        for name in ISOLATED_VARS {
            cmd.env_remove(name);
        }
        cmd
    }
}
