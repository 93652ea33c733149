//! Program options shaping the schema database.

use std::path::PathBuf;

/// Options applied to the database before parsing starts.
///
/// The CLI front end fills this from command-line arguments; library users
/// can construct it directly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Output directory for emitters. Relative paths resolve against the
    /// current working directory; `None` means the working directory itself.
    pub output_dir: Option<PathBuf>,
    /// Protocol namespace override. Defaults to the schema `package` with
    /// spaces replaced by underscores.
    pub namespace: Option<String>,
    /// Forced schema version. Must not exceed the schema-declared version.
    pub force_version: Option<u32>,
    /// Minimal supported remote version, clamped by the effective schema
    /// version.
    pub min_remote_version: u32,
    /// Tag/branch of the comms library forwarded to build metadata.
    pub cc_tag: String,
    /// Name of a user-defined open-framing-header composite.
    pub sofh_name: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: None,
            namespace: None,
            force_version: None,
            min_remote_version: 0,
            cc_tag: "master".to_string(),
            sofh_name: None,
        }
    }
}
