use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{MaterializeError, Result};
use crate::runner::{CommandRunner, CommandSpec};

const KEY_FILE_NAME: &str = "git-private-key";
const SSH_CONFIG: &str = "StrictHostKeyChecking no\n";

/// Where the private key and the ssh client config are written.
#[derive(Debug, Clone)]
pub struct SshSetup {
    pub key_path: PathBuf,
    pub ssh_dir: PathBuf,
}

impl SshSetup {
    /// Key in the temp dir, config under `~/.ssh`.
    pub fn from_env() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| MaterializeError::Invalid("no home directory for ~/.ssh".into()))?;
        Ok(Self {
            key_path: std::env::temp_dir().join(KEY_FILE_NAME),
            ssh_dir: home.join(".ssh"),
        })
    }

    /// Write the key, start an agent, add the key and disable host key
    /// prompts. Returns the agent variables for later ssh/git invocations.
    pub fn install<R: CommandRunner + ?Sized>(
        &self,
        private_key: &str,
        runner: &R,
    ) -> Result<BTreeMap<String, String>> {
        let mut key = private_key.to_string();
        if !key.ends_with('\n') {
            key.push('\n');
        }
        write_private(&self.key_path, key.as_bytes())?;

        let agent_output = runner.run(&CommandSpec::new("ssh-agent"))?;
        let agent_env = parse_agent_env(&agent_output);
        if !agent_env.contains_key("SSH_AUTH_SOCK") {
            return Err(MaterializeError::Invalid(
                "ssh-agent did not report SSH_AUTH_SOCK".into(),
            ));
        }

        runner.run(
            &CommandSpec::new("ssh-add")
                .args([self.key_path.to_string_lossy()])
                .envs(&agent_env),
        )?;

        create_private_dir(&self.ssh_dir)?;
        write_private(&self.ssh_dir.join("config"), SSH_CONFIG.as_bytes())?;

        tracing::info!(key = %self.key_path.display(), "ssh key added to agent");
        Ok(agent_env)
    }
}

fn agent_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*([A-Za-z_][A-Za-z0-9_]*)=([^;\n]*);\s*export\b").unwrap()
    })
}

/// Extract `NAME=value; export NAME;` pairs from `ssh-agent` output.
pub fn parse_agent_env(output: &str) -> BTreeMap<String, String> {
    agent_line_re()
        .captures_iter(output)
        .map(|c| (c[1].to_string(), c[2].to_string()))
        .collect()
}

fn write_private(path: &Path, data: &[u8]) -> Result<()> {
    let mut opts = fs::OpenOptions::new();
    opts.create(true).write(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(0o600);
    }
    let mut file = opts
        .open(path)
        .map_err(|e| MaterializeError::io(path, e))?;
    file.write_all(data)
        .map_err(|e| MaterializeError::io(path, e))?;
    // `mode` only applies on create; tighten an existing file too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|e| MaterializeError::io(path, e))?;
    }
    Ok(())
}

fn create_private_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| MaterializeError::io(dir, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
            .map_err(|e| MaterializeError::io(dir, e))?;
    }
    Ok(())
}
