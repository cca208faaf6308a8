//! Mounting the share from inside the process.
//!
//! Runs the system `mount.cifs` helper with the configured credentials. The
//! password is handed over in the helper's environment so it never shows up
//! in the process list.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use super::{RemoteError, ShareConfig};

const MOUNT_HELPER: &str = "mount.cifs";
const MOUNT_TABLE: &str = "/proc/self/mounts";

/// Mount `config`'s share read-only at its mount point, unless something is
/// already mounted there.
pub async fn mount(config: &ShareConfig) -> Result<(), RemoteError> {
    let mount_point = &config.mount_point;
    if is_mounted(mount_point).await {
        tracing::info!(mount = %mount_point.display(), "Share already mounted, reusing it");
        return Ok(());
    }

    let options = mount_options(config)?;
    tokio::fs::create_dir_all(mount_point)
        .await
        .map_err(|e| RemoteError::Unavailable(format!("{}: {e}", mount_point.display())))?;

    let helper = which::which(MOUNT_HELPER)
        .map_err(|e| RemoteError::Unavailable(format!("{MOUNT_HELPER} not found: {e}")))?;

    let mut cmd = Command::new(helper);
    cmd.arg(mount_source(config))
        .arg(mount_point)
        .arg("-o")
        .arg(&options)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());
    if let Some(password) = &config.password {
        cmd.env("PASSWD", password);
    }

    tracing::info!(share = %config.unc(), mount = %mount_point.display(), "Mounting share");
    let output = cmd
        .output()
        .await
        .map_err(|e| RemoteError::Unavailable(format!("failed to run {MOUNT_HELPER}: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(classify_failure(stderr.trim()));
    }
    Ok(())
}

/// `//server/share`, the source form `mount.cifs` expects
fn mount_source(config: &ShareConfig) -> String {
    format!("//{}/{}", config.server, config.share)
}

fn mount_options(config: &ShareConfig) -> Result<String, RemoteError> {
    let mut options = vec!["ro".to_string()];
    match &config.username {
        Some(username) => {
            for (field, value) in [("username", username), ("domain", &config.domain)] {
                if value.contains(',') {
                    return Err(RemoteError::Permission(format!("{field} must not contain ','")));
                }
            }
            options.push(format!("username={username}"));
            options.push(format!("domain={}", config.domain));
        }
        None => options.push("guest".to_string()),
    }
    Ok(options.join(","))
}

fn classify_failure(stderr: &str) -> RemoteError {
    let detail = format!("{MOUNT_HELPER}: {stderr}");
    if stderr.contains("error(13)") || stderr.contains("error(1)") {
        RemoteError::Permission(detail)
    } else if stderr.contains("error(2)") {
        RemoteError::NotFound(detail)
    } else {
        RemoteError::Unavailable(detail)
    }
}

async fn is_mounted(mount_point: &Path) -> bool {
    match tokio::fs::read_to_string(MOUNT_TABLE).await {
        Ok(table) => table_contains(&table, mount_point),
        Err(e) => {
            tracing::debug!(error = %e, "Mount table unreadable, assuming share is not mounted");
            false
        }
    }
}

fn table_contains(table: &str, mount_point: &Path) -> bool {
    table
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .any(|target| Path::new(&unescape_mount_field(target)) == mount_point)
}

/// Undo the octal escapes (`\040` for a space) used in the mount table
fn unescape_mount_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut rest = field;
    while let Some(pos) = rest.find('\\') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 4).and_then(|digits| u8::from_str_radix(digits, 8).ok());
        match code {
            Some(byte) => {
                out.push(char::from(byte));
                rest = &rest[pos + 4..];
            }
            None => {
                out.push('\\');
                rest = &rest[pos + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}
