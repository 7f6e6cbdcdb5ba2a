// Account API: resolve the user behind a token and edit the SSH keys
// attached to that user.
//
// The key set is only ever replaced as a whole: read it, compute the new
// set, PATCH it back. A concurrent edit made between the read and the write
// is overwritten.

use crate::api::{Access, ApiClient};
use crate::error::{ApiError, Result};
use crate::transport::Transport;
use serde::{Deserialize, Serialize};
use ssh_key::PublicKey;
use std::fmt;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Identifier of the user owning a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One public key. `fingerprint` is computed by the server and is never
/// sent back; records built locally leave it empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SshKeyRecord {
    pub key: String,
    #[serde(default, skip_serializing)]
    pub fingerprint: String,
}

impl SshKeyRecord {
    pub fn new(key: impl Into<String>) -> Self {
        SshKeyRecord {
            key: key.into(),
            fingerprint: String::new(),
        }
    }
}

/// The keys of one user, in server order. Serializes to the PATCH body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySet {
    pub ssh_public_keys: Vec<SshKeyRecord>,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: KeySet,
}

/// Requested change to a key set. Removal runs before addition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyEdit {
    pub add: Option<String>,
    pub remove: Option<String>,
}

impl KeyEdit {
    /// Empty strings count as "not requested".
    pub fn new(add: Option<String>, remove: Option<String>) -> Self {
        KeyEdit {
            add: add.filter(|s| !s.is_empty()),
            remove: remove.filter(|s| !s.is_empty()),
        }
    }

    /// True when neither an addition nor a removal was asked for. Distinct
    /// from an edit that happens to leave the set unchanged, which is still
    /// written.
    pub fn is_noop(&self) -> bool {
        self.add.is_none() && self.remove.is_none()
    }
}

/// Removal matches on a substring of the fingerprint, not on the whole
/// fingerprint, so one pattern may remove several keys.
pub fn fingerprint_matches(fingerprint: &str, pattern: &str) -> bool {
    fingerprint.contains(pattern)
}

/// Look up the user owning `token`. The introspection endpoint takes the
/// token in the path and no auth header.
pub fn resolve_user<T: Transport>(client: &ApiClient<T>) -> Result<UserId> {
    let token = client.token()?;
    let url = client.account_url(&["tokens", token.as_str()])?;

    let response = client.get(url, Access::Anonymous).map_err(|e| match e {
        ApiError::Http { status, body, .. } => ApiError::Auth { status, body },
        other => other,
    })?;

    let value: serde_json::Value = response.json()?;
    let user_id = value
        .pointer("/token/user_id")
        .and_then(serde_json::Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::MalformedResponse("token.user_id missing from response".into()))?;

    debug!(user_id, "resolved token owner");
    Ok(UserId(user_id.to_string()))
}

pub fn fetch_keys<T: Transport>(client: &ApiClient<T>, user: &UserId) -> Result<KeySet> {
    let url = client.account_url(&["users", user.as_str()])?;
    let envelope: UserEnvelope = client.get(url, Access::Authenticated)?.json()?;
    debug!(count = envelope.user.ssh_public_keys.len(), "fetched ssh keys");
    Ok(envelope.user)
}

/// Pure half of `apply_edit`: keep every record whose fingerprint does not
/// match `edit.remove`, then append `edit.add`.
pub fn build_key_set(current: &KeySet, edit: &KeyEdit) -> KeySet {
    let mut keys: Vec<SshKeyRecord> = current
        .ssh_public_keys
        .iter()
        .filter(|record| match &edit.remove {
            Some(pattern) => !fingerprint_matches(&record.fingerprint, pattern),
            None => true,
        })
        .map(|record| SshKeyRecord::new(record.key.clone()))
        .collect();

    if let Some(key) = &edit.add {
        keys.push(SshKeyRecord::new(key.clone()));
    }
    KeySet {
        ssh_public_keys: keys,
    }
}

/// Write the edited key set back. Returns the set that was sent, or `None`
/// when the edit requested nothing and no write was made.
pub fn apply_edit<T: Transport>(
    client: &ApiClient<T>,
    user: &UserId,
    current: &KeySet,
    edit: &KeyEdit,
) -> Result<Option<KeySet>> {
    if edit.is_noop() {
        debug!("no key edit requested, skipping write");
        return Ok(None);
    }

    let updated = build_key_set(current, edit);
    let url = client.account_url(&["users", user.as_str()])?;
    client.patch_json(url, &updated)?;

    info!(
        before = current.ssh_public_keys.len(),
        after = updated.ssh_public_keys.len(),
        "ssh keys updated"
    );
    Ok(Some(updated))
}

/// Fingerprints in server order.
pub fn list_keys(keys: &KeySet) -> Vec<&str> {
    keys.ssh_public_keys
        .iter()
        .map(|record| record.fingerprint.as_str())
        .collect()
}

/// Read a public key file, trim it and check that it parses as an OpenSSH
/// public key (`<type> <base64 key> [comment]`).
pub fn read_public_key(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        ApiError::Config(format!("cannot read public key file {}: {e}", path.display()))
    })?;
    let key = raw.trim().to_string();
    PublicKey::from_openssh(&key).map_err(|e| {
        ApiError::Config(format!("{} is not an OpenSSH public key: {e}", path.display()))
    })?;
    Ok(key)
}

/// One key-editor invocation: resolve the user, apply the edit as a single
/// write, then print the fingerprints when `list` is set. The listing is
/// fetched again after a write so it shows the new set.
pub fn run_keys<T: Transport, W: Write>(
    client: &ApiClient<T>,
    edit: &KeyEdit,
    list: bool,
    out: &mut W,
) -> Result<()> {
    let user = resolve_user(client)?;
    if edit.is_noop() && !list {
        return Ok(());
    }

    let mut keys = fetch_keys(client, &user)?;
    if apply_edit(client, &user, &keys, edit)?.is_some() && list {
        keys = fetch_keys(client, &user)?;
    }

    if list {
        crate::ui::write_fingerprints(out, &keys)?;
    }
    Ok(())
}
