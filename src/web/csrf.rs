//! Stateless anti-forgery tokens.
//!
//! A token is `hex(HMAC-SHA256(secret, intent))` where the intent names the
//! action it authorizes: `task-form` for the new/edit forms, `delete-{id}`
//! for deleting a specific task. No session state — any form rendered by
//! this instance verifies against the same persisted secret.

use anyhow::Result;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::path::Path;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Intent covering the new/edit task forms.
pub const FORM_INTENT: &str = "task-form";

/// Intent covering deletion of one specific task.
pub fn delete_intent(id: i64) -> String {
    format!("delete-{id}")
}

#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
}

impl TokenSigner {
    /// Load the signing secret from `{data_dir}/csrf_secret`, generating and
    /// persisting a fresh one on first run.
    ///
    /// The secret is a random 32-character hex string stored with user-only
    /// permissions (mode 0600 on Unix). Tokens survive restarts, so a form
    /// rendered before a restart still submits cleanly after it.
    pub fn load_or_create(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join("csrf_secret");

        if path.exists() {
            let secret = std::fs::read_to_string(&path)?.trim().to_string();
            if !secret.is_empty() {
                return Ok(Self {
                    secret: secret.into_bytes(),
                });
            }
        }

        // Generate a new secret (UUID v4, hex without dashes = 32 chars)
        let secret = Uuid::new_v4().to_string().replace('-', "");

        std::fs::create_dir_all(data_dir)?;
        std::fs::write(&path, &secret)?;

        // Restrict to owner read/write only on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(Self {
            secret: secret.into_bytes(),
        })
    }

    #[cfg(test)]
    pub fn from_secret(secret: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
        }
    }

    /// Issue the token for an intent.
    pub fn issue(&self, intent: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC-SHA256 accepts any key length");
        mac.update(intent.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verify a submitted token against an intent. Constant-time comparison;
    /// malformed hex simply fails.
    pub fn verify(&self, intent: &str, token: &str) -> bool {
        let Ok(raw) = hex::decode(token) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .expect("HMAC-SHA256 accepts any key length");
        mac.update(intent.as_bytes());
        mac.verify_slice(&raw).is_ok()
    }
}
