use anyhow::{anyhow, Result};
use std::fs;
use std::path::{Path, PathBuf};
use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;
use log::info;

const PASSWORD_FILE: &str = ".encrypted_password";
const KEY_FILE: &str = ".encryption_key";
const NONCE_LENGTH: usize = 12;

/// IMAP password kept AES-256-GCM encrypted next to its key.
pub struct CredentialStore {
    key_path: PathBuf,
    password_path: PathBuf,
}

impl CredentialStore {
    pub fn new(directory: &Path) -> Self {
        CredentialStore {
            key_path: directory.join(KEY_FILE),
            password_path: directory.join(PASSWORD_FILE),
        }
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        let key_bytes = if self.key_path.exists() {
            fs::read(&self.key_path)?
        } else {
            let mut key_bytes = vec![0u8; 32];
            rand::thread_rng().fill_bytes(&mut key_bytes);
            fs::write(&self.key_path, &key_bytes)?;
            key_bytes
        };
        Aes256Gcm::new_from_slice(&key_bytes).map_err(|e| anyhow!("Failed to create cipher from key: {}", e))
    }

    pub fn encrypt_password(&self, password: &str) -> Result<String> {
        let cipher = self.cipher()?;
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, password.as_bytes())
            .map_err(|e| anyhow!("Failed to encrypt password: {}", e))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(&combined))
    }

    pub fn decrypt_password(&self, encrypted: &str) -> Result<String> {
        let cipher = self.cipher()?;
        let combined = BASE64
            .decode(encrypted.trim())
            .map_err(|e| anyhow!("Failed to decode base64: {}", e))?;
        if combined.len() <= NONCE_LENGTH {
            return Err(anyhow!("Stored password is truncated"));
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LENGTH);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| anyhow!("Failed to decrypt password: {}", e))?;

        String::from_utf8(plaintext).map_err(|e| anyhow!("Failed to convert decrypted bytes to string: {}", e))
    }

    /// Returns the stored password, prompting for it (and storing it) on first use.
    pub fn get_credentials(&self, login: &str) -> Result<(String, String)> {
        let password = if self.password_path.exists() {
            let encrypted = fs::read_to_string(&self.password_path)?;
            self.decrypt_password(&encrypted)?
        } else {
            let password = rpassword::prompt_password(format!("Enter the mailbox password for {}: ", login))?;
            fs::write(&self.password_path, self.encrypt_password(&password)?)?;
            info!("Password stored in {}", self.password_path.display());
            password
        };

        Ok((login.to_string(), password))
    }
}
