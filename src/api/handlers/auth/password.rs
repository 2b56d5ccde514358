//! Password hashing and verification.
//!
//! Stored records are a single `$`-delimited string:
//! `pbkdf2-sha256$<iterations>$<base64url salt>$<base64url key>`.
//! Every password is stretched over `password ‖ pepper`, where the pepper is
//! a deployment secret separate from the per-record salt, so a database dump
//! alone is not enough for an offline attack.

use anyhow::{Context, Result, anyhow};
use base64ct::{Base64UrlUnpadded, Encoding};
use rand::{RngCore, rngs::OsRng};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

const SCHEME_ID: &str = "pbkdf2-sha256";
const ITERATIONS: u32 = 310_000;
const SALT_LEN: usize = 16;
const KEY_LEN: usize = 32;

// Bounds applied when parsing stored records: the floor rejects corrupted or
// maliciously weakened iteration counts, the ceiling bounds CPU per verify.
const MIN_ITERATIONS: u32 = 10_000;
const MAX_ITERATIONS: u32 = 10_000_000;

/// Derive a fresh hash record for `password`.
///
/// This is the only way credentials enter storage; the account-management
/// layer calls it when creating or resetting an account.
///
/// # Errors
/// Returns an error if the pepper is unconfigured or the RNG fails; never
/// exposes the derived key outside the returned record.
pub fn hash_password(password: &str, pepper: &SecretString) -> Result<String> {
    if pepper.expose_secret().is_empty() {
        return Err(anyhow!("password pepper is not configured"));
    }

    let mut salt = [0u8; SALT_LEN];
    OsRng
        .try_fill_bytes(&mut salt)
        .context("failed to generate password salt")?;

    let key = derive_key(password, pepper, &salt, ITERATIONS);
    Ok(format!(
        "{SCHEME_ID}${ITERATIONS}${}${}",
        Base64UrlUnpadded::encode_string(&salt),
        Base64UrlUnpadded::encode_string(&key)
    ))
}

/// Verify `password` against a stored record.
///
/// Any malformed record (wrong scheme tag, missing fields, out-of-range
/// iteration count, wrong key length) is unverifiable: the result is `false`,
/// never an error.
pub(crate) fn verify_password(password: &str, pepper: &SecretString, stored: &str) -> bool {
    let Some(record) = parse_record(stored) else {
        return false;
    };
    let derived = derive_key(password, pepper, &record.salt, record.iterations);
    derived.ct_eq(&record.key).into()
}

struct HashRecord {
    iterations: u32,
    salt: Vec<u8>,
    key: Vec<u8>,
}

fn parse_record(stored: &str) -> Option<HashRecord> {
    let mut fields = stored.split('$');
    let scheme = fields.next()?;
    let iterations = fields.next()?;
    let salt = fields.next()?;
    let key = fields.next()?;
    if fields.next().is_some() || scheme != SCHEME_ID {
        return None;
    }

    let iterations: u32 = iterations.parse().ok()?;
    if !(MIN_ITERATIONS..=MAX_ITERATIONS).contains(&iterations) {
        return None;
    }

    let salt = Base64UrlUnpadded::decode_vec(salt).ok()?;
    let key = Base64UrlUnpadded::decode_vec(key).ok()?;
    if salt.len() < SALT_LEN || key.len() != KEY_LEN {
        return None;
    }

    Some(HashRecord {
        iterations,
        salt,
        key,
    })
}

fn derive_key(password: &str, pepper: &SecretString, salt: &[u8], iterations: u32) -> [u8; KEY_LEN] {
    let mut material = Vec::with_capacity(password.len() + pepper.expose_secret().len());
    material.extend_from_slice(password.as_bytes());
    material.extend_from_slice(pepper.expose_secret().as_bytes());

    let mut key = [0u8; KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(&material, salt, iterations, &mut key);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pepper() -> SecretString {
        SecretString::from("unit-test-pepper".to_string())
    }

    #[test]
    fn hash_then_verify_round_trips() -> Result<()> {
        let stored = hash_password("correct horse battery", &pepper())?;
        assert!(verify_password("correct horse battery", &pepper(), &stored));
        Ok(())
    }

    #[test]
    fn wrong_password_fails() -> Result<()> {
        let stored = hash_password("correct horse battery", &pepper())?;
        assert!(!verify_password("correct horse battery!", &pepper(), &stored));
        Ok(())
    }

    #[test]
    fn wrong_pepper_fails() -> Result<()> {
        let stored = hash_password("correct horse battery", &pepper())?;
        let other = SecretString::from("different-pepper".to_string());
        assert!(!verify_password("correct horse battery", &other, &stored));
        Ok(())
    }

    #[test]
    fn hashes_are_salted_per_call() -> Result<()> {
        let first = hash_password("same password here", &pepper())?;
        let second = hash_password("same password here", &pepper())?;
        assert_ne!(first, second);
        Ok(())
    }

    #[test]
    fn empty_pepper_is_rejected_on_hash() {
        let empty = SecretString::from(String::new());
        assert!(hash_password("whatever password", &empty).is_err());
    }

    #[test]
    fn stored_record_has_expected_shape() -> Result<()> {
        let stored = hash_password("correct horse battery", &pepper())?;
        let fields: Vec<&str> = stored.split('$').collect();
        assert_eq!(fields.len(), 4);
        assert_eq!(fields[0], "pbkdf2-sha256");
        assert_eq!(fields[1], "310000");
        assert_eq!(
            Base64UrlUnpadded::decode_vec(fields[2]).map(|salt| salt.len()),
            Ok(16)
        );
        assert_eq!(
            Base64UrlUnpadded::decode_vec(fields[3]).map(|key| key.len()),
            Ok(32)
        );
        Ok(())
    }

    #[test]
    fn malformed_records_are_unverifiable() -> Result<()> {
        let stored = hash_password("correct horse battery", &pepper())?;
        let fields: Vec<&str> = stored.split('$').collect();

        for record in [
            "",
            "not-a-record",
            "pbkdf2-sha256$310000$only-three",
            &format!("scrypt${}${}${}", fields[1], fields[2], fields[3]),
            &format!("pbkdf2-sha256$abc${}${}", fields[2], fields[3]),
            // Iteration counts outside the accepted range.
            &format!("pbkdf2-sha256$9999${}${}", fields[2], fields[3]),
            &format!("pbkdf2-sha256$10000001${}${}", fields[2], fields[3]),
            // Truncated salt and truncated key.
            &format!("pbkdf2-sha256${}$AAAA${}", fields[1], fields[3]),
            &format!("pbkdf2-sha256${}${}$AAAA", fields[1], fields[2]),
            // Trailing extra field.
            &format!("{stored}$extra"),
        ] {
            assert!(
                !verify_password("correct horse battery", &pepper(), record),
                "record should be unverifiable: {record}"
            );
        }
        Ok(())
    }
}
