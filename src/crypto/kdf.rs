//! Key derivation using PBKDF2-HMAC-SHA-512
//!
//! A single derivation primitive serves two call sites: stretching a user
//! password into master key material, and turning fresh random bytes into
//! per-item key material.

use pbkdf2::pbkdf2_hmac;
use sha2::Sha512;
use tracing::debug;
use zeroize::Zeroizing;

use super::codec::{chars_to_bytes, is_byte_text};
use super::entropy::{random_array, EntropySource};
use super::keys::KeyMaterial;
use crate::error::{EnvelopeError, EnvelopeResult};

/// Output size of a stretched password
pub const STRETCHED_KEY_BITS: usize = 768;

/// Output size of random item key material
pub const RANDOM_KEY_BITS: usize = 512;

/// Iterations used when deriving random item key material
pub const RANDOM_KEY_COST: u32 = 100_000;

/// Recommended minimum cost for password stretching
pub const RECOMMENDED_COST: u32 = 100_000;

/// Size of the random password and salt fed into random derivation
const RANDOM_INPUT_SIZE: usize = 16;

/// Derive `output_bits` of key material with PBKDF2-HMAC-SHA-512
pub fn derive_key_material(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
    output_bits: usize,
) -> EnvelopeResult<KeyMaterial> {
    if iterations == 0 {
        return Err(EnvelopeError::Format(
            "Iteration cost must be a positive integer".to_string(),
        ));
    }
    if output_bits == 0 || output_bits % 8 != 0 {
        return Err(EnvelopeError::Format(format!(
            "Output length must be a positive multiple of 8 bits, got {}",
            output_bits
        )));
    }

    let mut out = Zeroizing::new(vec![0u8; output_bits / 8]);
    pbkdf2_hmac::<Sha512>(password, salt, iterations, &mut out);

    Ok(KeyMaterial::from_bytes(&out))
}

/// Stretch a password into 768 bits of key material
///
/// Deterministic: the same password, salt and cost always give the same
/// output. Password and salt must be byte text; wider characters are
/// rejected with `Format` rather than truncated.
pub fn stretch_password(password: &str, salt: &str, cost: u32) -> EnvelopeResult<KeyMaterial> {
    if !is_byte_text(password) || !is_byte_text(salt) {
        return Err(EnvelopeError::Format(
            "Password and salt must be single-byte text".to_string(),
        ));
    }

    if cost < RECOMMENDED_COST {
        debug!(cost, "stretching password below recommended cost");
    } else {
        debug!(cost, "stretching password");
    }

    let password = Zeroizing::new(chars_to_bytes(password));
    let salt = chars_to_bytes(salt);
    derive_key_material(&password, &salt, cost, STRETCHED_KEY_BITS)
}

/// Produce fresh 512-bit key material from a random password and salt
pub fn generate_random_bits(entropy: &dyn EntropySource) -> EnvelopeResult<KeyMaterial> {
    generate_random_bits_with_cost(entropy, RANDOM_KEY_COST)
}

pub(crate) fn generate_random_bits_with_cost(
    entropy: &dyn EntropySource,
    cost: u32,
) -> EnvelopeResult<KeyMaterial> {
    let password = Zeroizing::new(random_array::<RANDOM_INPUT_SIZE>(entropy)?);
    let salt: [u8; RANDOM_INPUT_SIZE] = random_array(entropy)?;
    derive_key_material(&password[..], &salt, cost, RANDOM_KEY_BITS)
}
