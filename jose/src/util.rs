use base64::Engine;
use rand::{RngCore as _, SeedableRng as _};

use crate::prelude::*;

pub fn base64_url_encode(i: impl AsRef<[u8]>) -> String {
    base64::prelude::BASE64_URL_SAFE_NO_PAD.encode(i)
}

pub fn base64_url_decode(i: impl AsRef<[u8]>) -> JoseResult<Vec<u8>> {
    Ok(base64::prelude::BASE64_URL_SAFE_NO_PAD.decode(i)?)
}

/// Fills a buffer of `len` bytes from a freshly seeded CSPRNG
pub fn random_bytes(len: usize) -> JoseResult<Vec<u8>> {
    let mut bytes = vec![0u8; len];
    rand_chacha::ChaCha20Rng::from_entropy().try_fill_bytes(&mut bytes)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_not_pad() {
        assert_eq!(base64_url_encode([0xfb, 0xff]), "-_8");
        assert_eq!(base64_url_decode("-_8").unwrap(), vec![0xfb, 0xff]);
    }

    #[test]
    fn should_reject_padded_input() {
        assert!(base64_url_decode("-_8=").is_err());
    }

    #[test]
    fn random_bytes_should_differ() {
        assert_ne!(random_bytes(16).unwrap(), random_bytes(16).unwrap());
    }
}
