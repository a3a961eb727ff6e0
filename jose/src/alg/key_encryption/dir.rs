use super::octet_secret;
use crate::prelude::*;

/// 'dir': the shared symmetric key is the CEK
#[derive(Debug, Copy, Clone, Default)]
pub struct Dir;

impl Algorithm for Dir {
    fn name(&self) -> &'static str {
        "dir"
    }

    fn allowed_key_types(&self) -> &'static [&'static str] {
        &["oct"]
    }
}

impl KeyEncryptionAlgorithm for Dir {
    fn mode(&self) -> KeyManagementMode {
        KeyManagementMode::Direct
    }

    fn direct_cek(&self, key: &Jwk) -> JoseResult<Vec<u8>> {
        octet_secret(key, None)
    }
}
