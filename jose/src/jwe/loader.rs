use crate::jwe::{Jwe, decrypter::JweDecrypter, serializer::JweSerializerManager};
use crate::prelude::*;

/// Parses a token in any known format, checks its critical parameters and decrypts it
#[derive(Clone)]
pub struct JweLoader {
    serializers: JweSerializerManager,
    decrypter: JweDecrypter,
}

impl JweLoader {
    /// No 'crit' extension is understood for encrypted tokens
    const UNDERSTOOD_CRITICAL_PARAMETERS: [&'static str; 0] = [];

    /// Loader with the given formats and decrypter
    pub fn new(serializers: JweSerializerManager, decrypter: JweDecrypter) -> Self {
        Self { serializers, decrypter }
    }

    /// Underlying decrypter
    pub fn decrypter(&self) -> &JweDecrypter {
        &self.decrypter
    }

    /// Underlying formats
    pub fn serializer_manager(&self) -> &JweSerializerManager {
        &self.serializers
    }

    /// Returns the decrypted token and the index of the first recipient `key` decrypts, `None`
    /// when no recipient could be decrypted
    pub fn load_and_decrypt_with_key(&self, token: &str, key: &Jwk) -> JoseResult<Option<(Jwe, usize)>> {
        let keys = JwkSet::new([key.clone()]);
        Ok(self
            .load_and_decrypt_with_key_set(token, &keys)?
            .map(|(jwe, index, _)| (jwe, index)))
    }

    /// Returns the decrypted token, the index of the decrypted recipient and the key used
    ///
    /// A recipient which cannot be processed (forbidden algorithm, unprotected 'crit'...) is
    /// skipped. The first such error is returned only when no recipient could be attempted.
    pub fn load_and_decrypt_with_key_set<'k>(
        &self,
        token: &str,
        keys: &'k JwkSet,
    ) -> JoseResult<Option<(Jwe, usize, &'k Jwk)>> {
        let (jwe, format) = self.serializers.unserialize(token)?;
        tracing::trace!(format, recipients = jwe.count_recipients(), "JWE parsed");
        header::check_critical_parameters(jwe.shared_protected_header(), &Self::UNDERSTOOD_CRITICAL_PARAMETERS)?;
        Self::check_unprotected_crit(jwe.shared_header())?;
        let mut skipped = None;
        let mut attempted = false;
        for index in 0..jwe.count_recipients() {
            if let Err(e) = Self::check_unprotected_crit(jwe.recipient(index)?.header()) {
                tracing::debug!(index, error = %e, "recipient skipped");
                attempted = true;
                continue;
            }
            match self.decrypter.decrypt_using_key_set(&jwe, keys, index) {
                Ok(Some((decrypted, key))) => return Ok(Some((decrypted, index, key))),
                Ok(None) => attempted = true,
                Err(e) => {
                    tracing::debug!(index, error = %e, "recipient skipped");
                    skipped.get_or_insert(e);
                }
            }
        }
        match skipped {
            Some(e) if !attempted => Err(e),
            _ => Ok(None),
        }
    }

    /// 'crit' is only honored when integrity protected
    fn check_unprotected_crit(header: &Header) -> JoseResult<()> {
        if header.contains_key("crit") {
            return Err(JoseError::CriticalHeaderViolation(
                "'crit' must be in the protected header".to_string(),
            ));
        }
        Ok(())
    }
}
