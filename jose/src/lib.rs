#![doc = include_str!("../../README.md")]
#![deny(missing_docs)]
#![allow(clippy::single_component_path_imports)]

#[cfg(test)]
use rstest_reuse;

#[cfg(test)]
#[macro_use]
#[allow(missing_docs)]
pub mod test_utils;
// both imports above have to be defined at the beginning of the crate for rstest to work

pub mod alg;
pub mod checker;
pub mod config;
mod error;
pub mod header;
pub mod jwe;
pub mod jwk;
pub mod jws;
pub mod nested;
mod util;

/// Prelude
pub mod prelude {
    pub use crate::alg::{
        Algorithm, CompressionMethod, ContentEncryptionAlgorithm, KeyEncryptionAlgorithm, KeyManagementMode,
        SignatureAlgorithm,
        hash::HashAlgorithm,
        manager::AlgorithmManager,
        registry::{AlgorithmRegistry, JoseAlgorithm},
    };
    pub use crate::checker::{self, KeyUsage};
    pub use crate::config::JoseConfig;
    pub use crate::error::{JoseError, JoseResult};
    pub use crate::header::{self, Header};
    pub use crate::jwe::{
        Jwe, Recipient,
        builder::JweBuilder,
        decrypter::JweDecrypter,
        loader::JweLoader,
        serializer::{
            JweCompactSerializer, JweJsonFlattenedSerializer, JweJsonGeneralSerializer, JweSerializer,
            JweSerializerManager,
        },
    };
    pub use crate::jwk::{Jwk, ecdsa::EcCurve, set::JwkSet};
    pub use crate::jws::{
        Jws, Signature,
        builder::JwsBuilder,
        loader::JwsLoader,
        serializer::{
            JwsCompactSerializer, JwsJsonFlattenedSerializer, JwsJsonGeneralSerializer, JwsSerializer,
            JwsSerializerManager,
        },
        verifier::JwsVerifier,
    };
    pub use crate::nested::{NestedRecipient, NestedSignature, NestedTokenBuilder, NestedTokenLoader};

    pub(crate) use crate::util::*;
}
