/// Wrapper over a [Result] with a [JoseError] error
pub type JoseResult<T> = Result<T, JoseError>;

/// All errors which the JOSE builders, verifiers, decrypters and serializers might throw
#[derive(Debug, thiserror::Error)]
pub enum JoseError {
    /// Builder was asked to build without a payload
    #[error("The payload is not set")]
    PayloadNotSet,
    /// JWS builder was asked to build without any signature
    #[error("At least one signature must be set")]
    NoSignatures,
    /// JWE builder or decrypter was given no recipient
    #[error("At least one recipient must be set")]
    NoRecipients,
    /// Malformed or missing builder/verifier input
    #[error("Invalid configuration because {0}")]
    ConfigurationError(&'static str),
    /// Payload is not valid UTF-8
    #[error("The payload must be encoded in UTF-8")]
    InvalidEncoding,
    /// Protected and unprotected headers share parameters
    #[error("The header contains duplicated entries: {}", .0.join(", "))]
    HeaderConflict(Vec<String>),
    /// 'crit' header parameter rules are violated
    #[error("Critical header violation because {0}")]
    CriticalHeaderViolation(String),
    /// Signatures disagree on whether the payload is base64url encoded
    #[error("Foreign payload encoding detected")]
    InconsistentPayloadEncoding,
    /// No 'alg' header parameter
    #[error("No 'alg' parameter set in the header")]
    MissingAlgorithm,
    /// A mandatory header parameter is absent or has the wrong type
    #[error("The header parameter '{0}' is missing or invalid")]
    MissingHeaderParameter(&'static str),
    /// Algorithm is not known to the registry or not in the builder's manager
    #[error("The algorithm '{0}' is not supported")]
    UnsupportedAlgorithm(String),
    /// Algorithm is known but not in the caller's allow-list
    #[error("The algorithm '{0}' is not allowed in this context")]
    AlgorithmNotAllowed(String),
    /// A registered algorithm has another capability than the one requested
    #[error("The algorithm '{0}' cannot be used for this operation")]
    AlgorithmCapabilityMismatch(String),
    /// Key declares a 'use'/'key_ops' incompatible with the operation
    #[error("Key cannot be used for {0}")]
    KeyUsageMismatch(String),
    /// Key declares an 'alg' incompatible with the operation
    #[error("Key is restricted to algorithm '{key_alg}' but '{alg}' was requested")]
    KeyAlgorithmMismatch {
        /// the key's 'alg' parameter
        key_alg: String,
        /// the algorithm of the operation
        alg: String,
    },
    /// Key 'kty' is not supported by the algorithm
    #[error("Key type '{0}' is not supported by this algorithm")]
    KeyTypeMismatch(String),
    /// Key lacks a parameter required by the algorithm
    #[error("Key lacks the '{0}' parameter")]
    MissingKeyParameter(&'static str),
    /// Key material is unusable
    #[error("Invalid key because {0}")]
    InvalidKey(&'static str),
    /// Invalid JWK or JWK Set
    #[error("Invalid JWK because {0}")]
    InvalidJwk(&'static str),
    /// Input matches none of the registered serialization formats
    #[error("Unsupported input")]
    UnrecognizedFormat,
    /// Token cannot be represented or parsed in the requested format
    #[error("Invalid serialization because {0}")]
    InvalidSerialization(&'static str),
    /// Unknown serializer name
    #[error("Unsupported serializer '{0}'")]
    UnsupportedSerializer(String),
    /// Invalid argument supplied by the caller
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Nested token does not declare a 'JWT' content type
    #[error("The nested token content type is missing or is not 'JWT'")]
    InvalidNestedContentType,
    /// A cryptographic primitive refused its input
    #[error("Cryptographic operation failed because {0}")]
    CryptoError(&'static str),
    /// Json error
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
    /// Base64 decoding error
    #[error(transparent)]
    Base64DecodeError(#[from] base64::DecodeError),
    /// UTF-8 parsing error
    #[error(transparent)]
    Utf8Error(#[from] std::string::FromUtf8Error),
    /// Error generating random numbers
    #[error(transparent)]
    RandError(#[from] rand::Error),
    /// RSA error
    #[error(transparent)]
    RsaError(#[from] rsa::Error),
    /// Elliptic curve error
    #[error(transparent)]
    EllipticCurveError(#[from] p256::elliptic_curve::Error),
    /// Elliptic curve point encoding error
    #[error("Elliptic curve error because {0}")]
    Sec1Error(sec1::Error),
    /// Signature primitive error
    #[error(transparent)]
    SignatureError(#[from] ed25519_dalek::SignatureError),
    /// Failed converting a Vec<T> into a [T ; N]
    #[error(transparent)]
    ArrayConversionError(#[from] core::array::TryFromSliceError),
    /// Inflated payload is larger than allowed
    #[error("The uncompressed payload exceeds {0} bytes")]
    PayloadTooLarge(usize),
    /// Compression I/O error
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    /// We have done something terribly wrong
    #[error("We have done something terribly wrong and it needs to be fixed")]
    ImplementationError,
}

impl From<sec1::Error> for JoseError {
    fn from(e: sec1::Error) -> Self {
        Self::Sec1Error(e)
    }
}
