//! AES in CTR, CBC, GCM and key-wrap modes.
//!
//! All four share key handling (128/192/256-bit secret keys, `raw` and `jwk` formats) and differ
//! in their cipher operations and permitted usages.

use super::{ensure_usages, export_secret, import_secret};
use crate::algorithm::Algorithm;
use crate::deferred::Deferred;
use crate::error::CryptoError;
use crate::format::{ExportedKey, KeyData, KeyFormat};
use crate::key::{CryptoKey, KeyAlgorithm};
use crate::operation::{Capabilities, Operation};
use crate::plugin::{CryptoAlgorithm, GeneratedKey, unsupported};
use crate::registry::AlgorithmRegistry;
use crate::usage::{KeyType, KeyUsages};
use wcrypt_primitives::{PrimitiveError, aes, random};

const DEFAULT_TAG_BITS: u32 = 128;

/// The cipher mode a plugin instance runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AesMode {
    Ctr,
    Cbc,
    Gcm,
    Kw,
}

/// An AES plugin for one [`AesMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aes {
    mode: AesMode,
}

impl Aes {
    pub const CTR: Self = Self { mode: AesMode::Ctr };
    pub const CBC: Self = Self { mode: AesMode::Cbc };
    pub const GCM: Self = Self { mode: AesMode::Gcm };
    pub const KW: Self = Self { mode: AesMode::Kw };

    #[must_use]
    pub const fn mode(&self) -> AesMode {
        self.mode
    }

    const fn allowed_usages(self) -> KeyUsages {
        match self.mode {
            AesMode::Kw => KeyUsages::WRAP_KEY.union(KeyUsages::UNWRAP_KEY),
            AesMode::Ctr | AesMode::Cbc | AesMode::Gcm => KeyUsages::ENCRYPT
                .union(KeyUsages::DECRYPT)
                .union(KeyUsages::WRAP_KEY)
                .union(KeyUsages::UNWRAP_KEY),
        }
    }

    const fn jwk_suffix(self) -> &'static str {
        match self.mode {
            AesMode::Ctr => "CTR",
            AesMode::Cbc => "CBC",
            AesMode::Gcm => "GCM",
            AesMode::Kw => "KW",
        }
    }

    fn jwk_alg(self, bits: usize) -> String {
        format!("A{bits}{}", self.jwk_suffix())
    }

    fn check_key_bits(self, bits: u32) -> Result<u32, CryptoError> {
        match bits {
            128 | 192 | 256 => Ok(bits),
            other => Err(CryptoError::Operation {
                message: format!("key length must be 128, 192 or 256 bits, got {other}").into(),
                context: Some(self.name().into()),
            }),
        }
    }

    /// Validates mode parameters and issues the cipher call.
    fn run(
        self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
        seal: bool,
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        let usages = if seal {
            KeyUsages::ENCRYPT | KeyUsages::WRAP_KEY
        } else {
            KeyUsages::DECRYPT | KeyUsages::UNWRAP_KEY
        };
        let cipher = Cipher::from_params(self.mode, params)?;
        key.material_for(usages)?;

        let key = key.clone();
        let data = data.to_vec();
        Ok(Deferred::spawn(self.name(), move || {
            let secret = key.material_for(usages)?;
            cipher.apply(secret, &data, seal).map_err(CryptoError::from)
        }))
    }
}

/// Validated per-call cipher parameters.
enum Cipher {
    Ctr { counter: Vec<u8>, length: u32 },
    Cbc { iv: Vec<u8> },
    Gcm { iv: Vec<u8>, aad: Vec<u8>, tag_len: usize },
    Kw,
}

impl Cipher {
    fn from_params(mode: AesMode, params: &Algorithm) -> Result<Self, CryptoError> {
        match mode {
            AesMode::Ctr => {
                let counter = params
                    .counter
                    .clone()
                    .ok_or_else(|| CryptoError::type_mismatch("AES-CTR requires `counter`"))?;
                if counter.len() != aes::BLOCK_LEN {
                    return Err(CryptoError::operation("AES-CTR counter must be 16 bytes"));
                }
                let length = params
                    .length
                    .ok_or_else(|| CryptoError::type_mismatch("AES-CTR requires `length`"))?;
                match length {
                    32 | 64 | 128 => Ok(Self::Ctr { counter, length }),
                    1..=128 => Err(CryptoError::not_supported(format!(
                        "AES-CTR counter length of {length} bits is not supported"
                    ))),
                    _ => Err(CryptoError::operation("AES-CTR length must be in 1..=128")),
                }
            },
            AesMode::Cbc => {
                let iv = params
                    .iv
                    .clone()
                    .ok_or_else(|| CryptoError::type_mismatch("AES-CBC requires `iv`"))?;
                if iv.len() != aes::BLOCK_LEN {
                    return Err(CryptoError::operation("AES-CBC iv must be 16 bytes"));
                }
                Ok(Self::Cbc { iv })
            },
            AesMode::Gcm => {
                let iv = params
                    .iv
                    .clone()
                    .ok_or_else(|| CryptoError::type_mismatch("AES-GCM requires `iv`"))?;
                if iv.len() != aes::GCM_IV_LEN {
                    return Err(CryptoError::not_supported(format!(
                        "AES-GCM iv of {} bytes is not supported, use 12",
                        iv.len()
                    )));
                }
                let tag_len = match params.tag_length.unwrap_or(DEFAULT_TAG_BITS) {
                    bits @ (96 | 104 | 112 | 120 | 128) => bits as usize / 8,
                    bits @ (32 | 64) => {
                        return Err(CryptoError::not_supported(format!(
                            "AES-GCM tag length of {bits} bits is not supported"
                        )));
                    },
                    bits => {
                        return Err(CryptoError::operation(format!(
                            "invalid AES-GCM tag length of {bits} bits"
                        )));
                    },
                };
                let aad = params.additional_data.clone().unwrap_or_default();
                Ok(Self::Gcm { iv, aad, tag_len })
            },
            AesMode::Kw => Ok(Self::Kw),
        }
    }

    fn apply(&self, key: &[u8], data: &[u8], seal: bool) -> Result<Vec<u8>, PrimitiveError> {
        match (self, seal) {
            (Self::Ctr { counter, length }, _) => aes::aes_ctr(key, counter, *length, data),
            (Self::Cbc { iv }, true) => aes::aes_cbc_encrypt(key, iv, data),
            (Self::Cbc { iv }, false) => aes::aes_cbc_decrypt(key, iv, data),
            (Self::Gcm { iv, aad, tag_len }, true) => {
                aes::aes_gcm_encrypt(key, iv, aad, *tag_len, data)
            },
            (Self::Gcm { iv, aad, tag_len }, false) => {
                aes::aes_gcm_decrypt(key, iv, aad, *tag_len, data)
            },
            (Self::Kw, true) => aes::aes_kw_wrap(key, data),
            (Self::Kw, false) => aes::aes_kw_unwrap(key, data),
        }
    }
}

impl CryptoAlgorithm for Aes {
    fn name(&self) -> &'static str {
        match self.mode {
            AesMode::Ctr => "AES-CTR",
            AesMode::Cbc => "AES-CBC",
            AesMode::Gcm => "AES-GCM",
            AesMode::Kw => "AES-KW",
        }
    }

    fn capabilities(&self) -> Capabilities {
        let cipher = match self.mode {
            AesMode::Kw => Capabilities::WRAP_KEY | Capabilities::UNWRAP_KEY,
            AesMode::Ctr | AesMode::Cbc | AesMode::Gcm => {
                Capabilities::ENCRYPT | Capabilities::DECRYPT
            },
        };
        cipher
            | Capabilities::GENERATE_KEY
            | Capabilities::IMPORT_KEY
            | Capabilities::EXPORT_KEY
            | Capabilities::GET_KEY_LENGTH
    }

    fn encrypt(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        if self.mode == AesMode::Kw {
            return Err(unsupported(self.name(), Operation::Encrypt));
        }
        self.run(params, key, data, true)
    }

    fn decrypt(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        if self.mode == AesMode::Kw {
            return Err(unsupported(self.name(), Operation::Decrypt));
        }
        self.run(params, key, data, false)
    }

    fn wrap_key(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        if self.mode != AesMode::Kw {
            return Err(unsupported(self.name(), Operation::WrapKey));
        }
        self.run(params, key, data, true)
    }

    fn unwrap_key(
        &self,
        params: &Algorithm,
        key: &CryptoKey,
        data: &[u8],
    ) -> Result<Deferred<Vec<u8>>, CryptoError> {
        if self.mode != AesMode::Kw {
            return Err(unsupported(self.name(), Operation::UnwrapKey));
        }
        self.run(params, key, data, false)
    }

    fn generate_key(
        &self,
        registry: &AlgorithmRegistry,
        params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> Result<GeneratedKey, CryptoError> {
        ensure_usages(usages, self.allowed_usages(), self.name())?;
        let bits = self.key_length(registry, params)?.unwrap_or_default();
        let material = random::random_bytes(bits as usize / 8)?;

        Ok(GeneratedKey::Secret(CryptoKey::new(
            KeyType::Secret,
            KeyAlgorithm::new(self.name()).with_length(bits),
            extractable,
            usages,
            material,
        )))
    }

    fn import_key(
        &self,
        _registry: &AlgorithmRegistry,
        format: KeyFormat,
        data: KeyData,
        _params: &Algorithm,
        extractable: bool,
        usages: KeyUsages,
    ) -> Result<CryptoKey, CryptoError> {
        ensure_usages(usages, self.allowed_usages(), self.name())?;

        // Unpadded base64url carries 6 bits per character.
        let data_bits = match &data {
            KeyData::Jwk(jwk) => jwk.k.as_deref().map_or(0, |k| k.len() * 3 / 4) * 8,
            KeyData::Bytes(bytes) => bytes.len() * 8,
        };
        let material =
            import_secret(format, data, &self.jwk_alg(data_bits), extractable, usages, self.name())?;

        let bits = match material.len() {
            16 => 128,
            24 => 192,
            32 => 256,
            other => {
                return Err(CryptoError::Data {
                    message: format!("AES key data must be 16, 24 or 32 bytes, got {other}").into(),
                    context: Some(self.name().into()),
                });
            },
        };

        Ok(CryptoKey::new(
            KeyType::Secret,
            KeyAlgorithm::new(self.name()).with_length(bits),
            extractable,
            usages,
            material,
        ))
    }

    fn export_key(&self, format: KeyFormat, key: &CryptoKey) -> Result<ExportedKey, CryptoError> {
        let bits = key.algorithm().length.unwrap_or_default() as usize;
        export_secret(format, key, &self.jwk_alg(bits), self.name())
    }

    fn key_length(
        &self,
        _registry: &AlgorithmRegistry,
        params: &Algorithm,
    ) -> Result<Option<u32>, CryptoError> {
        let bits = params
            .length
            .ok_or_else(|| CryptoError::type_mismatch(format!("{} requires `length`", self.name())))?;
        self.check_key_bits(bits).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> AlgorithmRegistry {
        AlgorithmRegistry::with_defaults().unwrap()
    }

    fn generate(plugin: Aes, bits: u32, usages: KeyUsages) -> CryptoKey {
        let params = Algorithm::builder().name(plugin.name()).length(bits).build();
        plugin.generate_key(&registry(), &params, true, usages).unwrap().into_secret().unwrap()
    }

    fn settle(deferred: Result<Deferred<Vec<u8>>, CryptoError>) -> Vec<u8> {
        deferred.unwrap().into_ready().unwrap().unwrap()
    }

    #[test]
    fn test_gcm_roundtrip_with_short_tag() {
        let key = generate(Aes::GCM, 256, KeyUsages::ENCRYPT | KeyUsages::DECRYPT);
        let params = Algorithm::builder()
            .name("AES-GCM")
            .iv(vec![3u8; 12])
            .additional_data(b"header".to_vec())
            .tag_length(96)
            .build();

        let sealed = settle(Aes::GCM.encrypt(&params, &key, b"attack at dawn"));
        assert_eq!(sealed.len(), 14 + 12);
        assert_eq!(settle(Aes::GCM.decrypt(&params, &key, &sealed)), b"attack at dawn");
    }

    #[test]
    fn test_gcm_parameter_errors() {
        let key = generate(Aes::GCM, 128, KeyUsages::ENCRYPT);
        let cases = [
            (Algorithm::builder().name("AES-GCM").iv(vec![0u8; 16]).build(), "NotSupportedError"),
            (Algorithm::builder().name("AES-GCM").iv(vec![0u8; 12]).tag_length(64).build(), "NotSupportedError"),
            (Algorithm::builder().name("AES-GCM").iv(vec![0u8; 12]).tag_length(100).build(), "OperationError"),
            (Algorithm::builder().name("AES-GCM").build(), "TypeError"),
        ];
        for (params, exception) in cases {
            let err = Aes::GCM.encrypt(&params, &key, b"data").unwrap_err();
            assert_eq!(err.exception(), exception, "{params:?}");
        }
    }

    #[test]
    fn test_ctr_length_rules() {
        let key = generate(Aes::CTR, 128, KeyUsages::ENCRYPT);
        let params = |length| {
            Algorithm::builder().name("AES-CTR").counter(vec![0u8; 16]).length(length).build()
        };

        assert!(Aes::CTR.encrypt(&params(64), &key, b"data").is_ok());
        assert_eq!(Aes::CTR.encrypt(&params(48), &key, b"data").unwrap_err().exception(), "NotSupportedError");
        assert_eq!(Aes::CTR.encrypt(&params(0), &key, b"data").unwrap_err().exception(), "OperationError");
        assert_eq!(Aes::CTR.encrypt(&params(129), &key, b"data").unwrap_err().exception(), "OperationError");
    }

    #[test]
    fn test_cbc_requires_encrypt_usage() {
        let key = generate(Aes::CBC, 192, KeyUsages::DECRYPT);
        let params = Algorithm::builder().name("AES-CBC").iv(vec![0u8; 16]).build();
        let err = Aes::CBC.encrypt(&params, &key, b"data").unwrap_err();
        assert!(matches!(err, CryptoError::InvalidAccess { .. }));
    }

    #[test]
    fn test_kw_wraps_and_refuses_encrypt() {
        let kek = generate(Aes::KW, 128, KeyUsages::WRAP_KEY | KeyUsages::UNWRAP_KEY);
        let params = Algorithm::named("AES-KW");
        let payload = [0x5au8; 32];

        let wrapped = settle(Aes::KW.wrap_key(&params, &kek, &payload));
        assert_eq!(wrapped.len(), 40);
        assert_eq!(settle(Aes::KW.unwrap_key(&params, &kek, &wrapped)), payload);

        let err = Aes::KW.encrypt(&params, &kek, &payload).unwrap_err();
        assert!(matches!(err, CryptoError::NotSupported { .. }));
    }

    #[test]
    fn test_key_lengths() {
        let params = Algorithm::builder().name("AES-CBC").length(512).build();
        let err = Aes::CBC.generate_key(&registry(), &params, true, KeyUsages::ENCRYPT).unwrap_err();
        assert!(matches!(err, CryptoError::Operation { .. }));

        let err = Aes::CBC
            .import_key(
                &registry(),
                KeyFormat::Raw,
                vec![0u8; 20].into(),
                &Algorithm::named("AES-CBC"),
                true,
                KeyUsages::ENCRYPT,
            )
            .unwrap_err();
        assert!(matches!(err, CryptoError::Data { .. }));
    }

    #[test]
    fn test_jwk_export_and_import() {
        let key = generate(Aes::CTR, 192, KeyUsages::ENCRYPT | KeyUsages::DECRYPT);
        let exported = Aes::CTR.export_key(KeyFormat::Jwk, &key).unwrap();
        assert_eq!(exported.as_jwk().and_then(|jwk| jwk.alg.as_deref()), Some("A192CTR"));

        let restored = Aes::CTR
            .import_key(
                &registry(),
                KeyFormat::Jwk,
                exported.into(),
                &Algorithm::named("AES-CTR"),
                false,
                KeyUsages::DECRYPT,
            )
            .unwrap();
        assert_eq!(restored.algorithm().length, Some(192));
    }
}
