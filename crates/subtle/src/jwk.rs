//! JSON Web Keys for symmetric (`oct`) keys.

use crate::error::CryptoError;
use crate::usage::{KeyUsage, KeyUsages};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

const OCT: &str = "oct";

/// A JSON Web Key (RFC 7517). Only the members used for `oct` keys are modelled.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonWebKey {
    pub kty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub k: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_ops: Option<Vec<KeyUsage>>,
}

impl JsonWebKey {
    pub(crate) fn oct(material: &[u8], alg: &str, ext: bool, usages: KeyUsages) -> Self {
        Self {
            kty: OCT.to_owned(),
            k: Some(URL_SAFE_NO_PAD.encode(material)),
            alg: Some(alg.to_owned()),
            ext: Some(ext),
            key_ops: Some(usages.usages().collect()),
        }
    }

    /// Decodes the secret of an `oct` key after checking it against the import request.
    pub(crate) fn oct_material(
        &self,
        expected_alg: &str,
        extractable: bool,
        usages: KeyUsages,
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        if self.kty != OCT {
            return Err(CryptoError::data(format!("expected kty `{OCT}`, got `{}`", self.kty)));
        }
        if let Some(alg) = self.alg.as_deref()
            && alg != expected_alg
        {
            return Err(CryptoError::data(format!("JWK alg `{alg}` does not match `{expected_alg}`")));
        }
        if extractable && self.ext == Some(false) {
            return Err(CryptoError::data("JWK is not extractable"));
        }
        if let Some(ops) = &self.key_ops {
            let granted: KeyUsages = ops.iter().copied().collect();
            if !granted.contains(usages) {
                return Err(CryptoError::data(format!(
                    "requested usages {usages} exceed JWK key_ops {granted}"
                )));
            }
        }

        let encoded = self.k.as_deref().ok_or_else(|| CryptoError::data("JWK is missing `k`"))?;
        URL_SAFE_NO_PAD
            .decode(encoded)
            .map(Zeroizing::new)
            .map_err(|e| CryptoError::data(format!("JWK `k` is not base64url: {e}")))
    }
}

impl fmt::Debug for JsonWebKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonWebKey")
            .field("kty", &self.kty)
            .field("k", &self.k.as_ref().map(|_| "<redacted>"))
            .field("alg", &self.alg)
            .field("ext", &self.ext)
            .field("key_ops", &self.key_ops)
            .finish()
    }
}
