//! The algorithm registry and resolver.
//!
//! The registry is assembled once from a set of plugins and is read-only afterwards. Each plugin
//! is indexed under every operation it declares, keyed by its lowercased name:
//!
//! ```text
//! deriveBits  -> { "pbkdf2" -> PBKDF2, "hkdf" -> HKDF, "ecdh" -> ECDH }
//! digest      -> { "sha-1" -> SHA-1, "sha-256" -> SHA-256, ... }
//! ```
//!
//! Resolution is an exact, ASCII case-insensitive lookup in the bucket of the requested
//! operation.

use crate::algorithm::AlgorithmIdentifier;
use crate::algorithms;
use crate::config::RegistryConfig;
use crate::error::CryptoError;
use crate::operation::Operation;
use crate::plugin::{CryptoAlgorithm, Plugin};
use fxhash::{FxHashMap, FxHashSet};
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tracing::{debug, warn};
use wcrypt_primitives::HashFunction;

#[derive(Debug, Default)]
struct RegistryInner {
    buckets: FxHashMap<Operation, FxHashMap<String, Plugin>>,
    plugins: Vec<Plugin>,
}

/// An immutable operation -> name -> plugin index.
///
/// Cloning is cheap: clones share the same index.
///
/// # Example
/// ```rust
/// use wcrypt_subtle::prelude::*;
///
/// # fn main() -> Result<(), CryptoError> {
/// let registry = AlgorithmRegistry::with_defaults()?;
///
/// let upper = registry.resolve(&"PBKDF2".into(), Operation::DeriveBits)?;
/// let lower = registry.resolve(&"pbkdf2".into(), Operation::DeriveBits)?;
/// assert!(std::sync::Arc::ptr_eq(upper, lower));
///
/// let missing = registry.resolve(&"RSA-OAEP".into(), Operation::WrapKey);
/// assert!(matches!(missing, Err(CryptoError::NotSupported { .. })));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct AlgorithmRegistry {
    inner: Arc<RegistryInner>,
}

impl AlgorithmRegistry {
    /// Returns an empty [`RegistryBuilder`].
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Builds the registry from every built-in plugin.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidConfiguration`] if the built-in set is inconsistent.
    pub fn with_defaults() -> Result<Self, CryptoError> {
        Self::builder().register_all(algorithms::all()).build()
    }

    /// Builds the registry from the built-in plugins minus those disabled by `config`.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidConfiguration`] if the remaining set is inconsistent.
    pub fn from_config(config: &RegistryConfig) -> Result<Self, CryptoError> {
        config
            .disabled
            .iter()
            .fold(Self::builder().register_all(algorithms::all()), |builder, name| {
                builder.disable(name)
            })
            .build()
    }

    /// Resolves `algorithm` for `operation`.
    ///
    /// A descriptor resolves through its `name` member.
    ///
    /// # Errors
    /// * [`CryptoError::TypeMismatch`] if the name is empty.
    /// * [`CryptoError::NotSupported`] if no plugin with that name implements `operation`.
    pub fn resolve(
        &self,
        algorithm: &AlgorithmIdentifier,
        operation: Operation,
    ) -> Result<&Plugin, CryptoError> {
        self.resolve_name(algorithm.name(), operation)
    }

    /// Resolves a bare algorithm name for `operation`.
    ///
    /// # Errors
    /// * [`CryptoError::TypeMismatch`] if `name` is empty.
    /// * [`CryptoError::NotSupported`] if no plugin with that name implements `operation`.
    pub fn resolve_name(&self, name: &str, operation: Operation) -> Result<&Plugin, CryptoError> {
        if name.is_empty() {
            return Err(CryptoError::type_mismatch("algorithm name must be a non-empty string"));
        }

        self.get(operation, name).ok_or_else(|| {
            debug!(algorithm = name, %operation, "Algorithm resolution failed");
            CryptoError::NotSupported {
                message: format!("algorithm `{name}` is not supported for {operation}").into(),
                context: None,
            }
        })
    }

    /// Looks up a plugin without error reporting.
    #[must_use]
    pub fn get(&self, operation: Operation, name: &str) -> Option<&Plugin> {
        self.inner.buckets.get(&operation)?.get(&name.to_ascii_lowercase())
    }

    /// Registered (lowercased) names for `operation`, sorted.
    #[must_use]
    pub fn names(&self, operation: Operation) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .inner
            .buckets
            .get(&operation)
            .map(|bucket| bucket.keys().map(String::as_str).collect())
            .unwrap_or_default();
        names.sort_unstable();
        names
    }

    /// Every registered plugin, in registration order.
    #[must_use]
    pub fn plugins(&self) -> &[Plugin] {
        &self.inner.plugins
    }

    /// Number of registered plugins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.plugins.len()
    }

    /// Resolves `hash` through the "get hash function" operation.
    ///
    /// # Errors
    /// Propagates resolution failures for `hash`.
    pub fn hash_function(&self, hash: &AlgorithmIdentifier) -> Result<HashFunction, CryptoError> {
        self.resolve(hash, Operation::GetHashFunction)?.hash_function()
    }

    /// Resolves `hash` through the "get hash block size" operation. The size is in bits.
    ///
    /// # Errors
    /// Propagates resolution failures for `hash`.
    pub fn hash_block_size(&self, hash: &AlgorithmIdentifier) -> Result<usize, CryptoError> {
        self.resolve(hash, Operation::GetHashBlockSize)?.hash_block_size()
    }
}

/// Collects plugins and validates them into an [`AlgorithmRegistry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    plugins: Vec<Plugin>,
    disabled: FxHashSet<String>,
}

impl RegistryBuilder {
    /// Adds a plugin.
    #[must_use]
    pub fn register(self, plugin: impl CryptoAlgorithm + 'static) -> Self {
        self.register_shared(Arc::new(plugin))
    }

    /// Adds an already shared plugin.
    #[must_use]
    pub fn register_shared(mut self, plugin: Plugin) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Adds several shared plugins.
    #[must_use]
    pub fn register_all(mut self, plugins: impl IntoIterator<Item = Plugin>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    /// Excludes the plugin named `name` (case-insensitive) from the build.
    #[must_use]
    pub fn disable(mut self, name: impl AsRef<str>) -> Self {
        self.disabled.insert(name.as_ref().to_ascii_lowercase());
        self
    }

    /// Validates the collected plugins and indexes them per operation.
    ///
    /// # Errors
    /// Returns [`CryptoError::InvalidConfiguration`] if a plugin has an empty name or declares no
    /// operation, or if two plugins share a name within one operation.
    pub fn build(self) -> Result<AlgorithmRegistry, CryptoError> {
        let mut inner = RegistryInner::default();
        let mut matched = FxHashSet::default();

        for plugin in self.plugins {
            let name = plugin.name();
            let key = name.to_ascii_lowercase();

            if self.disabled.contains(&key) {
                debug!(algorithm = name, "Algorithm disabled, skipping registration");
                matched.insert(key);
                continue;
            }
            if name.is_empty() {
                return Err(CryptoError::InvalidConfiguration {
                    message: "algorithm name must not be empty".into(),
                    context: None,
                });
            }

            let capabilities = plugin.capabilities();
            if capabilities.is_empty() {
                return Err(CryptoError::InvalidConfiguration {
                    message: format!("algorithm `{name}` declares no operations").into(),
                    context: None,
                });
            }

            for operation in capabilities.operations() {
                match inner.buckets.entry(operation).or_default().entry(key.clone()) {
                    Entry::Occupied(_) => {
                        return Err(CryptoError::InvalidConfiguration {
                            message: format!("algorithm `{name}` is registered twice").into(),
                            context: Some(operation.to_string().into()),
                        });
                    },
                    Entry::Vacant(slot) => {
                        slot.insert(Arc::clone(&plugin));
                    },
                }
            }

            inner.plugins.push(plugin);
        }

        for name in self.disabled.difference(&matched) {
            warn!(algorithm = %name, "Disabled algorithm matches no registered plugin");
        }

        debug!(
            plugins = inner.plugins.len(),
            operations = inner.buckets.len(),
            "Algorithm registry built"
        );

        Ok(AlgorithmRegistry { inner: Arc::new(inner) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Capabilities;

    #[derive(Debug)]
    struct Probe {
        name: &'static str,
        capabilities: Capabilities,
    }

    impl CryptoAlgorithm for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn capabilities(&self) -> Capabilities {
            self.capabilities
        }
    }

    const fn probe(name: &'static str, capabilities: Capabilities) -> Probe {
        Probe { name, capabilities }
    }

    #[test]
    fn test_plugins_are_indexed_only_under_declared_operations() {
        let registry = AlgorithmRegistry::builder()
            .register(probe("Probe-KDF", Capabilities::DERIVE_BITS | Capabilities::IMPORT_KEY))
            .build()
            .unwrap();

        assert!(registry.get(Operation::DeriveBits, "probe-kdf").is_some());
        assert!(registry.get(Operation::ImportKey, "PROBE-KDF").is_some());
        assert!(registry.get(Operation::Encrypt, "probe-kdf").is_none());
        assert_eq!(registry.names(Operation::DeriveBits), ["probe-kdf"]);
    }

    #[test]
    fn test_same_plugin_in_every_bucket() {
        let registry = AlgorithmRegistry::builder()
            .register(probe("Probe", Capabilities::SIGN | Capabilities::VERIFY))
            .build()
            .unwrap();

        let sign = registry.resolve_name("probe", Operation::Sign).unwrap();
        let verify = registry.resolve_name("Probe", Operation::Verify).unwrap();
        assert!(Arc::ptr_eq(sign, verify));
        assert!(Arc::ptr_eq(sign, &registry.plugins()[0]));
    }

    #[test]
    fn test_duplicate_names_fail_the_build() {
        let result = AlgorithmRegistry::builder()
            .register(probe("Dup", Capabilities::DIGEST))
            .register(probe("DUP", Capabilities::DIGEST))
            .build();
        assert!(matches!(result, Err(CryptoError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_same_name_in_disjoint_buckets_is_allowed() {
        let registry = AlgorithmRegistry::builder()
            .register(probe("Split", Capabilities::DIGEST))
            .register(probe("split", Capabilities::SIGN))
            .build()
            .unwrap();
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_rejects_empty_name_and_empty_capabilities() {
        let empty_name = AlgorithmRegistry::builder().register(probe("", Capabilities::DIGEST)).build();
        assert!(matches!(empty_name, Err(CryptoError::InvalidConfiguration { .. })));

        let no_ops = AlgorithmRegistry::builder().register(probe("Idle", Capabilities::empty())).build();
        assert!(matches!(no_ops, Err(CryptoError::InvalidConfiguration { .. })));
    }

    #[test]
    fn test_disabled_plugins_are_not_indexed() {
        let registry = AlgorithmRegistry::builder()
            .register(probe("Gone", Capabilities::DIGEST))
            .disable("GONE")
            .build()
            .unwrap();

        let err = registry.resolve_name("gone", Operation::Digest).unwrap_err();
        assert!(matches!(err, CryptoError::NotSupported { .. }));
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_resolve_rejects_empty_name() {
        let registry = AlgorithmRegistry::builder().build().unwrap();
        let err = registry.resolve(&"".into(), Operation::Digest).unwrap_err();
        assert!(matches!(err, CryptoError::TypeMismatch { .. }));
    }
}
