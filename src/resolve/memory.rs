//! In-memory implementations of every adapter.
//!
//! Handy for tests (yours and ours), and for wiring up a verifier before the
//! real chain/DNS/storage plumbing exists.

use crate::{
    crypto::base::SignKeypairPublic,
    error::{Error, Result},
    identity::{address::Address, document::MetadataDocument},
    resolve::{DnsResolver, KeyResolver, PeerFetcher, ResolverError, Storage},
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

fn poisoned<T>(_: T) -> ResolverError {
    ResolverError::Resolution(String::from("lock poisoned"))
}

/// An address -> public key registry.
#[derive(Debug, Default)]
pub struct MemoryKeys {
    keys: RwLock<HashMap<Address, SignKeypairPublic>>,
}

impl MemoryKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key under the address it derives.
    pub fn register(&self, key: &SignKeypairPublic) -> std::result::Result<(), ResolverError> {
        self.register_as(&key.address(), key)
    }

    /// Register a key under an arbitrary address.
    pub fn register_as(&self, address: &Address, key: &SignKeypairPublic) -> std::result::Result<(), ResolverError> {
        self.keys.write().map_err(poisoned)?.insert(*address, key.clone());
        Ok(())
    }
}

impl KeyResolver for MemoryKeys {
    fn public_key(&self, address: &Address) -> std::result::Result<SignKeypairPublic, ResolverError> {
        self.keys
            .read()
            .map_err(poisoned)?
            .get(address)
            .cloned()
            .ok_or_else(|| ResolverError::NotFound(address.to_string()))
    }
}

/// A locator -> bytes map.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read_bytes(&self, locator: &str) -> Result<Vec<u8>> {
        self.blobs
            .read()
            .map_err(|_| Error::Storage(String::from("lock poisoned")))?
            .get(locator)
            .cloned()
            .ok_or_else(|| Error::StorageNotFound(locator.to_string()))
    }

    fn write_bytes(&self, locator: &str, bytes: &[u8]) -> Result<()> {
        self.blobs
            .write()
            .map_err(|_| Error::Storage(String::from("lock poisoned")))?
            .insert(locator.to_string(), bytes.to_vec());
        Ok(())
    }
}

/// Canned DNS TXT answers, with optional scripted failures and latency.
#[derive(Debug, Default)]
pub struct MemoryDns {
    records: RwLock<HashMap<String, Vec<String>>>,
    failures: Mutex<HashMap<String, (ResolverError, usize)>>,
    delay: Option<Duration>,
    lookups: AtomicUsize,
}

impl MemoryDns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every lookup take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Publish a TXT string at `hostname` (in addition to any already there).
    pub fn add_txt(&self, hostname: &str, value: &str) -> std::result::Result<(), ResolverError> {
        self.records
            .write()
            .map_err(poisoned)?
            .entry(hostname.to_ascii_lowercase())
            .or_default()
            .push(value.to_string());
        Ok(())
    }

    /// Fail the next `times` lookups of `hostname` with `err`.
    pub fn fail_next(&self, hostname: &str, err: ResolverError, times: usize) -> std::result::Result<(), ResolverError> {
        self.failures.lock().map_err(poisoned)?.insert(hostname.to_ascii_lowercase(), (err, times));
        Ok(())
    }

    /// How many lookups have been made so far.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    fn answer(&self, hostname: &str) -> std::result::Result<Vec<String>, ResolverError> {
        let hostname = hostname.to_ascii_lowercase();
        {
            let mut failures = self.failures.lock().map_err(poisoned)?;
            if let Some((err, remaining)) = failures.get_mut(&hostname) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(err.clone());
                }
            }
        }
        self.records
            .read()
            .map_err(poisoned)?
            .get(&hostname)
            .cloned()
            .ok_or(ResolverError::NotFound(hostname))
    }
}

#[async_trait]
impl DnsResolver for MemoryDns {
    async fn lookup_txt(&self, hostname: &str) -> std::result::Result<Vec<String>, ResolverError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer(hostname)
    }
}

/// Published documents, keyed by the address they're served under.
///
/// Documents are stored serialized and re-loaded on every fetch, the same
/// way they would be coming off the network.
#[derive(Debug, Default)]
pub struct MemoryPeers {
    documents: RwLock<HashMap<Address, Vec<u8>>>,
    delay: Option<Duration>,
    fetches: AtomicUsize,
}

impl MemoryPeers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every fetch take `delay` before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Publish a document under its owner's address.
    pub fn publish(&self, document: &MetadataDocument) -> Result<()> {
        self.publish_as(document.owner(), document)
    }

    /// Publish a document under any address at all (a misbehaving server, for
    /// instance).
    pub fn publish_as(&self, address: &Address, document: &MetadataDocument) -> Result<()> {
        self.publish_bytes(address, document.serialize()?)
    }

    /// Publish raw bytes under an address, whether or not they hold a valid
    /// document.
    pub fn publish_bytes(&self, address: &Address, bytes: Vec<u8>) -> Result<()> {
        self.documents
            .write()
            .map_err(|_| Error::Storage(String::from("lock poisoned")))?
            .insert(*address, bytes);
        Ok(())
    }

    /// How many fetches have been made so far.
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    fn answer(&self, address: &Address) -> std::result::Result<MetadataDocument, ResolverError> {
        let bytes = self
            .documents
            .read()
            .map_err(poisoned)?
            .get(address)
            .cloned()
            .ok_or_else(|| ResolverError::NotFound(address.to_string()))?;
        MetadataDocument::load_from(&bytes).map_err(|e| ResolverError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl PeerFetcher for MemoryPeers {
    async fn fetch_document(&self, address: &Address) -> std::result::Result<MetadataDocument, ResolverError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.answer(address)
    }
}
