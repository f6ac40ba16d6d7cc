//------------ Config --------------------------------------------------------

//! Configuration options for the FIB backends.
//!
//! A FIB is created by picking one of the `*Config` structs in this module,
//! instantiating it (all of them implement `Default`), setting some fields
//! on it and calling [BackendConfig::build] on it. The binaries use the
//! serializable [FibConfig] enum instead, which wraps all of them.
//!
//! ```
//! use name_fib::fib::config::{BackendConfig, TbfConfig};
//!
//! let config = TbfConfig {
//!     trie_depth: 2,
//!     ..Default::default()
//! };
//! let fib = config.build().unwrap();
//! ```

use std::fmt;
use std::str::FromStr;

use serde_derive::{Deserialize, Serialize};

use crate::errors::FibError;
use crate::hasher::SipKeyedHasher;
use crate::types::name::HASHED_SEGMENT_LEN;

use super::{
    CaesarFib, CiscoFib, Fib, FibBackend, MergedBloomFib, PatriciaFib,
    PrefixBloomFilter, TbfFib,
};

/// The kinds of FIB backends.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Patricia,
    Cisco,
    Tbf,
    MergedBloom,
    Caesar,
}

impl BackendKind {
    pub const ALL: [BackendKind; 5] = [
        BackendKind::Patricia,
        BackendKind::Cisco,
        BackendKind::Tbf,
        BackendKind::MergedBloom,
        BackendKind::Caesar,
    ];

    /// Whether lookups on this backend are exact. The other backends may
    /// return ports for names (or prefixes) that were never inserted.
    ///
    /// The TBF backend is exact for names up to its trie depth, and for
    /// longer names that were inserted; it is listed as approximate.
    pub fn is_exact(&self) -> bool {
        matches!(self, BackendKind::Patricia | BackendKind::Cisco)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Patricia => write!(f, "patricia"),
            BackendKind::Cisco => write!(f, "cisco"),
            BackendKind::Tbf => write!(f, "tbf"),
            BackendKind::MergedBloom => write!(f, "merged_bloom"),
            BackendKind::Caesar => write!(f, "caesar"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = FibError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "patricia" | "naive" => Ok(BackendKind::Patricia),
            "cisco" => Ok(BackendKind::Cisco),
            "tbf" => Ok(BackendKind::Tbf),
            "merged_bloom" | "merged" => Ok(BackendKind::MergedBloom),
            "caesar" => Ok(BackendKind::Caesar),
            _ => Err(FibError::InvalidConfig("unknown backend")),
        }
    }
}

pub trait BackendConfig: Clone + Default + fmt::Debug {
    type Backend: Fib;

    /// Returns the kind of backend this configuration builds.
    fn kind(&self) -> BackendKind;
    /// Check the parameters without building anything.
    fn validate(&self) -> Result<(), FibError>;
    /// Build an empty FIB with this configuration.
    fn build(&self) -> Result<Self::Backend, FibError>;
}

// The SipHash keys for a backend: reproducible if a seed was configured,
// random otherwise.
pub(crate) fn sip_hasher(
    hash_count: usize,
    seed: Option<u64>,
) -> SipKeyedHasher {
    match seed {
        Some(seed) => SipKeyedHasher::with_seed(hash_count, seed),
        None => SipKeyedHasher::new(hash_count),
    }
}

fn check_bloom_params(
    filter_bits: usize,
    hash_count: usize,
) -> Result<(), FibError> {
    if filter_bits == 0 {
        return Err(FibError::InvalidConfig("filter_bits must be positive"));
    }
    if filter_bits > u32::MAX as usize {
        return Err(FibError::InvalidConfig("filter_bits is too large"));
    }
    if hash_count == 0 {
        return Err(FibError::InvalidConfig("hash_count must be positive"));
    }
    // hashed names are folded into hash_count blocks of at least a byte
    if hash_count > HASHED_SEGMENT_LEN {
        return Err(FibError::InvalidConfig("hash_count is too large"));
    }
    Ok(())
}

fn check_ports(ports: usize) -> Result<(), FibError> {
    if ports == 0 || ports > u32::MAX as usize {
        return Err(FibError::InvalidConfig("ports must be in 1..=u32::MAX"));
    }
    Ok(())
}

//------------ PatriciaConfig -------------------------------------------------

/// The naive exact backend has nothing to configure.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatriciaConfig {}

impl BackendConfig for PatriciaConfig {
    type Backend = PatriciaFib;

    fn kind(&self) -> BackendKind {
        BackendKind::Patricia
    }

    fn validate(&self) -> Result<(), FibError> {
        Ok(())
    }

    fn build(&self) -> Result<PatriciaFib, FibError> {
        Ok(PatriciaFib::new())
    }
}

//------------ CiscoConfig ----------------------------------------------------

/// Configuration of the multi-level hash map backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CiscoConfig {
    /// The depth `M` of the first lookup pass. Names longer than this leave
    /// a virtual entry at depth `M`.
    pub depth: usize,
}

impl Default for CiscoConfig {
    fn default() -> Self {
        Self { depth: 3 }
    }
}

impl BackendConfig for CiscoConfig {
    type Backend = CiscoFib;

    fn kind(&self) -> BackendKind {
        BackendKind::Cisco
    }

    fn validate(&self) -> Result<(), FibError> {
        if self.depth == 0 {
            return Err(FibError::InvalidConfig("depth must be positive"));
        }
        Ok(())
    }

    fn build(&self) -> Result<CiscoFib, FibError> {
        self.validate()?;
        Ok(CiscoFib::new(self.depth))
    }
}

//------------ TbfConfig ------------------------------------------------------

/// Configuration of the trie + bloom filter backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TbfConfig {
    /// The number of segments `T` kept in the exact trie.
    pub trie_depth: usize,
    /// Bits `m` per suffix bloom filter.
    pub filter_bits: usize,
    /// Probes `k` per bloom filter item.
    pub hash_count: usize,
    /// Seed for the SipHash keys. `None` draws random keys.
    pub seed: Option<u64>,
}

impl Default for TbfConfig {
    fn default() -> Self {
        Self {
            trie_depth: 3,
            filter_bits: 1024,
            hash_count: 3,
            seed: None,
        }
    }
}

impl BackendConfig for TbfConfig {
    type Backend = TbfFib;

    fn kind(&self) -> BackendKind {
        BackendKind::Tbf
    }

    fn validate(&self) -> Result<(), FibError> {
        if self.trie_depth == 0 {
            return Err(FibError::InvalidConfig("trie_depth must be positive"));
        }
        check_bloom_params(self.filter_bits, self.hash_count)
    }

    fn build(&self) -> Result<TbfFib, FibError> {
        self.validate()?;
        Ok(TbfFib::new(
            self.trie_depth,
            self.filter_bits,
            sip_hasher(self.hash_count, self.seed),
        ))
    }
}

//------------ MergedBloomConfig ----------------------------------------------

/// Configuration of the merged bloom filter (bit matrix) backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergedBloomConfig {
    /// The number of egress ports `N`, i.e. the number of rows.
    pub ports: usize,
    /// Bits `m` per row.
    pub filter_bits: usize,
    /// The number of SipHash keys `k`, i.e. columns set per name.
    pub hash_count: usize,
    pub seed: Option<u64>,
}

impl Default for MergedBloomConfig {
    fn default() -> Self {
        Self {
            ports: 128,
            filter_bits: 128,
            hash_count: 3,
            seed: None,
        }
    }
}

impl BackendConfig for MergedBloomConfig {
    type Backend = MergedBloomFib;

    fn kind(&self) -> BackendKind {
        BackendKind::MergedBloom
    }

    fn validate(&self) -> Result<(), FibError> {
        check_ports(self.ports)?;
        check_bloom_params(self.filter_bits, self.hash_count)
    }

    fn build(&self) -> Result<MergedBloomFib, FibError> {
        self.validate()?;
        Ok(MergedBloomFib::new(
            self.ports,
            self.filter_bits,
            sip_hasher(self.hash_count, self.seed),
        ))
    }
}

//------------ PrefixBloomConfig ----------------------------------------------

/// Configuration of a single [PrefixBloomFilter].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrefixBloomConfig {
    /// The number of blocks `b`.
    pub blocks: usize,
    /// Bits `m` per block.
    pub filter_bits: usize,
    /// Probes `k` per item.
    pub hash_count: usize,
    pub seed: Option<u64>,
}

impl Default for PrefixBloomConfig {
    fn default() -> Self {
        Self {
            blocks: 16,
            filter_bits: 4096,
            hash_count: 3,
            seed: None,
        }
    }
}

impl PrefixBloomConfig {
    pub fn validate(&self) -> Result<(), FibError> {
        if self.blocks == 0 {
            return Err(FibError::InvalidConfig("blocks must be positive"));
        }
        check_bloom_params(self.filter_bits, self.hash_count)
    }

    pub fn build(&self) -> Result<PrefixBloomFilter, FibError> {
        self.validate()?;
        Ok(PrefixBloomFilter::new(
            self.blocks,
            self.filter_bits,
            std::sync::Arc::new(sip_hasher(self.hash_count, self.seed)),
        ))
    }
}

//------------ CaesarConfig ---------------------------------------------------

/// Configuration of the per-port prefix bloom filter backend.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaesarConfig {
    /// The number of egress ports, one prefix bloom filter each.
    pub ports: usize,
    /// Blocks per prefix bloom filter.
    pub blocks: usize,
    /// Bits per block.
    pub filter_bits: usize,
    pub hash_count: usize,
    pub seed: Option<u64>,
}

impl Default for CaesarConfig {
    fn default() -> Self {
        Self {
            ports: 32,
            blocks: 16,
            filter_bits: 4096,
            hash_count: 3,
            seed: None,
        }
    }
}

impl CaesarConfig {
    fn port_filter(&self) -> PrefixBloomConfig {
        PrefixBloomConfig {
            blocks: self.blocks,
            filter_bits: self.filter_bits,
            hash_count: self.hash_count,
            seed: self.seed,
        }
    }
}

impl BackendConfig for CaesarConfig {
    type Backend = CaesarFib;

    fn kind(&self) -> BackendKind {
        BackendKind::Caesar
    }

    fn validate(&self) -> Result<(), FibError> {
        check_ports(self.ports)?;
        self.port_filter().validate()
    }

    fn build(&self) -> Result<CaesarFib, FibError> {
        self.validate()?;
        let pbf = self.port_filter();
        Ok(CaesarFib::new(
            self.ports,
            pbf.blocks,
            pbf.filter_bits,
            sip_hasher(pbf.hash_count, pbf.seed),
        ))
    }
}

//------------ FibConfig ------------------------------------------------------

/// Any of the backend configurations, tagged with the backend name when
/// serialized:
///
/// ```
/// use name_fib::fib::config::{BackendKind, FibConfig};
///
/// let config: FibConfig = serde_json::from_str(
///     r#"{ "backend": "cisco", "depth": 4 }"#
/// ).unwrap();
/// assert_eq!(config.kind(), BackendKind::Cisco);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "snake_case")]
pub enum FibConfig {
    Patricia(PatriciaConfig),
    Cisco(CiscoConfig),
    Tbf(TbfConfig),
    MergedBloom(MergedBloomConfig),
    Caesar(CaesarConfig),
}

impl FibConfig {
    /// The default configuration for a backend kind.
    pub fn default_for(kind: BackendKind) -> Self {
        match kind {
            BackendKind::Patricia => FibConfig::Patricia(Default::default()),
            BackendKind::Cisco => FibConfig::Cisco(Default::default()),
            BackendKind::Tbf => FibConfig::Tbf(Default::default()),
            BackendKind::MergedBloom => {
                FibConfig::MergedBloom(Default::default())
            }
            BackendKind::Caesar => FibConfig::Caesar(Default::default()),
        }
    }

    pub fn kind(&self) -> BackendKind {
        match self {
            FibConfig::Patricia(c) => c.kind(),
            FibConfig::Cisco(c) => c.kind(),
            FibConfig::Tbf(c) => c.kind(),
            FibConfig::MergedBloom(c) => c.kind(),
            FibConfig::Caesar(c) => c.kind(),
        }
    }

    pub fn validate(&self) -> Result<(), FibError> {
        match self {
            FibConfig::Patricia(c) => c.validate(),
            FibConfig::Cisco(c) => c.validate(),
            FibConfig::Tbf(c) => c.validate(),
            FibConfig::MergedBloom(c) => c.validate(),
            FibConfig::Caesar(c) => c.validate(),
        }
    }

    /// Build an empty FIB for this configuration.
    pub fn build(&self) -> Result<FibBackend, FibError> {
        Ok(match self {
            FibConfig::Patricia(c) => FibBackend::Patricia(c.build()?),
            FibConfig::Cisco(c) => FibBackend::Cisco(c.build()?),
            FibConfig::Tbf(c) => FibBackend::Tbf(c.build()?),
            FibConfig::MergedBloom(c) => FibBackend::MergedBloom(c.build()?),
            FibConfig::Caesar(c) => FibBackend::Caesar(c.build()?),
        })
    }

    /// The number of egress ports the backend accepts, if it is bounded.
    pub fn ports(&self) -> Option<usize> {
        match self {
            FibConfig::MergedBloom(c) => Some(c.ports),
            FibConfig::Caesar(c) => Some(c.ports),
            _ => None,
        }
    }

    /// Set the hash seed on backends that use one.
    pub fn set_seed(&mut self, seed: u64) {
        match self {
            FibConfig::Tbf(c) => c.seed = Some(seed),
            FibConfig::MergedBloom(c) => c.seed = Some(seed),
            FibConfig::Caesar(c) => c.seed = Some(seed),
            FibConfig::Patricia(_) | FibConfig::Cisco(_) => {}
        }
    }
}

impl Default for FibConfig {
    fn default() -> Self {
        FibConfig::Patricia(PatriciaConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_count_bounds() {
        let config = MergedBloomConfig {
            hash_count: HASHED_SEGMENT_LEN,
            ..Default::default()
        };
        assert!(config.build().is_ok());

        let config = MergedBloomConfig {
            hash_count: HASHED_SEGMENT_LEN + 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(FibError::InvalidConfig("hash_count is too large"))
        ));

        let config = TbfConfig {
            hash_count: 0,
            ..Default::default()
        };
        assert!(config.build().is_err());
    }
}
