use std::fmt;
use std::str::FromStr;

use track_core::{Encoding, TrackError, TrackResult};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const DEFAULT_RATIO_THRESHOLD: f32 = 0.8;
pub const DEFAULT_SEED: u64 = 42;
/// Largest accepted LSH multi-probe level; probes per table grow as sum of C(key_size, i)
pub const MAX_MULTI_PROBE_LEVEL: usize = 4;

/// Distance family; must agree with the descriptor encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum MetricFamily {
    /// Hamming distance on bit-packed codes
    #[default]
    Binary,
    /// Euclidean distance on float vectors
    Float,
}

impl MetricFamily {
    pub fn encoding(self) -> Encoding {
        match self {
            MetricFamily::Binary => Encoding::Binary,
            MetricFamily::Float => Encoding::Float,
        }
    }
}

impl FromStr for MetricFamily {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "des_binary" | "binary" | "hamming" => Ok(MetricFamily::Binary),
            "des_hog" | "float" | "floating-point" | "l2" | "euclidean" => Ok(MetricFamily::Float),
            _ => Err(TrackError::invalid_option("descriptor type", s)),
        }
    }
}

impl fmt::Display for MetricFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricFamily::Binary => write!(f, "binary"),
            MetricFamily::Float => write!(f, "float"),
        }
    }
}

/// Parameters of an approximate nearest-neighbour index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(tag = "kind", rename_all = "snake_case")
)]
pub enum IndexParams {
    /// Locality-sensitive hashing over sampled bits, for binary codes
    Lsh {
        table_number: usize,
        key_size: usize,
        multi_probe_level: usize,
    },
    /// Randomized kd-tree forest searched best-bin-first, for float vectors
    KdTree { trees: usize, checks: usize },
}

impl IndexParams {
    pub const fn lsh() -> Self {
        IndexParams::Lsh {
            table_number: 12,
            key_size: 20,
            multi_probe_level: 2,
        }
    }

    pub const fn kd_tree() -> Self {
        IndexParams::KdTree { trees: 4, checks: 32 }
    }

    /// Default index for a metric family
    pub fn for_metric(metric: MetricFamily) -> Self {
        match metric {
            MetricFamily::Binary => Self::lsh(),
            MetricFamily::Float => Self::kd_tree(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            IndexParams::Lsh { .. } => "lsh",
            IndexParams::KdTree { .. } => "kd_tree",
        }
    }

    fn validate(&self, metric: MetricFamily) -> TrackResult<()> {
        match (*self, metric) {
            (
                IndexParams::Lsh {
                    table_number,
                    key_size,
                    multi_probe_level,
                },
                MetricFamily::Binary,
            ) => {
                if table_number == 0 {
                    return Err(TrackError::invalid_option("table_number", table_number));
                }
                if !(1..=32).contains(&key_size) {
                    return Err(TrackError::invalid_option("key_size", key_size));
                }
                if multi_probe_level > key_size.min(MAX_MULTI_PROBE_LEVEL) {
                    return Err(TrackError::invalid_option("multi_probe_level", multi_probe_level));
                }
                Ok(())
            }
            (IndexParams::KdTree { trees, checks }, MetricFamily::Float) => {
                if trees == 0 {
                    return Err(TrackError::invalid_option("trees", trees));
                }
                if checks == 0 {
                    return Err(TrackError::invalid_option("checks", checks));
                }
                Ok(())
            }
            (params, metric) => Err(TrackError::IncompatibleOptions {
                option: "index parameters",
                value: params.kind().to_string(),
                reason: format!("not usable with the {} metric", metric),
            }),
        }
    }
}

/// Strategy tag as written in configuration strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    BruteForce,
    Approximate,
}

impl FromStr for StrategyKind {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mat_bf" | "bf" | "brute-force" | "brute_force" => Ok(StrategyKind::BruteForce),
            "mat_flann" | "flann" | "approximate" | "approximate-index" => Ok(StrategyKind::Approximate),
            _ => Err(TrackError::invalid_option("matcher type", s)),
        }
    }
}

/// How neighbours are searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum SearchStrategy {
    /// Exact pairwise scan
    #[default]
    BruteForce,
    /// Seeded approximate index
    Approximate(IndexParams),
}

impl SearchStrategy {
    /// Resolve a strategy tag, picking the default index for `metric`
    pub fn from_kind(kind: StrategyKind, metric: MetricFamily) -> Self {
        match kind {
            StrategyKind::BruteForce => SearchStrategy::BruteForce,
            StrategyKind::Approximate => SearchStrategy::Approximate(IndexParams::for_metric(metric)),
        }
    }
}

/// Which neighbours become matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(rename_all = "snake_case"))]
pub enum SelectionPolicy {
    /// Always take the single nearest neighbour
    #[default]
    NearestOnly,
    /// Take the nearest only when clearly closer than the second nearest
    RatioTest,
}

impl SelectionPolicy {
    /// Neighbours retrieved per query
    pub fn k(self) -> usize {
        match self {
            SelectionPolicy::NearestOnly => 1,
            SelectionPolicy::RatioTest => 2,
        }
    }
}

impl FromStr for SelectionPolicy {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sel_nn" | "nn" | "nearest" | "nearest-only" => Ok(SelectionPolicy::NearestOnly),
            "sel_knn" | "knn" | "ratio" | "ratio-test" => Ok(SelectionPolicy::RatioTest),
            _ => Err(TrackError::invalid_option("selector type", s)),
        }
    }
}

fn default_ratio_threshold() -> f32 {
    DEFAULT_RATIO_THRESHOLD
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

/// Parameters of a matching pass
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MatcherConfig {
    pub metric: MetricFamily,
    pub strategy: SearchStrategy,
    pub selection: SelectionPolicy,
    /// Nearest must be closer than this fraction of the second nearest
    #[cfg_attr(feature = "serde", serde(default = "default_ratio_threshold"))]
    pub ratio_threshold: f32,
    /// Keep only mutual nearest neighbours (brute-force nearest-only)
    #[cfg_attr(feature = "serde", serde(default))]
    pub cross_check: bool,
    /// Seed for approximate index construction
    #[cfg_attr(feature = "serde", serde(default = "default_seed"))]
    pub seed: u64,
    #[cfg_attr(feature = "serde", serde(default = "track_core::default_threads"))]
    pub n_threads: usize,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub name: Option<String>,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            metric: MetricFamily::default(),
            strategy: SearchStrategy::default(),
            selection: SelectionPolicy::default(),
            ratio_threshold: DEFAULT_RATIO_THRESHOLD,
            cross_check: false,
            seed: DEFAULT_SEED,
            n_threads: track_core::default_threads(),
            name: None,
        }
    }
}

impl MatcherConfig {
    pub fn new(metric: MetricFamily, strategy: SearchStrategy, selection: SelectionPolicy) -> Self {
        Self {
            metric,
            strategy,
            selection,
            ..Self::default()
        }
    }

    /// Parse the string tags used by tracking pipelines, e.g.
    /// `("DES_BINARY", "MAT_FLANN", "SEL_KNN")`
    pub fn from_tags(descriptor: &str, matcher: &str, selector: &str) -> TrackResult<Self> {
        let metric: MetricFamily = descriptor.parse()?;
        let kind: StrategyKind = matcher.parse()?;
        let selection: SelectionPolicy = selector.parse()?;
        Ok(Self::new(metric, SearchStrategy::from_kind(kind, metric), selection))
    }

    /// Hamming brute-force with the ratio test
    pub fn binary_ratio_preset() -> Self {
        Self {
            name: Some("BinaryRatio".to_string()),
            ..Self::new(MetricFamily::Binary, SearchStrategy::BruteForce, SelectionPolicy::RatioTest)
        }
    }

    /// L2 kd-forest with the ratio test
    pub fn float_approximate_preset() -> Self {
        Self {
            name: Some("FloatApproximate".to_string()),
            ..Self::new(
                MetricFamily::Float,
                SearchStrategy::Approximate(IndexParams::kd_tree()),
                SelectionPolicy::RatioTest,
            )
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn summary(&self) -> String {
        let strategy = match self.strategy {
            SearchStrategy::BruteForce => "brute-force".to_string(),
            SearchStrategy::Approximate(IndexParams::Lsh {
                table_number,
                key_size,
                multi_probe_level,
            }) => format!("lsh({}, {}, {})", table_number, key_size, multi_probe_level),
            SearchStrategy::Approximate(IndexParams::KdTree { trees, checks }) => {
                format!("kd-forest({} trees, {} checks)", trees, checks)
            }
        };
        let selection = match self.selection {
            SelectionPolicy::NearestOnly => "nearest-only".to_string(),
            SelectionPolicy::RatioTest => format!("ratio-test({})", self.ratio_threshold),
        };
        format!(
            "MatcherConfig{}: metric={}, strategy={}, selection={}, cross_check={}, threads={}",
            self.name.as_deref().map(|n| format!(" '{}'", n)).unwrap_or_default(),
            self.metric,
            strategy,
            selection,
            self.cross_check,
            self.n_threads
        )
    }

    pub fn validate(&self) -> TrackResult<()> {
        if !(self.ratio_threshold > 0.0 && self.ratio_threshold <= 1.0) {
            return Err(TrackError::invalid_option("ratio_threshold", self.ratio_threshold));
        }
        if self.n_threads == 0 {
            return Err(TrackError::invalid_option("n_threads", self.n_threads));
        }
        if let SearchStrategy::Approximate(params) = self.strategy {
            params.validate(self.metric)?;
        }
        if self.cross_check
            && (self.strategy != SearchStrategy::BruteForce || self.selection != SelectionPolicy::NearestOnly)
        {
            return Err(TrackError::IncompatibleOptions {
                option: "cross_check",
                value: "true".to_string(),
                reason: "requires brute-force search with nearest-only selection".to_string(),
            });
        }
        Ok(())
    }

    /// Reject descriptors whose encoding does not fit the metric
    pub fn check_encoding(&self, encoding: Encoding) -> TrackResult<()> {
        if encoding != self.metric.encoding() {
            return Err(TrackError::IncompatibleOptions {
                option: "metric",
                value: self.metric.to_string(),
                reason: format!("descriptors are {}", encoding),
            });
        }
        Ok(())
    }

    /// Save configuration to JSON file
    #[cfg(feature = "serde")]
    pub fn save_json<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Load configuration from JSON file
    #[cfg(feature = "serde")]
    pub fn load_json<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to TOML file
    #[cfg(feature = "serde")]
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        std::fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Load configuration from TOML file
    #[cfg(feature = "serde")]
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_json(json: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[cfg(feature = "serde")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    #[cfg(feature = "serde")]
    pub fn from_toml(toml_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }
}
