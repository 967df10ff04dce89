use serde::Deserialize;

/// Main configuration structure for Plane-Harvest
///
/// Every section is optional; missing sections fall back to the defaults below,
/// which target airliners.net with a 500-image quota per class.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub search: SearchConfig,
    pub crawler: CrawlerConfig,
    pub retry: RetryConfig,
    pub quota: QuotaConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub split: SplitConfig,
    /// Ordered substring → class label rules; first match wins
    pub classes: Vec<ClassRule>,
    /// Ordered subclass groups used for balanced sampling
    #[serde(rename = "subclass-groups")]
    pub subclass_groups: Vec<SubclassGroup>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            search: SearchConfig::default(),
            crawler: CrawlerConfig::default(),
            retry: RetryConfig::default(),
            quota: QuotaConfig::default(),
            user_agent: UserAgentConfig::default(),
            output: OutputConfig::default(),
            split: SplitConfig::default(),
            classes: default_class_rules(),
            subclass_groups: default_subclass_groups(),
        }
    }
}

/// Search endpoint and query list
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Base URL that relative detail links are resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Search URL with `{query}` and `{page}` placeholders
    #[serde(rename = "url-template")]
    pub url_template: String,

    /// Search keywords, walked strictly in order
    pub queries: Vec<String>,

    /// Pages fetched per query before moving to the next one
    #[serde(rename = "max-pages-per-query")]
    pub max_pages_per_query: u32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.airliners.net".to_string(),
            url_template:
                "https://www.airliners.net/search?keywords={query}&photoCategory=23&page={page}"
                    .to_string(),
            queries: [
                "Airbus+A300",
                "Airbus+A310",
                "Airbus+A318",
                "Airbus+A319",
                "Airbus+A320",
                "Airbus+A321",
                "Airbus+A330",
                "Airbus+A340",
                "Airbus+A350",
                "Airbus+A380",
                "Boeing+707",
                "Boeing+727",
                "Boeing+737",
                "Boeing+737-8+MAX",
                "Boeing+737-9+MAX",
                "Boeing+747",
                "Boeing+757",
                "Boeing+767",
                "Boeing+777",
                "Boeing+787",
            ]
            .iter()
            .map(|q| q.to_string())
            .collect(),
            max_pages_per_query: 100,
        }
    }
}

/// Crawler pacing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of detail pages fetched concurrently within one search page
    #[serde(rename = "max-concurrent-details")]
    pub max_concurrent_details: u32,

    /// Pause between search pages (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// A page taking longer than this is reported as slow (seconds)
    #[serde(rename = "page-time-budget-secs")]
    pub page_time_budget_secs: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_details: 10,
            page_delay_ms: 1000,
            page_time_budget_secs: 60,
            request_timeout_secs: 10,
        }
    }
}

/// Retry/backoff configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Attempts for search result pages
    #[serde(rename = "search-attempts")]
    pub search_attempts: u32,

    /// Attempts for detail pages and image downloads
    #[serde(rename = "detail-attempts")]
    pub detail_attempts: u32,

    /// Delay after the first failed attempt (milliseconds)
    #[serde(rename = "initial-delay-ms")]
    pub initial_delay_ms: u64,

    /// Factor applied to the delay after each failed attempt
    pub multiplier: u32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            search_attempts: 3,
            detail_attempts: 5,
            initial_delay_ms: 1000,
            multiplier: 2,
        }
    }
}

/// Quota configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// Maximum saved images per class label
    #[serde(rename = "limit-per-class")]
    pub limit_per_class: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            limit_per_class: 500,
        }
    }
}

/// User agent sent with every request
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Root of the class-partitioned image tree
    #[serde(rename = "save-dir")]
    pub save_dir: String,

    /// Path to the JSON checkpoint file
    #[serde(rename = "state-path")]
    pub state_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            save_dir: "downloaded_planes".to_string(),
            state_path: "scraper_state.json".to_string(),
        }
    }
}

/// Dataset split configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Destination of the `train/val/test` tree
    #[serde(rename = "output-dir")]
    pub output_dir: String,
    pub train: f64,
    pub val: f64,
    pub test: f64,
    /// Shuffle seed, so a split can be reproduced
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            output_dir: "dataset".to_string(),
            train: 0.7,
            val: 0.2,
            test: 0.1,
            seed: 42,
        }
    }
}

/// A substring → class label rule
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ClassRule {
    pub pattern: String,
    pub label: String,
}

/// A class label subdivided into subclasses with equal shares of the class quota
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SubclassGroup {
    pub group: String,
    pub subclasses: Vec<String>,
}

fn rule(pattern: &str, label: &str) -> ClassRule {
    ClassRule {
        pattern: pattern.to_string(),
        label: label.to_string(),
    }
}

/// The built-in class table, in match order
pub fn default_class_rules() -> Vec<ClassRule> {
    vec![
        rule("A300", "A300"),
        rule("A310", "A310"),
        rule("A318", "A318"),
        rule("A319", "A319"),
        rule("A320", "A320"),
        rule("A321", "A321"),
        rule("A330", "A330"),
        rule("A340", "A340"),
        rule("A350", "A350"),
        rule("A380", "A380"),
        rule("707", "B707"),
        rule("727", "B727"),
        rule("737-2", "B737 Classic"),
        rule("737-3", "B737 Classic"),
        rule("737-4", "B737 Classic"),
        rule("737-5", "B737 Classic"),
        rule("737-6", "B737 NG"),
        rule("737-7", "B737 NG"),
        rule("737-8", "B737 NG"),
        rule("737-9", "B737 NG"),
        rule("737-8 MAX", "B737 MAX"),
        rule("737-9 MAX", "B737 MAX"),
        rule("747", "B747"),
        rule("757", "B757"),
        rule("767", "B767"),
        rule("777", "B777"),
        rule("787", "B787"),
    ]
}

/// The built-in subclass groups, in match order
pub fn default_subclass_groups() -> Vec<SubclassGroup> {
    let group = |name: &str, subs: &[&str]| SubclassGroup {
        group: name.to_string(),
        subclasses: subs.iter().map(|s| s.to_string()).collect(),
    };

    vec![
        group("B737 Classic", &["737-2", "737-3", "737-4", "737-5"]),
        group("B737 NG", &["737-6", "737-7", "737-8", "737-9"]),
        group("B737 MAX", &["737-8 MAX", "737-9 MAX"]),
    ]
}
