use crate::config::types::{
    ClassRule, Config, CrawlerConfig, OutputConfig, RetryConfig, SearchConfig, SplitConfig,
    SubclassGroup,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_search_config(&config.search)?;
    validate_crawler_config(&config.crawler)?;
    validate_retry_config(&config.retry)?;
    validate_output_config(&config.output)?;
    validate_split_config(&config.split)?;

    if config.quota.limit_per_class < 1 {
        return Err(ConfigError::Validation(
            "limit_per_class must be >= 1".to_string(),
        ));
    }

    validate_class_rules(&config.classes)?;
    validate_subclass_groups(&config.subclass_groups, config.quota.limit_per_class)?;
    Ok(())
}

/// Validates the search endpoint and query list
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must use HTTP or HTTPS",
            config.base_url
        )));
    }

    if !config.url_template.contains("{page}") {
        return Err(ConfigError::Validation(format!(
            "url_template must contain a {{page}} placeholder, got '{}'",
            config.url_template
        )));
    }

    if !config.url_template.contains("{query}") {
        return Err(ConfigError::Validation(format!(
            "url_template must contain a {{query}} placeholder, got '{}'",
            config.url_template
        )));
    }

    // Filling the placeholders must produce a parseable URL
    let sample = config
        .url_template
        .replace("{query}", "probe")
        .replace("{page}", "1");
    Url::parse(&sample).map_err(|e| {
        ConfigError::InvalidUrl(format!("Invalid url_template '{}': {}", config.url_template, e))
    })?;

    if config.queries.is_empty() {
        return Err(ConfigError::Validation(
            "At least one search query is required".to_string(),
        ));
    }

    if config.queries.iter().any(|q| q.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "Search queries cannot be empty".to_string(),
        ));
    }

    if config.max_pages_per_query < 1 {
        return Err(ConfigError::Validation(
            "max_pages_per_query must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler pacing
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_details < 1 || config.max_concurrent_details > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_details must be between 1 and 100, got {}",
            config.max_concurrent_details
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.search_attempts < 1 || config.detail_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "retry attempts must be >= 1, got search={} detail={}",
            config.search_attempts, config.detail_attempts
        )));
    }

    if config.multiplier < 1 {
        return Err(ConfigError::Validation(
            "retry multiplier must be >= 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.save_dir.is_empty() {
        return Err(ConfigError::Validation(
            "save_dir cannot be empty".to_string(),
        ));
    }

    if config.state_path.is_empty() {
        return Err(ConfigError::Validation(
            "state_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates split ratios: each in [0, 1], together summing to 1.0
pub fn validate_split_ratios(train: f64, val: f64, test: f64) -> Result<(), ConfigError> {
    for (name, ratio) in [("train", train), ("val", val), ("test", test)] {
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::Validation(format!(
                "{} ratio must be between 0 and 1, got {}",
                name, ratio
            )));
        }
    }

    let total = train + val + test;
    if (total - 1.0).abs() > 1e-6 {
        return Err(ConfigError::Validation(format!(
            "split ratios must sum to 1.0, got {}",
            total
        )));
    }

    Ok(())
}

fn validate_split_config(config: &SplitConfig) -> Result<(), ConfigError> {
    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "split output_dir cannot be empty".to_string(),
        ));
    }
    validate_split_ratios(config.train, config.val, config.test)
}

fn validate_class_rules(rules: &[ClassRule]) -> Result<(), ConfigError> {
    if rules.is_empty() {
        return Err(ConfigError::Validation(
            "At least one class rule is required".to_string(),
        ));
    }

    for rule in rules {
        if rule.pattern.is_empty() || rule.label.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Class rule pattern and label cannot be empty (pattern='{}', label='{}')",
                rule.pattern, rule.label
            )));
        }

        // Labels become directory names
        if rule.label.contains(['/', '\\']) || rule.label == "." || rule.label == ".." {
            return Err(ConfigError::Validation(format!(
                "Class label '{}' is not a valid directory name",
                rule.label
            )));
        }
    }

    Ok(())
}

fn validate_subclass_groups(groups: &[SubclassGroup], limit: u32) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for group in groups {
        if !seen.insert(group.group.as_str()) {
            return Err(ConfigError::Validation(format!(
                "Duplicate subclass group '{}'",
                group.group
            )));
        }

        if group.subclasses.is_empty() {
            return Err(ConfigError::Validation(format!(
                "Subclass group '{}' must list at least one subclass",
                group.group
            )));
        }

        if group.subclasses.len() as u32 > limit {
            return Err(ConfigError::Validation(format!(
                "Subclass group '{}' has {} subclasses, more than limit_per_class {}",
                group.group,
                group.subclasses.len(),
                limit
            )));
        }

        for subclass in &group.subclasses {
            // Subclasses become directories under their class
            if subclass.is_empty()
                || subclass.contains(['/', '\\'])
                || subclass == "."
                || subclass == ".."
            {
                return Err(ConfigError::Validation(format!(
                    "Subclass '{}' in group '{}' is not a valid directory name",
                    subclass, group.group
                )));
            }
        }
    }

    Ok(())
}
