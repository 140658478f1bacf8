use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// HTTP client and politeness settings shared by discovery and extraction.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    /// Per-request timeout; every tier runs under this bound.
    pub timeout_seconds: u64,
    /// Retries for the feed fetch only. Extraction tiers never retry.
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    /// Delay between article requests within one topic batch.
    pub politeness_delay_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
            timeout_seconds: 8,
            max_retries: 2,
            retry_delay_seconds: 2,
            max_feed_size_mb: 5,
            politeness_delay_ms: 500,
        }
    }
}

/// Thresholds for the article-text validator. Empirically chosen; the
/// deduplication scenario tests are the contract these must preserve.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Minimum accepted character count, inclusive.
    pub min_chars: usize,
    /// Floor applied after whitespace collapsing.
    pub min_compact_chars: usize,
    /// Minimum number of Hangul syllable glyphs.
    pub min_hangul: usize,
    /// Two or more distinct hits mean a non-article page.
    pub boilerplate_markers: Vec<String>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_chars: 50,
            min_compact_chars: 40,
            min_hangul: 20,
            boilerplate_markers: [
                "공유하기",
                "로그인",
                "구독하기",
                "회원가입",
                "앱 다운로드",
                "댓글 정렬",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

/// Similarity thresholds for the deduplicator.
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Titles at or above this ratio are the same story.
    pub general_threshold: f64,
    /// Lower bar applied when both titles are personnel announcements.
    pub personnel_threshold: f64,
    /// Substrings that mark a title as a personnel/appointment announcement.
    pub personnel_markers: Vec<String>,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            general_threshold: 0.6,
            personnel_threshold: 0.4,
            personnel_markers: ["[인사]", "인사", "프로필", "선임", "승진"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// How queries are built for a topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TopicKind {
    /// A named entity: aliases are OR-ed and quoted, noise exclusions are
    /// AND-ed with `-` operators.
    Entity {
        aliases: Vec<String>,
        exclusions: Vec<String>,
    },
    /// An industry/macro theme: broader OR-group of thematic terms, no
    /// exclusions and no sparse-result fallback.
    Theme { terms: Vec<String> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicSpec {
    /// Storage key for this topic, e.g. "IBK Capital".
    pub key: String,
    pub kind: TopicKind,
}

impl TopicSpec {
    pub fn is_entity(&self) -> bool {
        matches!(self.kind, TopicKind::Entity { .. })
    }
}

/// Process-wide configuration, constructed once at startup and passed by
/// reference into each component. No component reads ambient global state.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: String,
    pub fetch: FetchConfig,
    pub validator: ValidatorConfig,
    pub dedup: DedupConfig,
    pub topics: Vec<TopicSpec>,
    pub lookback_days: i64,
    pub max_items: usize,
    /// Number of topics fetched in parallel.
    pub concurrency: usize,
    /// Optional legacy JSON snapshot imported once when the store is empty.
    pub legacy_snapshot: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: env::var("NEWS_DB_PATH").unwrap_or_else(|_| "news_history.db".to_string()),
            fetch: FetchConfig::default(),
            validator: ValidatorConfig::default(),
            dedup: DedupConfig::default(),
            topics: default_topics(),
            lookback_days: 3,
            max_items: 20,
            concurrency: 4,
            legacy_snapshot: Some(PathBuf::from("news_history.json")),
        }
    }
}

/// Built-in topic catalogue: two capital-finance companies, their parent
/// banks, plus an industry and a macro theme.
pub fn default_topics() -> Vec<TopicSpec> {
    let noise = ["시무식", "취임식", "기부", "포토"];
    let exclusions: Vec<String> = noise.iter().map(|s| s.to_string()).collect();

    vec![
        TopicSpec {
            key: "IBK Capital".to_string(),
            kind: TopicKind::Entity {
                aliases: vec!["IBK캐피탈".to_string(), "IBK기업은행 캐피탈".to_string()],
                exclusions: exclusions.clone(),
            },
        },
        TopicSpec {
            key: "KDB Capital".to_string(),
            kind: TopicKind::Entity {
                aliases: vec!["산은캐피탈".to_string(), "KDB산업은행 캐피탈".to_string()],
                exclusions,
            },
        },
        TopicSpec {
            key: "Capital Industry".to_string(),
            kind: TopicKind::Theme {
                terms: vec![
                    "캐피탈사 업황".to_string(),
                    "여신전문금융".to_string(),
                    "캐피탈 채권".to_string(),
                    "PF 대출 부실".to_string(),
                ],
            },
        },
        TopicSpec {
            key: "Macro Economy".to_string(),
            kind: TopicKind::Theme {
                terms: vec![
                    "한국 기준금리".to_string(),
                    "원달러 환율 전망".to_string(),
                    "국고채 금리".to_string(),
                    "회사채 금리".to_string(),
                ],
            },
        },
    ]
}
