//! Data models and structures
//!
//! Defines the quiz records decoded from the generated stream, the submitted
//! form, and the runtime configuration read from the environment.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_DIFFICULTY: &str = "Easy";
pub const DEFAULT_QUIZ_COUNT: u32 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub title: String,
    pub link: String,
}

/// One multiple-choice question as produced by the model.
///
/// `options` is keyed by label (`"a"`..`"d"`) and `answer` names one of those
/// labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub options: BTreeMap<String, String>,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<Resource>>,
}

/// An uploaded file with its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub data: Bytes,
}

/// The decoded `/api/generate` form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuizForm {
    pub files: Vec<Attachment>,
    pub notes: Option<String>,
    pub quiz_count: Option<u32>,
    pub difficulty: Option<String>,
    pub topic: Option<String>,
}

impl QuizForm {
    /// Notes with surrounding whitespace removed, or `None` when blank.
    pub fn notes(&self) -> Option<&str> {
        self.notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty())
    }

    pub fn has_input(&self) -> bool {
        !self.files.is_empty() || self.notes().is_some()
    }

    pub fn difficulty(&self) -> &str {
        self.difficulty
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(DEFAULT_DIFFICULTY)
    }

    pub fn quiz_count(&self) -> u32 {
        self.quiz_count
            .filter(|count| *count > 0)
            .unwrap_or(DEFAULT_QUIZ_COUNT)
    }

    pub fn topic(&self) -> Option<&str> {
        self.topic
            .as_deref()
            .map(str::trim)
            .filter(|topic| !topic.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    HarmCategoryHateSpeech,
    HarmCategoryDangerousContent,
    HarmCategorySexuallyExplicit,
    HarmCategoryHarassment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

impl HarmBlockThreshold {
    pub fn as_str(&self) -> &'static str {
        match self {
            HarmBlockThreshold::BlockNone => "BLOCK_NONE",
            HarmBlockThreshold::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            HarmBlockThreshold::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            HarmBlockThreshold::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
        }
    }
}

impl fmt::Display for HarmBlockThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HarmBlockThreshold {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BLOCK_NONE" => Ok(HarmBlockThreshold::BlockNone),
            "BLOCK_ONLY_HIGH" => Ok(HarmBlockThreshold::BlockOnlyHigh),
            "BLOCK_MEDIUM_AND_ABOVE" => Ok(HarmBlockThreshold::BlockMediumAndAbove),
            "BLOCK_LOW_AND_ABOVE" => Ok(HarmBlockThreshold::BlockLowAndAbove),
            other => Err(crate::Error::Config(format!(
                "Unknown safety threshold '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafetyThresholds {
    pub hate_speech: HarmBlockThreshold,
    pub dangerous_content: HarmBlockThreshold,
    pub sexually_explicit: HarmBlockThreshold,
    pub harassment: HarmBlockThreshold,
}

impl Default for SafetyThresholds {
    fn default() -> Self {
        Self {
            hate_speech: HarmBlockThreshold::BlockMediumAndAbove,
            dangerous_content: HarmBlockThreshold::BlockMediumAndAbove,
            sexually_explicit: HarmBlockThreshold::BlockMediumAndAbove,
            harassment: HarmBlockThreshold::BlockMediumAndAbove,
        }
    }
}

impl SafetyThresholds {
    /// Category/threshold pairs in the order they are sent to the provider.
    pub fn pairs(&self) -> [(HarmCategory, HarmBlockThreshold); 4] {
        [
            (HarmCategory::HarmCategoryHateSpeech, self.hate_speech),
            (
                HarmCategory::HarmCategoryDangerousContent,
                self.dangerous_content,
            ),
            (
                HarmCategory::HarmCategorySexuallyExplicit,
                self.sexually_explicit,
            ),
            (HarmCategory::HarmCategoryHarassment, self.harassment),
        ]
    }
}

/// Sampling and safety knobs applied to every quiz generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub safety: SafetyThresholds,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            max_output_tokens: 8192,
            temperature: 1.0,
            top_p: 0.95,
            safety: SafetyThresholds::default(),
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Raw `GOOGLE_SERVICE_KEY` value, decoded later by `credentials`.
    pub service_key: String,
    pub project: Option<String>,
    pub location: String,
    pub model: String,
    pub base_url: Option<String>,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
    pub generation: GenerationSettings,
}

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        load_env_file(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let defaults = GenerationSettings::default();
        let safety = SafetyThresholds {
            hate_speech: parse_or(&var, "SAFETY_HATE_SPEECH", defaults.safety.hate_speech)?,
            dangerous_content: parse_or(
                &var,
                "SAFETY_DANGEROUS_CONTENT",
                defaults.safety.dangerous_content,
            )?,
            sexually_explicit: parse_or(
                &var,
                "SAFETY_SEXUALLY_EXPLICIT",
                defaults.safety.sexually_explicit,
            )?,
            harassment: parse_or(&var, "SAFETY_HARASSMENT", defaults.safety.harassment)?,
        };

        Ok(Self {
            service_key: var("GOOGLE_SERVICE_KEY").ok_or_else(|| {
                crate::Error::Config("GOOGLE_SERVICE_KEY not set".to_string())
            })?,
            project: var("GOOGLE_CLOUD_PROJECT"),
            location: var("GOOGLE_CLOUD_LOCATION").unwrap_or_else(|| "europe-west3".to_string()),
            model: var("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string()),
            base_url: var("VERTEX_BASE_URL"),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            max_upload_bytes: parse_or(&var, "MAX_UPLOAD_BYTES", 20 * 1024 * 1024)?,
            generation: GenerationSettings {
                max_output_tokens: parse_or(
                    &var,
                    "GEMINI_MAX_OUTPUT_TOKENS",
                    defaults.max_output_tokens,
                )?,
                temperature: parse_or(&var, "GEMINI_TEMPERATURE", defaults.temperature)?,
                top_p: parse_or(&var, "GEMINI_TOP_P", defaults.top_p)?,
                safety,
            },
        })
    }
}

/// A missing `.env` file is fine; one that exists but cannot be read or
/// parsed is a startup error.
fn load_env_file<T>(result: std::result::Result<T, dotenvy::Error>) -> crate::Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> crate::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| crate::Error::Config(format!("Invalid {} '{}': {}", key, raw, e))),
        None => Ok(default),
    }
}
