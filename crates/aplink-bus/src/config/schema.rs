use serde::Deserialize;
use tracing_subscriber::EnvFilter;
use aplink_core::error::{AplinkError, Result};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AplinkConfig {
    pub version: u32,

    #[serde(default)]
    pub raise_hand: RaiseHandSection,

    #[serde(default)]
    pub translation: TranslationSection,

    #[serde(default)]
    pub chat: ChatSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

impl Default for AplinkConfig {
    fn default() -> Self {
        Self {
            version: 1,
            raise_hand: RaiseHandSection::default(),
            translation: TranslationSection::default(),
            chat: ChatSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl AplinkConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(AplinkError::UnsupportedVersion);
        }

        self.raise_hand.validate()?;
        self.translation.validate()?;
        self.chat.validate()?;
        self.logging.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RaiseHandSection {
    /// Minimum gap between two notification tones.
    #[serde(default = "default_tone_min_interval_ms")]
    pub tone_min_interval_ms: u64,
}

impl Default for RaiseHandSection {
    fn default() -> Self {
        Self {
            tone_min_interval_ms: default_tone_min_interval_ms(),
        }
    }
}

impl RaiseHandSection {
    pub fn validate(&self) -> Result<()> {
        if self.tone_min_interval_ms > 60_000 {
            return Err(AplinkError::Config(
                "raise_hand.tone_min_interval_ms must be between 0 and 60000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationSection {
    /// Queue translations received from other participants for playback.
    #[serde(default = "default_autoplay_remote")]
    pub autoplay_remote: bool,

    /// MIME type used when turning received audio into a `data:` URL.
    #[serde(default = "default_audio_mime")]
    pub audio_mime: String,
}

impl Default for TranslationSection {
    fn default() -> Self {
        Self {
            autoplay_remote: default_autoplay_remote(),
            audio_mime: default_audio_mime(),
        }
    }
}

impl TranslationSection {
    pub fn validate(&self) -> Result<()> {
        if !self.audio_mime.starts_with("audio/") {
            return Err(AplinkError::Config(
                "translation.audio_mime must start with \"audio/\"".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChatSection {
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Minimum gap between two incoming-message tones.
    #[serde(default = "default_chat_tone_min_interval_ms")]
    pub tone_min_interval_ms: u64,
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            tone_min_interval_ms: default_chat_tone_min_interval_ms(),
        }
    }
}

impl ChatSection {
    pub fn validate(&self) -> Result<()> {
        if !(1..=10_000).contains(&self.history_limit) {
            return Err(AplinkError::Config(
                "chat.history_limit must be between 1 and 10000".into(),
            ));
        }
        if self.tone_min_interval_ms > 60_000 {
            return Err(AplinkError::Config(
                "chat.tone_min_interval_ms must be between 0 and 60000".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingSection {
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl LoggingSection {
    pub fn validate(&self) -> Result<()> {
        EnvFilter::try_new(&self.filter)
            .map_err(|e| AplinkError::Config(format!("logging.filter is not a valid filter: {e}")))?;
        Ok(())
    }
}

fn default_tone_min_interval_ms() -> u64 {
    1000
}
fn default_autoplay_remote() -> bool {
    true
}
fn default_audio_mime() -> String {
    "audio/mpeg".into()
}
fn default_history_limit() -> usize {
    200
}
fn default_chat_tone_min_interval_ms() -> u64 {
    2000
}
fn default_log_filter() -> String {
    "info".into()
}
