//! Speech-to-text and text-to-speech
//!
//! Azure Speech REST endpoints. Recognition without a caller-supplied language
//! walks the candidate locales in order and keeps the first successful result.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use utility_agent_config::constants::speech::VOICES;
use utility_agent_config::SpeechConfig;
use utility_agent_core::Language;

use super::IntegrationError;

const FALLBACK_VOICE: &str = "ar-MA-JamalNeural";
const TTS_OUTPUT_FORMAT: &str = "audio-16khz-32kbitrate-mono-mp3";
const STT_CONTENT_TYPE: &str = "audio/wav; codecs=audio/pcm; samplerate=16000";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    #[default]
    Male,
    Female,
}

impl VoiceGender {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(VoiceGender::Male),
            "female" | "f" => Some(VoiceGender::Female),
            _ => None,
        }
    }
}

/// Recognized speech
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcription {
    pub text: String,
    /// Locale the recognizer matched, e.g. `fr-FR`
    pub locale: String,
    pub language: Language,
}

/// Synthesized speech
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub audio: Vec<u8>,
    pub content_type: &'static str,
    pub voice: String,
}

/// Map a recognizer locale to a reply language
pub fn language_for_locale(locale: &str) -> Language {
    let lower = locale.to_ascii_lowercase();
    if lower.starts_with("ar") {
        Language::Arabic
    } else if lower.starts_with("fr") {
        Language::French
    } else {
        Language::English
    }
}

pub fn locale_for_language(language: Language) -> &'static str {
    match language {
        Language::Arabic => "ar-MA",
        Language::French => "fr-FR",
        Language::English => "en-US",
    }
}

/// Neural voice for a locale; unknown locales get the Moroccan Arabic male voice
pub fn voice_for(locale: &str, gender: VoiceGender) -> &'static str {
    VOICES
        .iter()
        .find(|(l, _, _)| l.eq_ignore_ascii_case(locale))
        .map(|(_, male, female)| match gender {
            VoiceGender::Male => *male,
            VoiceGender::Female => *female,
        })
        .unwrap_or(FALLBACK_VOICE)
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn build_ssml(text: &str, locale: &str, voice: &str) -> String {
    format!(
        "<speak version='1.0' xml:lang='{locale}'><voice xml:lang='{locale}' name='{voice}'>{}</voice></speak>",
        escape_xml(text)
    )
}

#[async_trait]
pub trait SpeechService: Send + Sync {
    /// Transcribe 16 kHz PCM WAV audio. `locale` pins the recognizer language.
    async fn transcribe(
        &self,
        audio: &[u8],
        locale: Option<&str>,
    ) -> Result<Transcription, IntegrationError>;

    async fn synthesize(
        &self,
        text: &str,
        locale: &str,
        gender: VoiceGender,
    ) -> Result<SynthesizedAudio, IntegrationError>;

    fn name(&self) -> &str;
}

/// Azure Speech REST client
pub struct AzureSpeech {
    client: Client,
    region: String,
    api_key: String,
    candidate_languages: Vec<String>,
}

impl AzureSpeech {
    pub fn new(config: &SpeechConfig) -> Result<Self, IntegrationError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| IntegrationError::NotConfigured("speech.api_key".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IntegrationError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            region: config.region.clone(),
            api_key,
            candidate_languages: config.candidate_languages.clone(),
        })
    }

    fn stt_url(&self, locale: &str) -> String {
        format!(
            "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1?language={}&format=simple",
            self.region, locale
        )
    }

    fn tts_url(&self) -> String {
        format!(
            "https://{}.tts.speech.microsoft.com/cognitiveservices/v1",
            self.region
        )
    }

    async fn recognize_once(&self, audio: &[u8], locale: &str) -> Result<Transcription, IntegrationError> {
        let response = self
            .client
            .post(self.stt_url(locale))
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, STT_CONTENT_TYPE)
            .header(reqwest::header::ACCEPT, "application/json")
            .body(audio.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::from_status(status, body));
        }

        let result: RecognitionResult = response
            .json()
            .await
            .map_err(|e| IntegrationError::Internal(e.to_string()))?;

        match result.recognition_status.as_str() {
            "Success" => {
                let text = result.display_text.unwrap_or_default();
                if text.trim().is_empty() {
                    return Err(IntegrationError::NoSpeech);
                }
                Ok(Transcription {
                    text,
                    locale: locale.to_string(),
                    language: language_for_locale(locale),
                })
            }
            "NoMatch" | "InitialSilenceTimeout" | "BabbleTimeout" => Err(IntegrationError::NoSpeech),
            other => Err(IntegrationError::Internal(format!(
                "recognition status {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl SpeechService for AzureSpeech {
    async fn transcribe(
        &self,
        audio: &[u8],
        locale: Option<&str>,
    ) -> Result<Transcription, IntegrationError> {
        if audio.is_empty() {
            return Err(IntegrationError::InvalidRequest("empty audio".to_string()));
        }

        if let Some(locale) = locale {
            return self.recognize_once(audio, locale).await;
        }

        let mut last_error = IntegrationError::NoSpeech;
        for candidate in &self.candidate_languages {
            match self.recognize_once(audio, candidate).await {
                Ok(transcription) => {
                    tracing::debug!(locale = %candidate, "Speech recognized");
                    return Ok(transcription);
                }
                Err(e @ (IntegrationError::AuthFailed(_) | IntegrationError::RateLimited)) => {
                    return Err(e);
                }
                Err(e) => {
                    tracing::debug!(locale = %candidate, error = %e, "No match, trying next locale");
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    async fn synthesize(
        &self,
        text: &str,
        locale: &str,
        gender: VoiceGender,
    ) -> Result<SynthesizedAudio, IntegrationError> {
        if text.trim().is_empty() {
            return Err(IntegrationError::InvalidRequest("empty text".to_string()));
        }

        let voice = voice_for(locale, gender);
        let response = self
            .client
            .post(self.tts_url())
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/ssml+xml")
            .header("X-Microsoft-OutputFormat", TTS_OUTPUT_FORMAT)
            .header(reqwest::header::USER_AGENT, "utility-agent")
            .body(build_ssml(text, locale, voice))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::from_status(status, body));
        }

        let audio = response.bytes().await?.to_vec();
        tracing::info!(voice, bytes = audio.len(), "Speech synthesized");

        Ok(SynthesizedAudio {
            audio,
            content_type: "audio/mpeg",
            voice: voice.to_string(),
        })
    }

    fn name(&self) -> &str {
        "azure-speech"
    }
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(rename = "RecognitionStatus")]
    recognition_status: String,
    #[serde(rename = "DisplayText")]
    display_text: Option<String>,
}

/// Canned transcription, silent synthesis
#[derive(Debug, Clone)]
pub struct StubSpeech {
    transcript: String,
    locale: String,
}

impl StubSpeech {
    pub fn new(transcript: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            transcript: transcript.into(),
            locale: locale.into(),
        }
    }
}

impl Default for StubSpeech {
    fn default() -> Self {
        Self::new("", "fr-FR")
    }
}

#[async_trait]
impl SpeechService for StubSpeech {
    async fn transcribe(
        &self,
        audio: &[u8],
        locale: Option<&str>,
    ) -> Result<Transcription, IntegrationError> {
        tracing::info!(bytes = audio.len(), "Stub speech: transcribe");
        if audio.is_empty() {
            return Err(IntegrationError::InvalidRequest("empty audio".to_string()));
        }
        if self.transcript.trim().is_empty() {
            return Err(IntegrationError::NoSpeech);
        }
        let locale = locale.unwrap_or(&self.locale).to_string();
        Ok(Transcription {
            text: self.transcript.clone(),
            language: language_for_locale(&locale),
            locale,
        })
    }

    async fn synthesize(
        &self,
        text: &str,
        locale: &str,
        gender: VoiceGender,
    ) -> Result<SynthesizedAudio, IntegrationError> {
        tracing::info!(chars = text.chars().count(), "Stub speech: synthesize");
        if text.trim().is_empty() {
            return Err(IntegrationError::InvalidRequest("empty text".to_string()));
        }
        Ok(SynthesizedAudio {
            audio: Vec::new(),
            content_type: "audio/mpeg",
            voice: voice_for(locale, gender).to_string(),
        })
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_mapping() {
        assert_eq!(language_for_locale("ar-MA"), Language::Arabic);
        assert_eq!(language_for_locale("ar-SA"), Language::Arabic);
        assert_eq!(language_for_locale("fr-FR"), Language::French);
        assert_eq!(language_for_locale("en-US"), Language::English);
        assert_eq!(language_for_locale("es-ES"), Language::English);
        assert_eq!(locale_for_language(Language::Arabic), "ar-MA");
    }

    #[test]
    fn test_voice_selection() {
        assert_eq!(voice_for("fr-FR", VoiceGender::Female), "fr-FR-DeniseNeural");
        assert_eq!(voice_for("ar-MA", VoiceGender::default()), "ar-MA-JamalNeural");
        assert_eq!(voice_for("xx-YY", VoiceGender::Female), FALLBACK_VOICE);
        assert_eq!(VoiceGender::parse("Female"), Some(VoiceGender::Female));
        assert_eq!(VoiceGender::parse("other"), None);
    }

    #[test]
    fn test_ssml_escapes_text() {
        let ssml = build_ssml("Eau & électricité <urgent>", "fr-FR", "fr-FR-HenriNeural");
        assert!(ssml.contains("Eau &amp; électricité &lt;urgent&gt;"));
        assert!(ssml.contains("name='fr-FR-HenriNeural'"));
    }

    #[test]
    fn test_recognition_parsing() {
        let raw = r#"{"RecognitionStatus":"Success","DisplayText":"Bonjour.","Offset":0,"Duration":1}"#;
        let result: RecognitionResult = serde_json::from_str(raw).unwrap();
        assert_eq!(result.recognition_status, "Success");
        assert_eq!(result.display_text.as_deref(), Some("Bonjour."));
    }

    #[tokio::test]
    async fn test_stub_speech() {
        let speech = StubSpeech::new("الماء مقطوع", "ar-MA");
        let t = speech.transcribe(b"RIFF", None).await.unwrap();
        assert_eq!(t.language, Language::Arabic);

        assert!(matches!(
            speech.transcribe(b"", None).await,
            Err(IntegrationError::InvalidRequest(_))
        ));
        assert!(matches!(
            speech.synthesize("  ", "ar-MA", VoiceGender::Male).await,
            Err(IntegrationError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_azure_requires_key() {
        assert!(matches!(
            AzureSpeech::new(&SpeechConfig::default()),
            Err(IntegrationError::NotConfigured(_))
        ));
    }
}
