//! Bill OCR
//!
//! Azure Document Intelligence `prebuilt-read`: submit the image, poll the
//! `Operation-Location` URL until the analysis settles, then run the contract
//! identifier over the recognized text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use utility_agent_config::OcrConfig;
use utility_agent_text_processing::find_contracts;

use super::IntegrationError;

/// Contract numbers read from a bill
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContracts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub water_contract: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub electricity_contract: Option<String>,
}

impl ExtractedContracts {
    pub fn from_text(text: &str) -> Self {
        let matches = find_contracts(text);
        Self {
            water_contract: matches.water.map(|c| c.as_canonical()),
            electricity_contract: matches.electricity.map(|c| c.as_canonical()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.water_contract.is_none() && self.electricity_contract.is_none()
    }
}

#[async_trait]
pub trait OcrService: Send + Sync {
    /// Full recognized text, `None` when the image holds no text
    async fn extract_text(&self, image: &[u8]) -> Result<Option<String>, IntegrationError>;

    /// Contract numbers on the bill, `None` when neither is found
    async fn extract_contract(
        &self,
        image: &[u8],
    ) -> Result<Option<ExtractedContracts>, IntegrationError> {
        let Some(text) = self.extract_text(image).await? else {
            return Ok(None);
        };
        let contracts = ExtractedContracts::from_text(&text);
        if contracts.is_empty() {
            tracing::info!(chars = text.chars().count(), "No contract number in OCR text");
            Ok(None)
        } else {
            Ok(Some(contracts))
        }
    }

    fn name(&self) -> &str;
}

/// Azure Document Intelligence REST client
pub struct AzureDocumentOcr {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
    api_version: String,
    poll_interval: Duration,
    max_polls: u32,
}

impl AzureDocumentOcr {
    pub fn new(config: &OcrConfig) -> Result<Self, IntegrationError> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| IntegrationError::NotConfigured("ocr.endpoint".to_string()))?;
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| IntegrationError::NotConfigured("ocr.api_key".to_string()))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IntegrationError::Internal(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            api_version: config.api_version.clone(),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            max_polls: config.max_polls,
        })
    }

    fn analyze_url(&self) -> String {
        format!(
            "{}/documentintelligence/documentModels/{}:analyze?api-version={}",
            self.endpoint, self.model, self.api_version
        )
    }

    async fn submit(&self, image: &[u8]) -> Result<String, IntegrationError> {
        let response = self
            .client
            .post(self.analyze_url())
            .header("Ocp-Apim-Subscription-Key", &self.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(image.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IntegrationError::from_status(status, body));
        }

        response
            .headers()
            .get("operation-location")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                IntegrationError::Internal("analyze response without Operation-Location".into())
            })
    }

    async fn poll(&self, operation_url: &str) -> Result<Option<String>, IntegrationError> {
        for attempt in 0..self.max_polls {
            let response = self
                .client
                .get(operation_url)
                .header("Ocp-Apim-Subscription-Key", &self.api_key)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(IntegrationError::from_status(status, body));
            }

            let result: AnalyzeOperation = response
                .json()
                .await
                .map_err(|e| IntegrationError::Internal(e.to_string()))?;

            match result.status.as_str() {
                "succeeded" => {
                    return Ok(result
                        .analyze_result
                        .and_then(|r| r.content)
                        .filter(|c| !c.trim().is_empty()));
                }
                "failed" | "canceled" => {
                    let detail = result
                        .error
                        .map(|e| e.message)
                        .unwrap_or_else(|| result.status.clone());
                    return Err(IntegrationError::Internal(format!("analysis failed: {}", detail)));
                }
                other => {
                    tracing::trace!(attempt, status = other, "OCR analysis pending");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        Err(IntegrationError::Timeout(format!(
            "analysis not finished after {} polls",
            self.max_polls
        )))
    }
}

#[async_trait]
impl OcrService for AzureDocumentOcr {
    async fn extract_text(&self, image: &[u8]) -> Result<Option<String>, IntegrationError> {
        if image.is_empty() {
            return Err(IntegrationError::InvalidRequest("empty image".to_string()));
        }
        let operation_url = self.submit(image).await?;
        let text = self.poll(&operation_url).await?;
        tracing::info!(
            bytes = image.len(),
            recognized = text.is_some(),
            "Document analysis finished"
        );
        Ok(text)
    }

    fn name(&self) -> &str {
        "azure-document-intelligence"
    }
}

#[derive(Debug, Deserialize)]
struct AnalyzeOperation {
    status: String,
    #[serde(rename = "analyzeResult")]
    analyze_result: Option<AnalyzeResult>,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    message: String,
}

/// Returns a fixed text for every image
#[derive(Debug, Clone, Default)]
pub struct StubOcr {
    text: Option<String>,
}

impl StubOcr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }
}

#[async_trait]
impl OcrService for StubOcr {
    async fn extract_text(&self, image: &[u8]) -> Result<Option<String>, IntegrationError> {
        tracing::info!(bytes = image.len(), "Stub OCR: extract text");
        Ok(self.text.clone())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_contracts_from_bill_text() {
        let ocr = StubOcr::with_text(
            "FACTURE EAU\nN° contrat: 3701455886/1014871\nMontant: 0,00 MAD",
        );
        let contracts = ocr.extract_contract(b"img").await.unwrap().unwrap();
        assert_eq!(
            contracts.water_contract.as_deref(),
            Some("3701455886 / 1014871")
        );
        assert!(contracts.electricity_contract.is_none());
    }

    #[tokio::test]
    async fn test_no_contract_is_none() {
        let ocr = StubOcr::with_text("Reçu de paiement");
        assert!(ocr.extract_contract(b"img").await.unwrap().is_none());
        assert!(StubOcr::new().extract_contract(b"img").await.unwrap().is_none());
    }

    #[test]
    fn test_operation_parsing() {
        let raw = r#"{"status":"succeeded","analyzeResult":{"content":"4801566997 / 2025982"}}"#;
        let op: AnalyzeOperation = serde_json::from_str(raw).unwrap();
        assert_eq!(op.status, "succeeded");
        assert_eq!(
            op.analyze_result.and_then(|r| r.content).as_deref(),
            Some("4801566997 / 2025982")
        );
    }

    #[test]
    fn test_azure_requires_credentials() {
        let config = OcrConfig::default();
        assert!(matches!(
            AzureDocumentOcr::new(&config),
            Err(IntegrationError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_analyze_url() {
        let config = OcrConfig {
            endpoint: Some("https://example.cognitiveservices.azure.com/".to_string()),
            api_key: Some("key".to_string()),
            ..Default::default()
        };
        let ocr = AzureDocumentOcr::new(&config).unwrap();
        assert_eq!(
            ocr.analyze_url(),
            "https://example.cognitiveservices.azure.com/documentintelligence/documentModels/prebuilt-read:analyze?api-version=2024-11-30"
        );
    }
}
