use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use super::get_bytes;
use crate::config::CurrencyConfig;

/// An allow-listed rate, already divided by its nominal
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyRate {
    pub code: String,
    pub rate: f64,
}

/// `<ValCurs>` root of the daily rates document
#[derive(Debug, Deserialize)]
struct ValCurs {
    #[serde(rename = "Valute", default)]
    valutes: Vec<Valute>,
}

#[derive(Debug, Deserialize)]
struct Valute {
    #[serde(rename = "CharCode")]
    char_code: String,
    #[serde(rename = "Nominal")]
    nominal: String,
    #[serde(rename = "Value")]
    value: String,
}

impl Valute {
    fn rate(&self) -> Result<f64> {
        let value: f64 = self
            .value
            .trim()
            .replacen(',', ".", 1)
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", self.char_code, self.value))?;
        let nominal: u32 = self
            .nominal
            .trim()
            .parse()
            .with_context(|| format!("Invalid nominal for {}: {:?}", self.char_code, self.nominal))?;
        if nominal == 0 {
            anyhow::bail!("Zero nominal for {}", self.char_code);
        }
        Ok(value / f64::from(nominal))
    }
}

#[derive(Clone)]
pub struct CurrencyClient {
    client: reqwest::Client,
    config: CurrencyConfig,
}

impl CurrencyClient {
    pub fn new(client: reqwest::Client, config: CurrencyConfig) -> Self {
        Self { client, config }
    }

    /// Fetch today's rates, keeping only the configured codes
    pub async fn rates(&self) -> Result<Vec<CurrencyRate>> {
        debug!("Fetching currency rates from {}", self.config.url);
        let body = get_bytes(&self.client, &self.config.url).await?;
        // The document is windows-1251; only ASCII fields are read, so a lossy decode suffices
        let xml = String::from_utf8_lossy(&body);
        parse_rates(&xml, &self.config.codes)
    }
}

/// Parse the rates document and keep allow-listed codes in document order
pub fn parse_rates(xml: &str, codes: &[String]) -> Result<Vec<CurrencyRate>> {
    let doc: ValCurs = quick_xml::de::from_str(xml).context("Failed to parse currency XML")?;

    doc.valutes
        .iter()
        .filter(|v| codes.iter().any(|c| c == v.char_code.trim()))
        .map(|v| {
            Ok(CurrencyRate {
                code: v.char_code.trim().to_string(),
                rate: v.rate()?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="windows-1251"?>
<ValCurs Date="18.10.2026" name="Foreign Currency Market">
<Valute ID="R01010"><NumCode>036</NumCode><CharCode>AUD</CharCode><Nominal>1</Nominal><Name>Australian Dollar</Name><Value>58,1234</Value></Valute>
<Valute ID="R01235"><NumCode>840</NumCode><CharCode>USD</CharCode><Nominal>10</Nominal><Name>US Dollar</Name><Value>90,50</Value></Valute>
<Valute ID="R01239"><NumCode>978</NumCode><CharCode>EUR</CharCode><Nominal>1</Nominal><Name>Euro</Name><Value>100,25</Value></Valute>
<Valute ID="R01700J"><NumCode>949</NumCode><CharCode>TRY</CharCode><Nominal>10</Nominal><Name>Turkish Lira</Name><Value>25,00</Value></Valute>
</ValCurs>"#;

    fn codes() -> Vec<String> {
        CurrencyConfig::default().codes
    }

    #[test]
    fn test_filters_and_divides_by_nominal() {
        let rates = parse_rates(DOC, &codes()).unwrap();
        assert_eq!(
            rates,
            vec![
                CurrencyRate {
                    code: "USD".to_string(),
                    rate: 9.05,
                },
                CurrencyRate {
                    code: "EUR".to_string(),
                    rate: 100.25,
                },
                CurrencyRate {
                    code: "TRY".to_string(),
                    rate: 2.5,
                },
            ]
        );
    }

    #[test]
    fn test_no_matching_codes() {
        let rates = parse_rates(DOC, &["GBP".to_string()]).unwrap();
        assert!(rates.is_empty());
    }

    #[test]
    fn test_empty_document() {
        let rates = parse_rates(r#"<ValCurs Date="18.10.2026"></ValCurs>"#, &codes()).unwrap();
        assert!(rates.is_empty());
    }

    #[test]
    fn test_bad_value_is_an_error() {
        let doc = r#"<ValCurs><Valute><CharCode>USD</CharCode><Nominal>1</Nominal><Value>n/a</Value></Valute></ValCurs>"#;
        assert!(parse_rates(doc, &codes()).is_err());
    }

    #[test]
    fn test_zero_nominal_is_an_error() {
        let doc = r#"<ValCurs><Valute><CharCode>EUR</CharCode><Nominal>0</Nominal><Value>1,0</Value></Valute></ValCurs>"#;
        assert!(parse_rates(doc, &codes()).is_err());
    }

    #[test]
    fn test_bad_value_outside_allow_list_is_ignored() {
        let doc = r#"<ValCurs><Valute><CharCode>XDR</CharCode><Nominal>x</Nominal><Value>y</Value></Valute></ValCurs>"#;
        assert!(parse_rates(doc, &codes()).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        assert!(parse_rates("<ValCurs><Valute>", &codes()).is_err());
    }

    #[tokio::test]
    async fn test_rates_fetches_document() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/scripts/XML_daily.asp")
            .with_status(200)
            .with_header("content-type", "application/xml; charset=windows-1251")
            .with_body(DOC)
            .create_async()
            .await;

        let client = CurrencyClient::new(
            reqwest::Client::new(),
            CurrencyConfig {
                url: format!("{}/scripts/XML_daily.asp", server.url()),
                ..CurrencyConfig::default()
            },
        );
        let rates = client.rates().await.unwrap();
        assert_eq!(rates.len(), 3);
        assert_eq!(rates[0].code, "USD");
    }
}
