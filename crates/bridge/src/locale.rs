//! Locale resolution.
//!
//! Resolves the language, country and currency for a request.
//! Resolution order: `frontastic-locale` header, then `locale` query parameter.
//! A bare language (`de`) gets the language's home country.
//! The currency comes from the locale suffix (`de_DE@EUR`), then the
//! `frontastic-currency` header or `currency` parameter, then the country's
//! usual currency, then the configured default.

use serde::{Deserialize, Serialize};

use crate::actions::ActionRequest;
use crate::error::{BridgeError, BridgeResult};

/// Header carrying the storefront locale.
pub const LOCALE_HEADER: &str = "frontastic-locale";

/// Header carrying the storefront currency.
pub const CURRENCY_HEADER: &str = "frontastic-currency";

/// The resolved locale for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    /// Lowercase language code (e.g. "de").
    pub language: String,
    /// Uppercase country code (e.g. "DE").
    pub country: String,
    /// ISO 4217 currency code (e.g. "EUR").
    pub currency: String,
}

impl Locale {
    /// Resolve the locale of an action request.
    ///
    /// Fails with [`BridgeError::MissingLocale`] when no locale is present or
    /// it cannot be parsed.
    pub fn from_request(request: &ActionRequest, default_currency: &str) -> BridgeResult<Self> {
        let raw = request
            .header(LOCALE_HEADER)
            .or_else(|| request.query_str("locale"))
            .ok_or(BridgeError::MissingLocale)?;

        let currency = request
            .header(CURRENCY_HEADER)
            .or_else(|| request.query_str("currency"));

        Self::parse(raw, currency, default_currency).ok_or_else(|| {
            tracing::warn!(locale = %raw, "unparsable locale");
            BridgeError::MissingLocale
        })
    }

    /// Parse a storefront locale such as `en_US`, `en-GB` or `de_DE@EUR`.
    pub fn parse(raw: &str, currency: Option<&str>, default_currency: &str) -> Option<Self> {
        let (tag, suffix) = match raw.split_once('@') {
            Some((tag, suffix)) => (tag, Some(suffix)),
            None => (raw, None),
        };

        let tag = tag.trim();
        let (language, country) = match tag.split_once(['_', '-']) {
            Some((language, country)) => (language, country.to_uppercase()),
            None => (tag, language_country(tag)),
        };
        if language.is_empty() || country.is_empty() {
            return None;
        }

        let currency = suffix
            .or(currency)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase)
            .or_else(|| country_currency(&country).map(str::to_string))
            .unwrap_or_else(|| default_currency.to_uppercase());

        Some(Self {
            language: language.to_lowercase(),
            country,
            currency,
        })
    }

    /// Language tag with region, as used for localized backend fields (e.g. "en-US").
    pub fn language_tag(&self) -> String {
        format!("{}-{}", self.language, self.country)
    }
}

/// Home country of a language, for locales given without a region.
fn language_country(language: &str) -> String {
    let country = match language.to_lowercase().as_str() {
        "en" => "US",
        "ja" => "JP",
        "zh" => "CN",
        "ko" => "KR",
        "sv" => "SE",
        "da" => "DK",
        "cs" => "CZ",
        "el" => "GR",
        other => return other.to_uppercase(),
    };
    country.to_string()
}

/// Usual currency for the storefront's countries.
fn country_currency(country: &str) -> Option<&'static str> {
    match country {
        "DE" | "AT" | "FR" | "IT" | "ES" | "NL" | "BE" | "IE" | "FI" | "PT" => Some("EUR"),
        "GB" => Some("GBP"),
        "US" => Some("USD"),
        "CH" => Some("CHF"),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_locale_with_currency_suffix() {
        let locale = Locale::parse("de_DE@EUR", None, "USD").unwrap();
        assert_eq!(locale.language, "de");
        assert_eq!(locale.country, "DE");
        assert_eq!(locale.currency, "EUR");
    }

    #[test]
    fn parse_locale_uses_country_currency() {
        let locale = Locale::parse("en_GB", None, "USD").unwrap();
        assert_eq!(locale.currency, "GBP");
    }

    #[test]
    fn parse_locale_prefers_explicit_currency() {
        let locale = Locale::parse("en-US", Some("cad"), "USD").unwrap();
        assert_eq!(locale.country, "US");
        assert_eq!(locale.currency, "CAD");
    }

    #[test]
    fn parse_locale_falls_back_to_default_currency() {
        let locale = Locale::parse("ja_JP", None, "usd").unwrap();
        assert_eq!(locale.currency, "USD");
        assert_eq!(locale.language_tag(), "ja-JP");
    }

    #[test]
    fn parse_bare_language_uses_home_country() {
        let locale = Locale::parse("en", None, "USD").unwrap();
        assert_eq!(locale.language, "en");
        assert_eq!(locale.country, "US");
        assert_eq!(locale.currency, "USD");

        let locale = Locale::parse("de@CHF", None, "USD").unwrap();
        assert_eq!(locale.country, "DE");
        assert_eq!(locale.currency, "CHF");

        let locale = Locale::parse("FR", None, "USD").unwrap();
        assert_eq!(locale.language, "fr");
        assert_eq!(locale.currency, "EUR");
    }

    #[test]
    fn parse_locale_without_language_fails() {
        assert!(Locale::parse("_US", None, "USD").is_none());
        assert!(Locale::parse("", None, "USD").is_none());
        assert!(Locale::parse("  ", None, "USD").is_none());
    }

    #[test]
    fn from_request_reads_header_before_query() {
        let request = ActionRequest::default()
            .with_header("Frontastic-Locale", "de_DE")
            .with_query("locale", serde_json::json!("en_US"));

        let locale = Locale::from_request(&request, "USD").unwrap();
        assert_eq!(locale.language, "de");
    }

    #[test]
    fn from_request_without_locale_fails() {
        let request = ActionRequest::default();
        let err = Locale::from_request(&request, "USD").unwrap_err();
        assert!(matches!(err, BridgeError::MissingLocale));
    }
}
