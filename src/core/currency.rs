//! Currencies and currency conversion abstractions

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Jpy,
    Aud,
}

impl Currency {
    pub const ALL: [Currency; 5] = [
        Currency::Usd,
        Currency::Eur,
        Currency::Gbp,
        Currency::Jpy,
        Currency::Aud,
    ];

    /// ISO 4217 code, as used by the rate providers.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Jpy => "JPY",
            Currency::Aud => "AUD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Jpy => "¥",
            Currency::Aud => "A$",
        }
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "JPY" => Ok(Currency::Jpy),
            "AUD" => Ok(Currency::Aud),
            _ => Err(anyhow::anyhow!(
                "Unsupported currency: {} (expected one of USD, EUR, GBP, JPY, AUD)",
                s
            )),
        }
    }
}

/// Source of base-to-target exchange rates.
#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parsing() {
        assert_eq!("usd".parse::<Currency>().unwrap(), Currency::Usd);
        assert_eq!(" EUR ".parse::<Currency>().unwrap(), Currency::Eur);
        assert_eq!("Jpy".parse::<Currency>().unwrap(), Currency::Jpy);
        let err = "BTC".parse::<Currency>().unwrap_err();
        assert!(err.to_string().contains("Unsupported currency: BTC"));
    }

    #[test]
    fn test_currency_symbols_and_codes() {
        assert_eq!(Currency::Aud.symbol(), "A$");
        assert_eq!(Currency::Gbp.code(), "GBP");
        assert_eq!(Currency::default(), Currency::Usd);
        for currency in Currency::ALL {
            assert_eq!(currency.code().parse::<Currency>().unwrap(), currency);
        }
    }

    #[test]
    fn test_currency_yaml_roundtrip_names() {
        let currency: Currency = serde_yaml::from_str("EUR").unwrap();
        assert_eq!(currency, Currency::Eur);
        assert_eq!(serde_yaml::to_string(&Currency::Jpy).unwrap().trim(), "JPY");
    }
}
