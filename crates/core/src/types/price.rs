//! Type-safe price representation using decimal arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., naira, not kobo).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Format for display, e.g. `₦1,250,000.00`.
    #[must_use]
    pub fn display(&self) -> String {
        self.currency_code.format(self.amount)
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes supported by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    NGN,
    USD,
    EUR,
    GBP,
}

impl CurrencyCode {
    /// Currency symbol used as a display prefix.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::NGN => "₦",
            Self::USD => "$",
            Self::EUR => "€",
            Self::GBP => "£",
        }
    }

    /// The three-letter code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NGN => "NGN",
            Self::USD => "USD",
            Self::EUR => "EUR",
            Self::GBP => "GBP",
        }
    }

    /// Format an amount with symbol, thousands separators and two decimals.
    #[must_use]
    pub fn format(self, amount: Decimal) -> String {
        let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let text = format!("{:.2}", rounded.abs());
        let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
        for (i, ch) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        let sign = if negative { "-" } else { "" };
        format!("{sign}{}{grouped}.{frac}", self.symbol())
    }
}

impl std::str::FromStr for CurrencyCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NGN" => Ok(Self::NGN),
            "USD" => Ok(Self::USD),
            "EUR" => Ok(Self::EUR),
            "GBP" => Ok(Self::GBP),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_groups_thousands() {
        let amount = Decimal::new(125_000_000, 2);
        assert_eq!(CurrencyCode::NGN.format(amount), "₦1,250,000.00");
    }

    #[test]
    fn test_format_small_amounts() {
        assert_eq!(CurrencyCode::USD.format(Decimal::new(5, 1)), "$0.50");
        assert_eq!(CurrencyCode::GBP.format(Decimal::new(999, 0)), "£999.00");
    }

    #[test]
    fn test_format_rounds_to_cents() {
        assert_eq!(CurrencyCode::EUR.format(Decimal::new(12_345, 3)), "€12.35");
    }

    #[test]
    fn test_format_negative() {
        assert_eq!(CurrencyCode::NGN.format(Decimal::new(-150_000, 2)), "-₦1,500.00");
    }

    #[test]
    fn test_currency_from_str() {
        assert_eq!("ngn".parse::<CurrencyCode>(), Ok(CurrencyCode::NGN));
        assert!("XYZ".parse::<CurrencyCode>().is_err());
    }

    #[test]
    fn test_price_display() {
        let price = Price::new(Decimal::new(2500, 0), CurrencyCode::NGN);
        assert_eq!(price.to_string(), "₦2,500.00");
    }
}
