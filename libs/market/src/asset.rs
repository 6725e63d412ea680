use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::MarketError;

/// Tracked coins. Each maps to one backing table (and its change channel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Asset {
    Btc,
    Eth,
    Sol,
    Xrp,
}

impl Asset {
    pub const ALL: [Asset; 4] = [Asset::Btc, Asset::Eth, Asset::Sol, Asset::Xrp];

    pub fn symbol(&self) -> &'static str {
        match self {
            Asset::Btc => "BTC",
            Asset::Eth => "ETH",
            Asset::Sol => "SOL",
            Asset::Xrp => "XRP",
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            Asset::Btc => "bitcoin_data",
            Asset::Eth => "ethereum_data",
            Asset::Sol => "solana_data",
            Asset::Xrp => "xrp_data",
        }
    }

    /// Realtime channel name for the backing table.
    pub fn channel(&self) -> String {
        format!("{}_changes", self.table())
    }

    /// Coin id on the public market-data API.
    pub fn coingecko_id(&self) -> &'static str {
        match self {
            Asset::Btc => "bitcoin",
            Asset::Eth => "ethereum",
            Asset::Sol => "solana",
            Asset::Xrp => "ripple",
        }
    }

    /// Rough price anchor used by the synthetic fallback.
    pub(crate) fn reference_price(&self) -> f64 {
        match self {
            Asset::Btc => 45_000.0,
            Asset::Eth => 3_450.0,
            Asset::Sol => 145.0,
            Asset::Xrp => 0.62,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Asset {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BTC" => Ok(Asset::Btc),
            "ETH" => Ok(Asset::Eth),
            "SOL" => Ok(Asset::Sol),
            "XRP" => Ok(Asset::Xrp),
            other => Err(MarketError::InvalidConfig(format!("unknown asset {other:?}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_symbols_case_insensitively() {
        assert_eq!(" eth ".parse::<Asset>().unwrap(), Asset::Eth);
        assert_eq!("xrp".parse::<Asset>().unwrap(), Asset::Xrp);
        assert!("DOGE".parse::<Asset>().is_err());
    }

    #[test]
    fn tables_are_distinct() {
        let mut tables: Vec<_> = Asset::ALL.iter().map(|a| a.table()).collect();
        tables.sort();
        tables.dedup();
        assert_eq!(tables.len(), Asset::ALL.len());
        assert_eq!(Asset::Btc.channel(), "bitcoin_data_changes");
    }
}
