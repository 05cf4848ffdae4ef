//! Request-parameter enums that control query shape.

/// Truncation unit used to bucket timestamps in chart and retention queries.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Granularity {
    /// Calendar day
    Day,
    /// Calendar week, starting Monday
    Week,
    /// Calendar month
    Month,
}

impl Granularity {
    /// Parse a `timeframe` query parameter. Returns `None` for anything
    /// outside `day`, `week`, `month`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            _ => None,
        }
    }

    /// Canonical lowercase name, as accepted by [`Self::parse`].
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// `ClickHouse` expression truncating `col` to the start of this period.
    /// Weeks truncate to Monday, matching `date_trunc('week', ..)` upstream.
    pub fn trunc_expr(&self, col: &str) -> String {
        match self {
            Self::Day => format!("toStartOfDay({col})"),
            Self::Week => format!("toStartOfWeek({col}, 1)"),
            Self::Month => format!("toStartOfMonth({col})"),
        }
    }

    /// `ClickHouse` interval unit for window arithmetic.
    pub const fn interval_unit(&self) -> &'static str {
        match self {
            Self::Day => "DAY",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
        }
    }

    /// Default retention lookback window, in periods. Policy constants, not
    /// derived values.
    pub const fn default_lookback(&self) -> u32 {
        match self {
            Self::Day => 14,
            Self::Week => 12,
            Self::Month => 6,
        }
    }
}

/// Chain selector for per-chain filtering. `All` leaves queries unfiltered.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Chain {
    All,
    Ethereum,
    Polygon,
    Optimism,
    Arbitrum,
    Base,
    Avalanche,
}

impl Chain {
    /// All chains a caller may select, including `all`.
    pub const VALUES: [Self; 7] = [
        Self::All,
        Self::Ethereum,
        Self::Polygon,
        Self::Optimism,
        Self::Arbitrum,
        Self::Base,
        Self::Avalanche,
    ];

    /// Parse a `chain` query parameter.
    pub fn parse(s: &str) -> Option<Self> {
        Self::VALUES.into_iter().find(|c| c.as_str() == s)
    }

    /// Canonical lowercase name, equal to the `chain` column value.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Ethereum => "ethereum",
            Self::Polygon => "polygon",
            Self::Optimism => "optimism",
            Self::Arbitrum => "arbitrum",
            Self::Base => "base",
            Self::Avalanche => "avalanche",
        }
    }

    /// `AND chain = '..'` fragment for queries that already have a WHERE
    /// clause. Empty for [`Self::All`]. Safe to interpolate: the value comes
    /// from the enum, never from the request.
    pub fn and_filter(&self) -> String {
        match self {
            Self::All => String::new(),
            _ => format!(" AND chain = '{}'", self.as_str()),
        }
    }

    /// Standalone `WHERE chain = '..'` clause, empty for [`Self::All`].
    pub fn where_filter(&self) -> String {
        match self {
            Self::All => String::new(),
            _ => format!(" WHERE chain = '{}'", self.as_str()),
        }
    }

    /// [`Self::and_filter`] with a table alias prefix.
    pub fn and_filter_aliased(&self, alias: &str) -> String {
        match self {
            Self::All => String::new(),
            _ => format!(" AND {alias}.chain = '{}'", self.as_str()),
        }
    }

    /// [`Self::where_filter`] with a table alias prefix.
    pub fn where_filter_aliased(&self, alias: &str) -> String {
        match self {
            Self::All => String::new(),
            _ => format!(" WHERE {alias}.chain = '{}'", self.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_granularities() {
        assert_eq!(Granularity::parse("week"), Some(Granularity::Week));
        assert_eq!(Granularity::parse("fortnight"), None);
        assert_eq!(Granularity::parse("Day"), None);
    }

    #[test]
    fn lookback_defaults_per_granularity() {
        assert_eq!(Granularity::Day.default_lookback(), 14);
        assert_eq!(Granularity::Week.default_lookback(), 12);
        assert_eq!(Granularity::Month.default_lookback(), 6);
    }

    #[test]
    fn week_truncation_starts_monday() {
        assert_eq!(Granularity::Week.trunc_expr("block_time"), "toStartOfWeek(block_time, 1)");
    }

    #[test]
    fn chain_round_trips() {
        for chain in Chain::VALUES {
            assert_eq!(Chain::parse(chain.as_str()), Some(chain));
        }
        assert_eq!(Chain::parse("solana"), None);
    }

    #[test]
    fn all_chain_has_no_filter() {
        assert!(Chain::All.and_filter().is_empty());
        assert_eq!(Chain::Base.and_filter(), " AND chain = 'base'");
        assert_eq!(Chain::Base.where_filter(), " WHERE chain = 'base'");
    }
}
