use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The forward horizon of a forward-return heatmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ForwardPeriod {
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    ThreeYears,
    FourYears,
}

impl ForwardPeriod {
    pub const ALL: [ForwardPeriod; 7] = [
        ForwardPeriod::OneMonth,
        ForwardPeriod::ThreeMonths,
        ForwardPeriod::SixMonths,
        ForwardPeriod::OneYear,
        ForwardPeriod::TwoYears,
        ForwardPeriod::ThreeYears,
        ForwardPeriod::FourYears,
    ];

    /// Number of monthly buckets between the current bucket and the target one.
    pub fn months(&self) -> usize {
        match self {
            ForwardPeriod::OneMonth => 1,
            ForwardPeriod::ThreeMonths => 3,
            ForwardPeriod::SixMonths => 6,
            ForwardPeriod::OneYear => 12,
            ForwardPeriod::TwoYears => 24,
            ForwardPeriod::ThreeYears => 36,
            ForwardPeriod::FourYears => 48,
        }
    }

    /// The wire token, e.g. `"1Y"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ForwardPeriod::OneMonth => "1M",
            ForwardPeriod::ThreeMonths => "3M",
            ForwardPeriod::SixMonths => "6M",
            ForwardPeriod::OneYear => "1Y",
            ForwardPeriod::TwoYears => "2Y",
            ForwardPeriod::ThreeYears => "3Y",
            ForwardPeriod::FourYears => "4Y",
        }
    }
}

impl FromStr for ForwardPeriod {
    type Err = CoreError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        ForwardPeriod::ALL
            .into_iter()
            .find(|period| period.as_str() == token)
            .ok_or_else(|| CoreError::InvalidPeriod(token.to_string()))
    }
}

impl TryFrom<String> for ForwardPeriod {
    type Error = CoreError;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        token.parse()
    }
}

impl From<ForwardPeriod> for String {
    fn from(period: ForwardPeriod) -> Self {
        period.as_str().to_string()
    }
}

impl fmt::Display for ForwardPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
