//! The closed set of letter-pair contrasts taught by the app.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A pair of letters whose sounds early readers commonly confuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PhoneticPair {
    #[serde(rename = "F-V")]
    FV,
    #[serde(rename = "M-N")]
    MN,
    #[serde(rename = "P-B")]
    PB,
    #[serde(rename = "T-D")]
    TD,
    #[serde(rename = "R-RR")]
    RRr,
    #[serde(rename = "S-SS")]
    SSs,
}

impl PhoneticPair {
    /// Every pair, in the order the landing screen shows them.
    pub const ALL: [PhoneticPair; 6] = [
        PhoneticPair::FV,
        PhoneticPair::MN,
        PhoneticPair::PB,
        PhoneticPair::TD,
        PhoneticPair::RRr,
        PhoneticPair::SSs,
    ];

    /// Display label, e.g. `"F-V"`.
    pub fn label(self) -> &'static str {
        match self {
            PhoneticPair::FV => "F-V",
            PhoneticPair::MN => "M-N",
            PhoneticPair::PB => "P-B",
            PhoneticPair::TD => "T-D",
            PhoneticPair::RRr => "R-RR",
            PhoneticPair::SSs => "S-SS",
        }
    }

    /// The two contrasted spellings.
    pub fn letters(self) -> [&'static str; 2] {
        match self {
            PhoneticPair::FV => ["F", "V"],
            PhoneticPair::MN => ["M", "N"],
            PhoneticPair::PB => ["P", "B"],
            PhoneticPair::TD => ["T", "D"],
            PhoneticPair::RRr => ["R", "RR"],
            PhoneticPair::SSs => ["S", "SS"],
        }
    }

    /// Letters joined for prompts: `"F e V"`.
    pub fn spoken_letters(self) -> String {
        self.letters().join(" e ")
    }

    /// Emoji shown on the landing card.
    pub fn emoji(self) -> &'static str {
        match self {
            PhoneticPair::FV => "🧚🐮",
            PhoneticPair::MN => "🐒⛵",
            PhoneticPair::PB => "🦆🎈",
            PhoneticPair::TD => "🐢🎲",
            PhoneticPair::RRr => "🐭🚗",
            PhoneticPair::SSs => "🐸🐦",
        }
    }
}

impl fmt::Display for PhoneticPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown letter pair: {0:?}")]
pub struct UnknownPair(pub String);

impl FromStr for PhoneticPair {
    type Err = UnknownPair;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        PhoneticPair::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPair(s.to_string()))
    }
}
