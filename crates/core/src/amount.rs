use std::{fmt, str::FromStr};

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::Error;

/// Number of fractional digits between the display unit and the base unit.
pub const DECIMALS: u32 = 8;

/// 1 display unit = 10^8 base units.
pub const BASE_UNITS_PER_DISPLAY_UNIT: u64 = 100_000_000;

/// Symbol shown next to display-unit amounts.
pub const DISPLAY_UNIT: &str = "APT";

/// A strictly positive donation, held in base units.
///
/// Input is parsed as an exact decimal, so `"2.5"` is exactly `250000000` and no binary floating
/// point is involved at any step. Digits beyond the eighth decimal are rounded half-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DonationAmount(u64);

impl DonationAmount {
    pub fn from_base_units(base_units: u64) -> Option<Self> {
        (base_units > 0).then_some(Self(base_units))
    }

    pub fn base_units(&self) -> u64 {
        self.0
    }
}

impl FromStr for DonationAmount {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidAmount(input.to_string());

        // plain digits and one optional point; no sign, exponent or separators
        let s = input.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
            return Err(invalid());
        }
        let s = s.strip_suffix('.').unwrap_or(s);
        let s = if s.starts_with('.') {
            format!("0{s}")
        } else {
            s.to_string()
        };

        let mut amount = Decimal::from_str_exact(&s)
            .map_err(|_| invalid())?
            .round_dp_with_strategy(DECIMALS, RoundingStrategy::MidpointAwayFromZero);
        if amount.is_sign_negative() || amount.is_zero() {
            return Err(invalid());
        }
        amount.rescale(DECIMALS);

        u64::try_from(amount.mantissa())
            .ok()
            .and_then(Self::from_base_units)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for DonationAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_base_units(self.0))
    }
}

/// Renders a base-unit quantity in display units without trailing zeros, e.g. `250000000` as
/// `"2.5"`.
pub fn format_base_units(base_units: u64) -> String {
    Decimal::from_i128_with_scale(i128::from(base_units), DECIMALS)
        .normalize()
        .to_string()
}
