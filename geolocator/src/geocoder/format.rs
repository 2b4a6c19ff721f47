//! Display formatting for geocoded addresses.

use super::types::GeocodeOutcome;
use crate::location::{non_blank, Address};

/// Shown when a lookup produced no address, whatever the reason.
pub const ADDRESS_UNAVAILABLE: &str = "Address not available";

/// Join every address line, then postal code, locality and country.
///
/// Blank parts are skipped.
pub fn format_address(address: &Address) -> String {
    let lines = address
        .lines
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty());

    let trailing = [
        non_blank(&address.postal_code),
        non_blank(&address.locality),
        non_blank(&address.country),
    ];

    lines
        .chain(trailing.into_iter().flatten())
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn display_text(outcome: &GeocodeOutcome) -> String {
    match outcome {
        GeocodeOutcome::Found(address) => format_address(address),
        GeocodeOutcome::NotFound | GeocodeOutcome::LookupFailed(_) => {
            ADDRESS_UNAVAILABLE.to_string()
        }
    }
}
