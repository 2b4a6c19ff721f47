//! Reverse geocoding.
//!
//! [`ReverseGeocoder`] turns coordinates into an [`Address`](crate::location::Address)
//! off the caller's task. The three outcomes stay distinct all the way to
//! the sink even though the user only ever sees an address or the
//! [`ADDRESS_UNAVAILABLE`] fallback.

mod format;
mod nominatim;
mod types;
mod worker;

pub use format::{display_text, format_address, ADDRESS_UNAVAILABLE};
pub use nominatim::{
    NominatimConfig, NominatimGeocoder, DEFAULT_GEOCODER_TIMEOUT, DEFAULT_NOMINATIM_URL,
    DEFAULT_USER_AGENT,
};
pub use types::{
    AddressReport, Connectivity, GeocodeError, GeocodeOutcome, GeocodeRequestId, GeocodingService,
    MAX_RESULTS,
};
pub use worker::ReverseGeocoder;
