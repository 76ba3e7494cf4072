//! Timezone resolution for occurrence-time expansion.

mod timezone;

pub use timezone::{
    ConversionError, TimeZoneResolver, TzLookup, convert_to_utc, convert_to_utc_lenient,
};
