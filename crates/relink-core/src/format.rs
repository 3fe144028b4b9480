//! Power display formatting.
//!
//! Energy is denominated in milliwatts; the display ladder steps from
//! watts up through exawatts. Float conversion here is display-only and
//! never feeds back into game state.

/// Suffix ladder, largest divider first. Dividers are relative to mW.
const RANGES: [(f64, &str); 7] = [
    (1e21, "EW"),
    (1e18, "PW"),
    (1e15, "TW"),
    (1e12, "GW"),
    (1e9, "MW"),
    (1e6, "kW"),
    (1e3, "W"),
];

/// Render a milliwatt amount with the largest suffix it reaches.
/// Values under one watt render as plain `mW`.
pub fn format_power(mw: u64) -> String {
    let n = mw as f64;
    for (divider, suffix) in RANGES {
        if n >= divider {
            return format!("{}{}", n / divider, suffix);
        }
    }
    format!("{mw}mW")
}
