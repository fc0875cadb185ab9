// openmarket/src/display.rs

//! Render-time conversions. Amounts stay integers everywhere else.

/// Smallest units per HBAR.
pub const UNITS_PER_HBAR: u64 = 100_000_000;
const DISPLAY_DECIMALS: u32 = 3;

/// Formats a smallest-unit amount as HBAR with three decimals, rounding half
/// up: `123_456_789` renders as `"1.235 HBAR"`.
pub fn format_amount(amount: u64) -> String {
  let step = u128::from(UNITS_PER_HBAR) / 10u128.pow(DISPLAY_DECIMALS);
  let scaled = (u128::from(amount) + step / 2) / step;
  let divisor = 10u128.pow(DISPLAY_DECIMALS);
  format!(
    "{}.{:0width$} HBAR",
    scaled / divisor,
    scaled % divisor,
    width = DISPLAY_DECIMALS as usize
  )
}

/// Gateway URL for an image CID.
pub fn image_url(gateway_url: &str, cid: &str) -> String {
  format!("{}/{}", gateway_url.trim_end_matches('/'), cid.trim())
}
