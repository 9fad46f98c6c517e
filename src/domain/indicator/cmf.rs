//! CMF (Chaikin Money Flow) indicator implementation.
//!
//! mult = ((close - low) - (high - close)) / (high - low), 0 when high == low
//! mfv  = mult * volume
//! CMF(n)[i] = sum(mfv[i-n+1..=i]) / sum(volume[i-n+1..=i])
//!
//! Warmup: first (n-1) bars are missing. A window whose volume sum is zero,
//! or whose bars all have high == low, is missing too.

use crate::domain::indicator::usable;
use crate::domain::price_bar::PriceBar;

pub fn calculate_cmf(bars: &[PriceBar], window: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; bars.len()];
    }

    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        if i + 1 < window || !usable(&bars[i]) {
            values.push(None);
            continue;
        }

        let mut flow_volume = 0.0;
        let mut volume = 0.0;
        let mut any_range = false;

        for bar in bars[i + 1 - window..=i].iter().filter(|b| usable(b)) {
            flow_volume += bar.money_flow_multiplier() * bar.volume;
            volume += bar.volume;
            any_range |= bar.high != bar.low;
        }

        if !any_range || volume == 0.0 {
            values.push(None);
        } else {
            values.push(Some(flow_volume / volume));
        }
    }

    values
}
