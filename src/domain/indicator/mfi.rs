//! MFI (Money Flow Index) indicator implementation.
//!
//! typical = (high + low + close) / 3
//! raw flow = typical * volume
//!
//! From the second bar on, a bar is Positive when its typical price is
//! strictly above the previous one, Negative when strictly below, Flat
//! otherwise. Flat bars add to neither sum. The first bar has no direction.
//!
//! MFI(n)[i] = 100 - 100 / (1 + pos_sum / neg_sum) over bars i-n+1..=i
//!
//! Warmup: first (n-1) bars are missing. When neg_sum == 0 the ratio is
//! undefined and the value is missing rather than 100.

use crate::domain::indicator::{usable, FlowDirection};
use crate::domain::price_bar::PriceBar;

/// Direction of each bar against the last usable bar before it.
pub fn flow_directions(bars: &[PriceBar]) -> Vec<Option<FlowDirection>> {
    let mut directions = Vec::with_capacity(bars.len());
    let mut prev_typical: Option<f64> = None;

    for bar in bars {
        if !usable(bar) {
            directions.push(None);
            continue;
        }

        let typical = bar.typical_price();
        let direction = prev_typical.map(|prev| {
            if typical > prev {
                FlowDirection::Positive
            } else if typical < prev {
                FlowDirection::Negative
            } else {
                FlowDirection::Flat
            }
        });
        directions.push(direction);
        prev_typical = Some(typical);
    }

    directions
}

pub fn calculate_mfi(bars: &[PriceBar], period: usize) -> Vec<Option<f64>> {
    if period == 0 {
        return vec![None; bars.len()];
    }

    let directions = flow_directions(bars);
    let mut values = Vec::with_capacity(bars.len());

    for i in 0..bars.len() {
        if i + 1 < period || !usable(&bars[i]) {
            values.push(None);
            continue;
        }

        let mut positive = 0.0;
        let mut negative = 0.0;

        for j in i + 1 - period..=i {
            let flow = bars[j].typical_price() * bars[j].volume;
            match directions[j] {
                Some(FlowDirection::Positive) => positive += flow,
                Some(FlowDirection::Negative) => negative += flow,
                Some(FlowDirection::Flat) | None => {}
            }
        }

        if negative == 0.0 {
            values.push(None);
        } else {
            values.push(Some(100.0 - 100.0 / (1.0 + positive / negative)));
        }
    }

    values
}

pub const OVERBOUGHT: f64 = 80.0;
pub const OVERSOLD: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MfiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl MfiZone {
    pub fn classify(mfi: f64) -> Self {
        if mfi > OVERBOUGHT {
            MfiZone::Overbought
        } else if mfi < OVERSOLD {
            MfiZone::Oversold
        } else {
            MfiZone::Neutral
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MfiZone::Overbought => "overbought",
            MfiZone::Oversold => "oversold",
            MfiZone::Neutral => "neutral",
        }
    }
}
