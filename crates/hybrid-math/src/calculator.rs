use analysis_core::{Bar, Bias, SignalError, TradeSignal};

use crate::config::HybridMathConfig;
use crate::session::display_name;

/// The Hybrid Math calculator: two consecutive bars in, one trade plan out.
///
/// Net change decides the bias, CV is the pivot for every level:
/// - TP = CV ± |net change| in the direction of the bias
/// - entry 1 is the prior bar's extreme on the opposite side, entry 2 is CV itself
/// - the tight stop sits `max(|net change| - buffer, buffer)` against the bias,
///   the wide stop at the prior bar's extreme
#[derive(Debug, Clone, Default)]
pub struct HybridMathCalculator {
    config: HybridMathConfig,
}

impl HybridMathCalculator {
    pub fn new(config: HybridMathConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HybridMathConfig {
        &self.config
    }

    /// Compute from a bar series, using its last two entries.
    pub fn compute_latest(&self, symbol: &str, bars: &[Bar]) -> Result<TradeSignal, SignalError> {
        if bars.len() < 2 {
            return Err(SignalError::InsufficientData(format!(
                "Need at least 2 bars for {}, got {}",
                symbol,
                bars.len()
            )));
        }
        let n = bars.len();
        self.compute(symbol, &bars[n - 2], &bars[n - 1])
    }

    pub fn compute(&self, symbol: &str, prior: &Bar, current: &Bar) -> Result<TradeSignal, SignalError> {
        validate_bar("prior", prior)?;
        validate_bar("current", current)?;

        let current_value = current.close;
        let previous_close = prior.close;
        let net_change = current_value - previous_close;
        let change_pct = net_change / previous_close * 100.0;
        let move_size = net_change.abs();

        // "Not greater than zero" is short, including the flat case.
        let bias = if net_change > 0.0 { Bias::Long } else { Bias::Short };

        let day_high = prior.high.max(current.high);
        let day_low = prior.low.min(current.low);
        let cv_position = cv_position(current_value, day_low, day_high);

        let take_profit = current_value + bias.sign() * move_size;

        let entry1 = match bias {
            Bias::Long => prior.low,
            Bias::Short => prior.high,
        };
        let entry2 = current_value;

        let buffer = self.config.stop_buffer;
        let tight_offset = (move_size - buffer).max(buffer);
        let stop_loss_tight = current_value - bias.sign() * tight_offset;

        // The wide stop never sits inside the tight one.
        let stop_loss_wide = match bias {
            Bias::Long => prior.low.min(stop_loss_tight),
            Bias::Short => prior.high.max(stop_loss_tight),
        };

        let raw_confidence = self.raw_confidence(cv_position, change_pct);

        tracing::debug!(
            "{} hybrid math: {} CV={:.2} net={:+.2} cv_pos={:.2} raw={:.0}",
            symbol,
            bias,
            current_value,
            net_change,
            cv_position,
            raw_confidence
        );

        Ok(TradeSignal {
            symbol: symbol.to_string(),
            display_name: display_name(symbol).to_string(),
            bias,
            current_value,
            previous_close,
            net_change,
            change_pct,
            day_high,
            day_low,
            entry1,
            entry2,
            take_profit,
            stop_loss_tight,
            stop_loss_wide,
            cv_position,
            raw_confidence,
        })
    }

    /// Base confidence from where CV sits in the session range, nudged up for
    /// significant moves.
    pub fn raw_confidence(&self, cv_position: f64, change_pct: f64) -> f64 {
        let c = &self.config;
        let near_extreme =
            cv_position <= c.extreme_zone || cv_position >= 1.0 - c.extreme_zone;
        let mut confidence = if near_extreme {
            c.extreme_confidence
        } else {
            c.middle_confidence
        };

        let move_pct = change_pct.abs();
        if move_pct > c.strong_move_pct {
            confidence += c.strong_move_bonus;
        } else if move_pct > c.moderate_move_pct {
            confidence += c.moderate_move_bonus;
        }

        confidence.clamp(0.0, 100.0)
    }
}

/// Where `value` sits between `low` and `high`, clamped to [0, 1]. A flat range is 0.5.
pub fn cv_position(value: f64, low: f64, high: f64) -> f64 {
    let range = high - low;
    if range <= 0.0 {
        return 0.5;
    }
    ((value - low) / range).clamp(0.0, 1.0)
}

fn validate_bar(label: &str, bar: &Bar) -> Result<(), SignalError> {
    let fields = [
        ("open", bar.open),
        ("high", bar.high),
        ("low", bar.low),
        ("close", bar.close),
    ];
    for (name, value) in fields {
        if !value.is_finite() || value <= 0.0 {
            return Err(SignalError::InsufficientData(format!(
                "{} bar has invalid {}: {}",
                label, name, value
            )));
        }
    }
    if bar.high < bar.low {
        return Err(SignalError::InsufficientData(format!(
            "{} bar high {} is below low {}",
            label, bar.high, bar.low
        )));
    }
    Ok(())
}
