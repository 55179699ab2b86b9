use analysis_core::{Bar, Bias, SignalError};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::calculator::{cv_position, HybridMathCalculator};

/// Helper: bar with the given OHLC values.
fn bar(open: f64, high: f64, low: f64, close: f64) -> Bar {
    Bar::new(Utc::now(), open, high, low, close)
}

/// Helper: bar whose OHLC collapse onto `close` except for a small range around it.
fn bar_at(close: f64) -> Bar {
    bar(close, close + 1.0, close - 1.0, close)
}

#[test]
fn test_up_move_is_long() {
    let calc = HybridMathCalculator::default();
    let signal = calc.compute("US30", &bar_at(100.0), &bar_at(105.0)).unwrap();

    assert_eq!(signal.bias, Bias::Long);
    assert_eq!(signal.net_change, 5.0);
    assert_eq!(signal.take_profit, 110.0);
    assert_eq!(signal.current_value, 105.0);
    assert_eq!(signal.previous_close, 100.0);
    assert_eq!(signal.entry1, 99.0); // prior low
    assert_eq!(signal.entry2, 105.0);
    assert_eq!(signal.stop_loss_tight, 102.0); // CV - (5 - 2)
    assert_eq!(signal.stop_loss_wide, 99.0);
}

#[test]
fn test_flat_close_is_short() {
    let calc = HybridMathCalculator::default();
    let signal = calc.compute("US30", &bar_at(100.0), &bar_at(100.0)).unwrap();

    assert_eq!(signal.bias, Bias::Short);
    assert_eq!(signal.net_change, 0.0);
    assert_eq!(signal.take_profit, 100.0);
    assert!(signal.stop_loss_tight > signal.current_value);
    assert!(signal.stop_loss_wide > signal.current_value);
}

#[test]
fn test_down_move_levels() {
    let calc = HybridMathCalculator::default();
    let prior = bar(44_600.0, 44_700.0, 44_400.0, 44_650.0);
    let current = bar(44_640.0, 44_660.0, 44_380.0, 44_450.0);
    let signal = calc.compute("^DJI", &prior, &current).unwrap();

    assert_eq!(signal.bias, Bias::Short);
    assert_eq!(signal.display_name, "US30");
    assert_eq!(signal.take_profit, 44_250.0);
    assert_eq!(signal.entry1, 44_700.0);
    assert_eq!(signal.stop_loss_tight, 44_648.0);
    assert_eq!(signal.stop_loss_wide, 44_700.0);
    assert_eq!(signal.day_high, 44_700.0);
    assert_eq!(signal.day_low, 44_380.0);
}

#[test]
fn test_flat_session_cv_position_is_half() {
    let calc = HybridMathCalculator::default();
    let flat = bar(50.0, 50.0, 50.0, 50.0);
    let signal = calc.compute("FLAT", &flat, &flat).unwrap();

    assert_eq!(signal.cv_position, 0.5);
    assert!(signal.cv_position.is_finite());
    assert_eq!(cv_position(10.0, 10.0, 10.0), 0.5);
}

#[test]
fn test_cv_position_is_clamped() {
    assert_eq!(cv_position(120.0, 100.0, 110.0), 1.0);
    assert_eq!(cv_position(90.0, 100.0, 110.0), 0.0);
    assert!((cv_position(105.0, 100.0, 110.0) - 0.5).abs() < 1e-12);
}

#[test]
fn test_invalid_bars_are_rejected() {
    let calc = HybridMathCalculator::default();
    let good = bar_at(100.0);

    let zero = bar(0.0, 1.0, 0.0, 0.5);
    assert!(matches!(
        calc.compute("X", &zero, &good),
        Err(SignalError::InsufficientData(_))
    ));

    let nan = bar(100.0, f64::NAN, 99.0, 100.0);
    assert!(matches!(
        calc.compute("X", &good, &nan),
        Err(SignalError::InsufficientData(_))
    ));

    let inverted = bar(100.0, 99.0, 101.0, 100.0);
    assert!(calc.compute("X", &good, &inverted).is_err());

    let negative = bar(-5.0, 1.0, -6.0, -5.0);
    assert!(calc.compute("X", &negative, &good).is_err());
}

#[test]
fn test_open_or_close_outside_range_is_accepted() {
    let calc = HybridMathCalculator::default();

    // Feeds sometimes report an open gapped beyond the bar's own range.
    let gapped = bar(106.0, 105.5, 104.0, 105.0);
    let signal = calc.compute("X", &bar_at(100.0), &gapped).unwrap();
    assert_eq!(signal.bias, Bias::Long);
    assert_eq!(signal.take_profit, 110.0);

    let close_above_high = bar(104.5, 105.0, 104.0, 105.5);
    let signal = calc.compute("X", &bar_at(100.0), &close_above_high).unwrap();
    assert_eq!(signal.cv_position, 1.0);
}

#[test]
fn test_missing_bars_are_rejected() {
    let calc = HybridMathCalculator::default();
    assert!(matches!(
        calc.compute_latest("X", &[bar_at(100.0)]),
        Err(SignalError::InsufficientData(_))
    ));

    let bars = vec![bar_at(90.0), bar_at(100.0), bar_at(103.0)];
    let signal = calc.compute_latest("X", &bars).unwrap();
    assert_eq!(signal.previous_close, 100.0);
    assert_eq!(signal.current_value, 103.0);
}

#[test]
fn test_raw_confidence_extremes_and_moves() {
    let calc = HybridMathCalculator::default();
    assert_eq!(calc.raw_confidence(0.1, 0.0), 80.0);
    assert_eq!(calc.raw_confidence(0.9, 0.0), 80.0);
    assert_eq!(calc.raw_confidence(0.5, 0.0), 65.0);
    assert_eq!(calc.raw_confidence(0.5, 0.7), 67.0);
    assert_eq!(calc.raw_confidence(0.95, -1.5), 85.0);
}

#[test]
fn test_tiny_long_move_keeps_wide_stop_outside_tight() {
    let calc = HybridMathCalculator::default();
    // Move of 0.5 with a prior low only 0.75 below CV: tight stop at CV - 2.
    let prior = bar(100.0, 100.2, 99.75, 100.0);
    let current = bar(100.0, 100.6, 100.0, 100.5);
    let signal = calc.compute("X", &prior, &current).unwrap();

    assert_eq!(signal.bias, Bias::Long);
    assert_eq!(signal.stop_loss_tight, 98.5);
    assert_eq!(signal.stop_loss_wide, 98.5);
}

/// Random but valid bar with prices on a cent grid.
fn random_bar(rng: &mut StdRng) -> Bar {
    let cents = |v: f64| (v * 100.0).round() / 100.0;
    let low = cents(rng.gen_range(1.0..50_000.0));
    let high = cents(low + rng.gen_range(0.0..500.0));
    let open = cents(rng.gen_range(low..=high)).clamp(low, high);
    let close = cents(rng.gen_range(low..=high)).clamp(low, high);
    bar(open, high, low, close)
}

#[test]
fn test_property_bias_and_side_of_cv() {
    let calc = HybridMathCalculator::default();
    let mut rng = StdRng::seed_from_u64(0x5EED);

    for _ in 0..5_000 {
        let prior = random_bar(&mut rng);
        // Some cases reuse the prior close to exercise the flat tie-break.
        let current = if rng.gen_bool(0.1) {
            let c = prior.close;
            bar(c, c + 1.0, (c - 1.0).max(0.01), c)
        } else {
            random_bar(&mut rng)
        };

        let signal = calc.compute("PROP", &prior, &current).unwrap();
        let cv = signal.current_value;
        let net = current.close - prior.close;

        assert_eq!(signal.bias == Bias::Long, net > 0.0);
        assert!((0.0..=1.0).contains(&signal.cv_position));
        assert!((0.0..=100.0).contains(&signal.raw_confidence));

        match signal.bias {
            Bias::Long => {
                assert!(signal.take_profit > cv, "TP {} <= CV {}", signal.take_profit, cv);
                assert!(signal.entry1 < cv);
                assert!(signal.stop_loss_tight < cv);
                assert!(signal.stop_loss_wide < cv);
                assert!(signal.stop_loss_wide <= signal.stop_loss_tight);
            }
            Bias::Short => {
                if net < 0.0 {
                    assert!(signal.take_profit < cv, "TP {} >= CV {}", signal.take_profit, cv);
                } else {
                    assert_eq!(signal.take_profit, cv);
                }
                assert!(signal.entry1 >= cv);
                assert!(signal.stop_loss_tight > cv);
                assert!(signal.stop_loss_wide > cv);
                assert!(signal.stop_loss_wide >= signal.stop_loss_tight);
            }
        }
    }
}
