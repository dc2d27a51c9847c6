//! Action decision: ordered rule set + position state → at most one action.

use crate::models::strategy::{RuleAction, StrategyRule};

use super::rules::{self, BarWindow};

/// A concrete trading decision for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Buy,
    Sell,
}

/// Decide the action for the current bar.
///
/// With user rules (already sorted by ascending order at decode time), only
/// the side matching the position state is considered — buy rules when flat,
/// sell rules when holding — and the first matching rule wins; the rest are
/// not evaluated. With no rules, the built-in SMA/RSI default strategy
/// applies. The stop-loss/take-profit overlay is not decided here; the
/// simulator applies it on top of whatever this returns.
pub fn decide(rules: &[StrategyRule], window: &BarWindow, holding: bool) -> Option<Action> {
    if rules.is_empty() {
        return decide_default(window, holding);
    }

    for rule in rules {
        let eligible = match rule.action {
            RuleAction::Buy => !holding,
            RuleAction::Sell => holding,
        };
        if !eligible {
            continue;
        }
        if rules::evaluate(&rule.condition, window) {
            return Some(match rule.action {
                RuleAction::Buy => Action::Buy,
                RuleAction::Sell => Action::Sell,
            });
        }
    }
    None
}

/// Built-in default strategy: buy when the fast SMA sits above a positive
/// slow SMA with RSI above 50, sell on the death cross (fast below slow).
fn decide_default(window: &BarWindow, holding: bool) -> Option<Action> {
    let fast = window.current.sma_fast();
    let slow = window.current.sma_slow();
    let rsi = window.current.rsi_default();
    if fast.is_nan() || slow.is_nan() || rsi.is_nan() {
        return None;
    }

    if !holding {
        (slow > 0.0 && fast > slow && rsi > 50.0).then_some(Action::Buy)
    } else {
        (fast < slow).then_some(Action::Sell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::indicators::compute_table;
    use crate::models::bar::PriceBar;
    use crate::models::strategy::{
        Condition, Operand, Operator, PriceField, StrategyRule,
    };

    fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                timestamp: 1_700_000_000 + i as i64 * 86_400,
                open: close,
                high: close + 1.0,
                low: close - 1.0,
                close,
            })
            .collect()
    }

    fn rule(order: i64, action: RuleAction, threshold: f64, operator: Operator) -> StrategyRule {
        StrategyRule {
            order,
            action,
            condition: Condition {
                left: Operand::Price(PriceField::Close),
                operator,
                right: Operand::Literal(threshold),
            },
        }
    }

    #[test]
    fn first_matching_rule_wins() {
        let bars = make_bars(&[100.0]);
        let table = compute_table(&bars, &[]);
        let window = BarWindow::at(&bars, &table, 0);
        // Both buy rules match at close=100; the lower order decides.
        let rules = vec![
            rule(1, RuleAction::Buy, 50.0, Operator::GreaterThan),
            rule(2, RuleAction::Buy, 60.0, Operator::GreaterThan),
        ];
        assert_eq!(decide(&rules, &window, false), Some(Action::Buy));
    }

    #[test]
    fn only_buy_rules_considered_when_flat() {
        let bars = make_bars(&[100.0]);
        let table = compute_table(&bars, &[]);
        let window = BarWindow::at(&bars, &table, 0);
        // A sell rule that would match is ignored while flat.
        let rules = vec![rule(1, RuleAction::Sell, 50.0, Operator::GreaterThan)];
        assert_eq!(decide(&rules, &window, false), None);
    }

    #[test]
    fn only_sell_rules_considered_when_holding() {
        let bars = make_bars(&[100.0]);
        let table = compute_table(&bars, &[]);
        let window = BarWindow::at(&bars, &table, 0);
        let rules = vec![
            rule(1, RuleAction::Buy, 50.0, Operator::GreaterThan),
            rule(2, RuleAction::Sell, 50.0, Operator::GreaterThan),
        ];
        assert_eq!(decide(&rules, &window, true), Some(Action::Sell));
    }

    #[test]
    fn non_matching_rules_decide_nothing() {
        let bars = make_bars(&[100.0]);
        let table = compute_table(&bars, &[]);
        let window = BarWindow::at(&bars, &table, 0);
        let rules = vec![rule(1, RuleAction::Buy, 500.0, Operator::GreaterThan)];
        assert_eq!(decide(&rules, &window, false), None);
    }

    #[test]
    fn default_strategy_buys_on_uptrend_with_strong_rsi() {
        // 50 flat bars then a steady climb: fast SMA pulls above slow,
        // RSI saturates near 100.
        let mut closes = vec![100.0; 50];
        closes.extend((1..=20).map(|i| 100.0 + i as f64 * 2.0));
        let bars = make_bars(&closes);
        let table = compute_table(&bars, &[]);
        let window = BarWindow::at(&bars, &table, 69);
        assert_eq!(decide(&[], &window, false), Some(Action::Buy));
    }

    #[test]
    fn default_strategy_never_buys_flat_market() {
        let bars = make_bars(&vec![100.0; 60]);
        let table = compute_table(&bars, &[]);
        for index in 0..60 {
            let window = BarWindow::at(&bars, &table, index);
            assert_eq!(decide(&[], &window, false), None);
        }
    }

    #[test]
    fn default_strategy_sells_on_death_cross() {
        // Climb then a hard fall: the 10-bar mean drops below the 50-bar.
        let mut closes: Vec<f64> = (0..60).map(|i| 100.0 + i as f64).collect();
        closes.extend((1..=30).map(|i| 160.0 - i as f64 * 4.0));
        let bars = make_bars(&closes);
        let table = compute_table(&bars, &[]);
        let last = bars.len() - 1;
        let window = BarWindow::at(&bars, &table, last);
        assert_eq!(decide(&[], &window, true), Some(Action::Sell));
    }

    #[test]
    fn default_strategy_undefined_indicators_decide_nothing() {
        let bars = make_bars(&vec![100.0; 20]);
        let table = compute_table(&bars, &[]);
        // SMA(50) undefined on 20 bars.
        let window = BarWindow::at(&bars, &table, 19);
        assert_eq!(decide(&[], &window, false), None);
    }
}
