//! Rule evaluation against an explicit two-bar window.
//!
//! A condition is evaluated against the current bar; the cross operators
//! additionally look at its predecessor. Any operand that resolves to an
//! undefined value makes the condition false — rules never raise.

use crate::models::bar::PriceBar;
use crate::models::strategy::{Condition, Operand, Operator, PriceField};

use super::indicators::IndicatorTable;

/// One bar together with its indicator row.
#[derive(Clone, Copy)]
pub struct BarView<'a> {
    pub bar: &'a PriceBar,
    table: &'a IndicatorTable,
    index: usize,
}

impl<'a> BarView<'a> {
    fn new(bars: &'a [PriceBar], table: &'a IndicatorTable, index: usize) -> Self {
        BarView { bar: &bars[index], table, index }
    }

    /// Resolve an operand at this bar; NaN when undefined.
    fn resolve(&self, operand: &Operand) -> f64 {
        match operand {
            Operand::Price(field) => match field {
                PriceField::Open => self.bar.open,
                PriceField::High => self.bar.high,
                PriceField::Low => self.bar.low,
                PriceField::Close => self.bar.close,
            },
            Operand::Indicator(indicator) => self.table.value(indicator, self.index),
            Operand::Literal(value) => *value,
        }
    }

    pub fn sma_fast(&self) -> f64 {
        self.table.sma_fast(self.index)
    }

    pub fn sma_slow(&self) -> f64 {
        self.table.sma_slow(self.index)
    }

    pub fn rsi_default(&self) -> f64 {
        self.table.rsi_default(self.index)
    }
}

/// The window a condition sees: the current bar and, when one exists, its
/// predecessor. At the first bar `previous` is `None` and the cross
/// operators cannot fire.
#[derive(Clone, Copy)]
pub struct BarWindow<'a> {
    pub previous: Option<BarView<'a>>,
    pub current: BarView<'a>,
}

impl<'a> BarWindow<'a> {
    pub fn at(bars: &'a [PriceBar], table: &'a IndicatorTable, index: usize) -> Self {
        BarWindow {
            previous: index
                .checked_sub(1)
                .map(|prev| BarView::new(bars, table, prev)),
            current: BarView::new(bars, table, index),
        }
    }
}

/// Evaluate one condition. Undefined operands never trigger.
pub fn evaluate(condition: &Condition, window: &BarWindow) -> bool {
    let left = window.current.resolve(&condition.left);
    let right = window.current.resolve(&condition.right);
    if left.is_nan() || right.is_nan() {
        return false;
    }

    match condition.operator {
        Operator::LessThan => left < right,
        Operator::GreaterThan => left > right,
        Operator::CrossOver | Operator::CrossUnder => {
            let Some(previous) = window.previous else {
                return false;
            };
            let prev_left = previous.resolve(&condition.left);
            let prev_right = previous.resolve(&condition.right);
            if prev_left.is_nan() || prev_right.is_nan() {
                return false;
            }
            match condition.operator {
                Operator::CrossOver => prev_left <= prev_right && left > right,
                _ => prev_left >= prev_right && left < right,
            }
        }
    }
}
