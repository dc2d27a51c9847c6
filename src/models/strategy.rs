//! Strategy payloads and the typed rule AST.
//!
//! Rules arrive attached to a job message as loosely shaped JSON and are
//! decoded once, at strategy-load time, into the typed AST below. Malformed
//! shapes (unknown operator, unknown action, a compare-to with neither an
//! indicator nor a value) are rejected eagerly; only references to indicators
//! the engine does not compute are kept and resolve to "undefined" at every
//! bar, so the rule can never trigger.

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Default RSI period, applied when a rule references RSI without params.
pub const RSI_DEFAULT_PERIOD: u32 = 14;

// ── Wire payload ──

/// Strategy payload as attached to a job message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub rules: Vec<RawRule>,
}

/// One rule as it appears on the wire. The order key varies across platform
/// revisions (`ruleOrder` vs `rule_order`); both are accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRule {
    #[serde(default, alias = "ruleOrder")]
    pub rule_order: i64,
    pub action: String,
    pub condition: RawCondition,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCondition {
    pub indicator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<RawParams>,
    pub operator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compare_to: Option<RawCompareTo>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawParams {
    /// Accepts a number or a numeric string; coerced during decoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<serde_json::Value>,
}

/// Right-hand side of a condition: another indicator reference or a literal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawCompareTo {
    Indicator {
        indicator: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<RawParams>,
    },
    Value { value: serde_json::Value },
}

// ── Typed AST ──

/// What a rule wants the simulator to do when its condition holds.
/// Wire actions BUY/LONG map to `Buy`; SELL/SHORT/CLOSE/CLOSE_POSITION
/// map to `Sell`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    Buy,
    Sell,
}

/// Closed set of comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    LessThan,
    GreaterThan,
    CrossOver,
    CrossUnder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

/// Indicator identity: what to compute and over how many bars.
/// `Unsupported` carries a name the engine does not compute; its column is
/// all-undefined and any rule depending on it never fires.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Sma,
    Rsi,
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IndicatorRef {
    pub kind: IndicatorKind,
    pub period: u32,
}

impl IndicatorRef {
    pub fn sma(period: u32) -> Self {
        IndicatorRef { kind: IndicatorKind::Sma, period }
    }

    pub fn rsi(period: u32) -> Self {
        IndicatorRef { kind: IndicatorKind::Rsi, period }
    }
}

/// One side of a comparison. Decoding only ever produces `Literal` on the
/// compare-to side, matching the wire shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Price(PriceField),
    Indicator(IndicatorRef),
    Literal(f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub left: Operand,
    pub operator: Operator,
    pub right: Operand,
}

/// A decoded rule. Strategies are ordered sets of these; `order` is the
/// tie-break when several rules could fire on the same bar.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyRule {
    pub order: i64,
    pub action: RuleAction,
    pub condition: Condition,
}

// ── Decoding ──

impl StrategyPayload {
    /// Decode the raw rules into the typed AST, sorted by ascending order
    /// (stable, so payload order breaks exact ties).
    pub fn decode(&self) -> Result<Vec<StrategyRule>, EngineError> {
        let mut rules = self
            .rules
            .iter()
            .map(decode_rule)
            .collect::<Result<Vec<_>, _>>()?;
        rules.sort_by_key(|r| r.order);
        Ok(rules)
    }
}

fn decode_rule(raw: &RawRule) -> Result<StrategyRule, EngineError> {
    let action = decode_action(&raw.action)?;
    let operator = decode_operator(&raw.condition.operator)?;
    let left = decode_operand(&raw.condition.indicator, raw.condition.params.as_ref())?;
    let right = match &raw.condition.compare_to {
        Some(RawCompareTo::Indicator { indicator, params }) => {
            decode_operand(indicator, params.as_ref())?
        }
        Some(RawCompareTo::Value { value }) => Operand::Literal(decode_literal(value)?),
        None => {
            return Err(EngineError::InvalidRule(
                "condition has no compare_to".into(),
            ))
        }
    };

    Ok(StrategyRule {
        order: raw.rule_order,
        action,
        condition: Condition { left, operator, right },
    })
}

fn decode_action(action: &str) -> Result<RuleAction, EngineError> {
    match action.to_ascii_uppercase().as_str() {
        "BUY" | "LONG" => Ok(RuleAction::Buy),
        "SELL" | "SHORT" | "CLOSE" | "CLOSE_POSITION" => Ok(RuleAction::Sell),
        other => Err(EngineError::UnknownAction(other.to_string())),
    }
}

fn decode_operator(operator: &str) -> Result<Operator, EngineError> {
    match operator {
        "<" => Ok(Operator::LessThan),
        ">" => Ok(Operator::GreaterThan),
        "cross_over" => Ok(Operator::CrossOver),
        "cross_under" => Ok(Operator::CrossUnder),
        other => Err(EngineError::UnknownOperator(other.to_string())),
    }
}

fn decode_operand(name: &str, params: Option<&RawParams>) -> Result<Operand, EngineError> {
    let period = decode_period(params)?;
    match name.to_ascii_uppercase().as_str() {
        "OPEN" => Ok(Operand::Price(PriceField::Open)),
        "HIGH" => Ok(Operand::Price(PriceField::High)),
        "LOW" => Ok(Operand::Price(PriceField::Low)),
        "CLOSE" => Ok(Operand::Price(PriceField::Close)),
        "SMA" => {
            let period = period.ok_or_else(|| {
                EngineError::InvalidRule(format!("SMA reference '{name}' has no period"))
            })?;
            Ok(Operand::Indicator(IndicatorRef::sma(period)))
        }
        "RSI" => Ok(Operand::Indicator(IndicatorRef::rsi(
            period.unwrap_or(RSI_DEFAULT_PERIOD),
        ))),
        other => Ok(Operand::Indicator(IndicatorRef {
            kind: IndicatorKind::Unsupported(other.to_string()),
            period: period.unwrap_or(0),
        })),
    }
}

fn decode_period(params: Option<&RawParams>) -> Result<Option<u32>, EngineError> {
    let Some(value) = params.and_then(|p| p.period.as_ref()) else {
        return Ok(None);
    };
    let period = coerce_u32(value)
        .ok_or_else(|| EngineError::InvalidRule(format!("invalid period: {value}")))?;
    if period == 0 {
        return Err(EngineError::InvalidRule("period must be positive".into()));
    }
    Ok(Some(period))
}

fn coerce_u32(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                u32::try_from(u).ok()
            } else {
                // Tolerate integral floats the platform occasionally sends.
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0)
                    .map(|f| f as u32)
            }
        }
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn decode_literal(value: &serde_json::Value) -> Result<f64, EngineError> {
    match value {
        serde_json::Value::Number(n) => n.as_f64().ok_or_else(|| {
            EngineError::InvalidRule(format!("invalid compare value: {value}"))
        }),
        serde_json::Value::String(s) => s.trim().parse().map_err(|_| {
            EngineError::InvalidRule(format!("invalid compare value: {value}"))
        }),
        _ => Err(EngineError::InvalidRule(format!(
            "invalid compare value: {value}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(json: &str) -> StrategyPayload {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn decode_sma_cross_rule() {
        let p = payload(
            r#"{"rules": [{
                "ruleOrder": 1,
                "action": "BUY",
                "condition": {
                    "indicator": "SMA",
                    "params": {"period": 10},
                    "operator": "cross_over",
                    "compare_to": {"indicator": "SMA", "params": {"period": 50}}
                }
            }]}"#,
        );
        let rules = p.decode().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].order, 1);
        assert_eq!(rules[0].action, RuleAction::Buy);
        assert_eq!(rules[0].condition.operator, Operator::CrossOver);
        assert_eq!(rules[0].condition.left, Operand::Indicator(IndicatorRef::sma(10)));
        assert_eq!(rules[0].condition.right, Operand::Indicator(IndicatorRef::sma(50)));
    }

    #[test]
    fn decode_literal_compare_and_price_field() {
        let p = payload(
            r#"{"rules": [{
                "rule_order": 2,
                "action": "SELL",
                "condition": {
                    "indicator": "CLOSE",
                    "operator": "<",
                    "compare_to": {"value": "30.5"}
                }
            }]}"#,
        );
        let rules = p.decode().unwrap();
        assert_eq!(rules[0].action, RuleAction::Sell);
        assert_eq!(rules[0].condition.left, Operand::Price(PriceField::Close));
        assert_eq!(rules[0].condition.right, Operand::Literal(30.5));
    }

    #[test]
    fn rules_are_sorted_by_order() {
        let p = payload(
            r#"{"rules": [
                {"ruleOrder": 5, "action": "BUY",
                 "condition": {"indicator": "CLOSE", "operator": ">", "compare_to": {"value": 1}}},
                {"ruleOrder": 1, "action": "BUY",
                 "condition": {"indicator": "CLOSE", "operator": ">", "compare_to": {"value": 2}}}
            ]}"#,
        );
        let rules = p.decode().unwrap();
        assert_eq!(rules[0].order, 1);
        assert_eq!(rules[1].order, 5);
    }

    #[test]
    fn rsi_defaults_to_period_14() {
        let p = payload(
            r#"{"rules": [{
                "ruleOrder": 1, "action": "SELL",
                "condition": {"indicator": "RSI", "operator": ">", "compare_to": {"value": 70}}
            }]}"#,
        );
        let rules = p.decode().unwrap();
        assert_eq!(
            rules[0].condition.left,
            Operand::Indicator(IndicatorRef::rsi(RSI_DEFAULT_PERIOD))
        );
    }

    #[test]
    fn unsupported_indicator_name_is_kept() {
        let p = payload(
            r#"{"rules": [{
                "ruleOrder": 1, "action": "BUY",
                "condition": {
                    "indicator": "MACD",
                    "params": {"period": 26},
                    "operator": ">",
                    "compare_to": {"value": 0}
                }
            }]}"#,
        );
        let rules = p.decode().unwrap();
        match &rules[0].condition.left {
            Operand::Indicator(r) => {
                assert_eq!(r.kind, IndicatorKind::Unsupported("MACD".into()));
                assert_eq!(r.period, 26);
            }
            other => panic!("expected indicator operand, got {other:?}"),
        }
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let p = payload(
            r#"{"rules": [{
                "ruleOrder": 1, "action": "BUY",
                "condition": {"indicator": "CLOSE", "operator": ">=", "compare_to": {"value": 1}}
            }]}"#,
        );
        assert!(matches!(p.decode(), Err(EngineError::UnknownOperator(_))));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let p = payload(
            r#"{"rules": [{
                "ruleOrder": 1, "action": "HOLD",
                "condition": {"indicator": "CLOSE", "operator": ">", "compare_to": {"value": 1}}
            }]}"#,
        );
        assert!(matches!(p.decode(), Err(EngineError::UnknownAction(_))));
    }

    #[test]
    fn sma_without_period_is_rejected() {
        let p = payload(
            r#"{"rules": [{
                "ruleOrder": 1, "action": "BUY",
                "condition": {"indicator": "SMA", "operator": ">", "compare_to": {"value": 1}}
            }]}"#,
        );
        assert!(matches!(p.decode(), Err(EngineError::InvalidRule(_))));
    }

    #[test]
    fn missing_compare_to_is_rejected() {
        let p = payload(
            r#"{"rules": [{
                "ruleOrder": 1, "action": "BUY",
                "condition": {"indicator": "CLOSE", "operator": ">"}
            }]}"#,
        );
        assert!(matches!(p.decode(), Err(EngineError::InvalidRule(_))));
    }
}
