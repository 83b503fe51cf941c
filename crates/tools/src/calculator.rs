//! Calculator tool — watering-volume math and general arithmetic.
//!
//! Accepts either a free-form expression (`"5 * 2.5"`) or the
//! quantity/per-unit pair the planner tends to produce for watering
//! questions (`{"quantity": 5, "per_unit": 2.5}`). Expressions support
//! `+ - * /`, parentheses, and unary minus, evaluated by precedence
//! climbing over a character scanner.

use async_trait::async_trait;

use verdant_core::error::ToolError;
use verdant_core::message::UserId;
use verdant_core::tool::{Tool, ToolResult};

pub struct CalculatorTool;

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Calculate water amounts, fertilizer ratios, or any arithmetic. \
         Pass either an 'expression' string, or 'quantity' and 'per_unit' \
         numbers to multiply (e.g. plants times liters per plant)."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "expression": {
                    "type": "string",
                    "description": "Arithmetic expression, e.g. '(5 * 2.5) + 1'"
                },
                "quantity": {
                    "type": "number",
                    "description": "Number of units (e.g. plant count)"
                },
                "per_unit": {
                    "type": "number",
                    "description": "Amount per unit (e.g. liters per plant)"
                }
            }
        })
    }

    async fn invoke(
        &self,
        arguments: serde_json::Value,
        _user: &UserId,
    ) -> Result<ToolResult, ToolError> {
        let outcome = if let Some(expr) = arguments["expression"].as_str() {
            evaluate(expr)
        } else {
            match (arguments["quantity"].as_f64(), arguments["per_unit"].as_f64()) {
                (Some(quantity), Some(per_unit)) => Ok(quantity * per_unit),
                _ => {
                    return Err(ToolError::InvalidArguments {
                        tool_name: "calculator".into(),
                        reason: "provide 'expression', or both 'quantity' and 'per_unit'".into(),
                    });
                }
            }
        };

        match outcome {
            Ok(value) => {
                let formatted = format_number(value);
                Ok(ToolResult::ok(
                    formatted,
                    Some(serde_json::json!({"result": value})),
                ))
            }
            Err(e) => Ok(ToolResult::failure(format!("Calculation error: {e}"))),
        }
    }
}

/// Format a result, trimming the trailing `.0` off whole numbers.
fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

/// Evaluate an arithmetic expression string.
pub fn evaluate(expr: &str) -> Result<f64, String> {
    let mut scanner = Scanner::new(expr);
    let value = parse_with_power(&mut scanner, 0)?;
    scanner.skip_ws();
    match scanner.peek() {
        None => Ok(value),
        Some(c) => Err(format!("unexpected '{c}' after expression")),
    }
}

struct Scanner<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next()
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn number(&mut self) -> Result<f64, String> {
        let mut buf = String::new();
        while let Some(c) = self.peek() {
            if !c.is_ascii_digit() && c != '.' {
                break;
            }
            buf.push(c);
            self.bump();
        }
        buf.parse().map_err(|_| format!("invalid number '{buf}'"))
    }
}

/// Left binding power per operator; higher binds tighter.
fn binding_power(op: char) -> Option<u8> {
    match op {
        '+' | '-' => Some(1),
        '*' | '/' => Some(2),
        _ => None,
    }
}

/// Precedence climbing: parse an operand, then fold in operators whose
/// binding power is at least `min_power`.
fn parse_with_power(scanner: &mut Scanner, min_power: u8) -> Result<f64, String> {
    let mut left = parse_operand(scanner)?;

    loop {
        scanner.skip_ws();
        let Some(op) = scanner.peek() else { break };
        let Some(power) = binding_power(op) else { break };
        if power < min_power {
            break;
        }
        scanner.bump();

        let right = parse_with_power(scanner, power + 1)?;
        left = match op {
            '+' => left + right,
            '-' => left - right,
            '*' => left * right,
            '/' => {
                if right == 0.0 {
                    return Err("division by zero".into());
                }
                left / right
            }
            _ => unreachable!(),
        };
    }

    Ok(left)
}

fn parse_operand(scanner: &mut Scanner) -> Result<f64, String> {
    scanner.skip_ws();
    match scanner.peek() {
        Some('-') => {
            scanner.bump();
            Ok(-parse_operand(scanner)?)
        }
        Some('(') => {
            scanner.bump();
            let value = parse_with_power(scanner, 0)?;
            scanner.skip_ws();
            match scanner.bump() {
                Some(')') => Ok(value),
                _ => Err("expected closing parenthesis".into()),
            }
        }
        Some(c) if c.is_ascii_digit() || c == '.' => scanner.number(),
        Some(c) => Err(format!("unexpected '{c}'")),
        None => Err("unexpected end of expression".into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("u1")
    }

    #[test]
    fn addition_and_precedence() {
        assert_eq!(evaluate("2 + 3").unwrap(), 5.0);
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("(2 + 3) * 4").unwrap(), 20.0);
    }

    #[test]
    fn division_and_decimals() {
        assert_eq!(evaluate("10 / 4").unwrap(), 2.5);
        assert_eq!(evaluate("3.5 * 2").unwrap(), 7.0);
    }

    #[test]
    fn division_by_zero_rejected() {
        assert!(evaluate("1 / 0").is_err());
    }

    #[test]
    fn unary_minus() {
        assert_eq!(evaluate("-5 + 3").unwrap(), -2.0);
        assert_eq!(evaluate("2 * -3").unwrap(), -6.0);
        assert_eq!(evaluate("--4").unwrap(), 4.0);
    }

    #[test]
    fn nested_parentheses() {
        assert_eq!(evaluate("((1 + 2) * (3 + 4))").unwrap(), 21.0);
    }

    #[test]
    fn left_associativity() {
        assert_eq!(evaluate("10 - 3 - 2").unwrap(), 5.0);
        assert_eq!(evaluate("16 / 4 / 2").unwrap(), 2.0);
    }

    #[test]
    fn malformed_expressions_rejected() {
        assert!(evaluate("2 +").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("2 2").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("water").is_err());
    }

    #[tokio::test]
    async fn tool_evaluates_expression() {
        let result = CalculatorTool
            .invoke(serde_json::json!({"expression": "5 * 2.5"}), &user())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "12.5");
    }

    #[tokio::test]
    async fn tool_quantity_per_unit_form() {
        let result = CalculatorTool
            .invoke(serde_json::json!({"quantity": 5, "per_unit": 2.5}), &user())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(result.output, "12.5");
        assert_eq!(result.data.unwrap()["result"], 12.5);
    }

    #[tokio::test]
    async fn tool_trims_whole_numbers() {
        let result = CalculatorTool
            .invoke(serde_json::json!({"expression": "10 / 2"}), &user())
            .await
            .unwrap();
        assert_eq!(result.output, "5");
    }

    #[tokio::test]
    async fn tool_missing_arguments_is_typed_error() {
        let err = CalculatorTool
            .invoke(serde_json::json!({}), &user())
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn tool_bad_expression_fails_softly() {
        let result = CalculatorTool
            .invoke(serde_json::json!({"expression": "2 +"}), &user())
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.output.contains("Calculation error"));
    }
}
