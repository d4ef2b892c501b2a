//! Arithmetic, bitwise, comparison and logical operators over [`Value`].
//!
//! Operands are promoted to a common type first (`Boolean < I32 < U32 < I64 <
//! U64 < Double`). True division always produces a double. Floor division and
//! modulo round toward negative infinity. Integer results wrap to the width of
//! the promoted type.

use std::cmp::Ordering;

use rtseq_sequence::{BinaryOperator, UnaryOperator, Value, ValueType};

use crate::error::{Result, RuntimeError};

/// Applies `operator` to two evaluated operands.
///
/// `And`/`Or` here see both operands; the evaluator short-circuits before
/// calling this.
///
/// # Errors
///
/// Division by zero, array operands and bitwise operators on doubles fail.
pub fn binary(operator: BinaryOperator, left: &Value, right: &Value) -> Result<Value> {
    for operand in [left, right] {
        if operand.value_type().is_array() {
            return Err(RuntimeError::type_mismatch(
                operator.as_str(),
                operand.value_type(),
            ));
        }
    }
    if operator.is_logical() {
        let result = match operator {
            BinaryOperator::And => left.is_truthy() && right.is_truthy(),
            _ => left.is_truthy() || right.is_truthy(),
        };
        return Ok(Value::Boolean(result));
    }
    if operator.is_comparison() {
        return Ok(Value::Boolean(compare(operator, left, right)));
    }

    let promoted = left.value_type().promote(right.value_type());
    if promoted == ValueType::Double || operator == BinaryOperator::Div {
        return double_arithmetic(operator, left, right);
    }
    integer_arithmetic(operator, promoted, left, right)
}

/// # Errors
///
/// Array operands and `~` on a double fail.
pub fn unary(operator: UnaryOperator, operand: &Value) -> Result<Value> {
    let ty = operand.value_type();
    if ty.is_array() {
        return Err(RuntimeError::type_mismatch(operator.as_str(), ty));
    }
    match (operator, operand) {
        (UnaryOperator::Not, _) => Ok(Value::Boolean(!operand.is_truthy())),
        (UnaryOperator::Negate, Value::Double(value)) => Ok(Value::Double(-value)),
        (UnaryOperator::BitNot, Value::Double(_)) => {
            Err(RuntimeError::type_mismatch(operator.as_str(), ty))
        }
        (UnaryOperator::Negate | UnaryOperator::BitNot, _) => {
            let value = integer(operand, operator.as_str())?;
            let result = if operator == UnaryOperator::Negate {
                value.wrapping_neg()
            } else {
                !value
            };
            wrap(ty.promote(ty), result, operator.as_str())
        }
    }
}

/// Python `//`: the quotient rounded toward negative infinity.
pub(crate) fn floor_div(left: i128, right: i128) -> Option<i128> {
    if right == 0 {
        return None;
    }
    let quotient = left.wrapping_div(right);
    if left % right != 0 && ((left < 0) != (right < 0)) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}

/// Python `%`: the remainder takes the sign of the divisor.
pub(crate) fn floor_mod(left: i128, right: i128) -> Option<i128> {
    if right == 0 {
        return None;
    }
    let remainder = left % right;
    if remainder != 0 && ((remainder < 0) != (right < 0)) {
        Some(remainder + right)
    } else {
        Some(remainder)
    }
}

pub(crate) fn floor_div_f64(left: f64, right: f64) -> Option<f64> {
    (right != 0.0).then(|| (left / right).floor())
}

pub(crate) fn floor_mod_f64(left: f64, right: f64) -> Option<f64> {
    (right != 0.0).then(|| left - right * (left / right).floor())
}

fn compare(operator: BinaryOperator, left: &Value, right: &Value) -> bool {
    let ordering = match (left, right) {
        (Value::Double(_), _) | (_, Value::Double(_)) => {
            let (Some(left), Some(right)) = (left.as_f64(), right.as_f64()) else {
                return false;
            };
            match left.partial_cmp(&right) {
                Some(ordering) => ordering,
                // NaN compares unequal to everything
                None => return operator == BinaryOperator::Ne,
            }
        }
        _ => left.as_i128().cmp(&right.as_i128()),
    };
    match operator {
        BinaryOperator::Eq => ordering == Ordering::Equal,
        BinaryOperator::Ne => ordering != Ordering::Equal,
        BinaryOperator::Lt => ordering == Ordering::Less,
        BinaryOperator::Le => ordering != Ordering::Greater,
        BinaryOperator::Gt => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    }
}

fn double_arithmetic(operator: BinaryOperator, left: &Value, right: &Value) -> Result<Value> {
    let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
        return Err(RuntimeError::type_mismatch(operator.as_str(), left.value_type()));
    };
    let result = match operator {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div => {
            if b == 0.0 {
                return Err(RuntimeError::DivisionByZero);
            }
            a / b
        }
        BinaryOperator::FloorDiv => floor_div_f64(a, b).ok_or(RuntimeError::DivisionByZero)?,
        BinaryOperator::Mod => floor_mod_f64(a, b).ok_or(RuntimeError::DivisionByZero)?,
        BinaryOperator::Pow => a.powf(b),
        _ => {
            return Err(RuntimeError::type_mismatch(
                operator.as_str(),
                ValueType::Double,
            ));
        }
    };
    Ok(Value::Double(result))
}

fn integer_arithmetic(
    operator: BinaryOperator,
    promoted: ValueType,
    left: &Value,
    right: &Value,
) -> Result<Value> {
    let symbol = operator.as_str();
    let a = integer(left, symbol)?;
    let b = integer(right, symbol)?;
    let result = match operator {
        BinaryOperator::Add => a.wrapping_add(b),
        BinaryOperator::Sub => a.wrapping_sub(b),
        BinaryOperator::Mul => a.wrapping_mul(b),
        BinaryOperator::FloorDiv => floor_div(a, b).ok_or(RuntimeError::DivisionByZero)?,
        BinaryOperator::Mod => floor_mod(a, b).ok_or(RuntimeError::DivisionByZero)?,
        BinaryOperator::Pow => {
            // a negative exponent leaves the integers
            let Ok(exponent) = u32::try_from(b) else {
                return double_arithmetic(operator, left, right);
            };
            a.wrapping_pow(exponent)
        }
        BinaryOperator::BitAnd => a & b,
        BinaryOperator::BitOr => a | b,
        BinaryOperator::BitXor => a ^ b,
        BinaryOperator::Shl | BinaryOperator::Shr => {
            let Ok(amount) = u32::try_from(b) else {
                return Err(RuntimeError::type_mismatch(
                    format!("{symbol} by a negative amount"),
                    right.value_type(),
                ));
            };
            if operator == BinaryOperator::Shl {
                a.checked_shl(amount).unwrap_or(0)
            } else {
                a.checked_shr(amount).unwrap_or(if a < 0 { -1 } else { 0 })
            }
        }
        _ => return Err(RuntimeError::type_mismatch(symbol, promoted)),
    };
    wrap(promoted, result, symbol)
}

fn integer(value: &Value, operation: &str) -> Result<i128> {
    value
        .as_i128()
        .ok_or_else(|| RuntimeError::type_mismatch(operation, value.value_type()))
}

fn wrap(ty: ValueType, value: i128, operation: &str) -> Result<Value> {
    Value::from_i128(ty, value).ok_or_else(|| RuntimeError::type_mismatch(operation, ty))
}
