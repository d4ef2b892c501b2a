//! The primitive library.
//!
//! Pure functions over [`Value`] plus the timing accessors, which read a
//! [`SequenceClock`] instead of the wall clock so evaluation stays
//! deterministic.

use std::time::Duration;

use rtseq_sequence::{ErrorAction, Primitive, Value, ValueType};

use crate::{
    context::TaskContext,
    error::{Result, RuntimeError, SequenceError},
    ops::{floor_div, floor_div_f64, floor_mod, floor_mod_f64},
};

/// Simulated engine time, advanced one tick per scheduling round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequenceClock {
    tick_period: Duration,
    ticks: u64,
    epoch_seconds: f64,
}

impl SequenceClock {
    #[must_use]
    pub fn new(tick_period: Duration, epoch_seconds: f64) -> Self {
        Self {
            tick_period,
            ticks: 0,
            epoch_seconds,
        }
    }

    pub fn tick(&mut self) {
        self.ticks += 1;
    }

    #[must_use]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    #[must_use]
    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn elapsed(&self) -> Duration {
        self.tick_period * self.ticks.min(u64::from(u32::MAX)) as u32
    }
}

impl Default for SequenceClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(1), 0.0)
    }
}

/// Evaluates `primitive` on already evaluated arguments.
///
/// # Errors
///
/// Wrong argument counts, non-numeric arguments and division by zero fail.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub fn call_primitive(
    primitive: Primitive,
    arguments: &[Value],
    context: &TaskContext,
    clock: &SequenceClock,
) -> Result<Value> {
    if arguments.len() != primitive.arity() {
        return Err(RuntimeError::ArgumentCount {
            callee: primitive.name().to_string(),
            expected: primitive.arity(),
            found: arguments.len(),
        });
    }
    let elapsed = clock.elapsed();
    let period = clock.tick_period();
    let value = match (primitive, arguments) {
        (Primitive::Abs, [value]) => abs(value)?,
        (Primitive::Fix, [value]) => fix(value)?,
        (Primitive::Recip, [value]) => recip(value)?,
        (Primitive::ArraySize, [value]) => array_size(value)?,
        (Primitive::Quotient, [left, right]) => quotient(left, right)?,
        (Primitive::Rem, [left, right]) => rem(left, right)?,
        (Primitive::GetLastError, []) => Value::Int32(context.last_error_code()),
        (Primitive::Iteration, []) => Value::UInt64(context.iteration()),
        (Primitive::AbsTime, []) => Value::Double(clock.epoch_seconds + elapsed.as_secs_f64()),
        (Primitive::SeqTime, []) => Value::Double(elapsed.as_secs_f64()),
        (Primitive::SeqTimeUs, []) => Value::Int64(elapsed.as_micros() as i64),
        (Primitive::TickCountMs, []) => Value::UInt64(elapsed.as_millis() as u64),
        (Primitive::TickCountUs, []) => Value::UInt64(elapsed.as_micros() as u64),
        (Primitive::DeltaT, []) => Value::Double(period.as_secs_f64()),
        (Primitive::DeltaTUs, []) => Value::Int64(period.as_micros() as i64),
        (primitive, arguments) => {
            return Err(RuntimeError::ArgumentCount {
                callee: primitive.name().to_string(),
                expected: primitive.arity(),
                found: arguments.len(),
            });
        }
    };
    Ok(value)
}

/// Records a user error on `context`.
///
/// # Errors
///
/// Returns the error as `Err` when `action` stops or aborts the sequence; the
/// caller then unwinds the run. With `ContinueSequenceExecution` the error is
/// returned as `Ok` and execution goes on.
pub fn generate_error(
    context: &mut TaskContext,
    code: i32,
    message: &str,
    action: ErrorAction,
) -> std::result::Result<SequenceError, SequenceError> {
    let error = SequenceError::new(code, message, action);
    context.set_last_error(error.clone());
    match action {
        ErrorAction::ContinueSequenceExecution => Ok(error),
        ErrorAction::StopSequence | ErrorAction::AbortSequence => Err(error),
    }
}

fn abs(value: &Value) -> Result<Value> {
    Ok(match value {
        Value::Int32(v) => Value::Int32(v.wrapping_abs()),
        Value::Int64(v) => Value::Int64(v.wrapping_abs()),
        Value::Double(v) => Value::Double(v.abs()),
        Value::Boolean(v) => Value::Int32(i32::from(*v)),
        Value::UInt32(_) | Value::UInt64(_) => value.clone(),
        Value::Array { .. } => return Err(RuntimeError::type_mismatch("abs", value.value_type())),
    })
}

fn fix(value: &Value) -> Result<Value> {
    match value {
        Value::Double(v) => Ok(Value::Double(v.trunc())),
        Value::Array { .. } => Err(RuntimeError::type_mismatch("fix", value.value_type())),
        scalar => Ok(scalar.clone()),
    }
}

fn recip(value: &Value) -> Result<Value> {
    let Some(v) = value.as_f64() else {
        return Err(RuntimeError::type_mismatch("recip", value.value_type()));
    };
    if v == 0.0 {
        return Err(RuntimeError::DivisionByZero);
    }
    Ok(Value::Double(1.0 / v))
}

fn array_size(value: &Value) -> Result<Value> {
    let Value::Array { elements, .. } = value else {
        return Err(RuntimeError::type_mismatch("arraysize", value.value_type()));
    };
    let len = i32::try_from(elements.len()).unwrap_or(i32::MAX);
    Ok(Value::Int32(len))
}

fn quotient(left: &Value, right: &Value) -> Result<Value> {
    floor_pair("quotient", left, right, floor_div, floor_div_f64)
}

fn rem(left: &Value, right: &Value) -> Result<Value> {
    floor_pair("rem", left, right, floor_mod, floor_mod_f64)
}

fn floor_pair(
    name: &str,
    left: &Value,
    right: &Value,
    integer: fn(i128, i128) -> Option<i128>,
    double: fn(f64, f64) -> Option<f64>,
) -> Result<Value> {
    let ty = left.value_type().promote(right.value_type());
    if ty.is_array() || left.value_type().is_array() || right.value_type().is_array() {
        return Err(RuntimeError::type_mismatch(name, ty));
    }
    if ty == ValueType::Double {
        let (Some(a), Some(b)) = (left.as_f64(), right.as_f64()) else {
            return Err(RuntimeError::type_mismatch(name, ty));
        };
        return double(a, b)
            .map(Value::Double)
            .ok_or(RuntimeError::DivisionByZero);
    }
    let (Some(a), Some(b)) = (left.as_i128(), right.as_i128()) else {
        return Err(RuntimeError::type_mismatch(name, ty));
    };
    let result = integer(a, b).ok_or(RuntimeError::DivisionByZero)?;
    Value::from_i128(ty, result).ok_or_else(|| RuntimeError::type_mismatch(name, ty))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(primitive: Primitive, arguments: &[Value]) -> Result<Value> {
        call_primitive(
            primitive,
            arguments,
            &TaskContext::new("main"),
            &SequenceClock::default(),
        )
    }

    #[test]
    fn math_primitives() {
        assert_eq!(call(Primitive::Abs, &[Value::Int32(-5)]), Ok(Value::Int32(5)));
        assert_eq!(call(Primitive::Fix, &[Value::Double(-2.7)]), Ok(Value::Double(-2.0)));
        assert_eq!(call(Primitive::Recip, &[Value::Int32(4)]), Ok(Value::Double(0.25)));
        assert_eq!(
            call(Primitive::Quotient, &[Value::Int32(7), Value::Int32(2)]),
            Ok(Value::Int32(3))
        );
        assert_eq!(
            call(Primitive::Rem, &[Value::Int32(-7), Value::Int32(3)]),
            Ok(Value::Int32(2))
        );
    }

    #[test]
    fn arraysize_counts_elements() {
        let array = Value::Array {
            element_type: ValueType::Double,
            elements: vec![Value::Double(1.0), Value::Double(2.0)],
        };
        assert_eq!(call(Primitive::ArraySize, &[array]), Ok(Value::Int32(2)));
        assert!(call(Primitive::ArraySize, &[Value::Int32(1)]).is_err());
    }

    #[test]
    fn arity_is_checked() {
        assert!(matches!(
            call(Primitive::Quotient, &[Value::Int32(1)]),
            Err(RuntimeError::ArgumentCount { expected: 2, found: 1, .. })
        ));
    }

    #[test]
    fn timing_follows_the_clock() {
        let mut clock = SequenceClock::new(Duration::from_millis(10), 100.0);
        clock.tick();
        clock.tick();
        let context = TaskContext::new("main");
        let at = |primitive| call_primitive(primitive, &[], &context, &clock);
        assert_eq!(at(Primitive::TickCountMs), Ok(Value::UInt64(20)));
        assert_eq!(at(Primitive::SeqTimeUs), Ok(Value::Int64(20_000)));
        assert_eq!(at(Primitive::DeltaTUs), Ok(Value::Int64(10_000)));
        assert_eq!(at(Primitive::SeqTime), Ok(Value::Double(0.02)));
        assert!(matches!(at(Primitive::AbsTime), Ok(Value::Double(t)) if t > 100.0));
    }

    #[test]
    fn generate_error_sets_last_error() {
        let mut context = TaskContext::new("main");
        let continued = generate_error(
            &mut context,
            5000,
            "Continue",
            ErrorAction::ContinueSequenceExecution,
        );
        assert!(continued.is_ok());
        assert_eq!(context.last_error_code(), 5000);

        let stopped = generate_error(&mut context, -100, "Stop now", ErrorAction::StopSequence);
        assert_eq!(stopped.unwrap_err().code, -100);
        assert_eq!(context.last_error_code(), -100);
    }
}
