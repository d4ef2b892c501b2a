//! Value types
//!
//! The execution engine supports a closed set of scalar types and one-dimensional
//! arrays of each. Host-language code names them through constructor calls such
//! as `I32Value(0)` or `DoubleValueArray([1, 2, 3])`; [`ValueType::from_constructor`]
//! is the single place that mapping lives.

use core::fmt;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Eq, PartialEq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    Int32,
    Int64,
    UInt32,
    UInt64,
    Double,
    BooleanArray,
    Int32Array,
    Int64Array,
    UInt32Array,
    UInt64Array,
    DoubleArray,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown value type `{0}`")]
pub struct UnknownValueType(pub String);

impl ValueType {
    pub const ALL: &'static [ValueType] = &[
        ValueType::Boolean,
        ValueType::Int32,
        ValueType::Int64,
        ValueType::UInt32,
        ValueType::UInt64,
        ValueType::Double,
        ValueType::BooleanArray,
        ValueType::Int32Array,
        ValueType::Int64Array,
        ValueType::UInt32Array,
        ValueType::UInt64Array,
        ValueType::DoubleArray,
    ];

    /// Host-language constructor that declares a variable of this type.
    #[must_use = "returns the constructor name without modifying self"]
    pub const fn constructor_name(&self) -> &'static str {
        match self {
            ValueType::Boolean => "BooleanValue",
            ValueType::Int32 => "I32Value",
            ValueType::Int64 => "I64Value",
            ValueType::UInt32 => "U32Value",
            ValueType::UInt64 => "U64Value",
            ValueType::Double => "DoubleValue",
            ValueType::BooleanArray => "BooleanValueArray",
            ValueType::Int32Array => "I32ValueArray",
            ValueType::Int64Array => "I64ValueArray",
            ValueType::UInt32Array => "U32ValueArray",
            ValueType::UInt64Array => "U64ValueArray",
            ValueType::DoubleArray => "DoubleValueArray",
        }
    }

    #[must_use = "returns the type name without modifying self"]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ValueType::Boolean => "Boolean",
            ValueType::Int32 => "I32",
            ValueType::Int64 => "I64",
            ValueType::UInt32 => "U32",
            ValueType::UInt64 => "U64",
            ValueType::Double => "Double",
            ValueType::BooleanArray => "Boolean[]",
            ValueType::Int32Array => "I32[]",
            ValueType::Int64Array => "I64[]",
            ValueType::UInt32Array => "U32[]",
            ValueType::UInt64Array => "U64[]",
            ValueType::DoubleArray => "Double[]",
        }
    }

    #[must_use]
    pub fn from_constructor(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .find(|ty| ty.constructor_name() == name)
            .copied()
    }

    #[must_use = "this is a pure check with no side effects"]
    pub const fn is_array(&self) -> bool {
        matches!(
            self,
            ValueType::BooleanArray
                | ValueType::Int32Array
                | ValueType::Int64Array
                | ValueType::UInt32Array
                | ValueType::UInt64Array
                | ValueType::DoubleArray
        )
    }

    #[must_use = "this is a pure check with no side effects"]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            ValueType::Int32 | ValueType::Int64 | ValueType::UInt32 | ValueType::UInt64
        )
    }

    #[must_use = "this is a pure check with no side effects"]
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, ValueType::Double)
    }

    /// Scalar type of the elements of an array type; scalars map to themselves.
    #[must_use]
    pub const fn element_type(&self) -> ValueType {
        match self {
            ValueType::BooleanArray => ValueType::Boolean,
            ValueType::Int32Array => ValueType::Int32,
            ValueType::Int64Array => ValueType::Int64,
            ValueType::UInt32Array => ValueType::UInt32,
            ValueType::UInt64Array => ValueType::UInt64,
            ValueType::DoubleArray => ValueType::Double,
            scalar => *scalar,
        }
    }

    /// Array type whose elements are `self`; `None` if `self` is already an array.
    #[must_use]
    pub const fn array_of(&self) -> Option<ValueType> {
        match self {
            ValueType::Boolean => Some(ValueType::BooleanArray),
            ValueType::Int32 => Some(ValueType::Int32Array),
            ValueType::Int64 => Some(ValueType::Int64Array),
            ValueType::UInt32 => Some(ValueType::UInt32Array),
            ValueType::UInt64 => Some(ValueType::UInt64Array),
            ValueType::Double => Some(ValueType::DoubleArray),
            _ => None,
        }
    }

    /// The zero value used when a declaration carries no constant initializer.
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            ValueType::Boolean => Value::Boolean(false),
            ValueType::Int32 => Value::Int32(0),
            ValueType::Int64 => Value::Int64(0),
            ValueType::UInt32 => Value::UInt32(0),
            ValueType::UInt64 => Value::UInt64(0),
            ValueType::Double => Value::Double(0.0),
            array => Value::Array {
                element_type: array.element_type(),
                elements: Vec::new(),
            },
        }
    }

    /// Result type of arithmetic between two scalar types.
    ///
    /// Doubles dominate; otherwise the wider integer wins, with booleans
    /// promoted to `I32`.
    #[must_use]
    pub fn promote(self, other: ValueType) -> ValueType {
        const RANK: &[ValueType] = &[
            ValueType::Boolean,
            ValueType::Int32,
            ValueType::UInt32,
            ValueType::Int64,
            ValueType::UInt64,
            ValueType::Double,
        ];
        let rank = |ty: ValueType| RANK.iter().position(|r| *r == ty).unwrap_or(RANK.len() - 1);
        let wider = if rank(self) >= rank(other) { self } else { other };
        if wider == ValueType::Boolean {
            ValueType::Int32
        } else {
            wider
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ValueType {
    type Err = UnknownValueType;

    /// Accepts either the display name (`I32`) or the constructor name (`I32Value`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .find(|ty| ty.as_str().eq_ignore_ascii_case(s) || ty.constructor_name() == s)
            .copied()
            .ok_or_else(|| UnknownValueType(s.to_string()))
    }
}

/// A typed constant or runtime value.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum Value {
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Double(f64),
    Array {
        element_type: ValueType,
        elements: Vec<Value>,
    },
}

impl Value {
    #[must_use]
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Boolean(_) => ValueType::Boolean,
            Value::Int32(_) => ValueType::Int32,
            Value::Int64(_) => ValueType::Int64,
            Value::UInt32(_) => ValueType::UInt32,
            Value::UInt64(_) => ValueType::UInt64,
            Value::Double(_) => ValueType::Double,
            Value::Array { element_type, .. } => {
                element_type.array_of().unwrap_or(ValueType::DoubleArray)
            }
        }
    }

    /// Integer view of a scalar; doubles truncate toward zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            Value::Boolean(b) => Some(i128::from(*b)),
            Value::Int32(v) => Some(i128::from(*v)),
            Value::Int64(v) => Some(i128::from(*v)),
            Value::UInt32(v) => Some(i128::from(*v)),
            Value::UInt64(v) => Some(i128::from(*v)),
            Value::Double(v) => Some(v.trunc() as i128),
            Value::Array { .. } => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            Value::Array { .. } => None,
            scalar => scalar.as_i128().map(|v| v as f64),
        }
    }

    /// Truthiness as the host language defines it for scalars.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Boolean(b) => *b,
            Value::Double(v) => *v != 0.0,
            Value::Array { elements, .. } => !elements.is_empty(),
            scalar => scalar.as_i128().is_some_and(|v| v != 0),
        }
    }

    /// Builds a value of integer type `ty` from `value`, wrapping on overflow.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn from_i128(ty: ValueType, value: i128) -> Option<Value> {
        match ty {
            ValueType::Boolean => Some(Value::Boolean(value != 0)),
            ValueType::Int32 => Some(Value::Int32(value as i32)),
            ValueType::Int64 => Some(Value::Int64(value as i64)),
            ValueType::UInt32 => Some(Value::UInt32(value as u32)),
            ValueType::UInt64 => Some(Value::UInt64(value as u64)),
            ValueType::Double => Some(Value::Double(value as f64)),
            _ => None,
        }
    }

    /// Converts the value to `ty` the way an assignment to a variable of that
    /// type does. Returns `None` for scalar/array mismatches.
    #[must_use]
    pub fn coerce(&self, ty: ValueType) -> Option<Value> {
        if self.value_type() == ty {
            return Some(self.clone());
        }
        match (self, ty.is_array()) {
            (Value::Array { elements, .. }, true) => {
                let element_type = ty.element_type();
                let elements = elements
                    .iter()
                    .map(|element| element.coerce(element_type))
                    .collect::<Option<Vec<_>>>()?;
                Some(Value::Array {
                    element_type,
                    elements,
                })
            }
            (Value::Array { .. }, false) | (_, true) => None,
            (scalar, false) => match ty {
                ValueType::Double => scalar.as_f64().map(Value::Double),
                ValueType::Boolean => Some(Value::Boolean(scalar.is_truthy())),
                integer => Value::from_i128(integer, scalar.as_i128()?),
            },
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Value::Boolean(b) => write!(f, "{}", if *b { "true" } else { "false" }),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Array { elements, .. } => {
                write!(f, "[")?;
                for (index, element) in elements.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{element}")?;
                }
                write!(f, "]")
            }
        }
    }
}
