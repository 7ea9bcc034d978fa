use crate::error::{Error, Result};
use crate::value::Value;

use super::Interpreter;

/// What the evaluator's stack holds: plain values plus the two deferred
/// reference forms. Variables are pushed as references and only resolved
/// when an operation needs their value, so the same slot can serve as an
/// l-value for `Assign` and as an r-value for everything else.
#[derive(Debug, Clone)]
pub(crate) enum StackValue {
    Value(Value),
    VariableRef(String),
    IndexRef {
        parent: Box<StackValue>,
        index: Value,
    },
}

impl StackValue {
    /// Materialise to an r-value. Reading a variable that was never
    /// written installs Null in the store; that install is observable.
    pub(crate) fn to_value(&self, interp: &mut Interpreter<'_>) -> Result<Value> {
        match self {
            StackValue::Value(value) => Ok(value.clone()),
            StackValue::VariableRef(name) => match interp.variables.get(name) {
                Some(value) => Ok(value.clone()),
                None => {
                    interp.variables.insert(name.clone(), Value::Null);
                    Ok(Value::Null)
                }
            },
            StackValue::IndexRef { parent, index } => parent.to_value(interp)?.index(index),
        }
    }

    /// Reinterpret as a writable address; fails on plain values
    pub(crate) fn to_address(self) -> Result<Address> {
        match self {
            StackValue::Value(value) => Err(Error::eval(format!(
                "cannot assign to a {}; expected a variable or index",
                value.kind()
            ))),
            StackValue::VariableRef(name) => Ok(Address::Variable(name)),
            StackValue::IndexRef { parent, index } => Ok(Address::Index {
                parent: Box::new(parent.to_address()?),
                index,
            }),
        }
    }
}

/// An l-value: a variable slot, or an index chain rooted at one
#[derive(Debug)]
pub(crate) enum Address {
    Variable(String),
    Index { parent: Box<Address>, index: Value },
}

impl Address {
    pub(crate) fn assign(self, interp: &mut Interpreter<'_>, value: Value) -> Result<()> {
        match self {
            Address::Variable(name) => {
                interp.variables.insert(name, value);
                Ok(())
            }
            address @ Address::Index { .. } => address.assign_path(interp, Vec::new(), value),
        }
    }

    // Walk outward to the root variable, accumulating the index path, then
    // rebuild the variable's value with a persistent update along it.
    fn assign_path(self, interp: &mut Interpreter<'_>, mut path: Vec<Value>, value: Value) -> Result<()> {
        match self {
            Address::Variable(name) => {
                let current = interp.variables.get(&name).cloned().unwrap_or(Value::Null);
                let updated = current.with_assignment(&path, value)?;
                interp.variables.insert(name, updated);
                Ok(())
            }
            Address::Index { parent, index } => {
                path.insert(0, index);
                parent.assign_path(interp, path, value)
            }
        }
    }
}
