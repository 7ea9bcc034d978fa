pub mod builtins;
mod stack;

use std::collections::HashMap;
use std::io::Write;

use crate::ast::{Expression, Instruction, Pattern, PatternSegment, Program};
use crate::error::{Error, Result};
use crate::value::Value;
use crate::walker::{path_to_value, PathSegment, TreeWalker, WalkItem};

use self::stack::StackValue;

/// The tawk runtime: a stack machine evaluating compiled expressions
/// against a shared variable store while the tree walker drives visits
/// over the (read-only) input document.
pub struct Interpreter<'a> {
    /// The parsed program
    program: &'a Program,

    /// The input document; never mutated, all writes go to variables
    data: &'a Value,

    /// Evaluation stack, empty between actions
    stack: Vec<StackValue>,

    /// Global variables, shared by every block and filter in the run
    pub(crate) variables: HashMap<String, Value>,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a Program, data: &'a Value) -> Self {
        Self {
            program,
            data,
            stack: Vec::new(),
            variables: HashMap::new(),
        }
    }

    /// Preset a variable before the run
    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_string(), value);
    }

    /// The variable store, for inspection after (or between) runs
    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    /// Walk the document and run every matching block's action
    pub fn run<W: Write>(&mut self, output: &mut W) -> Result<()> {
        let program = self.program;
        for item in TreeWalker::new(self.data) {
            for block in &program.blocks {
                if self.matches(&block.pattern, &item, output)? {
                    self.run_action(&block.action, &item, output)?;
                }
            }
        }
        Ok(())
    }

    /// Test a pattern against one visit. Filters run in the shared state,
    /// so their variable writes persist; that is part of the contract.
    fn matches<W: Write>(
        &mut self,
        pattern: &Pattern,
        item: &WalkItem,
        output: &mut W,
    ) -> Result<bool> {
        if pattern.segments.len() != item.path.len() || pattern.is_first != item.first {
            return Ok(false);
        }
        for (i, segment) in pattern.segments.iter().enumerate() {
            let matched = match segment {
                PatternSegment::Wildcard => true,
                PatternSegment::Index(literal) => segment_text_matches(literal, &item.path[i]),
                PatternSegment::Filter(filter) => {
                    // The filter sees the path prefix ending at its own
                    // segment, not the full visit path.
                    self.install_visit_variables(&item.path[..=i])?;
                    self.eval_expression(filter, output)?.cast_to_bool()
                }
            };
            if !matched {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn run_action<W: Write>(
        &mut self,
        action: &Expression,
        item: &WalkItem,
        output: &mut W,
    ) -> Result<()> {
        if action.is_empty() {
            // an empty action stands for println($0)
            let value = self.data.get_path(&item.path)?.clone();
            builtins::println_values(&[value], output)?;
            return Ok(());
        }
        self.install_visit_variables(&item.path)?;
        self.eval_expression(action, output)?;
        Ok(())
    }

    fn install_visit_variables(&mut self, path: &[PathSegment]) -> Result<()> {
        let value = self.data.get_path(path)?.clone();
        self.variables.insert("path".to_string(), path_to_value(path));
        self.variables.insert("$0".to_string(), value);
        Ok(())
    }

    /// Execute a compiled expression; exactly one net value is pushed and
    /// returned, so the stack depth is unchanged afterwards
    pub(crate) fn eval_expression<W: Write>(
        &mut self,
        expr: &Expression,
        output: &mut W,
    ) -> Result<Value> {
        for instruction in expr {
            self.step(instruction, output)?;
        }
        self.pop_value()
    }

    fn step<W: Write>(&mut self, instruction: &Instruction, output: &mut W) -> Result<()> {
        match instruction {
            Instruction::Add => self.binary(Value::add)?,
            Instruction::Sub => self.binary(Value::sub)?,
            Instruction::Mul => self.binary(Value::mul)?,
            Instruction::Div => self.binary(Value::div)?,
            Instruction::Ignore => {
                self.pop_value()?;
            }
            Instruction::PushNull => self.push(Value::Null),
            Instruction::Assign => {
                let value = self.pop_value()?;
                let address = self.pop()?.to_address()?;
                address.assign(self, value)?;
                self.push(Value::Null);
            }
            Instruction::Index => {
                let index = self.pop_value()?;
                let parent = self.pop()?;
                self.stack.push(StackValue::IndexRef {
                    parent: Box::new(parent),
                    index,
                });
            }
            Instruction::Dup => {
                // the copy is materialised; the reference stays underneath
                let top = self.pop()?;
                let copy = top.to_value(self)?;
                self.stack.push(top);
                self.push(copy);
            }
            Instruction::Equal => {
                let rhs = self.pop_value()?;
                let lhs = self.pop_value()?;
                self.push(Value::Bool(lhs.equals(&rhs)));
            }
            Instruction::Not => {
                let value = self.pop_value()?;
                self.push(Value::Bool(!value.cast_to_bool()));
            }
            Instruction::PushNumber(n) => self.push(Value::Number(*n)),
            Instruction::PushVariable(name) => {
                self.stack.push(StackValue::VariableRef(name.clone()));
            }
            Instruction::PushString(s) => self.push(Value::String(s.clone())),
            Instruction::MakeArray(count) => {
                let mut els = vec![Value::Null; *count];
                for slot in els.iter_mut().rev() {
                    *slot = self.pop_value()?;
                }
                self.push(Value::Array(els));
            }
            Instruction::Call { subroutine, nargs } => {
                let mut args = vec![Value::Null; *nargs];
                for slot in args.iter_mut().rev() {
                    *slot = self.pop_value()?;
                }
                let call = builtins::lookup(*subroutine);
                let result = call(&args, output)?;
                self.push(result);
            }
        }
        Ok(())
    }

    fn binary(&mut self, op: fn(&Value, &Value) -> Result<Value>) -> Result<()> {
        let rhs = self.pop_value()?;
        let lhs = self.pop_value()?;
        let result = op(&lhs, &rhs)?;
        self.push(result);
        Ok(())
    }

    fn push(&mut self, value: Value) {
        self.stack.push(StackValue::Value(value));
    }

    fn pop(&mut self) -> Result<StackValue> {
        self.stack
            .pop()
            .ok_or_else(|| Error::eval("tried to pop an empty stack"))
    }

    fn pop_value(&mut self) -> Result<Value> {
        let top = self.pop()?;
        top.to_value(self)
    }
}

/// Literal pattern segments compare against the path component's textual
/// form, so `0` matches the first array element and `k` matches key "k"
fn segment_text_matches(literal: &str, segment: &PathSegment) -> bool {
    match segment {
        PathSegment::Index(i) => literal == i.to_string(),
        PathSegment::Key(key) => literal == key.as_str(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Instruction::*;

    fn fixture() -> (Program, Value) {
        (Program::new(), Value::Null)
    }

    fn eval(interp: &mut Interpreter<'_>, expr: &Expression) -> Result<Value> {
        let mut output: Vec<u8> = Vec::new();
        interp.eval_expression(expr, &mut output)
    }

    #[test]
    fn test_variable_read_installs_null() {
        let (program, data) = fixture();
        let mut interp = Interpreter::new(&program, &data);
        assert!(interp.variables().get("x").is_none());

        let result = eval(&mut interp, &vec![PushVariable("x".to_string())]).unwrap();
        assert_eq!(result, Value::Null);
        // the read itself installed the slot
        assert_eq!(interp.variables().get("x"), Some(&Value::Null));
    }

    #[test]
    fn test_assignment() {
        let (program, data) = fixture();
        let mut interp = Interpreter::new(&program, &data);
        let expr = vec![
            PushVariable("x".to_string()),
            PushNumber(1.0),
            Assign,
        ];
        assert_eq!(eval(&mut interp, &expr).unwrap(), Value::Null);
        assert_eq!(interp.variables().get("x"), Some(&Value::Number(1.0)));
    }

    #[test]
    fn test_assignment_to_rvalue_fails() {
        let (program, data) = fixture();
        let mut interp = Interpreter::new(&program, &data);
        let expr = vec![PushNumber(1.0), PushNumber(2.0), Assign];
        assert!(eval(&mut interp, &expr).is_err());
    }

    #[test]
    fn test_compound_assignment_through_dup() {
        let (program, data) = fixture();
        let mut interp = Interpreter::new(&program, &data);
        interp.set_variable("x", Value::Number(2.0));
        // x += 1
        let expr = vec![
            PushVariable("x".to_string()),
            Dup,
            PushNumber(1.0),
            Add,
            Assign,
        ];
        eval(&mut interp, &expr).unwrap();
        assert_eq!(interp.variables().get("x"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_nested_index_assignment_is_persistent() {
        let (program, data) = fixture();
        let mut interp = Interpreter::new(&program, &data);
        let original = Value::Map(
            [
                ("a".to_string(), Value::Number(1.0)),
                ("b".to_string(), Value::Number(2.0)),
            ]
            .into_iter()
            .collect(),
        );
        interp.set_variable("m", original.clone());
        // m.a = 9
        let expr = vec![
            PushVariable("m".to_string()),
            PushString("a".to_string()),
            Index,
            PushNumber(9.0),
            Assign,
        ];
        eval(&mut interp, &expr).unwrap();
        let expected = Value::Map(
            [
                ("a".to_string(), Value::Number(9.0)),
                ("b".to_string(), Value::Number(2.0)),
            ]
            .into_iter()
            .collect(),
        );
        assert_eq!(interp.variables().get("m"), Some(&expected));
    }

    #[test]
    fn test_index_assignment_materialises_through_unset_variable() {
        let (program, data) = fixture();
        let mut interp = Interpreter::new(&program, &data);
        // t.k = 1 with t never written
        let expr = vec![
            PushVariable("t".to_string()),
            PushString("k".to_string()),
            Index,
            PushNumber(1.0),
            Assign,
        ];
        eval(&mut interp, &expr).unwrap();
        let expected = Value::Map(
            [("k".to_string(), Value::Number(1.0))].into_iter().collect(),
        );
        assert_eq!(interp.variables().get("t"), Some(&expected));
    }

    #[test]
    fn test_index_reads_are_deferred() {
        let (program, data) = fixture();
        let mut interp = Interpreter::new(&program, &data);
        interp.set_variable(
            "m",
            Value::Map([("k".to_string(), Value::Number(7.0))].into_iter().collect()),
        );
        // m.k + 1
        let expr = vec![
            PushVariable("m".to_string()),
            PushString("k".to_string()),
            Index,
            PushNumber(1.0),
            Add,
        ];
        assert_eq!(eval(&mut interp, &expr).unwrap(), Value::Number(8.0));
    }

    #[test]
    fn test_make_array_preserves_order() {
        let (program, data) = fixture();
        let mut interp = Interpreter::new(&program, &data);
        let expr = vec![PushNumber(1.0), PushNumber(2.0), MakeArray(2)];
        assert_eq!(
            eval(&mut interp, &expr).unwrap(),
            Value::Array(vec![Value::Number(1.0), Value::Number(2.0)])
        );
    }

    #[test]
    fn test_empty_stack_pop_is_an_error() {
        let (program, data) = fixture();
        let mut interp = Interpreter::new(&program, &data);
        assert!(eval(&mut interp, &vec![Add]).is_err());
    }

    #[test]
    fn test_stack_depth_restored_after_expression() {
        let (program, data) = fixture();
        let mut interp = Interpreter::new(&program, &data);
        let expr = vec![
            PushNumber(1.0),
            Ignore,
            PushVariable("x".to_string()),
            PushNumber(2.0),
            Assign,
        ];
        eval(&mut interp, &expr).unwrap();
        assert!(interp.stack.is_empty());
    }
}
