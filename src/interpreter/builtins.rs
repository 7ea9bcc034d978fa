use std::io::Write;

use crate::ast::Subroutine;
use crate::error::Result;
use crate::value::Value;

/// Signature shared by all built-in subroutines
pub type SubroutineFn = fn(&[Value], &mut dyn Write) -> Result<Value>;

/// Registry mapping subroutine ids to implementations. A new built-in
/// needs an entry here and a name in `Subroutine::from_name`; existing
/// entries are unaffected.
pub(crate) fn lookup(subroutine: Subroutine) -> SubroutineFn {
    match subroutine {
        Subroutine::Println => println_values,
    }
}

/// `println(a1, ..., an)`: arguments separated by single spaces,
/// terminated by a newline. Returns Null.
pub(crate) fn println_values(args: &[Value], output: &mut dyn Write) -> Result<Value> {
    for (i, arg) in args.iter().enumerate() {
        if i != 0 {
            write!(output, " ")?;
        }
        write_value(output, arg)?;
    }
    writeln!(output)?;
    Ok(Value::Null)
}

// Numbers print in shortest round-trip form (integral values keep a
// trailing .0), strings print quoted and escaped, containers recurse.
// Map entry order follows the map's unspecified iteration order.
fn write_value(output: &mut dyn Write, value: &Value) -> std::io::Result<()> {
    match value {
        Value::Null => write!(output, "null"),
        Value::Bool(b) => write!(output, "{}", b),
        Value::Number(n) => write!(output, "{:?}", n),
        Value::String(s) => write!(output, "{:?}", s),
        Value::Array(els) => {
            write!(output, "[")?;
            for (i, el) in els.iter().enumerate() {
                if i != 0 {
                    write!(output, ", ")?;
                }
                write_value(output, el)?;
            }
            write!(output, "]")
        }
        Value::Map(entries) => {
            write!(output, "{{")?;
            for (i, (key, el)) in entries.iter().enumerate() {
                if i != 0 {
                    write!(output, ", ")?;
                }
                write!(output, "{:?}: ", key)?;
                write_value(output, el)?;
            }
            write!(output, "}}")
        }
    }
}
