use thiserror::Error;

/// Errors raised by the operand stack.
///
/// An underflow is always a stack-discipline bug in the driving interpreter,
/// never something a source program can trigger; it is propagated to the
/// caller and never recovered internally. The failed operation leaves the
/// stack unmodified.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum StackError {
    #[error("stack underflow: requested {requested} item(s), depth is {depth}")]
    Underflow { requested: usize, depth: usize },
}
