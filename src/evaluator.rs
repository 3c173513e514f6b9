use std::io::{self, Write};
use std::rc::Rc;

use log::{debug, info};
use thiserror::Error;

use crate::ast::{
    BlockStatement, Expression, Identifier, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::builtins::{Builtin, BUILTINS};
use crate::environment::{Env, Environment};
use crate::error::RuntimeError;
use crate::object::{Function, Object, FALSE, NULL, TRUE};
use crate::stack::ensure_sufficient_stack;

/// Default bound on nested user‑function calls.  Stack space is grown on
/// demand, so this only stops runaway recursion.
pub const DEFAULT_MAX_DEPTH: usize = 10_000;

/// Why evaluation of a node stopped early.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error("Return signal with value: {0}")]
    ReturnSignal(Object),
}

/// Convenient alias for evaluator results.
pub type EvalResult<T> = Result<T, EvalError>;

/// Tree‑walking evaluator.
///
/// Holds the builtin table it resolves against, the sink `puts` writes to
/// and the current call depth; all variable state lives in the [`Env`]
/// chain passed to each call.
pub struct Evaluator<'w> {
    builtins: &'static phf::Map<&'static str, Builtin>,
    output: Box<dyn Write + 'w>,
    depth: usize,
    max_depth: usize,
}

impl Default for Evaluator<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator<'static> {
    /// An evaluator writing to stdout.
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        info!("Initializing Evaluator (max call depth {})", max_depth);

        Self {
            builtins: &BUILTINS,
            output: Box::new(io::stdout()),
            depth: 0,
            max_depth,
        }
    }
}

impl<'w> Evaluator<'w> {
    /// Redirects program output to `output`, keeping the depth limit.
    pub fn with_output<'o, W: Write + 'o>(self, output: W) -> Evaluator<'o> {
        Evaluator {
            builtins: self.builtins,
            output: Box::new(output),
            depth: 0,
            max_depth: self.max_depth,
        }
    }

    /// Where `puts` and the REPL write.
    pub fn output(&mut self) -> &mut (dyn Write + 'w) {
        &mut *self.output
    }

    /// Evaluates a whole program in `env`.
    ///
    /// This is the host boundary: a runtime failure comes back as an
    /// `Object::Error`, and a top‑level `return` yields its value.
    pub fn eval_program(&mut self, program: &Program, env: &Env) -> Object {
        debug!("Evaluating program of {} statements", program.statements.len());

        self.depth = 0;

        match self.eval_statements(&program.statements, env) {
            Ok(value) | Err(EvalError::ReturnSignal(value)) => value,
            Err(EvalError::Runtime(e)) => {
                info!("Program failed: {}", e);
                Object::error(e)
            }
        }
    }

    /// Value of the last statement, or `null` for an empty sequence.
    fn eval_statements(&mut self, statements: &[Statement], env: &Env) -> EvalResult<Object> {
        let mut result: Object = NULL;

        for stmt in statements {
            result = self.eval_statement(stmt, env)?;
        }

        Ok(result)
    }

    fn eval_block(&mut self, block: &BlockStatement, env: &Env) -> EvalResult<Object> {
        self.eval_statements(&block.statements, env)
    }

    pub fn eval_statement(&mut self, stmt: &Statement, env: &Env) -> EvalResult<Object> {
        match stmt {
            Statement::Let { name, value } => {
                let value: Object = self.eval_expression(value, env)?;
                debug!("let {} = {}", name, value);
                env.borrow_mut().define(&name.name, value);
                Ok(NULL)
            }

            Statement::Return(expr) => {
                let value: Object = self.eval_expression(expr, env)?;
                debug!("Returning value: {}", value);
                Err(EvalError::ReturnSignal(value))
            }

            Statement::Expression(expr) => self.eval_expression(expr, env),
        }
    }

    pub fn eval_expression(&mut self, expr: &Expression, env: &Env) -> EvalResult<Object> {
        ensure_sufficient_stack(|| self.eval_expression_inner(expr, env))
    }

    fn eval_expression_inner(&mut self, expr: &Expression, env: &Env) -> EvalResult<Object> {
        match expr {
            Expression::Integer(n) => Ok(Object::Integer(*n)),

            Expression::String(s) => Ok(Object::string(s)),

            Expression::Boolean(b) => Ok(Object::from_bool(*b)),

            Expression::Identifier(ident) => Ok(self.eval_identifier(ident, env)?),

            Expression::Prefix { operator, right } => {
                let right: Object = self.eval_expression(right, env)?;
                Ok(eval_prefix(*operator, right)?)
            }

            Expression::Infix {
                left,
                operator,
                right,
            } => {
                let left: Object = self.eval_expression(left, env)?;
                let right: Object = self.eval_expression(right, env)?;
                Ok(eval_infix(*operator, left, right)?)
            }

            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                let condition: Object = self.eval_expression(condition, env)?;

                if condition.is_truthy() {
                    self.eval_block(consequence, env)
                } else if let Some(alternative) = alternative {
                    self.eval_block(alternative, env)
                } else {
                    Ok(NULL)
                }
            }

            Expression::Function { parameters, body } => Ok(Object::Function(Rc::new(Function {
                parameters: parameters.clone(),
                body: Rc::clone(body),
                env: Rc::clone(env),
            }))),

            Expression::Call {
                function,
                arguments,
            } => {
                let callee: Object = self.eval_expression(function, env)?;
                let args: Vec<Object> = self.eval_expressions(arguments, env)?;
                Ok(self.apply_function(&callee, &args)?)
            }

            Expression::Array(elements) => {
                let elements: Vec<Object> = self.eval_expressions(elements, env)?;
                Ok(Object::array(elements))
            }

            Expression::Index { left, index } => {
                let left: Object = self.eval_expression(left, env)?;
                let index: Object = self.eval_expression(index, env)?;
                Ok(eval_index(&left, &index)?)
            }
        }
    }

    /// Left to right, stopping at the first failure.
    fn eval_expressions(&mut self, exprs: &[Expression], env: &Env) -> EvalResult<Vec<Object>> {
        let mut values: Vec<Object> = Vec::with_capacity(exprs.len());

        for expr in exprs {
            values.push(self.eval_expression(expr, env)?);
        }

        Ok(values)
    }

    /// Environment chain first, then the builtin table.
    fn eval_identifier(&self, ident: &Identifier, env: &Env) -> Result<Object, RuntimeError> {
        let resolved = env.borrow().resolve(&ident.name);

        resolved.or_else(|e| match self.builtins.get(ident.name.as_str()) {
            Some(builtin) => Ok(Object::Builtin(builtin)),
            None => Err(e),
        })
    }

    /// Calls `callee` with already evaluated `args`.
    ///
    /// A `return` inside the body ends the call here; it never leaks to
    /// the caller.
    pub fn apply_function(
        &mut self,
        callee: &Object,
        args: &[Object],
    ) -> Result<Object, RuntimeError> {
        ensure_sufficient_stack(|| self.apply_function_inner(callee, args))
    }

    fn apply_function_inner(
        &mut self,
        callee: &Object,
        args: &[Object],
    ) -> Result<Object, RuntimeError> {
        match callee {
            Object::Function(function) => {
                if args.len() != function.parameters.len() {
                    return Err(RuntimeError::WrongArgumentCount {
                        got: args.len(),
                        want: function.parameters.len(),
                    });
                }

                if self.depth >= self.max_depth {
                    return Err(RuntimeError::CallDepthExceeded(self.max_depth));
                }

                let call_env: Env = Environment::new_enclosed(&function.env);

                {
                    let mut frame = call_env.borrow_mut();
                    for (param, arg) in function.parameters.iter().zip(args) {
                        frame.define(&param.name, arg.clone());
                    }
                }

                self.depth += 1;
                let result = self.eval_block(&function.body, &call_env);
                self.depth -= 1;

                match result {
                    Ok(value) | Err(EvalError::ReturnSignal(value)) => Ok(value),
                    Err(EvalError::Runtime(e)) => Err(e),
                }
            }

            Object::Builtin(builtin) => {
                debug!("Calling builtin '{}' with {} args", builtin.name, args.len());
                (builtin.func)(self, args)
            }

            other => Err(RuntimeError::NotAFunction(other.object_type())),
        }
    }
}

// ───────────────────────────── operators ─────────────────────────────

fn eval_prefix(operator: PrefixOperator, right: Object) -> Result<Object, RuntimeError> {
    match operator {
        PrefixOperator::Bang => Ok(if right.is_truthy() { FALSE } else { TRUE }),
        PrefixOperator::Minus => match right {
            Object::Integer(n) => n
                .checked_neg()
                .map(Object::Integer)
                .ok_or(RuntimeError::IntegerOverflow {
                    left: 0,
                    operator: "-",
                    right: n,
                }),
            other => Err(RuntimeError::UnknownPrefixOperator {
                operator: operator.as_str(),
                right: other.object_type(),
            }),
        },
    }
}

fn eval_infix(
    operator: InfixOperator,
    left: Object,
    right: Object,
) -> Result<Object, RuntimeError> {
    match (&left, &right) {
        (Object::Integer(a), Object::Integer(b)) => eval_integer_infix(operator, *a, *b),
        (Object::String(a), Object::String(b)) => match operator {
            InfixOperator::Plus => Ok(Object::string(format!("{}{}", a, b))),
            InfixOperator::Equal => Ok(Object::from_bool(a == b)),
            InfixOperator::NotEqual => Ok(Object::from_bool(a != b)),
            _ => Err(unknown_infix(operator, &left, &right)),
        },
        _ if left.object_type() != right.object_type() => Err(RuntimeError::TypeMismatch {
            left: left.object_type(),
            operator: operator.as_str(),
            right: right.object_type(),
        }),
        _ => match operator {
            InfixOperator::Equal => Ok(Object::from_bool(left.same_instance(&right))),
            InfixOperator::NotEqual => Ok(Object::from_bool(!left.same_instance(&right))),
            _ => Err(unknown_infix(operator, &left, &right)),
        },
    }
}

fn eval_integer_infix(operator: InfixOperator, a: i64, b: i64) -> Result<Object, RuntimeError> {
    let overflow = || RuntimeError::IntegerOverflow {
        left: a,
        operator: operator.as_str(),
        right: b,
    };

    let value: Object = match operator {
        InfixOperator::Plus => Object::Integer(a.checked_add(b).ok_or_else(overflow)?),
        InfixOperator::Minus => Object::Integer(a.checked_sub(b).ok_or_else(overflow)?),
        InfixOperator::Star => Object::Integer(a.checked_mul(b).ok_or_else(overflow)?),
        InfixOperator::Slash => {
            if b == 0 {
                return Err(RuntimeError::DivisionByZero);
            }
            Object::Integer(a.checked_div(b).ok_or_else(overflow)?)
        }
        InfixOperator::Less => Object::from_bool(a < b),
        InfixOperator::LessEqual => Object::from_bool(a <= b),
        InfixOperator::Greater => Object::from_bool(a > b),
        InfixOperator::GreaterEqual => Object::from_bool(a >= b),
        InfixOperator::Equal => Object::from_bool(a == b),
        InfixOperator::NotEqual => Object::from_bool(a != b),
    };

    Ok(value)
}

fn unknown_infix(operator: InfixOperator, left: &Object, right: &Object) -> RuntimeError {
    RuntimeError::UnknownInfixOperator {
        left: left.object_type(),
        operator: operator.as_str(),
        right: right.object_type(),
    }
}

fn eval_index(left: &Object, index: &Object) -> Result<Object, RuntimeError> {
    match (left, index) {
        (Object::Array(elements), Object::Integer(i)) => Ok(usize::try_from(*i)
            .ok()
            .and_then(|i| elements.get(i))
            .cloned()
            .unwrap_or(NULL)),
        _ => Err(RuntimeError::IndexNotSupported {
            left: left.object_type(),
            index: index.object_type(),
        }),
    }
}
