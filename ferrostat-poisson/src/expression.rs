//! Named boundary-value expressions
//!
//! Function-driven boundary faces refer to an expression by name. The solver asks
//! an [`ExpressionEvaluator`] to compile the name for the arguments available in the
//! deployment and then evaluates the compiled expression at each ghost cell.

use crate::ExpressionError;
use std::collections::HashMap;
use std::sync::Arc;

/// The arguments an expression is evaluated with
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Arity {
    /// `(x, y, z)`
    Space,
    /// `(x, y, z, t)`
    SpaceTime,
}

impl Arity {
    pub fn number_of_arguments(&self) -> usize {
        match self {
            Arity::Space => 3,
            Arity::SpaceTime => 4,
        }
    }
}

impl std::fmt::Display for Arity {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Arity::Space => write!(f, "(x, y, z)"),
            Arity::SpaceTime => write!(f, "(x, y, z, t)"),
        }
    }
}

/// A compiled expression, called with exactly `arity.number_of_arguments()` values
pub type CompiledExpression<'a> = Box<dyn Fn(&[f64]) -> f64 + Send + Sync + 'a>;

pub trait ExpressionEvaluator {
    /// Resolves `name` into a callable for the requested arguments
    fn compile(&self, name: &str, arity: Arity) -> Result<CompiledExpression<'_>, ExpressionError>;
}

type Function = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

#[derive(Clone)]
struct Expression {
    arity: Arity,
    function: Function,
}

/// An evaluator backed by a table of named closures
#[derive(Clone, Default)]
pub struct ExpressionTable {
    expressions: HashMap<String, Expression>,
}

impl std::fmt::Debug for ExpressionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_map()
            .entries(
                self.expressions
                    .iter()
                    .map(|(name, expression)| (name, expression.arity)),
            )
            .finish()
    }
}

impl ExpressionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an expression of position only
    pub fn with_space_expression<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(f64, f64, f64) -> f64 + Send + Sync + 'static,
    {
        self.expressions.insert(
            name.to_string(),
            Expression {
                arity: Arity::Space,
                function: Arc::new(move |args: &[f64]| f(args[0], args[1], args[2])),
            },
        );
        self
    }

    /// Registers an expression of position and time
    pub fn with_space_time_expression<F>(mut self, name: &str, f: F) -> Self
    where
        F: Fn(f64, f64, f64, f64) -> f64 + Send + Sync + 'static,
    {
        self.expressions.insert(
            name.to_string(),
            Expression {
                arity: Arity::SpaceTime,
                function: Arc::new(move |args: &[f64]| f(args[0], args[1], args[2], args[3])),
            },
        );
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.expressions.contains_key(name)
    }
}

impl ExpressionEvaluator for ExpressionTable {
    fn compile(&self, name: &str, arity: Arity) -> Result<CompiledExpression<'_>, ExpressionError> {
        let expression = self
            .expressions
            .get(name)
            .ok_or_else(|| ExpressionError::Unknown(name.to_string()))?;
        match (expression.arity, arity) {
            // A time-independent expression ignores the trailing time argument
            (Arity::Space, _) => {
                let function = expression.function.clone();
                Ok(Box::new(move |args: &[f64]| function(&args[..3])))
            }
            (Arity::SpaceTime, Arity::SpaceTime) => {
                let function = expression.function.clone();
                Ok(Box::new(move |args: &[f64]| function(args)))
            }
            (Arity::SpaceTime, Arity::Space) => Err(ExpressionError::ArityMismatch {
                name: name.to_string(),
                declared: Arity::SpaceTime,
                requested: Arity::Space,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Arity, ExpressionEvaluator, ExpressionTable};
    use crate::ExpressionError;
    use approx::assert_relative_eq;

    fn table() -> ExpressionTable {
        ExpressionTable::new()
            .with_space_expression("ramp", |x, y, z| x + 2. * y + 3. * z)
            .with_space_time_expression("pulse", |_, _, z, t| z * t)
    }

    #[test]
    fn space_expressions_compile_for_either_arity() {
        let table = table();
        let ramp = table.compile("ramp", Arity::Space).unwrap();
        assert_relative_eq!(ramp(&[1., 1., 1.]), 6.);
        let ramp = table.compile("ramp", Arity::SpaceTime).unwrap();
        assert_relative_eq!(ramp(&[1., 1., 1., 100.]), 6.);
    }

    #[test]
    fn time_dependent_expressions_need_a_time_argument() {
        let table = table();
        let pulse = table.compile("pulse", Arity::SpaceTime).unwrap();
        assert_relative_eq!(pulse(&[0., 0., 2., 0.5]), 1.);
        assert!(matches!(
            table.compile("pulse", Arity::Space),
            Err(ExpressionError::ArityMismatch { .. })
        ));
    }

    #[test]
    fn unknown_names_are_reported() {
        assert!(matches!(
            table().compile("missing", Arity::Space),
            Err(ExpressionError::Unknown(name)) if name == "missing"
        ));
    }
}
