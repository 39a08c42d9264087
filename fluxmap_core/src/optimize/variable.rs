//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

use derive_builder::Builder;

use crate::configuration;

/// A continuous variable of an optimization problem
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Variable {
    /// Used to identify the variable, unique within a problem
    #[builder(setter(into))]
    pub id: String,
    /// Optional human-readable name
    #[builder(setter(into, strip_option), default = "None")]
    pub name: Option<String>,
    /// Lowest value the variable can take
    #[builder(default = "0.")]
    pub lower_bound: f64,
    /// Highest value the variable can take
    #[builder(default = "configuration::current().upper_bound")]
    pub upper_bound: f64,
    /// Position of the variable within its problem, set when it is added
    #[builder(setter(skip), default = "0")]
    pub(crate) index: usize,
}

impl Variable {
    /// Whether the bounds pin the variable to a single value
    pub fn is_fixed(&self) -> bool {
        self.lower_bound == self.upper_bound
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <= {} <= {}", self.lower_bound, name, self.upper_bound),
            None => write!(f, "{} <= {} <= {}", self.lower_bound, self.id, self.upper_bound),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_variable() {
        let x = VariableBuilder::default()
            .id("x")
            .lower_bound(-2.)
            .upper_bound(5.)
            .build()
            .unwrap();
        assert_eq!(x.id, "x");
        assert!(!x.is_fixed());
        assert_eq!(format!("{}", x), "-2 <= x <= 5");

        let y = VariableBuilder::default()
            .id("y")
            .name("flux")
            .upper_bound(0.)
            .build()
            .unwrap();
        assert!(y.is_fixed());
        assert_eq!(format!("{}", y), "0 <= flux <= 0");
    }
}
