use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::benchmarks::catalog::{WorkloadParameter, IMPLEMENTATION_VAR, REPOSITORY_VAR};

/// A named axis of the benchmark matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterList {
    /// The variable name
    pub var: String,
    /// The values this variable takes
    pub values: Vec<String>,
}

/// A parameter matrix that contains all combinations of parameters
#[derive(Debug, Clone)]
pub struct ParameterMatrix {
    /// The list of parameter combinations
    pub combinations: Vec<HashMap<String, String>>,
}

impl ParameterMatrix {
    /// Create a new parameter matrix from a list of parameter lists.
    ///
    /// Earlier lists vary slowest.
    pub fn new(parameter_lists: &[ParameterList]) -> Self {
        let mut combinations = vec![HashMap::new()];

        for param_list in parameter_lists {
            let mut new_combinations = Vec::with_capacity(combinations.len() * param_list.values.len());

            for combination in combinations {
                for value in &param_list.values {
                    let mut new_combination = combination.clone();
                    new_combination.insert(param_list.var.clone(), value.clone());
                    new_combinations.push(new_combination);
                }
            }

            combinations = new_combinations;
        }

        Self { combinations }
    }

    /// Convert every combination carrying both an implementation and a
    /// repository into a workload
    pub fn workloads(&self) -> Vec<WorkloadParameter> {
        self.combinations
            .iter()
            .filter_map(|params| {
                Some(WorkloadParameter::new(
                    params.get(IMPLEMENTATION_VAR)?.clone(),
                    params.get(REPOSITORY_VAR)?.clone(),
                ))
            })
            .collect()
    }
}
