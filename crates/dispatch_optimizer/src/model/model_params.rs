use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::DataValidationError,
    problem::{cost_matrix::Minutes, priority::Priority},
};

/// Objective multiplier per priority class.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, PartialEq)]
pub struct PriorityWeights {
    pub normal: f64,
    pub priority: f64,
    pub express: f64,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        PriorityWeights {
            normal: 1.0,
            priority: 2.0,
            express: 3.0,
        }
    }
}

impl PriorityWeights {
    pub fn uniform(weight: f64) -> Self {
        PriorityWeights {
            normal: weight,
            priority: weight,
            express: weight,
        }
    }

    pub fn weight(&self, priority: Priority) -> f64 {
        match priority {
            Priority::Normal => self.normal,
            Priority::High => self.priority,
            Priority::Express => self.express,
        }
    }

    pub fn with_weight(mut self, priority: Priority, weight: f64) -> Self {
        match priority {
            Priority::Normal => self.normal = weight,
            Priority::High => self.priority = weight,
            Priority::Express => self.express = weight,
        }
        self
    }

    pub fn validate(&self) -> Result<(), DataValidationError> {
        for priority in Priority::ALL {
            let weight = self.weight(priority);
            if !(weight.is_finite() && weight > 0.0) {
                return Err(DataValidationError::InvalidWeight {
                    priority: priority.code(),
                    weight,
                });
            }
        }
        Ok(())
    }
}

/// Optional maximum delivery time per priority class. Pairs above the
/// ceiling are pruned from the model.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, Default, PartialEq)]
pub struct DeliveryCeilings {
    pub normal: Option<Minutes>,
    pub priority: Option<Minutes>,
    pub express: Option<Minutes>,
}

impl DeliveryCeilings {
    pub fn ceiling(&self, priority: Priority) -> Option<Minutes> {
        match priority {
            Priority::Normal => self.normal,
            Priority::High => self.priority,
            Priority::Express => self.express,
        }
    }

    pub fn with_ceiling(mut self, priority: Priority, minutes: Option<Minutes>) -> Self {
        match priority {
            Priority::Normal => self.normal = minutes,
            Priority::High => self.priority = minutes,
            Priority::Express => self.express = minutes,
        }
        self
    }

    pub fn allows(&self, priority: Priority, time: Minutes) -> bool {
        self.ceiling(priority).is_none_or(|ceiling| time <= ceiling)
    }

    pub fn validate(&self) -> Result<(), DataValidationError> {
        for priority in Priority::ALL {
            if let Some(value) = self
                .ceiling(priority)
                .filter(|v| !(v.is_finite() && *v >= 0.0))
            {
                return Err(DataValidationError::InvalidNumber {
                    id: format!("ceilings.{}", priority.name()),
                    field: "minutes",
                    value,
                });
            }
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStyle {
    /// `cost * weight` on each assignment variable.
    #[default]
    DirectCost,
    /// One delivery-time variable per order linked to the assignment
    /// variables with big-M rows.
    BigM,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CapacityMeasure {
    /// Capacity counts orders.
    #[default]
    OrderCount,
    /// Capacity counts order size units.
    OrderSize,
}

#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct ModelParams {
    pub weights: PriorityWeights,
    pub ceilings: DeliveryCeilings,
    pub objective_style: ObjectiveStyle,
    pub capacity_measure: CapacityMeasure,
}
