use std::{fmt, ops::RangeInclusive};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::{
    error::{DataValidationError, Result},
    model::model_params::{DeliveryCeilings, ModelParams},
    problem::{allocation_problem::AllocationProblem, cost_matrix::Minutes, priority::Priority},
};

/// One value of a swept parameter.
#[derive(Serialize, Deserialize, JsonSchema, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum SweepParameter {
    /// The solver's own parameters, unchanged.
    Baseline,
    /// Every courier gets this capacity.
    UniformCapacity { capacity: u32 },
    /// Added to every courier's capacity, floored at zero.
    CapacityDelta { delta: i64 },
    CourierCapacity { courier_id: String, capacity: u32 },
    /// Every courier gets `capacity * numerator / denominator + offset`,
    /// rounded down before the offset.
    CapacityScale {
        numerator: u32,
        denominator: u32,
        offset: u32,
    },
    PriorityWeight { priority: Priority, weight: f64 },
    DeliveryCeiling {
        priority: Priority,
        minutes: Option<Minutes>,
    },
    /// Replaces every ceiling at once.
    DeliveryCeilings { ceilings: DeliveryCeilings },
}

/// How a point derives its model from the base one.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PointSetup {
    /// Only capacity right-hand sides change, indexed by courier.
    PatchCapacities(Vec<u32>),
    Rebuild(ModelParams),
}

impl SweepParameter {
    pub(crate) fn setup(
        &self,
        problem: &AllocationProblem,
        base: &ModelParams,
    ) -> Result<PointSetup> {
        let capacities = problem.couriers().iter().map(|courier| courier.capacity());

        let setup = match self {
            SweepParameter::Baseline => PointSetup::Rebuild(base.clone()),
            SweepParameter::UniformCapacity { capacity } => {
                PointSetup::PatchCapacities(vec![*capacity; problem.couriers().len()])
            }
            SweepParameter::CapacityDelta { delta } => PointSetup::PatchCapacities(
                capacities
                    .map(|capacity| (i64::from(capacity) + delta).clamp(0, i64::from(u32::MAX)) as u32)
                    .collect(),
            ),
            SweepParameter::CourierCapacity {
                courier_id,
                capacity,
            } => {
                let target = problem.courier_index(courier_id).ok_or_else(|| {
                    DataValidationError::Malformed(format!("unknown courier `{courier_id}`"))
                })?;
                let mut capacities = capacities.collect::<Vec<_>>();
                capacities[target.get()] = *capacity;
                PointSetup::PatchCapacities(capacities)
            }
            SweepParameter::CapacityScale {
                numerator,
                denominator,
                offset,
            } => {
                if *denominator == 0 {
                    return Err(DataValidationError::Malformed(
                        "capacity scale with a zero denominator".to_owned(),
                    )
                    .into());
                }
                PointSetup::PatchCapacities(
                    capacities
                        .map(|capacity| {
                            let scaled = u64::from(capacity) * u64::from(*numerator)
                                / u64::from(*denominator)
                                + u64::from(*offset);
                            u32::try_from(scaled).unwrap_or(u32::MAX)
                        })
                        .collect(),
                )
            }
            SweepParameter::PriorityWeight { priority, weight } => PointSetup::Rebuild(ModelParams {
                weights: base.weights.with_weight(*priority, *weight),
                ..base.clone()
            }),
            SweepParameter::DeliveryCeiling { priority, minutes } => {
                PointSetup::Rebuild(ModelParams {
                    ceilings: base.ceilings.with_ceiling(*priority, *minutes),
                    ..base.clone()
                })
            }
            SweepParameter::DeliveryCeilings { ceilings } => PointSetup::Rebuild(ModelParams {
                ceilings: *ceilings,
                ..base.clone()
            }),
        };

        Ok(setup)
    }
}

impl fmt::Display for SweepParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepParameter::Baseline => write!(f, "baseline"),
            SweepParameter::UniformCapacity { capacity } => write!(f, "capacity={capacity}"),
            SweepParameter::CapacityDelta { delta } => write!(f, "capacity{delta:+}"),
            SweepParameter::CourierCapacity {
                courier_id,
                capacity,
            } => write!(f, "capacity[{courier_id}]={capacity}"),
            SweepParameter::CapacityScale {
                numerator,
                denominator,
                offset,
            } => write!(f, "capacity*{numerator}/{denominator}+{offset}"),
            SweepParameter::PriorityWeight { priority, weight } => {
                write!(f, "weight[{}]={weight}", priority.name())
            }
            SweepParameter::DeliveryCeiling {
                priority,
                minutes: Some(minutes),
            } => write!(f, "ceiling[{}]={minutes}", priority.name()),
            SweepParameter::DeliveryCeiling {
                priority,
                minutes: None,
            } => write!(f, "ceiling[{}]=none", priority.name()),
            SweepParameter::DeliveryCeilings { ceilings } => {
                let bounds = Priority::ALL
                    .iter()
                    .filter_map(|&priority| {
                        ceilings
                            .ceiling(priority)
                            .map(|minutes| format!("{}<={minutes}", priority.name()))
                    })
                    .collect::<Vec<_>>();
                write!(f, "ceilings[{}]", bounds.join(","))
            }
        }
    }
}

/// Each courier keeps half its capacity, plus one.
pub fn halved_capacity() -> SweepParameter {
    SweepParameter::CapacityScale {
        numerator: 1,
        denominator: 2,
        offset: 1,
    }
}

/// Uniform capacity points over `range`.
pub fn capacity_range(range: RangeInclusive<u32>) -> Vec<SweepParameter> {
    range
        .map(|capacity| SweepParameter::UniformCapacity { capacity })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::test_utils::fixed_problem;

    use super::*;

    fn problem() -> AllocationProblem {
        fixed_problem(&[2, 5], &[Priority::Normal], vec![vec![1.0], vec![2.0]])
    }

    #[test]
    fn test_capacity_range() {
        let points = capacity_range(1..=3);
        assert_eq!(points.len(), 3);
        assert_eq!(points[2], SweepParameter::UniformCapacity { capacity: 3 });
        assert_eq!(points[0].to_string(), "capacity=1");
    }

    #[test]
    fn test_capacity_delta_is_floored() {
        let setup = SweepParameter::CapacityDelta { delta: -3 }
            .setup(&problem(), &ModelParams::default())
            .unwrap();

        assert_eq!(setup, PointSetup::PatchCapacities(vec![0, 2]));
    }

    #[test]
    fn test_courier_capacity() {
        let setup = SweepParameter::CourierCapacity {
            courier_id: "c01".into(),
            capacity: 9,
        }
        .setup(&problem(), &ModelParams::default())
        .unwrap();
        assert_eq!(setup, PointSetup::PatchCapacities(vec![2, 9]));

        let unknown = SweepParameter::CourierCapacity {
            courier_id: "nobody".into(),
            capacity: 9,
        }
        .setup(&problem(), &ModelParams::default());
        assert!(unknown.is_err());
    }

    #[test]
    fn test_weight_point_rebuilds() {
        let setup = SweepParameter::PriorityWeight {
            priority: Priority::Express,
            weight: 10.0,
        }
        .setup(&problem(), &ModelParams::default())
        .unwrap();

        let PointSetup::Rebuild(params) = setup else {
            panic!("expected a rebuild");
        };
        assert_eq!(params.weights.express, 10.0);
        assert_eq!(params.weights.normal, 1.0);
    }

    #[test]
    fn test_deserialize_tagged() {
        let parameter: SweepParameter =
            serde_json::from_str(r#"{"type": "capacity_delta", "delta": 2}"#).unwrap();
        assert_eq!(parameter, SweepParameter::CapacityDelta { delta: 2 });
        assert_eq!(parameter.to_string(), "capacity+2");
    }

    #[test]
    fn test_capacity_scale_halves_each_courier() {
        let setup = halved_capacity()
            .setup(&problem(), &ModelParams::default())
            .unwrap();
        // 2 / 2 + 1 and 5 / 2 + 1
        assert_eq!(setup, PointSetup::PatchCapacities(vec![2, 3]));
        assert_eq!(halved_capacity().to_string(), "capacity*1/2+1");

        let zero = SweepParameter::CapacityScale {
            numerator: 1,
            denominator: 0,
            offset: 0,
        }
        .setup(&problem(), &ModelParams::default());
        assert!(zero.is_err());
    }

    #[test]
    fn test_ceilings_replace_all_at_once() {
        let ceilings = DeliveryCeilings::default()
            .with_ceiling(Priority::High, Some(45.0))
            .with_ceiling(Priority::Express, Some(30.0));
        let parameter = SweepParameter::DeliveryCeilings { ceilings };

        let setup = parameter
            .setup(&problem(), &ModelParams::default())
            .unwrap();
        assert_eq!(
            setup,
            PointSetup::Rebuild(ModelParams {
                ceilings,
                ..ModelParams::default()
            })
        );
        assert_eq!(parameter.to_string(), "ceilings[priority<=45,express<=30]");
        assert_eq!(SweepParameter::Baseline.to_string(), "baseline");
    }
}
