use fxhash::FxHashMap;
use tracing::debug;

use crate::{
    error::{DispatchError, Result},
    problem::{courier::CourierIdx, order::OrderIdx},
    utils::max_flow::FlowGraph,
};

use super::{
    linear_model::{ConstraintClass, ConstraintIdx, LinearModel, VariableIdx},
    model_params::ModelParams,
};

/// Registry entry tying an assignment variable back to its pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentVariable {
    pub courier: CourierIdx,
    pub order: OrderIdx,
    pub variable: VariableIdx,
}

/// Output of the model builder: the solver-neutral [`LinearModel`] plus
/// everything needed to read a solution back in domain terms.
#[derive(Debug, Clone)]
pub struct AllocationModel {
    pub(super) linear: LinearModel,
    pub(super) params: ModelParams,
    /// Courier-major, so iteration order is (courier id, order id).
    pub(super) assignment_variables: Vec<AssignmentVariable>,
    pub(super) pair_lookup: FxHashMap<(CourierIdx, OrderIdx), VariableIdx>,
    pub(super) variable_pairs: Vec<Option<(CourierIdx, OrderIdx)>>,
    /// Eligible couriers per order, ascending.
    pub(super) candidates: Vec<Vec<CourierIdx>>,
    pub(super) capacity_rows: Vec<Option<ConstraintIdx>>,
    pub(super) active: Vec<bool>,
    pub(super) order_weights: Vec<f64>,
    pub(super) order_loads: Vec<u64>,
    pub(super) pruned_pairs: usize,
}

impl AllocationModel {
    pub fn linear_model(&self) -> &LinearModel {
        &self.linear
    }

    pub fn params(&self) -> &ModelParams {
        &self.params
    }

    pub fn num_couriers(&self) -> usize {
        self.capacity_rows.len()
    }

    pub fn num_orders(&self) -> usize {
        self.candidates.len()
    }

    pub fn assignment_variables(&self) -> &[AssignmentVariable] {
        &self.assignment_variables
    }

    pub fn variable(&self, courier: CourierIdx, order: OrderIdx) -> Option<VariableIdx> {
        self.pair_lookup.get(&(courier, order)).copied()
    }

    pub fn pair(&self, variable: VariableIdx) -> Option<(CourierIdx, OrderIdx)> {
        self.variable_pairs.get(variable.get()).copied().flatten()
    }

    pub fn candidates(&self, order: OrderIdx) -> &[CourierIdx] {
        &self.candidates[order.get()]
    }

    pub fn is_courier_active(&self, courier: CourierIdx) -> bool {
        self.active[courier.get()]
    }

    /// Objective weight of the order's priority.
    pub fn order_weight(&self, order: OrderIdx) -> f64 {
        self.order_weights[order.get()]
    }

    /// Capacity units the order consumes.
    pub fn order_load(&self, order: OrderIdx) -> u64 {
        self.order_loads[order.get()]
    }

    pub fn demand(&self) -> u64 {
        self.order_loads.iter().sum()
    }

    /// Pairs removed because the courier was inactive or the pair broke a
    /// delivery ceiling.
    pub fn pruned_pairs(&self) -> usize {
        self.pruned_pairs
    }

    pub fn capacity(&self, courier: CourierIdx) -> Option<u64> {
        self.capacity_rows[courier.get()].map(|row| self.linear.constraint(row).rhs() as u64)
    }

    /// Patches the capacity right-hand sides in place of a rebuild.
    /// `capacities` is indexed by courier; inactive couriers are ignored.
    pub fn with_capacities(&self, capacities: &[u32]) -> Result<AllocationModel> {
        if capacities.len() != self.num_couriers() {
            return Err(DispatchError::InternalConsistency(format!(
                "{} capacities given for {} couriers",
                capacities.len(),
                self.num_couriers()
            )));
        }

        let capacity = capacities
            .iter()
            .zip(&self.active)
            .filter(|(_, active)| **active)
            .map(|(&capacity, _)| u64::from(capacity))
            .sum::<u64>();
        let demand = self.demand();
        if capacity < demand {
            return Err(DispatchError::InfeasibleDemand { capacity, demand });
        }

        let mut model = self.clone();
        for (row, &capacity) in self.capacity_rows.iter().zip(capacities) {
            if let Some(row) = row {
                model.linear.set_rhs(*row, f64::from(capacity));
            }
        }

        debug!(capacity, demand, "patched capacity rows");
        Ok(model)
    }

    /// Most likely culprit when the solver proves infeasibility.
    ///
    /// `Assignment` when an order has no eligible courier left. `Capacity`
    /// when the eligible couriers cannot carry the demand that can only
    /// reach them, which is how ceiling pruning usually shows up, and also
    /// when loads fit as a flow but not as whole orders. Otherwise the
    /// delivery time links are blamed.
    pub fn diagnose_infeasibility(&self) -> ConstraintClass {
        if self.candidates.iter().any(|candidates| candidates.is_empty()) {
            return ConstraintClass::Assignment;
        }

        let demand = self.demand();
        let carried = self.eligible_throughput();
        debug!(demand, carried, "diagnosing infeasibility");

        let has_links = self
            .linear
            .constraints()
            .iter()
            .any(|constraint| constraint.class() == ConstraintClass::DeliveryTimeLink);

        if carried < demand || !has_links {
            ConstraintClass::Capacity
        } else {
            ConstraintClass::DeliveryTimeLink
        }
    }

    /// Largest load the eligible pairs can move into courier capacity,
    /// splitting orders freely.
    pub fn eligible_throughput(&self) -> u64 {
        let orders = self.num_orders();
        let couriers = self.num_couriers();
        let source = 0;
        let sink = orders + couriers + 1;
        let mut graph = FlowGraph::new(sink + 1);

        for order in OrderIdx::range(orders) {
            let node = 1 + order.get();
            graph.add_edge(source, node, self.order_load(order));
            for courier in self.candidates(order) {
                graph.add_edge(node, 1 + orders + courier.get(), u64::MAX);
            }
        }

        for courier in CourierIdx::range(couriers) {
            if let Some(capacity) = self.capacity(courier) {
                graph.add_edge(1 + orders + courier.get(), sink, capacity);
            }
        }

        graph.max_flow(source, sink)
    }

    /// Orders with no eligible courier left after pruning.
    pub fn uncoverable_orders(&self) -> impl Iterator<Item = OrderIdx> + '_ {
        OrderIdx::range(self.num_orders()).filter(|order| self.candidates(*order).is_empty())
    }
}
