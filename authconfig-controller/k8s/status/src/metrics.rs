use prometheus_client::{
    encoding::EncodeLabelSet,
    metrics::{counter::Counter, family::Family},
    registry::Registry,
};

#[derive(Clone, Debug)]
pub struct ControllerMetrics {
    reconciles: Family<ReconcileLabels, Counter>,
    status_updates: Family<UpdateLabels, Counter>,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct ReconcileLabels {
    outcome: &'static str,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
struct UpdateLabels {
    ready: &'static str,
}

// === impl ControllerMetrics ===

impl ControllerMetrics {
    pub fn register(reg: &mut Registry) -> Self {
        let reconciles = Family::<ReconcileLabels, Counter>::default();
        reg.register(
            "reconciles",
            "Count of AuthConfig reconciliations by outcome",
            reconciles.clone(),
        );

        let status_updates = Family::<UpdateLabels, Counter>::default();
        reg.register(
            "status_updates",
            "Count of AuthConfig status updates applied",
            status_updates.clone(),
        );

        Self {
            reconciles,
            status_updates,
        }
    }

    pub(crate) fn reconciled(&self, outcome: &'static str) {
        self.reconciles
            .get_or_create(&ReconcileLabels { outcome })
            .inc();
    }

    pub(crate) fn status_updated(&self, ready: bool) {
        let ready = if ready { "true" } else { "false" };
        self.status_updates
            .get_or_create(&UpdateLabels { ready })
            .inc();
    }

    #[cfg(test)]
    pub(crate) fn reconciles(&self, outcome: &'static str) -> u64 {
        self.reconciles
            .get_or_create(&ReconcileLabels { outcome })
            .get()
    }

    #[cfg(test)]
    pub(crate) fn status_updates(&self, ready: bool) -> u64 {
        let ready = if ready { "true" } else { "false" };
        self.status_updates
            .get_or_create(&UpdateLabels { ready })
            .get()
    }
}
