use std::sync::Arc;

use serde::de::DeserializeOwned;
use shared::{
    domain::{CaseBucket, PopSchedule, SimulationRun},
    protocol::RequestDescriptor,
};

use crate::{executor::RequestExecutor, store::ResourceStore};

pub const CASE_BUCKETS_PATH: &str = "/api/case-gen/get-case-buckets";
pub const SIM_RUNS_PATH: &str = "/api/simulation/get-sim-runs";
// Served without a leading slash; the executor resolves it root-relative.
pub const POP_SCHEDULES_PATH: &str = "api/scheduler/get-pop-schedules";

/// Record type listed by one fixed GET endpoint.
pub trait Resource: DeserializeOwned + Clone + Send + Sync + 'static {
    const STORE_ID: &'static str;
    const PATH: &'static str;

    fn descriptor() -> RequestDescriptor {
        RequestDescriptor::get(Self::PATH)
    }
}

impl Resource for CaseBucket {
    const STORE_ID: &'static str = "caseFileStore";
    const PATH: &'static str = CASE_BUCKETS_PATH;
}

impl Resource for SimulationRun {
    const STORE_ID: &'static str = "experimentStore";
    const PATH: &'static str = SIM_RUNS_PATH;
}

impl Resource for PopSchedule {
    const STORE_ID: &'static str = "scheduleStore";
    const PATH: &'static str = POP_SCHEDULES_PATH;
}

pub type CaseFileStore = ResourceStore<CaseBucket>;
pub type ExperimentStore = ResourceStore<SimulationRun>;
pub type ScheduleStore = ResourceStore<PopSchedule>;

impl<R: Resource> ResourceStore<R> {
    pub async fn load_resource<E>(executor: &E) -> Self
    where
        E: RequestExecutor + ?Sized,
    {
        Self::load(R::STORE_ID, R::descriptor(), executor).await
    }

    pub fn spawn_resource(executor: Arc<dyn RequestExecutor>) -> Arc<Self> {
        Self::spawn(R::STORE_ID, R::descriptor(), executor)
    }
}
