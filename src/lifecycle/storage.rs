use std::collections::HashMap;
use uuid::Uuid;

use super::error::Error;
use crate::model::{
    ContainerResult, ExecutionContext, FixtureResult, ResultItem, Shared, StepResult, TestResult,
};

#[derive(Debug, Clone)]
pub(crate) enum StoredResult {
    Container(Shared<ContainerResult>),
    Fixture(Shared<FixtureResult>),
    Test(Shared<TestResult>),
    Step(Shared<StepResult>),
}

impl StoredResult {
    fn uuid(&self) -> Uuid {
        match self {
            StoredResult::Container(container) => container.uuid(),
            StoredResult::Fixture(fixture) => fixture.uuid(),
            StoredResult::Test(test) => test.uuid(),
            StoredResult::Step(step) => step.uuid(),
        }
    }
}

impl From<Shared<ContainerResult>> for StoredResult {
    fn from(container: Shared<ContainerResult>) -> Self {
        StoredResult::Container(container)
    }
}

impl From<Shared<FixtureResult>> for StoredResult {
    fn from(fixture: Shared<FixtureResult>) -> Self {
        StoredResult::Fixture(fixture)
    }
}

impl From<Shared<TestResult>> for StoredResult {
    fn from(test: Shared<TestResult>) -> Self {
        StoredResult::Test(test)
    }
}

impl From<Shared<StepResult>> for StoredResult {
    fn from(step: Shared<StepResult>) -> Self {
        StoredResult::Step(step)
    }
}

/// Registry of the results that are currently part of the run, keyed by
/// uuid. Typed getters fail with not-found when the uuid is absent or
/// held by a different kind; the lifecycle always catches that.
#[derive(Debug, Default)]
pub(crate) struct ResultStorage {
    results: HashMap<Uuid, StoredResult>,
}

impl ResultStorage {
    pub fn set(&mut self, result: impl Into<StoredResult>) {
        let result = result.into();
        self.results.insert(result.uuid(), result);
    }

    pub fn container(&self, uuid: Uuid) -> Result<Shared<ContainerResult>, Error> {
        match self.results.get(&uuid) {
            Some(StoredResult::Container(container)) => Ok(container.clone()),
            _ => Err(Error::NotFound {
                expected: "container",
                uuid,
            }),
        }
    }

    pub fn fixture(&self, uuid: Uuid) -> Result<Shared<FixtureResult>, Error> {
        match self.results.get(&uuid) {
            Some(StoredResult::Fixture(fixture)) => Ok(fixture.clone()),
            _ => Err(Error::NotFound {
                expected: "fixture",
                uuid,
            }),
        }
    }

    pub fn test(&self, uuid: Uuid) -> Result<Shared<TestResult>, Error> {
        match self.results.get(&uuid) {
            Some(StoredResult::Test(test)) => Ok(test.clone()),
            _ => Err(Error::NotFound {
                expected: "test",
                uuid,
            }),
        }
    }

    pub fn step(&self, uuid: Uuid) -> Result<Shared<StepResult>, Error> {
        match self.results.get(&uuid) {
            Some(StoredResult::Step(step)) => Ok(step.clone()),
            _ => Err(Error::NotFound {
                expected: "step",
                uuid,
            }),
        }
    }

    pub fn execution_context(&self, uuid: Uuid) -> Result<ExecutionContext, Error> {
        match self.results.get(&uuid) {
            Some(StoredResult::Fixture(fixture)) => Ok(ExecutionContext::Fixture(fixture.clone())),
            Some(StoredResult::Test(test)) => Ok(ExecutionContext::Test(test.clone())),
            Some(StoredResult::Step(step)) => Ok(ExecutionContext::Step(step.clone())),
            _ => Err(Error::NotFound {
                expected: "execution context",
                uuid,
            }),
        }
    }

    pub fn unset(&mut self, uuid: Uuid) {
        self.results.remove(&uuid);
    }
}

#[cfg(test)]
mod tests {

    use uuid::Uuid;

    use super::ResultStorage;
    use crate::lifecycle::error::Error;
    use crate::model::{ContainerResult, Shared, StepResult, TestResult};

    #[test]
    fn test_typed_getter_rejects_a_different_kind() {
        let mut storage = ResultStorage::default();
        let step = Shared::new(StepResult::new("click".to_owned()));
        let uuid = step.uuid();
        storage.set(step);

        assert!(storage.step(uuid).is_ok());
        assert_eq!(
            storage.test(uuid).unwrap_err(),
            Error::NotFound {
                expected: "test",
                uuid,
            }
        );
    }

    #[test]
    fn test_execution_context_covers_tests_but_not_containers() {
        let mut storage = ResultStorage::default();
        let container = Shared::new(ContainerResult::new());
        let container_uuid = container.uuid();
        let test = Shared::new(TestResult::new("case".to_owned()));
        let test_uuid = test.uuid();
        storage.set(container);
        storage.set(test);

        assert!(storage.execution_context(test_uuid).is_ok());
        assert!(storage.execution_context(container_uuid).is_err());
    }

    #[test]
    fn test_unset_forgets_the_result() {
        let mut storage = ResultStorage::default();
        let test = Shared::new(TestResult::new("case".to_owned()));
        let uuid = test.uuid();
        storage.set(test);

        storage.unset(uuid);

        assert!(storage.test(uuid).is_err());
        storage.unset(Uuid::new_v4());
    }
}
