//! Strict fakes for the domain capabilities.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rokvi_core::{Car, CarRepository, ClockService};
use uuid::Uuid;

use crate::expectations::{ExpectationBuilder, MethodMock, Verifiable};

type ListResult = anyhow::Result<Vec<Car>>;
type GetResult = anyhow::Result<Option<Car>>;

/// Strict [`CarRepository`] fake. Clones share expectations.
#[derive(Debug, Clone)]
pub struct MockCarRepository {
    list: Arc<MethodMock<(), ListResult>>,
    get: Arc<MethodMock<Uuid, GetResult>>,
}

impl Default for MockCarRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCarRepository {
    /// Fake with no expectations; every call panics until one is set up.
    #[must_use]
    pub fn new() -> Self {
        Self {
            list: Arc::new(MethodMock::new("CarRepository::list")),
            get: Arc::new(MethodMock::new("CarRepository::get")),
        }
    }

    /// Expect `list`.
    #[must_use]
    pub fn expect_list(&self) -> ExpectationBuilder<'_, (), ListResult> {
        self.list.expect()
    }

    /// Expect `get`.
    #[must_use]
    pub fn expect_get(&self) -> ExpectationBuilder<'_, Uuid, GetResult> {
        self.get.expect()
    }
}

impl Verifiable for MockCarRepository {
    fn failures(&self) -> Vec<String> {
        let mut failures = self.list.failures();
        failures.extend(self.get.failures());
        failures
    }
}

#[async_trait]
impl CarRepository for MockCarRepository {
    async fn list(&self) -> anyhow::Result<Vec<Car>> {
        self.list.call(())
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Car>> {
        self.get.call(id)
    }
}

/// Strict [`ClockService`] fake. Clones share expectations.
#[derive(Debug, Clone)]
pub struct MockClockService {
    utc_now: Arc<MethodMock<(), DateTime<Utc>>>,
}

impl Default for MockClockService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockClockService {
    /// Fake with no expectations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            utc_now: Arc::new(MethodMock::new("ClockService::utc_now")),
        }
    }

    /// Expect `utc_now`.
    #[must_use]
    pub fn expect_utc_now(&self) -> ExpectationBuilder<'_, (), DateTime<Utc>> {
        self.utc_now.expect()
    }
}

impl Verifiable for MockClockService {
    fn failures(&self) -> Vec<String> {
        self.utc_now.failures()
    }
}

impl ClockService for MockClockService {
    fn utc_now(&self) -> DateTime<Utc> {
        self.utc_now.call(())
    }
}
