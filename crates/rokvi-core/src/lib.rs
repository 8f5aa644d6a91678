//! Capability interfaces and DTOs consumed by the Rokvi host.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Car {
    pub id: Uuid,
    pub registration: String,
    pub make: String,
    pub model: String,
    pub year: u16,
}

#[async_trait]
pub trait CarRepository: Send + Sync {
    async fn list(&self) -> anyhow::Result<Vec<Car>>;
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Car>>;
}

pub trait ClockService: Send + Sync {
    fn utc_now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl ClockService for SystemClock {
    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Process-local repository; contents are lost on restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCarRepository {
    cars: Arc<RwLock<Vec<Car>>>,
}

impl InMemoryCarRepository {
    #[must_use]
    pub fn new(cars: Vec<Car>) -> Self {
        Self {
            cars: Arc::new(RwLock::new(cars)),
        }
    }

    fn snapshot(&self) -> anyhow::Result<Vec<Car>> {
        self.cars
            .read()
            .map(|cars| cars.clone())
            .map_err(|_| anyhow::anyhow!("car store lock poisoned"))
    }
}

#[async_trait]
impl CarRepository for InMemoryCarRepository {
    async fn list(&self) -> anyhow::Result<Vec<Car>> {
        self.snapshot()
    }

    async fn get(&self, id: Uuid) -> anyhow::Result<Option<Car>> {
        Ok(self.snapshot()?.into_iter().find(|car| car.id == id))
    }
}
