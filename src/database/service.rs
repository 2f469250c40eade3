//! Database service layer
//!
//! This module provides a high-level interface to database operations

use crate::database::{DatabasePool, EventRepository, ParticipationRepository, SlotRepository, UserRepository};

/// Postgres-backed implementation of the store contracts
#[derive(Debug, Clone)]
pub struct DatabaseService {
    pub(crate) pool: DatabasePool,
    pub users: UserRepository,
    pub events: EventRepository,
    pub slots: SlotRepository,
    pub participations: ParticipationRepository,
}

impl DatabaseService {
    pub fn new(pool: DatabasePool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            slots: SlotRepository::new(pool.clone()),
            participations: ParticipationRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}
