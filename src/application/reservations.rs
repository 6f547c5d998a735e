use crate::domain::ports::{SpaceStoreBox, StatusSwap};
use crate::domain::space::{NewSpace, ParkingSpace, SpaceFilter, SpaceId, SpacePatch, SpaceStatus};
use crate::error::{ParkingError, Result};

/// Owns the availability flag of every parking space.
///
/// `reserve` and `release` are guarded transitions delegated to the store's
/// atomic `swap_status`, so of two concurrent `reserve` calls on one space
/// exactly one wins. Queries read a snapshot and never mutate.
pub struct ReservationService {
    store: SpaceStoreBox,
}

impl ReservationService {
    pub fn new(store: SpaceStoreBox) -> Self {
        Self { store }
    }

    pub async fn register(&self, space: NewSpace) -> Result<ParkingSpace> {
        space.validate()?;
        let space = self.store.insert(space).await?;
        tracing::info!(space_id = space.id, zone = %space.zone, "registered parking space");
        Ok(space)
    }

    /// `Available -> Occupied`.
    pub async fn reserve(&self, id: SpaceId) -> Result<ParkingSpace> {
        self.transition(id, SpaceStatus::Available, SpaceStatus::Occupied)
            .await
    }

    /// `Occupied -> Available`.
    pub async fn release(&self, id: SpaceId) -> Result<ParkingSpace> {
        self.transition(id, SpaceStatus::Occupied, SpaceStatus::Available)
            .await
    }

    async fn transition(
        &self,
        id: SpaceId,
        from: SpaceStatus,
        to: SpaceStatus,
    ) -> Result<ParkingSpace> {
        match self.store.swap_status(id, Some(from), to).await? {
            Some(StatusSwap::Applied(space)) => {
                tracing::info!(space_id = id, %from, %to, "space status changed");
                Ok(space)
            }
            Some(StatusSwap::Rejected(space)) => {
                tracing::warn!(space_id = id, status = %space.status, "transition rejected");
                Err(match space.status {
                    SpaceStatus::Occupied => ParkingError::AlreadyOccupied(id),
                    SpaceStatus::Available => ParkingError::AlreadyAvailable(id),
                })
            }
            None => Err(ParkingError::SpaceNotFound(id)),
        }
    }

    /// Administrative overwrite of the status, bypassing the transition guard.
    pub async fn set_status(&self, id: SpaceId, available: bool) -> Result<ParkingSpace> {
        let next = SpaceStatus::from_available(available);
        match self.store.swap_status(id, None, next).await? {
            Some(StatusSwap::Applied(space)) => {
                tracing::info!(space_id = id, status = %next, "space status overwritten");
                Ok(space)
            }
            Some(StatusSwap::Rejected(_)) => Err(ParkingError::Storage(format!(
                "unconditional status write on space {id} was rejected"
            ))),
            None => Err(ParkingError::SpaceNotFound(id)),
        }
    }

    /// Like [`set_status`](Self::set_status), from a textual token such as
    /// `"available"` or `"occupied"`.
    pub async fn set_status_token(&self, id: SpaceId, token: &str) -> Result<ParkingSpace> {
        let status: SpaceStatus = token.parse()?;
        self.set_status(id, status.is_available()).await
    }

    /// An empty patch writes nothing and returns the space as stored.
    pub async fn update(&self, id: SpaceId, patch: SpacePatch) -> Result<ParkingSpace> {
        if patch.is_empty() {
            return self.get(id).await;
        }
        patch.validate()?;
        let space = self
            .store
            .patch(id, &patch)
            .await?
            .ok_or(ParkingError::SpaceNotFound(id))?;
        tracing::info!(space_id = id, "updated parking space");
        Ok(space)
    }

    pub async fn delete(&self, id: SpaceId) -> Result<()> {
        if !self.store.remove(id).await? {
            return Err(ParkingError::SpaceNotFound(id));
        }
        tracing::info!(space_id = id, "deleted parking space");
        Ok(())
    }

    pub async fn get(&self, id: SpaceId) -> Result<ParkingSpace> {
        self.store
            .get(id)
            .await?
            .ok_or(ParkingError::SpaceNotFound(id))
    }

    pub async fn list(&self) -> Result<Vec<ParkingSpace>> {
        self.store.get_all().await
    }

    pub async fn filter(&self, filter: &SpaceFilter) -> Result<Vec<ParkingSpace>> {
        let mut spaces = self.store.get_all().await?;
        spaces.retain(|space| filter.matches(space));
        Ok(spaces)
    }

    /// Available spaces whose zone equals `zone` exactly.
    pub async fn available_in_zone(&self, zone: &str) -> Result<Vec<ParkingSpace>> {
        let mut spaces = self.store.get_all().await?;
        spaces.retain(|space| space.is_available() && space.zone == zone);
        Ok(spaces)
    }
}
