//! Conference catalog use-case service.
//!
//! # Responsibility
//! - Sponsor, conference and edition CRUD for the admin surface.
//! - Keep `parent_id` chains acyclic and bounded.
//!
//! # Invariants
//! - A conference (edition) is never its own ancestor; the repository checks
//!   this on every write.
//! - Ancestor walks stop after `MAX_PARENT_DEPTH` links.

use crate::model::conference::{
    Conference, ConferenceEdition, ConferenceEditionId, ConferenceId, Sponsor, SponsorId,
};
use crate::model::validation::normalize_country;
use crate::repo::common::{DeleteMode, RepoError};
use crate::repo::conference_repo::ConferenceRepository;
use crate::service::MAX_PARENT_DEPTH;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from conference service operations.
#[derive(Debug)]
pub enum ConferenceServiceError {
    /// Setting `parent_id` would make the row its own ancestor.
    CycleDetected { id: Uuid, parent_id: Uuid },
    /// Parent chain exceeds `MAX_PARENT_DEPTH`.
    ParentChainTooDeep { id: Uuid, max_depth: usize },
    /// Repository-level failure.
    Repo(RepoError),
}

impl Display for ConferenceServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CycleDetected { id, parent_id } => write!(
                f,
                "parent {parent_id} would make {id} its own ancestor"
            ),
            Self::ParentChainTooDeep { id, max_depth } => write!(
                f,
                "parent chain of {id} is deeper than {max_depth} links"
            ),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ConferenceServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ConferenceServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::ParentCycle { id, parent_id } => Self::CycleDetected { id, parent_id },
            RepoError::ParentChainTooDeep { id, max_depth } => {
                Self::ParentChainTooDeep { id, max_depth }
            }
            other => Self::Repo(other),
        }
    }
}

pub type ConferenceServiceResult<T> = Result<T, ConferenceServiceError>;

/// Conference catalog service facade.
pub struct ConferenceService<R: ConferenceRepository> {
    repo: R,
}

impl<R: ConferenceRepository> ConferenceService<R> {
    /// Creates service from repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_sponsor(&self, sponsor: &Sponsor) -> ConferenceServiceResult<Sponsor> {
        let id = self.repo.create_sponsor(sponsor)?;
        self.load_sponsor(id)
    }

    pub fn update_sponsor(&self, sponsor: &Sponsor) -> ConferenceServiceResult<Sponsor> {
        self.repo.update_sponsor(sponsor)?;
        self.load_sponsor(sponsor.id)
    }

    pub fn get_sponsor(&self, id: SponsorId) -> ConferenceServiceResult<Option<Sponsor>> {
        Ok(self.repo.get_sponsor(id)?)
    }

    pub fn list_sponsors(&self) -> ConferenceServiceResult<Vec<Sponsor>> {
        Ok(self.repo.list_sponsors()?)
    }

    pub fn delete_sponsor(&self, id: SponsorId) -> ConferenceServiceResult<()> {
        self.repo.delete_sponsor(id)?;
        info!("event=catalog_delete module=service entity=sponsor status=ok");
        Ok(())
    }

    pub fn create_conference(&self, conference: &Conference) -> ConferenceServiceResult<Conference> {
        let id = self.repo.create_conference(conference)?;
        self.load_conference(id)
    }

    pub fn update_conference(&self, conference: &Conference) -> ConferenceServiceResult<Conference> {
        self.repo.update_conference(conference)?;
        self.load_conference(conference.id)
    }

    pub fn get_conference(&self, id: ConferenceId) -> ConferenceServiceResult<Option<Conference>> {
        Ok(self.repo.get_conference(id)?)
    }

    pub fn list_conferences(&self) -> ConferenceServiceResult<Vec<Conference>> {
        Ok(self.repo.list_conferences()?)
    }

    pub fn delete_conference(
        &self,
        id: ConferenceId,
        mode: DeleteMode,
    ) -> ConferenceServiceResult<()> {
        self.repo.delete_conference(id, mode)?;
        info!("event=catalog_delete module=service entity=conference mode={mode:?} status=ok");
        Ok(())
    }

    /// Returns the parent chain of a conference, nearest parent first.
    pub fn conference_ancestors(&self, id: ConferenceId) -> ConferenceServiceResult<Vec<Conference>> {
        let conference = self.load_conference(id)?;
        let mut ancestors = Vec::new();
        let mut cursor = conference.parent_id;
        while let Some(current) = cursor {
            if ancestors.len() == MAX_PARENT_DEPTH {
                return Err(ConferenceServiceError::ParentChainTooDeep {
                    id,
                    max_depth: MAX_PARENT_DEPTH,
                });
            }
            let parent = self.load_conference(current)?;
            cursor = parent.parent_id;
            ancestors.push(parent);
        }
        Ok(ancestors)
    }

    /// Creates an edition with its country code normalized to upper case.
    pub fn create_edition(
        &self,
        edition: &ConferenceEdition,
    ) -> ConferenceServiceResult<ConferenceEdition> {
        let edition = normalized_edition(edition);
        let id = self.repo.create_edition(&edition)?;
        self.load_edition(id)
    }

    pub fn update_edition(
        &self,
        edition: &ConferenceEdition,
    ) -> ConferenceServiceResult<ConferenceEdition> {
        let edition = normalized_edition(edition);
        self.repo.update_edition(&edition)?;
        self.load_edition(edition.id)
    }

    pub fn get_edition(
        &self,
        id: ConferenceEditionId,
    ) -> ConferenceServiceResult<Option<ConferenceEdition>> {
        Ok(self.repo.get_edition(id)?)
    }

    pub fn list_editions(
        &self,
        conference_id: Option<ConferenceId>,
    ) -> ConferenceServiceResult<Vec<ConferenceEdition>> {
        Ok(self.repo.list_editions(conference_id)?)
    }

    pub fn delete_edition(
        &self,
        id: ConferenceEditionId,
        mode: DeleteMode,
    ) -> ConferenceServiceResult<()> {
        self.repo.delete_edition(id, mode)?;
        info!(
            "event=catalog_delete module=service entity=conference_edition mode={mode:?} status=ok"
        );
        Ok(())
    }

    /// Returns the parent chain of an edition, nearest parent first.
    pub fn edition_ancestors(
        &self,
        id: ConferenceEditionId,
    ) -> ConferenceServiceResult<Vec<ConferenceEdition>> {
        let edition = self.load_edition(id)?;
        let mut ancestors = Vec::new();
        let mut cursor = edition.parent_id;
        while let Some(current) = cursor {
            if ancestors.len() == MAX_PARENT_DEPTH {
                return Err(ConferenceServiceError::ParentChainTooDeep {
                    id,
                    max_depth: MAX_PARENT_DEPTH,
                });
            }
            let parent = self.load_edition(current)?;
            cursor = parent.parent_id;
            ancestors.push(parent);
        }
        Ok(ancestors)
    }

    fn load_sponsor(&self, id: SponsorId) -> ConferenceServiceResult<Sponsor> {
        self.repo
            .get_sponsor(id)?
            .ok_or(ConferenceServiceError::Repo(RepoError::NotFound {
                entity: "sponsor",
                id,
            }))
    }

    fn load_conference(&self, id: ConferenceId) -> ConferenceServiceResult<Conference> {
        self.repo
            .get_conference(id)?
            .ok_or(ConferenceServiceError::Repo(RepoError::NotFound {
                entity: "conference",
                id,
            }))
    }

    fn load_edition(&self, id: ConferenceEditionId) -> ConferenceServiceResult<ConferenceEdition> {
        self.repo
            .get_edition(id)?
            .ok_or(ConferenceServiceError::Repo(RepoError::NotFound {
                entity: "conference edition",
                id,
            }))
    }
}

fn normalized_edition(edition: &ConferenceEdition) -> ConferenceEdition {
    ConferenceEdition {
        country: normalize_country(&edition.country),
        ..edition.clone()
    }
}
