//! University and division use-case service.
//!
//! # Invariants
//! - Country codes are stored upper case.

use crate::model::university::{
    University, UniversityDivision, UniversityDivisionId, UniversityId,
};
use crate::model::validation::normalize_country;
use crate::repo::common::{DeleteMode, RepoError, RepoResult};
use crate::repo::university_repo::UniversityRepository;
use log::info;

/// University catalog service facade.
pub struct UniversityService<R: UniversityRepository> {
    repo: R,
}

impl<R: UniversityRepository> UniversityService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn create_university(&self, university: &University) -> RepoResult<University> {
        let university = normalized_university(university);
        let id = self.repo.create_university(&university)?;
        self.load_university(id)
    }

    pub fn update_university(&self, university: &University) -> RepoResult<University> {
        let university = normalized_university(university);
        self.repo.update_university(&university)?;
        self.load_university(university.id)
    }

    pub fn get_university(&self, id: UniversityId) -> RepoResult<Option<University>> {
        self.repo.get_university(id)
    }

    pub fn list_universities(&self) -> RepoResult<Vec<University>> {
        self.repo.list_universities()
    }

    /// Deletes a university. `Restrict` fails while divisions exist;
    /// `Cascade` removes divisions, their calls, deadlines and messages.
    pub fn delete_university(&self, id: UniversityId, mode: DeleteMode) -> RepoResult<()> {
        self.repo.delete_university(id, mode)?;
        info!("event=catalog_delete module=service entity=university mode={mode:?} status=ok");
        Ok(())
    }

    pub fn create_division(&self, division: &UniversityDivision) -> RepoResult<UniversityDivision> {
        let id = self.repo.create_division(division)?;
        self.load_division(id)
    }

    pub fn update_division(&self, division: &UniversityDivision) -> RepoResult<UniversityDivision> {
        self.repo.update_division(division)?;
        self.load_division(division.id)
    }

    pub fn get_division(&self, id: UniversityDivisionId) -> RepoResult<Option<UniversityDivision>> {
        self.repo.get_division(id)
    }

    pub fn list_divisions(
        &self,
        university_id: Option<UniversityId>,
    ) -> RepoResult<Vec<UniversityDivision>> {
        self.repo.list_divisions(university_id)
    }

    pub fn delete_division(&self, id: UniversityDivisionId, mode: DeleteMode) -> RepoResult<()> {
        self.repo.delete_division(id, mode)?;
        info!(
            "event=catalog_delete module=service entity=university_division mode={mode:?} status=ok"
        );
        Ok(())
    }

    fn load_university(&self, id: UniversityId) -> RepoResult<University> {
        self.repo.get_university(id)?.ok_or(RepoError::NotFound {
            entity: "university",
            id,
        })
    }

    fn load_division(&self, id: UniversityDivisionId) -> RepoResult<UniversityDivision> {
        self.repo.get_division(id)?.ok_or(RepoError::NotFound {
            entity: "university division",
            id,
        })
    }
}

fn normalized_university(university: &University) -> University {
    University {
        country: normalize_country(&university.country),
        ..university.clone()
    }
}
