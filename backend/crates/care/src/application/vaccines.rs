//! Vaccine Catalogue Use Case

use std::sync::Arc;

use crate::domain::entity::vaccine::Vaccine;
use crate::domain::repository::VaccineRepository;
use crate::error::CareResult;

pub struct VaccineCatalogueUseCase<V>
where
    V: VaccineRepository,
{
    vaccines: Arc<V>,
}

impl<V> VaccineCatalogueUseCase<V>
where
    V: VaccineRepository,
{
    pub fn new(vaccines: Arc<V>) -> Self {
        Self { vaccines }
    }

    /// 名前順
    pub async fn list(&self) -> CareResult<Vec<Vaccine>> {
        self.vaccines.list_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::memory::MemoryCareRepository;

    #[tokio::test]
    async fn test_catalogue_is_sorted_by_name() {
        let repo = Arc::new(MemoryCareRepository::new());
        repo.add_vaccine("VPO", "VPO", 4);
        repo.add_vaccine("BCG", "BCG", 1);

        let names: Vec<_> = VaccineCatalogueUseCase::new(repo)
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        assert_eq!(names, ["BCG", "VPO"]);
    }
}
