use diesel::prelude::*;

use crate::domain::observation::Observation;
use crate::domain::types::ProductUrl;
use crate::models::observation::{NewObservation, Observation as DbObservation};
use crate::repository::{DieselRepository, RepositoryResult};

impl DieselRepository {
    pub(crate) fn insert_observation(&self, observation: &Observation) -> RepositoryResult<()> {
        use crate::schema::product_checks;

        let row = NewObservation::try_from(observation)?;
        let mut conn = self.conn()?;

        diesel::insert_into(product_checks::table)
            .values(&row)
            .execute(&mut conn)?;

        Ok(())
    }

    pub(crate) fn load_observations(&self, url: &ProductUrl) -> RepositoryResult<Vec<Observation>> {
        use crate::schema::product_checks;

        let mut conn = self.conn()?;

        let rows = product_checks::table
            .filter(product_checks::product_url.eq(url.as_str()))
            .order((product_checks::checked_at.asc(), product_checks::id.asc()))
            .select(DbObservation::as_select())
            .load(&mut conn)?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
