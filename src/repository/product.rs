use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use diesel::upsert::excluded;

use crate::domain::observation::Observation;
use crate::domain::product::Product;
use crate::domain::types::ProductUrl;
use crate::models::product::{NewProduct, Product as DbProduct};
use crate::repository::{CatalogReader, CatalogWriter, DieselRepository, RepositoryResult};

fn upsert(conn: &mut SqliteConnection, product: &Product) -> QueryResult<usize> {
    use crate::schema::products;

    let now = Utc::now().naive_utc();
    diesel::insert_into(products::table)
        .values(&NewProduct::from_domain(product, now))
        .on_conflict(products::url)
        .do_update()
        .set((
            products::title.eq(excluded(products::title)),
            products::removed_at.eq(excluded(products::removed_at)),
            products::last_checked.eq(now),
        ))
        .execute(conn)
}

fn into_domain(rows: Vec<DbProduct>) -> RepositoryResult<Vec<Product>> {
    let products = rows
        .into_iter()
        .map(TryInto::try_into)
        .collect::<Result<Vec<Product>, _>>()?;
    Ok(products)
}

impl CatalogReader for DieselRepository {
    fn product_exists(&self, url: &ProductUrl) -> RepositoryResult<bool> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let exists = diesel::select(diesel::dsl::exists(
            products::table.filter(products::url.eq(url.as_str())),
        ))
        .get_result::<bool>(&mut conn)?;

        Ok(exists)
    }

    fn list_products(&self) -> RepositoryResult<Vec<Product>> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let rows = products::table
            .order((products::created_at.asc(), products::url.asc()))
            .select(DbProduct::as_select())
            .load(&mut conn)?;

        into_domain(rows)
    }

    fn list_available_products(&self) -> RepositoryResult<Vec<Product>> {
        use crate::schema::products;

        let mut conn = self.conn()?;

        let rows = products::table
            .filter(products::removed_at.is_null())
            .order((products::created_at.asc(), products::url.asc()))
            .select(DbProduct::as_select())
            .load(&mut conn)?;

        into_domain(rows)
    }

    fn list_observations(&self, url: &ProductUrl) -> RepositoryResult<Vec<Observation>> {
        self.load_observations(url)
    }
}

impl CatalogWriter for DieselRepository {
    fn upsert_product(&self, product: &Product) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        upsert(&mut conn, product)?;
        Ok(())
    }

    fn upsert_products(&self, products: &[Product]) -> RepositoryResult<()> {
        if products.is_empty() {
            return Ok(());
        }

        let mut conn = self.conn()?;
        conn.transaction::<_, diesel::result::Error, _>(|conn| {
            for product in products {
                upsert(conn, product)?;
            }
            Ok(())
        })?;
        Ok(())
    }

    fn append_observation(&self, observation: &Observation) -> RepositoryResult<()> {
        self.insert_observation(observation)
    }

    fn mark_removed(&self, url: &ProductUrl) -> RepositoryResult<()> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();

        diesel::update(
            products::table
                .filter(products::url.eq(url.as_str()))
                .filter(products::removed_at.is_null()),
        )
        .set((
            products::removed_at.eq(Some(now)),
            products::last_checked.eq(now),
        ))
        .execute(&mut conn)?;

        Ok(())
    }

    fn mark_available(&self, url: &ProductUrl) -> RepositoryResult<()> {
        use crate::schema::products;

        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();

        diesel::update(products::table.filter(products::url.eq(url.as_str())))
            .set((
                products::removed_at.eq(None::<chrono::NaiveDateTime>),
                products::last_checked.eq(now),
            ))
            .execute(&mut conn)?;

        Ok(())
    }
}
