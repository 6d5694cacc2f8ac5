//! SQLite [`Store`] backend built on diesel.
//!
//! Each upsert maps to a typed `INSERT .. ON CONFLICT (..) DO UPDATE .. RETURNING`
//! against the table's unique constraint. A batch runs inside one
//! `BEGIN IMMEDIATE` transaction, so a batch either lands completely or not at
//! all. Lookups are ordered by id so callers see a stable "first" row.
//!
//! Substring lookups fold case in Rust: SQLite `LIKE` only folds ASCII, and
//! names such as "Nova Iguaçu" must match "NOVA IGUAÇU".
//!
//! The connection sits behind an async mutex: the pipeline issues one call at a
//! time, and the CLI owns a single connection for the whole run.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::{SqliteConnection, insert_into};
use tokio::sync::Mutex;

use super::{
    AcceptanceAssociation, EntityRef, PartnerRecord, PriceAssociation, Record, Store, StoreResult,
    StoreError, Table, check_conflict_key, check_name_column, check_records,
    contains_ignore_case,
};
use crate::db::connection::connect_sqlite;
use crate::models::{NewAcceptance, NewPartner, NewPrice};
use crate::schema::{
    convenio_vacina_precos as cvp, convenios, ref_vacinas, unidade, unidade_convenios as uc,
};
use crate::verify::{VerifyReport, read_report};

/// Diesel-backed store over one SQLite connection.
pub struct SqliteStore {
    conn: Mutex<SqliteConnection>,
}

impl SqliteStore {
    /// Open an existing database at `database_url` with the standard PRAGMAs
    /// (see [`connect_sqlite`]) and check that the reference tables are there.
    pub fn connect(database_url: &str) -> StoreResult<Self> {
        let mut conn = connect_sqlite(database_url)?;
        check_schema(&mut conn)
            .map_err(|e| StoreError::Connection(format!("{database_url}: {e}")))?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already-open connection.
    pub fn from_connection(conn: SqliteConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Read-only summary of what is stored (see [`crate::verify`]).
    pub async fn verify_report(&self) -> StoreResult<VerifyReport> {
        let mut conn = self.conn.lock().await;
        read_report(&mut conn)
    }

    /// Give the connection back, e.g. for assertions in tests.
    pub fn into_inner(self) -> SqliteConnection {
        self.conn.into_inner()
    }
}

/// Fails unless every table the importer touches exists.
fn check_schema(conn: &mut SqliteConnection) -> QueryResult<()> {
    convenios::table.select(convenios::id).limit(0).load::<i64>(conn)?;
    unidade::table.select(unidade::id).limit(0).load::<i64>(conn)?;
    ref_vacinas::table.select(ref_vacinas::id).limit(0).load::<i64>(conn)?;
    cvp::table.select(cvp::id).limit(0).load::<i64>(conn)?;
    uc::table.select(uc::id).limit(0).load::<i64>(conn)?;
    Ok(())
}

fn to_refs(rows: Vec<(i64, String)>) -> Vec<EntityRef> {
    rows.into_iter()
        .map(|(id, name)| EntityRef { id, name })
        .collect()
}

fn upsert_partner(conn: &mut SqliteConnection, p: &PartnerRecord) -> QueryResult<PartnerRecord> {
    let row = NewPartner {
        nome: &p.name,
        ativo: p.active,
    };
    let (id, name, active) = insert_into(convenios::table)
        .values(&row)
        .on_conflict(convenios::nome)
        .do_update()
        .set(convenios::ativo.eq(p.active))
        .returning((convenios::id, convenios::nome, convenios::ativo))
        .get_result::<(i64, String, bool)>(conn)?;
    Ok(PartnerRecord {
        id: Some(id),
        name,
        active,
    })
}

fn upsert_price(conn: &mut SqliteConnection, p: &PriceAssociation) -> QueryResult<PriceAssociation> {
    let row = NewPrice {
        convenio_id: p.partner_id,
        vacina_id: p.item_id,
        preco: p.price,
        ativo: p.active,
    };
    let (partner_id, item_id, price, active) = insert_into(cvp::table)
        .values(&row)
        .on_conflict((cvp::convenio_id, cvp::vacina_id))
        .do_update()
        .set((cvp::preco.eq(p.price), cvp::ativo.eq(p.active)))
        .returning((cvp::convenio_id, cvp::vacina_id, cvp::preco, cvp::ativo))
        .get_result::<(i64, i64, f64, bool)>(conn)?;
    Ok(PriceAssociation {
        partner_id,
        item_id,
        price,
        active,
    })
}

fn upsert_acceptance(
    conn: &mut SqliteConnection,
    a: &AcceptanceAssociation,
) -> QueryResult<AcceptanceAssociation> {
    let row = NewAcceptance {
        unidade_id: a.site_id,
        convenio_id: a.partner_id,
        aceita: a.accepted,
    };
    let (site_id, partner_id, accepted) = insert_into(uc::table)
        .values(&row)
        .on_conflict((uc::unidade_id, uc::convenio_id))
        .do_update()
        .set(uc::aceita.eq(a.accepted))
        .returning((uc::unidade_id, uc::convenio_id, uc::aceita))
        .get_result::<(i64, i64, bool)>(conn)?;
    Ok(AcceptanceAssociation {
        site_id,
        partner_id,
        accepted,
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn query_exact(
        &self,
        table: Table,
        column: &str,
        value: &str,
    ) -> StoreResult<Vec<EntityRef>> {
        check_name_column(table, column)?;
        let mut conn = self.conn.lock().await;
        let conn = &mut *conn;
        let rows = match table {
            Table::Partners => convenios::table
                .filter(convenios::nome.eq(value))
                .select((convenios::id, convenios::nome))
                .order(convenios::id.asc())
                .load::<(i64, String)>(conn)?,
            Table::Sites => unidade::table
                .filter(unidade::nome.eq(value))
                .select((unidade::id, unidade::nome))
                .order(unidade::id.asc())
                .load::<(i64, String)>(conn)?,
            Table::CatalogItems => ref_vacinas::table
                .filter(ref_vacinas::nome.eq(value))
                .select((ref_vacinas::id, ref_vacinas::nome))
                .order(ref_vacinas::id.asc())
                .load::<(i64, String)>(conn)?,
            Table::PriceAssociations | Table::AcceptanceAssociations => Vec::new(),
        };
        Ok(to_refs(rows))
    }

    async fn query_contains(
        &self,
        table: Table,
        column: &str,
        fragment: &str,
    ) -> StoreResult<Vec<EntityRef>> {
        check_name_column(table, column)?;
        let mut conn = self.conn.lock().await;
        let conn = &mut *conn;
        let rows = match table {
            Table::Partners => convenios::table
                .select((convenios::id, convenios::nome))
                .order(convenios::id.asc())
                .load::<(i64, String)>(conn)?,
            Table::Sites => unidade::table
                .select((unidade::id, unidade::nome))
                .order(unidade::id.asc())
                .load::<(i64, String)>(conn)?,
            Table::CatalogItems => ref_vacinas::table
                .select((ref_vacinas::id, ref_vacinas::nome))
                .order(ref_vacinas::id.asc())
                .load::<(i64, String)>(conn)?,
            Table::PriceAssociations | Table::AcceptanceAssociations => Vec::new(),
        };
        Ok(to_refs(rows)
            .into_iter()
            .filter(|e| contains_ignore_case(&e.name, fragment))
            .collect())
    }

    async fn upsert(
        &self,
        table: Table,
        records: Vec<Record>,
        conflict_key: &[&str],
    ) -> StoreResult<Vec<Record>> {
        check_conflict_key(table, conflict_key)?;
        check_records(table, &records)?;
        let mut conn = self.conn.lock().await;
        let out = conn.immediate_transaction::<_, diesel::result::Error, _>(|conn| {
            records
                .iter()
                .map(|record| match record {
                    Record::Partner(p) => upsert_partner(conn, p).map(Record::Partner),
                    Record::Price(p) => upsert_price(conn, p).map(Record::Price),
                    Record::Acceptance(a) => upsert_acceptance(conn, a).map(Record::Acceptance),
                })
                .collect()
        })?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrate;

    #[tokio::test]
    async fn connect_refuses_database_without_reference_tables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.db");
        SqliteConnection::establish(path.to_str().unwrap()).unwrap();

        let err = SqliteStore::connect(path.to_str().unwrap()).err().unwrap();
        assert!(matches!(err, StoreError::Connection(ref m) if m.contains("convenios")));

        migrate::run_sqlite(path.to_str().unwrap()).unwrap();
        assert!(SqliteStore::connect(path.to_str().unwrap()).is_ok());
    }
}
