//! Diesel models mapping to the reference schema.
//!
//! These types mirror the tables in [`crate::schema`]:
//! - [`crate::schema::convenios`]: partners, unique on `nome`
//! - [`crate::schema::unidade`]: sites
//! - [`crate::schema::ref_vacinas`]: catalog items (primary key column `ref_vacinasID`)
//! - [`crate::schema::convenio_vacina_precos`]: price per (partner, item)
//! - [`crate::schema::unidade_convenios`]: acceptance per (site, partner)
//!
//! Example (no_run)
//! ```no_run
//! use convenio_sync::models::*;
//! use convenio_sync::schema;
//! use diesel::prelude::*;
//!
//! fn seed(conn: &mut SqliteConnection) -> diesel::QueryResult<()> {
//!     diesel::insert_into(schema::unidade::table)
//!         .values(NewSite { nome: "Vaccini Tijuca 45", status: true })
//!         .execute(conn)?;
//!     diesel::insert_into(schema::ref_vacinas::table)
//!         .values(NewCatalogItem { nome: "Febre Amarela", preco: 0.0, status: true })
//!         .execute(conn)?;
//!     Ok(())
//! }
//! ```

use diesel::prelude::*;

use crate::schema::{convenio_vacina_precos, convenios, ref_vacinas, unidade, unidade_convenios};

// ----------------------- convenios ----------------------

/// A partner row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = convenios, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Partner {
    /// Primary key.
    pub id: i64,
    /// Canonical partner name (unique).
    pub nome: String,
    /// Active flag.
    pub ativo: bool,
}

/// Insertable form of [`Partner`].
#[derive(Debug, Insertable)]
#[diesel(table_name = convenios)]
pub struct NewPartner<'a> {
    /// Canonical partner name.
    pub nome: &'a str,
    /// Active flag.
    pub ativo: bool,
}

// ----------------------- unidade ------------------------

/// A site row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = unidade, check_for_backend(diesel::sqlite::Sqlite))]
pub struct Site {
    /// Primary key.
    pub id: i64,
    /// Display name, e.g. "Vaccini Tijuca 45".
    pub nome: String,
    /// Whether the site is operating.
    pub status: bool,
}

/// Insertable form of [`Site`].
#[derive(Debug, Insertable)]
#[diesel(table_name = unidade)]
pub struct NewSite<'a> {
    /// Display name.
    pub nome: &'a str,
    /// Whether the site is operating.
    pub status: bool,
}

// ----------------------- ref_vacinas --------------------

/// A catalog item row.
#[derive(Debug, Clone, Queryable, Identifiable, Selectable)]
#[diesel(table_name = ref_vacinas, check_for_backend(diesel::sqlite::Sqlite))]
pub struct CatalogItem {
    /// Primary key (`ref_vacinasID`).
    pub id: i64,
    /// Display name.
    pub nome: String,
    /// List price outside any partner agreement.
    pub preco: f64,
    /// Whether the item is offered.
    pub status: bool,
}

/// Insertable form of [`CatalogItem`].
#[derive(Debug, Insertable)]
#[diesel(table_name = ref_vacinas)]
pub struct NewCatalogItem<'a> {
    /// Display name.
    pub nome: &'a str,
    /// List price.
    pub preco: f64,
    /// Whether the item is offered.
    pub status: bool,
}

// ----------------- convenio_vacina_precos ---------------
// Identity is the (convenio_id, vacina_id) pair; `id` is a surrogate.

/// Insertable form of a price association.
#[derive(Debug, Insertable)]
#[diesel(table_name = convenio_vacina_precos)]
pub struct NewPrice {
    /// FK to [`Partner::id`].
    pub convenio_id: i64,
    /// FK to [`CatalogItem::id`].
    pub vacina_id: i64,
    /// Negotiated price.
    pub preco: f64,
    /// Active flag.
    pub ativo: bool,
}

// ------------------- unidade_convenios ------------------

/// Insertable form of an acceptance association.
#[derive(Debug, Insertable)]
#[diesel(table_name = unidade_convenios)]
pub struct NewAcceptance {
    /// FK to [`Site::id`].
    pub unidade_id: i64,
    /// FK to [`Partner::id`].
    pub convenio_id: i64,
    /// Whether the site accepts the partner.
    pub aceita: bool,
}
