//! Read-only verification report over an imported database.
//!
//! Lists partners with their price counts and, per site, how many partners
//! are accepted or rejected, followed by totals.

use std::collections::HashMap;
use std::fmt;

use diesel::SqliteConnection;
use diesel::prelude::*;
use indexmap::IndexMap;

use crate::models::Partner;
use crate::schema::{convenio_vacina_precos as cvp, convenios, unidade, unidade_convenios as uc};
use crate::store::StoreResult;

/// One partner line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartnerLine {
    /// `convenios.id`.
    pub id: i64,
    /// Canonical name.
    pub name: String,
    /// Active flag.
    pub active: bool,
    /// Price associations referencing this partner.
    pub prices: usize,
}

/// One site line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteLine {
    /// Site display name.
    pub name: String,
    /// Partners the site accepts.
    pub accepted: usize,
    /// Partners the site refuses.
    pub rejected: usize,
}

/// Snapshot of what an import left behind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Ordered by name.
    pub partners: Vec<PartnerLine>,
    /// Ordered by site id.
    pub sites: Vec<SiteLine>,
    /// Rows in `convenio_vacina_precos`.
    pub prices_total: usize,
    /// Of those, rows with `ativo` set.
    pub prices_active: usize,
}

impl VerifyReport {
    /// Partners with `ativo` set.
    pub fn partners_active(&self) -> usize {
        self.partners.iter().filter(|p| p.active).count()
    }

    /// Rows in `unidade_convenios` attached to a listed site.
    pub fn acceptance_total(&self) -> usize {
        self.sites.iter().map(|s| s.accepted + s.rejected).sum()
    }

    /// Of those, rows with `aceita` set.
    pub fn acceptance_accepted(&self) -> usize {
        self.sites.iter().map(|s| s.accepted).sum()
    }
}

/// Build the report from the reference tables.
pub fn read_report(conn: &mut SqliteConnection) -> StoreResult<VerifyReport> {
    let partners: Vec<Partner> = convenios::table
        .select(Partner::as_select())
        .order(convenios::nome.asc())
        .load(conn)?;

    let prices: Vec<(i64, bool)> = cvp::table
        .select((cvp::convenio_id, cvp::ativo))
        .load(conn)?;
    let mut per_partner: HashMap<i64, usize> = HashMap::new();
    for (partner_id, _) in &prices {
        *per_partner.entry(*partner_id).or_default() += 1;
    }

    let acceptance: Vec<(String, bool)> = uc::table
        .inner_join(unidade::table)
        .select((unidade::nome, uc::aceita))
        .order((uc::unidade_id.asc(), uc::convenio_id.asc()))
        .load(conn)?;
    let mut sites: IndexMap<String, SiteLine> = IndexMap::new();
    for (name, accepted) in acceptance {
        let line = sites.entry(name.clone()).or_insert_with(|| SiteLine {
            name,
            ..Default::default()
        });
        if accepted {
            line.accepted += 1;
        } else {
            line.rejected += 1;
        }
    }

    Ok(VerifyReport {
        partners: partners
            .into_iter()
            .map(|p| PartnerLine {
                prices: per_partner.get(&p.id).copied().unwrap_or(0),
                id: p.id,
                name: p.nome,
                active: p.ativo,
            })
            .collect(),
        sites: sites.into_values().collect(),
        prices_total: prices.len(),
        prices_active: prices.iter().filter(|(_, active)| *active).count(),
    })
}

impl fmt::Display for VerifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Partners")?;
        writeln!(f, "--------")?;
        for p in &self.partners {
            let state = if p.active { "active" } else { "inactive" };
            writeln!(f, "{} (id {}, {state}): {} prices", p.name, p.id, p.prices)?;
        }

        writeln!(f)?;
        writeln!(f, "Sites")?;
        writeln!(f, "-----")?;
        for s in &self.sites {
            writeln!(f, "{}: {} accepted, {} rejected", s.name, s.accepted, s.rejected)?;
        }

        writeln!(f)?;
        writeln!(f, "Totals")?;
        writeln!(f, "------")?;
        writeln!(
            f,
            "partners    {} ({} active)",
            self.partners.len(),
            self.partners_active()
        )?;
        writeln!(
            f,
            "prices      {} ({} active)",
            self.prices_total, self.prices_active
        )?;
        write!(
            f,
            "acceptance  {} ({} accepted)",
            self.acceptance_total(),
            self.acceptance_accepted()
        )
    }
}
