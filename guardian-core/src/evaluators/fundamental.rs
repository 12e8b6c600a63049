//! Fundamental evaluator: freshness, turnaround, partial credit, inventory veto.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::FinancialSnapshot;
use crate::report::{DataIssue, Evidence, Source, Veto, VetoKind};
use crate::scoring::{FundamentalDimension, SubScore};

pub const FUNDAMENTAL_MAX: f64 = 4.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FundamentalConfig {
    /// Reports older than this are stale.
    pub max_age_days: i64,
    /// ROE (%) above which a point is awarded.
    pub roe_threshold: f64,
    /// PEG strictly between zero and this earns a point.
    pub peg_ceiling: f64,
    /// Relative rise in inventory days that, without margin expansion, vetoes.
    pub inventory_days_jump: f64,
}

impl Default for FundamentalConfig {
    fn default() -> Self {
        Self {
            max_age_days: 110,
            roe_threshold: 15.0,
            peg_ceiling: 1.0,
            inventory_days_jump: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FundamentalOutcome {
    pub dimension: FundamentalDimension,
    /// EPS flipped from negative to positive.
    pub turnaround: bool,
    pub veto: Option<Veto>,
    pub issue: Option<DataIssue>,
    pub evidence: Evidence,
}

fn points(value: f64) -> SubScore {
    SubScore::new(value, 0.0, FUNDAMENTAL_MAX)
}

/// PEG from quarterly EPS annualised x4. `None` unless earnings and growth are positive.
pub fn peg_ratio(close: f64, snapshot: &FinancialSnapshot) -> Option<f64> {
    let annual_eps = snapshot.latest().eps * 4.0;
    let growth = snapshot.eps_growth_pct()?;
    if annual_eps <= 0.0 || growth <= 0.0 || !close.is_finite() {
        return None;
    }
    Some(close / annual_eps / growth)
}

/// Score `snapshot` as of `as_of`. `None` means no usable statements; the
/// caller records why.
pub fn evaluate_fundamentals(
    snapshot: Option<&FinancialSnapshot>,
    close: f64,
    as_of: NaiveDate,
    config: &FundamentalConfig,
) -> FundamentalOutcome {
    let mut evidence = Evidence::new();

    let Some(snapshot) = snapshot else {
        evidence.push(
            Source::Fundamental,
            "No financials",
            "dimension excluded from the composite",
        );
        return FundamentalOutcome {
            dimension: FundamentalDimension::Excluded { raw: None },
            turnaround: false,
            veto: None,
            issue: None,
            evidence,
        };
    };

    let age_days = snapshot.age_days(as_of);
    if age_days > config.max_age_days {
        evidence.push(
            Source::Fundamental,
            "Stale financials",
            format!(
                "latest report {} is {age_days} days old; dimension excluded",
                snapshot.latest().report_date
            ),
        );
        return FundamentalOutcome {
            dimension: FundamentalDimension::Excluded {
                raw: Some(points(0.0)),
            },
            turnaround: false,
            veto: None,
            issue: Some(DataIssue::StaleFundamentalData {
                age_days,
                max_age_days: config.max_age_days,
            }),
            evidence,
        };
    }

    let latest = snapshot.latest();
    let prior = snapshot.prior();
    let turnaround = prior.eps < 0.0 && latest.eps > 0.0;

    let score = if turnaround {
        evidence.push(
            Source::Fundamental,
            "Earnings turnaround",
            format!("EPS {:.2} -> {:.2}", prior.eps, latest.eps),
        );
        FUNDAMENTAL_MAX
    } else {
        let mut credit = 0.0;
        if let Some(roe) = latest.roe.filter(|r| *r > config.roe_threshold) {
            credit += 1.0;
            evidence.push(
                Source::Fundamental,
                "High ROE",
                format!("ROE {roe:.1}% above {:.0}%", config.roe_threshold),
            );
        }
        if let Some(growth) = snapshot.eps_growth_pct().filter(|g| *g > 0.0) {
            credit += 1.0;
            evidence.push(
                Source::Fundamental,
                "EPS growth",
                format!("EPS up {growth:.1}% quarter over quarter"),
            );
        }
        if let Some(peg) = peg_ratio(close, snapshot).filter(|p| *p < config.peg_ceiling) {
            credit += 1.0;
            evidence.push(
                Source::Fundamental,
                "Cheap growth",
                format!("PEG {peg:.2} below {:.1}", config.peg_ceiling),
            );
        }
        if snapshot.margin_expanding() {
            credit += 1.0;
            evidence.push(
                Source::Fundamental,
                "Margin expansion",
                format!(
                    "gross margin {:.1}% -> {:.1}%",
                    prior.gross_margin * 100.0,
                    latest.gross_margin * 100.0
                ),
            );
        }
        credit
    };

    let veto = inventory_veto(snapshot, config);
    if let Some(v) = &veto {
        evidence.push(Source::Fundamental, "Inventory build-up", v.reason.clone());
    }

    FundamentalOutcome {
        dimension: FundamentalDimension::Included(points(score)),
        turnaround,
        veto,
        issue: None,
        evidence,
    }
}

fn inventory_veto(snapshot: &FinancialSnapshot, config: &FundamentalConfig) -> Option<Veto> {
    let latest = snapshot.latest().inventory_days()?;
    let prior = snapshot.prior().inventory_days()?;
    if prior <= 0.0 || snapshot.margin_expanding() {
        return None;
    }
    let rise = latest / prior - 1.0;
    (rise > config.inventory_days_jump).then(|| {
        Veto::new(
            VetoKind::InventoryVelocity,
            format!(
                "inventory days {prior:.0} -> {latest:.0} (+{:.0}%) without margin expansion",
                rise * 100.0
            ),
        )
    })
}
