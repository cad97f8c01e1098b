//! Business impact projection
//!
//! Turns the three "what if" inputs (daily active users, revenue per user and
//! an engagement lift) into revenue and churn-savings estimates, plus a
//! sensitivity curve over the whole lift range.

use std::ops::RangeInclusive;

use serde::Serialize;

use crate::error::DashboardError;

/// Share of incremental engagement assumed to convert into revenue
pub const REVENUE_CORRELATION: f64 = 0.40;

/// Fraction of the user base retained thanks to the feature
pub const CHURN_REDUCTION: f64 = 0.03;

/// Daily active users, in millions
pub const DAU_RANGE: RangeInclusive<u32> = 100..=1000;

/// Average revenue per user, dollars per month
pub const ARPU_RANGE: RangeInclusive<u32> = 1..=15;

/// Engagement lift, percent
pub const LIFT_RANGE: RangeInclusive<u32> = 1..=20;

const MILLION: f64 = 1_000_000.0;
const MONTHS_PER_YEAR: f64 = 12.0;

/// Validated projection inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImpactInputs {
    dau_millions: u32,
    arpu: u32,
    lift_pct: u32,
}

impl ImpactInputs {
    /// Build inputs, rejecting values outside their documented ranges
    pub fn new(dau_millions: u32, arpu: u32, lift_pct: u32) -> Result<Self, DashboardError> {
        check_range("dau", dau_millions, &DAU_RANGE)?;
        check_range("arpu", arpu, &ARPU_RANGE)?;
        check_range("lift", lift_pct, &LIFT_RANGE)?;

        Ok(Self {
            dau_millions,
            arpu,
            lift_pct,
        })
    }

    pub fn dau_millions(&self) -> u32 {
        self.dau_millions
    }

    pub fn arpu(&self) -> u32 {
        self.arpu
    }

    pub fn lift_pct(&self) -> u32 {
        self.lift_pct
    }
}

fn check_range(
    name: &'static str,
    value: u32,
    range: &RangeInclusive<u32>,
) -> Result<(), DashboardError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(DashboardError::OutOfRange {
            name,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}

/// Derived business metrics for one set of inputs
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ImpactProjection {
    pub inputs: ImpactInputs,
    /// Additional engaged users, in millions
    pub incremental_engaged_users: f64,
    /// Dollars per month
    pub monthly_revenue_impact: f64,
    /// Dollars per year
    pub annual_revenue_impact: f64,
    /// Simplified lifetime value: twelve months of ARPU
    pub avg_ltv: f64,
    /// Dollars per year retained through reduced churn
    pub churn_savings: f64,
    /// Annual revenue impact plus churn savings
    pub total_annual_impact: f64,
}

/// One point of the lift sensitivity curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensitivityPoint {
    pub lift_pct: u32,
    /// Annual revenue impact in millions of dollars
    pub annual_impact_millions: f64,
}

/// Compute every projection output for `inputs`
pub fn project(inputs: &ImpactInputs) -> ImpactProjection {
    let dau = f64::from(inputs.dau_millions);
    let arpu = f64::from(inputs.arpu);

    let incremental_engaged_users = engaged_users(inputs.dau_millions, inputs.lift_pct);
    let monthly_revenue_impact = incremental_engaged_users * arpu * REVENUE_CORRELATION * MILLION;
    let annual_revenue_impact = monthly_revenue_impact * MONTHS_PER_YEAR;
    let avg_ltv = arpu * MONTHS_PER_YEAR;
    let churn_savings = dau * CHURN_REDUCTION * MILLION * avg_ltv;

    ImpactProjection {
        inputs: *inputs,
        incremental_engaged_users,
        monthly_revenue_impact,
        annual_revenue_impact,
        avg_ltv,
        churn_savings,
        total_annual_impact: annual_revenue_impact + churn_savings,
    }
}

/// Annual revenue impact for every integer lift in [`LIFT_RANGE`], holding
/// DAU and ARPU fixed
pub fn sensitivity_curve(inputs: &ImpactInputs) -> Vec<SensitivityPoint> {
    LIFT_RANGE
        .map(|lift_pct| {
            let at_lift = ImpactInputs { lift_pct, ..*inputs };
            SensitivityPoint {
                lift_pct,
                annual_impact_millions: project(&at_lift).annual_revenue_impact / MILLION,
            }
        })
        .collect()
}

/// Incremental engaged users, in millions
fn engaged_users(dau_millions: u32, lift_pct: u32) -> f64 {
    f64::from(dau_millions) * f64::from(lift_pct) / 100.0
}
