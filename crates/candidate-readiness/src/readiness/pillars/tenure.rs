use super::{PillarContext, PillarError, DAYS_PER_YEAR};
use crate::readiness::domain::LinkedInProfile;
use crate::readiness::pillar::{PillarName, PillarResult};
use crate::readiness::signal::{DataSource, Signal};

const ACCOUNT_AGE_DISCOUNT: f64 = 0.7;

/// Job-change likelihood (0-100) for a given tenure in years.
///
/// Ramps up from 10 at six months, peaks at 100 around two and a half years,
/// then falls away to a floor of 5 past eight years.
pub fn tenure_bell_curve(years: f64) -> u8 {
    let score = if !years.is_finite() || years < 0.5 {
        10.0
    } else if years < 1.5 {
        10.0 + (years - 0.5) * 65.0
    } else if years < 2.5 {
        75.0 + (years - 1.5) * 25.0
    } else if years < 3.5 {
        100.0 - (years - 2.5) * 25.0
    } else if years < 5.0 {
        75.0 - (years - 3.5) * 40.0
    } else if years < 8.0 {
        15.0 - (years - 5.0) * 3.0
    } else {
        5.0
    };
    score.round().clamp(0.0, 100.0) as u8
}

fn hopper_score(average_years: f64) -> f64 {
    if average_years < 2.0 {
        80.0
    } else if average_years < 3.0 {
        60.0
    } else if average_years < 5.0 {
        30.0
    } else {
        10.0
    }
}

fn linkedin_signals(ctx: &PillarContext<'_>, profile: &LinkedInProfile) -> Option<Vec<Signal>> {
    let role = profile.current_role()?;
    let start = role.start_date?;
    let years = ctx.days_since_date(start) / DAYS_PER_YEAR;

    let mut signals = vec![Signal::new(
        "linkedin_tenure",
        years,
        f64::from(tenure_bell_curve(years)),
        DataSource::Linkedin,
        0.9,
        format!("{years:.1} years as {} at {}", role.title, role.company),
    )];

    let completed: Vec<f64> = profile
        .experience
        .as_deref()
        .unwrap_or_default()
        .iter()
        .filter_map(|entry| match (entry.start_date, entry.end_date) {
            (Some(start), Some(end)) if !entry.current => {
                Some((end - start).num_days() as f64 / DAYS_PER_YEAR)
            }
            _ => None,
        })
        .collect();

    if completed.len() >= 2 {
        let average = completed.iter().sum::<f64>() / completed.len() as f64;
        signals.push(Signal::new(
            "tenure_pattern",
            average,
            hopper_score(average),
            DataSource::Linkedin,
            0.7,
            format!(
                "average of {average:.1} years across {} past roles",
                completed.len()
            ),
        ));
    }

    Some(signals)
}

pub(crate) async fn compute(ctx: &PillarContext<'_>) -> Result<PillarResult, PillarError> {
    let input = ctx.input;
    let mut fallbacks = Vec::new();

    if let Some(profile) = &input.linkedin_profile {
        match linkedin_signals(ctx, profile) {
            Some(signals) => {
                return Ok(PillarResult::from_signals(
                    PillarName::TenureRisk,
                    signals,
                    DataSource::Linkedin,
                    fallbacks,
                ))
            }
            None => fallbacks.push(DataSource::Linkedin),
        }
    }

    if let Some(years) = input.years_at_company {
        if !years.is_finite() || years < 0.0 {
            return Err(PillarError::InvalidInput {
                field: "years_at_company",
                reason: format!("expected a non-negative number of years, got {years}"),
            });
        }
        let signal = Signal::new(
            "provided_tenure",
            years,
            f64::from(tenure_bell_curve(years)),
            DataSource::Provided,
            0.6,
            format!("{years:.1} years at current company"),
        );
        return Ok(PillarResult::from_signals(
            PillarName::TenureRisk,
            vec![signal],
            DataSource::Provided,
            fallbacks,
        ));
    }

    if let Some(profile) = &input.github_profile {
        let account_years = ctx.days_since(profile.created_at) / DAYS_PER_YEAR;
        let proxy = account_years * ACCOUNT_AGE_DISCOUNT;
        let signal = Signal::new(
            "github_account_age",
            account_years,
            f64::from(tenure_bell_curve(proxy)),
            DataSource::Github,
            0.2,
            format!("GitHub account is {account_years:.1} years old, treated as {proxy:.1} years tenure"),
        );
        return Ok(PillarResult::from_signals(
            PillarName::TenureRisk,
            vec![signal],
            DataSource::Github,
            fallbacks,
        ));
    }

    Ok(PillarResult::no_data(
        PillarName::TenureRisk,
        DataSource::Github,
        fallbacks,
    ))
}
