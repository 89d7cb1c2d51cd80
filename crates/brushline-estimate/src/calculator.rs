//! The estimate pipeline
//!
//! [`Estimator`] runs the full calculation: validate, canonicalize,
//! measure, price materials and labor, apply adjustments, then requote
//! the three comparison tiers from scratch. Every stage reads the same
//! [`NumericContext`], so a result is a pure function of its input.

use crate::input::CalculationInput;
use crate::labor::{self, average_complexity};
use crate::material;
use crate::measure;
use crate::pricing;
use crate::rates::{RateTable, RATES};
use crate::result::{CalculationResult, TierLevel, TierQuote};
use crate::ValidationError;
use brushline_core::NumericContext;
use chrono::Utc;

/// Runs painting estimates
#[derive(Debug, Clone)]
pub struct Estimator {
    numeric: NumericContext,
}

impl Estimator {
    pub fn new() -> Self {
        Self {
            numeric: NumericContext::standard(),
        }
    }

    /// Run the full pipeline for one input
    ///
    /// `cache_key` is the content hash the caller derived for this input;
    /// it is recorded in the result so cached payloads are self-describing.
    pub fn calculate(
        &self,
        input: &CalculationInput,
        cache_key: impl Into<String>,
    ) -> Result<CalculationResult, ValidationError> {
        input.validate()?;
        let input = input.canonicalize();
        let rates: &RateTable = &RATES;

        let areas = measure::measure_rooms(&self.numeric, rates, &input.rooms);
        let materials =
            material::price_materials(&self.numeric, rates, &areas, input.material, input.coats);
        let labor =
            labor::price_labor(&self.numeric, rates, &areas, &input.rooms, input.coats);

        let avg = average_complexity(&self.numeric, &input.rooms);
        let subtotal = self.numeric.add(materials.total_cost, labor.total_cost);
        let pricing = pricing::price_estimate(
            &self.numeric,
            rates,
            subtotal,
            avg,
            input.urgency,
            input.season,
            input.discount_percent,
        );

        // Each tier is a complete re-run at its preset grade and coat
        // count, not a scaled copy of the primary quote.
        let tiers = TierLevel::ALL
            .iter()
            .map(|&tier| {
                let (grade, coats) = tier.preset();
                let tier_materials =
                    material::price_materials(&self.numeric, rates, &areas, grade, coats);
                let tier_labor =
                    labor::price_labor(&self.numeric, rates, &areas, &input.rooms, coats);
                let tier_subtotal = self
                    .numeric
                    .add(tier_materials.total_cost, tier_labor.total_cost);
                let tier_pricing = pricing::price_estimate(
                    &self.numeric,
                    rates,
                    tier_subtotal,
                    avg,
                    input.urgency,
                    input.season,
                    input.discount_percent,
                );
                TierQuote {
                    tier,
                    grade,
                    coats,
                    materials: tier_materials,
                    labor: tier_labor,
                    total: tier_pricing.total,
                }
            })
            .collect();

        Ok(CalculationResult {
            areas,
            materials,
            labor,
            pricing,
            tiers,
            cache_key: cache_key.into(),
            calculated_at: Utc::now(),
        })
    }
}

impl Default for Estimator {
    fn default() -> Self {
        Self::new()
    }
}
