//! Synthetic PV power from ambient temperature and irradiance.
//!
//! The transform runs in three per-cell steps: measurements at or above the
//! filter thresholds are blanked, a cell temperature is estimated with the
//! simplified NOCT model, and the power formula is evaluated. Missing values
//! are `NaN` and flow through the arithmetic untouched, so a blanked input
//! always yields a blanked output.

use crate::domain::model::{FilterSummary, GenerationResult, Table};
use crate::utils::error::{PvGenError, Result};
use crate::utils::validation::{
    validate_finite, validate_positive_number, validate_range, validate_strictly_positive, Validate,
};
use serde::{Deserialize, Serialize};

/// Offset added by the cell temperature model. Kept at 275.15 as the model defines it.
pub const CELL_TEMPERATURE_OFFSET: f64 = 275.15;
/// Irradiance scale inside the logarithmic response term.
pub const IRRADIANCE_LOG_SCALE: f64 = 1e6;
/// NOCT reference ambient temperature (°C) and irradiance (W/m²).
pub const NOCT_REFERENCE_AMBIENT: f64 = 20.0;
pub const NOCT_REFERENCE_IRRADIANCE: f64 = 800.0;

/// Physical description of one PV module/array configuration.
///
/// `pmpp` and `module_area` are carried for bookkeeping only; the power
/// formula does not read them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelParameters {
    /// Maximum power point (W).
    #[serde(rename = "Pmpp")]
    pub pmpp: f64,
    #[serde(rename = "FF")]
    pub fill_factor: f64,
    /// Open-circuit voltage (V).
    #[serde(rename = "Voc")]
    pub voc: f64,
    /// Short-circuit current (A).
    #[serde(rename = "Isc")]
    pub isc: f64,
    /// Module temperature at standard test conditions (K).
    #[serde(rename = "T0")]
    pub t0: f64,
    /// Irradiance at standard test conditions (W/m²).
    #[serde(rename = "E0")]
    pub e0: f64,
    pub eta_inv: f64,
    #[serde(rename = "NOCT")]
    pub noct: f64,
    /// Module area (m²).
    pub module_area: f64,
    pub module_number: u32,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            pmpp: 255.2,
            fill_factor: 0.772,
            voc: 37.8,
            isc: 8.89,
            t0: 298.15,
            e0: 1000.0,
            eta_inv: 0.9,
            noct: 45.7,
            module_area: 1.6,
            module_number: 1,
        }
    }
}

impl ModelParameters {
    /// Constant factor of the power formula derived from standard test conditions.
    pub fn reference_factor(&self) -> f64 {
        self.fill_factor * self.isc * self.voc * self.t0
            / (self.e0 * (IRRADIANCE_LOG_SCALE * self.e0).ln())
    }

    /// Estimated cell temperature (kelvin scale) for one ambient reading.
    pub fn cell_temperature(&self, temperature: f64, irradiance: f64) -> f64 {
        temperature
            + (self.noct - NOCT_REFERENCE_AMBIENT) / NOCT_REFERENCE_IRRADIANCE * irradiance
            + CELL_TEMPERATURE_OFFSET
    }

    /// Power for one cell. `NaN` in, `NaN` out; zero irradiance gives `0 * -inf = NaN`.
    pub fn power(&self, temperature: f64, irradiance: f64) -> f64 {
        self.power_with_reference(self.reference_factor(), temperature, irradiance)
    }

    fn power_with_reference(&self, reference: f64, temperature: f64, irradiance: f64) -> f64 {
        let cell_temperature = self.cell_temperature(temperature, irradiance);
        reference * (irradiance * (IRRADIANCE_LOG_SCALE * irradiance).ln()) / cell_temperature
            * self.eta_inv
            * f64::from(self.module_number)
    }
}

impl Validate for ModelParameters {
    fn validate(&self) -> Result<()> {
        validate_finite("model.Pmpp", self.pmpp)?;
        validate_finite("model.FF", self.fill_factor)?;
        validate_finite("model.Voc", self.voc)?;
        validate_finite("model.Isc", self.isc)?;
        validate_strictly_positive("model.T0", self.t0)?;
        validate_strictly_positive("model.E0", self.e0)?;
        validate_range("model.eta_inv", self.eta_inv, 0.0, 1.0)?;
        validate_finite("model.NOCT", self.noct)?;
        validate_finite("model.module_area", self.module_area)?;
        validate_positive_number("model.module_number", self.module_number as usize, 1)?;
        Ok(())
    }
}

/// Upper bounds above which a sensor reading is treated as faulty.
/// Both bounds are inclusive: a reading equal to the bound is blanked.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasurementFilter {
    /// °C
    pub maximum_temperature: f64,
    /// W/m²
    pub maximum_irradiance: f64,
}

impl Default for MeasurementFilter {
    fn default() -> Self {
        Self {
            maximum_temperature: 40.0,
            maximum_irradiance: 1000.0,
        }
    }
}

impl MeasurementFilter {
    pub fn filter_temperature(&self, temperature: f64) -> f64 {
        if temperature >= self.maximum_temperature {
            f64::NAN
        } else {
            temperature
        }
    }

    pub fn filter_irradiance(&self, irradiance: f64) -> f64 {
        if irradiance >= self.maximum_irradiance {
            f64::NAN
        } else {
            irradiance
        }
    }
}

impl Validate for MeasurementFilter {
    fn validate(&self) -> Result<()> {
        validate_finite("filter.maximum_temperature", self.maximum_temperature)?;
        validate_finite("filter.maximum_irradiance", self.maximum_irradiance)?;
        Ok(())
    }
}

/// Fails unless both tables have the same shape and the same column labels in the same order.
pub fn check_alignment(temperature: &Table, irradiance: &Table) -> Result<()> {
    if temperature.shape() != irradiance.shape() {
        return Err(PvGenError::ShapeMismatch {
            temperature: temperature.shape(),
            irradiance: irradiance.shape(),
        });
    }

    if temperature.columns() != irradiance.columns() {
        return Err(PvGenError::ColumnLabelMismatch {
            temperature: temperature.columns().to_vec(),
            irradiance: irradiance.columns().to_vec(),
        });
    }

    Ok(())
}

/// Generates the PV power table for aligned temperature (°C) and irradiance (W/m²) tables.
///
/// The output has the labels of `temperature`. The inputs are not modified.
pub fn generate(
    temperature: &Table,
    irradiance: &Table,
    parameters: &ModelParameters,
    filter: &MeasurementFilter,
) -> Result<Table> {
    generate_with_summary(temperature, irradiance, parameters, filter).map(|result| result.power)
}

/// Like [`generate`], also counting the cells blanked by each filter.
pub fn generate_with_summary(
    temperature: &Table,
    irradiance: &Table,
    parameters: &ModelParameters,
    filter: &MeasurementFilter,
) -> Result<GenerationResult> {
    check_alignment(temperature, irradiance)?;

    let reference = parameters.reference_factor();
    let mut summary = FilterSummary::default();

    let values: Vec<f64> = temperature
        .values()
        .iter()
        .zip(irradiance.values())
        .map(|(&t, &e)| {
            let t_filtered = filter.filter_temperature(t);
            let e_filtered = filter.filter_irradiance(e);
            if t_filtered.is_nan() && !t.is_nan() {
                summary.masked_temperature += 1;
            }
            if e_filtered.is_nan() && !e.is_nan() {
                summary.masked_irradiance += 1;
            }

            let power = parameters.power_with_reference(reference, t_filtered, e_filtered);
            if power.is_nan() {
                summary.missing_output += 1;
            }
            power
        })
        .collect();

    let power = temperature.with_values(values)?;

    tracing::debug!(
        rows = power.shape().0,
        columns = power.shape().1,
        masked_temperature = summary.masked_temperature,
        masked_irradiance = summary.masked_irradiance,
        missing_output = summary.missing_output,
        "Generated PV series"
    );

    Ok(GenerationResult { power, summary })
}
