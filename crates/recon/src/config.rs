use chrono::NaiveDate;
use serde::Deserialize;

use crate::columns::PAYMENT_CURRENCY;
use crate::error::ReconError;
use crate::model::RecordShape;

pub const DEFAULT_EXCLUDED_KEYWORD: &str = "勿拍";
pub const DEFAULT_STALE_AFTER_DAYS: u32 = 350;
pub const DEFAULT_SECONDARY_CURRENCY: &str = "USD";
pub const DEFAULT_STATEMENT_CURRENCY: &str = "USD";
pub const DEFAULT_UNIFIED_CURRENCY: &str = "TWD";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Operator parameters for one run. Immutable once handed to `run`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub shop_url: String,
    #[serde(default)]
    pub platform_name: String,
    /// Date staleness and the export filename are measured against.
    /// Defaults to the local date when the run starts.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
    #[serde(default)]
    pub exclusions: ExclusionConfig,
    #[serde(default)]
    pub currency: CurrencyConfig,
    #[serde(default)]
    pub shapes: ShapeRules,
}

// ---------------------------------------------------------------------------
// Exclusions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct ExclusionConfig {
    #[serde(default = "default_true")]
    pub return_or_cancelled: bool,
    /// Item-name marker for listings that must never ship. Always applied.
    #[serde(default = "default_keyword")]
    pub keyword: String,
    #[serde(default)]
    pub stale_orders: bool,
    #[serde(default = "default_stale_days")]
    pub stale_after_days: u32,
}

impl Default for ExclusionConfig {
    fn default() -> Self {
        Self {
            return_or_cancelled: true,
            keyword: default_keyword(),
            stale_orders: false,
            stale_after_days: DEFAULT_STALE_AFTER_DAYS,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_keyword() -> String {
    DEFAULT_EXCLUDED_KEYWORD.into()
}

fn default_stale_days() -> u32 {
    DEFAULT_STALE_AFTER_DAYS
}

// ---------------------------------------------------------------------------
// Currency
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct CurrencyConfig {
    /// Units of ledger currency per one unit of `secondary`.
    #[serde(default)]
    pub exchange_rate: Option<f64>,
    #[serde(default = "default_secondary")]
    pub secondary: String,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            exchange_rate: None,
            secondary: default_secondary(),
        }
    }
}

fn default_secondary() -> String {
    DEFAULT_SECONDARY_CURRENCY.into()
}

// ---------------------------------------------------------------------------
// Per-shape projection rules
// ---------------------------------------------------------------------------

/// Which money field the source sheet carries; the other one is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmountBasis {
    /// Sheet carries the line total; unit price = total / quantity.
    Total,
    /// Sheet carries the unit price; total = quantity * unit price.
    UnitPrice,
}

impl std::fmt::Display for AmountBasis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Total => write!(f, "total"),
            Self::UnitPrice => write!(f, "unit_price"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShapeRules {
    #[serde(default)]
    pub statement: ShapeRule,
    #[serde(default)]
    pub unified_export: ShapeRule,
}

/// Overrides for one shape. Unset fields fall back to the shape's defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShapeRule {
    #[serde(default)]
    pub amount_basis: Option<AmountBasis>,
    /// Fixed currency literal; wins over `currency_column`.
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub currency_column: Option<String>,
    /// Used when `currency_column` is absent or blank on a row.
    #[serde(default)]
    pub fallback_currency: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CurrencySource {
    Fixed(String),
    Column { column: String, fallback: String },
}

/// A shape rule with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRule {
    pub amount_basis: AmountBasis,
    pub currency: CurrencySource,
}

impl ShapeRule {
    fn resolve(&self, shape: RecordShape) -> ResolvedRule {
        let (basis, default_column, default_currency) = match shape {
            RecordShape::UnifiedExport => (AmountBasis::UnitPrice, None, DEFAULT_UNIFIED_CURRENCY),
            _ => (AmountBasis::Total, Some(PAYMENT_CURRENCY), DEFAULT_STATEMENT_CURRENCY),
        };

        let currency = match (&self.currency, &self.currency_column) {
            (Some(fixed), _) => CurrencySource::Fixed(fixed.trim().to_string()),
            (None, Some(column)) => CurrencySource::Column {
                column: column.clone(),
                fallback: self
                    .fallback_currency
                    .clone()
                    .unwrap_or_else(|| default_currency.into()),
            },
            (None, None) => match default_column {
                Some(column) => CurrencySource::Column {
                    column: column.into(),
                    fallback: self
                        .fallback_currency
                        .clone()
                        .unwrap_or_else(|| default_currency.into()),
                },
                None => CurrencySource::Fixed(default_currency.into()),
            },
        };

        ResolvedRule {
            amount_basis: self.amount_basis.unwrap_or(basis),
            currency,
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn new(shop_url: impl Into<String>, platform_name: impl Into<String>) -> Self {
        Self {
            shop_url: shop_url.into(),
            platform_name: platform_name.into(),
            ..Self::default()
        }
    }

    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse without validating, for layering command-line overrides on
    /// top before the final `validate()`.
    pub fn from_toml_unchecked(input: &str) -> Result<Self, ReconError> {
        toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.shop_url.trim().is_empty() {
            return Err(ReconError::ConfigValidation("shop_url must not be empty".into()));
        }
        if self.platform_name.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "platform_name must not be empty".into(),
            ));
        }
        if self.exclusions.keyword.is_empty() {
            return Err(ReconError::ConfigValidation(
                "exclusions.keyword must not be empty".into(),
            ));
        }
        if self.exclusions.stale_after_days == 0 {
            return Err(ReconError::ConfigValidation(
                "exclusions.stale_after_days must be at least 1".into(),
            ));
        }
        if let Some(rate) = self.currency.exchange_rate {
            if !rate.is_finite() || rate <= 0.0 {
                return Err(ReconError::ConfigValidation(format!(
                    "currency.exchange_rate must be a positive number, got {rate}"
                )));
            }
        }
        for (name, rule) in [
            ("statement", &self.shapes.statement),
            ("unified_export", &self.shapes.unified_export),
        ] {
            if matches!(&rule.currency, Some(c) if c.trim().is_empty()) {
                return Err(ReconError::ConfigValidation(format!(
                    "shapes.{name}.currency must not be blank"
                )));
            }
        }
        Ok(())
    }

    /// Projection rule for a candidate of the given shape.
    pub fn rule_for(&self, shape: RecordShape) -> ResolvedRule {
        match shape {
            RecordShape::UnifiedExport => self.shapes.unified_export.resolve(shape),
            _ => self.shapes.statement.resolve(shape),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
