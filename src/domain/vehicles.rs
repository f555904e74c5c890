//! Vehicle creation invariants and partial updates.

use rust_decimal::Decimal;

use super::entities::VehicleRecord;
use super::error::DomainError;

/// Validated input for a vehicle that has not been persisted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVehicle {
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub color: String,
    pub price: Decimal,
}

impl NewVehicle {
    pub fn new(
        brand: impl Into<String>,
        model: impl Into<String>,
        year: i32,
        color: Option<String>,
        price: Option<Decimal>,
    ) -> Result<Self, DomainError> {
        let brand = brand.into();
        let model = model.into();

        ensure_present(&brand, "brand")?;
        ensure_present(&model, "model")?;
        ensure_year(year)?;

        Ok(Self {
            brand,
            model,
            year,
            color: color.unwrap_or_default(),
            price: price.unwrap_or(Decimal::ZERO),
        })
    }
}

/// Partial update: `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehiclePatch {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub price: Option<Decimal>,
}

impl VehiclePatch {
    pub fn is_empty(&self) -> bool {
        self.brand.is_none()
            && self.model.is_none()
            && self.year.is_none()
            && self.color.is_none()
            && self.price.is_none()
    }

    /// Overwrite the fields present in the patch.
    pub fn apply_to(self, record: &mut VehicleRecord) {
        if let Some(brand) = self.brand {
            record.brand = brand;
        }
        if let Some(model) = self.model {
            record.model = model;
        }
        if let Some(year) = self.year {
            record.year = year;
        }
        if let Some(color) = self.color {
            record.color = color;
        }
        if let Some(price) = self.price {
            record.price = price;
        }
    }
}

fn ensure_present(value: &str, field: &'static str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    Ok(())
}

fn ensure_year(year: i32) -> Result<(), DomainError> {
    if year == 0 {
        return Err(DomainError::validation("year is required"));
    }
    Ok(())
}
