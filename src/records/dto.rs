use serde::Deserialize;
use time::{macros::format_description, Date};

use crate::{
    error::AppError,
    records::{
        repo_types::{NewWasteRecord, WasteRecord},
        services::{waste_percentage, wasted},
    },
};

/// Body of `POST /add`. Quantities are coerced by the `Form` extractor.
#[derive(Debug, Deserialize)]
pub struct AddRecordForm {
    pub school_name: String,
    pub meal_type: String,
    pub food_prepared: f64,
    pub food_served: f64,
    #[serde(default)]
    pub date: Option<String>, // YYYY-MM-DD, blank means today
}

impl AddRecordForm {
    pub fn into_new_record(self, today: Date) -> Result<NewWasteRecord, AppError> {
        let school_name = required("school_name", self.school_name)?;
        let meal_type = required("meal_type", self.meal_type)?;
        let date = match self.date.as_deref().map(str::trim) {
            None | Some("") => today,
            Some(raw) => Date::parse(raw, format_description!("[year]-[month]-[day]"))
                .map_err(|_| AppError::BadRequest(format!("invalid date: {raw}")))?,
        };
        Ok(NewWasteRecord {
            school_name,
            meal_type,
            food_prepared: self.food_prepared,
            food_served: self.food_served,
            date,
        })
    }
}

fn required(field: &str, value: String) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

#[derive(Debug, Default, Deserialize)]
pub struct NoticeQuery {
    pub notice: Option<String>,
}

/// A record with its derived quantities, as shown in tables.
#[derive(Debug, Clone)]
pub struct RecordRow {
    pub id: i64,
    pub school_name: String,
    pub meal_type: String,
    pub food_prepared: f64,
    pub food_served: f64,
    pub food_wasted: f64,
    pub waste_percentage: f64,
    pub date: Date,
}

impl From<&WasteRecord> for RecordRow {
    fn from(r: &WasteRecord) -> Self {
        Self {
            id: r.id,
            school_name: r.school_name.clone(),
            meal_type: r.meal_type.clone(),
            food_prepared: r.food_prepared,
            food_served: r.food_served,
            food_wasted: wasted(r),
            waste_percentage: waste_percentage(r),
            date: r.date,
        }
    }
}
