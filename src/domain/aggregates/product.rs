//! Product Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::value_objects::{
    EnergyLimitingClass, OvervoltageCategory, Price, Rating, RecordId, RohsStatus,
};
use crate::store::Document;

/// Identity and descriptive texts of a product.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralInformation {
    #[validate(length(min = 1, message = "A product must have a name."))]
    pub name: String,
    #[validate(length(min = 1, message = "A product must have a order code."))]
    pub order_code: String,
    pub ean: Option<String>,
    #[validate(length(min = 1, message = "A product must have a short description."))]
    pub catalog_description: String,
    #[validate(length(min = 1, message = "A product must have a long description."))]
    pub long_description: String,
    pub vn_description: Option<String>,
    pub minimum_order_quantity: Option<f64>,
    pub unit: Option<String>,
    #[serde(rename = "unit_vn")]
    pub unit_vn: Option<String>,
    pub co: Option<String>,
    #[validate(length(min = 1, message = "A product must have a place of manufacture."))]
    pub product_origin: String,
    #[validate(length(min = 1, message = "A product must have a brand!"))]
    pub product_brand: String,
}

impl GeneralInformation {
    fn normalize(&mut self) {
        trim_in_place(&mut self.name);
        trim_in_place(&mut self.order_code);
        trim_in_place(&mut self.catalog_description);
        trim_in_place(&mut self.long_description);
        if let Some(vn) = self.vn_description.as_mut() {
            trim_in_place(vn);
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Inventory {
    pub exist: f64,
    pub pre_ordered: f64,
    pub po: f64,
    pub last_updated: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Dimensions {
    pub net_length: Option<f64>,
    pub net_height: Option<f64>,
    pub net_width: Option<f64>,
    pub net_weight: Option<f64>,
}

/// Electrical and mechanical data sheet. Wire names follow the supplier
/// catalogue abbreviations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Technical {
    pub standards: Option<String>,
    pub number_of_poles: Option<f64>,
    #[serde(rename = "numberOfProtectPoles")]
    pub number_of_protected_poles: Option<f64>,
    #[serde(rename = "triCha")]
    pub tripping_characteristic: Option<String>,
    pub rated_current: Option<f64>,
    #[serde(rename = "ratOpeVol")]
    pub rated_operational_voltage: Option<String>,
    #[serde(rename = "ratSerShoCirBreCap")]
    pub rated_service_short_circuit_breaking_capacity: Option<String>,
    #[serde(rename = "ratUltShoCirBreCap")]
    pub rated_ultimate_short_circuit_breaking_capacity: Option<String>,
    #[serde(rename = "ratInsShoCirCurSet")]
    pub instantaneous_short_circuit_current_setting: Option<String>,
    #[serde(rename = "ratOpePowAc3")]
    pub rated_operational_power_ac3: Option<String>,
    #[serde(rename = "ratOpeCur")]
    pub rated_operational_current: Option<f64>,
    #[serde(rename = "ratOpeCurAc3")]
    pub rated_operational_current_ac3: Option<f64>,
    #[serde(rename = "ratOpeCurDc5")]
    pub rated_operational_current_dc5: Option<f64>,
    pub setting_range: Option<String>,
    pub power_loss: Option<String>,
    #[serde(rename = "rateInsVol")]
    pub rated_insulation_voltage: Option<String>,
    pub operational_voltage: Option<String>,
    pub rated_frequency: Option<String>,
    #[serde(rename = "ratShoCirCap")]
    pub rated_short_circuit_capacity: Option<String>,
    pub energy_limiting_class: Option<EnergyLimitingClass>,
    pub overvoltage_category: Option<OvervoltageCategory>,
    pub pollution_degree: Option<f64>,
    #[serde(rename = "ratImpWitVol")]
    pub rated_impulse_withstand_voltage: Option<String>,
    #[serde(rename = "dieTesVol")]
    pub dielectric_test_voltage: Option<String>,
    #[serde(rename = "houseMaterial")]
    pub housing_material: Option<String>,
    #[serde(rename = "typeOpeHea")]
    pub operating_head_type: Option<String>,
    pub actuator_material: Option<String>,
    #[serde(rename = "conPosInd")]
    pub contact_position_indicator: Option<String>,
    #[serde(rename = "conFreAirTheCur")]
    pub conventional_free_air_thermal_current: Option<String>,
    pub degree_of_protection: Option<String>,
    pub remarks: Option<String>,
    #[serde(rename = "wirStrLen")]
    pub wire_stripping_length: Option<String>,
    pub electrical_endurance: Option<String>,
    pub mechanical_endurance: Option<f64>,
    #[serde(rename = "termType")]
    pub terminal_type: Option<String>,
    #[serde(rename = "screwTermType")]
    pub screw_terminal_type: Option<String>,
    pub connecting_capacity: Option<String>,
    pub tightening_torque: Option<String>,
    #[serde(rename = "recScrDri")]
    pub recommended_screwdriver: Option<String>,
    pub mounting_on_din_rail: Option<String>,
    pub mounting_position: Option<String>,
    #[serde(rename = "minMouDis")]
    pub minimum_mounting_distance: Option<String>,
    pub builtin_depth: Option<f64>,
    pub installation_size: Option<String>,
    #[serde(rename = "powSupCon")]
    pub power_supply_connection: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Environmental {
    #[serde(rename = "ambAirTem")]
    pub ambient_air_temperature: Option<String>,
    #[serde(rename = "refAmbAirTem")]
    pub reference_ambient_air_temperature: Option<String>,
    /// Shock resistance according to IEC 60068-2-27.
    #[serde(rename = "reToShAcToIe60068227")]
    pub shock_resistance: Option<String>,
    #[serde(rename = "resVib")]
    pub vibration_resistance: Option<String>,
    #[serde(rename = "envCon")]
    pub environmental_conditions: Option<String>,
    #[serde(rename = "roHSStatus")]
    pub rohs_status: Option<RohsStatus>,
}

/// Everything a caller supplies when creating a product. Missing fields take
/// their defaults so that absent required values surface as validation
/// errors rather than decode errors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductData {
    #[validate(length(min = 1, message = "A product must have a name."))]
    pub title: String,
    #[validate]
    pub general_information: GeneralInformation,
    #[validate(length(min = 1, message = "A product must have a cover image."))]
    pub image_url: Vec<String>,
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1.0 and 5.0"))]
    pub ratings_average: f64,
    pub ratings_quantity: f64,
    pub price_discount: Option<Decimal>,
    pub price: Option<Price>,
    pub inventory: Inventory,
    pub dimensions: Dimensions,
    pub technical: Technical,
    pub environmental: Environmental,
    #[validate(length(min = 1, message = "A product must have link detail."))]
    pub original_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    pub secret_product: bool,
    pub sales: Vec<RecordId>,
}

impl Default for ProductData {
    fn default() -> Self {
        Self {
            title: String::new(),
            general_information: GeneralInformation::default(),
            image_url: vec![],
            ratings_average: Rating::DEFAULT,
            ratings_quantity: 0.0,
            price_discount: None,
            price: None,
            inventory: Inventory::default(),
            dimensions: Dimensions::default(),
            technical: Technical::default(),
            environmental: Environmental::default(),
            original_link: String::new(),
            created_at: None,
            secret_product: false,
            sales: vec![],
        }
    }
}

impl ProductData {
    /// Applies the write-time setters: trimming and rating rounding.
    pub fn normalize(&mut self) {
        trim_in_place(&mut self.title);
        self.general_information.normalize();
        self.ratings_average = Rating::round(self.ratings_average);
    }
}

/// Stored product record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: RecordId,
    #[serde(default)]
    pub slug: String,
    #[serde(flatten)]
    pub data: ProductData,
}

impl Product {
    pub fn title(&self) -> &str { &self.data.title }
}

/// Partial update. Only the fields that are `Some` are written.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "A product must have a name."))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate]
    pub general_information: Option<GeneralInformation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "A product must have a cover image."))]
    pub image_url: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1.0 and 5.0"))]
    pub ratings_average: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ratings_quantity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_discount: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<Inventory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub technical: Option<Technical>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environmental: Option<Environmental>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "A product must have link detail."))]
    pub original_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_product: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sales: Option<Vec<RecordId>>,
}

impl ProductPatch {
    pub fn normalize(&mut self) {
        if let Some(title) = self.title.as_mut() {
            trim_in_place(title);
        }
        if let Some(info) = self.general_information.as_mut() {
            info.normalize();
        }
        if let Some(rating) = self.ratings_average.as_mut() {
            *rating = Rating::round(*rating);
        }
    }

    pub fn is_empty(&self) -> bool { self == &Self::default() }
}

/// Product as handed out to readers, with its virtuals attached.
#[derive(Clone, Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<Document>>,
}

impl ProductView {
    pub fn new(product: Product) -> Self {
        let id = product.id.to_string();
        Self { product, id, reviews: None }
    }

    pub fn with_reviews(mut self, reviews: Vec<Document>) -> Self {
        self.reviews = Some(reviews);
        self
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}
