use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::catalog::Layout;
use crate::utils;

pub const DEFAULT_HEADER_COLOR: &str = "#3f51b5";
pub const DEFAULT_BACKGROUND_COLOR: &str = "#ffffff";
pub const DEFAULT_TEXT_COLOR: &str = "#000000";
pub const DEFAULT_ACCENT_COLOR: &str = "#f44336";
pub const DEFAULT_FONT_FAMILY: &str = "Roboto, sans-serif";
pub const DEFAULT_SECTION_COLOR: &str = "#f5f5f5";

/// Element id → display string, overriding the layout defaults
pub type TemplateContent = BTreeMap<String, String>;
/// Element id → offset from the element's normal flow position
pub type ElementPositions = BTreeMap<String, Position>;
/// Region name → visibility and placement hints
pub type ElementSettings = BTreeMap<String, ElementSetting>;
/// Column name → cell value, in insertion order
pub type TableRow = Map<String, Value>;

/// Treat an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + DeserializeOwned,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept an RFC 3339 timestamp, a plain `YYYY-MM-DD` date or epoch
/// milliseconds. Anything else, `null` included, becomes the current time.
fn lenient_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = match &value {
        Some(Value::String(s)) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc())
            }),
        Some(Value::Number(n)) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    Ok(parsed.unwrap_or_else(|| {
        if let Some(value) = value.filter(|v| !v.is_null()) {
            log::warn!("Unreadable date {}, using the current time", value);
        }
        Utc::now()
    }))
}

/// Accept a number or a numeric string; anything else becomes 0
fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let id = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(id.and_then(|id| u32::try_from(id).ok()).unwrap_or_default())
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceItem {
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_description: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub quantity: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub rate: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub amount: f64, // cache of quantity * rate
}

impl InvoiceItem {
    pub fn new(description: impl Into<String>, quantity: f64, rate: f64) -> Self {
        Self {
            description: description.into(),
            detailed_description: None,
            quantity,
            rate,
            amount: quantity * rate,
        }
    }

    /// Refresh `amount` from `quantity` and `rate`
    pub fn recompute(&mut self) {
        self.amount = self.quantity * self.rate;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    #[default]
    Normal,
    Table,
    Text,
}

impl SectionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Some(SectionKind::Normal),
            "table" => Some(SectionKind::Table),
            "text" => Some(SectionKind::Text),
            _ => None,
        }
    }
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SectionKind::Normal => "normal",
            SectionKind::Table => "table",
            SectionKind::Text => "text",
        };
        f.write_str(s)
    }
}

/// A user-added block appended to the invoice body
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomSection {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(deserialize_with = "null_as_default")]
    pub color: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub kind: SectionKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<TableRow>>,
}

impl CustomSection {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        color: impl Into<String>,
    ) -> Self {
        Self {
            id: utils::generate_section_id(),
            title: title.into(),
            content: content.into(),
            color: color.into(),
            kind: SectionKind::Normal,
            columns: None,
            rows: None,
        }
    }
}

/// Named regions of an invoice page that carry an `ElementSetting`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Region {
    Header,
    Logo,
    CompanyInfo,
    ClientInfo,
    InvoiceDetails,
    PropertyInfo,
    ItemsTable,
    TotalSection,
    Notes,
    Footer,
}

impl Region {
    pub const ALL: [Region; 10] = [
        Region::Header,
        Region::Logo,
        Region::CompanyInfo,
        Region::ClientInfo,
        Region::InvoiceDetails,
        Region::PropertyInfo,
        Region::ItemsTable,
        Region::TotalSection,
        Region::Notes,
        Region::Footer,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Region::Header => "header",
            Region::Logo => "logo",
            Region::CompanyInfo => "companyInfo",
            Region::ClientInfo => "clientInfo",
            Region::InvoiceDetails => "invoiceDetails",
            Region::PropertyInfo => "propertyInfo",
            Region::ItemsTable => "itemsTable",
            Region::TotalSection => "totalSection",
            Region::Notes => "notes",
            Region::Footer => "footer",
        }
    }

    pub fn parse(key: &str) -> Option<Region> {
        Region::ALL.iter().copied().find(|r| r.key() == key)
    }
}

fn default_visible() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSetting {
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl Default for ElementSetting {
    fn default() -> Self {
        Self::shown()
    }
}

impl ElementSetting {
    pub fn shown() -> Self {
        Self {
            visible: true,
            alignment: None,
            size: None,
            position: None,
            style: None,
            content: None,
        }
    }

    pub fn hidden() -> Self {
        Self {
            visible: false,
            ..Self::shown()
        }
    }

    pub fn alignment(mut self, value: &str) -> Self {
        self.alignment = Some(value.to_string());
        self
    }

    pub fn size(mut self, value: &str) -> Self {
        self.size = Some(value.to_string());
        self
    }

    pub fn position(mut self, value: &str) -> Self {
        self.position = Some(value.to_string());
        self
    }

    pub fn style(mut self, value: &str) -> Self {
        self.style = Some(value.to_string());
        self
    }

    pub fn content(mut self, value: &str) -> Self {
        self.content = Some(value.to_string());
        self
    }
}

/// Build an `ElementSettings` map from region/setting pairs
pub fn element_settings<I>(entries: I) -> ElementSettings
where
    I: IntoIterator<Item = (Region, ElementSetting)>,
{
    entries
        .into_iter()
        .map(|(region, setting)| (region.key().to_string(), setting))
        .collect()
}

/// Settings a fresh editing session starts with
pub fn default_element_settings() -> ElementSettings {
    element_settings([
        (Region::Header, ElementSetting::shown().alignment("center")),
        (Region::Logo, ElementSetting::shown().alignment("left").size("medium")),
        (Region::CompanyInfo, ElementSetting::shown().alignment("left")),
        (Region::ClientInfo, ElementSetting::shown().alignment("right")),
        (Region::InvoiceDetails, ElementSetting::shown().alignment("right")),
        (Region::ItemsTable, ElementSetting::shown()),
        (Region::TotalSection, ElementSetting::shown().alignment("right")),
        (Region::Notes, ElementSetting::shown().alignment("left")),
        (Region::Footer, ElementSetting::shown().alignment("center")),
    ])
}

/// Settings given to a custom template that was saved without any
pub fn template_element_settings() -> ElementSettings {
    element_settings([
        (Region::Header, ElementSetting::shown().position("top")),
        (Region::Logo, ElementSetting::shown().size("medium")),
        (Region::CompanyInfo, ElementSetting::shown().alignment("left")),
        (Region::ClientInfo, ElementSetting::shown().alignment("right")),
        (Region::InvoiceDetails, ElementSetting::shown().style("standard")),
        (Region::ItemsTable, ElementSetting::shown().style("standard")),
        (Region::TotalSection, ElementSetting::shown().alignment("right")),
        (Region::Notes, ElementSetting::shown().position("bottom")),
        (Region::Footer, ElementSetting::shown().content("Thank you for your business!")),
    ])
}

/// The layout an invoice uses.
///
/// Stored on disk under two keys, `templateId` (numeric gallery id) and
/// `layout` (string key), so that data written by older versions keeps
/// loading. Both are derived from the single `Layout` value on write; on
/// read a recognized `layout` wins, then a recognized `templateId`, then
/// `classic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LayoutSelection(pub Layout);

impl Serialize for LayoutSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("LayoutSelection", 2)?;
        state.serialize_field("templateId", &self.0.template_id())?;
        state.serialize_field("layout", &self.0)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for LayoutSelection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(rename = "templateId", default)]
            template_id: Option<Value>,
            #[serde(default)]
            layout: Option<Value>,
        }

        let raw = Raw::deserialize(deserializer)?;
        let by_key = raw
            .layout
            .as_ref()
            .and_then(Value::as_str)
            .and_then(Layout::parse);
        let by_id = raw.template_id.as_ref().and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse::<u64>().ok(),
            _ => None,
        });

        let layout = match (by_key, by_id) {
            (Some(layout), _) => layout,
            (None, Some(id)) => u32::try_from(id)
                .map(Layout::from_template_id)
                .unwrap_or_default(),
            (None, None) => Layout::Classic,
        };
        Ok(LayoutSelection(layout))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Invoice {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub phone: String,
    #[serde(deserialize_with = "null_as_default")]
    pub business: String,
    #[serde(deserialize_with = "null_as_default")]
    pub property_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<InvoiceItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub total: f64, // cache of the item amounts, refreshed on save
    #[serde(deserialize_with = "lenient_date")]
    pub date: DateTime<Utc>,
    #[serde(deserialize_with = "null_as_default")]
    pub invoice_number: String,
    #[serde(deserialize_with = "null_as_default")]
    pub notes: String,
    #[serde(flatten)]
    pub layout: LayoutSelection,
    #[serde(deserialize_with = "null_as_default")]
    pub header_color: String,
    #[serde(deserialize_with = "null_as_default")]
    pub background_color: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub template_content: TemplateContent,
    #[serde(deserialize_with = "null_as_default")]
    pub element_positions: ElementPositions,
    #[serde(deserialize_with = "null_as_default")]
    pub custom_sections: Vec<CustomSection>,
    pub custom_template_id: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub element_settings: ElementSettings,
}

impl Default for Invoice {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            email: String::new(),
            address: String::new(),
            phone: String::new(),
            business: String::new(),
            property_name: String::new(),
            items: Vec::new(),
            total: 0.0,
            date: Utc::now(),
            invoice_number: String::new(),
            notes: String::new(),
            layout: LayoutSelection::default(),
            header_color: DEFAULT_HEADER_COLOR.to_string(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            text_color: DEFAULT_TEXT_COLOR.to_string(),
            font_family: None,
            accent_color: None,
            template_content: TemplateContent::new(),
            element_positions: ElementPositions::new(),
            custom_sections: Vec::new(),
            custom_template_id: None,
            element_settings: ElementSettings::new(),
        }
    }
}

impl Invoice {
    /// A fresh draft: one blank item, a new invoice number, default settings.
    /// The id stays empty until the first save.
    pub fn new() -> Self {
        Self {
            items: vec![InvoiceItem::new("", 1.0, 0.0)],
            invoice_number: utils::generate_invoice_number(),
            element_settings: default_element_settings(),
            ..Self::default()
        }
    }

    pub fn layout(&self) -> Layout {
        self.layout.0
    }

    pub fn set_layout(&mut self, layout: Layout) {
        self.layout = LayoutSelection(layout);
    }

    /// Σ of `quantity * rate` over the items, independent of cached amounts
    pub fn computed_total(&self) -> f64 {
        self.items.iter().map(|item| item.quantity * item.rate).sum()
    }

    /// Refresh every item amount, then the total
    pub fn recompute_totals(&mut self) {
        for item in &mut self.items {
            item.recompute();
        }
        self.total = self.items.iter().map(|item| item.amount).sum();
    }

    /// Fill presentation fields that older saved data left empty
    pub fn fill_defaults(&mut self) {
        if self.header_color.trim().is_empty() {
            self.header_color = DEFAULT_HEADER_COLOR.to_string();
        }
        if self.background_color.trim().is_empty() {
            self.background_color = DEFAULT_BACKGROUND_COLOR.to_string();
        }
        if self.text_color.trim().is_empty() {
            self.text_color = DEFAULT_TEXT_COLOR.to_string();
        }
    }

    /// Check the fields a save requires
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = Vec::new();

        if self.items.is_empty() {
            errors.push(FieldError::new("items", "at least one item is required"));
        }
        for (i, item) in self.items.iter().enumerate() {
            if item.description.trim().is_empty() {
                errors.push(FieldError::new(
                    format!("items[{}].description", i),
                    "description is required",
                ));
            }
            if !item.quantity.is_finite() || item.quantity < 1.0 {
                errors.push(FieldError::new(
                    format!("items[{}].quantity", i),
                    "quantity must be at least 1",
                ));
            }
            if !item.rate.is_finite() || item.rate < 0.0 {
                errors.push(FieldError::new(
                    format!("items[{}].rate", i),
                    "rate must not be negative",
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(errors))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
pub struct ValidationErrors(pub Vec<FieldError>);

/// A reusable bundle of presentation settings saved by the user
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomTemplate {
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    pub created_date: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "null_as_default")]
    pub is_custom: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub layout: Layout,
    #[serde(deserialize_with = "null_as_default")]
    pub header_color: String,
    #[serde(deserialize_with = "null_as_default")]
    pub background_color: String,
    #[serde(deserialize_with = "null_as_default")]
    pub text_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub template_content: TemplateContent,
    #[serde(deserialize_with = "null_as_default")]
    pub element_positions: ElementPositions,
    #[serde(deserialize_with = "null_as_default")]
    pub custom_sections: Vec<CustomSection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_settings: Option<ElementSettings>,
}

/// Record shape of the older `savedTemplates` storage, keyed by gallery id
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SavedTemplate {
    #[serde(deserialize_with = "lenient_u32")]
    pub id: u32,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub content: TemplateContent,
    #[serde(deserialize_with = "null_as_default")]
    pub positions: ElementPositions,
    #[serde(deserialize_with = "null_as_default")]
    pub header_color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub items: Vec<InvoiceItem>,
    #[serde(deserialize_with = "null_as_default")]
    pub custom_sections: Vec<CustomSection>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dates_load_from_the_forms_browsers_write() {
        let parse =
            |date: Value| serde_json::from_value::<Invoice>(json!({ "date": date })).unwrap().date;

        assert_eq!(
            parse(json!("2024-03-01T10:30:00.000Z")).to_rfc3339(),
            "2024-03-01T10:30:00+00:00"
        );
        assert_eq!(parse(json!("2024-03-01")).to_rfc3339(), "2024-03-01T00:00:00+00:00");
        assert_eq!(parse(json!(0)).timestamp(), 0);

        let before = Utc::now();
        assert!(parse(Value::Null) >= before);
        assert!(parse(json!("next tuesday")) >= before);
    }

    #[test]
    fn item_amount_follows_quantity_and_rate() {
        let mut item = InvoiceItem::new("Design", 5.0, 120.0);
        assert_eq!(item.amount, 600.0);

        item.quantity = 2.0;
        item.recompute();
        assert_eq!(item.amount, 240.0);
    }

    #[test]
    fn total_is_sum_of_amounts() {
        let mut invoice = Invoice::default();
        invoice.items = vec![InvoiceItem::new("A", 5.0, 120.0), InvoiceItem::new("B", 3.0, 100.0)];
        invoice.recompute_totals();
        assert_eq!(invoice.total, 900.0);
    }

    #[test]
    fn loading_sparse_invoice_fills_defaults() {
        let raw = json!({
            "id": "invoice_1",
            "name": "Ada",
            "items": [{"description": "Work", "quantity": 2, "rate": 50}],
            "date": "2024-03-01T10:00:00.000Z",
            "customSections": null
        });
        let mut invoice: Invoice = serde_json::from_value(raw).unwrap();
        invoice.fill_defaults();

        assert_eq!(invoice.layout(), Layout::Classic);
        assert_eq!(invoice.header_color, DEFAULT_HEADER_COLOR);
        assert_eq!(invoice.background_color, DEFAULT_BACKGROUND_COLOR);
        assert_eq!(invoice.text_color, DEFAULT_TEXT_COLOR);
        assert!(invoice.template_content.is_empty());
        assert!(invoice.element_positions.is_empty());
        assert!(invoice.custom_sections.is_empty());
        assert_eq!(invoice.items[0].amount, 0.0);
    }

    #[test]
    fn empty_colors_are_replaced_on_fill() {
        let raw = json!({"id": "x", "date": "2024-03-01T10:00:00Z", "headerColor": ""});
        let mut invoice: Invoice = serde_json::from_value(raw).unwrap();
        invoice.fill_defaults();
        assert_eq!(invoice.header_color, DEFAULT_HEADER_COLOR);
    }

    #[test]
    fn layout_key_wins_over_template_id() {
        let raw = json!({
            "id": "x",
            "date": "2024-03-01T10:00:00Z",
            "templateId": 4,
            "layout": "modern"
        });
        let invoice: Invoice = serde_json::from_value(raw).unwrap();
        assert_eq!(invoice.layout(), Layout::Modern);
    }

    #[test]
    fn template_id_used_when_layout_missing_or_unknown() {
        let raw = json!({"id": "x", "date": "2024-03-01T10:00:00Z", "templateId": 4});
        let invoice: Invoice = serde_json::from_value(raw).unwrap();
        assert_eq!(invoice.layout(), Layout::RealEstate);

        let raw = json!({
            "id": "x",
            "date": "2024-03-01T10:00:00Z",
            "templateId": 5,
            "layout": "neon"
        });
        let invoice: Invoice = serde_json::from_value(raw).unwrap();
        assert_eq!(invoice.layout(), Layout::BusinessPro);
    }

    #[test]
    fn unknown_layout_and_id_fall_back_to_classic() {
        let raw = json!({
            "id": "x",
            "date": "2024-03-01T10:00:00Z",
            "templateId": 99,
            "layout": "neon"
        });
        let invoice: Invoice = serde_json::from_value(raw).unwrap();
        assert_eq!(invoice.layout(), Layout::Classic);
    }

    #[test]
    fn both_layout_keys_are_written() {
        let mut invoice = Invoice::default();
        invoice.set_layout(Layout::BlackWhite);
        let value = serde_json::to_value(&invoice).unwrap();
        assert_eq!(value["layout"], json!("black-white"));
        assert_eq!(value["templateId"], json!(8));
        assert_eq!(value["propertyName"], json!(""));
    }

    #[test]
    fn section_kind_serializes_as_type() {
        let mut section = CustomSection::new("Terms", "Net 30", DEFAULT_SECTION_COLOR);
        section.kind = SectionKind::Table;
        let value = serde_json::to_value(&section).unwrap();
        assert_eq!(value["type"], json!("table"));
        assert!(value.get("columns").is_none());
    }

    #[test]
    fn table_rows_keep_key_order() {
        let raw = json!({
            "id": "s1", "title": "T", "content": "", "color": "#fff", "type": "table",
            "columns": ["Zeta", "Alpha"],
            "rows": [{"Zeta": "1", "Alpha": "2"}]
        });
        let section: CustomSection = serde_json::from_value(raw).unwrap();
        let keys: Vec<&String> = section.rows.as_ref().unwrap()[0].keys().collect();
        assert_eq!(keys, vec!["Zeta", "Alpha"]);
    }

    #[test]
    fn element_setting_defaults_to_visible() {
        let setting: ElementSetting = serde_json::from_value(json!({"alignment": "left"})).unwrap();
        assert!(setting.visible);
        assert_eq!(setting.alignment.as_deref(), Some("left"));
    }

    #[test]
    fn validation_reports_each_bad_field() {
        let mut invoice = Invoice::default();
        invoice.items = vec![
            InvoiceItem::new("Ok", 1.0, 10.0),
            InvoiceItem::new("", 0.0, -1.0),
        ];
        let errors = invoice.validate().unwrap_err();
        let fields: Vec<&str> = errors.0.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["items[1].description", "items[1].quantity", "items[1].rate"]);
    }

    #[test]
    fn validation_requires_an_item() {
        let invoice = Invoice::default();
        assert!(invoice.validate().is_err());
    }

    #[test]
    fn new_draft_is_valid_once_described() {
        let mut invoice = Invoice::new();
        assert!(invoice.invoice_number.starts_with("INV-"));
        invoice.items[0].description = "Consulting".to_string();
        assert!(invoice.validate().is_ok());
    }
}
