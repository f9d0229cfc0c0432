use chrono::Utc;

use super::EditError;
use super::sections::{default_columns, DEFAULT_SECTION_TITLE};
use crate::catalog::{defaults_for, DefaultsContext, ItemsPolicy, Layout};
use crate::models::{
    CustomTemplate, ElementSetting, Invoice, InvoiceItem, SavedTemplate, SectionKind,
    default_element_settings, DEFAULT_SECTION_COLOR,
};
use crate::utils;

/// Switch the draft to `layout` and load that layout's defaults.
///
/// Content, positions and sections from the previous layout are dropped.
/// Colors are replaced by the layout palette, element settings are
/// overridden region by region, and the layout's items policy is applied.
pub fn apply_layout(invoice: &mut Invoice, layout: Layout, ctx: &DefaultsContext) {
    let defaults = defaults_for(layout, ctx);

    invoice.set_layout(layout);
    invoice.template_content = defaults.content;
    invoice.element_positions.clear();
    invoice.custom_sections = defaults.sections;
    invoice.custom_template_id = None;

    invoice.header_color = defaults.colors.header;
    invoice.background_color = defaults.colors.background;
    invoice.text_color = defaults.colors.text;

    for (region, setting) in defaults.element_settings {
        invoice.element_settings.insert(region, setting);
    }

    match defaults.items {
        ItemsPolicy::Keep => {}
        ItemsPolicy::Replace(items) => invoice.items = items,
        ItemsPolicy::FillIfEmpty(items) => {
            if invoice.items.is_empty() {
                invoice.items = items;
            }
        }
    }

    invoice.recompute_totals();
    log::debug!("Applied layout {} to invoice {}", layout, invoice.invoice_number);
}

/// `apply_layout` by string key; unknown keys load the classic layout
pub fn apply_layout_key(invoice: &mut Invoice, key: &str, ctx: &DefaultsContext) -> Layout {
    let layout = Layout::from_key(key);
    apply_layout(invoice, layout, ctx);
    layout
}

/// `apply_layout` by gallery id; unknown ids load the classic layout
pub fn apply_template_id(invoice: &mut Invoice, id: u32, ctx: &DefaultsContext) -> Layout {
    let layout = Layout::from_template_id(id);
    apply_layout(invoice, layout, ctx);
    layout
}

// Items

pub fn add_item(invoice: &mut Invoice, item: InvoiceItem) -> usize {
    invoice.items.push(item);
    invoice.recompute_totals();
    invoice.items.len() - 1
}

/// Remove an item. The last remaining item cannot be removed.
pub fn remove_item(invoice: &mut Invoice, index: usize) -> Result<InvoiceItem, EditError> {
    if index >= invoice.items.len() {
        return Err(EditError::ItemNotFound(index));
    }
    if invoice.items.len() == 1 {
        return Err(EditError::LastItem);
    }
    let item = invoice.items.remove(index);
    invoice.recompute_totals();
    Ok(item)
}

/// Fields to change on an item; `None` leaves a field as it is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemUpdate {
    pub description: Option<String>,
    pub detailed_description: Option<String>,
    pub quantity: Option<f64>,
    pub rate: Option<f64>,
}

pub fn update_item(
    invoice: &mut Invoice,
    index: usize,
    update: ItemUpdate,
) -> Result<(), EditError> {
    let item = invoice.items.get_mut(index).ok_or(EditError::ItemNotFound(index))?;
    if let Some(description) = update.description {
        item.description = description;
    }
    if let Some(detail) = update.detailed_description {
        item.detailed_description = (!detail.is_empty()).then_some(detail);
    }
    if let Some(quantity) = update.quantity {
        item.quantity = quantity;
    }
    if let Some(rate) = update.rate {
        item.rate = rate;
    }
    invoice.recompute_totals();
    Ok(())
}

// Plain fields

pub const FIELDS: [&str; 8] = [
    "name",
    "email",
    "address",
    "phone",
    "business",
    "propertyName",
    "invoiceNumber",
    "notes",
];

/// Set one of the free-text invoice fields by its JSON name
pub fn set_field(invoice: &mut Invoice, field: &str, value: &str) -> Result<(), EditError> {
    let slot = match field {
        "name" => &mut invoice.name,
        "email" => &mut invoice.email,
        "address" => &mut invoice.address,
        "phone" => &mut invoice.phone,
        "business" => &mut invoice.business,
        "propertyName" => &mut invoice.property_name,
        "invoiceNumber" => &mut invoice.invoice_number,
        "notes" => &mut invoice.notes,
        other => return Err(EditError::UnknownField(other.to_string())),
    };
    *slot = value.to_string();
    Ok(())
}

/// Override the text of a layout element. An empty value drops the
/// override so the layout default shows again.
pub fn set_content(invoice: &mut Invoice, element_id: &str, value: &str) {
    if value.is_empty() {
        invoice.template_content.remove(element_id);
    } else {
        invoice.template_content.insert(element_id.to_string(), value.to_string());
    }
}

pub fn set_colors(
    invoice: &mut Invoice,
    header: Option<&str>,
    background: Option<&str>,
    text: Option<&str>,
) {
    if let Some(header) = header {
        invoice.header_color = header.to_string();
    }
    if let Some(background) = background {
        invoice.background_color = background.to_string();
    }
    if let Some(text) = text {
        invoice.text_color = text.to_string();
    }
}

pub fn set_typography(
    invoice: &mut Invoice,
    font_family: Option<&str>,
    accent_color: Option<&str>,
) {
    if let Some(font) = font_family {
        invoice.font_family = Some(font.to_string());
    }
    if let Some(accent) = accent_color {
        invoice.accent_color = Some(accent.to_string());
    }
}

/// Changes to one region's element setting; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingUpdate {
    pub visible: Option<bool>,
    pub alignment: Option<String>,
    pub size: Option<String>,
    pub position: Option<String>,
    pub style: Option<String>,
    pub content: Option<String>,
}

/// Merge `update` into the setting of `region`, creating it when missing.
/// Region names are not checked so settings for unknown regions survive.
pub fn update_element_setting(invoice: &mut Invoice, region: &str, update: SettingUpdate) {
    let setting = invoice
        .element_settings
        .entry(region.to_string())
        .or_insert_with(ElementSetting::shown);
    if let Some(visible) = update.visible {
        setting.visible = visible;
    }
    if update.alignment.is_some() {
        setting.alignment = update.alignment;
    }
    if update.size.is_some() {
        setting.size = update.size;
    }
    if update.position.is_some() {
        setting.position = update.position;
    }
    if update.style.is_some() {
        setting.style = update.style;
    }
    if update.content.is_some() {
        setting.content = update.content;
    }
}

// Custom templates

/// Snapshot the presentation of `invoice` as a new, unsaved custom template
pub fn capture_template(invoice: &Invoice, name: &str, description: &str) -> CustomTemplate {
    let element_settings = if invoice.element_settings.is_empty() {
        default_element_settings()
    } else {
        invoice.element_settings.clone()
    };

    CustomTemplate {
        id: String::new(),
        name: name.to_string(),
        description: description.to_string(),
        thumbnail_url: None,
        created_date: Some(Utc::now()),
        last_modified: None,
        is_custom: true,
        layout: invoice.layout(),
        header_color: invoice.header_color.clone(),
        background_color: invoice.background_color.clone(),
        text_color: invoice.text_color.clone(),
        accent_color: invoice.accent_color.clone(),
        font_family: invoice.font_family.clone(),
        template_content: invoice.template_content.clone(),
        element_positions: invoice.element_positions.clone(),
        custom_sections: invoice.custom_sections.clone(),
        element_settings: Some(element_settings),
    }
}

/// Copy a template's presentation into the draft and link the draft to it.
/// The template itself is only read.
pub fn apply_custom_template(invoice: &mut Invoice, template: &CustomTemplate) {
    invoice.set_layout(template.layout);
    invoice.header_color = template.header_color.clone();
    invoice.background_color = template.background_color.clone();
    invoice.text_color = template.text_color.clone();
    invoice.font_family = template.font_family.clone();
    invoice.accent_color = template.accent_color.clone();
    invoice.template_content = template.template_content.clone();
    invoice.element_positions = template.element_positions.clone();
    invoice.custom_sections = template.custom_sections.clone();
    if let Some(settings) = &template.element_settings {
        invoice.element_settings = settings.clone();
    }
    invoice.custom_template_id = Some(template.id.clone());
    invoice.fill_defaults();
}

// Legacy per-layout overrides

/// The draft as a legacy saved template, keyed by its layout's gallery id
pub fn to_saved_template(invoice: &Invoice) -> Result<SavedTemplate, EditError> {
    let layout = invoice.layout();
    let id = layout.template_id().ok_or(EditError::NotInGallery(layout))?;

    let mut sections = invoice.custom_sections.clone();
    for section in &mut sections {
        if section.kind == SectionKind::Table {
            section.rows.get_or_insert_with(Vec::new);
        }
    }

    Ok(SavedTemplate {
        id,
        name: format!("Custom Template {}", id),
        content: invoice.template_content.clone(),
        positions: invoice.element_positions.clone(),
        header_color: invoice.header_color.clone(),
        background_color: Some(invoice.background_color.clone()),
        text_color: Some(invoice.text_color.clone()),
        items: invoice.items.clone(),
        custom_sections: sections,
    })
}

/// Load a legacy saved template over the draft.
///
/// Content, positions and header color are replaced. Background and text
/// colors, items and sections are only replaced when the record has them.
pub fn apply_saved_template(invoice: &mut Invoice, saved: &SavedTemplate) {
    invoice.template_content = saved.content.clone();
    invoice.element_positions = saved.positions.clone();
    if !saved.header_color.is_empty() {
        invoice.header_color = saved.header_color.clone();
    }
    if let Some(background) = saved.background_color.as_ref().filter(|c| !c.is_empty()) {
        invoice.background_color = background.clone();
    }
    if let Some(text) = saved.text_color.as_ref().filter(|c| !c.is_empty()) {
        invoice.text_color = text.clone();
    }

    if !saved.items.is_empty() {
        invoice.items = saved.items.clone();
    }

    if !saved.custom_sections.is_empty() {
        invoice.custom_sections = saved
            .custom_sections
            .iter()
            .cloned()
            .map(|mut section| {
                if section.id.is_empty() {
                    section.id = utils::generate_section_id();
                }
                if section.title.is_empty() {
                    section.title = DEFAULT_SECTION_TITLE.to_string();
                }
                if section.color.is_empty() {
                    section.color = DEFAULT_SECTION_COLOR.to_string();
                }
                if section.kind == SectionKind::Table {
                    section.columns.get_or_insert_with(default_columns);
                    section.rows.get_or_insert_with(Vec::new);
                }
                section
            })
            .collect();
    }

    invoice.recompute_totals();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::models::{CustomSection, Position, DEFAULT_HEADER_COLOR};
    use crate::store::InvoiceStore;
    use chrono::NaiveDate;

    fn ctx() -> DefaultsContext {
        DefaultsContext::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), "0042")
    }

    #[test]
    fn classic_layout_on_fresh_draft() {
        let mut invoice = Invoice::new();
        apply_layout(&mut invoice, Layout::Classic, &ctx());

        assert_eq!(invoice.template_content["header-title"], "INVOICE");
        assert_eq!(invoice.header_color, DEFAULT_HEADER_COLOR);
        assert_eq!(invoice.layout(), Layout::Classic);
    }

    #[test]
    fn unknown_layout_key_loads_classic_defaults() {
        let mut invoice = Invoice::new();
        apply_layout(&mut invoice, Layout::Creative, &ctx());

        let layout = apply_layout_key(&mut invoice, "holographic", &ctx());

        assert_eq!(layout, Layout::Classic);
        assert_eq!(invoice.template_content, defaults_for(Layout::Classic, &ctx()).content);
        assert_eq!(invoice.header_color, "#3f51b5");
        assert_eq!(invoice.background_color, "#ffffff");
        assert!(invoice.custom_sections.is_empty());
    }

    #[test]
    fn layout_switch_resets_content_positions_and_sections() {
        let mut invoice = Invoice::new();
        invoice.template_content.insert("promo".into(), "50% off".into());
        invoice.element_positions.insert("logo".into(), Position::new(3.0, 4.0));
        invoice.custom_sections.push(CustomSection::new("Old", "", "#fff"));

        apply_layout(&mut invoice, Layout::Modern, &ctx());

        assert!(!invoice.template_content.contains_key("promo"));
        assert!(invoice.element_positions.is_empty());
        assert_eq!(invoice.custom_sections.len(), 1);
        assert_eq!(invoice.custom_sections[0].title, "PAYMENT DETAILS");
        assert_eq!(invoice.header_color, "#2196f3");
    }

    #[test]
    fn element_settings_merge_per_region() {
        let mut invoice = Invoice::new();
        invoice
            .element_settings
            .insert("sidebar".into(), ElementSetting::hidden());

        apply_layout(&mut invoice, Layout::BlackWhite, &ctx());

        assert!(!invoice.element_settings["logo"].visible);
        assert!(!invoice.element_settings["sidebar"].visible);
        assert_eq!(invoice.element_settings["header"].position.as_deref(), Some("top"));
    }

    #[test]
    fn items_policies() {
        let mut invoice = Invoice::new();
        invoice.items = vec![InvoiceItem::new("Mine", 2.0, 10.0)];

        apply_layout(&mut invoice, Layout::ThankYou, &ctx());
        assert_eq!(invoice.items[0].description, "Mine");

        apply_layout(&mut invoice, Layout::BusinessPro, &ctx());
        assert_eq!(invoice.items.len(), 2);
        assert_eq!(invoice.total, 10.0 * 120.0 + 15.0 * 150.0);

        invoice.items.clear();
        apply_template_id(&mut invoice, 7, &ctx());
        assert_eq!(invoice.items[0].description, "Your Product or Service");
        assert_eq!(invoice.total, 100.0);
    }

    #[test]
    fn item_edits_keep_amounts_current() {
        let mut invoice = Invoice::new();
        update_item(
            &mut invoice,
            0,
            ItemUpdate {
                description: Some("Design".into()),
                quantity: Some(5.0),
                rate: Some(120.0),
                ..ItemUpdate::default()
            },
        )
        .unwrap();
        add_item(&mut invoice, InvoiceItem::new("Review", 3.0, 100.0));

        assert_eq!(invoice.items[0].amount, 600.0);
        assert_eq!(invoice.total, 900.0);

        remove_item(&mut invoice, 0).unwrap();
        assert_eq!(invoice.total, 300.0);
        assert_eq!(remove_item(&mut invoice, 0), Err(EditError::LastItem));
        assert_eq!(
            update_item(&mut invoice, 4, ItemUpdate::default()),
            Err(EditError::ItemNotFound(4))
        );
    }

    #[test]
    fn fields_by_json_name() {
        let mut invoice = Invoice::new();
        set_field(&mut invoice, "propertyName", "Sunset Villa").unwrap();
        assert_eq!(invoice.property_name, "Sunset Villa");
        assert_eq!(
            set_field(&mut invoice, "total", "1"),
            Err(EditError::UnknownField("total".into()))
        );
    }

    #[test]
    fn empty_content_drops_override() {
        let mut invoice = Invoice::new();
        set_content(&mut invoice, "header-title", "BILL");
        assert_eq!(invoice.template_content["header-title"], "BILL");
        set_content(&mut invoice, "header-title", "");
        assert!(invoice.template_content.is_empty());
    }

    #[test]
    fn setting_update_merges_fields() {
        let mut invoice = Invoice::new();
        update_element_setting(
            &mut invoice,
            "logo",
            SettingUpdate {
                visible: Some(false),
                ..SettingUpdate::default()
            },
        );
        let logo = &invoice.element_settings["logo"];
        assert!(!logo.visible);
        assert_eq!(logo.size.as_deref(), Some("medium"));
    }

    #[test]
    fn applying_template_does_not_touch_stored_record() {
        let db = Database::open_in_memory().unwrap();
        let store = InvoiceStore::new(db.local());

        let mut source = Invoice::new();
        apply_layout(&mut source, Layout::Creative, &ctx());
        let original = store
            .save_custom_template(capture_template(&source, "Bold", "purple things"))
            .unwrap();

        let mut draft = Invoice::new();
        apply_custom_template(&mut draft, &original);
        assert_eq!(draft.custom_template_id.as_deref(), Some(original.id.as_str()));
        assert_eq!(draft.layout(), Layout::Creative);

        draft.template_content.insert("header-title".into(), "CHANGED".into());
        draft.custom_sections.clear();
        draft.header_color = "#000000".into();
        store
            .save_custom_template(capture_template(&draft, "Derived", ""))
            .unwrap();

        let reloaded = store.get_custom_template(&original.id).unwrap();
        assert_eq!(reloaded, original);
        assert_eq!(store.all_custom_templates().len(), 2);
    }

    #[test]
    fn legacy_template_round_trip_through_draft() {
        let mut invoice = Invoice::new();
        apply_layout(&mut invoice, Layout::Modern, &ctx());
        invoice.items = vec![InvoiceItem::new("Hosting", 2.0, 25.0)];
        let saved = to_saved_template(&invoice).unwrap();
        assert_eq!(saved.id, 2);
        assert_eq!(saved.name, "Custom Template 2");

        let mut other = Invoice::new();
        apply_saved_template(&mut other, &saved);
        assert_eq!(other.header_color, "#2196f3");
        assert_eq!(other.items[0].amount, 50.0);
        assert_eq!(other.total, 50.0);
        assert_eq!(other.custom_sections, invoice.custom_sections);
    }

    #[test]
    fn legacy_sections_get_defaults() {
        let mut table = CustomSection::default();
        table.kind = SectionKind::Table;
        let saved = SavedTemplate {
            id: 1,
            custom_sections: vec![table],
            ..SavedTemplate::default()
        };

        let mut invoice = Invoice::new();
        apply_saved_template(&mut invoice, &saved);

        let section = &invoice.custom_sections[0];
        assert!(section.id.starts_with("section-"));
        assert_eq!(section.title, "Custom Section");
        assert_eq!(section.color, "#f5f5f5");
        assert_eq!(section.columns.as_ref().unwrap(), &default_columns());
        // header color absent from the record, so the draft keeps its own
        assert_eq!(invoice.header_color, DEFAULT_HEADER_COLOR);
    }

    #[test]
    fn minimal_layout_has_no_legacy_slot() {
        let mut invoice = Invoice::new();
        apply_layout(&mut invoice, Layout::Minimal, &ctx());
        assert_eq!(to_saved_template(&invoice), Err(EditError::NotInGallery(Layout::Minimal)));
    }
}
