use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::database::{DatabaseError, Storage};
use crate::models::{
    CustomTemplate, Invoice, SavedTemplate, template_element_settings, DEFAULT_ACCENT_COLOR,
    DEFAULT_BACKGROUND_COLOR, DEFAULT_FONT_FAMILY, DEFAULT_HEADER_COLOR, DEFAULT_TEXT_COLOR,
};
use crate::utils;

pub const INVOICES_KEY: &str = "invoices";
pub const CUSTOM_TEMPLATES_KEY: &str = "customTemplates";
pub const SAVED_TEMPLATES_KEY: &str = "savedTemplates";
pub const VOICE_HELP_SHOWN_KEY: &str = "voiceHelpShown";
/// Session-area key mirroring the in-progress invoice
pub const CURRENT_INVOICE_KEY: &str = "currentInvoice";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    StorageError(#[from] DatabaseError),
    #[error("Failed to serialize '{key}': {source}")]
    SerializeError {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Read the JSON array stored under `key`.
///
/// Never fails: a missing key, an unreadable store or malformed JSON all
/// give an empty collection. The latter two are logged.
pub fn load_collection<T: DeserializeOwned>(storage: &impl Storage, key: &str) -> Vec<T> {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            log::warn!("Could not read '{}' from storage: {}", key, e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<T>>(&raw) {
        Ok(items) => items,
        Err(e) => {
            log::warn!("Discarding malformed '{}' collection: {}", key, e);
            Vec::new()
        }
    }
}

/// Serialize `items` and overwrite whatever is stored under `key`
pub fn save_collection<T: Serialize>(
    storage: &impl Storage,
    key: &str,
    items: &[T],
) -> Result<(), StoreError> {
    let json = serde_json::to_string(items).map_err(|source| StoreError::SerializeError {
        key: key.to_string(),
        source,
    })?;
    storage.set_item(key, &json)?;
    Ok(())
}

pub fn remove_key(storage: &impl Storage, key: &str) -> Result<(), StoreError> {
    storage.remove_item(key)?;
    Ok(())
}

/// Saved invoices and templates in one storage area.
///
/// Every read goes back to storage, and every write rewrites the whole
/// collection. Concurrent writers are not coordinated; the last one wins.
pub struct InvoiceStore<S: Storage> {
    storage: S,
}

impl<S: Storage> InvoiceStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    // Invoices

    pub fn all_invoices(&self) -> Vec<Invoice> {
        let mut invoices: Vec<Invoice> = load_collection(&self.storage, INVOICES_KEY);
        for invoice in &mut invoices {
            invoice.fill_defaults();
        }
        invoices
    }

    pub fn get_invoice(&self, id: &str) -> Option<Invoice> {
        self.all_invoices().into_iter().find(|inv| inv.id == id)
    }

    /// Insert or replace an invoice and return the stored record.
    ///
    /// Assigns an id to new invoices, recomputes item amounts and the total,
    /// and carries over typography from the referenced custom template when
    /// the invoice has none of its own.
    pub fn save_invoice(&self, mut invoice: Invoice) -> Result<Invoice, StoreError> {
        if invoice.id.is_empty() {
            invoice.id = utils::generate_invoice_id();
        }
        invoice.recompute_totals();

        if let Some(template_id) = invoice.custom_template_id.clone() {
            if let Some(template) = self.get_custom_template(&template_id) {
                if invoice.font_family.is_none() {
                    invoice.font_family = template.font_family;
                }
                if invoice.accent_color.is_none() {
                    invoice.accent_color = template.accent_color;
                }
            }
        }

        let mut invoices = self.all_invoices();
        match invoices.iter().position(|inv| inv.id == invoice.id) {
            Some(index) => invoices[index] = invoice.clone(),
            None => invoices.push(invoice.clone()),
        }
        save_collection(&self.storage, INVOICES_KEY, &invoices)?;
        log::info!("Saved invoice {} ({} stored)", invoice.id, invoices.len());

        Ok(invoice)
    }

    /// Remove an invoice by id. Returns whether anything was removed.
    pub fn delete_invoice(&self, id: &str) -> Result<bool, StoreError> {
        let mut invoices = self.all_invoices();
        let before = invoices.len();
        invoices.retain(|inv| inv.id != id);
        let removed = invoices.len() != before;
        save_collection(&self.storage, INVOICES_KEY, &invoices)?;
        Ok(removed)
    }

    // Custom templates

    pub fn all_custom_templates(&self) -> Vec<CustomTemplate> {
        load_collection(&self.storage, CUSTOM_TEMPLATES_KEY)
    }

    pub fn get_custom_template(&self, id: &str) -> Option<CustomTemplate> {
        let template = self.all_custom_templates().into_iter().find(|t| t.id == id);
        if template.is_none() {
            log::debug!("Custom template {} not found", id);
        }
        template
    }

    /// Insert or replace a custom template, filling every field a saved
    /// template must have
    pub fn save_custom_template(
        &self,
        mut template: CustomTemplate,
    ) -> Result<CustomTemplate, StoreError> {
        let now = Utc::now();
        if template.id.is_empty() {
            template.id = utils::generate_template_id();
        }
        if template.created_date.is_none() {
            template.created_date = Some(now);
        }
        template.last_modified = Some(now);
        template.is_custom = true;

        fill_if_empty(&mut template.header_color, DEFAULT_HEADER_COLOR);
        fill_if_empty(&mut template.background_color, DEFAULT_BACKGROUND_COLOR);
        fill_if_empty(&mut template.text_color, DEFAULT_TEXT_COLOR);
        if template.accent_color.as_deref().is_none_or(str::is_empty) {
            template.accent_color = Some(DEFAULT_ACCENT_COLOR.to_string());
        }
        if template.font_family.as_deref().is_none_or(str::is_empty) {
            template.font_family = Some(DEFAULT_FONT_FAMILY.to_string());
        }
        if template.element_settings.is_none() {
            template.element_settings = Some(template_element_settings());
        }

        let mut templates = self.all_custom_templates();
        match templates.iter().position(|t| t.id == template.id) {
            Some(index) => templates[index] = template.clone(),
            None => templates.push(template.clone()),
        }
        save_collection(&self.storage, CUSTOM_TEMPLATES_KEY, &templates)?;
        log::info!("Saved custom template '{}' ({} stored)", template.name, templates.len());

        Ok(template)
    }

    pub fn delete_custom_template(&self, id: &str) -> Result<bool, StoreError> {
        let mut templates = self.all_custom_templates();
        let before = templates.len();
        templates.retain(|t| t.id != id);
        let removed = templates.len() != before;
        save_collection(&self.storage, CUSTOM_TEMPLATES_KEY, &templates)?;
        Ok(removed)
    }

    // Legacy per-layout overrides, keyed by gallery id

    pub fn saved_templates(&self) -> Vec<SavedTemplate> {
        load_collection(&self.storage, SAVED_TEMPLATES_KEY)
    }

    pub fn saved_template(&self, id: u32) -> Option<SavedTemplate> {
        self.saved_templates().into_iter().find(|t| t.id == id)
    }

    pub fn save_saved_template(&self, template: SavedTemplate) -> Result<(), StoreError> {
        let mut templates = self.saved_templates();
        match templates.iter().position(|t| t.id == template.id) {
            Some(index) => templates[index] = template,
            None => templates.push(template),
        }
        save_collection(&self.storage, SAVED_TEMPLATES_KEY, &templates)
    }

    // One-time hint flag

    pub fn voice_help_shown(&self) -> bool {
        matches!(self.storage.get_item(VOICE_HELP_SHOWN_KEY), Ok(Some(ref v)) if v == "true")
    }

    pub fn set_voice_help_shown(&self) -> Result<(), StoreError> {
        self.storage.set_item(VOICE_HELP_SHOWN_KEY, "true")?;
        Ok(())
    }
}

fn fill_if_empty(field: &mut String, default: &str) {
    if field.trim().is_empty() {
        *field = default.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Layout;
    use crate::database::Database;
    use crate::models::{InvoiceItem, Position};

    fn invoice(name: &str, items: Vec<InvoiceItem>) -> Invoice {
        Invoice {
            name: name.to_string(),
            items,
            ..Invoice::default()
        }
    }

    #[test]
    fn missing_key_loads_empty() {
        let db = Database::open_in_memory().unwrap();
        let loaded: Vec<Invoice> = load_collection(&db.local(), INVOICES_KEY);
        assert!(loaded.is_empty());
    }

    #[test]
    fn malformed_json_loads_empty() {
        let db = Database::open_in_memory().unwrap();
        db.local().set_item(INVOICES_KEY, "{not json").unwrap();
        let store = InvoiceStore::new(db.local());
        assert!(store.all_invoices().is_empty());

        // the next save starts from the reset collection
        store.save_invoice(invoice("A", vec![InvoiceItem::new("x", 1.0, 1.0)])).unwrap();
        assert_eq!(store.all_invoices().len(), 1);
    }

    #[test]
    fn null_date_does_not_drop_the_collection() {
        let db = Database::open_in_memory().unwrap();
        db.local()
            .set_item(
                INVOICES_KEY,
                r#"[{"id":"keep","name":"Keep me","date":"2024-01-15T00:00:00Z"},
                    {"id":"nodate","name":"No date","date":null}]"#,
            )
            .unwrap();
        let store = InvoiceStore::new(db.local());

        let loaded = store.all_invoices();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].date.to_rfc3339(), "2024-01-15T00:00:00+00:00");

        store.save_invoice(invoice("New", vec![InvoiceItem::new("x", 1.0, 1.0)])).unwrap();
        let names: Vec<String> = store.all_invoices().into_iter().map(|inv| inv.name).collect();
        assert_eq!(names, vec!["Keep me", "No date", "New"]);
    }

    #[test]
    fn saved_template_with_bad_id_still_loads() {
        let db = Database::open_in_memory().unwrap();
        db.local()
            .set_item(SAVED_TEMPLATES_KEY, r#"[{"id":null,"name":"A"},{"id":"7","name":"B"}]"#)
            .unwrap();
        let store = InvoiceStore::new(db.local());

        let ids: Vec<u32> = store.saved_templates().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![0, 7]);
        assert_eq!(store.saved_template(7).unwrap().name, "B");
    }

    #[test]
    fn save_recomputes_amounts_and_total() {
        let db = Database::open_in_memory().unwrap();
        let store = InvoiceStore::new(db.local());

        let mut draft = invoice(
            "A",
            vec![InvoiceItem::new("x", 5.0, 120.0), InvoiceItem::new("y", 3.0, 100.0)],
        );
        draft.items[0].amount = 1.0; // stale
        draft.total = 0.0;

        let saved = store.save_invoice(draft).unwrap();
        assert!(saved.id.starts_with("invoice_"));
        assert_eq!(saved.items[0].amount, 600.0);
        assert_eq!(saved.total, 900.0);
        assert_eq!(store.get_invoice(&saved.id).unwrap().total, 900.0);
    }

    #[test]
    fn saved_invoice_round_trips() {
        let db = Database::open_in_memory().unwrap();
        let store = InvoiceStore::new(db.local());

        let mut draft = invoice("Round Trip", vec![InvoiceItem::new("Design", 2.0, 50.0)]);
        draft.set_layout(Layout::Creative);
        draft.template_content.insert("header-title".into(), "HELLO".into());
        draft.element_positions.insert("company-name".into(), Position::new(12.0, -4.5));
        draft.font_family = Some("Georgia, serif".into());

        let saved = store.save_invoice(draft).unwrap();
        let reloaded = store.get_invoice(&saved.id).unwrap();
        assert_eq!(reloaded, saved);
    }

    #[test]
    fn saving_existing_id_replaces_in_place() {
        let db = Database::open_in_memory().unwrap();
        let store = InvoiceStore::new(db.local());

        let a = store.save_invoice(invoice("A", vec![])).unwrap();
        let b = store.save_invoice(invoice("B", vec![])).unwrap();

        let mut edited = a.clone();
        edited.name = "A2".into();
        store.save_invoice(edited).unwrap();

        let names: Vec<String> = store.all_invoices().into_iter().map(|i| i.name).collect();
        assert_eq!(names, vec!["A2", "B"]);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn delete_keeps_others_in_order() {
        let db = Database::open_in_memory().unwrap();
        let store = InvoiceStore::new(db.local());

        let ids: Vec<String> = ["A", "B", "C", "D"]
            .iter()
            .map(|n| store.save_invoice(invoice(n, vec![])).unwrap().id)
            .collect();

        assert!(store.delete_invoice(&ids[1]).unwrap());
        assert!(!store.delete_invoice("invoice_missing").unwrap());

        let remaining: Vec<String> = store.all_invoices().into_iter().map(|i| i.id).collect();
        assert_eq!(remaining, vec![ids[0].clone(), ids[2].clone(), ids[3].clone()]);
    }

    #[test]
    fn invoice_inherits_template_typography() {
        let db = Database::open_in_memory().unwrap();
        let store = InvoiceStore::new(db.local());

        let template = store
            .save_custom_template(CustomTemplate {
                name: "Serif".into(),
                font_family: Some("Georgia, serif".into()),
                ..CustomTemplate::default()
            })
            .unwrap();

        let mut draft = invoice("A", vec![]);
        draft.custom_template_id = Some(template.id.clone());
        let saved = store.save_invoice(draft).unwrap();

        assert_eq!(saved.font_family.as_deref(), Some("Georgia, serif"));
        assert_eq!(saved.accent_color.as_deref(), Some(DEFAULT_ACCENT_COLOR));
    }

    #[test]
    fn custom_template_gets_defaults_and_stamps() {
        let db = Database::open_in_memory().unwrap();
        let store = InvoiceStore::new(db.local());

        let saved = store
            .save_custom_template(CustomTemplate {
                name: "Plain".into(),
                ..CustomTemplate::default()
            })
            .unwrap();

        assert!(saved.id.starts_with("template_"));
        assert!(saved.is_custom);
        assert!(saved.created_date.is_some());
        assert_eq!(saved.header_color, DEFAULT_HEADER_COLOR);
        assert_eq!(saved.font_family.as_deref(), Some(DEFAULT_FONT_FAMILY));
        assert_eq!(saved.element_settings.as_ref().unwrap().len(), 9);

        let created = saved.created_date;
        let resaved = store.save_custom_template(saved).unwrap();
        assert_eq!(resaved.created_date, created);
        assert_eq!(store.all_custom_templates().len(), 1);

        assert!(store.delete_custom_template(&resaved.id).unwrap());
        assert!(store.all_custom_templates().is_empty());
    }

    #[test]
    fn legacy_templates_upsert_by_numeric_id() {
        let db = Database::open_in_memory().unwrap();
        let store = InvoiceStore::new(db.local());

        store
            .save_saved_template(SavedTemplate {
                id: 3,
                name: "Custom Template 3".into(),
                ..SavedTemplate::default()
            })
            .unwrap();
        store
            .save_saved_template(SavedTemplate {
                id: 3,
                header_color: "#123456".into(),
                ..SavedTemplate::default()
            })
            .unwrap();

        assert_eq!(store.saved_templates().len(), 1);
        assert_eq!(store.saved_template(3).unwrap().header_color, "#123456");
        assert!(store.saved_template(1).is_none());
    }

    #[test]
    fn legacy_and_custom_templates_live_under_separate_keys() {
        let db = Database::open_in_memory().unwrap();
        let store = InvoiceStore::new(db.local());

        store.save_saved_template(SavedTemplate { id: 1, ..SavedTemplate::default() }).unwrap();
        store.save_custom_template(CustomTemplate::default()).unwrap();

        let keys = db.local().keys().unwrap();
        assert_eq!(keys, vec![CUSTOM_TEMPLATES_KEY.to_string(), SAVED_TEMPLATES_KEY.to_string()]);
    }

    #[test]
    fn voice_help_flag() {
        let db = Database::open_in_memory().unwrap();
        let store = InvoiceStore::new(db.local());
        assert!(!store.voice_help_shown());
        store.set_voice_help_shown().unwrap();
        assert!(store.voice_help_shown());
        assert_eq!(db.local().get_item(VOICE_HELP_SHOWN_KEY).unwrap().as_deref(), Some("true"));
    }
}
