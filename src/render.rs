//! Projection of an invoice into something displayable.
//!
//! `render` turns an `Invoice` into an `InvoiceView`: what is visible, with
//! which text, colors and offsets. The view is recomputed from the invoice
//! on demand and never written back. `preview` draws a view as plain text.

use std::collections::BTreeSet;

use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget};
use serde_json::Value;

use crate::catalog::{defaults_for, DefaultsContext, Layout};
use crate::color::{contrast_color, lighten, to_terminal_color};
use crate::models::{ElementSettings, Invoice, Region, SectionKind};
use crate::session::positions::transform_css;
use crate::utils::format_amount;

const HEADER_TINT_PERCENT: f64 = 80.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewColors {
    pub header: String,
    /// Readable text color on top of `header`
    pub header_text: String,
    /// Pale shade of `header` behind table headings
    pub header_tint: String,
    pub background: String,
    pub text: String,
    pub accent: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementView {
    pub id: String,
    pub text: String,
    pub transform: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ItemRow {
    pub description: String,
    pub detail: Option<String>,
    pub quantity: f64,
    pub rate: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub color: String,
    pub kind: SectionKind,
    pub columns: Vec<String>,
    /// Cells in column order; missing cells are empty
    pub rows: Vec<Vec<String>>,
    pub transform: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceView {
    pub layout: Layout,
    pub css_class: String,
    pub colors: ViewColors,
    pub font_family: Option<String>,
    pub visible_regions: Vec<Region>,
    pub elements: Vec<ElementView>,
    /// Bill-to lines taken from the invoice fields, empty ones left out
    pub client: Vec<String>,
    pub items: Vec<ItemRow>,
    pub total: f64,
    pub notes: Option<String>,
    pub sections: Vec<SectionView>,
}

impl InvoiceView {
    pub fn element(&self, id: &str) -> Option<&ElementView> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn is_visible(&self, region: Region) -> bool {
        self.visible_regions.contains(&region)
    }
}

/// Which region an element id belongs to, if any
pub fn region_for(element_id: &str) -> Option<Region> {
    let region = match element_id {
        "header-title" => Region::Header,
        "invoice-number" | "invoice-date" | "due-date" | "project-title" => Region::InvoiceDetails,
        "property-title" | "bill-to-title" | "client-title" => Region::ClientInfo,
        "notes" => Region::Notes,
        "footer-text" | "thanks-message" | "signature-title" => Region::Footer,
        id if id.starts_with("company-") => Region::CompanyInfo,
        id if id.starts_with("client-") => Region::ClientInfo,
        id if id.starts_with("col-") => Region::ItemsTable,
        id if id.starts_with("total-") || id.starts_with("subtotal-") || id.starts_with("tax-") => {
            Region::TotalSection
        }
        id if id.starts_with("terms-") || id.starts_with("payment-") => Region::Notes,
        id if id.starts_with("contact-") || id.starts_with("bank-") => Region::Footer,
        _ => return None,
    };
    Some(region)
}

fn region_visible(settings: &ElementSettings, region: Region) -> bool {
    settings.get(region.key()).is_none_or(|s| s.visible)
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Project `invoice` into a view
pub fn render(invoice: &Invoice) -> InvoiceView {
    let layout = invoice.layout();
    let ctx = DefaultsContext::new(invoice.date.date_naive(), digits(&invoice.invoice_number));
    let defaults = defaults_for(layout, &ctx);
    let settings = &invoice.element_settings;

    let visible_regions: Vec<Region> = Region::ALL
        .into_iter()
        .filter(|r| region_visible(settings, *r))
        .collect();

    let section_ids: BTreeSet<&str> =
        invoice.custom_sections.iter().map(|s| s.id.as_str()).collect();
    for key in invoice.template_content.keys() {
        if !defaults.content.contains_key(key) && !section_ids.contains(key.as_str()) {
            log::debug!("No element '{}' in layout {}, skipping its content", key, layout);
        }
    }

    let elements: Vec<ElementView> = defaults
        .content
        .iter()
        .filter(|(id, _)| region_for(id).is_none_or(|r| region_visible(settings, r)))
        .map(|(id, default_text)| ElementView {
            id: id.clone(),
            text: invoice
                .template_content
                .get(id)
                .cloned()
                .unwrap_or_else(|| default_text.clone()),
            transform: invoice.element_positions.get(id).map(transform_css),
        })
        .collect();

    let client: Vec<String> = if region_visible(settings, Region::ClientInfo) {
        [
            &invoice.name,
            &invoice.business,
            &invoice.property_name,
            &invoice.address,
            &invoice.email,
            &invoice.phone,
        ]
        .into_iter()
        .filter(|s| !s.trim().is_empty())
        .cloned()
        .collect()
    } else {
        Vec::new()
    };

    let items: Vec<ItemRow> = if region_visible(settings, Region::ItemsTable) {
        invoice
            .items
            .iter()
            .map(|item| ItemRow {
                description: item.description.clone(),
                detail: item.detailed_description.clone(),
                quantity: item.quantity,
                rate: item.rate,
                amount: item.quantity * item.rate,
            })
            .collect()
    } else {
        Vec::new()
    };

    let notes = (region_visible(settings, Region::Notes) && !invoice.notes.trim().is_empty())
        .then(|| invoice.notes.clone());

    let sections: Vec<SectionView> = invoice
        .custom_sections
        .iter()
        .map(|section| {
            let columns = section.columns.clone().unwrap_or_default();
            let rows = section
                .rows
                .iter()
                .flatten()
                .map(|row| {
                    columns
                        .iter()
                        .map(|c| row.get(c).map(cell_text).unwrap_or_default())
                        .collect::<Vec<String>>()
                })
                .collect();
            SectionView {
                id: section.id.clone(),
                title: section.title.clone(),
                content: invoice
                    .template_content
                    .get(&section.id)
                    .cloned()
                    .unwrap_or_else(|| section.content.clone()),
                color: section.color.clone(),
                kind: section.kind,
                columns,
                rows,
                transform: invoice.element_positions.get(&section.id).map(transform_css),
            }
        })
        .collect();

    InvoiceView {
        layout,
        css_class: layout.css_class(),
        colors: ViewColors {
            header: invoice.header_color.clone(),
            header_text: contrast_color(&invoice.header_color).to_string(),
            header_tint: lighten(&invoice.header_color, HEADER_TINT_PERCENT),
            background: invoice.background_color.clone(),
            text: invoice.text_color.clone(),
            accent: invoice.accent_color.clone(),
        },
        font_family: invoice.font_family.clone(),
        visible_regions,
        elements,
        client,
        items,
        total: invoice.computed_total(),
        notes,
        sections,
    }
}

fn digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn text_of<'a>(view: &'a InvoiceView, id: &str) -> Option<&'a str> {
    view.element(id).map(|e| e.text.as_str())
}

/// Draw `view` into a terminal buffer `width` columns wide and return it as
/// plain text, one line per buffer row with trailing spaces trimmed
pub fn preview(view: &InvoiceView, width: u16) -> String {
    let width = width.max(20);
    let header_style = Style::default()
        .fg(to_terminal_color(&view.colors.header_text))
        .bg(to_terminal_color(&view.colors.header))
        .add_modifier(Modifier::BOLD);
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let heading_style = bold
        .fg(to_terminal_color(contrast_color(&view.colors.header_tint)))
        .bg(to_terminal_color(&view.colors.header_tint));

    let mut lines: Vec<Line<'static>> = Vec::new();

    if view.is_visible(Region::Header) {
        let title = text_of(view, "header-title").unwrap_or("INVOICE");
        lines.push(
            Line::from(Span::styled(title.to_string(), header_style)).alignment(Alignment::Center),
        );
        lines.push(Line::default());
    }

    let company: Vec<&ElementView> = view
        .elements
        .iter()
        .filter(|e| region_for(&e.id) == Some(Region::CompanyInfo))
        .collect();
    for element in company {
        push_text(&mut lines, &element.text, Style::default());
    }

    for id in ["invoice-number", "invoice-date", "due-date"] {
        if let Some(text) = text_of(view, id) {
            lines.push(Line::from(text.to_string()).alignment(Alignment::Right));
        }
    }

    if !view.client.is_empty() {
        lines.push(Line::default());
        let label = ["property-title", "bill-to-title", "client-title"]
            .into_iter()
            .find_map(|id| text_of(view, id))
            .unwrap_or("Bill To");
        lines.push(Line::from(Span::styled(label.to_string(), bold)));
        for entry in &view.client {
            lines.push(Line::from(entry.clone()));
        }
    }

    if view.is_visible(Region::ItemsTable) {
        lines.push(Line::default());
        let heading = [
            text_of(view, "col-desc").unwrap_or("DESCRIPTION"),
            text_of(view, "col-qty").unwrap_or("QTY"),
            text_of(view, "col-rate").unwrap_or("RATE"),
            text_of(view, "col-amount").unwrap_or("AMOUNT"),
        ];
        lines.push(Line::from(Span::styled(table_row(&heading, width), heading_style)));
        for item in &view.items {
            let quantity = item.quantity.to_string();
            let rate = format_amount(item.rate);
            let amount = format_amount(item.amount);
            lines.push(Line::from(table_row(
                &[item.description.as_str(), quantity.as_str(), rate.as_str(), amount.as_str()],
                width,
            )));
            if let Some(detail) = &item.detail {
                lines.push(Line::from(format!("  {}", detail)));
            }
        }
    }

    if view.is_visible(Region::TotalSection) {
        let label = text_of(view, "total-label").unwrap_or("TOTAL");
        lines.push(Line::default());
        lines.push(
            Line::from(Span::styled(format!("{}: {}", label, format_amount(view.total)), bold))
                .alignment(Alignment::Right),
        );
    }

    for section in &view.sections {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(section.title.clone(), bold)));
        if section.kind == SectionKind::Table {
            let columns: Vec<&str> = section.columns.iter().map(String::as_str).collect();
            lines.push(Line::from(Span::styled(table_row(&columns, width), heading_style)));
            for row in &section.rows {
                let cells: Vec<&str> = row.iter().map(String::as_str).collect();
                lines.push(Line::from(table_row(&cells, width)));
            }
        } else {
            push_text(&mut lines, &section.content, Style::default());
        }
    }

    if let Some(notes) = &view.notes {
        lines.push(Line::default());
        push_text(&mut lines, notes, Style::default());
    }

    if view.is_visible(Region::Footer) {
        if let Some(footer) = text_of(view, "footer-text") {
            lines.push(Line::default());
            for line in footer.lines() {
                lines.push(Line::from(line.to_string()).alignment(Alignment::Center));
            }
        }
    }

    let height = u16::try_from(lines.len() + 2).unwrap_or(u16::MAX);
    let area = Rect::new(0, 0, width, height);
    let mut buffer = Buffer::empty(area);

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", view.layout.info().name))
        .title_alignment(Alignment::Center);
    Paragraph::new(lines).block(block).render(area, &mut buffer);

    buffer_to_string(&buffer)
}

fn push_text(lines: &mut Vec<Line<'static>>, text: &str, style: Style) {
    for line in text.lines() {
        lines.push(Line::from(Span::styled(line.to_string(), style)));
    }
}

/// Fixed-width columns: the first takes the slack, the rest are right-aligned
fn table_row(cells: &[&str], width: u16) -> String {
    if cells.is_empty() {
        return String::new();
    }
    let inner = width.saturating_sub(2) as usize;
    let rest = 12usize;
    let first = inner.saturating_sub(rest * (cells.len() - 1)).max(8);

    let mut out = fit(cells[0], first);
    out.push_str(&" ".repeat(first.saturating_sub(out.chars().count())));
    for cell in &cells[1..] {
        out.push_str(&format!("{:>width$}", fit(cell, rest - 1), width = rest));
    }
    out
}

fn fit(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    (area.top()..area.bottom())
        .map(|y| {
            let row: String = (area.left()..area.right())
                .filter_map(|x| buffer.cell((x, y)).map(|c| c.symbol()))
                .collect();
            row.trim_end().to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
