use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::catalog::{DefaultsContext, Layout};
use crate::config::Config;
use crate::database::{Database, DatabaseError, StorageArea};
use crate::models::{Invoice, InvoiceItem, Region, SectionKind, ValidationErrors};
use crate::render;
use crate::session::{edit, positions, sections, CurrentInvoice, EditError};
use crate::store::{InvoiceStore, StoreError};
use crate::utils::format_amount;

#[derive(Parser)]
#[command(name = "invoice-studio")]
#[command(about = "Draft invoices from layout templates and keep them in local storage")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a fresh draft, replacing the current one
    New {
        /// Layout key or gallery id (defaults to the configured layout)
        #[arg(long)]
        layout: Option<String>,
    },
    /// Show the current draft
    Show {
        /// Print the stored JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// List saved invoices
    List,
    /// Load a saved invoice as the current draft
    Open { id: String },
    /// Validate the current draft and save it
    Save,
    /// Delete a saved invoice
    Delete { id: String },
    /// Drop the current draft without saving
    Discard,
    /// Set an invoice field (name, email, address, phone, business,
    /// propertyName, invoiceNumber, notes)
    Set { field: String, value: String },
    /// Override the text of a layout element; an empty value restores the default
    Content { element: String, value: String },
    /// Change colors and typography
    Colors(ColorArgs),
    /// Switch the draft to a layout, by key or gallery id
    Layout { layout: String },
    /// List the available layouts
    Layouts,
    /// Edit line items
    #[command(subcommand)]
    Item(ItemCommand),
    /// Edit custom sections
    #[command(subcommand)]
    Section(SectionCommand),
    /// Record where an element was dragged, from its CSS transform
    Drag { element: String, transform: String },
    /// Change how a page region is shown
    Element(ElementArgs),
    /// Manage custom templates
    #[command(subcommand)]
    Template(TemplateCommand),
    /// Per-layout overrides kept under the older `savedTemplates` key
    #[command(subcommand)]
    Legacy(LegacyCommand),
    /// Draw the current draft in the terminal
    Preview {
        #[arg(long)]
        width: Option<u16>,
    },
    /// Session storage
    #[command(subcommand)]
    Session(SessionCommand),
}

#[derive(Args)]
pub struct ColorArgs {
    #[arg(long)]
    pub header: Option<String>,
    #[arg(long)]
    pub background: Option<String>,
    #[arg(long)]
    pub text: Option<String>,
    #[arg(long)]
    pub font: Option<String>,
    #[arg(long)]
    pub accent: Option<String>,
}

#[derive(Subcommand)]
pub enum ItemCommand {
    Add {
        description: String,
        #[arg(default_value_t = 1.0)]
        quantity: f64,
        #[arg(default_value_t = 0.0)]
        rate: f64,
        #[arg(long)]
        detail: Option<String>,
    },
    Remove { index: usize },
    Update {
        index: usize,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        quantity: Option<f64>,
        #[arg(long)]
        rate: Option<f64>,
        #[arg(long)]
        detail: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum SectionCommand {
    /// Append a section
    Add {
        /// Create a table section
        #[arg(long)]
        table: bool,
    },
    Remove { id: String },
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },
    /// Change a section's type (normal, table, text)
    Kind { id: String, kind: String },
    /// Move a section to another list position
    Move { from: usize, to: usize },
    #[command(subcommand)]
    Column(ColumnCommand),
    #[command(subcommand)]
    Row(RowCommand),
    /// Set a table cell
    Cell {
        id: String,
        row: usize,
        column: String,
        value: String,
    },
}

#[derive(Subcommand)]
pub enum ColumnCommand {
    Add { id: String },
    Rename { id: String, index: usize, name: String },
    Remove { id: String, index: usize },
}

#[derive(Subcommand)]
pub enum RowCommand {
    Add { id: String },
    Remove { id: String, index: usize },
}

#[derive(Args)]
pub struct ElementArgs {
    /// Region name (header, logo, companyInfo, clientInfo, ...)
    pub region: String,
    #[arg(long, conflicts_with = "hide")]
    pub show: bool,
    #[arg(long)]
    pub hide: bool,
    #[arg(long)]
    pub alignment: Option<String>,
    #[arg(long)]
    pub size: Option<String>,
    #[arg(long)]
    pub position: Option<String>,
    #[arg(long)]
    pub style: Option<String>,
    #[arg(long)]
    pub content: Option<String>,
}

#[derive(Subcommand)]
pub enum TemplateCommand {
    List,
    /// Save the draft's presentation as a custom template
    Save {
        name: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Apply a custom template to the draft
    Apply { id: String },
    Delete { id: String },
}

#[derive(Subcommand)]
pub enum LegacyCommand {
    /// Store the draft under its layout's gallery id
    Save,
    /// Load the overrides stored for a gallery id (defaults to the draft's layout)
    Apply { id: Option<u32> },
    List,
}

#[derive(Subcommand)]
pub enum SessionCommand {
    /// Start a new session, dropping the unsaved draft
    Reset,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("{0}")]
    StoreError(#[from] StoreError),
    #[error("{0}")]
    EditError(#[from] EditError),
    #[error("Invoice is not valid: {0}")]
    Validation(#[from] ValidationErrors),
    #[error("Failed to encode JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("No invoice in progress (run `invoice-studio new` or `open`)")]
    NoCurrentInvoice,
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),
    #[error("Custom template not found: {0}")]
    TemplateNotFound(String),
    #[error("No saved overrides for gallery id {0}")]
    LegacyTemplateNotFound(u32),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Storage views a command works against
struct Context<'a> {
    store: InvoiceStore<StorageArea<'a>>,
    current: CurrentInvoice<StorageArea<'a>>,
    config: &'a Config,
}

impl<'a> Context<'a> {
    fn open(db: &'a Database, config: &'a Config) -> Result<Self, CliError> {
        let mut current = CurrentInvoice::new(db.session());
        current.restore()?;
        Ok(Self {
            store: InvoiceStore::new(db.local()),
            current,
            config,
        })
    }

    /// A fresh draft in the configured default layout
    fn new_draft(&self, layout: Layout) -> Invoice {
        let mut draft = Invoice::new();
        let ctx = DefaultsContext::for_invoice_number(&draft.invoice_number);
        edit::apply_layout(&mut draft, layout, &ctx);
        draft
    }

    /// Copy of the current draft, or a new one when there is none
    fn draft(&self) -> Invoice {
        match self.current.get() {
            Some(invoice) => invoice.clone(),
            None => self.new_draft(self.config.default_layout()),
        }
    }

    fn existing_draft(&self) -> Result<Invoice, CliError> {
        self.current.get().cloned().ok_or(CliError::NoCurrentInvoice)
    }

    /// Apply a fallible edit to a copy of the draft and commit it
    fn edit<T, F>(&mut self, f: F) -> Result<T, CliError>
    where
        F: FnOnce(&mut Invoice) -> Result<T, CliError>,
    {
        let mut draft = self.draft();
        let result = f(&mut draft)?;
        self.current.set(draft)?;
        Ok(result)
    }
}

fn parse_layout_arg(value: &str) -> Layout {
    match value.trim().parse::<u32>() {
        Ok(id) => Layout::from_template_id(id),
        Err(_) => Layout::from_key(value),
    }
}

/// Run one command and return what should be printed
pub fn run(command: Commands, db: &Database, config: &Config) -> Result<String, CliError> {
    let mut ctx = Context::open(db, config)?;

    match command {
        Commands::New { layout } => handle_new(&mut ctx, layout),
        Commands::Show { json } => handle_show(&ctx, json),
        Commands::List => Ok(handle_list(&ctx)),
        Commands::Open { id } => handle_open(&mut ctx, &id),
        Commands::Save => handle_save(&mut ctx),
        Commands::Delete { id } => handle_delete(&ctx, &id),
        Commands::Discard => {
            ctx.current.clear()?;
            Ok("Draft discarded".to_string())
        }
        Commands::Set { field, value } => {
            ctx.edit(|draft| Ok(edit::set_field(draft, &field, &value)?))?;
            Ok(format!("{} updated", field))
        }
        Commands::Content { element, value } => {
            ctx.edit(|draft| {
                edit::set_content(draft, &element, &value);
                Ok(())
            })?;
            Ok(format!("Content of '{}' updated", element))
        }
        Commands::Colors(args) => handle_colors(&mut ctx, args),
        Commands::Layout { layout } => handle_layout(&mut ctx, &layout),
        Commands::Layouts => Ok(handle_layouts()),
        Commands::Item(cmd) => handle_item(&mut ctx, cmd),
        Commands::Section(cmd) => handle_section(&mut ctx, cmd),
        Commands::Drag { element, transform } => {
            let position = ctx.edit(|draft| {
                Ok(positions::record_drag_end(&mut draft.element_positions, &element, &transform))
            })?;
            Ok(format!("{} at {}", element, positions::transform_css(&position)))
        }
        Commands::Element(args) => handle_element(&mut ctx, args),
        Commands::Template(cmd) => handle_template(&mut ctx, cmd),
        Commands::Legacy(cmd) => handle_legacy(&mut ctx, cmd),
        Commands::Preview { width } => {
            let draft = ctx.existing_draft()?;
            let width = width.unwrap_or(config.preview_width);
            Ok(render::preview(&render::render(&draft), width))
        }
        Commands::Session(SessionCommand::Reset) => {
            db.start_new_session()?;
            Ok("Session reset, unsaved draft dropped".to_string())
        }
    }
}

fn handle_new(ctx: &mut Context<'_>, layout: Option<String>) -> Result<String, CliError> {
    let layout = match layout {
        Some(value) => parse_layout_arg(&value),
        None => ctx.config.default_layout(),
    };
    let draft = ctx.new_draft(layout);
    let number = draft.invoice_number.clone();
    ctx.current.set(draft)?;

    let mut out = format!("New draft {} using the {} layout", number, layout);
    if !ctx.store.voice_help_shown() {
        out.push_str(
            "\nTip: `invoice-studio preview` draws the draft, `invoice-studio save` stores it.",
        );
        ctx.store.set_voice_help_shown()?;
    }
    Ok(out)
}

fn handle_show(ctx: &Context<'_>, json: bool) -> Result<String, CliError> {
    let draft = ctx.existing_draft()?;
    if json {
        return Ok(serde_json::to_string_pretty(&draft)?);
    }

    let mut out = String::new();
    let id = if draft.id.is_empty() { "(unsaved)" } else { draft.id.as_str() };
    out.push_str(&format!("Invoice {} {}\n", draft.invoice_number, id));
    out.push_str(&format!("Layout: {}\n", draft.layout()));
    if !draft.name.is_empty() {
        out.push_str(&format!("Client: {}\n", draft.name));
    }
    out.push_str(&format!(
        "Colors: header {} / background {} / text {}\n",
        draft.header_color, draft.background_color, draft.text_color
    ));
    for (i, item) in draft.items.iter().enumerate() {
        out.push_str(&format!(
            "  [{}] {} {} x {} = {}\n",
            i,
            item.description,
            item.quantity,
            format_amount(item.rate),
            format_amount(item.quantity * item.rate)
        ));
    }
    out.push_str(&format!("Total: {}\n", format_amount(draft.computed_total())));
    for section in &draft.custom_sections {
        out.push_str(&format!("Section {} ({}): {}\n", section.id, section.kind, section.title));
    }
    Ok(out.trim_end().to_string())
}

fn handle_list(ctx: &Context<'_>) -> String {
    let invoices = ctx.store.all_invoices();
    if invoices.is_empty() {
        return "No saved invoices".to_string();
    }
    invoices
        .iter()
        .map(|inv| {
            format!(
                "{}  {}  {}  {}  {}",
                inv.id,
                inv.invoice_number,
                inv.date.format("%Y-%m-%d"),
                format_amount(inv.total),
                inv.name
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn handle_open(ctx: &mut Context<'_>, id: &str) -> Result<String, CliError> {
    let invoice = ctx
        .store
        .get_invoice(id)
        .ok_or_else(|| CliError::InvoiceNotFound(id.to_string()))?;
    let number = invoice.invoice_number.clone();
    ctx.current.set(invoice)?;
    Ok(format!("Opened invoice {}", number))
}

fn handle_save(ctx: &mut Context<'_>) -> Result<String, CliError> {
    let draft = ctx.existing_draft()?;
    draft.validate()?;

    let saved = ctx.store.save_invoice(draft)?;
    let message = format!(
        "Invoice saved (ID: {}, total {})",
        saved.id,
        format_amount(saved.total)
    );
    ctx.current.set(saved)?;
    Ok(message)
}

fn handle_delete(ctx: &Context<'_>, id: &str) -> Result<String, CliError> {
    if ctx.store.delete_invoice(id)? {
        Ok(format!("Invoice {} deleted", id))
    } else {
        Err(CliError::InvoiceNotFound(id.to_string()))
    }
}

fn handle_colors(ctx: &mut Context<'_>, args: ColorArgs) -> Result<String, CliError> {
    ctx.edit(|draft| {
        edit::set_colors(
            draft,
            args.header.as_deref(),
            args.background.as_deref(),
            args.text.as_deref(),
        );
        edit::set_typography(draft, args.font.as_deref(), args.accent.as_deref());
        Ok(())
    })?;
    Ok("Colors updated".to_string())
}

fn handle_layout(ctx: &mut Context<'_>, value: &str) -> Result<String, CliError> {
    let layout = parse_layout_arg(value);
    ctx.edit(|draft| {
        let defaults = DefaultsContext::for_invoice_number(&draft.invoice_number);
        edit::apply_layout(draft, layout, &defaults);
        Ok(())
    })?;
    Ok(format!("Switched to the {} layout", layout))
}

fn handle_layouts() -> String {
    Layout::ALL
        .iter()
        .map(|layout| {
            let info = layout.info();
            let id = layout
                .template_id()
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string());
            format!("{:>2}  {:<18} {} - {}", id, layout.key(), info.name, info.description)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn handle_item(ctx: &mut Context<'_>, cmd: ItemCommand) -> Result<String, CliError> {
    match cmd {
        ItemCommand::Add {
            description,
            quantity,
            rate,
            detail,
        } => {
            let mut item = InvoiceItem::new(description, quantity, rate);
            item.detailed_description = detail;
            let index = ctx.edit(|draft| Ok(edit::add_item(draft, item)))?;
            Ok(format!("Item {} added", index))
        }
        ItemCommand::Remove { index } => {
            ctx.edit(|draft| Ok(edit::remove_item(draft, index)?))?;
            Ok(format!("Item {} removed", index))
        }
        ItemCommand::Update {
            index,
            description,
            quantity,
            rate,
            detail,
        } => {
            let update = edit::ItemUpdate {
                description,
                detailed_description: detail,
                quantity,
                rate,
            };
            ctx.edit(|draft| Ok(edit::update_item(draft, index, update)?))?;
            Ok(format!("Item {} updated", index))
        }
    }
}

fn handle_section(ctx: &mut Context<'_>, cmd: SectionCommand) -> Result<String, CliError> {
    let spacing = ctx.config.section_spacing();
    match cmd {
        SectionCommand::Add { table } => {
            let id = ctx.edit(|draft| {
                Ok(if table {
                    sections::add_table_section(draft)
                } else {
                    sections::add_section(draft)
                })
            })?;
            Ok(format!("Section {} added", id))
        }
        SectionCommand::Remove { id } => {
            ctx.edit(|draft| Ok(sections::remove_section(draft, &id)?))?;
            Ok(format!("Section {} removed", id))
        }
        SectionCommand::Edit {
            id,
            title,
            content,
            color,
        } => {
            ctx.edit(|draft| {
                Ok(sections::update_section(
                    draft,
                    &id,
                    title.as_deref(),
                    content.as_deref(),
                    color.as_deref(),
                )?)
            })?;
            Ok(format!("Section {} updated", id))
        }
        SectionCommand::Kind { id, kind } => {
            let kind = SectionKind::parse(&kind)
                .ok_or_else(|| {
                    CliError::InvalidArgument(format!("unknown section type '{}'", kind))
                })?;
            ctx.edit(|draft| Ok(sections::set_section_kind(draft, &id, kind)?))?;
            Ok(format!("Section {} is now {}", id, kind))
        }
        SectionCommand::Move { from, to } => {
            ctx.edit(|draft| Ok(sections::move_section(draft, from, to, spacing)?))?;
            Ok(format!("Section moved from {} to {}", from, to))
        }
        SectionCommand::Column(ColumnCommand::Add { id }) => {
            let name = ctx.edit(|draft| Ok(sections::add_column(draft, &id)?))?;
            Ok(format!("Column '{}' added", name))
        }
        SectionCommand::Column(ColumnCommand::Rename { id, index, name }) => {
            ctx.edit(|draft| Ok(sections::rename_column(draft, &id, index, &name)?))?;
            Ok(format!("Column {} renamed to '{}'", index, name))
        }
        SectionCommand::Column(ColumnCommand::Remove { id, index }) => {
            let name = ctx.edit(|draft| Ok(sections::remove_column(draft, &id, index)?))?;
            Ok(format!("Column '{}' removed", name))
        }
        SectionCommand::Row(RowCommand::Add { id }) => {
            let index = ctx.edit(|draft| Ok(sections::add_row(draft, &id)?))?;
            Ok(format!("Row {} added", index))
        }
        SectionCommand::Row(RowCommand::Remove { id, index }) => {
            ctx.edit(|draft| Ok(sections::remove_row(draft, &id, index)?))?;
            Ok(format!("Row {} removed", index))
        }
        SectionCommand::Cell { id, row, column, value } => {
            ctx.edit(|draft| Ok(sections::set_cell(draft, &id, row, &column, &value)?))?;
            Ok(format!("Cell {}/{} updated", row, column))
        }
    }
}

fn handle_element(ctx: &mut Context<'_>, args: ElementArgs) -> Result<String, CliError> {
    if Region::parse(&args.region).is_none() {
        log::warn!("'{}' is not a known region, storing the setting anyway", args.region);
    }
    let visible = match (args.show, args.hide) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let update = edit::SettingUpdate {
        visible,
        alignment: args.alignment,
        size: args.size,
        position: args.position,
        style: args.style,
        content: args.content,
    };
    let region = args.region;
    ctx.edit(|draft| {
        edit::update_element_setting(draft, &region, update);
        Ok(())
    })?;
    Ok(format!("Region {} updated", region))
}

fn handle_template(ctx: &mut Context<'_>, cmd: TemplateCommand) -> Result<String, CliError> {
    match cmd {
        TemplateCommand::List => {
            let templates = ctx.store.all_custom_templates();
            if templates.is_empty() {
                return Ok("No custom templates".to_string());
            }
            Ok(templates
                .iter()
                .map(|t| format!("{}  {:<18} {}", t.id, t.layout.key(), t.name))
                .collect::<Vec<_>>()
                .join("\n"))
        }
        TemplateCommand::Save { name, description } => {
            let draft = ctx.existing_draft()?;
            let template = edit::capture_template(&draft, &name, &description);
            let saved = ctx.store.save_custom_template(template)?;
            Ok(format!("Template '{}' saved (ID: {})", saved.name, saved.id))
        }
        TemplateCommand::Apply { id } => {
            let template = ctx
                .store
                .get_custom_template(&id)
                .ok_or_else(|| CliError::TemplateNotFound(id.clone()))?;
            ctx.edit(|draft| {
                edit::apply_custom_template(draft, &template);
                Ok(())
            })?;
            Ok(format!("Template '{}' applied", template.name))
        }
        TemplateCommand::Delete { id } => {
            if ctx.store.delete_custom_template(&id)? {
                Ok(format!("Template {} deleted", id))
            } else {
                Err(CliError::TemplateNotFound(id))
            }
        }
    }
}

fn handle_legacy(ctx: &mut Context<'_>, cmd: LegacyCommand) -> Result<String, CliError> {
    match cmd {
        LegacyCommand::Save => {
            let draft = ctx.existing_draft()?;
            let saved = edit::to_saved_template(&draft)?;
            let message = format!("Saved '{}'", saved.name);
            ctx.store.save_saved_template(saved)?;
            Ok(message)
        }
        LegacyCommand::Apply { id } => {
            let draft = ctx.existing_draft()?;
            let id = match id {
                Some(id) => id,
                None => {
                    let layout = draft.layout();
                    layout.template_id().ok_or(EditError::NotInGallery(layout))?
                }
            };
            let saved = ctx
                .store
                .saved_template(id)
                .ok_or(CliError::LegacyTemplateNotFound(id))?;
            ctx.edit(|draft| {
                edit::apply_saved_template(draft, &saved);
                Ok(())
            })?;
            Ok(format!("Applied '{}'", saved.name))
        }
        LegacyCommand::List => {
            let templates = ctx.store.saved_templates();
            if templates.is_empty() {
                return Ok("No saved layout overrides".to_string());
            }
            Ok(templates
                .iter()
                .map(|t| format!("{:>2}  {}", t.id, t.name))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    }
}
