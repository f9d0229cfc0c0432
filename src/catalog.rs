use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::models::{
    CustomSection, ElementSetting, ElementSettings, InvoiceItem, Region, TemplateContent,
    default_element_settings, element_settings, DEFAULT_BACKGROUND_COLOR, DEFAULT_HEADER_COLOR,
    DEFAULT_TEXT_COLOR,
};

/// Built-in visual layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Layout {
    #[default]
    Classic,
    Modern,
    Creative,
    Minimal,
    RealEstate,
    BusinessPro,
    BlueProfessional,
    ThankYou,
    BlackWhite,
}

/// Gallery metadata shown when picking a layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub color: &'static str,
    pub features: &'static [&'static str],
}

impl Layout {
    pub const ALL: [Layout; 9] = [
        Layout::Classic,
        Layout::Modern,
        Layout::Creative,
        Layout::Minimal,
        Layout::RealEstate,
        Layout::BusinessPro,
        Layout::BlueProfessional,
        Layout::ThankYou,
        Layout::BlackWhite,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Layout::Classic => "classic",
            Layout::Modern => "modern",
            Layout::Creative => "creative",
            Layout::Minimal => "minimal",
            Layout::RealEstate => "real-estate",
            Layout::BusinessPro => "business-pro",
            Layout::BlueProfessional => "blue-professional",
            Layout::ThankYou => "thank-you",
            Layout::BlackWhite => "black-white",
        }
    }

    /// Exact key lookup
    pub fn parse(key: &str) -> Option<Layout> {
        let key = key.trim();
        Layout::ALL.iter().copied().find(|l| l.key() == key)
    }

    /// Key lookup that falls back to `Classic` for anything unrecognized
    pub fn from_key(key: &str) -> Layout {
        Layout::parse(key).unwrap_or_else(|| {
            log::warn!("Unknown layout '{}', falling back to classic", key);
            Layout::Classic
        })
    }

    /// Numeric gallery id. `Minimal` is not in the gallery and has none.
    pub fn template_id(&self) -> Option<u32> {
        match self {
            Layout::Classic => Some(1),
            Layout::Modern => Some(2),
            Layout::Creative => Some(3),
            Layout::RealEstate => Some(4),
            Layout::BusinessPro => Some(5),
            Layout::BlueProfessional => Some(6),
            Layout::ThankYou => Some(7),
            Layout::BlackWhite => Some(8),
            Layout::Minimal => None,
        }
    }

    pub fn from_template_id(id: u32) -> Layout {
        Layout::ALL
            .iter()
            .copied()
            .find(|l| l.template_id() == Some(id))
            .unwrap_or_else(|| {
                log::warn!("Unknown template id {}, falling back to classic", id);
                Layout::Classic
            })
    }

    pub fn css_class(&self) -> String {
        format!("{}-template", self.key())
    }

    pub fn info(&self) -> LayoutInfo {
        match self {
            Layout::Classic => LayoutInfo {
                name: "Classic Invoice",
                description: "Traditional invoice layout with formal design",
                color: "#3f51b5",
                features: &[
                    "Professional formatting",
                    "Clear sections",
                    "Traditional invoice layout",
                ],
            },
            Layout::Modern => LayoutInfo {
                name: "Modern Invoice",
                description: "Contemporary design with clean layout",
                color: "#2196f3",
                features: &["Clean lines", "Minimalist design", "Modern typography"],
            },
            Layout::Creative => LayoutInfo {
                name: "Creative Invoice",
                description: "Artistic layout with unique sections and drag-drop functionality",
                color: "#8e44ad",
                features: &["Colorful design", "Drag & drop sections", "Creative layout"],
            },
            Layout::Minimal => LayoutInfo {
                name: "Minimal Invoice",
                description: "Clean, simplified layout with only the essentials",
                color: "#3f51b5",
                features: &["Essential fields only", "No extra sections"],
            },
            Layout::RealEstate => LayoutInfo {
                name: "Real Estate Invoice",
                description: "Specialized template for real estate transactions with property details and summary tables",
                color: "#34495e",
                features: &[
                    "Property details section",
                    "Agreement summaries",
                    "Payment breakdown",
                    "Professional real estate format",
                ],
            },
            Layout::BusinessPro => LayoutInfo {
                name: "Business Pro",
                description: "Professional business invoice with tax/GST support for consulting and services",
                color: "#673ab7",
                features: &[
                    "GST/HSN support",
                    "Digital signature",
                    "Terms & conditions",
                    "Multi-currency format",
                ],
            },
            Layout::BlueProfessional => LayoutInfo {
                name: "Blue White Modern Professional",
                description: "Professional template with navy blue header, orange accents, and structured layout",
                color: "#1a237e",
                features: &[
                    "Diagonal design elements",
                    "Payment details section",
                    "Clean tabular format",
                    "Contact information footer",
                ],
            },
            Layout::ThankYou => LayoutInfo {
                name: "Thank You Invoice",
                description: "Elegant minimalist invoice with a personal touch and \"Thank You\" header",
                color: "#424242",
                features: &[
                    "Clean minimalist design",
                    "Elegant typography",
                    "Simple item layout",
                    "Professional summary section",
                ],
            },
            Layout::BlackWhite => LayoutInfo {
                name: "Black and White Modern Professional",
                description: "Clean monochromatic design with bold black header and structured layout",
                color: "#000000",
                features: &[
                    "Bold black header",
                    "Minimalist design",
                    "Clean tabular format",
                    "Professional business style",
                ],
            },
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for Layout {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Layout {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        Ok(Layout::from_key(&key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Colors {
    pub header: String,
    pub background: String,
    pub text: String,
}

impl Colors {
    fn new(header: &str, background: &str, text: &str) -> Self {
        Self {
            header: header.to_string(),
            background: background.to_string(),
            text: text.to_string(),
        }
    }
}

impl Default for Colors {
    fn default() -> Self {
        Colors::new(DEFAULT_HEADER_COLOR, DEFAULT_BACKGROUND_COLOR, DEFAULT_TEXT_COLOR)
    }
}

/// What applying a layout does to the item list
#[derive(Debug, Clone, PartialEq)]
pub enum ItemsPolicy {
    Keep,
    Replace(Vec<InvoiceItem>),
    FillIfEmpty(Vec<InvoiceItem>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutDefaults {
    pub content: TemplateContent,
    pub colors: Colors,
    pub element_settings: ElementSettings,
    pub sections: Vec<CustomSection>,
    pub items: ItemsPolicy,
}

/// Inputs for the generated strings (dates, invoice numbers) in layout content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultsContext {
    pub today: NaiveDate,
    /// Digits used where a layout shows a generated invoice number
    pub number: String,
}

impl DefaultsContext {
    pub fn new(today: NaiveDate, number: impl Into<String>) -> Self {
        Self {
            today,
            number: number.into(),
        }
    }

    /// Context for the current date, reusing the digits of `invoice_number`
    /// when it has any
    pub fn for_invoice_number(invoice_number: &str) -> Self {
        let digits: String = invoice_number.chars().filter(|c| c.is_ascii_digit()).collect();
        let number = if digits.is_empty() {
            crate::utils::random_digits(4)
        } else {
            digits
        };
        Self::new(chrono::Local::now().date_naive(), number)
    }

    fn date(&self) -> String {
        self.today.format("%-m/%-d/%Y").to_string()
    }

    fn due_date(&self) -> String {
        (self.today + Duration::days(30)).format("%-m/%-d/%Y").to_string()
    }
}

fn content(entries: &[(&str, String)]) -> TemplateContent {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn s(value: &str) -> String {
    value.to_string()
}

/// Default content, colors, element settings, sections and items of a layout.
///
/// Pure: the same layout and context always produce the same defaults,
/// except for the ids of the generated sections.
pub fn defaults_for(layout: Layout, ctx: &DefaultsContext) -> LayoutDefaults {
    match layout {
        Layout::Classic => LayoutDefaults {
            content: content(&[
                ("header-title", s("INVOICE")),
                ("company-name", s("Your Company Name")),
                ("company-person", s("Your Name")),
                ("company-email", s("your.email@example.com")),
                ("company-phone", s("(123) 456-7890")),
                ("company-address", s("123 Street Address, City, State ZIP")),
                ("property-title", s("Bill To")),
                ("invoice-number", format!("Invoice #: INV-{}", ctx.number)),
                ("invoice-date", format!("Date: {}", ctx.date())),
                ("due-date", format!("Due Date: {}", ctx.due_date())),
                ("col-desc", s("ITEM DESCRIPTION")),
                ("col-qty", s("QUANTITY")),
                ("col-rate", s("UNIT PRICE")),
                ("col-amount", s("AMOUNT")),
                ("total-label", s("TOTAL")),
                ("payment-terms", s("Payment Terms: Net 30")),
                ("payment-methods", s("Payment Methods: Check, Credit Card, Bank Transfer")),
                ("footer-text", s("Thank you for your business!")),
                ("notes", s("Notes: Any additional information, terms, or conditions.")),
            ]),
            colors: Colors::default(),
            element_settings: default_element_settings(),
            sections: Vec::new(),
            items: ItemsPolicy::Keep,
        },
        Layout::Modern => LayoutDefaults {
            content: content(&[
                ("header-title", s("INVOICE")),
                ("company-name", s("Your Company Name")),
                ("company-person", s("FROM")),
                ("company-email", s("your.email@example.com")),
                ("company-phone", s("(123) 456-7890")),
                ("company-address", s("123 Street Address, City, State ZIP")),
                ("property-title", s("TO")),
                ("invoice-number", format!("#INV-{}", ctx.number)),
                ("invoice-date", format!("Issued: {}", ctx.date())),
                ("due-date", format!("Due: {}", ctx.due_date())),
                ("project-title", s("PROJECT: Client Project")),
                ("col-desc", s("SERVICE")),
                ("col-qty", s("HOURS/QTY")),
                ("col-rate", s("RATE")),
                ("col-amount", s("AMOUNT")),
                ("total-label", s("TOTAL DUE")),
                (
                    "footer-text",
                    s("Terms: Payment due within 30 days of receipt\nThank you for your business!"),
                ),
            ]),
            colors: Colors::new("#2196f3", DEFAULT_BACKGROUND_COLOR, DEFAULT_TEXT_COLOR),
            element_settings: default_element_settings(),
            sections: vec![CustomSection::new(
                "PAYMENT DETAILS",
                "Bank Name: [Bank Name]\nAccount Name: [Account Name]\nAccount Number: [Account Number]\nRouting Number: [Routing Number]\n\nOr pay online: [Payment Link]",
                "#f8f9fa",
            )],
            items: ItemsPolicy::Keep,
        },
        Layout::Creative => LayoutDefaults {
            content: content(&[
                ("header-title", s("⚡ CREATIVE INVOICE ⚡")),
                ("company-name", s("Your Awesome Creative Business")),
                ("company-person", s("HELLO,")),
                ("company-email", s("creative@example.com")),
                ("company-phone", s("(123) 456-7890")),
                ("company-address", s("123 Imagination Lane, Creativity City")),
                ("property-title", s("PROJECT FOR")),
                ("invoice-number", format!("INVOICE #: {}", ctx.number)),
                ("invoice-date", format!("DATE: {}", ctx.date())),
                ("section-title", s("THE AWESOME WORK WE DID FOR YOU")),
                ("col-desc", s("CREATIVE SERVICE")),
                ("col-qty", s("MAGIC DELIVERED")),
                ("col-rate", s("VALUE PER UNIT")),
                ("col-amount", s("TOTAL MAGIC")),
                ("total-label", s("THE GRAND TOTAL")),
                (
                    "footer-text",
                    s("THANK YOU FOR CHOOSING OUR CREATIVE SERVICES!\nPayment due within 14 days • Questions? creative@example.com"),
                ),
            ]),
            colors: Colors::new("#8e44ad", "#f9f9ff", "#333333"),
            element_settings: default_element_settings(),
            sections: vec![CustomSection::new(
                "SEND YOUR MAGIC PAYMENT TO",
                "✧ Digital Payment: [Payment Link/QR Code]\n✧ By Carrier Pigeon: [Your Address]\n✧ Telepathically: Just kidding! But we accept credit cards, PayPal, and bank transfers.",
                "#e8e4f3",
            )],
            items: ItemsPolicy::Keep,
        },
        Layout::Minimal => LayoutDefaults {
            content: content(&[
                ("header-title", s("INVOICE")),
                ("footer-text", s("Thank you")),
            ]),
            colors: Colors::default(),
            element_settings: default_element_settings(),
            sections: Vec::new(),
            items: ItemsPolicy::Keep,
        },
        Layout::RealEstate => LayoutDefaults {
            content: content(&[
                ("header-title", s("INVOICE")),
                ("company-name", s("Prime Estate")),
                ("company-person", s("Your Name")),
                ("company-email", s("info@primeestate.com")),
                ("company-phone", s("(123) 456-7890")),
                ("company-address", s("123 Real Estate Blvd, City, State ZIP")),
                ("property-title", s("Bill to:")),
                ("invoice-number", s("Invoice Number: 846")),
                ("invoice-date", s("Date: 02/02/2022")),
                ("summary-title", s("Invoice Summary")),
                ("agreement-value-label", s("Agreement Value")),
                ("agreement-value-amount", s("₹ 1,111,000")),
                ("parking-charges-label", s("Car Parking Charges")),
                ("parking-charges-amount", s("₹ 50,000")),
                ("addon-charges-label", s("Add-on Charges")),
                ("addon-charges-amount", s("₹ 20,000")),
                ("subtotal-label", s("Subtotal")),
                ("subtotal-amount", s("₹ 1,181,000")),
                ("discount-label", s("Discount (Cashback)")),
                ("discount-amount", s("-₹ 11,000")),
                ("net-payable-label", s("Net Payable")),
                ("net-payable-amount", s("₹ 1,170,000")),
                ("token-paid-label", s("Token Amount Paid")),
                ("token-paid-amount", s("₹ 200,000")),
                ("balance-amount-label", s("Balance Amount")),
                ("balance-amount-amount", s("₹ 970,000")),
                ("col-desc", s("Item")),
                ("col-qty", s("Quantity")),
                ("col-rate", s("Rate")),
                ("col-tax", s("Tax")),
                ("col-amount", s("Amount")),
                ("terms-title", s("Terms & Conditions:")),
                ("footer-text", s("Thank you for your business!")),
            ]),
            colors: Colors::new("#34495e", "#ffffff", "#333333"),
            element_settings: element_settings([
                (Region::Header, ElementSetting::shown().position("top")),
                (Region::Logo, ElementSetting::shown().position("left")),
                (Region::CompanyInfo, ElementSetting::shown().position("left")),
                (Region::ClientInfo, ElementSetting::shown().position("right")),
                (Region::InvoiceDetails, ElementSetting::shown().position("left")),
                (Region::PropertyInfo, ElementSetting::shown().position("right")),
                (Region::ItemsTable, ElementSetting::shown().position("full-width")),
                (Region::TotalSection, ElementSetting::shown().position("right")),
                (Region::Notes, ElementSetting::shown().position("left")),
                (Region::Footer, ElementSetting::shown().position("full-width")),
            ]),
            sections: Vec::new(),
            items: ItemsPolicy::Replace(vec![
                InvoiceItem::new("Vacation Homes", 1.0, 137.0),
                InvoiceItem::new("Home Staging", 1.0, 752.0),
                InvoiceItem::new("Real Estate Photography", 1.0, 110.0),
            ]),
        },
        Layout::BusinessPro => LayoutDefaults {
            content: content(&[
                ("header-title", s("INVOICE")),
                ("company-name", s("Business Pro Services")),
                ("company-email", s("accounts@businesspro.com")),
                ("company-phone", s("+123-456-7890")),
                ("company-address", s("123 Business St, Corporate City, ST 12345")),
                ("company-gstin", s("GSTIN: 29ABCDE1234F1Z5")),
                ("invoice-number", format!("Invoice #: INV-{}", ctx.number)),
                ("invoice-date", format!("Date: {}", ctx.date())),
                ("due-date", format!("Due Date: {}", ctx.due_date())),
                ("bill-to-title", s("Bill To:")),
                ("client-name", s("Client Name")),
                ("client-email", s("client@example.com")),
                ("client-address", s("Client Address, City, State")),
                ("col-desc", s("Item/Service")),
                ("col-hsn", s("HSN/SAC")),
                ("col-qty", s("Quantity")),
                ("col-rate", s("Rate")),
                ("col-tax", s("GST %")),
                ("col-amount", s("Amount")),
                ("col-total", s("Total")),
                ("subtotal-label", s("Subtotal")),
                ("tax-label", s("GST (18%)")),
                ("total-label", s("TOTAL")),
                ("terms-title", s("Terms & Conditions")),
                (
                    "terms-content",
                    s("1. Payment due within 30 days\n2. Please include invoice number with payment\n3. Late payment subject to 2% interest per month"),
                ),
            ]),
            colors: Colors::new("#673ab7", "#ffffff", "#000000"),
            element_settings: element_settings([
                (Region::Header, ElementSetting::shown().alignment("center")),
                (Region::Logo, ElementSetting::shown().size("medium").alignment("left")),
                (Region::CompanyInfo, ElementSetting::shown().alignment("left")),
                (Region::ClientInfo, ElementSetting::shown().alignment("right")),
                (Region::InvoiceDetails, ElementSetting::shown().alignment("right")),
                (Region::ItemsTable, ElementSetting::shown()),
                (Region::TotalSection, ElementSetting::shown().alignment("right")),
                (Region::Notes, ElementSetting::shown().alignment("left")),
                (
                    Region::Footer,
                    ElementSetting::shown()
                        .alignment("center")
                        .content("Thank you for your business!"),
                ),
            ]),
            sections: Vec::new(),
            items: ItemsPolicy::Replace(vec![
                InvoiceItem::new("Consulting Services", 10.0, 120.0),
                InvoiceItem::new("Software Development", 15.0, 150.0),
            ]),
        },
        Layout::BlueProfessional => LayoutDefaults {
            content: content(&[
                ("header-title", s("INVOICE")),
                ("company-name", s("Aldenaire & Partners")),
                ("company-email", s("hello@yourcompany.com")),
                ("company-phone", s("+123-456-7890")),
                ("company-address", s("123 Anywhere St, Any City, ST 12345")),
                ("invoice-number", format!("INVOICE NO: {}", ctx.number)),
                ("invoice-date", s("17th May, 2022")),
                ("bill-to-title", s("Invoice to:")),
                ("client-name", s("Yael Amari")),
                ("client-email", s("hello@reallygreatsite.com")),
                ("client-address", s("123 Anywhere St, Any City, ST 12345")),
                ("col-desc", s("Description")),
                ("col-qty", s("Qty")),
                ("col-rate", s("Cost")),
                ("col-amount", s("Subtotal")),
                ("payment-title", s("PAYMENT DETAILS:")),
                ("bank-code", s("Bank Code:")),
                ("bank-code-value", s("123-456-7890")),
                ("bank-name", s("Bank Name:")),
                ("bank-name-value", s("Fauget Bank")),
                ("contact-title", s("CONTACT US")),
                ("contact-phone", s("+123-456-7890")),
                ("contact-website", s("www.reallygreatsite.com")),
                ("contact-address", s("123 Anywhere St, Any City, ST 12345")),
                ("subtotal-label", s("Subtotal")),
                ("tax-label", s("Tax")),
                ("total-label", s("TOTAL")),
                ("thanks-message", s("Thank You!")),
                ("signature-title", s("Administrator")),
            ]),
            colors: Colors::new("#1a237e", "#ffffff", "#000000"),
            element_settings: element_settings([
                (Region::Header, ElementSetting::shown().alignment("left")),
                (Region::Logo, ElementSetting::shown().size("medium").alignment("left")),
                (Region::CompanyInfo, ElementSetting::shown().alignment("left")),
                (Region::ClientInfo, ElementSetting::shown().alignment("right")),
                (Region::InvoiceDetails, ElementSetting::shown().alignment("left")),
                (Region::ItemsTable, ElementSetting::shown()),
                (Region::TotalSection, ElementSetting::shown().alignment("right")),
                (Region::Notes, ElementSetting::hidden()),
                (
                    Region::Footer,
                    ElementSetting::shown()
                        .alignment("center")
                        .content("Thank you for your business!"),
                ),
            ]),
            sections: Vec::new(),
            items: ItemsPolicy::Replace(vec![
                InvoiceItem::new("Initial Consultation", 5.0, 300.0),
                InvoiceItem::new("Project Draft", 2.0, 500.0),
                InvoiceItem::new("Implementation", 1.0, 12000.0),
                InvoiceItem::new("Foundation Labor", 30.0, 60.0),
            ]),
        },
        Layout::ThankYou => LayoutDefaults {
            content: content(&[
                ("header-title", s("THANK YOU")),
                ("footer-text", s("We appreciate your business!")),
                ("col-desc", s("ITEM DESCRIPTION")),
                ("col-qty", s("QTY")),
                ("col-rate", s("RATE")),
                ("col-amount", s("AMOUNT")),
                ("total-label", s("TOTAL")),
            ]),
            colors: Colors::new("#424242", DEFAULT_BACKGROUND_COLOR, DEFAULT_TEXT_COLOR),
            element_settings: element_settings([
                (Region::Header, ElementSetting::shown().position("top")),
                (Region::Logo, ElementSetting::shown().size("medium").alignment("left")),
                (Region::CompanyInfo, ElementSetting::shown().alignment("right")),
                (Region::ClientInfo, ElementSetting::shown().alignment("left")),
                (
                    Region::InvoiceDetails,
                    ElementSetting::shown().style("standard").position("right"),
                ),
                (Region::ItemsTable, ElementSetting::shown().style("clean")),
                (Region::TotalSection, ElementSetting::shown().alignment("right")),
                (Region::Notes, ElementSetting::shown().position("bottom")),
                (Region::Footer, ElementSetting::shown().content("We appreciate your business!")),
            ]),
            sections: Vec::new(),
            items: ItemsPolicy::FillIfEmpty(vec![InvoiceItem::new(
                "Your Product or Service",
                1.0,
                100.0,
            )]),
        },
        Layout::BlackWhite => LayoutDefaults {
            content: content(&[
                ("header-title", s("INVOICE")),
                ("company-name", s("Professional Business Services")),
                ("company-email", s("accounting@profbusiness.com")),
                ("company-phone", s("+1 (555) 123-4567")),
                ("company-address", s("123 Corporate Plaza, Suite 500, New York, NY 10001")),
                ("invoice-number", format!("Invoice #: INV-{}", ctx.number)),
                ("invoice-date", format!("Date: {}", ctx.date())),
                ("due-date", format!("Due Date: {}", ctx.due_date())),
                ("client-title", s("BILL TO:")),
                ("client-name", s("Client Corporation")),
                ("client-email", s("finance@clientcorp.com")),
                ("client-phone", s("+1 (555) 987-6543")),
                ("client-address", s("456 Enterprise Avenue, Los Angeles, CA 90001")),
                ("col-desc", s("DESCRIPTION")),
                ("col-qty", s("QTY")),
                ("col-rate", s("RATE")),
                ("col-amount", s("AMOUNT")),
                ("terms-title", s("TERMS & CONDITIONS")),
                (
                    "terms-content",
                    s("Please make all payments to Professional Business Services. A late fee of 2% will be applied to overdue invoices."),
                ),
                ("footer-text", s("Thank you for your business!")),
            ]),
            colors: Colors::new("#000000", "#ffffff", "#000000"),
            element_settings: element_settings([
                (Region::Header, ElementSetting::shown().position("top")),
                (Region::Logo, ElementSetting::hidden()),
                (Region::CompanyInfo, ElementSetting::shown().alignment("left")),
                (Region::ClientInfo, ElementSetting::shown().alignment("right")),
                (Region::InvoiceDetails, ElementSetting::shown().position("right")),
                (Region::ItemsTable, ElementSetting::shown()),
                (Region::TotalSection, ElementSetting::shown().alignment("right")),
                (Region::Notes, ElementSetting::shown()),
                (Region::Footer, ElementSetting::shown().content("Thank you for your business!")),
            ]),
            sections: Vec::new(),
            items: ItemsPolicy::Replace(vec![
                InvoiceItem::new("Professional Consulting Services", 40.0, 150.0),
                InvoiceItem::new("Document Preparation", 1.0, 750.0),
                InvoiceItem::new("Software Implementation", 1.0, 1200.0),
            ]),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DefaultsContext {
        DefaultsContext::new(NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(), "0042")
    }

    #[test]
    fn keys_round_trip_through_parse() {
        for layout in Layout::ALL {
            assert_eq!(Layout::parse(layout.key()), Some(layout));
        }
    }

    #[test]
    fn unknown_key_falls_back_to_classic() {
        assert_eq!(Layout::from_key("holographic"), Layout::Classic);
        assert_eq!(Layout::from_key(""), Layout::Classic);
        assert_eq!(Layout::parse("holographic"), None);
    }

    #[test]
    fn template_ids_map_to_gallery_entries() {
        assert_eq!(Layout::from_template_id(4), Layout::RealEstate);
        assert_eq!(Layout::from_template_id(6), Layout::BlueProfessional);
        assert_eq!(Layout::from_template_id(0), Layout::Classic);
        assert_eq!(Layout::from_template_id(42), Layout::Classic);
        assert_eq!(Layout::Minimal.template_id(), None);
    }

    #[test]
    fn classic_defaults() {
        let defaults = defaults_for(Layout::Classic, &ctx());
        assert_eq!(defaults.content["header-title"], "INVOICE");
        assert_eq!(defaults.content["invoice-number"], "Invoice #: INV-0042");
        assert_eq!(defaults.content["invoice-date"], "Date: 1/15/2024");
        assert_eq!(defaults.content["due-date"], "Due Date: 2/14/2024");
        assert_eq!(defaults.colors.header, "#3f51b5");
        assert_eq!(defaults.items, ItemsPolicy::Keep);
    }

    #[test]
    fn sample_item_layouts() {
        match defaults_for(Layout::RealEstate, &ctx()).items {
            ItemsPolicy::Replace(items) => {
                assert_eq!(items.len(), 3);
                assert_eq!(items[1].amount, 752.0);
            }
            other => panic!("unexpected policy {:?}", other),
        }
        assert!(matches!(defaults_for(Layout::BusinessPro, &ctx()).items, ItemsPolicy::Replace(_)));
        assert!(matches!(
            defaults_for(Layout::ThankYou, &ctx()).items,
            ItemsPolicy::FillIfEmpty(_)
        ));
    }

    #[test]
    fn layouts_with_sections() {
        let modern = defaults_for(Layout::Modern, &ctx());
        assert_eq!(modern.sections.len(), 1);
        assert_eq!(modern.sections[0].title, "PAYMENT DETAILS");
        assert!(defaults_for(Layout::Minimal, &ctx()).sections.is_empty());
    }

    #[test]
    fn black_white_hides_logo() {
        let defaults = defaults_for(Layout::BlackWhite, &ctx());
        assert!(!defaults.element_settings["logo"].visible);
        assert_eq!(defaults.colors.header, "#000000");
    }

    #[test]
    fn serializes_as_key_and_tolerates_unknown() {
        assert_eq!(serde_json::to_string(&Layout::ThankYou).unwrap(), "\"thank-you\"");
        let layout: Layout = serde_json::from_str("\"vaporwave\"").unwrap();
        assert_eq!(layout, Layout::Classic);
    }

    #[test]
    fn context_reuses_invoice_digits() {
        let ctx = DefaultsContext::for_invoice_number("INV-0815");
        assert_eq!(ctx.number, "0815");
    }
}
