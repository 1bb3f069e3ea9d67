//! HITL review records
//!
//! `extracted_data_hitl` stores one row per extracted invoice with the line
//! item fields flattened in; `validation_results` stores the per-category
//! scores a reviewer assigns. Extracted values are kept as free text since
//! the model output is not normalized.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};
use sqlx::SqlitePool;

use crate::error::Result;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Extracted invoice values, one optional text column each
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct InvoiceFields {
    // invoice details
    pub invoice_type: Option<String>,
    pub invoice_number: Option<String>,
    pub invoice_date: Option<String>,
    pub due_date: Option<String>,
    pub place_of_supply: Option<String>,
    pub irn_number: Option<String>,
    pub ack_number: Option<String>,
    pub ack_date: Option<String>,

    // vendor
    pub vendor_name: Option<String>,
    pub vendor_gstin: Option<String>,
    pub vendor_pan: Option<String>,
    pub vendor_email: Option<String>,
    pub vendor_phone: Option<String>,
    pub vendor_website: Option<String>,
    pub vendor_street: Option<String>,
    pub vendor_city: Option<String>,
    pub vendor_state: Option<String>,
    pub vendor_pincode: Option<String>,
    pub vendor_country: Option<String>,

    // vendor bank
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub ifsc_code: Option<String>,
    pub bank_branch: Option<String>,

    // client
    pub client_name: Option<String>,
    pub client_gstin: Option<String>,
    pub client_pan: Option<String>,
    pub client_email: Option<String>,
    pub client_phone: Option<String>,
    pub client_street: Option<String>,
    pub client_city: Option<String>,
    pub client_state: Option<String>,
    pub client_pincode: Option<String>,
    pub client_country: Option<String>,

    // shipping
    pub dispatch_mode: Option<String>,
    pub tracking_number: Option<String>,
    pub dispatch_date: Option<String>,
    pub dispatch_destination: Option<String>,

    // tax
    pub cgst_rate: Option<String>,
    pub cgst_amount: Option<String>,
    pub sgst_rate: Option<String>,
    pub sgst_amount: Option<String>,
    pub igst_rate: Option<String>,
    pub igst_amount: Option<String>,
    pub total_tax_amount: Option<String>,

    // payment summary
    pub discount: Option<String>,
    pub roundoff: Option<String>,
    pub taxable_value_total: Option<String>,
    pub total_invoice_value: Option<String>,
    pub total_invoice_value_in_words: Option<String>,
    pub amount_due: Option<String>,
    pub payment_terms: Option<String>,
    pub payment_status: Option<String>,

    // line item
    pub item_number: Option<String>,
    pub hsn_sac_code: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<String>,
    pub unit: Option<String>,
    pub rate: Option<String>,
    pub discount_percentage: Option<String>,
    pub taxable_value: Option<String>,
    pub igst_percentage: Option<String>,
    pub sgst_percentage: Option<String>,
    pub cgst_percentage: Option<String>,
    pub igst_value: Option<String>,
    pub sgst_value: Option<String>,
    pub cgst_value: Option<String>,
    pub total_tax: Option<String>,
    pub item_total: Option<String>,
}

impl InvoiceFields {
    /// Column names in declaration order
    pub const COLUMNS: &'static [&'static str] = &[
        "invoice_type",
        "invoice_number",
        "invoice_date",
        "due_date",
        "place_of_supply",
        "irn_number",
        "ack_number",
        "ack_date",
        "vendor_name",
        "vendor_gstin",
        "vendor_pan",
        "vendor_email",
        "vendor_phone",
        "vendor_website",
        "vendor_street",
        "vendor_city",
        "vendor_state",
        "vendor_pincode",
        "vendor_country",
        "bank_name",
        "account_number",
        "ifsc_code",
        "bank_branch",
        "client_name",
        "client_gstin",
        "client_pan",
        "client_email",
        "client_phone",
        "client_street",
        "client_city",
        "client_state",
        "client_pincode",
        "client_country",
        "dispatch_mode",
        "tracking_number",
        "dispatch_date",
        "dispatch_destination",
        "cgst_rate",
        "cgst_amount",
        "sgst_rate",
        "sgst_amount",
        "igst_rate",
        "igst_amount",
        "total_tax_amount",
        "discount",
        "roundoff",
        "taxable_value_total",
        "total_invoice_value",
        "total_invoice_value_in_words",
        "amount_due",
        "payment_terms",
        "payment_status",
        "item_number",
        "hsn_sac_code",
        "description",
        "quantity",
        "unit",
        "rate",
        "discount_percentage",
        "taxable_value",
        "igst_percentage",
        "sgst_percentage",
        "cgst_percentage",
        "igst_value",
        "sgst_value",
        "cgst_value",
        "total_tax",
        "item_total",
    ];

    /// Bind every field, in `COLUMNS` order
    fn bind_to<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        query
            .bind(&self.invoice_type)
            .bind(&self.invoice_number)
            .bind(&self.invoice_date)
            .bind(&self.due_date)
            .bind(&self.place_of_supply)
            .bind(&self.irn_number)
            .bind(&self.ack_number)
            .bind(&self.ack_date)
            .bind(&self.vendor_name)
            .bind(&self.vendor_gstin)
            .bind(&self.vendor_pan)
            .bind(&self.vendor_email)
            .bind(&self.vendor_phone)
            .bind(&self.vendor_website)
            .bind(&self.vendor_street)
            .bind(&self.vendor_city)
            .bind(&self.vendor_state)
            .bind(&self.vendor_pincode)
            .bind(&self.vendor_country)
            .bind(&self.bank_name)
            .bind(&self.account_number)
            .bind(&self.ifsc_code)
            .bind(&self.bank_branch)
            .bind(&self.client_name)
            .bind(&self.client_gstin)
            .bind(&self.client_pan)
            .bind(&self.client_email)
            .bind(&self.client_phone)
            .bind(&self.client_street)
            .bind(&self.client_city)
            .bind(&self.client_state)
            .bind(&self.client_pincode)
            .bind(&self.client_country)
            .bind(&self.dispatch_mode)
            .bind(&self.tracking_number)
            .bind(&self.dispatch_date)
            .bind(&self.dispatch_destination)
            .bind(&self.cgst_rate)
            .bind(&self.cgst_amount)
            .bind(&self.sgst_rate)
            .bind(&self.sgst_amount)
            .bind(&self.igst_rate)
            .bind(&self.igst_amount)
            .bind(&self.total_tax_amount)
            .bind(&self.discount)
            .bind(&self.roundoff)
            .bind(&self.taxable_value_total)
            .bind(&self.total_invoice_value)
            .bind(&self.total_invoice_value_in_words)
            .bind(&self.amount_due)
            .bind(&self.payment_terms)
            .bind(&self.payment_status)
            .bind(&self.item_number)
            .bind(&self.hsn_sac_code)
            .bind(&self.description)
            .bind(&self.quantity)
            .bind(&self.unit)
            .bind(&self.rate)
            .bind(&self.discount_percentage)
            .bind(&self.taxable_value)
            .bind(&self.igst_percentage)
            .bind(&self.sgst_percentage)
            .bind(&self.cgst_percentage)
            .bind(&self.igst_value)
            .bind(&self.sgst_value)
            .bind(&self.cgst_value)
            .bind(&self.total_tax)
            .bind(&self.item_total)
    }
}

/// Extracted invoice row
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct InvoiceRecord {
    pub id: i64,
    pub unique_id: Option<i64>,
    pub source_file: String,
    pub temp_link: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: InvoiceFields,
    pub created_at: String,
    /// Set once a reviewer has looked at the row
    pub hitl: Option<bool>,
}

/// Create invoice request
#[derive(Debug, Clone, Default)]
pub struct NewInvoice {
    pub unique_id: Option<i64>,
    pub source_file: String,
    pub temp_link: Option<String>,
    pub fields: InvoiceFields,
    pub hitl: Option<bool>,
}

/// Validation result row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ValidationRecord {
    pub id: i64,
    pub unique_id: Option<i64>,
    pub source_file: String,
    pub invoice_details_score: Option<f64>,
    pub line_items_score: Option<f64>,
    pub tax_details_score: Option<f64>,
    pub payment_summary_score: Option<f64>,
    pub overall_score: Option<f64>,
    pub errors_field: Option<String>,
    pub error_extracted_value: Option<String>,
    pub reason: Option<String>,
    pub error_source_value: Option<String>,
    pub error_type: Option<String>,
    pub created_at: String,
}

/// Create validation result request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewValidation {
    pub unique_id: Option<i64>,
    pub source_file: String,
    pub invoice_details_score: Option<f64>,
    pub line_items_score: Option<f64>,
    pub tax_details_score: Option<f64>,
    pub payment_summary_score: Option<f64>,
    pub overall_score: Option<f64>,
    pub errors_field: Option<String>,
    pub error_extracted_value: Option<String>,
    pub reason: Option<String>,
    pub error_source_value: Option<String>,
    pub error_type: Option<String>,
}

/// HITL repository
pub struct HitlRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> HitlRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store an extracted invoice
    pub async fn insert_invoice(&self, data: &NewInvoice) -> Result<InvoiceRecord> {
        let now = Utc::now().to_rfc3339();
        let sql = format!(
            "INSERT INTO extracted_data_hitl (unique_id, source_file, temp_link, hitl, created_at, {}) VALUES ({})",
            InvoiceFields::COLUMNS.join(", "),
            vec!["?"; InvoiceFields::COLUMNS.len() + 5].join(", ")
        );

        let query = sqlx::query(&sql)
            .bind(data.unique_id)
            .bind(&data.source_file)
            .bind(&data.temp_link)
            .bind(data.hitl)
            .bind(&now);
        let result = data.fields.bind_to(query).execute(self.pool).await?;

        let id = result.last_insert_rowid();
        self.get_invoice(id)
            .await?
            .ok_or_else(|| sqlx::Error::RowNotFound.into())
    }

    /// Get a specific invoice
    pub async fn get_invoice(&self, id: i64) -> Result<Option<InvoiceRecord>> {
        let record = sqlx::query_as::<_, InvoiceRecord>(
            "SELECT * FROM extracted_data_hitl WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(record)
    }

    /// Store a validation result
    pub async fn insert_validation(&self, data: &NewValidation) -> Result<ValidationRecord> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"
            INSERT INTO validation_results (
                unique_id, source_file, invoice_details_score, line_items_score,
                tax_details_score, payment_summary_score, overall_score, errors_field,
                error_extracted_value, reason, error_source_value, error_type, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(data.unique_id)
        .bind(&data.source_file)
        .bind(data.invoice_details_score)
        .bind(data.line_items_score)
        .bind(data.tax_details_score)
        .bind(data.payment_summary_score)
        .bind(data.overall_score)
        .bind(&data.errors_field)
        .bind(&data.error_extracted_value)
        .bind(&data.reason)
        .bind(&data.error_source_value)
        .bind(&data.error_type)
        .bind(&now)
        .execute(self.pool)
        .await?;

        let record = sqlx::query_as::<_, ValidationRecord>(
            "SELECT * FROM validation_results WHERE id = ?",
        )
        .bind(result.last_insert_rowid())
        .fetch_one(self.pool)
        .await?;

        Ok(record)
    }

    /// List validation results for a source file, oldest first
    pub async fn list_validations_for_source(
        &self,
        source_file: &str,
    ) -> Result<Vec<ValidationRecord>> {
        let records = sqlx::query_as::<_, ValidationRecord>(
            r#"
            SELECT * FROM validation_results
            WHERE source_file = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(source_file)
        .fetch_all(self.pool)
        .await?;

        Ok(records)
    }
}
