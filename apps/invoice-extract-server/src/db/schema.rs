//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- One row per extracted invoice (line item fields are flattened in)
CREATE TABLE IF NOT EXISTS extracted_data_hitl (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    unique_id INTEGER,
    source_file TEXT NOT NULL,
    temp_link TEXT,

    -- Invoice details
    invoice_type TEXT,
    invoice_number TEXT,
    invoice_date TEXT,
    due_date TEXT,
    place_of_supply TEXT,
    irn_number TEXT,
    ack_number TEXT,
    ack_date TEXT,

    -- Vendor details
    vendor_name TEXT,
    vendor_gstin TEXT,
    vendor_pan TEXT,
    vendor_email TEXT,
    vendor_phone TEXT,
    vendor_website TEXT,
    vendor_street TEXT,
    vendor_city TEXT,
    vendor_state TEXT,
    vendor_pincode TEXT,
    vendor_country TEXT,

    -- Vendor bank details
    bank_name TEXT,
    account_number TEXT,
    ifsc_code TEXT,
    bank_branch TEXT,

    -- Client details
    client_name TEXT,
    client_gstin TEXT,
    client_pan TEXT,
    client_email TEXT,
    client_phone TEXT,
    client_street TEXT,
    client_city TEXT,
    client_state TEXT,
    client_pincode TEXT,
    client_country TEXT,

    -- Shipping details
    dispatch_mode TEXT,
    tracking_number TEXT,
    dispatch_date TEXT,
    dispatch_destination TEXT,

    -- Tax details
    cgst_rate TEXT,
    cgst_amount TEXT,
    sgst_rate TEXT,
    sgst_amount TEXT,
    igst_rate TEXT,
    igst_amount TEXT,
    total_tax_amount TEXT,

    -- Payment summary
    discount TEXT,
    roundoff TEXT,
    taxable_value_total TEXT,
    total_invoice_value TEXT,
    total_invoice_value_in_words TEXT,
    amount_due TEXT,
    payment_terms TEXT,
    payment_status TEXT,

    -- Line item
    item_number TEXT,
    hsn_sac_code TEXT,
    description TEXT,
    quantity TEXT,
    unit TEXT,
    rate TEXT,
    discount_percentage TEXT,
    taxable_value TEXT,
    igst_percentage TEXT,
    sgst_percentage TEXT,
    cgst_percentage TEXT,
    igst_value TEXT,
    sgst_value TEXT,
    cgst_value TEXT,
    total_tax TEXT,
    item_total TEXT,

    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    hitl BOOLEAN
);

CREATE INDEX IF NOT EXISTS idx_extracted_unique_id ON extracted_data_hitl(unique_id);
CREATE INDEX IF NOT EXISTS idx_extracted_source_file ON extracted_data_hitl(source_file);

-- Per-category validation scores for an extracted invoice
CREATE TABLE IF NOT EXISTS validation_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    unique_id INTEGER,
    source_file TEXT NOT NULL,
    invoice_details_score REAL,
    line_items_score REAL,
    tax_details_score REAL,
    payment_summary_score REAL,
    overall_score REAL,
    errors_field TEXT,
    error_extracted_value TEXT,
    reason TEXT,
    error_source_value TEXT,
    error_type TEXT,
    created_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_validation_unique_id ON validation_results(unique_id);
CREATE INDEX IF NOT EXISTS idx_validation_source_file ON validation_results(source_file);
"#;
