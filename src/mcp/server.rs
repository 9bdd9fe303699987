//! petmed MCP Server Implementation
//!
//! Implements the MCP server with all petmed tools. The session is owned by
//! the service; every data tool resolves the signed-in user first.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo,
};
use rmcp::{schemars, tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::Database;
use crate::models::{MedicineCreate, MedicineUpdate, User};
use crate::schedule::PerSlot;
use crate::session::Session;
use crate::tools::health::HealthRecordFields;
use crate::tools::status::StatusTracker;
use crate::tools::{account, calendar, doses, health, medicines, parse_date, today};

/// petmed MCP Service
#[derive(Clone)]
pub struct PetmedService {
    status_tracker: Arc<Mutex<StatusTracker>>,
    database: Database,
    session: Arc<Mutex<Session>>,
    tool_router: ToolRouter<PetmedService>,
}

impl PetmedService {
    pub fn new(database_path: PathBuf, database: Database, session: Session) -> Self {
        Self {
            status_tracker: Arc::new(Mutex::new(StatusTracker::new(database_path))),
            database,
            session: Arc::new(Mutex::new(session)),
            tool_router: Self::tool_router(),
        }
    }

    /// The signed-in user, or an error telling the caller to log in
    async fn signed_in_user(&self) -> Result<User, McpError> {
        let session = self.session.lock().await;
        session
            .require_user()
            .cloned()
            .map_err(|e| McpError::invalid_request(e.to_string(), None))
    }
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| McpError::internal_error(e.to_string(), None))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

fn not_found(what: &str, id: i64) -> Result<CallToolResult, McpError> {
    Ok(CallToolResult::success(vec![Content::text(format!(
        r#"{{"error": "{} not found", "id": {}}}"#,
        what, id
    ))]))
}

fn date_param(date: Option<&str>) -> Result<NaiveDate, McpError> {
    match date {
        Some(d) => parse_date(d).map_err(|e| McpError::invalid_params(e, None)),
        None => Ok(today()),
    }
}

fn optional_date(date: Option<&str>) -> Result<Option<NaiveDate>, McpError> {
    date.map(|d| parse_date(d).map_err(|e| McpError::invalid_params(e, None)))
        .transpose()
}

// ============================================================================
// Account Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct RegisterParams {
    /// Owner's display name
    pub name: String,
    /// Owner's e-mail address (used to log in)
    pub email: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct LoginParams {
    /// E-mail address of a registered user
    pub email: String,
}

// ============================================================================
// Medicine Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct AddMedicineParams {
    /// Medicine name (e.g., "Apoquel", "Amoxicillin")
    pub name: String,
    /// Unit label (e.g., "tablet", "ml", "drop")
    pub unit: String,
    /// Morning dose; omit or 0 when not given in the morning
    pub morning_dose: Option<f64>,
    /// Midday (evening) dose; omit or 0 when not given at midday
    pub midday_dose: Option<f64>,
    /// Night dose; omit or 0 when not given at night
    pub night_dose: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetMedicineParams {
    /// Medicine ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct UpdateMedicineParams {
    /// Medicine ID
    pub id: i64,
    /// New name
    pub name: Option<String>,
    /// New unit label
    pub unit: Option<String>,
    /// New morning dose (0 to stop the morning dose)
    pub morning_dose: Option<f64>,
    /// New midday dose (0 to stop the midday dose)
    pub midday_dose: Option<f64>,
    /// New night dose (0 to stop the night dose)
    pub night_dose: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteMedicineParams {
    /// Medicine ID; its dose records are deleted too
    pub id: i64,
}

// ============================================================================
// Dose Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetDailyDosesParams {
    /// Date in ISO format: YYYY-MM-DD (defaults to today)
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ToggleDoseParams {
    /// Medicine ID
    pub medicine_id: i64,
    /// Slot: morning, midday or night
    pub slot: String,
    /// Date in ISO format: YYYY-MM-DD (defaults to today)
    pub date: Option<String>,
    /// Time the dose was given, HH:MM (defaults to now)
    pub time: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SetDoseQuantityParams {
    /// Dose record ID
    pub record_id: i64,
    /// Slot: morning, midday or night
    pub slot: String,
    /// Quantity actually given; omit to clear the override
    pub quantity: Option<f64>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListDoseRecordsParams {
    /// Only records for this date (YYYY-MM-DD)
    pub date: Option<String>,
    /// Range start (inclusive), used when date is not given
    pub start_date: Option<String>,
    /// Range end (inclusive), used when date is not given
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetDoseRecordParams {
    /// Dose record ID
    pub id: i64,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteDoseRecordParams {
    /// Dose record ID
    pub id: i64,
}

// ============================================================================
// Calendar Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct MonthParams {
    /// Year (e.g., 2025)
    pub year: i32,
    /// Month, 1-12
    pub month: u32,
}

// ============================================================================
// Health Parameter Structs
// ============================================================================

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct SaveHealthRecordParams {
    /// Date in ISO format: YYYY-MM-DD (defaults to today)
    pub date: Option<String>,
    /// Condition: 1 very bad, 2 bad, 3 normal, 4 good, 5 very good
    pub condition: Option<i64>,
    /// Appetite: 1 very bad, 2 bad, 3 normal, 4 good, 5 very good
    pub appetite: Option<i64>,
    /// Free-text observations
    pub notes: Option<String>,
    /// Importance: 1 low (default), 2 medium, 3 high
    pub importance: Option<i64>,
    /// True if the pet visited the vet/hospital on this day
    #[serde(default)]
    pub is_hospital_day: bool,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct GetHealthRecordParams {
    /// Health record ID
    pub id: Option<i64>,
    /// Date in ISO format: YYYY-MM-DD, used when id is not given
    pub date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct ListHealthRecordsParams {
    /// Range start (inclusive)
    pub start_date: Option<String>,
    /// Range end (inclusive)
    pub end_date: Option<String>,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct DeleteHealthRecordParams {
    /// Health record ID
    pub id: i64,
}

#[tool_router]
impl PetmedService {
    // --- Status ---

    #[tool(description = "Get the current status of the petmed service including build info, database status, signed-in user and process information")]
    async fn petmed_status(&self) -> Result<CallToolResult, McpError> {
        let logged_in_as = {
            let session = self.session.lock().await;
            session.current().map(|a| a.user.email.clone())
        };
        let tracker = self.status_tracker.lock().await;
        let status = tracker.get_status(logged_in_as);
        json_result(&status)
    }

    #[tool(description = "Get instructions for tracking medicines, doses and health records. Call this when starting a session or when unsure how to use the tools.")]
    fn petmed_instructions(&self) -> Result<CallToolResult, McpError> {
        use crate::tools::status::INSTRUCTIONS;
        Ok(CallToolResult::success(vec![Content::text(INSTRUCTIONS)]))
    }

    // --- Account ---

    #[tool(description = "Register a new user by name and e-mail and sign them in")]
    async fn register(&self, Parameters(p): Parameters<RegisterParams>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let result = account::register(&self.database, &mut session, &p.name, &p.email)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Sign in an existing user by e-mail")]
    async fn login(&self, Parameters(p): Parameters<LoginParams>) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let result = account::login(&self.database, &mut session, &p.email)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Sign out and forget the persisted session")]
    async fn logout(&self) -> Result<CallToolResult, McpError> {
        let mut session = self.session.lock().await;
        let result = account::logout(&self.database, &mut session)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Show the signed-in user, if any")]
    async fn whoami(&self) -> Result<CallToolResult, McpError> {
        let session = self.session.lock().await;
        json_result(&account::whoami(&session))
    }

    // --- Medicines ---

    #[tool(description = "Add a medicine with a dose for each daily slot (morning, midday, night). At least one dose must be greater than 0.")]
    async fn add_medicine(&self, Parameters(p): Parameters<AddMedicineParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let data = MedicineCreate {
            name: p.name,
            unit: p.unit,
            doses: PerSlot::new(p.morning_dose, p.midday_dose, p.night_dose),
        };
        let result = medicines::add_medicine(&self.database, &user, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get full details for a medicine")]
    async fn get_medicine(&self, Parameters(p): Parameters<GetMedicineParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let result = medicines::get_medicine(&self.database, &user, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(med) => json_result(&med),
            None => not_found("Medicine", p.id),
        }
    }

    #[tool(description = "List all medicines with their daily schedule")]
    async fn list_medicines(&self) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let result = medicines::list_medicines(&self.database, &user)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Update a medicine's name, unit or slot doses. Only the given fields change; at least one slot must stay active.")]
    async fn update_medicine(&self, Parameters(p): Parameters<UpdateMedicineParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let data = MedicineUpdate {
            name: p.name,
            unit: p.unit,
            morning_dose: p.morning_dose,
            midday_dose: p.midday_dose,
            night_dose: p.night_dose,
        };
        let result = medicines::update_medicine(&self.database, &user, p.id, data)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(med) => json_result(&med),
            None => not_found("Medicine", p.id),
        }
    }

    #[tool(description = "Delete a medicine and all of its dose records")]
    async fn delete_medicine(&self, Parameters(p): Parameters<DeleteMedicineParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let result = medicines::delete_medicine(&self.database, &user, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(deleted) => json_result(&deleted),
            None => not_found("Medicine", p.id),
        }
    }

    // --- Doses ---

    #[tool(description = "Get the day's medicines with their active slots, whether each dose was taken and when, and the day's completion status")]
    async fn get_daily_doses(&self, Parameters(p): Parameters<GetDailyDosesParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let date = date_param(p.date.as_deref())?;
        let result = doses::get_daily_doses(&self.database, &user, date)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Mark a dose slot taken (or un-mark it if already taken) for a medicine on a date. Records the given time or the current time. Returns the updated day.")]
    async fn toggle_dose(&self, Parameters(p): Parameters<ToggleDoseParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let date = date_param(p.date.as_deref())?;
        let result = doses::toggle_dose(&self.database, &user, p.medicine_id, date, &p.slot, p.time.as_deref())
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Record the quantity actually given for one slot of a dose record, when it differed from the scheduled dose. Omit quantity to clear it.")]
    async fn set_dose_quantity(&self, Parameters(p): Parameters<SetDoseQuantityParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let result = doses::set_dose_quantity(&self.database, &user, p.record_id, &p.slot, p.quantity)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(record) => json_result(&record),
            None => not_found("Dose record", p.record_id),
        }
    }

    #[tool(description = "List dose records for a date or a date range")]
    async fn list_dose_records(&self, Parameters(p): Parameters<ListDoseRecordsParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let (start, end) = match optional_date(p.date.as_deref())? {
            Some(date) => (Some(date), Some(date)),
            None => (optional_date(p.start_date.as_deref())?, optional_date(p.end_date.as_deref())?),
        };
        let result = doses::list_dose_records(&self.database, &user, start, end)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a dose record by ID")]
    async fn get_dose_record(&self, Parameters(p): Parameters<GetDoseRecordParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let result = doses::get_dose_record(&self.database, &user, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(record) => json_result(&record),
            None => not_found("Dose record", p.id),
        }
    }

    #[tool(description = "Delete a dose record")]
    async fn delete_dose_record(&self, Parameters(p): Parameters<DeleteDoseRecordParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let result = doses::delete_dose_record(&self.database, &user, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(deleted) => json_result(&deleted),
            None => not_found("Dose record", p.id),
        }
    }

    // --- Calendar ---

    #[tool(description = "Get a month of dose completion: every day with complete/partial/none status and per-medicine rows")]
    async fn get_dose_calendar(&self, Parameters(p): Parameters<MonthParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let result = calendar::get_dose_calendar(&self.database, &user, p.year, p.month)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a month of health records: every day with its condition, appetite, importance and hospital flag")]
    async fn get_health_calendar(&self, Parameters(p): Parameters<MonthParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let result = calendar::get_health_calendar(&self.database, &user, p.year, p.month)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get the dates of a month and its Sunday-first week grid")]
    fn month_scaffold(&self, Parameters(p): Parameters<MonthParams>) -> Result<CallToolResult, McpError> {
        let result = calendar::month_scaffold(p.year, p.month)
            .map_err(|e| McpError::invalid_params(e, None))?;
        json_result(&result)
    }

    // --- Health Records ---

    #[tool(description = "Save the health record for a date, creating it or replacing the existing one")]
    async fn save_health_record(&self, Parameters(p): Parameters<SaveHealthRecordParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let date = date_param(p.date.as_deref())?;
        let fields = HealthRecordFields {
            condition: p.condition,
            appetite: p.appetite,
            notes: p.notes,
            importance: p.importance,
            is_hospital_day: p.is_hospital_day,
        };
        let result = health::save_health_record(&self.database, &user, date, fields)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Get a health record by ID or by date")]
    async fn get_health_record(&self, Parameters(p): Parameters<GetHealthRecordParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        match (p.id, p.date.as_deref()) {
            (Some(id), _) => {
                let result = health::get_health_record_by_id(&self.database, &user, id)
                    .map_err(|e| McpError::internal_error(e, None))?;
                match result {
                    Some(record) => json_result(&record),
                    None => not_found("Health record", id),
                }
            }
            (None, Some(date)) => {
                let date = date_param(Some(date))?;
                let result = health::get_health_record_by_date(&self.database, &user, date)
                    .map_err(|e| McpError::internal_error(e, None))?;
                match result {
                    Some(record) => json_result(&record),
                    None => Ok(CallToolResult::success(vec![Content::text(format!(
                        r#"{{"error": "Health record not found", "date": "{}"}}"#,
                        date
                    ))])),
                }
            }
            (None, None) => Err(McpError::invalid_params("Either id or date is required", None)),
        }
    }

    #[tool(description = "List health records in date order, optionally within a date range")]
    async fn list_health_records(&self, Parameters(p): Parameters<ListHealthRecordsParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let start = optional_date(p.start_date.as_deref())?;
        let end = optional_date(p.end_date.as_deref())?;
        let result = health::list_health_records(&self.database, &user, start, end)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }

    #[tool(description = "Delete a health record")]
    async fn delete_health_record(&self, Parameters(p): Parameters<DeleteHealthRecordParams>) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let result = health::delete_health_record(&self.database, &user, p.id)
            .map_err(|e| McpError::internal_error(e, None))?;
        match result {
            Some(deleted) => json_result(&deleted),
            None => not_found("Health record", p.id),
        }
    }

    #[tool(description = "List medium and high importance health records since the most recent hospital visit, oldest first")]
    async fn important_since_hospital_visit(&self) -> Result<CallToolResult, McpError> {
        let user = self.signed_in_user().await?;
        let result = health::important_since_hospital_visit(&self.database, &user)
            .map_err(|e| McpError::internal_error(e, None))?;
        json_result(&result)
    }
}

// ============================================================================
// Server Handler
// ============================================================================

#[tool_handler]
impl ServerHandler for PetmedService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "petmed".into(),
                version: crate::build_info::VERSION.into(),
                title: Some("Pet Medication & Health Tracker".into()),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "petmed - Pet medication schedule and health record tracker. \
                 IMPORTANT: Call petmed_instructions first. Sign in with register/login before using data tools; whoami/logout manage the session. \
                 Medicines: add/get/list/update/delete_medicine (dose per morning/midday/night slot). \
                 Doses: get_daily_doses, toggle_dose, set_dose_quantity, list/get/delete_dose_record. \
                 Calendar: get_dose_calendar, get_health_calendar, month_scaffold. \
                 Health: save/get/list/delete_health_record, important_since_hospital_visit. \
                 Status: petmed_status."
                    .into(),
            ),
        }
    }
}
