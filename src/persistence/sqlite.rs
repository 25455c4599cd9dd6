use super::{PersistenceError, PersistenceResult, ScheduleStore};
use crate::Schedule;
use crate::record::ItemRecord;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Transaction, params};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// [`ScheduleStore`] keeping the base date and one JSON record per item.
pub struct SqliteScheduleStore {
    connection: Mutex<Connection>,
}

impl SqliteScheduleStore {
    pub fn new<P: AsRef<std::path::Path>>(path: P) -> PersistenceResult<Self> {
        let connection = Connection::open(path)?;
        Self::from_connection(connection)
    }

    pub fn in_memory() -> PersistenceResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(connection: Connection) -> PersistenceResult<Self> {
        Self::initialize_schema(&connection)?;
        Ok(Self {
            connection: Mutex::new(connection),
        })
    }

    fn initialize_schema(connection: &Connection) -> PersistenceResult<()> {
        let ddl = r#"
            CREATE TABLE IF NOT EXISTS sheet_meta (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                base_date TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS items (
                position INTEGER PRIMARY KEY,
                id TEXT NOT NULL UNIQUE,
                record_json TEXT NOT NULL
            );
        "#;
        connection.execute_batch(ddl)?;
        Ok(())
    }

    fn lock(&self) -> PersistenceResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|_| PersistenceError::InvalidData("sqlite connection lock poisoned".into()))
    }

    fn save_meta(tx: &Transaction, base_date: NaiveDate) -> PersistenceResult<()> {
        tx.execute("DELETE FROM sheet_meta", [])?;
        tx.execute(
            "INSERT INTO sheet_meta (id, base_date) VALUES (1, ?1)",
            params![base_date.to_string()],
        )?;
        Ok(())
    }

    fn save_items(tx: &Transaction, schedule: &Schedule) -> PersistenceResult<()> {
        tx.execute("DELETE FROM items", [])?;
        let mut stmt = tx.prepare("INSERT INTO items (position, id, record_json) VALUES (?1, ?2, ?3)")?;
        for (position, record) in schedule.to_records().iter().enumerate() {
            let json = serde_json::to_string(record)?;
            stmt.execute(params![position as i64, record.id.to_string(), json])?;
        }
        Ok(())
    }
}

impl ScheduleStore for SqliteScheduleStore {
    fn save_schedule(&self, schedule: &Schedule) -> PersistenceResult<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        Self::save_meta(&tx, schedule.base_date())?;
        Self::save_items(&tx, schedule)?;
        tx.commit()?;
        debug!(items = schedule.len(), "saved schedule to sqlite");
        Ok(())
    }

    fn load_schedule(&self) -> PersistenceResult<Option<Schedule>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare("SELECT base_date FROM sheet_meta WHERE id = 1")?;
        let base_date: Option<String> = stmt.query_row([], |row| row.get(0)).optional()?;
        let Some(base_date) = base_date else {
            return Ok(None);
        };
        let base_date = base_date.parse::<NaiveDate>().map_err(|e| {
            PersistenceError::InvalidData(format!("invalid base date '{base_date}': {e}"))
        })?;

        let mut stmt = conn.prepare("SELECT record_json FROM items ORDER BY position ASC")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        let mut records = Vec::new();
        for json in rows {
            let record: ItemRecord = serde_json::from_str(&json?)?;
            records.push(record);
        }

        let plan = super::plan_from_records(&records)?;
        let schedule = Schedule::rebuild(plan, base_date)?;
        debug!(items = schedule.len(), "loaded schedule from sqlite");
        Ok(Some(schedule))
    }
}
