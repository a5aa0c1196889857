pub mod schema;

use std::fs;
use std::path::Path;
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, Connection, ToSql};
use log::{debug, info};
use crate::errors::PersistenceError;
use crate::models::geo::Position;
use crate::models::series_row::SeriesRow;
use crate::manager_db::schema::TableSchema;

/// Opens (or creates) the database file, creating missing parent directories
///
/// # Arguments
///
/// * 'db_path' - path to the database file
pub fn open_connection(db_path: &str) -> Result<Connection, PersistenceError> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(db_path)?;
    info!("database opened: {}", db_path);

    Ok(conn)
}

/// Square area around a point, used to select rows of one location
#[derive(Clone, Copy, Debug)]
pub struct Near {
    pub lat: f64,
    pub lon: f64,
    pub tolerance: f64,
}

/// Row selection for range queries, 'from' is inclusive and 'to' exclusive
#[derive(Clone, Copy, Debug)]
pub struct RangeQuery {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub near: Option<Near>,
}

impl RangeQuery {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> RangeQuery {
        RangeQuery { from, to, near: None }
    }

    /// Restricts the query to rows within 'tolerance' degrees of the given point
    pub fn near(mut self, lat: f64, lon: f64, tolerance: f64) -> RangeQuery {
        self.near = Some(Near { lat, lon, tolerance });
        self
    }

    /// WHERE clause and its bound values, all values are passed as parameters
    fn filter(&self, schema: &TableSchema) -> Result<(String, Vec<Bound>), PersistenceError> {
        let mut clause = "ts >= ? AND ts < ?".to_string();
        let mut bounds = vec![Bound::Time(self.from.naive_utc()), Bound::Time(self.to.naive_utc())];

        if let Some(near) = self.near {
            if !schema.is_spatial() {
                return Err(PersistenceError(format!("table {} has no position columns", schema.name)));
            }
            clause.push_str(" AND lat >= ? AND lat <= ? AND lon >= ? AND lon <= ?");
            bounds.extend([
                Bound::Number(near.lat - near.tolerance),
                Bound::Number(near.lat + near.tolerance),
                Bound::Number(near.lon - near.tolerance),
                Bound::Number(near.lon + near.tolerance),
            ]);
        }

        Ok((clause, bounds))
    }
}

/// Owned query parameter
enum Bound {
    Time(NaiveDateTime),
    Number(f64),
}

impl Bound {
    fn as_sql(&self) -> &dyn ToSql {
        match self {
            Bound::Time(t) => t,
            Bound::Number(n) => n,
        }
    }
}

/// Table store for time series on top of a single DuckDB connection.
///
/// Stored values are immutable, there is no update or delete. Rows are inserted with
/// insert-or-ignore semantics so re-running a batch over overlapping windows is safe.
pub struct TimeSeriesStore {
    conn: Connection,
}

impl TimeSeriesStore {
    /// Returns a store owning the given connection for the rest of its life
    ///
    /// # Arguments
    ///
    /// * 'conn' - an open DuckDB connection
    pub fn new(conn: Connection) -> TimeSeriesStore {
        TimeSeriesStore { conn }
    }

    /// Returns a store on a fresh in-memory database
    pub fn in_memory() -> Result<TimeSeriesStore, PersistenceError> {
        Ok(TimeSeriesStore::new(Connection::open_in_memory()?))
    }

    /// (Re)creates the table, any existing table with the same name is dropped
    ///
    /// # Arguments
    ///
    /// * 'schema' - layout of the table
    pub fn init_table(&self, schema: &TableSchema) -> Result<(), PersistenceError> {
        let stmt = format!("CREATE OR REPLACE TABLE {};", schema.create_definition());
        self.conn.execute_batch(&stmt)?;
        info!("table {} initialized", schema.name);

        Ok(())
    }

    /// Creates the table unless it already exists
    ///
    /// # Arguments
    ///
    /// * 'schema' - layout of the table
    pub fn ensure_table(&self, schema: &TableSchema) -> Result<(), PersistenceError> {
        let stmt = format!("CREATE TABLE IF NOT EXISTS {};", schema.create_definition());
        self.conn.execute_batch(&stmt)?;

        Ok(())
    }

    /// Inserts rows in one transaction, rows whose key already exists are skipped.
    /// Returns the number of rows actually added.
    ///
    /// # Arguments
    ///
    /// * 'schema' - layout of the target table
    /// * 'rows' - rows holding one value per schema attribute
    pub fn upsert_many(&mut self, schema: &TableSchema, rows: &[SeriesRow]) -> Result<usize, PersistenceError> {
        for row in rows {
            if row.values.len() != schema.attributes.len() {
                return Err(PersistenceError(format!(
                    "row at {} has {} values but table {} has {} attribute columns",
                    row.ts, row.values.len(), schema.name, schema.attributes.len())));
            }
            if schema.is_spatial() && row.position.is_none() {
                return Err(PersistenceError(format!(
                    "row at {} has no position but table {} is keyed by position", row.ts, schema.name)));
            }
        }

        let before = self.count(schema)?;

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&schema.insert_statement())?;
            for row in rows {
                let ts = row.ts.naive_utc();
                let mut params: Vec<&dyn ToSql> = vec![&ts];
                if schema.is_spatial() {
                    if let Some(p) = row.position.as_ref() {
                        params.push(&p.lat);
                        params.push(&p.lon);
                        params.push(&p.elevation);
                    }
                }
                for v in row.values.iter() {
                    params.push(v);
                }
                stmt.execute(params.as_slice())?;
            }
        }
        tx.commit()?;

        let inserted = self.count(schema)? - before;
        debug!("{}: {} of {} rows inserted", schema.name, inserted, rows.len());

        Ok(inserted)
    }

    /// Returns the rows matching the query ordered by time (and position)
    ///
    /// # Arguments
    ///
    /// * 'schema' - layout of the table to read
    /// * 'query' - time range and optional location filter
    pub fn query_range(&self, schema: &TableSchema, query: &RangeQuery) -> Result<Vec<SeriesRow>, PersistenceError> {
        let (clause, bounds) = query.filter(schema)?;
        let order = if schema.is_spatial() { "ts, lat, lon" } else { "ts" };
        let sql = format!("SELECT {} FROM {} WHERE {} ORDER BY {}",
                          schema.columns().join(", "), schema.name, clause, order);

        let params = bounds.iter().map(|b| b.as_sql()).collect::<Vec<&dyn ToSql>>();
        let spatial = schema.is_spatial();
        let value_offset = if spatial { 4 } else { 1 };
        let attribute_count = schema.attributes.len();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params.as_slice(), |row| {
            let ts: NaiveDateTime = row.get(0)?;
            let position = if spatial {
                Some(Position {
                    lat: row.get(1)?,
                    lon: row.get(2)?,
                    elevation: row.get(3)?,
                })
            } else {
                None
            };
            let mut values: Vec<Option<f64>> = Vec::with_capacity(attribute_count);
            for i in 0..attribute_count {
                values.push(row.get(value_offset + i)?);
            }

            Ok(SeriesRow { ts: ts.and_utc(), position, values })
        })?;

        Ok(rows.collect::<Result<Vec<SeriesRow>, duckdb::Error>>()?)
    }

    /// Returns the number of rows matching the query
    ///
    /// # Arguments
    ///
    /// * 'schema' - layout of the table to read
    /// * 'query' - time range and optional location filter
    pub fn count_range(&self, schema: &TableSchema, query: &RangeQuery) -> Result<usize, PersistenceError> {
        let (clause, bounds) = query.filter(schema)?;
        let sql = format!("SELECT count(*) FROM {} WHERE {}", schema.name, clause);
        let params = bounds.iter().map(|b| b.as_sql()).collect::<Vec<&dyn ToSql>>();

        let count: i64 = self.conn.query_row(&sql, params.as_slice(), |row| row.get(0))?;

        Ok(count as usize)
    }

    /// Returns the total number of rows in the table
    pub fn count(&self, schema: &TableSchema) -> Result<usize, PersistenceError> {
        let sql = format!("SELECT count(*) FROM {}", schema.name);
        let count: i64 = self.conn.query_row(&sql, params![], |row| row.get(0))?;

        Ok(count as usize)
    }

    /// Returns the first and last time stamp in the table, None if it is empty
    pub fn time_bounds(&self, schema: &TableSchema) -> Result<Option<(DateTime<Utc>, DateTime<Utc>)>, PersistenceError> {
        let sql = format!("SELECT MIN(ts), MAX(ts) FROM {}", schema.name);
        let (min, max): (Option<NaiveDateTime>, Option<NaiveDateTime>) =
            self.conn.query_row(&sql, params![], |row| Ok((row.get(0)?, row.get(1)?)))?;

        Ok(min.zip(max).map(|(min, max)| (min.and_utc(), max.and_utc())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use tempfile::tempdir;
    use crate::manager_db::schema::{AGGREGATE_TABLE, FORECAST_TABLE, MARKET_TABLE};
    use crate::models::attributes::{FORECAST_ATTRIBUTES, MARKET_ATTRIBUTES};
    use crate::models::forecast::tests::ts;

    fn market_row(stamp: &str, v: f64) -> SeriesRow {
        SeriesRow { ts: ts(stamp), position: None, values: vec![Some(v); MARKET_ATTRIBUTES.len()] }
    }

    fn forecast_row(stamp: &str, lat: f64, lon: f64, v: Option<f64>) -> SeriesRow {
        SeriesRow {
            ts: ts(stamp),
            position: Some(Position { lat, lon, elevation: Some(38.0) }),
            values: vec![v; FORECAST_ATTRIBUTES.len()],
        }
    }

    #[test]
    fn test_init_table() {
        let store = TimeSeriesStore::in_memory().unwrap();
        for schema in [MARKET_TABLE, FORECAST_TABLE, AGGREGATE_TABLE] {
            store.init_table(&schema).unwrap();
            assert_eq!(store.count(&schema).unwrap(), 0);
        }
    }

    #[test]
    fn test_init_table_resets_existing_table() {
        let mut store = TimeSeriesStore::in_memory().unwrap();
        store.init_table(&MARKET_TABLE).unwrap();
        store.upsert_many(&MARKET_TABLE, &[market_row("2025-09-15T00:00", 1.0)]).unwrap();
        assert_eq!(store.count(&MARKET_TABLE).unwrap(), 1);

        store.ensure_table(&MARKET_TABLE).unwrap();
        assert_eq!(store.count(&MARKET_TABLE).unwrap(), 1);

        store.init_table(&MARKET_TABLE).unwrap();
        assert_eq!(store.count(&MARKET_TABLE).unwrap(), 0);
    }

    #[test]
    fn test_upsert_many_is_idempotent() {
        let mut store = TimeSeriesStore::in_memory().unwrap();
        store.init_table(&MARKET_TABLE).unwrap();

        let rows = vec![market_row("2025-09-15T00:00", 1.0)];
        assert_eq!(store.upsert_many(&MARKET_TABLE, &rows).unwrap(), 1);
        assert_eq!(store.upsert_many(&MARKET_TABLE, &rows).unwrap(), 0);
        assert_eq!(store.count(&MARKET_TABLE).unwrap(), 1);
    }

    #[test]
    fn test_upsert_never_overwrites() {
        let mut store = TimeSeriesStore::in_memory().unwrap();
        store.init_table(&FORECAST_TABLE).unwrap();

        let first = vec![
            forecast_row("2023-01-01T00:00", 52.0, 13.0, Some(1.0)),
            forecast_row("2023-01-01T01:00", 52.0, 13.0, Some(2.0)),
        ];
        store.upsert_many(&FORECAST_TABLE, &first).unwrap();

        let overlapping = vec![
            forecast_row("2023-01-01T01:00", 52.0, 13.0, Some(99.0)),
            forecast_row("2023-01-01T02:00", 52.0, 13.0, Some(3.0)),
            forecast_row("2023-01-01T01:00", 48.0, 11.0, Some(4.0)),
        ];
        assert_eq!(store.upsert_many(&FORECAST_TABLE, &overlapping).unwrap(), 2);
        assert_eq!(store.count(&FORECAST_TABLE).unwrap(), 4);

        let query = RangeQuery::new(ts("2023-01-01T01:00"), ts("2023-01-01T02:00")).near(52.0, 13.0, 0.1);
        let rows = store.query_range(&FORECAST_TABLE, &query).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].values[0], Some(2.0));
    }

    #[test]
    fn test_upsert_rejects_schema_mismatch() {
        let mut store = TimeSeriesStore::in_memory().unwrap();
        store.init_table(&FORECAST_TABLE).unwrap();

        let short = SeriesRow { ts: ts("2023-01-01T00:00"), position: None, values: vec![Some(1.0)] };
        assert!(store.upsert_many(&FORECAST_TABLE, &[short]).is_err());

        let unplaced = SeriesRow {
            ts: ts("2023-01-01T00:00"),
            position: None,
            values: vec![Some(1.0); FORECAST_ATTRIBUTES.len()],
        };
        assert!(store.upsert_many(&FORECAST_TABLE, &[unplaced]).is_err());
        assert_eq!(store.count(&FORECAST_TABLE).unwrap(), 0);
    }

    #[test]
    fn test_upsert_on_missing_table_fails() {
        let mut store = TimeSeriesStore::in_memory().unwrap();
        assert!(store.upsert_many(&MARKET_TABLE, &[market_row("2025-09-15T00:00", 1.0)]).is_err());
    }

    #[test]
    fn test_query_range_round_trip() {
        let mut store = TimeSeriesStore::in_memory().unwrap();
        store.init_table(&FORECAST_TABLE).unwrap();

        let rows = vec![
            forecast_row("2023-12-31T23:00", 52.0, 13.0, Some(0.5)),
            forecast_row("2024-01-01T00:00", 52.0, 13.0, None),
            forecast_row("2024-01-01T01:00", 52.0, 13.0, Some(1.5)),
            forecast_row("2024-01-01T00:00", 48.6, 11.4, Some(7.0)),
            forecast_row("2025-01-01T00:00", 52.0, 13.0, Some(9.0)),
        ];
        store.upsert_many(&FORECAST_TABLE, &rows).unwrap();

        let year = RangeQuery::new(ts("2024-01-01"), ts("2025-01-01"));
        assert_eq!(store.count_range(&FORECAST_TABLE, &year).unwrap(), 3);

        let berlin = store.query_range(&FORECAST_TABLE, &year.near(52.05, 12.95, 0.1)).unwrap();
        assert_eq!(berlin, vec![rows[1].clone(), rows[2].clone()]);
    }

    #[test]
    fn test_query_near_on_market_table_fails() {
        let store = TimeSeriesStore::in_memory().unwrap();
        store.init_table(&MARKET_TABLE).unwrap();
        let query = RangeQuery::new(ts("2024-01-01"), ts("2025-01-01")).near(52.0, 13.0, 0.1);
        assert!(store.query_range(&MARKET_TABLE, &query).is_err());
    }

    #[test]
    fn test_time_bounds() {
        let mut store = TimeSeriesStore::in_memory().unwrap();
        store.init_table(&MARKET_TABLE).unwrap();
        assert_eq!(store.time_bounds(&MARKET_TABLE).unwrap(), None);

        let rows = vec![market_row("2024-03-01T00:00", 1.0), market_row("2022-05-01T12:00", 2.0)];
        store.upsert_many(&MARKET_TABLE, &rows).unwrap();
        let (min, max) = store.time_bounds(&MARKET_TABLE).unwrap().unwrap();
        assert_eq!(min, ts("2022-05-01T12:00"));
        assert_eq!(max, ts("2024-03-01T00:00"));
        assert_eq!(max - min, TimeDelta::hours(16068));
    }

    #[test]
    fn test_store_on_disk_keeps_rows() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("db").join("local.db");
        let db_path = db_path.to_str().unwrap();

        {
            let mut store = TimeSeriesStore::new(open_connection(db_path).unwrap());
            store.init_table(&MARKET_TABLE).unwrap();
            store.upsert_many(&MARKET_TABLE, &[market_row("2025-09-15T00:00", 1.0)]).unwrap();
        }

        let mut store = TimeSeriesStore::new(open_connection(db_path).unwrap());
        store.ensure_table(&MARKET_TABLE).unwrap();
        store.upsert_many(&MARKET_TABLE, &[market_row("2025-09-15T00:00", 1.0)]).unwrap();
        assert_eq!(store.count(&MARKET_TABLE).unwrap(), 1);
    }
}
