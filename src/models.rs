use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::schema::*;

#[derive(Debug, Clone, Queryable)]
#[diesel(table_name = records)]
pub struct Record {
    pub seq: i64,
    pub collection: String,
    pub record_id: String,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = records)]
pub struct NewRecord<'a> {
    pub collection: &'a str,
    pub record_id: &'a str,
    pub payload: serde_json::Value,
}
