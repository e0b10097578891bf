//! Version store kept in the target MongoDB deployment.

use super::{validate_names, MigrationRecord, VersionStore};
use crate::error::{MigrateError, Result};
use crate::version::MigrationVersion;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc, Bson, Document};
use mongodb::sync::{Client, Collection};
use std::collections::BTreeSet;

/// Version store writing `{version, appliedAt}` documents to the
/// `<collection>` collection of database `<namespace>`.
///
/// The client is connected and pinged once at construction, then reused for
/// every call. Dropping the store releases the connection pool.
pub struct MongoVersionStore {
    collection: Collection<Document>,
}

impl MongoVersionStore {
    /// Connect to the deployment at `uri` and check that it answers.
    pub fn connect(uri: &str, namespace: &str, collection: &str) -> Result<Self> {
        validate_names(namespace, collection)?;

        let client = Client::with_uri_str(uri)
            .map_err(|e| MigrateError::persistence("connect to target store", e))?;
        let database = client.database(namespace);
        database
            .run_command(doc! { "ping": 1 })
            .run()
            .map_err(|e| MigrateError::persistence("ping target store", e))?;

        tracing::debug!(namespace, collection, "version store connected");
        Ok(Self {
            collection: database.collection(collection),
        })
    }

    fn scan(&self, operation: &str) -> Result<Vec<MigrationRecord>> {
        let cursor = self
            .collection
            .find(doc! {})
            .run()
            .map_err(|e| MigrateError::persistence(operation, e))?;

        let mut records = Vec::new();
        for document in cursor {
            let document = document.map_err(|e| MigrateError::persistence(operation, e))?;
            records.push(decode_record(&document)?);
        }
        Ok(records)
    }
}

impl VersionStore for MongoVersionStore {
    fn list_applied(&self) -> Result<BTreeSet<MigrationVersion>> {
        Ok(self
            .scan("list applied migrations")?
            .into_iter()
            .map(|record| record.version)
            .collect())
    }

    fn record(&self, version: &MigrationVersion) -> Result<()> {
        let document = encode_record(&MigrationRecord::now(version.clone()));
        self.collection
            .insert_one(document)
            .run()
            .map_err(|e| MigrateError::persistence(format!("record migration {version}"), e))?;
        Ok(())
    }

    fn remove(&self, version: &MigrationVersion) -> Result<()> {
        self.collection
            .delete_one(doc! { "version": version.as_str() })
            .run()
            .map_err(|e| MigrateError::persistence(format!("remove migration {version}"), e))?;
        Ok(())
    }

    fn latest(&self) -> Result<Option<MigrationVersion>> {
        Ok(self
            .scan("fetch latest version")?
            .into_iter()
            .map(|record| record.version)
            .max())
    }
}

fn encode_record(record: &MigrationRecord) -> Document {
    doc! {
        "version": record.version.as_str(),
        "appliedAt": bson::DateTime::from_millis(record.applied_at.timestamp_millis()),
    }
}

fn decode_record(document: &Document) -> Result<MigrationRecord> {
    let key = document
        .get("_id")
        .map(Bson::to_string)
        .unwrap_or_else(|| "<no _id>".to_string());
    let decode_error = |message: String| MigrateError::Decode {
        key: key.clone(),
        message,
    };

    let version = document
        .get_str("version")
        .map_err(|e| decode_error(format!("version: {e}")))?;
    let applied_at = document
        .get_datetime("appliedAt")
        .map_err(|e| decode_error(format!("appliedAt: {e}")))?;
    let applied_at = DateTime::<Utc>::from_timestamp_millis(applied_at.timestamp_millis())
        .ok_or_else(|| decode_error("appliedAt out of range".to_string()))?;

    Ok(MigrationRecord {
        version: MigrationVersion::new(version),
        applied_at,
    })
}
