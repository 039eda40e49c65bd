//! [`SqliteStore`], the SQLite implementation of [`ReportStore`].

use std::path::Path;

use chrono::Utc;
use proreporter_core::{
  insight::InsightState,
  report::{NewReport, NewShare, Report, ReportSummary, Share, User},
  store::ReportStore,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    REPORT_COLUMNS, RawReport, RawShare, RawSummary, RawUser, SHARE_COLUMNS,
    encode_dataset, encode_dt, encode_insights, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A report store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

/// Outcome of the guarded share insert, decided on the database thread.
enum ShareInsert {
  Inserted,
  NotOwned,
  Duplicate,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ReportStore impl ────────────────────────────────────────────────────────

impl ReportStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn register_user(&self, id: Uuid, username: &str) -> Result<User> {
    let id_str = encode_uuid(id);
    let name   = username.to_owned();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (user_id, username) VALUES (?1, ?2)
           ON CONFLICT (user_id) DO UPDATE SET username = excluded.username",
          rusqlite::params![id_str, name],
        )?;
        Ok(())
      })
      .await?;

    Ok(User { id, username: username.to_owned() })
  }

  async fn find_user(&self, username: &str) -> Result<Option<User>> {
    let name = username.to_owned();

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT user_id, username FROM users WHERE username = ?1",
            rusqlite::params![name],
            |row| Ok(RawUser { user_id: row.get(0)?, username: row.get(1)? }),
          )
          .optional()?)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  // ── Reports ───────────────────────────────────────────────────────────────

  async fn create_report(&self, input: NewReport) -> Result<Report> {
    let report = Report {
      id:          Uuid::new_v4(),
      title:       input.title,
      description: input.description,
      data:        input.data,
      insights:    None,
      user_id:     input.user_id,
      created_at:  Utc::now(),
    };

    let id_str      = encode_uuid(report.id);
    let owner_str   = encode_uuid(report.user_id);
    let title       = report.title.clone();
    let description = report.description.clone();
    let data_str    = encode_dataset(&report.data)?;
    let at_str      = encode_dt(report.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO reports (report_id, user_id, title, description, data_json, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, owner_str, title, description, data_str, at_str],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(report_id = %report.id, rows = report.data.len(), "report created");
    Ok(report)
  }

  async fn get_report(&self, id: Uuid) -> Result<Option<Report>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawReport> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {REPORT_COLUMNS} FROM reports r WHERE r.report_id = ?1"),
            rusqlite::params![id_str],
            |row| RawReport::from_row(row, 0),
          )
          .optional()?)
      })
      .await?;

    raw.map(RawReport::into_report).transpose()
  }

  async fn list_reports(&self, owner: Uuid) -> Result<Vec<ReportSummary>> {
    let owner_str = encode_uuid(owner);

    let raws: Vec<RawSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT report_id, title, description,
                  COALESCE(json_array_length(insights_json, '$.charts'), 0),
                  created_at
           FROM reports
           WHERE user_id = ?1
           ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], |row| {
            Ok(RawSummary {
              report_id:   row.get(0)?,
              title:       row.get(1)?,
              description: row.get(2)?,
              chart_count: row.get(3)?,
              created_at:  row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSummary::into_summary).collect()
  }

  async fn save_insights(
    &self,
    id:       Uuid,
    owner:    Uuid,
    insights: &InsightState,
  ) -> Result<()> {
    let id_str       = encode_uuid(id);
    let owner_str    = encode_uuid(owner);
    let insights_str = encode_insights(insights)?;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE reports SET insights_json = ?1 WHERE report_id = ?2 AND user_id = ?3",
          rusqlite::params![insights_str, id_str, owner_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ReportNotFound(id));
    }
    Ok(())
  }

  async fn delete_report(&self, id: Uuid, owner: Uuid) -> Result<()> {
    let id_str    = encode_uuid(id);
    let owner_str = encode_uuid(owner);

    // Shares go with the report via ON DELETE CASCADE.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM reports WHERE report_id = ?1 AND user_id = ?2",
          rusqlite::params![id_str, owner_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::ReportNotFound(id));
    }
    tracing::debug!(report_id = %id, "report deleted");
    Ok(())
  }

  // ── Sharing ───────────────────────────────────────────────────────────────

  async fn share_report(&self, input: NewShare) -> Result<Share> {
    if input.shared_by == input.shared_with {
      return Err(Error::SelfShare);
    }

    let share = Share {
      id:          Uuid::new_v4(),
      report_id:   input.report_id,
      shared_by:   input.shared_by,
      shared_with: input.shared_with,
      created_at:  Utc::now(),
    };

    let share_id_str  = encode_uuid(share.id);
    let report_id_str = encode_uuid(share.report_id);
    let by_str        = encode_uuid(share.shared_by);
    let with_str      = encode_uuid(share.shared_with);
    let at_str        = encode_dt(share.created_at);

    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let owned = tx
          .query_row(
            "SELECT 1 FROM reports WHERE report_id = ?1 AND user_id = ?2",
            rusqlite::params![report_id_str, by_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !owned {
          return Ok(ShareInsert::NotOwned);
        }

        let inserted = tx.execute(
          "INSERT INTO shared_reports (share_id, report_id, shared_by, shared_with, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![share_id_str, report_id_str, by_str, with_str, at_str],
        );
        match inserted {
          Ok(_) => {}
          Err(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
          {
            return Ok(ShareInsert::Duplicate);
          }
          Err(e) => return Err(e.into()),
        }

        tx.commit()?;
        Ok(ShareInsert::Inserted)
      })
      .await?;

    match outcome {
      ShareInsert::Inserted => Ok(share),
      ShareInsert::NotOwned => Err(Error::ReportNotFound(share.report_id)),
      ShareInsert::Duplicate => Err(Error::AlreadyShared {
        report_id:   share.report_id,
        shared_with: share.shared_with,
      }),
    }
  }

  async fn resolve_share(&self, share_id: Uuid) -> Result<Option<(Share, Report)>> {
    let id_str = encode_uuid(share_id);

    let raw: Option<(RawShare, RawReport)> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {SHARE_COLUMNS}, {REPORT_COLUMNS}
               FROM shared_reports s
               JOIN reports r ON r.report_id = s.report_id
               WHERE s.share_id = ?1"
            ),
            rusqlite::params![id_str],
            |row| Ok((RawShare::from_row(row)?, RawReport::from_row(row, 5)?)),
          )
          .optional()?)
      })
      .await?;

    raw
      .map(|(share, report)| Ok((share.into_share()?, report.into_report()?)))
      .transpose()
  }

  async fn list_shared_with(&self, user: Uuid) -> Result<Vec<Share>> {
    let user_str = encode_uuid(user);

    let raws: Vec<RawShare> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {SHARE_COLUMNS}
           FROM shared_reports s
           WHERE s.shared_with = ?1
           ORDER BY s.created_at DESC, s.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![user_str], RawShare::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawShare::into_share).collect()
  }
}
