use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::guardian::GuardianProvider;
use crate::participation::EVENT_DATE_FORMAT;
use crate::player::models::Gender;
use crate::player::service::PlayerService;
use crate::player::types::PlayerSubmission;
use crate::shared::AppError;

/// Flat row shape shared with the administrative CSV screens. The first
/// four columns describe the guardian, the last three the player.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvRow {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub region: String,
    pub player_name: String,
    pub dob: String,
    pub gender: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowFailure {
    /// 1-based line number in the source file, counting the header
    pub line: usize,
    pub reason: String,
}

/// Per-row outcome tally for one import batch. A malformed row lands here
/// instead of aborting the batch.
#[derive(Debug, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped_duplicates: usize,
    pub failures: Vec<RowFailure>,
}

/// Bulk import/export against the same validation path as the guardian
/// self-service flow
pub struct ImportService {
    players: Arc<PlayerService>,
    guardians: Arc<dyn GuardianProvider + Send + Sync>,
}

impl ImportService {
    pub fn new(
        players: Arc<PlayerService>,
        guardians: Arc<dyn GuardianProvider + Send + Sync>,
    ) -> Self {
        Self { players, guardians }
    }

    /// Imports player rows, accumulating per-row failures into the report.
    /// Hard backend errors still abort; everything row-local does not.
    #[instrument(skip(self, reader))]
    pub async fn import_rows<R: Read>(&self, reader: R) -> Result<ImportReport, AppError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut report = ImportReport::default();

        for (row_number, parsed) in csv_reader.deserialize::<CsvRow>().enumerate() {
            // Header occupies line 1
            let line = row_number + 2;

            let row = match parsed {
                Ok(row) => row,
                Err(err) => {
                    warn!(line, error = %err, "Skipping malformed CSV row");
                    report.failures.push(RowFailure {
                        line,
                        reason: format!("malformed row: {}", err),
                    });
                    continue;
                }
            };

            match self.import_row(&row).await {
                Ok(()) => report.imported += 1,
                Err(AppError::Duplicate(_)) => report.skipped_duplicates += 1,
                Err(AppError::Validation { field, message }) => {
                    report.failures.push(RowFailure {
                        line,
                        reason: format!("{}: {}", field, message),
                    });
                }
                Err(AppError::NotFound(reason)) => {
                    report.failures.push(RowFailure { line, reason });
                }
                Err(err) => return Err(err),
            }
        }

        info!(
            imported = report.imported,
            skipped_duplicates = report.skipped_duplicates,
            failures = report.failures.len(),
            "CSV import finished"
        );
        Ok(report)
    }

    async fn import_row(&self, row: &CsvRow) -> Result<(), AppError> {
        let guardian = self
            .guardians
            .find_by_email(row.email.trim())
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("no guardian account for email {}", row.email))
            })?;

        let (first_name, last_name) = split_player_name(&row.player_name)?;
        let date_of_birth = parse_dob(&row.dob)?;
        let gender = Gender::from_str(row.gender.trim())
            .map_err(|_| AppError::validation("gender", format!("unknown gender '{}'", row.gender)))?;

        let region = Some(row.region.trim())
            .filter(|r| !r.is_empty())
            .map(str::to_string);

        self.players
            .submit(
                &guardian.guardian_id,
                PlayerSubmission {
                    first_name,
                    last_name,
                    date_of_birth,
                    gender,
                    national_insurance_number: None,
                    medical_conditions: None,
                    region,
                },
            )
            .await?;
        Ok(())
    }

    /// Writes every guardian's roster as flat rows in the shared shape
    #[instrument(skip(self, writer))]
    pub async fn export_rows<W: Write>(&self, writer: W) -> Result<usize, AppError> {
        let repository = self.players.repository();
        let mut csv_writer = csv::Writer::from_writer(writer);
        let mut exported = 0;

        for guardian_id in repository.list_guardians().await? {
            let profile = self.guardians.get_profile(&guardian_id).await?;
            let (email, first, last, guardian_region) = match &profile {
                Some(p) => {
                    let mut names = p.display_name.splitn(2, ' ');
                    (
                        p.email.clone(),
                        names.next().unwrap_or("").to_string(),
                        names.next().unwrap_or("").to_string(),
                        p.region.clone(),
                    )
                }
                None => (String::new(), String::new(), String::new(), None),
            };

            for record in repository.list(&guardian_id).await? {
                let region = record
                    .region
                    .clone()
                    .or_else(|| guardian_region.clone())
                    .unwrap_or_default();
                csv_writer
                    .serialize(CsvRow {
                        email: email.clone(),
                        first_name: first.clone(),
                        last_name: last.clone(),
                        region,
                        player_name: record.full_name(),
                        dob: record.date_of_birth.format(EVENT_DATE_FORMAT).to_string(),
                        gender: record.gender.to_string(),
                    })
                    .map_err(|e| AppError::Backend(e.to_string()))?;
                exported += 1;
            }
        }

        csv_writer
            .flush()
            .map_err(|e| AppError::Backend(e.to_string()))?;
        Ok(exported)
    }
}

fn split_player_name(player_name: &str) -> Result<(String, String), AppError> {
    match player_name.trim().split_once(' ') {
        Some((first, last)) if !first.is_empty() && !last.trim().is_empty() => {
            Ok((first.to_string(), last.trim().to_string()))
        }
        _ => Err(AppError::validation(
            "player_name",
            "expected \"first last\"",
        )),
    }
}

fn parse_dob(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), EVENT_DATE_FORMAT).map_err(|_| {
        AppError::validation("dob", format!("expected DD/MM/YYYY, got '{}'", raw))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::cache::PageCache;
    use crate::eligibility::AgeBrackets;
    use crate::guardian::{GuardianProfile, InMemoryGuardianProvider};
    use crate::player::repository::InMemoryPlayerRepository;

    async fn service() -> (ImportService, Arc<PlayerService>) {
        let players = Arc::new(PlayerService::new(
            Arc::new(InMemoryPlayerRepository::new()),
            Arc::new(PageCache::with_default_ttl()),
            AgeBrackets::default(),
        ));
        let guardians = Arc::new(InMemoryGuardianProvider::new());
        guardians
            .register(GuardianProfile {
                guardian_id: "g-1".to_string(),
                email: "dana@example.com".to_string(),
                display_name: "Dana Keller".to_string(),
                region: Some("Zurich".to_string()),
            })
            .await;

        (
            ImportService::new(Arc::clone(&players), guardians),
            players,
        )
    }

    const HEADER: &str = "email,first_name,last_name,region,player_name,dob,gender\n";

    #[tokio::test]
    async fn imports_well_formed_rows() {
        let (import, players) = service().await;
        let csv = format!(
            "{}dana@example.com,Dana,Keller,Zurich,Mia Keller,02/03/2017,female\n\
             dana@example.com,Dana,Keller,Zurich,Noah Keller,20/08/2015,male\n",
            HEADER
        );

        let report = import.import_rows(csv.as_bytes()).await.unwrap();

        assert_eq!(report.imported, 2);
        assert_eq!(report.skipped_duplicates, 0);
        assert!(report.failures.is_empty());

        let roster = players.list("g-1").await.unwrap();
        assert_eq!(roster.len(), 2);
        assert_eq!(roster[0].first_name, "Mia");
        assert_eq!(roster[0].region.as_deref(), Some("Zurich"));
    }

    #[tokio::test]
    async fn bad_rows_do_not_abort_the_batch() {
        let (import, players) = service().await;
        let csv = format!(
            "{}dana@example.com,Dana,Keller,Zurich,Mia Keller,02/03/2017,female\n\
             unknown@example.com,Ann,Other,Bern,Tim Other,01/01/2016,male\n\
             dana@example.com,Dana,Keller,Zurich,OneName,01/01/2016,male\n\
             dana@example.com,Dana,Keller,Zurich,Ben Keller,2016-01-01,male\n\
             dana@example.com,Dana,Keller,Zurich,Eva Keller,01/01/2016,unsure\n",
            HEADER
        );

        let report = import.import_rows(csv.as_bytes()).await.unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.failures.len(), 4);
        assert_eq!(report.failures[0].line, 3);
        assert!(report.failures[0].reason.contains("no guardian account"));
        assert!(report.failures[1].reason.contains("player_name"));
        assert!(report.failures[2].reason.contains("DD/MM/YYYY"));
        assert!(report.failures[3].reason.contains("gender"));

        assert_eq!(players.list("g-1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_rows_are_tallied_separately() {
        let (import, _) = service().await;
        let csv = format!(
            "{}dana@example.com,Dana,Keller,Zurich,Mia Keller,02/03/2017,female\n\
             dana@example.com,Dana,Keller,Zurich,Mia Keller,02/03/2017,female\n",
            HEADER
        );

        let report = import.import_rows(csv.as_bytes()).await.unwrap();

        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped_duplicates, 1);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn missing_columns_are_row_failures() {
        let (import, _) = service().await;
        let csv = format!("{}dana@example.com,Dana,Keller\n", HEADER);

        let report = import.import_rows(csv.as_bytes()).await.unwrap();

        assert_eq!(report.imported, 0);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].line, 2);
    }

    #[tokio::test]
    async fn export_round_trips_the_roster() {
        let (import, _) = service().await;
        let csv = format!(
            "{}dana@example.com,Dana,Keller,Zurich,Mia Keller,02/03/2017,female\n",
            HEADER
        );
        import.import_rows(csv.as_bytes()).await.unwrap();

        let mut out = Vec::new();
        let exported = import.export_rows(&mut out).await.unwrap();
        assert_eq!(exported, 1);

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("dana@example.com"));
        assert!(text.contains("Mia Keller"));
        assert!(text.contains("02/03/2017"));
        assert!(text.contains("female"));
    }
}
