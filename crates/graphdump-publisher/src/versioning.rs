//! Dataset versioning.
//!
//! Each run registers one new `dcat:Dataset` with one distribution per
//! artifact, then retires the revisions that came before it. Retiring either
//! deprecates the last revision (linking the new dataset to it through
//! `prov:wasRevisionOf` and bumping its `dct:modified`) or purges every older
//! revision together with its files.
//!
//! The writes are separate updates against the store. A crash between them
//! leaves a partially written chain behind.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use graphdump_core::sparql::{escape_datetime, escape_int, escape_string, escape_uri};
use graphdump_core::vocab::{DATASET_TITLE, DATASET_TYPE, PREFIXES};
use graphdump_core::{
    DatasetUri, DistributionFormat, DistributionUri, DumpArtifacts, LogicalFileUri,
    PhysicalFileUri, PreviousRevision,
};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::PipelineError;
use crate::files;
use crate::store::Store;

/// What happened to the revisions preceding a new dataset.
#[derive(Debug)]
pub enum Retirement {
    /// Retain mode: the last revision, if there was one, now points forward.
    Deprecated(Option<DatasetUri>),
    /// Cleanup mode: older revisions were deleted.
    Purged(CleanupReport),
}

/// Result of registering a dump.
#[derive(Debug)]
pub struct Publication {
    pub dataset: DatasetUri,
    pub distributions: Vec<DistributionUri>,
    pub retirement: Retirement,
}

/// How a single cleanup item ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// Distribution, file records, dataset and file on disk removed.
    Purged,
    /// No file records found; only the dataset was removed.
    FileMetadataMissing,
}

/// Aggregate of independent cleanup attempts.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub purged: Vec<PreviousRevision>,
    pub missing_metadata: Vec<PreviousRevision>,
    pub failures: Vec<(PreviousRevision, String)>,
}

impl CleanupReport {
    /// Fold one attempt into the report.
    pub fn record(
        mut self,
        revision: PreviousRevision,
        attempt: Result<CleanupOutcome, PipelineError>,
    ) -> Self {
        match attempt {
            Ok(CleanupOutcome::Purged) => self.purged.push(revision),
            Ok(CleanupOutcome::FileMetadataMissing) => self.missing_metadata.push(revision),
            Err(e) => self.failures.push((revision, e.to_string())),
        }
        self
    }

    pub fn attempted(&self) -> usize {
        self.purged.len() + self.missing_metadata.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes and retires dataset revisions for the configured subject.
pub struct DatasetManager {
    store: Arc<dyn Store>,
    config: Arc<Config>,
}

impl DatasetManager {
    pub fn new(store: Arc<dyn Store>, config: Arc<Config>) -> Self {
        Self { store, config }
    }

    /// Register `artifacts` as a new revision and retire the previous ones.
    ///
    /// If a distribution cannot be registered, the new dataset and the
    /// distributions written so far are removed again before the error is
    /// returned.
    pub async fn publish(&self, artifacts: &DumpArtifacts) -> Result<Publication, PipelineError> {
        let dataset = self.create_dataset().await?;

        let mut distributions = Vec::new();
        for (path, format) in artifacts.distributions() {
            match self.create_distribution(&dataset, path, format).await {
                Ok(distribution) => distributions.push(distribution),
                Err(e) => {
                    self.discard(PreviousRevision {
                        dataset,
                        distributions,
                    })
                    .await;
                    return Err(e);
                }
            }
        }

        let retirement = if self.config.cleanup_old_dumps {
            Retirement::Purged(self.purge_previous(&dataset).await?)
        } else {
            Retirement::Deprecated(self.retain_and_deprecate(&dataset).await?)
        };

        Ok(Publication {
            dataset,
            distributions,
            retirement,
        })
    }

    /// Remove the metadata of a half-written revision. Files stay on disk.
    async fn discard(&self, revision: PreviousRevision) {
        match self.remove_revision(&revision, false).await {
            Ok(_) => warn!(dataset = %revision.dataset, "Incomplete dataset removed"),
            Err(e) => error!(
                dataset = %revision.dataset,
                error = %e,
                "Failed to remove incomplete dataset"
            ),
        }
    }

    /// Insert a new dataset for the subject and return its URI.
    pub async fn create_dataset(&self) -> Result<DatasetUri, PipelineError> {
        let minted = DatasetUri::generate();
        let now = escape_datetime(Utc::now());

        self.store
            .update(&format!(
                r#"
      {PREFIXES}

      INSERT DATA {{
        GRAPH {graph} {{
          {dataset} a dcat:Dataset ;
            mu:uuid {uuid} ;
            dct:type {dataset_type} ;
            dct:subject {subject} ;
            dct:created {now} ;
            dct:modified {now} ;
            dct:issued {now} ;
            dct:title {title} .
        }}
      }}
    "#,
                graph = escape_uri(&self.config.dataset_graph),
                dataset = escape_uri(minted.uri.as_str()),
                uuid = escape_string(&minted.uuid),
                dataset_type = escape_uri(DATASET_TYPE),
                subject = escape_uri(&self.config.dataset_subject),
                title = escape_string(DATASET_TITLE),
            ))
            .await?;

        info!(dataset = %minted.uri, "Generated dataset");
        Ok(minted.uri)
    }

    /// Register the file at `path` as a distribution of `dataset`.
    ///
    /// The distribution title is derived from the dataset title inside the
    /// update, so `dataset` must exist already.
    pub async fn create_distribution(
        &self,
        dataset: &DatasetUri,
        path: &Path,
        format: DistributionFormat,
    ) -> Result<DistributionUri, PipelineError> {
        let stats = files::file_stats(path).await?;
        let physical = PhysicalFileUri::from_path(path, &self.config.share_dir)?;
        let logical = LogicalFileUri::generate();
        let physical_uuid = uuid::Uuid::new_v4().to_string();
        let distribution = DistributionUri::generate();

        let now = escape_datetime(Utc::now());
        let created = escape_datetime(stats.created);
        let size = escape_int(i64::try_from(stats.size).unwrap_or(i64::MAX));
        let media_type = escape_string(format.media_type());
        let name = escape_string(&stats.name);
        let extension = escape_string(&stats.extension);
        let final_title = match format.title_suffix() {
            Some(suffix) => format!("CONCAT(?title, {})", escape_string(suffix)),
            None => "?title".to_string(),
        };

        self.store
            .update(&format!(
                r#"
      {PREFIXES}

      INSERT {{
        GRAPH {files_graph} {{
          {logical} a nfo:FileDataObject ;
            mu:uuid {logical_uuid} ;
            nfo:fileName {name} ;
            dct:format {media_type} ;
            nfo:fileSize {size} ;
            dbpedia:fileExtension {extension} ;
            dct:creator {creator} ;
            dct:created {created} .

          {physical} a nfo:FileDataObject ;
            mu:uuid {physical_uuid} ;
            nfo:fileName {name} ;
            dct:format {media_type} ;
            nfo:fileSize {size} ;
            dbpedia:fileExtension {extension} ;
            dct:created {created} ;
            nie:dataSource {logical} .
        }}
        GRAPH {dataset_graph} {{
          {distribution} a dcat:Distribution ;
            mu:uuid {distribution_uuid} ;
            dct:subject {logical} ;
            dct:created {now} ;
            dct:modified {now} ;
            dct:issued {now} ;
            dcat:byteSize {size} ;
            dct:format {media_type} ;
            dct:title ?finalTitle .
          ?dataset dcat:distribution {distribution} .
        }}
      }}
      WHERE {{
        BIND({dataset} as ?dataset)
        GRAPH {dataset_graph} {{
          ?dataset dct:title ?title
        }}
        BIND({final_title} as ?finalTitle)
      }}
    "#,
                files_graph = escape_uri(&self.config.files_graph),
                dataset_graph = escape_uri(&self.config.dataset_graph),
                logical = escape_uri(logical.uri.as_str()),
                logical_uuid = escape_string(&logical.uuid),
                physical = escape_uri(physical.as_str()),
                physical_uuid = escape_string(&physical_uuid),
                creator = escape_uri(&self.config.service_name),
                distribution = escape_uri(distribution.uri.as_str()),
                distribution_uuid = escape_string(&distribution.uuid),
                dataset = escape_uri(dataset.as_str()),
            ))
            .await?;

        info!(
            dataset = %dataset,
            distribution = %distribution.uri,
            file = %physical,
            format = format.media_type(),
            "Generated distribution"
        );
        Ok(distribution.uri)
    }

    /// Datasets of the subject other than `current`, with their distributions.
    ///
    /// With `last_revision_only`, only datasets no newer dataset is a revision
    /// of are returned, and more than one such dataset is a consistency error.
    pub async fn find_previous_datasets(
        &self,
        current: &DatasetUri,
        last_revision_only: bool,
    ) -> Result<Vec<PreviousRevision>, PipelineError> {
        let revision_filter = if last_revision_only {
            "FILTER NOT EXISTS { ?newerVersion prov:wasRevisionOf ?dataset . }"
        } else {
            ""
        };

        let results = self
            .store
            .query(&format!(
                r#"
    {PREFIXES}
    SELECT DISTINCT ?dataset ?distribution
    WHERE {{
      GRAPH {graph} {{
        ?dataset a dcat:Dataset ;
          dct:type {dataset_type} ;
          dct:subject {subject} .
        OPTIONAL {{ ?dataset dcat:distribution ?distribution . }}
        {revision_filter}
      }}
      FILTER ( ?dataset NOT IN ({current}) )
    }}
    "#,
                graph = escape_uri(&self.config.dataset_graph),
                dataset_type = escape_uri(DATASET_TYPE),
                subject = escape_uri(&self.config.dataset_subject),
                current = escape_uri(current.as_str()),
            ))
            .await?;

        let mut grouped: BTreeMap<String, Vec<DistributionUri>> = BTreeMap::new();
        for row in results.rows() {
            let distributions = grouped.entry(row.uri("dataset")?.to_string()).or_default();
            if row.get("distribution").is_some() {
                distributions.push(DistributionUri::new(row.uri("distribution")?));
            }
        }

        if last_revision_only && grouped.len() > 1 {
            return Err(PipelineError::Consistency {
                subject: self.config.dataset_subject.clone(),
                found: grouped.into_keys().collect(),
            });
        }

        Ok(grouped
            .into_iter()
            .map(|(dataset, distributions)| PreviousRevision {
                dataset: DatasetUri::new(dataset),
                distributions,
            })
            .collect())
    }

    /// Link `current` to the last revision and mark that revision as modified.
    ///
    /// Returns the deprecated dataset, or `None` for the first revision.
    pub async fn retain_and_deprecate(
        &self,
        current: &DatasetUri,
    ) -> Result<Option<DatasetUri>, PipelineError> {
        let revisions = self.find_previous_datasets(current, true).await?;
        let Some(previous) = revisions.into_iter().next().map(|r| r.dataset) else {
            info!(dataset = %current, "No previous dataset to deprecate");
            return Ok(None);
        };
        info!(previous = %previous, "Found previous dataset");

        let graph = escape_uri(&self.config.dataset_graph);
        let previous_uri = escape_uri(previous.as_str());

        self.store
            .update(&format!(
                r#"
        {PREFIXES}
        INSERT DATA {{
          GRAPH {graph} {{
            {current} prov:wasRevisionOf {previous_uri} .
          }}
        }}
      "#,
                current = escape_uri(current.as_str()),
            ))
            .await?;

        info!(previous = %previous, "Deprecating distributions belonging to previous dataset");
        self.store
            .update(&format!(
                r#"
      {PREFIXES}
      DELETE {{
        GRAPH {graph} {{
          {previous_uri} dct:modified ?datasetModified .
          ?distribution dct:modified ?distributionModified .
        }}
      }} WHERE {{
        GRAPH {graph} {{
          {previous_uri} dct:modified ?datasetModified .
          OPTIONAL {{
            {previous_uri} dcat:distribution ?distribution .
            ?distribution dct:modified ?distributionModified .
          }}
        }}
      }}
    "#
            ))
            .await?;

        self.store
            .update(&format!(
                r#"
      {PREFIXES}
      INSERT {{
        GRAPH {graph} {{
          {previous_uri} dct:modified {now} .
          ?distribution dct:modified {now} .
        }}
      }} WHERE {{
        GRAPH {graph} {{
          {previous_uri} a dcat:Dataset .
          OPTIONAL {{ {previous_uri} dcat:distribution ?distribution . }}
        }}
      }}
    "#,
                now = escape_datetime(Utc::now()),
            ))
            .await?;

        Ok(Some(previous))
    }

    /// Delete every revision of the subject other than `current`.
    ///
    /// Only failing to list the revisions is an error; each revision is
    /// cleaned up on its own and failures end up in the report.
    pub async fn purge_previous(&self, current: &DatasetUri) -> Result<CleanupReport, PipelineError> {
        let revisions = self.find_previous_datasets(current, false).await?;

        let mut report = CleanupReport::default();
        for revision in revisions {
            let attempt = self.remove_revision(&revision, true).await;
            if let Err(e) = &attempt {
                error!(
                    dataset = %revision.dataset,
                    error = %e,
                    "Something went wrong cleaning up previous revision"
                );
            }
            report = report.record(revision, attempt);
        }

        info!(
            attempted = report.attempted(),
            purged = report.purged.len(),
            missing_metadata = report.missing_metadata.len(),
            failed = report.failures.len(),
            "Cleanup of previous revisions finished"
        );
        Ok(report)
    }

    /// Remove a revision: file records of each distribution, then the
    /// distributions and the dataset from every graph, then (if asked) the
    /// files on disk.
    async fn remove_revision(
        &self,
        revision: &PreviousRevision,
        delete_files: bool,
    ) -> Result<CleanupOutcome, PipelineError> {
        let mut physical_files = Vec::new();
        let mut metadata_missing = false;

        for distribution in &revision.distributions {
            match self.distribution_file(distribution).await? {
                Some((logical, physical)) => {
                    self.delete_file_records(&logical).await?;
                    physical_files.push(physical);
                }
                None => {
                    warn!(
                        distribution = %distribution,
                        "No (meta) file data found for distribution"
                    );
                    metadata_missing = true;
                }
            }
        }

        let subjects: Vec<String> = std::iter::once(escape_uri(revision.dataset.as_str()))
            .chain(revision.distributions.iter().map(|d| escape_uri(d.as_str())))
            .collect();
        self.store
            .update(&format!(
                r#"
          DELETE {{
            GRAPH ?g {{
              ?s ?p ?o .
            }}
          }}
          WHERE {{
            VALUES ?s {{
              {subjects}
            }}
            GRAPH ?g {{
              ?s ?p ?o .
            }}
          }}
        "#,
                subjects = subjects.join("\n              "),
            ))
            .await?;

        if delete_files {
            for physical in physical_files {
                match physical.to_path(&self.config.share_dir) {
                    Ok(path) => files::delete_file(&path).await?,
                    Err(e) => warn!(file = %physical, error = %e, "Not deleting file outside the share"),
                }
            }
        }

        info!(
            dataset = %revision.dataset,
            distributions = revision.distributions.len(),
            "Revision removed"
        );
        Ok(if metadata_missing {
            CleanupOutcome::FileMetadataMissing
        } else {
            CleanupOutcome::Purged
        })
    }

    async fn distribution_file(
        &self,
        distribution: &DistributionUri,
    ) -> Result<Option<(LogicalFileUri, PhysicalFileUri)>, PipelineError> {
        let results = self
            .store
            .query(&format!(
                r#"
          {PREFIXES}

          SELECT DISTINCT ?logicalFileUri ?physicalFile
          WHERE {{
            GRAPH {dataset_graph} {{
              {distribution} dct:subject ?logicalFileUri .
            }}
            GRAPH {files_graph} {{
              ?physicalFile nie:dataSource ?logicalFileUri .
            }}
          }}
        "#,
                dataset_graph = escape_uri(&self.config.dataset_graph),
                files_graph = escape_uri(&self.config.files_graph),
                distribution = escape_uri(distribution.as_str()),
            ))
            .await?;

        match results.rows().first() {
            Some(row) => Ok(Some((
                LogicalFileUri::new(row.uri("logicalFileUri")?),
                PhysicalFileUri::new(row.uri("physicalFile")?),
            ))),
            None => Ok(None),
        }
    }

    async fn delete_file_records(&self, logical: &LogicalFileUri) -> Result<(), PipelineError> {
        self.store
            .update(&format!(
                r#"
          {PREFIXES}
          DELETE {{
            GRAPH {files_graph} {{
              ?physicalFile ?pp ?po .
              ?logicalFile ?lp ?lo .
            }}
          }}
          WHERE {{
            VALUES ?logicalFile {{ {logical} }}
            GRAPH {files_graph} {{
              ?physicalFile nie:dataSource ?logicalFile ;
                ?pp ?po .
              ?logicalFile ?lp ?lo .
            }}
          }}
        "#,
                files_graph = escape_uri(&self.config.files_graph),
                logical = escape_uri(logical.as_str()),
            ))
            .await?;
        Ok(())
    }
}
