//! Vocabulary constants shared by every query the service builds.

pub const PREFIXES: &str = r#"
  PREFIX mu: <http://mu.semte.ch/vocabularies/core/>
  PREFIX task: <http://redpencil.data.gift/vocabularies/tasks/>
  PREFIX dct: <http://purl.org/dc/terms/>
  PREFIX prov: <http://www.w3.org/ns/prov#>
  PREFIX nie: <http://www.semanticdesktop.org/ontologies/2007/01/19/nie#>
  PREFIX ext: <http://mu.semte.ch/vocabularies/ext/>
  PREFIX oslc: <http://open-services.net/ns/core#>
  PREFIX cogs: <http://vocab.deri.ie/cogs#>
  PREFIX adms: <http://www.w3.org/ns/adms#>
  PREFIX nfo: <http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#>
  PREFIX dbpedia: <http://dbpedia.org/resource/>
  PREFIX dcat: <http://www.w3.org/ns/dcat#>
  PREFIX rdf: <http://www.w3.org/1999/02/22-rdf-syntax-ns#>
"#;

pub const ADMS_STATUS: &str = "http://www.w3.org/ns/adms#status";

pub const JOB_TYPE: &str = "http://vocab.deri.ie/cogs#Job";
pub const TASK_TYPE: &str = "http://redpencil.data.gift/vocabularies/tasks/Task";
pub const DATA_CONTAINER_TYPE: &str =
    "http://www.semanticdesktop.org/ontologies/2007/03/22/nfo#DataContainer";

/// `dct:type` tag carried by every dump dataset.
pub const DATASET_TYPE: &str = "http://data.lblod.info/vocabularies/datasets/DeltaCacheGraphDump";
pub const DATASET_TITLE: &str = "Delta producer cache graph dump";

pub const DEFAULT_OPERATION: &str =
    "http://redpencil.data.gift/id/jobs/concept/TaskOperation/deltas/deltaDumpFileCreation";

pub const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
pub const XSD_DATETIME: &str = "http://www.w3.org/2001/XMLSchema#dateTime";

pub const SHARE_SCHEME: &str = "share://";
