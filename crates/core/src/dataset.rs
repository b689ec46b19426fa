//! Fixed facts about the 1746 service-call dataset.
//!
//! These are properties of the public warehouse tables, not deployment
//! configuration, so they live here rather than in `config`.

/// Service calls opened through the 1746 hotline.
pub const CALLS_TABLE: &str = "datario.adm_central_atendimento_1746.chamado";

/// Master table of city neighborhoods, joinable from the calls table.
pub const NEIGHBORHOODS_TABLE: &str = "datario.dados_mestres.bairro";

/// Every table a generated query may reference.
pub const ALLOWED_TABLES: [&str; 2] = [CALLS_TABLE, NEIGHBORHOODS_TABLE];

/// Free-text classification columns of the calls table, from coarsest to
/// finest. Their distinct values feed the category index and the
/// enumeration fallback.
pub const CATEGORICAL_COLUMNS: [&str; 3] = ["tipo", "categoria", "subtipo"];

/// The single column all temporal filters must use.
pub const DATE_COLUMN: &str = "data_inicio";

/// Classification column to prefer when a text filter is ambiguous.
pub const PREFERRED_TEXT_COLUMN: &str = "subtipo";
