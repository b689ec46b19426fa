//! Prompt text builders for every generation call in the pipeline.
//!
//! Wording here is presentation, not policy: the decision logic that
//! consumes these prompts lives in the stage modules and in
//! `atende_core`.

use atende_core::dataset;

pub fn intent(history_block: &str, question: &str) -> String {
    format!(
        "{history_block}\
You route questions for an assistant that answers questions about the \
city of Rio de Janeiro's 1746 service-call dataset. Analyze the LAST \
user question below and choose exactly one plan:\n\
- sql_direct: deterministic or structural questions (counts, dates, \
neighborhoods) that need no free-text category filter.\n\
- sql_contextual: questions that filter on a textual category of the \
calls (type, category, or subtype values).\n\
- chat: greetings or general conversation that needs no data access.\n\
\n\
LAST question: \"{question}\"\n"
    )
}

pub fn rewrite(history_block: &str, question: &str) -> String {
    format!(
        "Rewrite the user's follow-up question as a short, self-contained \
search query. Use the prior conversation only to resolve references; \
extract key terms, and do not add narrative, comparisons, or any words \
the user did not imply.\n\
\n\
{history_block}\
Follow-up question: \"{question}\"\n\
\n\
Self-contained query:"
    )
}

pub fn sql(
    history_block: &str,
    schema: &str,
    category_context: &str,
    question: &str,
) -> String {
    let context_section = if category_context.is_empty() {
        String::new()
    } else {
        format!(
            "\nCATEGORY CONTEXT:\n\
Use the values below to pick the correct filter term and source column \
for the user's question.\n{category_context}\n"
        )
    };

    format!(
        "You are a Google BigQuery SQL expert. Produce a single correct, \
runnable SQL query.\n\
{history_block}\
\n\
DATABASE SCHEMA:\n{schema}\n{context_section}\
\n\
RULES:\n\
1. Table names: ALWAYS use the fully-qualified name \
(`project.dataset.table`) in FROM and JOIN clauses.\n\
2. Text filters: ALWAYS wrap the column in LOWER() and prefer LIKE for \
flexible matching (e.g. WHERE LOWER(tipo) LIKE '%iluminação pública%'). \
When the target column is ambiguous, prefer `{preferred}`; when the \
category context names a source column, use that column.\n\
3. Date filters: always use the `{date_column}` column. For a single \
day use DATE({date_column}) = 'YYYY-MM-DD'; for ranges use \
DATE({date_column}) BETWEEN 'YYYY-MM-DD' AND 'YYYY-MM-DD'.\n\
4. Column selection: NEVER use SELECT *; select only the columns the \
question needs.\n\
5. Output: return ONLY the SQL text, with no explanation and no \
markdown fences.\n\
\n\
USER QUESTION:\n\"{question}\"\n\
\n\
SQL:",
        preferred = dataset::PREFERRED_TEXT_COLUMN,
        date_column = dataset::DATE_COLUMN,
    )
}

pub fn synthesis(question: &str, rows_json: &str) -> String {
    format!(
        "You are a data-analysis assistant. Answer the user's original \
question clearly and directly, based only on the rows returned by the \
database.\n\
\n\
Original question:\n\"{question}\"\n\
\n\
Returned rows (JSON):\n{rows_json}\n\
\n\
Your answer:"
    )
}

pub fn chat(history_block: &str, question: &str) -> String {
    format!(
        "You are a friendly assistant for questions about Rio de \
Janeiro's 1746 service hotline. Reply conversationally to the user.\n\
{history_block}\
Question: \"{question}\"\n"
    )
}
