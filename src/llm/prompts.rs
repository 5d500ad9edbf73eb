//! Prompt templates and data summaries for LLM calls
//!
//! Every prompt in the pipeline lives here so the anti-hallucination rules
//! stay reviewable in one place.

use crate::catalog;
use crate::types::{RetrievalStrategy, RetrievedData, SqlValue};

/// System prompt for the LLM leg of query classification. The model must
/// answer with the JSON contract parsed by the classifier.
pub fn classification_system_prompt() -> String {
    r#"You are an expert system for classifying oceanographic data queries for ARGO float data.

ARGO floats collect oceanographic data including:
- Temperature and salinity profiles
- Biogeochemical (BGC) parameters: dissolved oxygen, pH, nitrate, chlorophyll-a
- Geographic location and temporal data
- Float metadata and deployment information

ENTITY EXTRACTION - Extract ALL relevant terms:
- Geographic: "Bay of Bengal", "Arabian Sea", "equator"
- Parameters: "temperature", "salinity", "trajectories"
- Temporal: "2022", "2023", "between 2022 and 2023"
- Profile IDs: "profile 1902681", "profile number 1902681"
- Float IDs: "float 1902681", "ARGO float 1902681"

Classify the user query into one of these categories:

1. **sql_retrieval**: Queries requesting specific data filtering, aggregation, or structured data extraction
2. **vector_retrieval**: Queries asking for patterns, summaries, or conceptual information
3. **hybrid_retrieval**: Complex queries requiring both structured data and semantic understanding

Respond with JSON format:
{
  "query_type": "sql_retrieval|vector_retrieval|hybrid_retrieval",
  "confidence": 0.8,
  "reasoning": "Brief explanation of classification",
  "extracted_entities": {
    "parameters": ["temperature"],
    "regions": ["Arabian Sea"],
    "dates": ["March 2023"],
    "float_ids": ["7900617"],
    "profile_ids": []
  }
}"#
        .to_string()
}

/// System prompt for LLM SQL generation: schema, identifier rules,
/// geographic constraints, few-shot examples.
pub fn sql_generation_system_prompt() -> String {
    format!(
        r#"You are an expert SQL generator for ARGO oceanographic database queries.

{schema}

PROFILE/FLOAT ID HANDLING - CRITICAL RULES:

1. **Profile ID queries**: "Profile 1902681" -> WHERE profile_id LIKE '1902681%'
2. **Float ID queries**: "Float 1902681" -> WHERE float_id = '1902681'
3. **NEVER ignore specific IDs mentioned by user**
4. **ALWAYS include exact ID constraints when user provides specific numbers**

CRITICAL GEOGRAPHIC CONSTRAINTS - ALWAYS APPLY THESE:

1. **Bay of Bengal**: latitude BETWEEN 5 AND 22 AND longitude BETWEEN 80 AND 100
2. **Arabian Sea**: latitude BETWEEN 10 AND 25 AND longitude BETWEEN 50 AND 80
3. **Equator/Equatorial**: latitude BETWEEN -5 AND 5
4. **Trajectories**: SELECT profile_id, float_id, latitude, longitude, profile_date

Generate ONLY the SQL query that directly answers the user's question.
Respond with a single SQL statement, nothing else.

Examples:
- "How many floats in Arabian Sea?" -> SELECT COUNT(DISTINCT float_id) FROM argo_profiles WHERE latitude BETWEEN 10 AND 25 AND longitude BETWEEN 50 AND 80
- "How many profiles in 2023?" -> SELECT COUNT(*) FROM argo_profiles WHERE EXTRACT(YEAR FROM profile_date) = 2023
- "Show profile number 1902681 trajectories as map coordinates" -> SELECT profile_id, float_id, latitude, longitude, profile_date FROM argo_profiles WHERE profile_id LIKE '1902681%' ORDER BY profile_date DESC LIMIT 200
- "Float 1234567 temperature data" -> SELECT profile_id, float_id, latitude, longitude, profile_date, temperature FROM argo_profiles WHERE float_id = '1234567' AND temperature IS NOT NULL ORDER BY profile_date DESC LIMIT 100
- "Bay of Bengal trajectories" -> SELECT profile_id, float_id, latitude, longitude, profile_date FROM argo_profiles WHERE latitude BETWEEN 5 AND 22 AND longitude BETWEEN 80 AND 100 ORDER BY profile_date DESC LIMIT 200
- "Temperature profiles in Indian Ocean for last month" -> SELECT profile_id, float_id, latitude, longitude, profile_date, temperature[1] as surface_temp, temperature[array_length(temperature,1)] as deep_temp FROM argo_profiles WHERE latitude BETWEEN -60 AND 30 AND longitude BETWEEN 20 AND 120 AND profile_date >= CURRENT_DATE - INTERVAL '1 month' AND temperature IS NOT NULL ORDER BY profile_date DESC LIMIT 100"#,
        schema = catalog::database_schema()
    )
}

/// System prompt for final prose generation, adapted to the shape of the
/// retrieved data. The absolute rules are the anti-hallucination contract.
pub fn response_system_prompt(
    strategy: RetrievalStrategy,
    result_count: usize,
    has_arrays: bool,
) -> String {
    let base_rules = r#"You are a database query results interpreter for ARGO oceanographic data.

ABSOLUTE RULES - NEVER BREAK THESE:
1. Report ONLY what exists in the provided database results
2. If a field contains NULL, None, or is missing - say "not available"
3. NEVER estimate, calculate, or invent any numerical values
4. NEVER provide temperature, salinity, depth, or pressure values unless they explicitly appear in the database results
5. If no oceanographic measurements exist, say so clearly"#;

    let specific = if result_count == 0 {
        r#"RESPONSE STRUCTURE:
- State clearly: "No data found matching your query"
- Suggest alternative search terms or broader criteria
- Do not provide any oceanographic analysis"#
    } else if has_arrays && result_count > 1 {
        r#"RESPONSE STRUCTURE:
1. Report the number of profiles/records found
2. For measurement arrays (temperature, salinity, pressure):
   - If arrays contain data: summarize as surface (first) and deep (last) values
   - If arrays are NULL/empty: state "[parameter] measurements not available"
3. Focus on what the actual data tells us about ocean conditions
4. Never invent array values - only use what's in the database
5. If data spans multiple years, group by year and compare conditions between years"#
    } else if result_count > 100 {
        r#"RESPONSE STRUCTURE:
1. Start with: "Found [X] records matching your query"
2. Provide summary statistics from the data (counts, ranges if available)
3. For large datasets, focus on aggregate insights rather than individual records
4. Only mention specific values that appear in the database results"#
    } else {
        r#"RESPONSE STRUCTURE:
1. Start with: "Based on the retrieved data, here's what I found:"
2. State exactly how many records were found
3. Summarize the key findings from the actual database results
4. Provide context about what this means for the user's query"#
    };

    let do_not = r#"DO NOT:
- Describe oceanographic patterns if no measurement data exists
- Mention specific temperatures/salinities/depths unless they're in the database results
- Use phrases like "suggests", "indicates", "likely" when referring to non-existent data
- Provide scientific interpretations of measurements that don't exist
- Invent any numerical values or ranges"#;

    format!("{base_rules}\n\n{specific}\n\n{do_not}\n\nQuery type: {strategy}")
}

/// Compact textual rendering of retrieved data for the prose prompt.
/// Count and year-breakdown shapes get explicit callouts so the model
/// cannot misread them.
pub fn summarize_for_llm(data: &RetrievedData) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !data.sql_rows.is_empty() {
        let rows = &data.sql_rows;

        if rows.len() == 1 && rows[0].contains_column("count") {
            if let Some(count) = rows[0].get("count").and_then(SqlValue::as_i64) {
                parts.push(format!("SQL COUNT QUERY RESULT: {count}"));
                parts.push("This is the exact count returned by the database query".to_string());
                return parts.join(" || ");
            }
        }

        if rows
            .iter()
            .all(|r| r.contains_column("year") && r.contains_column("count"))
        {
            parts.push("SQL GROUP BY QUERY RESULTS - YEARLY BREAKDOWN:".to_string());
            for row in rows.iter() {
                let year = row.get("year").and_then(SqlValue::as_i64).unwrap_or(0);
                let count = row.get("count").and_then(SqlValue::as_i64).unwrap_or(0);
                parts.push(format!("Year {year}: {count} profiles"));
            }
            return parts.join(" || ");
        }

        parts.push(format!("Database Query Results: {} records found", rows.len()));
        for (i, row) in rows.iter().take(3).enumerate() {
            let fields: Vec<String> = row
                .iter()
                .map(|(name, value)| format!("{name}={}", value.display()))
                .collect();
            parts.push(format!("Record {}: {}", i + 1, fields.join(", ")));
        }
        if rows.len() > 3 {
            parts.push(format!("... and {} more records", rows.len() - 3));
        }
    }

    if !data.vector_hits.is_empty() {
        parts.push(format!(
            "Semantic search results: {} summaries",
            data.vector_hits.len()
        ));
        for hit in data.vector_hits.iter().take(3) {
            parts.push(hit.document.chars().take(200).collect());
        }
    }

    if parts.is_empty() {
        parts.push("No results retrieved".to_string());
    }

    parts.join(" || ")
}
