//! Unique-id normalization, list parsing, and deploy-environment rewriting.
//!
//! Unique ids are opaque `<kind>.<namespace>.<name>` tokens; only the
//! environment rewrite looks inside them, and only for the `model.` kind.
use regex::Regex;

/// Deploy environment whose physical table names match the logical ids.
pub const PROD_ENV: &str = "prod";

/// Strip surrounding whitespace, one trailing comma, and one outer pair of
/// matching quotes from a raw token. Inner quote characters are preserved
/// verbatim; no unescaping is performed. May return an empty string.
pub fn normalize_unique_id(raw: &str) -> String {
    let mut value = raw.trim();
    value = value.strip_suffix(',').unwrap_or(value);
    if value.len() >= 2 {
        let bytes = value.as_bytes();
        let first = bytes[0];
        let last = bytes[value.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return value[1..value.len() - 1].trim().to_string();
        }
    }
    value.to_string()
}

/// Split raw CLI values on commas, normalize each piece, and keep the
/// non-empty results in encounter order. Duplicates are preserved.
pub fn parse_unique_ids<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut unique_ids = Vec::new();
    for value in values {
        for item in value.as_ref().split(',') {
            let item = normalize_unique_id(item);
            if !item.is_empty() {
                unique_ids.push(item);
            }
        }
    }
    unique_ids
}

/// Map a logical model id to its per-environment physical name.
///
/// Non-production environments materialize `<base>__<rest>` tables as
/// `<base>_<env>_dbt__<rest>`; ids that are not two-segment `model.*` ids, or
/// whose name carries no `__` separator, pass through unchanged. Only `model.`
/// ids are ever rewritten; `test.*` and `snapshot.*` ids name the same node in
/// every environment.
pub fn apply_env_to_model_id(unique_id: &str, deploy_env: Option<&str>) -> String {
    let env = match deploy_env {
        Some(env) if !env.is_empty() && env != PROD_ENV => env,
        _ => return unique_id.to_string(),
    };

    let model_re = Regex::new(r"^model\.([^.]+)\.([^.]+)$").expect("regex for model ids");
    let Some(caps) = model_re.captures(unique_id) else {
        return unique_id.to_string();
    };
    let database_name = &caps[1];
    let table_name = &caps[2];
    let Some((base_name, rest)) = table_name.split_once("__") else {
        return unique_id.to_string();
    };

    format!("model.{database_name}.{base_name}_{env}_dbt__{rest}")
}
