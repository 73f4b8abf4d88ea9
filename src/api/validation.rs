use super::ApiError;

const MAX_QUERY_LEN: usize = 50;

pub fn validate_id(resource: &str, id: i32) -> Result<i32, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid {resource} ID: {id}. ID must be a positive integer"
        )));
    }
    Ok(id)
}

pub fn validate_user_id(id: i32) -> Result<i32, ApiError> {
    validate_id("user", id)
}

pub fn validate_message_id(id: i32) -> Result<i32, ApiError> {
    validate_id("message", id)
}

/// Blank searches mean "everyone".
pub fn normalize_search_query(query: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(trimmed) = query.map(str::trim).filter(|q| !q.is_empty()) else {
        return Ok(None);
    };

    if trimmed.chars().count() > MAX_QUERY_LEN {
        return Err(ApiError::validation(format!(
            "Search query must be {MAX_QUERY_LEN} characters or less"
        )));
    }

    Ok(Some(trimmed.to_string()))
}
