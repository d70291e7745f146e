use axum::extract::Query;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use super::ApiError;
use super::ApiSuccess;
use super::UserData;
use crate::domain::user::models::Pagination;
use crate::inbound::http::router::AppState;

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<ApiSuccess<Vec<UserData>>, ApiError> {
    let page = Pagination::new(parse_positive(query.limit), parse_positive(query.page));

    state
        .user_service
        .list_users(page)
        .await
        .map_err(ApiError::from)
        .map(|users| ApiSuccess::new(StatusCode::OK, users.iter().map(UserData::from).collect()))
}

/// Raw paging parameters; anything unparsable falls back to the defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ListUsersQuery {
    limit: Option<String>,
    page: Option<String>,
}

fn parse_positive(raw: Option<String>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_paging_falls_back() {
        assert_eq!(parse_positive(Some("abc".to_string())), None);
        assert_eq!(parse_positive(Some("-3".to_string())), None);
        assert_eq!(parse_positive(Some(" 25 ".to_string())), Some(25));
        assert_eq!(
            Pagination::new(parse_positive(Some("0".to_string())), None),
            Pagination::new(None, None)
        );
    }
}
