use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::AuthUser;
use crate::models::{Hotel, HotelFilter, Role};
use crate::state::AppState;

/// ホテル一覧レスポンス
#[derive(Debug, Serialize)]
pub struct HotelListResponse {
    pub hotels: Vec<Hotel>,
    pub page: i64,
    pub page_size: i64,
}

/// ホテル一覧ハンドラー
///
/// GET /api/hotels
///
/// クエリパラメータ（すべて任意、camelCase）:
/// page, pageSize, sortBy, sortOrder, city, country, search,
/// minPrice, maxPrice, minRating, features（カンマ区切り）
pub async fn list_hotels(
    State(state): State<AppState>,
    Query(mut filter): Query<HotelFilter>,
) -> Result<Json<HotelListResponse>, AppError> {
    // パラメータ正規化（page/pageSize/sortBy等のデフォルト補正）
    filter.validate();
    let features = filter.normalized_features();

    let hotels = state.hotel_repo.search(&filter, &features).await?;

    Ok(Json(HotelListResponse {
        hotels,
        page: filter.page,
        page_size: filter.page_size,
    }))
}

/// ホテル取得ハンドラー
///
/// GET /api/hotels/{id}
pub async fn get_hotel(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Hotel>, AppError> {
    let hotel = state
        .hotel_repo
        .find_by_id(id)
        .await?
        .ok_or(AppError::HotelNotFound)?;

    Ok(Json(hotel))
}

/// ホテル作成リクエスト
#[derive(Debug, Deserialize)]
pub struct CreateHotelRequest {
    pub name: String,
    pub description: String,
    pub city: String,
    pub country: String,
    pub image_url: String,
    pub price_per_night: f64,
    pub rating: f64,
    pub phone_number: String,
    #[serde(default)]
    pub features: Vec<String>,
}

/// ホテル作成ハンドラー（admin のみ）
///
/// POST /api/hotels
pub async fn create_hotel(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Json(request): Json<CreateHotelRequest>,
) -> Result<(StatusCode, Json<Hotel>), AppError> {
    if auth_user.role != Role::Admin {
        tracing::warn!(user_id = %auth_user.user_id, "ホテル作成拒否: admin ではない");
        return Err(AppError::Forbidden);
    }

    // バリデーション
    validate_create_hotel_request(&request)?;

    let features = HotelFilter::normalize_features(&request.features);

    let hotel = state
        .hotel_repo
        .create(
            request.name.trim(),
            request.description.trim(),
            request.city.trim(),
            request.country.trim(),
            request.image_url.trim(),
            request.price_per_night,
            request.rating,
            request.phone_number.trim(),
            &features,
        )
        .await?;

    tracing::info!(hotel_id = %hotel.id, "ホテル作成");

    Ok((StatusCode::CREATED, Json(hotel)))
}

/// ホテル作成リクエストのバリデーション
///
/// 制約はDBスキーマのCHECKと揃えている
fn validate_create_hotel_request(request: &CreateHotelRequest) -> Result<(), AppError> {
    if request.name.trim().chars().count() < 3 {
        return Err(AppError::Validation(
            "ホテル名は3文字以上で入力してください".to_string(),
        ));
    }
    if request.description.trim().chars().count() < 10 {
        return Err(AppError::Validation(
            "説明は10文字以上で入力してください".to_string(),
        ));
    }
    if request.city.trim().chars().count() < 3 {
        return Err(AppError::Validation(
            "都市名は3文字以上で入力してください".to_string(),
        ));
    }
    if request.country.trim().chars().count() < 3 {
        return Err(AppError::Validation(
            "国名は3文字以上で入力してください".to_string(),
        ));
    }
    if request.image_url.trim().chars().count() < 10 {
        return Err(AppError::Validation(
            "画像URLが不正です".to_string(),
        ));
    }
    if request.price_per_night <= 0.0 {
        return Err(AppError::Validation(
            "1泊あたりの価格は0より大きい値を入力してください".to_string(),
        ));
    }
    if !(0.0..=5.0).contains(&request.rating) {
        return Err(AppError::Validation(
            "評価は0〜5の範囲で入力してください".to_string(),
        ));
    }
    if request.phone_number.trim().is_empty() {
        return Err(AppError::Validation(
            "電話番号は必須です".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> CreateHotelRequest {
        CreateHotelRequest {
            name: "Grand Palace".to_string(),
            description: "A comfortable hotel near the old town.".to_string(),
            city: "Istanbul".to_string(),
            country: "Turkey".to_string(),
            image_url: "https://example.com/grand-palace.jpg".to_string(),
            price_per_night: 120.0,
            rating: 4.5,
            phone_number: "+90 212 000 0000".to_string(),
            features: vec!["wifi".to_string(), "pool".to_string()],
        }
    }

    #[test]
    fn test_validate_valid_request() {
        assert!(validate_create_hotel_request(&valid_request()).is_ok());
    }

    #[test]
    fn test_validate_short_name() {
        let mut request = valid_request();
        request.name = "ab".to_string();
        assert!(validate_create_hotel_request(&request).is_err());
    }

    #[test]
    fn test_validate_zero_price() {
        let mut request = valid_request();
        request.price_per_night = 0.0;
        assert!(validate_create_hotel_request(&request).is_err());
    }

    #[test]
    fn test_validate_rating_out_of_range() {
        let mut request = valid_request();
        request.rating = 5.5;
        assert!(validate_create_hotel_request(&request).is_err());

        request.rating = -0.1;
        assert!(validate_create_hotel_request(&request).is_err());
    }

    #[test]
    fn test_validate_short_description() {
        let mut request = valid_request();
        request.description = "too short".to_string();
        assert!(validate_create_hotel_request(&request).is_err());
    }
}
